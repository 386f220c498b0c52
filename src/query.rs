//! Job and response listing queries.
//!
//! Each query is a plain value that knows how to render itself into a
//! parameterized `QueryBuilder` for Postgres, and how to evaluate itself over
//! rows already in memory. Both paths must select and order rows identically.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use crate::models::{Job, Response};

pub const DEFAULT_LIMIT: i64 = 100;

const JOB_COLUMNS: &str =
    "j.id, j.user_id, j.title, j.description, j.salary_from, j.salary_to, j.is_active, j.created_at";
const RESPONSE_COLUMNS: &str = "r.id, r.user_id, r.job_id, r.message, r.created_at";

/// Which salary bound, if any, must equal the requested value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SalaryFilter {
    #[default]
    None,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivenessFilter {
    #[default]
    None,
    Active,
}

/// Ordering over `created_at`. `None` falls back to ascending id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    None,
    Asc,
    Desc,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// JobQuery
///
/// Filters for the public job listing (GET /jobs). All filters are combined with AND.
/// The salary filter compares for exact equality with `salary`.
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, PartialEq)]
#[into_params(parameter_in = Query)]
pub struct JobQuery {
    #[serde(default)]
    pub filter_by_salary: SalaryFilter,
    #[serde(default)]
    pub filter_by_activeness: ActivenessFilter,
    #[serde(default)]
    pub order_by: SortOrder,
    /// Maximum number of jobs returned.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of matching jobs skipped before the page starts.
    #[serde(default)]
    pub skip: i64,
    /// Value compared against `salary_from` (MIN) or `salary_to` (MAX).
    #[serde(default)]
    #[param(value_type = String)]
    pub salary: Decimal,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            filter_by_salary: SalaryFilter::None,
            filter_by_activeness: ActivenessFilter::None,
            order_by: SortOrder::None,
            limit: DEFAULT_LIMIT,
            skip: 0,
            salary: Decimal::ZERO,
        }
    }
}

impl JobQuery {
    /// Rejects negative pagination values before anything touches the store.
    pub fn validate(&self) -> Result<(), String> {
        if self.limit < 0 {
            return Err("limit не может быть отрицательным".to_string());
        }
        if self.skip < 0 {
            return Err("skip не может быть отрицательным".to_string());
        }
        Ok(())
    }

    /// Renders the listing as a single SELECT with bound parameters.
    pub fn to_sql(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs j WHERE TRUE"));

        match self.filter_by_salary {
            SalaryFilter::None => {}
            SalaryFilter::Min => {
                builder.push(" AND j.salary_from = ");
                builder.push_bind(self.salary);
            }
            SalaryFilter::Max => {
                builder.push(" AND j.salary_to = ");
                builder.push_bind(self.salary);
            }
        }

        if self.filter_by_activeness == ActivenessFilter::Active {
            builder.push(" AND j.is_active = TRUE");
        }

        builder.push(match self.order_by {
            SortOrder::None => " ORDER BY j.id ASC",
            SortOrder::Asc => " ORDER BY j.created_at ASC, j.id ASC",
            SortOrder::Desc => " ORDER BY j.created_at DESC, j.id DESC",
        });

        builder.push(" LIMIT ");
        builder.push_bind(self.limit);
        builder.push(" OFFSET ");
        builder.push_bind(self.skip);
        builder
    }

    pub fn matches(&self, job: &Job) -> bool {
        let salary_ok = match self.filter_by_salary {
            SalaryFilter::None => true,
            SalaryFilter::Min => job.salary_from == self.salary,
            SalaryFilter::Max => job.salary_to == self.salary,
        };
        let active_ok = match self.filter_by_activeness {
            ActivenessFilter::None => true,
            ActivenessFilter::Active => job.is_active,
        };
        salary_ok && active_ok
    }

    fn compare(&self, a: &Job, b: &Job) -> Ordering {
        match self.order_by {
            SortOrder::None => a.id.cmp(&b.id),
            SortOrder::Asc => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
            SortOrder::Desc => b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)),
        }
    }

    /// Filters, orders and paginates jobs held in memory.
    pub fn apply<'a>(&self, jobs: impl IntoIterator<Item = &'a Job>) -> Vec<Job> {
        let mut selected: Vec<Job> = jobs.into_iter().filter(|j| self.matches(j)).cloned().collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
            .into_iter()
            .skip(self.skip.max(0) as usize)
            .take(self.limit.max(0) as usize)
            .collect()
    }
}

/// Jobs owned by a single user, regardless of activeness.
pub fn jobs_by_owner_sql(owner_id: i64, limit: i64) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs j WHERE j.user_id = "));
    builder.push_bind(owner_id);
    builder.push(" ORDER BY j.id ASC LIMIT ");
    builder.push_bind(limit);
    builder
}

pub fn jobs_by_owner<'a>(owner_id: i64, limit: i64, jobs: impl IntoIterator<Item = &'a Job>) -> Vec<Job> {
    let mut owned: Vec<Job> = jobs.into_iter().filter(|j| j.user_id == owner_id).cloned().collect();
    owned.sort_by_key(|j| j.id);
    owned.truncate(limit.max(0) as usize);
    owned
}

/// Whose responses are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseScope {
    /// Responses submitted by this seeker.
    Applicant(i64),
    /// Responses to jobs owned by this company.
    Employer(i64),
}

/// ResponseQuery
///
/// Listing of responses by applicant or by employer, optionally restricted to
/// responses whose job is still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseQuery {
    pub scope: ResponseScope,
    pub only_active_jobs: bool,
}

impl ResponseQuery {
    pub fn by_applicant(applicant_id: i64, only_active_jobs: bool) -> Self {
        Self {
            scope: ResponseScope::Applicant(applicant_id),
            only_active_jobs,
        }
    }

    pub fn by_employer(employer_id: i64, only_active_jobs: bool) -> Self {
        Self {
            scope: ResponseScope::Employer(employer_id),
            only_active_jobs,
        }
    }

    pub fn to_sql(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {RESPONSE_COLUMNS} FROM responses r JOIN jobs j ON r.job_id = j.id WHERE "
        ));

        match self.scope {
            ResponseScope::Applicant(id) => {
                builder.push("r.user_id = ");
                builder.push_bind(id);
            }
            ResponseScope::Employer(id) => {
                builder.push("j.user_id = ");
                builder.push_bind(id);
            }
        }

        if self.only_active_jobs {
            builder.push(" AND j.is_active = TRUE");
        }

        builder.push(" ORDER BY r.id ASC");
        builder
    }

    /// Evaluates the query over in-memory rows. `jobs` resolves the job a response
    /// points at; responses whose job cannot be resolved are dropped, like the SQL join.
    pub fn apply<'a, F>(&self, responses: impl IntoIterator<Item = &'a Response>, jobs: F) -> Vec<Response>
    where
        F: Fn(i64) -> Option<&'a Job>,
    {
        let mut selected: Vec<Response> = responses
            .into_iter()
            .filter(|r| {
                let Some(job) = jobs(r.job_id) else {
                    return false;
                };
                let in_scope = match self.scope {
                    ResponseScope::Applicant(id) => r.user_id == id,
                    ResponseScope::Employer(id) => job.user_id == id,
                };
                in_scope && (!self.only_active_jobs || job.is_active)
            })
            .cloned()
            .collect();
        selected.sort_by_key(|r| r.id);
        selected
    }
}
