use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A registered account from the `users` table. `is_company` splits the table into
/// companies (who post jobs) and seekers (who respond to them).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub name: String,
    // Unique across all users.
    pub email: String,
    // Opaque credential reference handed back by the identity provider.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub is_company: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Job
///
/// A vacancy from the `jobs` table, owned by a company user.
/// Invariant: `salary_to >= salary_from > 0`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Job {
    pub id: i64,
    // FK to users.id (Owner, always a company).
    pub user_id: i64,
    pub title: String,
    pub description: String,
    #[ts(type = "string")]
    pub salary_from: Decimal,
    #[ts(type = "string")]
    pub salary_to: Decimal,
    // Only active jobs accept responses.
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Response
///
/// An application submitted by a seeker to a job, from the `responses` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Response {
    pub id: i64,
    // FK to users.id (Applicant).
    pub user_id: i64,
    // FK to jobs.id.
    pub job_id: i64,
    pub message: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// OwnedCounts
///
/// How many jobs and responses a user currently owns. Drives the role-switch rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnedCounts {
    pub jobs: i64,
    pub responses: i64,
}

// --- Request Payloads (Input Schemas) ---

fn default_active() -> bool {
    true
}

/// CreateJobRequest
///
/// Input payload for posting a vacancy (POST /jobs).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[validate(schema(function = "validate_create_job_salary"))]
#[ts(export)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Охранник")]
    pub title: String,
    #[serde(default)]
    #[schema(example = "Охрана кукурузы")]
    pub description: String,
    #[ts(type = "string")]
    #[schema(example = "15000")]
    pub salary_from: Decimal,
    #[ts(type = "string")]
    #[schema(example = "35000")]
    pub salary_to: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// UpdateJobRequest
///
/// Partial update payload for a vacancy (PUT /jobs?id=). Absent fields keep their
/// stored value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[validate(schema(function = "validate_update_job_salary"))]
#[ts(export)]
pub struct UpdateJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub salary_from: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub salary_to: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateJobRequest {
    /// Merges the provided fields into `job`.
    pub fn apply_to(self, mut job: Job) -> Job {
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(description) = self.description {
            job.description = description;
        }
        if let Some(salary_from) = self.salary_from {
            job.salary_from = salary_from;
        }
        if let Some(salary_to) = self.salary_to {
            job.salary_to = salary_to;
        }
        if let Some(is_active) = self.is_active {
            job.is_active = is_active;
        }
        job
    }
}

/// UpdateResponseRequest
///
/// Replacement message for an existing response (PUT /responses?id=).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateResponseRequest {
    #[validate(length(min = 1))]
    pub message: String,
}

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /users).
/// The password is only passed through to the identity provider and never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6), must_match(other = "password2"))]
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub is_company: bool,
}

/// UpdateUserRequest
///
/// Partial profile update (PUT /users?id=). Changing `is_company` is subject to the
/// role-switch rule.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_company: Option<bool>,
}

impl UpdateUserRequest {
    pub fn apply_to(self, mut user: User) -> User {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(is_company) = self.is_company {
            user.is_company = is_company;
        }
        user
    }
}

/// NewUser
///
/// Internal insert shape produced after the identity provider accepted the credentials.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_company: bool,
}

// --- Salary invariant ---

/// Checks `salary_to >= salary_from > 0`.
pub fn check_salary_range(salary_from: Decimal, salary_to: Decimal) -> Result<(), ValidationError> {
    if salary_from <= Decimal::ZERO {
        return Err(ValidationError::new("salary_from")
            .with_message("Зарплата должна быть положительной".into()));
    }
    if salary_to < salary_from {
        return Err(ValidationError::new("salary_range")
            .with_message("Верхняя граница зарплаты меньше нижней".into()));
    }
    Ok(())
}

fn validate_create_job_salary(req: &CreateJobRequest) -> Result<(), ValidationError> {
    check_salary_range(req.salary_from, req.salary_to)
}

// Only the provided bounds can be checked here; the merged job is re-checked
// by the handler before it is persisted.
fn validate_update_job_salary(req: &UpdateJobRequest) -> Result<(), ValidationError> {
    match (req.salary_from, req.salary_to) {
        (Some(from), Some(to)) => check_salary_range(from, to),
        (Some(value), None) | (None, Some(value)) if value <= Decimal::ZERO => {
            Err(ValidationError::new("salary")
                .with_message("Зарплата должна быть положительной".into()))
        }
        _ => Ok(()),
    }
}
