use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::Repository;
use crate::error::{RepoResult, RepositoryError};
use crate::models::{CreateJobRequest, Job, NewUser, OwnedCounts, Response, UpdateUserRequest, User};
use crate::policy::{self, Actor};
use crate::query::{self, JobQuery, ResponseQuery};

const USER_COLUMNS: &str = "id, name, email, password_hash, is_company, created_at";
const JOB_COLUMNS: &str =
    "id, user_id, title, description, salary_from, salary_to, is_active, created_at";
const RESPONSE_COLUMNS: &str = "id, user_id, job_id, message, created_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Queries are checked at runtime (`query_as` + `bind`) so the crate builds without
/// a live database. Writes run inside their own transaction.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Unique violations can only come from `users.email`.
fn map_user_write_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::DuplicateEmail,
        _ => RepositoryError::Database(err),
    }
}

// Runs on the caller's transaction so the counts are read after its locks are held.
async fn owned_counts(conn: &mut PgConnection, user_id: i64) -> RepoResult<OwnedCounts> {
    let (jobs, responses) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM jobs WHERE user_id = $1),
            (SELECT COUNT(*) FROM responses WHERE user_id = $1)
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await
    .inspect_err(|e| tracing::error!("owned_counts error: {:?}", e))?;
    Ok(OwnedCounts { jobs, responses })
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("get_user error: {:?}", e))?;
        Ok(user)
    }

    async fn list_users(&self, limit: i64, skip: i64) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("list_users error: {:?}", e))?;
        Ok(users)
    }

    /// create_user
    ///
    /// Inserts the local profile once the identity provider accepted the credentials.
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, is_company) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_company)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_user_write_error)?;
        tx.commit().await?;
        Ok(created)
    }

    /// update_user
    ///
    /// `FOR UPDATE` on the user conflicts with the `FOR KEY SHARE` lock that a job
    /// or response insert takes on its owner, so the role-switch counts cannot
    /// change before this transaction commits.
    async fn update_user(&self, id: i64, changes: UpdateUserRequest) -> RepoResult<Option<User>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .inspect_err(|e| tracing::error!("update_user lock error: {:?}", e))?;
        let Some(current) = current else {
            return Ok(None);
        };

        if policy::is_role_switch(&current, changes.is_company) {
            let owned = owned_counts(&mut *tx, id).await?;
            policy::switch_role(&current, changes.is_company, owned)?;
        }

        let user = changes.apply_to(current);
        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $2, email = $3, is_company = $4 WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.is_company)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_user_write_error)?;
        tx.commit().await?;
        Ok(updated)
    }

    /// list_jobs
    ///
    /// Executes the composed filter/sort/pagination query. All values are bound
    /// parameters; only fixed SQL fragments are concatenated.
    async fn list_jobs(&self, query: &JobQuery) -> RepoResult<Vec<Job>> {
        let mut builder = query.to_sql();
        let jobs = builder
            .build_query_as::<Job>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_jobs error: {:?}", e))?;
        Ok(jobs)
    }

    async fn list_jobs_by_owner(&self, owner_id: i64, limit: i64) -> RepoResult<Vec<Job>> {
        let mut builder = query::jobs_by_owner_sql(owner_id, limit);
        let jobs = builder
            .build_query_as::<Job>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_jobs_by_owner error: {:?}", e))?;
        Ok(jobs)
    }

    async fn get_job(&self, id: i64) -> RepoResult<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("get_job error: {:?}", e))?;
        Ok(job)
    }

    async fn create_job(&self, owner_id: i64, req: CreateJobRequest) -> RepoResult<Job> {
        let mut tx = self.pool.begin().await?;
        let job = sqlx::query_as::<_, Job>(&format!(
            "INSERT INTO jobs (user_id, title, description, salary_from, salary_to, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {JOB_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.salary_from)
        .bind(req.salary_to)
        .bind(req.is_active)
        .fetch_one(&mut *tx)
        .await
        .inspect_err(|e| tracing::error!("create_job error: {:?}", e))?;
        tx.commit().await?;
        Ok(job)
    }

    async fn update_job(&self, job: Job) -> RepoResult<Option<Job>> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Job>(&format!(
            "UPDATE jobs SET title = $2, description = $3, salary_from = $4, salary_to = $5, \
             is_active = $6 WHERE id = $1 RETURNING {JOB_COLUMNS}"
        ))
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.salary_from)
        .bind(job.salary_to)
        .bind(job.is_active)
        .fetch_optional(&mut *tx)
        .await
        .inspect_err(|e| tracing::error!("update_job error: {:?}", e))?;
        tx.commit().await?;
        Ok(updated)
    }

    /// delete_job
    ///
    /// Application-level cascade: the job row is locked first, then dependent
    /// responses go, then the job, all inside one transaction. The lock keeps new
    /// responses out until commit. An error in any step drops the transaction and
    /// rolls everything back.
    async fn delete_job(&self, id: i64) -> RepoResult<Option<Job>> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .inspect_err(|e| tracing::error!("delete_job lock error: {:?}", e))?;
        if locked.is_none() {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM responses WHERE job_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .inspect_err(|e| tracing::error!("delete_job cascade error: {:?}", e))?
            .rows_affected();

        let job = sqlx::query_as::<_, Job>(&format!(
            "DELETE FROM jobs WHERE id = $1 RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .inspect_err(|e| tracing::error!("delete_job error: {:?}", e))?;

        tx.commit().await?;
        tracing::debug!(job_id = id, responses_removed = removed, "job deleted with its responses");
        Ok(job)
    }

    async fn list_responses(&self, query: &ResponseQuery) -> RepoResult<Vec<Response>> {
        let mut builder = query.to_sql();
        let responses = builder
            .build_query_as::<Response>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_responses error: {:?}", e))?;
        Ok(responses)
    }

    async fn list_responses_by_job(&self, job_id: i64) -> RepoResult<Vec<Response>> {
        let responses = sqlx::query_as::<_, Response>(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM responses WHERE job_id = $1 ORDER BY id ASC"
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("list_responses_by_job error: {:?}", e))?;
        Ok(responses)
    }

    async fn get_response(&self, id: i64) -> RepoResult<Option<Response>> {
        let response = sqlx::query_as::<_, Response>(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM responses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!("get_response error: {:?}", e))?;
        Ok(response)
    }

    /// create_response
    ///
    /// `FOR SHARE` holds off concurrent updates and deletes of the job, so the
    /// activeness it was checked against still holds when the insert commits.
    async fn create_response(&self, actor: Actor, job_id: i64, message: String) -> RepoResult<Response> {
        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 FOR SHARE"
        ))
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await
        .inspect_err(|e| tracing::error!("create_response lock error: {:?}", e))?;
        policy::create_response(&actor, job.as_ref())?;

        let response = sqlx::query_as::<_, Response>(&format!(
            "INSERT INTO responses (user_id, job_id, message) VALUES ($1, $2, $3) \
             RETURNING {RESPONSE_COLUMNS}"
        ))
        .bind(actor.id())
        .bind(job_id)
        .bind(&message)
        .fetch_one(&mut *tx)
        .await
        .inspect_err(|e| tracing::error!("create_response error: {:?}", e))?;
        tx.commit().await?;
        Ok(response)
    }

    async fn update_response(&self, response: Response) -> RepoResult<Option<Response>> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Response>(&format!(
            "UPDATE responses SET message = $2 WHERE id = $1 RETURNING {RESPONSE_COLUMNS}"
        ))
        .bind(response.id)
        .bind(&response.message)
        .fetch_optional(&mut *tx)
        .await
        .inspect_err(|e| tracing::error!("update_response error: {:?}", e))?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_response(&self, id: i64) -> RepoResult<Option<Response>> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query_as::<_, Response>(&format!(
            "DELETE FROM responses WHERE id = $1 RETURNING {RESPONSE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .inspect_err(|e| tracing::error!("delete_response error: {:?}", e))?;
        tx.commit().await?;
        Ok(deleted)
    }
}
