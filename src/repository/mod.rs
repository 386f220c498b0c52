use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RepoResult;
use crate::models::{CreateJobRequest, Job, NewUser, Response, UpdateUserRequest, User};
use crate::policy::Actor;
use crate::query::{JobQuery, ResponseQuery};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, so handlers can
/// be exercised against Postgres or an in-memory store alike.
///
/// Reads never mutate. Every write is atomic: a single logical operation either
/// persists completely or not at all. Update and delete methods return `None`
/// when the row no longer exists. Rules that depend on the current state of
/// another row are evaluated inside the write while that row is locked, and
/// fail with `RepositoryError::Rejected`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;
    async fn list_users(&self, limit: i64, skip: i64) -> RepoResult<Vec<User>>;
    // Fails with `DuplicateEmail` when the email is taken.
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    /// Merges `changes` into the stored user and persists name, email and role.
    /// A role switch is checked against the jobs and responses the user owns
    /// while the user row is locked, so no job or response can be added in between.
    async fn update_user(&self, id: i64, changes: UpdateUserRequest) -> RepoResult<Option<User>>;

    // --- Jobs ---
    async fn list_jobs(&self, query: &JobQuery) -> RepoResult<Vec<Job>>;
    async fn list_jobs_by_owner(&self, owner_id: i64, limit: i64) -> RepoResult<Vec<Job>>;
    async fn get_job(&self, id: i64) -> RepoResult<Option<Job>>;
    async fn create_job(&self, owner_id: i64, req: CreateJobRequest) -> RepoResult<Job>;
    async fn update_job(&self, job: Job) -> RepoResult<Option<Job>>;
    /// Two-step cascade in one transaction: the job row is locked, its responses
    /// are deleted, then the job itself.
    async fn delete_job(&self, id: i64) -> RepoResult<Option<Job>>;

    // --- Responses ---
    async fn list_responses(&self, query: &ResponseQuery) -> RepoResult<Vec<Response>>;
    async fn list_responses_by_job(&self, job_id: i64) -> RepoResult<Vec<Response>>;
    async fn get_response(&self, id: i64) -> RepoResult<Option<Response>>;
    /// Applies the response rules to the job while it is locked against updates
    /// and deletes, then inserts the response for `actor`.
    async fn create_response(&self, actor: Actor, job_id: i64, message: String) -> RepoResult<Response>;
    async fn update_response(&self, response: Response) -> RepoResult<Option<Response>>;
    async fn delete_response(&self, id: i64) -> RepoResult<Option<Response>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
