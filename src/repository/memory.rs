use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::Repository;
use crate::error::{RepoResult, RepositoryError};
use crate::models::{CreateJobRequest, Job, NewUser, OwnedCounts, Response, UpdateUserRequest, User};
use crate::policy::{self, Actor};
use crate::query::{self, JobQuery, ResponseQuery};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    jobs: BTreeMap<i64, Job>,
    responses: BTreeMap<i64, Response>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn owned_by(&self, user_id: i64) -> OwnedCounts {
        OwnedCounts {
            jobs: self.jobs.values().filter(|j| j.user_id == user_id).count() as i64,
            responses: self.responses.values().filter(|r| r.user_id == user_id).count() as i64,
        }
    }
}

/// MemoryRepository
///
/// A `Repository` held entirely in process memory. Used by the handler and API
/// tests so they can run without Postgres. Every operation holds the single lock
/// for its whole duration, which makes each write atomic.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed job, keeping its `created_at`. Test seeding only.
    pub async fn insert_job(&self, job: Job) -> Job {
        let mut tables = self.tables.lock().await;
        tables.next_id = tables.next_id.max(job.id);
        tables.jobs.insert(job.id, job.clone());
        job
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn list_users(&self, limit: i64, skip: i64) -> RepoResult<Vec<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.email_taken(&user.email, None) {
            return Err(RepositoryError::DuplicateEmail);
        }
        let id = tables.next_id();
        let created = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            is_company: user.is_company,
            created_at: Utc::now(),
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i64, changes: UpdateUserRequest) -> RepoResult<Option<User>> {
        let mut tables = self.tables.lock().await;
        let Some(current) = tables.users.get(&id).cloned() else {
            return Ok(None);
        };

        if policy::is_role_switch(&current, changes.is_company) {
            policy::switch_role(&current, changes.is_company, tables.owned_by(id))?;
        }

        let user = changes.apply_to(current);
        if tables.email_taken(&user.email, Some(user.id)) {
            return Err(RepositoryError::DuplicateEmail);
        }
        tables.users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn list_jobs(&self, query: &JobQuery) -> RepoResult<Vec<Job>> {
        let tables = self.tables.lock().await;
        Ok(query.apply(tables.jobs.values()))
    }

    async fn list_jobs_by_owner(&self, owner_id: i64, limit: i64) -> RepoResult<Vec<Job>> {
        let tables = self.tables.lock().await;
        Ok(query::jobs_by_owner(owner_id, limit, tables.jobs.values()))
    }

    async fn get_job(&self, id: i64) -> RepoResult<Option<Job>> {
        Ok(self.tables.lock().await.jobs.get(&id).cloned())
    }

    async fn create_job(&self, owner_id: i64, req: CreateJobRequest) -> RepoResult<Job> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let job = Job {
            id,
            user_id: owner_id,
            title: req.title,
            description: req.description,
            salary_from: req.salary_from,
            salary_to: req.salary_to,
            is_active: req.is_active,
            created_at: Utc::now(),
        };
        tables.jobs.insert(id, job.clone());
        Ok(job)
    }

    async fn update_job(&self, job: Job) -> RepoResult<Option<Job>> {
        let mut tables = self.tables.lock().await;
        let Some(stored) = tables.jobs.get_mut(&job.id) else {
            return Ok(None);
        };
        stored.title = job.title;
        stored.description = job.description;
        stored.salary_from = job.salary_from;
        stored.salary_to = job.salary_to;
        stored.is_active = job.is_active;
        Ok(Some(stored.clone()))
    }

    async fn delete_job(&self, id: i64) -> RepoResult<Option<Job>> {
        let mut tables = self.tables.lock().await;
        if !tables.jobs.contains_key(&id) {
            return Ok(None);
        }
        tables.responses.retain(|_, r| r.job_id != id);
        Ok(tables.jobs.remove(&id))
    }

    async fn list_responses(&self, query: &ResponseQuery) -> RepoResult<Vec<Response>> {
        let tables = self.tables.lock().await;
        Ok(query.apply(tables.responses.values(), |job_id| tables.jobs.get(&job_id)))
    }

    async fn list_responses_by_job(&self, job_id: i64) -> RepoResult<Vec<Response>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .responses
            .values()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn get_response(&self, id: i64) -> RepoResult<Option<Response>> {
        Ok(self.tables.lock().await.responses.get(&id).cloned())
    }

    async fn create_response(&self, actor: Actor, job_id: i64, message: String) -> RepoResult<Response> {
        let mut tables = self.tables.lock().await;
        policy::create_response(&actor, tables.jobs.get(&job_id))?;

        let id = tables.next_id();
        let response = Response {
            id,
            user_id: actor.id(),
            job_id,
            message,
            created_at: Utc::now(),
        };
        tables.responses.insert(id, response.clone());
        Ok(response)
    }

    async fn update_response(&self, response: Response) -> RepoResult<Option<Response>> {
        let mut tables = self.tables.lock().await;
        let Some(stored) = tables.responses.get_mut(&response.id) else {
            return Ok(None);
        };
        stored.message = response.message;
        Ok(Some(stored.clone()))
    }

    async fn delete_response(&self, id: i64) -> RepoResult<Option<Response>> {
        Ok(self.tables.lock().await.responses.remove(&id))
    }
}
