use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiResult, AppError, ErrorBody, JOB_NOT_FOUND, RESPONSE_NOT_FOUND, USER_NOT_FOUND},
    models::{
        self, CreateJobRequest, Job, NewUser, RegisterUserRequest, UpdateJobRequest,
        UpdateResponseRequest, UpdateUserRequest, User,
    },
    policy::{self, Actor},
    query::{DEFAULT_LIMIT, JobQuery, ResponseQuery},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use validator::Validate;

// --- Query Parameter Structs ---

/// IdParam
///
/// Target row for the `?id=` style mutation endpoints.
#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdParam {
    pub id: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// PageParams
///
/// Pagination for listings that take no filters.
#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: 0,
        }
    }
}

impl PageParams {
    fn validate(&self) -> ApiResult<()> {
        if self.limit < 0 || self.skip < 0 {
            return Err(AppError::validation("limit и skip не могут быть отрицательными"));
        }
        Ok(())
    }
}

/// OwnedJobsParams
///
/// Result cap for an owner's job listing.
#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnedJobsParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for OwnedJobsParams {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT }
    }
}

/// ResponseListParams
///
/// `only_active=true` drops responses whose job has been deactivated.
#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResponseListParams {
    #[serde(default)]
    pub only_active: bool,
}

/// CreateResponseParams
///
/// Responses are submitted as query parameters (POST /responses?job_id=&message=).
#[derive(Debug, Serialize, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct CreateResponseParams {
    pub job_id: i64,
    #[validate(length(min = 1))]
    pub message: String,
}

// --- Job Handlers ---

/// list_jobs
///
/// [Public Route] Lists jobs with the composable salary/activeness filters,
/// ordering over `created_at` and limit/skip pagination.
#[utoipa::path(
    get,
    path = "/jobs",
    params(JobQuery),
    responses(
        (status = 200, description = "Filtered jobs", body = [Job]),
        (status = 400, description = "Invalid pagination", body = ErrorBody)
    )
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> ApiResult<Json<Vec<Job>>> {
    query.validate().map_err(AppError::Validation)?;
    let jobs = state.repo.list_jobs(&query).await?;
    Ok(Json(jobs))
}

/// list_owned_jobs
///
/// [Authenticated Route] Lists every job (active or not) owned by `user_id`, which
/// must be the requesting company itself.
#[utoipa::path(
    get,
    path = "/jobs/{user_id}",
    params(
        ("user_id" = i64, Path, description = "Owner id"),
        OwnedJobsParams
    ),
    responses(
        (status = 200, description = "Jobs owned by the user", body = [Job]),
        (status = 403, description = "Actor is a seeker", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn list_owned_jobs(
    AuthUser { actor }: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<OwnedJobsParams>,
) -> ApiResult<Json<Vec<Job>>> {
    if params.limit < 0 {
        return Err(AppError::validation("limit не может быть отрицательным"));
    }
    let owner = state.repo.get_user(user_id).await?;
    policy::list_owned_jobs(&actor, owner.as_ref())?;

    let jobs = state.repo.list_jobs_by_owner(user_id, params.limit).await?;
    Ok(Json(jobs))
}

/// create_job
///
/// [Authenticated Route] Posts a vacancy owned by the requesting company.
/// The payload is validated before any store access.
#[utoipa::path(
    post,
    path = "/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 200, description = "Created", body = Job),
        (status = 400, description = "Invalid salary range", body = ErrorBody),
        (status = 403, description = "Actor is a seeker", body = ErrorBody),
        (status = 404, description = "Actor not found", body = ErrorBody)
    )
)]
pub async fn create_job(
    AuthUser { actor }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateJobRequest>,
) -> ApiResult<Json<Job>> {
    payload.validate()?;
    policy::create_job(&actor)?;

    let job = state.repo.create_job(actor.id(), payload).await?;
    tracing::info!(job_id = job.id, owner_id = job.user_id, "job created");
    Ok(Json(job))
}

/// update_job
///
/// [Authenticated Route] Partially updates a job owned by the requesting user.
///
/// *Authorization*: a foreign job answers 404, exactly like a missing one.
#[utoipa::path(
    put,
    path = "/jobs",
    params(IdParam),
    request_body = UpdateJobRequest,
    responses(
        (status = 200, description = "Updated", body = Job),
        (status = 400, description = "Invalid salary range", body = ErrorBody),
        (status = 404, description = "Not found or not owner", body = ErrorBody)
    )
)]
pub async fn update_job(
    AuthUser { actor }: AuthUser,
    State(state): State<AppState>,
    Query(IdParam { id }): Query<IdParam>,
    Json(payload): Json<UpdateJobRequest>,
) -> ApiResult<Json<Job>> {
    payload.validate()?;

    let current = state.repo.get_job(id).await?;
    let current = policy::modify_job(&actor, current.as_ref())?.clone();

    let merged = payload.apply_to(current);
    models::check_salary_range(merged.salary_from, merged.salary_to)
        .map_err(|e| AppError::validation(e.to_string()))?;

    let job = state
        .repo
        .update_job(merged)
        .await?
        .ok_or_else(|| AppError::not_found(JOB_NOT_FOUND))?;
    tracing::info!(job_id = job.id, "job updated");
    Ok(Json(job))
}

/// delete_job
///
/// [Authenticated Route] Deletes a job owned by the requesting user together with
/// every response to it.
#[utoipa::path(
    delete,
    path = "/jobs",
    params(IdParam),
    responses(
        (status = 200, description = "Deleted job", body = Job),
        (status = 404, description = "Not found or not owner", body = ErrorBody)
    )
)]
pub async fn delete_job(
    AuthUser { actor }: AuthUser,
    State(state): State<AppState>,
    Query(IdParam { id }): Query<IdParam>,
) -> ApiResult<Json<Job>> {
    let current = state.repo.get_job(id).await?;
    policy::modify_job(&actor, current.as_ref())?;

    let job = state
        .repo
        .delete_job(id)
        .await?
        .ok_or_else(|| AppError::not_found(JOB_NOT_FOUND))?;
    tracing::info!(job_id = job.id, "job deleted");
    Ok(Json(job))
}

// --- Response Handlers ---

/// list_responses
///
/// [Authenticated Route] A seeker sees the responses they submitted; a company sees
/// the responses to its own jobs.
#[utoipa::path(
    get,
    path = "/responses",
    params(ResponseListParams),
    responses((status = 200, description = "My responses", body = [models::Response]))
)]
pub async fn list_responses(
    AuthUser { actor }: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ResponseListParams>,
) -> ApiResult<Json<Vec<models::Response>>> {
    let query = match actor {
        Actor::Seeker(id) => ResponseQuery::by_applicant(id, params.only_active),
        Actor::Company(id) => ResponseQuery::by_employer(id, params.only_active),
    };
    let responses = state.repo.list_responses(&query).await?;
    Ok(Json(responses))
}

/// create_response
///
/// [Authenticated Route] Submits a seeker's response to an active job.
///
/// *Authorization*: the role and activeness rules run in the store, against the
/// job as it is at insert time.
#[utoipa::path(
    post,
    path = "/responses",
    params(CreateResponseParams),
    responses(
        (status = 200, description = "Created", body = models::Response),
        (status = 403, description = "Actor is a company or job inactive", body = ErrorBody),
        (status = 404, description = "Job not found", body = ErrorBody)
    )
)]
pub async fn create_response(
    AuthUser { actor }: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CreateResponseParams>,
) -> ApiResult<Json<models::Response>> {
    params.validate()?;

    let response = state
        .repo
        .create_response(actor, params.job_id, params.message)
        .await?;
    tracing::info!(response_id = response.id, job_id = response.job_id, "response created");
    Ok(Json(response))
}

/// update_response
///
/// [Authenticated Route] Replaces the message of the requesting user's response.
#[utoipa::path(
    put,
    path = "/responses",
    params(IdParam),
    request_body = UpdateResponseRequest,
    responses(
        (status = 200, description = "Updated", body = models::Response),
        (status = 404, description = "Not found or not owner", body = ErrorBody)
    )
)]
pub async fn update_response(
    AuthUser { actor }: AuthUser,
    State(state): State<AppState>,
    Query(IdParam { id }): Query<IdParam>,
    Json(payload): Json<UpdateResponseRequest>,
) -> ApiResult<Json<models::Response>> {
    payload.validate()?;

    let current = state.repo.get_response(id).await?;
    let mut response = policy::modify_response(&actor, current.as_ref())?.clone();
    response.message = payload.message;

    let response = state
        .repo
        .update_response(response)
        .await?
        .ok_or_else(|| AppError::not_found(RESPONSE_NOT_FOUND))?;
    tracing::info!(response_id = response.id, "response updated");
    Ok(Json(response))
}

/// delete_response
///
/// [Authenticated Route] Withdraws the requesting user's response.
#[utoipa::path(
    delete,
    path = "/responses",
    params(IdParam),
    responses(
        (status = 200, description = "Deleted response", body = models::Response),
        (status = 404, description = "Not found or not owner", body = ErrorBody)
    )
)]
pub async fn delete_response(
    AuthUser { actor }: AuthUser,
    State(state): State<AppState>,
    Query(IdParam { id }): Query<IdParam>,
) -> ApiResult<Json<models::Response>> {
    let current = state.repo.get_response(id).await?;
    policy::modify_response(&actor, current.as_ref())?;

    let response = state
        .repo
        .delete_response(id)
        .await?
        .ok_or_else(|| AppError::not_found(RESPONSE_NOT_FOUND))?;
    tracing::info!(response_id = response.id, "response deleted");
    Ok(Json(response))
}

// --- User Handlers ---

/// list_users
///
/// [Public Route] Lists registered users in id order.
#[utoipa::path(
    get,
    path = "/users",
    params(PageParams),
    responses((status = 200, description = "Users", body = [User]))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Vec<User>>> {
    page.validate()?;
    let users = state.repo.list_users(page.limit, page.skip).await?;
    Ok(Json(users))
}

/// register_user
///
/// [Public Route] Registers a seeker or a company.
///
/// *Flow*: validate the payload, hand the credentials to the identity provider,
/// then store the local profile with the credential reference it returned.
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = User),
        (status = 400, description = "Invalid payload or duplicate email", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> ApiResult<Json<User>> {
    payload.validate()?;

    let password_hash = state
        .identity
        .register_credentials(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            tracing::error!("identity provider error: {}", e);
            AppError::Internal("identity provider unavailable".to_string())
        })?;

    let user = state
        .repo
        .create_user(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash,
            is_company: payload.is_company,
        })
        .await?;
    tracing::info!(user_id = user.id, is_company = user.is_company, "user registered");
    Ok(Json(user))
}

/// update_user
///
/// [Authenticated Route] Updates the requesting user's own profile.
///
/// *Role switch*: a company must delete its jobs before becoming a seeker, a
/// seeker must delete its responses before becoming a company. The store checks
/// this while the user row is locked.
#[utoipa::path(
    put,
    path = "/users",
    params(IdParam),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Invalid payload or duplicate email", body = ErrorBody),
        (status = 403, description = "Role switch blocked by owned rows", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn update_user(
    AuthUser { actor }: AuthUser,
    State(state): State<AppState>,
    Query(IdParam { id }): Query<IdParam>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    payload.validate()?;

    let target = state.repo.get_user(id).await?;
    policy::update_user(&actor, target.as_ref())?;

    let user = state
        .repo
        .update_user(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    tracing::info!(user_id = user.id, is_company = user.is_company, "user updated");
    Ok(Json(user))
}
