use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Authenticated Router Module
///
/// Every handler here receives a resolved `AuthUser`. The router is merged next to
/// the public one, so `/jobs` and `/users` carry both public and protected methods.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /jobs/{user_id}?limit=
        // All jobs of the requesting company, inactive ones included.
        .route("/jobs/{user_id}", get(handlers::list_owned_jobs))
        // POST /jobs  |  PUT /jobs?id=  |  DELETE /jobs?id=
        // Deleting a job removes its responses in the same transaction.
        .route(
            "/jobs",
            axum::routing::post(handlers::create_job)
                .put(handlers::update_job)
                .delete(handlers::delete_job),
        )
        // GET /responses?only_active=  |  POST /responses?job_id=&message=
        // PUT /responses?id=  |  DELETE /responses?id=
        .route(
            "/responses",
            get(handlers::list_responses)
                .post(handlers::create_response)
                .put(handlers::update_response)
                .delete(handlers::delete_response),
        )
        // PUT /users?id=
        // Own profile only; role switches are gated on owned rows.
        .route("/users", put(handlers::update_user))
}
