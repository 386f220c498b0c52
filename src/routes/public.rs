use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that need no token. Job search only exposes what the caller asks
/// for through the query parameters; nothing here mutates an existing row.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /jobs?filter_by_salary=&filter_by_activeness=&order_by=&salary=&limit=&skip=
        // Filtered, ordered and paginated job search.
        .route("/jobs", get(handlers::list_jobs))
        // GET /users?limit=&skip=  |  POST /users
        // Listing and registration share the path.
        .route(
            "/users",
            get(handlers::list_users).post(handlers::register_user),
        )
}
