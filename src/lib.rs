use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Domain: models, filters and authorization rules.
pub mod models;
pub mod policy;
pub mod query;

// Services and plumbing.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod repository;

// Routing split by access level (Public, Authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use identity::{IdentityState, MockIdentityProvider, RemoteIdentityProvider};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_jobs, handlers::list_owned_jobs, handlers::create_job,
        handlers::update_job, handlers::delete_job, handlers::list_responses,
        handlers::create_response, handlers::update_response, handlers::delete_response,
        handlers::list_users, handlers::register_user, handlers::update_user
    ),
    components(
        schemas(
            models::User, models::Job, models::Response, models::CreateJobRequest,
            models::UpdateJobRequest, models::UpdateResponseRequest,
            models::RegisterUserRequest, models::UpdateUserRequest,
            query::SalaryFilter, query::ActivenessFilter, query::SortOrder,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "job-board", description = "Job board API: companies post jobs, seekers respond")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for the request-independent services. Cloned per
/// request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Persistence for users, jobs and responses.
    pub repo: RepositoryState,
    /// External credential store used at registration.
    pub identity: IdentityState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request before it reaches a protected handler when `AuthUser`
/// cannot be resolved (401 for a bad token, 404 for a vanished user).
async fn auth_middleware(
    _auth_user: AuthUser,
    request: Request,
    next: Next,
) -> axum::response::Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing table, the scoped auth layer and the global
/// observability layers, then binds the shared state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // `route_layer` keeps the auth check scoped to the authenticated methods even
        // where they share a path with public ones.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: correlates every log line of a request through
/// its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
