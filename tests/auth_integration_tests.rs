use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use job_board::{
    AppState, MemoryRepository, MockIdentityProvider,
    auth::{AuthUser, Claims},
    config::{AppConfig, Env},
    models::{NewUser, User},
    policy::Actor,
    repository::Repository,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn create_token(sub: &str, exp: u64, secret: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        iat: now() as usize,
        exp: exp as usize,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn valid_token(user_id: i64) -> String {
    create_token(&user_id.to_string(), now() + 3600, TEST_JWT_SECRET)
}

async fn seed_user(repo: &MemoryRepository, email: &str, is_company: bool) -> User {
    repo.create_user(NewUser {
        name: "Test".to_string(),
        email: email.to_string(),
        password_hash: "ref".to_string(),
        is_company,
    })
    .await
    .unwrap()
}

fn create_app_state(env: Env, repo: Arc<MemoryRepository>) -> AppState {
    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };

    AppState {
        repo,
        identity: Arc::new(MockIdentityProvider::new()),
        config,
    }
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(parts: &mut Parts, token: &str) {
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
}

fn with_bypass(parts: &mut Parts, user_id: &str) {
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(user_id).unwrap(),
    );
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_resolves_role_from_store() {
    let repo = Arc::new(MemoryRepository::new());
    let company = seed_user(&repo, "hr@corp.example", true).await;
    let seeker = seed_user(&repo, "me@mail.example", false).await;
    let app_state = create_app_state(Env::Production, repo);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &valid_token(company.id));
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap();
    assert_eq!(auth_user.actor, Actor::Company(company.id));

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &valid_token(seeker.id));
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap();
    assert_eq!(auth_user.actor, Actor::Seeker(seeker.id));
    assert_eq!(auth_user.id(), seeker.id);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(Env::Production, Arc::new(MemoryRepository::new()));

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    let err = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap_err();

    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let repo = Arc::new(MemoryRepository::new());
    let user = seed_user(&repo, "late@mail.example", false).await;
    let app_state = create_app_state(Env::Production, repo);

    // Well past the default validation leeway.
    let token = create_token(&user.id.to_string(), now() - 3600, TEST_JWT_SECRET);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let err = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    let repo = Arc::new(MemoryRepository::new());
    let user = seed_user(&repo, "forged@mail.example", false).await;
    let app_state = create_app_state(Env::Production, repo);

    let token = create_token(&user.id.to_string(), now() + 3600, "some-other-secret");
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let err = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_non_numeric_subject() {
    let app_state = create_app_state(Env::Production, Arc::new(MemoryRepository::new()));

    let token = create_token("not-a-number", now() + 3600, TEST_JWT_SECRET);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &token);

    let err = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_valid_token_for_missing_user_is_not_found() {
    let app_state = create_app_state(Env::Production, Arc::new(MemoryRepository::new()));

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &valid_token(404));

    let err = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "Пользователь не найден");
}

#[tokio::test]
async fn test_local_bypass_success() {
    let repo = Arc::new(MemoryRepository::new());
    let company = seed_user(&repo, "local@dev.example", true).await;
    let app_state = create_app_state(Env::Local, repo);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bypass(&mut parts, &company.id.to_string());

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap();
    assert_eq!(auth_user.actor, Actor::Company(company.id));
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let repo = Arc::new(MemoryRepository::new());
    let user = seed_user(&repo, "prod@dev.example", false).await;
    let app_state = create_app_state(Env::Production, repo);

    // Provide ONLY the local bypass header
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bypass(&mut parts, &user.id.to_string());

    let err = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}
