use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// 1. IdentityProvider Contract
/// IdentityProvider
///
/// Abstract contract for the external auth provider that owns password hashing.
/// The service never sees a hash algorithm: it hands over the raw credentials once,
/// at registration, and stores the opaque reference it gets back.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers `email`/`password` with the provider and returns the credential
    /// hash to persist as `users.password_hash`.
    async fn register_credentials(&self, email: &str, password: &str) -> Result<String, String>;
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Minimal shape of the provider's signup answer.
#[derive(Deserialize)]
struct SignupResponse {
    password_hash: String,
}

// 2. The Real Implementation
/// RemoteIdentityProvider
///
/// Calls the provider's `/auth/v1/signup` endpoint over HTTP.
#[derive(Clone)]
pub struct RemoteIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteIdentityProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn register_credentials(&self, email: &str, password: &str) -> Result<String, String> {
        let url = format!("{}/auth/v1/signup", self.base_url);

        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(&SignupRequest { email, password })
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("identity provider rejected signup: {}", response.status()));
        }

        let body = response
            .json::<SignupResponse>()
            .await
            .map_err(|e| e.to_string())?;

        Ok(body.password_hash)
    }
}

// 3. The Mock Implementation (For Tests)
/// MockIdentityProvider
///
/// Accepts every signup without network access and returns a deterministic,
/// recognisable credential reference.
#[derive(Clone, Default)]
pub struct MockIdentityProvider {
    /// When true, every signup is rejected.
    pub should_fail: bool,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn register_credentials(&self, email: &str, _password: &str) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Identity Error: Simulation requested".to_string());
        }
        Ok(format!("mock-credential:{}", email))
    }
}

/// IdentityState
///
/// The concrete type used to share the identity provider across the application state.
pub type IdentityState = Arc<dyn IdentityProvider>;
