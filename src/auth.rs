use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env},
    error::{AppError, USER_NOT_FOUND},
    policy::Actor,
    repository::RepositoryState,
};

/// Claims
///
/// Payload expected inside the JWT issued by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the numeric user id, as a string.
    pub sub: String,
    /// Expiration Time (exp): the token is rejected after this timestamp.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Handlers match on the
/// `actor` variant instead of inspecting a role flag.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub actor: Actor,
}

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.actor.id()
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, so authentication stays out of the
/// handler bodies.
///
/// The process:
/// 1. Dependency Resolution: Repository and AppConfig from the application state.
/// 2. Local Bypass: `x-user-id` header, only in `Env::Local`.
/// 3. Token Validation: Bearer token extraction and JWT decoding.
/// 4. DB Lookup: the user's current role, which becomes the `Actor` variant.
///
/// Rejection: 401 for a missing or invalid token, 404 when the token's user no
/// longer exists.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Local Development Bypass Check
        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<i64>().ok());

            if let Some(user_id) = bypass_id {
                if let Some(user) = repo.get_user(user_id).await? {
                    return Ok(AuthUser {
                        actor: Actor::from_user(&user),
                    });
                }
            }
        }
        // Otherwise fall through to the standard JWT flow.

        // 3. Token Extraction
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        // 4. Decode and Validate the Token
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!("rejected token: {:?}", e.kind());
            AppError::Unauthorized
        })?;

        let user_id = token_data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized)?;

        // 5. Database Lookup (Final Verification)
        // A valid token for a deleted user cannot act on anything.
        let user = repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

        Ok(AuthUser {
            actor: Actor::from_user(&user),
        })
    }
}
