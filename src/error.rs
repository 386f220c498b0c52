//! Error types shared by the repository, the authorization rules and the handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const USER_NOT_FOUND: &str = "Пользователь не найден";
pub const SEEKER_CANNOT_POST_JOBS: &str = "Вы соискатель. Вакансии создаются компаниями";
pub const JOB_NOT_FOUND: &str = "Вакансия не найдена";
pub const NOT_YOUR_JOB: &str = "Это не ваша вакансия";
pub const TARGET_JOB_NOT_FOUND: &str = "Работа не найдена";
pub const COMPANY_CANNOT_RESPOND: &str = "Вы работодатель. На вакансии откликаются соискатели";
pub const JOB_NOT_ACTIVE: &str = "Вакансия не является активной";
pub const RESPONSE_NOT_FOUND: &str = "Отклик не найден";
pub const NOT_YOUR_RESPONSE: &str = "Это не ваш отклик";
pub const DELETE_YOUR_JOBS: &str = "Удалите все свои вакансии";
pub const DELETE_YOUR_RESPONSES: &str = "Удалите все свои отклики";
pub const DUPLICATE_EMAIL: &str = "Пользователь с таким email уже существует";

/// Failures raised by a `Repository` implementation.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("email is already registered")]
    DuplicateEmail,

    /// A rule evaluated against rows locked inside the write transaction failed.
    #[error(transparent)]
    Rejected(#[from] AppError),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// AppError
///
/// The terminal error of a request. `NotFound` covers both a missing entity and
/// an entity the actor may not see.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Не авторизован")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateEmail => AppError::validation(DUPLICATE_EMAIL),
            RepositoryError::Database(e) => AppError::Internal(e.to_string()),
            RepositoryError::Rejected(e) => e,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// ErrorBody
///
/// JSON shape of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Database details stay in the logs outside local development.
        let detail = match &self {
            AppError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                if std::env::var("APP_ENV").unwrap_or_default() == "production" {
                    "Внутренняя ошибка сервера".to_string()
                } else {
                    msg.clone()
                }
            }
            _ => {
                tracing::debug!(status = status.as_u16(), "request rejected: {}", self);
                self.to_string()
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
