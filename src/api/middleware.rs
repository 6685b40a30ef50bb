use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Invalid SQL: {0}")]
    InvalidSql(String),

    #[error("Query engine error: {0}")]
    QueryEngine(String),

    #[error("Query did not complete within {0} seconds")]
    QueryTimeout(u64),

    #[error("Audit log error: {0}")]
    Audit(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg),
            ),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("AUTHENTICATION_REQUIRED", msg),
            ),
            AppError::InvalidSql(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("INVALID_SQL", msg),
            ),
            AppError::QueryEngine(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new("QUERY_ENGINE_ERROR", msg),
            ),
            timeout @ AppError::QueryTimeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorDetail::new("QUERY_TIMEOUT", timeout.to_string())
                    .with_details("Consider narrowing the question or checking engine load."),
            ),
            AppError::Audit(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("AUDIT_ERROR", msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_detail,
        });

        (status, body).into_response()
    }
}

/// Convert anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert rusqlite::Error to AppError
impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Audit(err.to_string())
    }
}

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Identity of an already-authenticated caller.
///
/// Set by the upstream authentication layer; requests without it never reach
/// the translation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
    pub role: String,
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))?;
        let role = header_value(parts, USER_ROLE_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", USER_ROLE_HEADER)))?;

        Ok(Self { user_id, role })
    }
}
