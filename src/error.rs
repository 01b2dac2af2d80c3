use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::security::CredentialError;

pub type ApiResult<T> = Result<T, ApiError>;

/// ErrorCode
///
/// Machine-readable codes returned in the `error` field of every failure body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadUsername,
    BadEmail,
    BadPassword,
    NameAlreadyUsed,
    EmailAlreadyUsed,
    AuthMissing,
    AuthWrongType,
    AuthTokenMissing,
    AuthTokenInvalid,
    EmailOrPasswordIncorrect,
    PrivatePost,
    Unauthorized,
    PostNotFound,
    NotFound,
    BadRequest,
    InternalServerError,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 16] = [
        ErrorCode::BadUsername,
        ErrorCode::BadEmail,
        ErrorCode::BadPassword,
        ErrorCode::NameAlreadyUsed,
        ErrorCode::EmailAlreadyUsed,
        ErrorCode::AuthMissing,
        ErrorCode::AuthWrongType,
        ErrorCode::AuthTokenMissing,
        ErrorCode::AuthTokenInvalid,
        ErrorCode::EmailOrPasswordIncorrect,
        ErrorCode::PrivatePost,
        ErrorCode::Unauthorized,
        ErrorCode::PostNotFound,
        ErrorCode::NotFound,
        ErrorCode::BadRequest,
        ErrorCode::InternalServerError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadUsername => "BAD_USERNAME",
            ErrorCode::BadEmail => "BAD_EMAIL",
            ErrorCode::BadPassword => "BAD_PASSWORD",
            ErrorCode::NameAlreadyUsed => "NAME_ALREADY_USED",
            ErrorCode::EmailAlreadyUsed => "EMAIL_ALREADY_USED",
            ErrorCode::AuthMissing => "AUTH_MISSING",
            ErrorCode::AuthWrongType => "AUTH_WRONG_TYPE",
            ErrorCode::AuthTokenMissing => "AUTH_TOKEN_MISSING",
            ErrorCode::AuthTokenInvalid => "AUTH_TOKEN_INVALID",
            ErrorCode::EmailOrPasswordIncorrect => "EMAIL_OR_PASSWORD_INCORRECT",
            ErrorCode::PrivatePost => "PRIVATE_POST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::PostNotFound => "POST_NOT_FOUND",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ApiError
///
/// The single error type returned by middleware and handlers. Client errors carry
/// their status and code; store and credential failures collapse into a generic 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(ErrorCode),

    #[error("unauthorized: {0}")]
    Unauthorized(ErrorCode),

    #[error("forbidden: {0}")]
    Forbidden(ErrorCode),

    #[error("not found: {code} ({method} {path})")]
    NotFound {
        code: ErrorCode,
        method: Method,
        path: String,
    },

    /// Body or query string that could not be extracted at all.
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("credential error: {0}")]
    Credentials(#[from] CredentialError),
}

/// ErrorBody
///
/// JSON shape of every error response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Malformed(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Credentials(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::BadRequest(code)
            | ApiError::Unauthorized(code)
            | ApiError::Forbidden(code)
            | ApiError::NotFound { code, .. } => *code,
            ApiError::Malformed(_) => ErrorCode::BadRequest,
            ApiError::Database(_) | ApiError::Credentials(_) => ErrorCode::InternalServerError,
        }
    }

    fn log(&self) {
        match self {
            ApiError::Database(e) => tracing::error!(error = %e, "repository failure"),
            ApiError::Credentials(e) => tracing::error!(error = %e, "credential failure"),
            ApiError::Malformed(detail) => tracing::warn!(detail = %detail, "malformed request"),
            _ => tracing::warn!(status = %self.status_code(), code = %self.code(), "request rejected"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        let body = match self {
            ApiError::NotFound { code, method, path } => ErrorBody {
                error: code,
                method: Some(method.to_string()),
                path: Some(path),
            },
            other => ErrorBody {
                error: other.code(),
                method: None,
                path: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}
