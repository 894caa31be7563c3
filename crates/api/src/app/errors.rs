//! Consistent JSON error responses: `{"error": "<code>", "message": "<text>"}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use dailyspend_infra::ServiceError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, message: String },
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    /// Details are logged, never returned.
    Internal(String),
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::bad_request("validation_error", message)
    }

    /// The single response for every failed login, whatever the cause.
    pub fn invalid_credentials() -> Self {
        Self::bad_request("invalid_credentials", "invalid credentials")
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::DuplicateUsername => Self::bad_request("duplicate_username", "username already taken"),
            ServiceError::InvalidCredential => Self::invalid_credentials(),
            ServiceError::NotFound => Self::not_found("not found"),
            ServiceError::Unauthorized => Self::unauthorized("unauthorized"),
            ServiceError::Forbidden => Self::Forbidden("admin role required".into()),
            ServiceError::InvalidInput(msg) => Self::validation(msg),
            ServiceError::Store(e) => Self::Internal(e.to_string()),
            ServiceError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("invalid_body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request("invalid_query", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::BadRequest { code, message } => json_error(status, code, message),
            ApiError::Unauthorized(msg) => json_error(status, "unauthorized", msg),
            ApiError::Forbidden(msg) => json_error(status, "forbidden", msg),
            ApiError::NotFound(msg) => json_error(status, "not_found", msg),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                json_error(status, "internal_error", "internal server error")
            }
        }
    }
}
