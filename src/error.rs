use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable client-facing messages. Raw upstream error text is logged
/// server-side only and never forwarded in any of these.
pub mod msg {
    pub const SESSION_ID_REQUIRED: &str = "Payment session id is required";
    pub const PAYMENT_NOT_COMPLETED: &str = "Payment not completed";
    pub const SIGNUP_NOT_FOUND: &str = "Pending signup not found";
    pub const ACCOUNT_EXISTS: &str =
        "An account with this email already exists. Try logging in instead.";
    pub const INTERNAL: &str =
        "An unexpected error occurred. Please try again or contact support.";
    pub const SLUG_TAKEN: &str = "This site address is already taken";
    pub const INVALID_SLUG: &str =
        "Site address must be 3-63 characters: lowercase letters, digits and hyphens";
    pub const INVALID_EMAIL: &str = "A valid email address is required";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Identity creation hit an existing account. Carries a machine-readable
    /// code so the signup UI can offer "log in instead".
    #[error("Account already exists")]
    AccountExists,

    /// A downstream service (payment processor, auth provider, email) failed
    /// or returned an unexpected shape. The string is internal detail: it is
    /// logged and replaced by a generic message in the response.
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// A required integration is not configured for this deployment.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, code, message) = match &self {
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone(), None, None),
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone(), None, None),
            AppError::AccountExists => (
                StatusCode::BAD_REQUEST,
                msg::ACCOUNT_EXISTS.to_string(),
                Some("ACCOUNT_EXISTS_OR_ERROR"),
                None,
            ),
            AppError::NotConfigured(what) => {
                tracing::error!(integration = what, "Request rejected: integration not configured");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                    None,
                    None,
                )
            }
            AppError::Upstream(detail) => {
                tracing::error!("Upstream service error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    Some(msg::INTERNAL),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    Some(msg::INTERNAL),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    Some(msg::INTERNAL),
                )
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid JSON".to_string(),
                    None,
                    None,
                )
            }
        };

        let body = ErrorResponse { error, code, message };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
