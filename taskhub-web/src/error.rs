/// TaskHub Web - Error types.
///
/// Every fallible path returns `AppResult<T>`; handlers rely on the
/// `IntoResponse` implementation to turn an error into a JSON body.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// A live connection handshake arrived without an identity.
    #[error("Authentication required")]
    AuthenticationMissing,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// HTTP status the error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) | AppError::AuthenticationMissing => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Internal(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Database operation failed".to_string()
            }
            AppError::Pool(msg) => {
                tracing::error!(error = %msg, "Connection pool error");
                "Database operation failed".to_string()
            }
            AppError::Auth(msg) => msg,
            AppError::AuthenticationMissing => "Authentication required".to_string(),
            AppError::Validation(msg) => msg,
            AppError::NotFound(msg) => msg,
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                "Internal server error".to_string()
            }
            AppError::Config(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                "Configuration error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for convenience.
pub type AppResult<T> = Result<T, AppError>;
