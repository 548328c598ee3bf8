//! Application error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Application-level error.
///
/// Everything that can fail at a service edge maps onto one of these
/// variants; `status`/`code` drive the REST responses, and GraphQL
/// resolvers propagate the `Display` message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0} cannot be found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to authorize viewer: {0}")]
    Unauthorized(String),

    #[error("invalid webhook signature: {0}")]
    WebhookSignature(String),

    #[error("google api error: {0}")]
    Google(String),

    #[error("stripe api error: {0}")]
    Stripe(String),

    #[error("openai api error: {0}")]
    OpenAi(String),

    #[error("email delivery failed: {0}")]
    Email(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::WebhookSignature(_) => "WEBHOOK_SIGNATURE",
            AppError::Google(_) => "GOOGLE_ERROR",
            AppError::Stripe(_) => "STRIPE_ERROR",
            AppError::OpenAi(_) => "OPENAI_ERROR",
            AppError::Email(_) => "EMAIL_ERROR",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Http(_) => "UPSTREAM_ERROR",
            AppError::Io(_) => "IO_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::WebhookSignature(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Google(_)
            | AppError::Stripe(_)
            | AppError::OpenAi(_)
            | AppError::Email(_)
            | AppError::Http(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Store(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({
            "error": { "code": self.code(), "message": self.to_string() }
        }));
        (status, body).into_response()
    }
}

/// Result alias used throughout the crate.
pub type AppResult<T> = Result<T, AppError>;

/// Turns absent documents into not-found errors at the resolver layer.
pub trait OptionExt<T> {
    fn or_not_found(self, what: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, what: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(what.to_string()))
    }
}
