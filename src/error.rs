use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum PlatformError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("{0}")]
    Validation(String),

    /// A request the extractors could not turn into typed input.
    #[error("Malformed request: {message}")]
    MalformedRequest { status: StatusCode, message: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Please log in first")]
    Unauthorized,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("No fields to update")]
    NoFieldsToUpdate,

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("Upstream returned an empty completion")]
    EmptyCompletion,
}

impl PlatformError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Transport failures and 5xx answers are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::UpstreamStatus(code) => code.is_server_error(),
            _ => false,
        }
    }

    /// True when the error is a SQLite UNIQUE constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::DatabaseError(SqlxError::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            PlatformError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("VALIDATION_ERROR", msg),
            ),
            PlatformError::MalformedRequest { status, message } => {
                let code = match status {
                    StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
                    StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
                    _ => "INVALID_REQUEST",
                };
                (status, ApiErrorBody::new(code, message))
            }
            PlatformError::NoFieldsToUpdate => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("NO_FIELDS", "No fields to update."),
            ),
            PlatformError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("INVALID_CREDENTIALS", "Invalid username or password."),
            ),
            PlatformError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("UNAUTHORIZED", "Please log in first."),
            ),
            PlatformError::UsernameTaken => (
                StatusCode::CONFLICT,
                ApiErrorBody::new("USERNAME_TAKEN", "Username already exists."),
            ),
            PlatformError::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                ApiErrorBody::new("NOT_FOUND", format!("{entity} {id} not found.")),
            ),
            PlatformError::Reqwest(_)
            | PlatformError::UrlParse(_)
            | PlatformError::EmptyCompletion => {
                error!(error = %self, "assistant upstream failure");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiErrorBody::new("BAD_GATEWAY", "Assistant service is unavailable."),
                )
            }
            PlatformError::UpstreamStatus(code) => {
                let (err_code, msg) = match code {
                    StatusCode::TOO_MANY_REQUESTS => {
                        ("RATE_LIMIT", "Assistant rate limit exceeded.")
                    }
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        ("UPSTREAM_AUTH", "Assistant API key was rejected.")
                    }
                    _ => ("UPSTREAM_ERROR", "An upstream error occurred."),
                };
                let status = if code == StatusCode::TOO_MANY_REQUESTS {
                    code
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (status, ApiErrorBody::new(err_code, msg))
            }
            PlatformError::DatabaseError(_)
            | PlatformError::Json(_)
            | PlatformError::Hash(_)
            | PlatformError::Join(_)
            | PlatformError::Io(_)
            | PlatformError::Config(_) => {
                error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred."),
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

impl From<JsonRejection> for PlatformError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for PlatformError {
    fn from(rejection: PathRejection) -> Self {
        Self::MalformedRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for PlatformError {
    fn from(rejection: QueryRejection) -> Self {
        Self::MalformedRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiErrorBody {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
