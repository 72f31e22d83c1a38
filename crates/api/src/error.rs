use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vitrine_client::api::ApiError;
use vitrine_client::auth::AuthError;
use vitrine_client::autosave::SaveError;
use vitrine_client::compose::ComposeStreamError;
use vitrine_client::editor::SessionError;
use vitrine_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and the client crate's errors for
/// CMS backend failures. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `vitrine_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The CMS backend failed or rejected a request.
    #[error(transparent)]
    Upstream(#[from] ApiError),

    /// A canvas write failed.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// The compose stream could not be opened.
    #[error(transparent)]
    Compose(#[from] ComposeStreamError),

    /// A login or passkey payload was malformed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Core(e) => Self::Core(e),
            SessionError::Save(e) => Self::Save(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- CMS backend errors ---
            AppError::Upstream(err) => classify_upstream_error(err),
            AppError::Save(SaveError::Store(err)) => classify_upstream_error(err),
            AppError::Save(SaveError::Stopped) => {
                tracing::error!("Autosave task stopped unexpectedly");
                internal()
            }
            AppError::Compose(ComposeStreamError::Open(err)) => classify_upstream_error(err),
            AppError::Compose(err) => {
                tracing::warn!(error = %err, "Compose stream error");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "The compose stream failed".to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::Auth(err) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a CMS backend error into an HTTP status, error code, and message.
///
/// - 401, 403, 404 and 409 keep their meaning.
/// - Other 4xx answers map to 400.
/// - Everything else, including network failures, maps to 502. Upstream
///   bodies are logged, never echoed.
fn classify_upstream_error(err: &ApiError) -> (StatusCode, &'static str, String) {
    match err.status() {
        Some(401) => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "The CMS backend rejected the credentials".to_string(),
        ),
        Some(403) => (
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "The CMS backend denied access".to_string(),
        ),
        Some(404) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found in the CMS backend".to_string(),
        ),
        Some(409) => (
            StatusCode::CONFLICT,
            "CONFLICT",
            "The CMS backend reported a conflict".to_string(),
        ),
        Some(status) if (400..500).contains(&status) => {
            tracing::warn!(error = %err, "CMS backend rejected request");
            (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                "The CMS backend rejected the request".to_string(),
            )
        }
        _ => {
            tracing::error!(error = %err, "CMS backend error");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "The CMS backend is unavailable".to_string(),
            )
        }
    }
}
