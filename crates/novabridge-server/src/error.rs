//! Error types for the NovaBridge HTTP API.
//!
//! [`ApiError`] is the single failure type every handler returns. Its
//! [`IntoResponse`](axum::response::IntoResponse) implementation renders
//! the error envelope `{"status":"error","error":...,"code":...}`.
//! Errors from the core and host crates convert into it by kind.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use novabridge_core::DispatchError;
use novabridge_core::SessionError;
use novabridge_core::codec::CodecError;
use novabridge_core::mesh::MeshError;
use novabridge_core::stream::StreamConfigError;
use novabridge_host::HostError;
use tracing::warn;

/// Errors returned by API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input: bad JSON, a missing or wrong-typed field, or a
    /// value out of range.
    #[error("{0}")]
    BadRequest(String),

    /// An API key is required and was missing or wrong.
    #[error("Unauthorized")]
    Unauthorized,

    /// A named object does not resolve.
    #[error("{0}")]
    NotFound(String),

    /// The spawn rate window is exhausted.
    #[error("{message}")]
    RateLimited {
        /// Message shown to the caller.
        message: String,
        /// Seconds until the window resets.
        retry_after_secs: u64,
    },

    /// An optional host subsystem is not available.
    #[error("{0}")]
    NotImplemented(String),

    /// Routes have been unbound during shutdown.
    #[error("NovaBridge is shutting down")]
    ShuttingDown,

    /// The host or the bridge failed for an opaque reason.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for [`ApiError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Shorthand for [`ApiError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// The HTTP status this error renders with.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "status": "error",
            "error": self.to_string(),
            "code": status.as_u16(),
        });

        let mut response = (status, axum::Json(body)).into_response();
        if let Self::RateLimited {
            retry_after_secs, ..
        } = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

impl From<HostError> for ApiError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::NotFound(msg) => Self::NotFound(msg),
            HostError::InvalidArgument(msg) | HostError::Unsupported(msg) => Self::BadRequest(msg),
            HostError::Unavailable(msg) => Self::NotImplemented(msg),
            HostError::Failed(msg) => {
                warn!(error = %msg, "host call failed");
                Self::Internal("Editor operation failed".to_owned())
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Host(e) => e.into(),
            SessionError::RateLimited { retry_after, .. } => {
                // Round up so a client never retries inside the window.
                let secs = retry_after
                    .as_secs()
                    .saturating_add(u64::from(retry_after.subsec_nanos() > 0))
                    .max(1);
                Self::RateLimited {
                    message: err.to_string(),
                    retry_after_secs: secs,
                }
            }
            SessionError::Codec(e) => e.into(),
            SessionError::Mesh(e) => e.into(),
            SessionError::Io { ref path, .. } => {
                warn!(error = %err, "render output could not be written");
                Self::Internal(format!("Failed to write {}", path.display()))
            }
            SessionError::Invalid(msg) => Self::BadRequest(msg),
        }
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        warn!(error = %err, "frame encoding failed");
        Self::Internal("Failed to encode captured image".to_owned())
    }
}

impl From<MeshError> for ApiError {
    fn from(err: MeshError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<StreamConfigError> for ApiError {
    fn from(err: StreamConfigError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        warn!(error = %err, "editor thread unavailable");
        Self::Internal("Editor thread is not available".to_owned())
    }
}
