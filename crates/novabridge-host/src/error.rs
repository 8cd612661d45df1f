//! Error type returned by every host collaborator call.

/// Failure reported by the host editor.
///
/// The variant is the error *kind*; the message is already phrased for
/// the caller (it names the object or argument involved).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The named object does not exist or its handle is stale.
    #[error("{0}")]
    NotFound(String),

    /// An argument could not be applied (bad value, wrong object kind).
    #[error("{0}")]
    InvalidArgument(String),

    /// The request names a variant the host does not support.
    #[error("{0}")]
    Unsupported(String),

    /// An optional subsystem is not available in this host.
    #[error("{0}")]
    Unavailable(String),

    /// The host call failed for an opaque reason.
    #[error("{0}")]
    Failed(String),
}

impl HostError {
    /// Shorthand for [`HostError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Shorthand for [`HostError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
