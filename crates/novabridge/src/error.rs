//! Error types for the NovaBridge binary.

/// Top-level error for the binary.
///
/// Each variant wraps one subsystem, so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: novabridge_core::config::ConfigError,
    },

    /// A listener or the editor thread failed to start or stop.
    #[error("startup error: {source}")]
    Startup {
        /// The underlying startup error.
        #[from]
        source: novabridge_server::StartupError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {message}")]
    Signal {
        /// Description of the signal failure.
        message: String,
    },
}
