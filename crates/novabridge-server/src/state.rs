//! Shared application state for the HTTP and stream routers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use novabridge_core::{EditorSession, EditorThread, StreamHub};

use crate::error::ApiError;
use crate::router::RouteRegistry;

/// State shared by every handler.
///
/// Handlers never touch the host editor directly: anything that reads
/// or mutates editor state goes through [`AppState::run`], which
/// queues it on the privileged editor thread.
#[derive(Debug)]
pub struct AppState {
    /// The privileged editor thread and the session it owns.
    pub editor: Arc<EditorThread<EditorSession>>,
    /// Live stream clients, configuration, and frame timer.
    pub stream: Arc<StreamHub>,
    /// Bound application routes.
    pub routes: RouteRegistry,
    /// HTTP port reported by `/nova/health`.
    pub port: u16,
    /// WebSocket stream port.
    pub stream_port: u16,
    /// When the bridge came up.
    pub started_at: DateTime<Utc>,
    api_key: Option<String>,
}

impl AppState {
    /// Create the state. An empty or blank `api_key` disables the
    /// Auth Gate.
    pub fn new(
        editor: Arc<EditorThread<EditorSession>>,
        stream: Arc<StreamHub>,
        api_key: Option<String>,
        port: u16,
        stream_port: u16,
    ) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty());
        Self {
            editor,
            stream,
            routes: RouteRegistry::default(),
            port,
            stream_port,
            started_at: Utc::now(),
            api_key,
        }
    }

    /// The configured API key, if authentication is enabled.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Run `f` on the privileged editor thread and wait for it.
    ///
    /// # Errors
    ///
    /// The error `f` returns, or [`ApiError::Internal`] when the editor
    /// thread has stopped.
    pub async fn run<F, R>(&self, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&mut EditorSession) -> Result<R, ApiError> + Send + 'static,
        R: Send + 'static,
    {
        self.editor.call(f).await?
    }
}
