//! Bridge startup and ordered shutdown.
//!
//! [`Bridge::start`] claims both ports first, then moves the host onto
//! the privileged editor thread and serves the control API and the
//! stream acceptor on background tasks. [`Bridge::shutdown`] takes
//! things down in the reverse order: stop taking requests, unbind the
//! routes, stop the stream, release capture resources on the editor
//! thread, then stop that thread.
//!
//! # Usage
//!
//! ```rust,ignore
//! use novabridge_core::BridgeConfig;
//! use novabridge_host::MemoryEditor;
//! use novabridge_server::startup::Bridge;
//!
//! let config = BridgeConfig::default();
//! let host = MemoryEditor::new(&config.project_dir);
//! let bridge = Bridge::start(&config, Box::new(host)).await?;
//! tokio::signal::ctrl_c().await?;
//! bridge.shutdown().await?;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use novabridge_core::stream::StreamConfig;
use novabridge_core::{BridgeConfig, DispatchError, EditorSession, EditorThread, StreamHub};
use novabridge_host::EditorHost;
use tracing::{info, warn};

use crate::router::{build_router, stream_router};
use crate::server::{self, ServerError, ServerHandle};
use crate::state::AppState;

/// Errors that can occur when starting or stopping the bridge.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// A listener failed to bind or serve.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),

    /// The editor thread could not be started or stopped.
    #[error("editor thread error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// A running bridge: both listeners plus the editor thread.
#[derive(Debug)]
pub struct Bridge {
    state: Arc<AppState>,
    http: ServerHandle,
    stream: ServerHandle,
}

impl Bridge {
    /// Bind both ports and start serving.
    ///
    /// Port `0` in `config` binds an ephemeral port; the real ports are
    /// reported by [`http_addr`](Self::http_addr),
    /// [`stream_addr`](Self::stream_addr), and `/nova/health`.
    ///
    /// # Errors
    ///
    /// [`StartupError::Server`] when either port cannot be bound,
    /// [`StartupError::Dispatch`] when the editor thread cannot start.
    pub async fn start(
        config: &BridgeConfig,
        host: Box<dyn EditorHost>,
    ) -> Result<Self, StartupError> {
        let http_listener = server::bind(&config.http_addr()).await?;
        let stream_listener = server::bind(&config.stream_addr()).await?;
        let port = local_port(&http_listener, config.port);
        let stream_port = local_port(&stream_listener, config.stream_port);

        let session = EditorSession::new(host, config);
        let editor = Arc::new(EditorThread::spawn(session)?);
        let hub = StreamHub::new(
            Arc::clone(&editor),
            StreamConfig::from_defaults(&config.stream),
            stream_port,
        );
        let state = Arc::new(AppState::new(
            editor,
            hub,
            config.api_key.clone(),
            port,
            stream_port,
        ));

        let http = server::serve("http", http_listener, build_router(Arc::clone(&state)))?;
        let stream = server::serve("stream", stream_listener, stream_router(Arc::clone(&state)))?;
        info!(
            port,
            stream_port,
            auth = state.api_key().is_some(),
            "NovaBridge started"
        );
        Ok(Self {
            state,
            http,
            stream,
        })
    }

    /// Shared state, as the handlers see it.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Address of the HTTP control API.
    pub const fn http_addr(&self) -> SocketAddr {
        self.http.local_addr()
    }

    /// Address of the WebSocket stream acceptor.
    pub const fn stream_addr(&self) -> SocketAddr {
        self.stream.local_addr()
    }

    /// Stop both listeners, release capture resources, and join the
    /// editor thread.
    ///
    /// # Errors
    ///
    /// The first listener failure, or [`StartupError::Dispatch`] when the
    /// editor thread had already died. Later steps still run.
    pub async fn shutdown(self) -> Result<(), StartupError> {
        let Self {
            state,
            http,
            stream,
        } = self;

        let http_result = http.stop().await;
        let unbound = state.routes.unbind_all();
        state.stream.shutdown().await;
        let stream_result = stream.stop().await;

        if let Err(e) = state.editor.call(EditorSession::teardown).await {
            warn!(error = %e, "capture teardown skipped");
        }
        let joined = state.editor.shutdown().await;
        info!(routes = unbound, "NovaBridge stopped");

        http_result?;
        stream_result?;
        joined?;
        Ok(())
    }
}

fn local_port(listener: &tokio::net::TcpListener, configured: u16) -> u16 {
    listener.local_addr().map_or(configured, |addr| addr.port())
}
