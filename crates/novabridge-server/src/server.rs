//! Listener binding and server lifecycle.
//!
//! Binding is split from serving so startup can claim both ports before
//! anything runs, and so port `0` resolves to a real port the rest of
//! the bridge can report.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Bind a TCP listener on `addr` (`host:port`).
///
/// # Errors
///
/// [`ServerError::Bind`] when the address does not resolve or the port
/// is taken.
pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// A router being served on a background task.
#[derive(Debug)]
pub struct ServerHandle {
    name: &'static str,
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), ServerError>>,
}

/// Serve `router` on `listener` until [`ServerHandle::stop`].
///
/// # Errors
///
/// [`ServerError::Bind`] when the listener has no local address.
pub fn serve(
    name: &'static str,
    listener: TcpListener,
    router: Router,
) -> Result<ServerHandle, ServerError> {
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("{name} listener has no address: {e}")))?;
    let (tx, rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
            .map_err(|e| ServerError::Serve(format!("{name}: {e}")));
        if let Err(e) = &result {
            error!(server = name, error = %e, "server exited with error");
        }
        result
    });

    info!(server = name, addr = %local_addr, "listening");
    Ok(ServerHandle {
        name,
        local_addr,
        shutdown: Some(tx),
        task,
    })
}

impl ServerHandle {
    /// The address the server is accepting on.
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, let in-flight requests finish, and wait for the
    /// server task.
    ///
    /// # Errors
    ///
    /// [`ServerError::Serve`] when the server failed or its task panicked.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let result = self
            .task
            .await
            .map_err(|e| ServerError::Serve(format!("{} task failed: {e}", self.name)))?;
        info!(server = self.name, "server stopped");
        result
    }
}

/// Errors that can occur when starting or running a server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
