//! The privileged editor thread.
//!
//! Host editor state is only ever touched from one dedicated OS thread.
//! Network-facing code submits closures over an unbounded channel; the
//! thread runs them one at a time, in the order they arrived, against
//! the state it owns. There is no priority, cancellation, or deadline:
//! a queued task always runs to completion.

use std::thread::JoinHandle;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info};

/// Name of the privileged OS thread.
pub const THREAD_NAME: &str = "novabridge-editor";

/// A unit of work for the privileged thread.
pub type Task<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Errors from submitting work to the privileged thread.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The thread has stopped and accepts no more work.
    #[error("editor thread is not running")]
    Closed,

    /// The task was dropped before it produced a result.
    #[error("editor task was dropped before completing")]
    Dropped,

    /// The OS refused to start the thread.
    #[error("failed to spawn editor thread: {source}")]
    Spawn {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The thread panicked.
    #[error("editor thread panicked")]
    Panicked,
}

enum Message<S> {
    Run(Task<S>),
    Stop,
}

/// Handle to the privileged thread owning state `S`.
pub struct EditorThread<S> {
    tx: mpsc::UnboundedSender<Message<S>>,
    handle: Mutex<Option<JoinHandle<S>>>,
}

impl<S> std::fmt::Debug for EditorThread<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorThread")
            .field("running", &!self.tx.is_closed())
            .finish_non_exhaustive()
    }
}

impl<S: Send + 'static> EditorThread<S> {
    /// Move `state` onto a new privileged thread.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Spawn`] when the thread cannot be created.
    pub fn spawn(state: S) -> Result<Self, DispatchError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Message<S>>();
        let handle = std::thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(move || {
                let mut state = state;
                let mut executed: u64 = 0;
                while let Some(message) = rx.blocking_recv() {
                    match message {
                        Message::Run(task) => {
                            task(&mut state);
                            executed = executed.saturating_add(1);
                        }
                        Message::Stop => break,
                    }
                }
                debug!(executed, "editor thread exiting");
                state
            })?;
        info!(thread = THREAD_NAME, "editor thread started");
        Ok(Self {
            tx,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Queue `task` without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] once the thread has stopped.
    pub fn submit<F>(&self, task: F) -> Result<(), DispatchError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.tx
            .send(Message::Run(Box::new(task)))
            .map_err(|_| DispatchError::Closed)
    }

    /// Run `f` on the privileged thread and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] when the thread has stopped, or
    /// [`DispatchError::Dropped`] when it stopped before running `f`.
    pub async fn call<F, R>(&self, f: F) -> Result<R, DispatchError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        self.submit(move |state| {
            // The caller may have gone away; the work is done either way.
            let _ = reply.send(f(state));
        })?;
        result.await.map_err(|_| DispatchError::Dropped)
    }

    /// Whether the thread still accepts work.
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Let queued tasks finish, stop the thread, and hand back its state.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] when called twice, or
    /// [`DispatchError::Panicked`] when the thread died.
    pub async fn shutdown(&self) -> Result<S, DispatchError> {
        let handle = self.handle.lock().await.take().ok_or(DispatchError::Closed)?;
        // A closed channel means the loop already ended; join regardless.
        let _ = self.tx.send(Message::Stop);
        let state = tokio::task::spawn_blocking(move || handle.join())
            .await
            .map_err(|_| DispatchError::Panicked)?
            .map_err(|_| DispatchError::Panicked)?;
        info!(thread = THREAD_NAME, "editor thread stopped");
        Ok(state)
    }
}
