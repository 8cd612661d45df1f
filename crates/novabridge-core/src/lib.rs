//! Control-plane logic for the NovaBridge editor bridge.
//!
//! Everything here is independent of the HTTP and WebSocket surfaces:
//! the privileged editor thread, the session state it owns, offscreen
//! capture, the live stream hub, and configuration.
//!
//! # Modules
//!
//! - [`config`] -- Layered configuration: CLI, environment, `novabridge.yaml`.
//! - [`dispatcher`] -- [`EditorThread`], the single privileged OS thread.
//! - [`session`] -- [`EditorSession`], the state that thread owns.
//! - [`capture`] -- Render target plus capture proxy lifecycle.
//! - [`stream`] -- [`StreamHub`]: clients, pacing, and frame fan-out.
//! - [`sequencer`] -- Tick math and the per-sequence player map.
//! - [`props`] -- `Component.Property` token resolution.
//! - [`mesh`] -- Procedural primitives and mesh validation.
//! - [`codec`] -- PNG and JPEG encoding of captured frames.
//! - [`rate_limit`] -- Fixed-window spawn limiter.
//!
//! [`EditorThread`]: dispatcher::EditorThread
//! [`EditorSession`]: session::EditorSession
//! [`StreamHub`]: stream::StreamHub

pub mod capture;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod mesh;
pub mod props;
pub mod rate_limit;
pub mod sequencer;
pub mod session;
pub mod stream;

pub use config::BridgeConfig;
pub use dispatcher::{DispatchError, EditorThread};
pub use session::{EditorSession, SessionError};
pub use stream::StreamHub;
