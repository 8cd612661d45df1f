//! Network surfaces of the NovaBridge editor bridge.
//!
//! This crate provides two Axum servers on separate ports:
//!
//! - **HTTP control API** under `/nova/*`: JSON in, JSON out, with an
//!   optional API key gate and permissive CORS headers on every
//!   response, preflights included
//! - **`WebSocket` stream acceptor** on the stream port: one binary JPEG
//!   message per captured frame
//!
//! # Architecture
//!
//! Handlers run on the Tokio runtime but never touch the host editor
//! themselves. Every piece of editor work is a closure queued on the
//! privileged editor thread through [`AppState::run`]; the handler
//! awaits the result and renders it. Request parsing and validation
//! happen before anything is queued, so a malformed request costs the
//! editor thread nothing.
//!
//! [`Bridge`] ties the two servers, the editor thread, and the stream
//! hub together and owns the shutdown order.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod json;
pub mod response;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::{build_router, stream_router};
pub use server::ServerError;
pub use startup::{Bridge, StartupError};
pub use state::AppState;
