//! Live stream control. Frames themselves travel over the WebSocket
//! port; these routes only switch the timer and tune the capture.

use std::sync::Arc;

use axum::extract::State;
use novabridge_core::stream::StreamConfigUpdate;

use crate::json::Fields;
use crate::response::{ApiResult, ok};
use crate::state::AppState;

/// Switch streaming on. Frames only flow while a client is connected.
pub async fn start(State(state): State<Arc<AppState>>) -> ApiResult {
    ok(&state.stream.start().await)
}

/// Switch streaming off and stop the frame timer.
pub async fn stop(State(state): State<Arc<AppState>>) -> ApiResult {
    ok(&state.stream.stop().await)
}

/// Change fps, frame size, or JPEG quality. A bad value rejects the
/// whole update.
pub async fn config(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let update = StreamConfigUpdate {
        fps: body.i64("fps")?,
        width: body.i64("width")?,
        height: body.i64("height")?,
        quality: body.i64("quality")?,
    };
    let config = state.stream.configure(update).await?;
    ok(&config)
}

/// Streaming flag, client count, capture settings, and frames sent.
pub async fn status(State(state): State<Arc<AppState>>) -> ApiResult {
    ok(&state.stream.status().await)
}
