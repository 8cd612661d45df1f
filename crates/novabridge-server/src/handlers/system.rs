//! Health, project info, lighting builds, and console commands.

use std::sync::Arc;

use axum::extract::State;
use axum::http::Uri;
use chrono::Utc;
use novabridge_host::{ConsoleHost, SceneHost};
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::json::Fields;
use crate::response::{ApiResult, ok};
use crate::state::AppState;

/// Console command run by `/nova/build/lighting`.
pub const BUILD_LIGHTING_COMMAND: &str = "BUILD LIGHTING";

// ---------------------------------------------------------------------------
// GET /nova/health
// ---------------------------------------------------------------------------

/// Liveness probe. Answered on the network side without touching the
/// editor thread, and reachable without an API key.
pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult {
    let uptime = Utc::now().signed_duration_since(state.started_at);
    ok(&json!({
        "engine": "NovaBridge",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
        "stream_port": state.stream_port,
        "routes": state.routes.count(),
        "auth": state.api_key().is_some(),
        "editor_thread": state.editor.is_running(),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_seconds": uptime.num_seconds(),
    }))
}

// ---------------------------------------------------------------------------
// GET /nova/project/info
// ---------------------------------------------------------------------------

/// Project name and directories.
pub async fn project_info(State(state): State<Arc<AppState>>) -> ApiResult {
    let project = state.run(|s| Ok(s.host().project_info())).await?;
    ok(&project)
}

// ---------------------------------------------------------------------------
// POST /nova/build/lighting
// ---------------------------------------------------------------------------

/// Rebuild static lighting for the active level.
pub async fn build_lighting(State(state): State<Arc<AppState>>) -> ApiResult {
    state
        .run(|s| Ok(s.host_mut().exec_command(BUILD_LIGHTING_COMMAND)?))
        .await?;
    info!("lighting build requested");
    ok(&json!({ "command": BUILD_LIGHTING_COMMAND }))
}

// ---------------------------------------------------------------------------
// POST /nova/exec/command
// ---------------------------------------------------------------------------

/// Run an editor console command.
pub async fn exec_command(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let command = body.required("command")?.to_owned();
    let echoed = command.clone();
    state
        .run(move |s| Ok(s.host_mut().exec_command(&command)?))
        .await?;
    ok(&json!({ "command": echoed }))
}

/// Fallback for paths with no route.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
