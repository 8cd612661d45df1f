//! Level sequence handlers: authoring, playback, and offline render.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use novabridge_core::sequencer::TransformOverride;
use novabridge_host::SequencerHost;
use serde_json::json;

use super::asset::DEFAULT_CONTENT_PATH;
use crate::error::ApiError;
use crate::json::Fields;
use crate::response::{ApiResult, ok};
use crate::state::AppState;

/// Sequence length when the request sets none.
pub const DEFAULT_DURATION_SECONDS: f64 = 10.0;
/// Display rate of a new sequence.
pub const DEFAULT_SEQUENCE_FPS: f64 = 30.0;
/// Render rate when the request sets none.
pub const DEFAULT_RENDER_FPS: f64 = 24.0;
/// Render length when the request sets none.
pub const DEFAULT_RENDER_SECONDS: f64 = 5.0;

fn positive(body: &Fields, key: &str, default: f64) -> Result<f64, ApiError> {
    let value = body.f64_or(key, default)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ApiError::bad_request(format!("'{key}' must be a positive number")))
    }
}

fn time(body: &Fields, key: &str) -> Result<f64, ApiError> {
    let value = body.f64_or(key, 0.0)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ApiError::bad_request(format!("'{key}' must not be negative")))
    }
}

// ---------------------------------------------------------------------------
// POST /nova/sequencer/create
// ---------------------------------------------------------------------------

/// Create a level sequence.
pub async fn create(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let name = body.required("name")?.to_owned();
    let path = body.str_or("path", DEFAULT_CONTENT_PATH)?.to_owned();
    let duration = positive(&body, "duration_seconds", DEFAULT_DURATION_SECONDS)?;
    let fps = positive(&body, "fps", DEFAULT_SEQUENCE_FPS)?;
    let info = state
        .run(move |s| Ok(s.host_mut().create_sequence(&name, &path, duration, fps)?))
        .await?;
    ok(&info)
}

// ---------------------------------------------------------------------------
// POST /nova/sequencer/add-track
// ---------------------------------------------------------------------------

/// Bind an actor into a sequence and give it a transform track.
pub async fn add_track(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let sequence = body.required("sequence")?.to_owned();
    let actor = body.required("actor_name")?.to_owned();
    let track_type = body.str_or("track_type", "transform")?.to_ascii_lowercase();
    if track_type != "transform" {
        return Err(ApiError::bad_request(format!(
            "Unsupported track_type: {track_type}. Supported: transform"
        )));
    }
    let (sequence, actor, created) = state
        .run(move |s| {
            let binding = s.add_transform_track(&sequence, &actor)?;
            Ok((sequence, actor, binding.created))
        })
        .await?;
    ok(&json!({
        "sequence": sequence,
        "actor_name": actor,
        "track_type": track_type,
        "created": created,
    }))
}

// ---------------------------------------------------------------------------
// POST /nova/sequencer/set-keyframe
// ---------------------------------------------------------------------------

/// Key an actor's transform. Axes left out take the actor's current pose.
pub async fn set_keyframe(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let sequence = body.required("sequence")?.to_owned();
    let actor = body.required("actor_name")?.to_owned();
    let at = time(&body, "time")?;
    let overrides = TransformOverride {
        location: body.partial_vec3("location")?,
        rotation: body.partial_rotator("rotation")?,
        scale: body.partial_vec3("scale")?,
    };
    let report = state
        .run(move |s| Ok(s.set_keyframe(&sequence, &actor, at, &overrides)?))
        .await?;
    ok(&report)
}

// ---------------------------------------------------------------------------
// POST /nova/sequencer/play
// ---------------------------------------------------------------------------

/// Start playback from `start_time`.
pub async fn play(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let sequence = body.required("sequence")?.to_owned();
    let looping = body.bool_or("loop", false)?;
    let start = time(&body, "start_time")?;
    let status = state
        .run(move |s| Ok(s.play(&sequence, looping, start)?))
        .await?;
    ok(&status)
}

// ---------------------------------------------------------------------------
// POST /nova/sequencer/stop
// ---------------------------------------------------------------------------

/// Stop one sequence, or every live player when none is named.
pub async fn stop(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let sequence = body.str("sequence")?.filter(|s| !s.is_empty()).map(str::to_owned);
    let stopped = state
        .run(move |s| Ok(s.stop(sequence.as_deref())?))
        .await?;
    ok(&json!({ "count": stopped.len(), "stopped": stopped }))
}

// ---------------------------------------------------------------------------
// POST /nova/sequencer/scrub
// ---------------------------------------------------------------------------

/// Move the playhead without playing.
pub async fn scrub(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let sequence = body.required("sequence")?.to_owned();
    let at = time(&body, "time")?;
    let status = state.run(move |s| Ok(s.scrub(&sequence, at)?)).await?;
    ok(&status)
}

// ---------------------------------------------------------------------------
// POST /nova/sequencer/render
// ---------------------------------------------------------------------------

/// Render the sequence to numbered PNG frames on disk.
///
/// The editor thread is busy for the whole render; other requests queue
/// behind it.
pub async fn render(State(state): State<Arc<AppState>>, body: Fields) -> ApiResult {
    let sequence = body.required("sequence")?.to_owned();
    let fps = positive(&body, "fps", DEFAULT_RENDER_FPS)?;
    let duration = positive(&body, "duration_seconds", DEFAULT_RENDER_SECONDS)?;
    let output = body
        .str("output_path")?
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);
    let report = state
        .run(move |s| Ok(s.render(&sequence, fps, duration, output.as_deref())?))
        .await?;
    ok(&report)
}

// ---------------------------------------------------------------------------
// GET /nova/sequencer/info
// ---------------------------------------------------------------------------

/// Every sequence the host knows about, plus the live players.
pub async fn info(State(state): State<Arc<AppState>>) -> ApiResult {
    let (sequences, players) = state.run(|s| Ok(s.sequencer_info())).await?;
    ok(&json!({
        "count": sequences.len(),
        "sequences": sequences,
        "players": players,
    }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::Value;

    use super::*;

    fn body(value: Value) -> Fields {
        match value {
            Value::Object(map) => Fields::from_map(map),
            _ => Fields::default(),
        }
    }

    #[test]
    fn durations_default_and_must_be_positive() {
        assert_eq!(positive(&Fields::default(), "fps", 24.0).unwrap(), 24.0);
        assert!(positive(&body(json!({"fps": 0})), "fps", 24.0).is_err());
        assert!(positive(&body(json!({"fps": -1})), "fps", 24.0).is_err());
    }

    #[test]
    fn negative_times_are_rejected() {
        assert_eq!(time(&body(json!({"time": 1.5})), "time").unwrap(), 1.5);
        assert_eq!(time(&Fields::default(), "time").unwrap(), 0.0);
        assert!(time(&body(json!({"time": -2})), "time").is_err());
    }
}
