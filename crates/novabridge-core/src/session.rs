//! The session owned by the privileged editor thread.
//!
//! [`EditorSession`] holds the host editor together with every piece of
//! control-plane state that outlives a single request: the virtual
//! camera, the viewport and stream capture sessions, the spawn rate
//! window, and the sequence player map. It is constructed once at
//! startup, moved onto the editor thread, and torn down at shutdown.
//! Nothing here is global, so tests can run many sessions side by side.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use novabridge_host::{
    ActorSummary, CaptureView, EditorHost, HostError, OptimizeHost, PlayerStatus, ProceduralHost,
    PropertyTarget, RenderHost, SceneHost, SequenceInfo, SequencerHost,
};
use novabridge_types::{
    ActorId, BindingId, PartialRotator, PartialVec3, PlayerId, Rotator, SectionId, TrackId,
    Transform, Vec3,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::capture::{self, CaptureManager, STREAM_PROXY, VIEWPORT_PROXY};
use crate::codec::{self, CodecError};
use crate::config::BridgeConfig;
use crate::mesh::MeshError;
use crate::props::{self, Address};
use crate::rate_limit::RateWindow;
use crate::sequencer::{self, SequencePlayers, TransformOverride};
use crate::stream::StreamConfig;

/// Screenshot width bounds.
pub const SCREENSHOT_WIDTH: (u32, u32) = (64, 3840);
/// Screenshot height bounds.
pub const SCREENSHOT_HEIGHT: (u32, u32) = (64, 2160);

/// Component properties listed per component by [`EditorSession::actor_detail`].
const COMPONENT_PROPERTY_LIMIT: usize = 30;
/// Longer exported values are left out of component listings.
const COMPONENT_VALUE_MAX_CHARS: usize = 200;

/// Failure of a session operation.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The host editor rejected the call.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The spawn rate window is exhausted.
    #[error("Rate limit: max {limit} scene spawns per {window_seconds} seconds")]
    RateLimited {
        /// Spawns allowed per window.
        limit: u32,
        /// Window length in seconds.
        window_seconds: u64,
        /// Time left in the current window.
        retry_after: Duration,
    },

    /// A captured frame could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Caller-supplied geometry was rejected.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// A rendered frame could not be written.
    #[error("failed to write {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The request cannot be applied as given.
    #[error("{0}")]
    Invalid(String),
}

/// Pose and projection of the virtual viewport camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraState {
    /// Camera location.
    pub location: Vec3,
    /// Camera rotation.
    pub rotation: Rotator,
    /// Horizontal field of view in degrees.
    pub fov: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            location: Vec3::new(0.0, 0.0, 500.0),
            rotation: Rotator::new(-45.0, 0.0, 0.0),
            fov: 90.0,
        }
    }
}

impl CameraState {
    /// The capture view for this camera.
    pub const fn view(&self) -> CaptureView {
        CaptureView {
            location: self.location,
            rotation: self.rotation,
            fov: self.fov,
        }
    }
}

/// A `/viewport/camera/set` request. `None` show-flag values were not
/// booleans in the request and are reported back as unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraUpdate {
    /// Location axes.
    pub location: PartialVec3,
    /// Rotation axes.
    pub rotation: PartialRotator,
    /// Field of view.
    pub fov: Option<f64>,
    /// Show flags to toggle, in request order.
    pub show_flags: Option<Vec<(String, Option<bool>)>>,
}

/// Camera state plus capture size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraReport {
    /// Camera location.
    pub location: Vec3,
    /// Camera rotation.
    pub rotation: Rotator,
    /// Field of view.
    pub fov: f64,
    /// Viewport capture width.
    pub width: u32,
    /// Viewport capture height.
    pub height: u32,
    /// Show flags that were not applied.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknown_show_flags: Vec<String>,
}

/// An encoded viewport capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    /// PNG bytes.
    pub png: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A component with a bounded property listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentDetail {
    /// Component name.
    pub name: String,
    /// Component class.
    pub class: String,
    /// Editable fields.
    pub properties: BTreeMap<String, String>,
    /// Prefix for `Component.Property` addressing.
    pub set_property_prefix: String,
}

/// Full actor view returned by `/scene/get`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorDetail {
    /// Identity and pose.
    #[serde(flatten)]
    pub actor: ActorSummary,
    /// Editable actor fields.
    pub properties: BTreeMap<String, String>,
    /// Components.
    pub components: Vec<ComponentDetail>,
}

/// Handles touched by `/sequencer/add-track`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackBinding {
    /// The actor binding.
    pub binding: BindingId,
    /// The transform track.
    pub track: TrackId,
    /// Whether either was created by this call.
    pub created: bool,
}

/// Result of `/sequencer/set-keyframe`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyframeReport {
    /// Sequence object path.
    pub sequence: String,
    /// Bound actor name.
    pub actor: String,
    /// Requested time in seconds.
    pub time: f64,
    /// Tick the keys were written at.
    pub tick: i64,
    /// Channels written.
    pub channels: usize,
    /// The keyed transform.
    pub transform: Transform,
}

/// Result of `/sequencer/render`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderReport {
    /// Sequence object path.
    pub sequence: String,
    /// Frames written.
    pub frames: u32,
    /// Frames per second.
    pub fps: f64,
    /// Output directory.
    pub output_dir: String,
    /// Written files, in frame order.
    pub files: Vec<String>,
}

/// Control-plane state living on the privileged editor thread.
pub struct EditorSession {
    host: Box<dyn EditorHost>,
    camera: CameraState,
    viewport: CaptureManager,
    stream_capture: CaptureManager,
    spawn_window: RateWindow,
    window_seconds: u64,
    players: SequencePlayers,
    render_root: PathBuf,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("camera", &self.camera)
            .field("viewport", &self.viewport)
            .field("stream_capture", &self.stream_capture)
            .field("players", &self.players.len())
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Wrap `host` with session state initialised from `config`.
    pub fn new(host: Box<dyn EditorHost>, config: &BridgeConfig) -> Self {
        let stream = StreamConfig::from_defaults(&config.stream);
        let camera = CameraState {
            fov: config.capture.fov,
            ..CameraState::default()
        };
        Self {
            host,
            camera,
            viewport: CaptureManager::new(
                VIEWPORT_PROXY,
                config.capture.width.clamp(SCREENSHOT_WIDTH.0, SCREENSHOT_WIDTH.1),
                config.capture.height.clamp(SCREENSHOT_HEIGHT.0, SCREENSHOT_HEIGHT.1),
            ),
            stream_capture: CaptureManager::new(STREAM_PROXY, stream.width, stream.height),
            spawn_window: RateWindow::new(
                config.limits.spawn_per_window,
                Duration::from_secs(config.limits.window_seconds),
            ),
            window_seconds: config.limits.window_seconds,
            players: SequencePlayers::default(),
            render_root: config
                .project_dir
                .join("Saved")
                .join("NovaBridge")
                .join("Renders"),
        }
    }

    /// The host editor.
    pub fn host(&self) -> &dyn EditorHost {
        self.host.as_ref()
    }

    /// The host editor, mutably.
    pub fn host_mut(&mut self) -> &mut dyn EditorHost {
        self.host.as_mut()
    }

    /// The procedural subsystem.
    ///
    /// # Errors
    ///
    /// [`HostError::Unavailable`] when the host was built without it.
    pub fn procedural(&mut self) -> Result<&mut dyn ProceduralHost, HostError> {
        self.host
            .procedural()
            .ok_or_else(|| HostError::Unavailable("PCG plugin is not available".to_owned()))
    }

    /// Current camera.
    pub const fn camera(&self) -> &CameraState {
        &self.camera
    }

    /// The viewport capture session.
    pub const fn viewport(&self) -> &CaptureManager {
        &self.viewport
    }

    /// The stream capture session.
    pub const fn stream_capture(&self) -> &CaptureManager {
        &self.stream_capture
    }

    // -----------------------------------------------------------------------
    // Scene
    // -----------------------------------------------------------------------

    /// First actor whose name or label equals `name`.
    pub fn find_actor(&self, name: &str) -> Option<ActorSummary> {
        self.host
            .actors()
            .into_iter()
            .find(|a| a.name == name || a.label == name)
    }

    /// Like [`find_actor`](Self::find_actor), but a miss is an error.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] naming the actor.
    pub fn require_actor(&self, name: &str) -> Result<ActorSummary, HostError> {
        self.find_actor(name)
            .ok_or_else(|| HostError::not_found(format!("Actor not found: {name}")))
    }

    /// Spawn an actor, subject to the spawn rate window.
    ///
    /// # Errors
    ///
    /// [`SessionError::RateLimited`] when the window is exhausted, or the
    /// host failure when the class does not resolve.
    pub fn spawn_actor(
        &mut self,
        now: Instant,
        class: &str,
        transform: Transform,
        label: Option<&str>,
    ) -> Result<ActorSummary, SessionError> {
        if let Err(retry_after) = self.spawn_window.check(now) {
            warn!(
                class,
                limit = self.spawn_window.limit(),
                retry_after_secs = retry_after.as_secs(),
                "spawn rate limit exceeded"
            );
            return Err(SessionError::RateLimited {
                limit: self.spawn_window.limit(),
                window_seconds: self.window_seconds,
                retry_after,
            });
        }
        let id = self.host.spawn_actor(class, transform, None)?;
        if let Some(label) = label.filter(|l| !l.is_empty()) {
            self.host.set_actor_label(id, label)?;
        }
        let actor = self.summary(id)?;
        debug!(name = %actor.name, class = %actor.class, "actor spawned");
        Ok(actor)
    }

    fn summary(&self, id: ActorId) -> Result<ActorSummary, HostError> {
        self.host
            .actor(id)
            .ok_or_else(|| HostError::not_found(format!("Actor not found: {id}")))
    }

    /// Destroy an actor by name. Returns the destroyed actor's name.
    ///
    /// # Errors
    ///
    /// [`SessionError::Invalid`] for a reserved capture proxy,
    /// [`HostError::NotFound`] for an unknown actor.
    pub fn delete_actor(&mut self, name: &str) -> Result<String, SessionError> {
        let actor = self.require_actor(name)?;
        if capture::is_reserved_proxy_name(&actor.name) {
            let purpose = if actor.name == VIEWPORT_PROXY {
                "viewport screenshots"
            } else {
                "the live stream"
            };
            return Err(SessionError::Invalid(format!(
                "Cannot delete {}: it is required for {purpose}",
                actor.name
            )));
        }
        self.host.destroy_actor(actor.id)?;
        Ok(actor.name)
    }

    /// Override some axes of an actor's transform.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for an unknown actor.
    pub fn transform_actor(
        &mut self,
        name: &str,
        change: &TransformOverride,
    ) -> Result<ActorSummary, HostError> {
        let actor = self.require_actor(name)?;
        let transform = change.resolve(actor.transform);
        self.host.set_actor_transform(actor.id, transform)?;
        self.summary(actor.id)
    }

    /// Actor identity, its editable fields, and its components.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for an unknown actor.
    pub fn actor_detail(&self, name: &str) -> Result<ActorDetail, HostError> {
        let actor = self.require_actor(name)?;
        let properties = self
            .host
            .properties(&PropertyTarget::Actor(actor.id))?
            .into_iter()
            .map(|p| (p.name, p.value))
            .collect();
        let mut components = Vec::new();
        for component in self.host.components(actor.id)? {
            let target = PropertyTarget::Component {
                actor: actor.id,
                component: component.name.clone(),
            };
            let properties = self
                .host
                .properties(&target)?
                .into_iter()
                .filter(|p| p.value.chars().count() < COMPONENT_VALUE_MAX_CHARS)
                .take(COMPONENT_PROPERTY_LIMIT)
                .map(|p| (p.name, p.value))
                .collect();
            components.push(ComponentDetail {
                set_property_prefix: component.name.clone(),
                name: component.name,
                class: component.class,
                properties,
            });
        }
        Ok(ActorDetail {
            actor,
            properties,
            components,
        })
    }

    /// Write `value` to the property addressed by `token`.
    ///
    /// `Component.Property` targets a component when the left-hand side
    /// resolves to one; `Material` / `Material[N]` on a primitive
    /// component assigns a material slot instead of a field.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for an unknown actor or property,
    /// [`HostError::InvalidArgument`] when the value does not parse.
    pub fn set_property(&mut self, name: &str, token: &str, value: &str) -> Result<(), HostError> {
        let actor = self.require_actor(name)?;
        let components = self.host.components(actor.id)?;
        let (target, property) = match props::address(&components, token) {
            Address::Component {
                component,
                property,
            } => {
                if let Some(slot) = props::material_slot(property).filter(|_| component.primitive) {
                    self.host
                        .set_material_slot(actor.id, &component.name, slot, value)?;
                    debug!(actor = %actor.name, component = %component.name, slot, "material assigned");
                    return Ok(());
                }
                let target = PropertyTarget::Component {
                    actor: actor.id,
                    component: component.name.clone(),
                };
                (target, property)
            }
            Address::Actor { property } => (PropertyTarget::Actor(actor.id), property),
        };

        let fields = self.host.properties(&target)?;
        let field = props::resolve_property(&fields, property)
            .ok_or_else(|| HostError::not_found(format!("Property not found: {token}")))?
            .to_owned();
        self.host
            .set_property(&target, &field, value)
            .map_err(|e| match e {
                HostError::InvalidArgument(_) => {
                    HostError::invalid(format!("Failed to set property: {token}"))
                }
                other => other,
            })
    }

    /// Static mesh named directly, or the one an actor renders.
    ///
    /// # Errors
    ///
    /// [`SessionError::Invalid`] when neither is given, or the host
    /// failure resolving the actor's mesh.
    pub fn resolve_mesh(
        &self,
        mesh_path: Option<&str>,
        actor_name: Option<&str>,
    ) -> Result<String, SessionError> {
        if let Some(path) = mesh_path.filter(|p| !p.is_empty()) {
            return Ok(path.to_owned());
        }
        let name = actor_name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| SessionError::Invalid("Provide 'mesh_path' or 'actor_name'".to_owned()))?;
        let actor = self.require_actor(name)?;
        Ok(self.host.actor_mesh(actor.id)?)
    }

    // -----------------------------------------------------------------------
    // Viewport
    // -----------------------------------------------------------------------

    /// Capture the viewport as PNG. A requested size is clamped and, when
    /// it differs from the current one, rebuilds the capture session.
    ///
    /// # Errors
    ///
    /// Host capture failures or encoder failures.
    pub fn screenshot(&mut self, size: Option<(u32, u32)>) -> Result<Screenshot, SessionError> {
        if let Some((width, height)) = size {
            let width = width.clamp(SCREENSHOT_WIDTH.0, SCREENSHOT_WIDTH.1);
            let height = height.clamp(SCREENSHOT_HEIGHT.0, SCREENSHOT_HEIGHT.1);
            if self.viewport.resize(self.host.as_mut(), width, height) {
                debug!(width, height, "viewport capture resized");
            }
        }
        let frame = self
            .viewport
            .capture(self.host.as_mut(), &self.camera.view())?;
        let png = codec::encode_png(&frame)?;
        Ok(Screenshot {
            png,
            width: frame.width,
            height: frame.height,
        })
    }

    /// Move the camera and optionally toggle show flags.
    ///
    /// # Errors
    ///
    /// Host failures while binding the capture session for show flags.
    pub fn set_camera(&mut self, update: &CameraUpdate) -> Result<CameraReport, HostError> {
        self.camera.location = update.location.resolve(self.camera.location);
        self.camera.rotation = update.rotation.resolve(self.camera.rotation);
        if let Some(fov) = update.fov {
            self.camera.fov = fov;
        }

        let mut unknown = Vec::new();
        if let Some(flags) = &update.show_flags {
            let mut valid = Vec::new();
            for (name, enabled) in flags {
                match enabled {
                    Some(enabled) => valid.push((name.clone(), *enabled)),
                    None => unknown.push(name.clone()),
                }
            }
            let view = self.camera.view();
            unknown.extend(
                self.viewport
                    .apply_show_flags(self.host.as_mut(), &view, &valid)?,
            );
        }

        if let Some(proxy) = self.viewport.proxy() {
            if self.host.is_capture_proxy(proxy) {
                self.host.set_capture_view(proxy, &self.camera.view())?;
            }
        }
        let mut report = self.camera_report();
        report.unknown_show_flags = unknown;
        Ok(report)
    }

    /// Camera state and viewport capture size.
    pub fn camera_report(&self) -> CameraReport {
        let (width, height) = self.viewport.size();
        CameraReport {
            location: self.camera.location,
            rotation: self.camera.rotation,
            fov: self.camera.fov,
            width,
            height,
            unknown_show_flags: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Stream
    // -----------------------------------------------------------------------

    /// Capture one stream frame as JPEG.
    ///
    /// # Errors
    ///
    /// Host capture failures or encoder failures.
    pub fn stream_frame(&mut self, config: &StreamConfig) -> Result<Vec<u8>, SessionError> {
        self.stream_capture
            .resize(self.host.as_mut(), config.width, config.height);
        let frame = self
            .stream_capture
            .capture(self.host.as_mut(), &self.camera.view())?;
        Ok(codec::encode_jpeg(&frame, config.quality)?)
    }

    /// Invalidate the stream capture session for a new frame size.
    pub fn resize_stream(&mut self, width: u32, height: u32) {
        if self
            .stream_capture
            .resize(self.host.as_mut(), width, height)
        {
            debug!(width, height, "stream capture invalidated");
        }
    }

    // -----------------------------------------------------------------------
    // Sequencer
    // -----------------------------------------------------------------------

    /// Find or create the binding and transform track for an actor.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for an unknown sequence or actor.
    pub fn add_transform_track(
        &mut self,
        sequence: &str,
        actor_name: &str,
    ) -> Result<TrackBinding, HostError> {
        let info = self.host.sequence_info(sequence)?;
        let actor = self.require_actor(actor_name)?;
        let (binding, new_binding) = match self.host.find_binding(&info.path, actor.id)? {
            Some(binding) => (binding, false),
            None => (self.host.add_binding(&info.path, actor.id)?, true),
        };
        let (track, new_track) = match self.host.find_transform_track(&info.path, binding)? {
            Some(track) => (track, false),
            None => (self.host.add_transform_track(&info.path, binding)?, true),
        };
        Ok(TrackBinding {
            binding,
            track,
            created: new_binding || new_track,
        })
    }

    fn ensure_section(&mut self, sequence: &str, track: TrackId) -> Result<SectionId, HostError> {
        match self.host.first_section(sequence, track)? {
            Some(section) => Ok(section),
            None => self.host.add_section(sequence, track),
        }
    }

    /// Key all nine transform channels of an actor at `time` seconds.
    /// Axes not overridden take the actor's current pose.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for an unknown sequence or actor.
    pub fn set_keyframe(
        &mut self,
        sequence: &str,
        actor_name: &str,
        time: f64,
        overrides: &TransformOverride,
    ) -> Result<KeyframeReport, HostError> {
        let info = self.host.sequence_info(sequence)?;
        let actor = self.require_actor(actor_name)?;
        let track = self.add_transform_track(&info.path, actor_name)?.track;
        let section = self.ensure_section(&info.path, track)?;
        let tick = sequencer::seconds_to_tick(time, info.tick_resolution);
        let transform = overrides.resolve(actor.transform);
        let values = sequencer::channel_values(&transform);
        for (channel, value) in values {
            self.host.set_key(&info.path, section, channel, tick, value)?;
        }
        Ok(KeyframeReport {
            sequence: info.path,
            actor: actor.name,
            time,
            tick,
            channels: values.len(),
            transform,
        })
    }

    fn player_for(&mut self, info: &SequenceInfo, looping: bool) -> Result<PlayerId, HostError> {
        if let Some(player) = self.players.get(self.host.as_ref(), &info.path) {
            return Ok(player);
        }
        let (player, actor) = self.host.create_player(&info.path, looping)?;
        info!(sequence = %info.path, %actor, "sequence player created");
        self.players.insert(info.path.clone(), player);
        Ok(player)
    }

    /// Start playback, reusing the sequence's player when it is alive.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for an unknown sequence.
    pub fn play(
        &mut self,
        sequence: &str,
        looping: bool,
        start_seconds: f64,
    ) -> Result<PlayerStatus, HostError> {
        let info = self.host.sequence_info(sequence)?;
        let player = self.player_for(&info, looping)?;
        self.host.play(player, start_seconds)?;
        self.player_status(player)
    }

    fn player_status(&self, player: PlayerId) -> Result<PlayerStatus, HostError> {
        self.host
            .player_status(player)
            .ok_or_else(|| HostError::not_found(format!("Player not found: {player}")))
    }

    /// Stop one sequence's player, or every live player when `sequence`
    /// is `None`. Returns the stopped sequence paths.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when the named sequence has no live player.
    pub fn stop(&mut self, sequence: Option<&str>) -> Result<Vec<String>, HostError> {
        match sequence {
            Some(sequence) => {
                let info = self.host.sequence_info(sequence)?;
                let player = self
                    .players
                    .get(self.host.as_ref(), &info.path)
                    .ok_or_else(|| {
                        HostError::not_found(format!("No active player for sequence: {sequence}"))
                    })?;
                self.host.stop(player)?;
                Ok(vec![info.path])
            }
            None => {
                let live = self.players.live(self.host.as_ref());
                let mut stopped = Vec::with_capacity(live.len());
                for (path, player, _) in live {
                    self.host.stop(player)?;
                    stopped.push(path);
                }
                Ok(stopped)
            }
        }
    }

    /// Move the playhead, creating a paused player when none is alive.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for an unknown sequence.
    pub fn scrub(&mut self, sequence: &str, seconds: f64) -> Result<PlayerStatus, HostError> {
        let info = self.host.sequence_info(sequence)?;
        let player = self.player_for(&info, false)?;
        self.host.scrub(player, seconds)?;
        self.player_status(player)
    }

    /// Render the sequence to numbered PNG files, one per frame. Blocks
    /// the editor thread until every frame is written.
    ///
    /// # Errors
    ///
    /// Host, encoder, or filesystem failures. Frames written before the
    /// failure stay on disk.
    pub fn render(
        &mut self,
        sequence: &str,
        fps: f64,
        duration_seconds: f64,
        output: Option<&Path>,
    ) -> Result<RenderReport, SessionError> {
        let info = self.host.sequence_info(sequence)?;
        let frames = sequencer::render_frame_count(duration_seconds, fps);
        let dir = output.map_or_else(|| self.render_root.join(&info.name), Path::to_path_buf);
        std::fs::create_dir_all(&dir).map_err(|source| SessionError::Io {
            path: dir.clone(),
            source,
        })?;

        let player = self.player_for(&info, false)?;
        let view = self.camera.view();
        let mut files = Vec::new();
        for index in 0..frames {
            self.host.scrub(player, f64::from(index) / fps)?;
            let frame = self.viewport.capture(self.host.as_mut(), &view)?;
            let png = codec::encode_png(&frame)?;
            let path = dir.join(format!("frame_{index:05}.png"));
            std::fs::write(&path, png).map_err(|source| SessionError::Io {
                path: path.clone(),
                source,
            })?;
            files.push(path.display().to_string());
        }
        info!(sequence = %info.path, frames, dir = %dir.display(), "sequence rendered");
        Ok(RenderReport {
            sequence: info.path,
            frames,
            fps,
            output_dir: dir.display().to_string(),
            files,
        })
    }

    /// Sequences known to the host and the live players.
    pub fn sequencer_info(&mut self) -> (Vec<SequenceInfo>, Vec<PlayerStatus>) {
        let sequences = self.host.sequences();
        let players = self
            .players
            .live(self.host.as_ref())
            .into_iter()
            .map(|(_, _, status)| status)
            .collect();
        (sequences, players)
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    /// Release both capture sessions and forget every player.
    pub fn teardown(&mut self) {
        self.viewport.teardown(self.host.as_mut());
        self.stream_capture.teardown(self.host.as_mut());
        self.players.clear();
        info!("editor session torn down");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use novabridge_host::MemoryEditor;

    use super::*;

    fn session() -> EditorSession {
        let mut config = BridgeConfig::default();
        config.capture.width = 96;
        config.capture.height = 64;
        config.project_dir = std::env::temp_dir().join("NovaSessionTest");
        EditorSession::new(Box::new(MemoryEditor::new("/tmp/SessionTest")), &config)
    }

    fn spawn(s: &mut EditorSession, class: &str, at: Vec3) -> ActorSummary {
        s.spawn_actor(Instant::now(), class, Transform::at(at, Rotator::ZERO), None)
            .unwrap()
    }

    #[test]
    fn spawn_and_lookup_by_label() {
        let mut s = session();
        let actor = s
            .spawn_actor(
                Instant::now(),
                "StaticMeshActor",
                Transform::at(Vec3::new(100.0, 200.0, 0.0), Rotator::ZERO),
                Some("Hero"),
            )
            .unwrap();
        assert_eq!(actor.label, "Hero");
        assert_eq!(s.require_actor("Hero").unwrap().name, actor.name);
        assert_eq!(s.require_actor(&actor.name).unwrap().label, "Hero");
        assert!(matches!(s.require_actor("Nobody"), Err(HostError::NotFound(_))));
    }

    #[test]
    fn spawn_rate_limit_rejects_past_the_cap() {
        let mut config = BridgeConfig::default();
        config.limits.spawn_per_window = 2;
        let mut s = EditorSession::new(Box::new(MemoryEditor::new("/tmp/RateTest")), &config);
        let now = Instant::now();
        for _ in 0..2 {
            s.spawn_actor(now, "Actor", Transform::default(), None).unwrap();
        }
        let before = s.host().actors().len();
        let err = s.spawn_actor(now, "Actor", Transform::default(), None);
        assert!(matches!(err, Err(SessionError::RateLimited { limit: 2, .. })));
        assert_eq!(s.host().actors().len(), before);
    }

    #[test]
    fn reserved_proxy_cannot_be_deleted() {
        let mut s = session();
        s.screenshot(None).unwrap();
        let err = s.delete_actor(VIEWPORT_PROXY).unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));
        assert!(s.find_actor(VIEWPORT_PROXY).is_some());

        let lamp = spawn(&mut s, "PointLight", Vec3::ZERO);
        assert_eq!(s.delete_actor(&lamp.name).unwrap(), lamp.name);
        assert!(s.find_actor(&lamp.name).is_none());
    }

    #[test]
    fn transform_keeps_unspecified_axes() {
        let mut s = session();
        let actor = spawn(&mut s, "StaticMeshActor", Vec3::new(1.0, 2.0, 3.0));
        let change = TransformOverride {
            location: PartialVec3 {
                x: Some(50.0),
                ..PartialVec3::default()
            },
            scale: PartialVec3 {
                z: Some(4.0),
                ..PartialVec3::default()
            },
            ..TransformOverride::default()
        };
        let moved = s.transform_actor(&actor.name, &change).unwrap();
        assert_eq!(moved.transform.location, Vec3::new(50.0, 2.0, 3.0));
        assert_eq!(moved.transform.scale, Vec3::new(1.0, 1.0, 4.0));
    }

    #[test]
    fn detail_lists_components_with_prefix() {
        let mut s = session();
        let lamp = spawn(&mut s, "PointLight", Vec3::ZERO);
        let detail = s.actor_detail(&lamp.name).unwrap();
        assert!(detail.properties.contains_key("bHidden"));
        let light = detail.components.first().unwrap();
        assert_eq!(light.set_property_prefix, "LightComponent0");
        assert_eq!(light.properties.get("Intensity").map(String::as_str), Some("5000.000000"));
    }

    #[test]
    fn component_property_addressing() {
        let mut s = session();
        let lamp = spawn(&mut s, "PointLight", Vec3::ZERO);
        s.set_property(&lamp.name, "Light.Intensity", "1234").unwrap();
        let detail = s.actor_detail(&lamp.name).unwrap();
        let light = detail.components.first().unwrap();
        assert_eq!(light.properties.get("Intensity").map(String::as_str), Some("1234.000000"));

        s.set_property(&lamp.name, "bhidden", "true").unwrap();
        assert!(matches!(
            s.set_property(&lamp.name, "Light.Nope", "1"),
            Err(HostError::NotFound(m)) if m == "Property not found: Light.Nope"
        ));
        assert!(matches!(
            s.set_property(&lamp.name, "Light.Intensity", "bright"),
            Err(HostError::InvalidArgument(m)) if m == "Failed to set property: Light.Intensity"
        ));
    }

    #[test]
    fn material_slot_assignment() {
        let mut s = session();
        let cube = spawn(&mut s, "StaticMeshActor", Vec3::ZERO);
        let material = "/Engine/BasicShapes/BasicShapeMaterial.BasicShapeMaterial";
        s.set_property(&cube.name, "StaticMeshComponent.Material[0]", material)
            .unwrap();
        s.set_property(&cube.name, "StaticMeshComponent.MaterialOverride", material)
            .unwrap();
        assert!(matches!(
            s.set_property(&cube.name, "StaticMeshComponent.Material", "/Game/Missing"),
            Err(HostError::InvalidArgument(_))
        ));
    }

    #[test]
    fn screenshot_reuses_then_resizes() {
        let mut s = session();
        let first = s.screenshot(None).unwrap();
        assert_eq!((first.width, first.height), (96, 64));
        let target = s.viewport().target();
        s.screenshot(Some((96, 64))).unwrap();
        assert_eq!(s.viewport().target(), target);

        let big = s.screenshot(Some((10, 9000))).unwrap();
        assert_eq!((big.width, big.height), (64, 2160));
        assert_ne!(s.viewport().target(), target);
        assert_eq!(s.viewport().targets_created(), 2);
    }

    #[test]
    fn camera_update_is_partial_and_reports_unknown_flags() {
        let mut s = session();
        let report = s
            .set_camera(&CameraUpdate {
                location: PartialVec3 {
                    z: Some(1000.0),
                    ..PartialVec3::default()
                },
                fov: Some(60.0),
                show_flags: Some(vec![
                    ("Fog".to_owned(), Some(false)),
                    ("Bogus".to_owned(), Some(true)),
                    ("Lighting".to_owned(), None),
                ]),
                ..CameraUpdate::default()
            })
            .unwrap();
        assert_eq!(report.location, Vec3::new(0.0, 0.0, 1000.0));
        assert_eq!(report.rotation, Rotator::new(-45.0, 0.0, 0.0));
        assert_eq!(report.fov, 60.0);
        assert_eq!(report.unknown_show_flags, ["Lighting", "Bogus"]);
        assert!(s.viewport().is_bound());
    }

    #[test]
    fn stream_frames_are_jpeg_at_stream_size() {
        let mut s = session();
        let config = StreamConfig {
            fps: 10,
            width: 80,
            height: 64,
            quality: 40,
        };
        let jpeg = s.stream_frame(&config).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));
        assert_eq!(s.stream_capture().size(), (80, 64));
        assert_ne!(s.stream_capture().target(), s.viewport().target());
    }

    #[test]
    fn keyframe_uses_current_pose_for_missing_axes() {
        let mut s = session();
        let info = s
            .host_mut()
            .create_sequence("Intro", "/Game/Cine", 4.0, 30.0)
            .unwrap();
        let cam = spawn(&mut s, "CameraActor", Vec3::new(10.0, 20.0, 30.0));
        let overrides = TransformOverride {
            location: PartialVec3 {
                x: Some(500.0),
                ..PartialVec3::default()
            },
            ..TransformOverride::default()
        };
        let report = s.set_keyframe(&info.path, &cam.name, 2.0, &overrides).unwrap();
        assert_eq!(report.tick, 48_000);
        assert_eq!(report.channels, 9);
        assert_eq!(report.transform.location, Vec3::new(500.0, 20.0, 30.0));

        let again = s.add_transform_track(&info.path, &cam.name).unwrap();
        assert!(!again.created);
    }

    #[test]
    fn play_reuses_player_and_scrub_moves_actor() {
        let mut s = session();
        let info = s
            .host_mut()
            .create_sequence("Fly", "/Game/Cine", 4.0, 30.0)
            .unwrap();
        let cam = spawn(&mut s, "CameraActor", Vec3::ZERO);
        s.set_keyframe(&info.path, &cam.name, 0.0, &TransformOverride::default())
            .unwrap();
        let end = TransformOverride {
            location: PartialVec3 {
                x: Some(400.0),
                ..PartialVec3::default()
            },
            ..TransformOverride::default()
        };
        s.set_keyframe(&info.path, &cam.name, 4.0, &end).unwrap();

        let status = s.play(&info.path, true, 0.0).unwrap();
        assert!(status.playing);
        let actors = s.host().actors().len();
        s.play(&info.path, true, 1.0).unwrap();
        assert_eq!(s.host().actors().len(), actors);

        s.scrub(&info.path, 2.0).unwrap();
        let moved = s.require_actor(&cam.name).unwrap();
        assert!((moved.transform.location.x - 200.0).abs() < 1e-6);

        assert_eq!(s.stop(None).unwrap(), [info.path.clone()]);
        assert_eq!(s.sequencer_info().1.len(), 1);
    }

    #[test]
    fn stop_without_player_is_not_found() {
        let mut s = session();
        let info = s
            .host_mut()
            .create_sequence("Idle", "/Game/Cine", 1.0, 24.0)
            .unwrap();
        assert!(matches!(s.stop(Some(&info.path)), Err(HostError::NotFound(_))));
    }

    #[test]
    fn render_writes_numbered_frames() {
        let mut s = session();
        let info = s
            .host_mut()
            .create_sequence("Short", "/Game/Cine", 1.0, 24.0)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let report = s.render(&info.path, 4.0, 0.5, Some(dir.path())).unwrap();
        assert_eq!(report.frames, 2);
        assert!(dir.path().join("frame_00000.png").is_file());
        assert!(dir.path().join("frame_00001.png").is_file());
        assert_eq!(report.files.len(), 2);
    }

    #[test]
    fn teardown_releases_everything() {
        let mut s = session();
        s.screenshot(None).unwrap();
        s.stream_frame(&StreamConfig::default()).unwrap();
        s.teardown();
        assert!(!s.viewport().is_bound());
        assert!(!s.stream_capture().is_bound());
        assert!(s.find_actor(VIEWPORT_PROXY).is_none());
        assert!(s.find_actor(STREAM_PROXY).is_none());
    }

    #[test]
    fn procedural_is_optional() {
        let config = BridgeConfig::default();
        let mut s = EditorSession::new(
            Box::new(MemoryEditor::new("/tmp/NoPcg").without_procedural()),
            &config,
        );
        assert!(matches!(s.procedural(), Err(HostError::Unavailable(_))));
        let mut with = session();
        assert!(with.procedural().is_ok());
    }
}
