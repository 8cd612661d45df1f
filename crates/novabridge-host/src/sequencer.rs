//! Level sequence authoring and runtime playback.

use novabridge_types::{ActorId, BindingId, PlayerId, SectionId, TrackId};
use serde::Serialize;

use crate::error::HostError;

/// Summary of a level sequence asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceInfo {
    /// Sequence name.
    pub name: String,
    /// Object path.
    pub path: String,
    /// Playback range length in seconds.
    pub duration_seconds: f64,
    /// Display frame rate.
    pub fps: f64,
    /// Internal ticks per second.
    pub tick_resolution: u32,
    /// Names of the actors bound into the sequence.
    pub bindings: Vec<String>,
}

/// One of the nine scalar channels of a 3D transform section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransformChannel {
    /// Location X.
    LocationX,
    /// Location Y.
    LocationY,
    /// Location Z.
    LocationZ,
    /// Rotation around X (roll).
    RotationX,
    /// Rotation around Y (pitch).
    RotationY,
    /// Rotation around Z (yaw).
    RotationZ,
    /// Scale X.
    ScaleX,
    /// Scale Y.
    ScaleY,
    /// Scale Z.
    ScaleZ,
}

impl TransformChannel {
    /// All channels in section order.
    pub const ALL: [Self; 9] = [
        Self::LocationX,
        Self::LocationY,
        Self::LocationZ,
        Self::RotationX,
        Self::RotationY,
        Self::RotationZ,
        Self::ScaleX,
        Self::ScaleY,
        Self::ScaleZ,
    ];
}

/// Runtime state of a sequence player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatus {
    /// Object path of the sequence being played.
    pub sequence: String,
    /// Whether the player is advancing.
    pub playing: bool,
    /// Whether playback loops.
    pub looping: bool,
    /// Current playhead in seconds.
    pub time_seconds: f64,
}

/// Sequence authoring and playback.
///
/// Bindings, tracks, and sections are scoped to their sequence; every
/// call names the sequence by object or package path.
pub trait SequencerHost {
    /// Create a level sequence.
    ///
    /// # Errors
    ///
    /// [`HostError::Failed`] when the package cannot be created.
    fn create_sequence(
        &mut self,
        name: &str,
        path: &str,
        duration_seconds: f64,
        fps: f64,
    ) -> Result<SequenceInfo, HostError>;

    /// Look up a sequence.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when `sequence` is not a level sequence.
    fn sequence_info(&self, sequence: &str) -> Result<SequenceInfo, HostError>;

    /// All level sequences in the project.
    fn sequences(&self) -> Vec<SequenceInfo>;

    /// The binding for `actor`, if one exists.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a missing sequence.
    fn find_binding(&self, sequence: &str, actor: ActorId)
    -> Result<Option<BindingId>, HostError>;

    /// Bind `actor` into the sequence as a possessable.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a missing sequence or stale actor.
    fn add_binding(&mut self, sequence: &str, actor: ActorId) -> Result<BindingId, HostError>;

    /// The transform track of a binding, if one exists.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a missing sequence or binding.
    fn find_transform_track(
        &self,
        sequence: &str,
        binding: BindingId,
    ) -> Result<Option<TrackId>, HostError>;

    /// Add a transform track to a binding.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a missing sequence or binding.
    fn add_transform_track(
        &mut self,
        sequence: &str,
        binding: BindingId,
    ) -> Result<TrackId, HostError>;

    /// The first section of a track, if any.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a missing sequence or track.
    fn first_section(&self, sequence: &str, track: TrackId)
    -> Result<Option<SectionId>, HostError>;

    /// Add a section spanning the whole playback range.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a missing sequence or track.
    fn add_section(&mut self, sequence: &str, track: TrackId) -> Result<SectionId, HostError>;

    /// Write one key on a channel of a section at `tick`.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a missing sequence or section.
    fn set_key(
        &mut self,
        sequence: &str,
        section: SectionId,
        channel: TransformChannel,
        tick: i64,
        value: f64,
    ) -> Result<(), HostError>;

    /// Spawn a sequence actor and create a player for it.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a missing sequence.
    fn create_player(
        &mut self,
        sequence: &str,
        looping: bool,
    ) -> Result<(PlayerId, ActorId), HostError>;

    /// Status of a player; `None` when the player or its actor is gone.
    fn player_status(&self, player: PlayerId) -> Option<PlayerStatus>;

    /// Start playback from `start_seconds`.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a stale player.
    fn play(&mut self, player: PlayerId, start_seconds: f64) -> Result<(), HostError>;

    /// Stop playback.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a stale player.
    fn stop(&mut self, player: PlayerId) -> Result<(), HostError>;

    /// Move the playhead and evaluate the sequence at `seconds`.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a stale player.
    fn scrub(&mut self, player: PlayerId, seconds: f64) -> Result<(), HostError>;
}
