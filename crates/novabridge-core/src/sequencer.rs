//! Sequencer session state and time math.
//!
//! Players created by `/sequencer/play` are remembered per sequence so
//! later scrub and stop calls can find them. The host owns the players;
//! this map only holds handles and re-validates each one before use.

use std::collections::BTreeMap;

use novabridge_host::{PlayerStatus, SequencerHost, TransformChannel};
use novabridge_types::{PartialRotator, PartialVec3, PlayerId, Transform};

/// Upper bound on frames written by one render request.
pub const MAX_RENDER_FRAMES: u32 = 1800;

/// Convert seconds to the nearest tick at `resolution` ticks per second.
#[allow(clippy::cast_possible_truncation)]
pub fn seconds_to_tick(seconds: f64, resolution: u32) -> i64 {
    if !seconds.is_finite() {
        return 0;
    }
    (seconds * f64::from(resolution)).round() as i64
}

/// Frames needed to cover `duration_seconds` at `fps`, clamped to
/// `1..=MAX_RENDER_FRAMES`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn render_frame_count(duration_seconds: f64, fps: f64) -> u32 {
    let frames = (duration_seconds * fps).round();
    if !frames.is_finite() || frames < 1.0 {
        return 1;
    }
    (frames.min(f64::from(MAX_RENDER_FRAMES))) as u32
}

/// Per-axis overrides for a transform keyframe.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformOverride {
    /// Location axes.
    pub location: PartialVec3,
    /// Rotation axes.
    pub rotation: PartialRotator,
    /// Scale axes.
    pub scale: PartialVec3,
}

impl TransformOverride {
    /// Fill unspecified axes from `current`.
    pub fn resolve(&self, current: Transform) -> Transform {
        Transform {
            location: self.location.resolve(current.location),
            rotation: self.rotation.resolve(current.rotation),
            scale: self.scale.resolve(current.scale),
        }
    }
}

/// The nine channel values of a transform, in section order.
///
/// Rotation X/Y/Z carry roll/pitch/yaw.
pub fn channel_values(t: &Transform) -> [(TransformChannel, f64); 9] {
    [
        (TransformChannel::LocationX, t.location.x),
        (TransformChannel::LocationY, t.location.y),
        (TransformChannel::LocationZ, t.location.z),
        (TransformChannel::RotationX, t.rotation.roll),
        (TransformChannel::RotationY, t.rotation.pitch),
        (TransformChannel::RotationZ, t.rotation.yaw),
        (TransformChannel::ScaleX, t.scale.x),
        (TransformChannel::ScaleY, t.scale.y),
        (TransformChannel::ScaleZ, t.scale.z),
    ]
}

/// Players created through the control plane, keyed by sequence path.
#[derive(Debug, Clone, Default)]
pub struct SequencePlayers {
    entries: BTreeMap<String, PlayerId>,
}

impl SequencePlayers {
    /// The live player for `sequence`. A stale entry is dropped.
    pub fn get<H>(&mut self, host: &H, sequence: &str) -> Option<PlayerId>
    where
        H: SequencerHost + ?Sized,
    {
        let player = *self.entries.get(sequence)?;
        if host.player_status(player).is_some() {
            Some(player)
        } else {
            self.entries.remove(sequence);
            None
        }
    }

    /// Remember the player for `sequence`, replacing any previous entry.
    pub fn insert(&mut self, sequence: impl Into<String>, player: PlayerId) {
        self.entries.insert(sequence.into(), player);
    }

    /// Every live player with its status. Stale entries are dropped.
    pub fn live<H>(&mut self, host: &H) -> Vec<(String, PlayerId, PlayerStatus)>
    where
        H: SequencerHost + ?Sized,
    {
        let mut live = Vec::new();
        self.entries.retain(|sequence, player| {
            host.player_status(*player).is_some_and(|status| {
                live.push((sequence.clone(), *player, status));
                true
            })
        });
        live
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of remembered entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are remembered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use novabridge_host::{MemoryEditor, SceneHost};
    use novabridge_types::{Rotator, Vec3};

    use super::*;

    #[test]
    fn ticks_round_to_nearest() {
        assert_eq!(seconds_to_tick(1.5, 24_000), 36_000);
        assert_eq!(seconds_to_tick(1.0 / 3.0, 24_000), 8_000);
        assert_eq!(seconds_to_tick(f64::NAN, 24_000), 0);
    }

    #[test]
    fn frame_count_is_clamped() {
        assert_eq!(render_frame_count(5.0, 24.0), 120);
        assert_eq!(render_frame_count(0.0, 24.0), 1);
        assert_eq!(render_frame_count(600.0, 60.0), MAX_RENDER_FRAMES);
        assert_eq!(render_frame_count(f64::INFINITY, 24.0), 1);
    }

    #[test]
    fn override_keeps_current_axes() {
        let current = Transform {
            location: Vec3::new(1.0, 2.0, 3.0),
            rotation: Rotator::new(10.0, 20.0, 30.0),
            scale: Vec3::ONE,
        };
        let overrides = TransformOverride {
            location: PartialVec3 {
                z: Some(300.0),
                ..PartialVec3::default()
            },
            rotation: PartialRotator {
                yaw: Some(90.0),
                ..PartialRotator::default()
            },
            scale: PartialVec3::default(),
        };
        let resolved = overrides.resolve(current);
        assert_eq!(resolved.location, Vec3::new(1.0, 2.0, 300.0));
        assert_eq!(resolved.rotation, Rotator::new(10.0, 90.0, 30.0));
        assert_eq!(resolved.scale, Vec3::ONE);
    }

    #[test]
    fn rotation_channels_map_roll_pitch_yaw() {
        let t = Transform::at(Vec3::ZERO, Rotator::new(1.0, 2.0, 3.0));
        let values = channel_values(&t);
        assert!(values.contains(&(TransformChannel::RotationX, 3.0)));
        assert!(values.contains(&(TransformChannel::RotationY, 1.0)));
        assert!(values.contains(&(TransformChannel::RotationZ, 2.0)));
    }

    #[test]
    fn stale_players_are_dropped() {
        let mut host = MemoryEditor::new("/tmp/SeqPlayers");
        let info = host.create_sequence("Intro", "/Game/Cine", 4.0, 30.0).unwrap();
        let (player, actor) = host.create_player(&info.path, false).unwrap();

        let mut players = SequencePlayers::default();
        players.insert(info.path.clone(), player);
        assert_eq!(players.get(&host, &info.path), Some(player));
        assert_eq!(players.live(&host).len(), 1);

        host.destroy_actor(actor).unwrap();
        assert_eq!(players.get(&host, &info.path), None);
        assert!(players.is_empty());
    }
}
