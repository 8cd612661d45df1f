//! Level sequences and runtime players for the in-memory editor.

use std::collections::BTreeMap;

use novabridge_types::{ActorId, BindingId, PlayerId, SectionId, TrackId, Transform};
use tracing::debug;

use super::assets::{AssetKind, AssetRecord};
use super::slots::Slots;
use super::{MemoryEditor, PlayerRecord};
use crate::error::HostError;
use crate::scene::SceneHost;
use crate::sequencer::{PlayerStatus, SequenceInfo, SequencerHost, TransformChannel};

/// Internal ticks per second of every sequence.
pub(crate) const TICK_RESOLUTION: u32 = 24_000;

#[derive(Debug, Clone)]
struct BindingRecord {
    actor: ActorId,
    name: String,
}

#[derive(Debug, Clone)]
struct TrackRecord {
    binding: BindingId,
}

#[derive(Debug, Clone)]
struct SectionRecord {
    track: TrackId,
    keys: BTreeMap<TransformChannel, BTreeMap<i64, f64>>,
}

/// A level sequence: bindings, their transform tracks, and keyed sections.
#[derive(Debug, Clone)]
pub(crate) struct SequenceRecord {
    duration_seconds: f64,
    fps: f64,
    bindings: Slots<BindingRecord>,
    tracks: Slots<TrackRecord>,
    sections: Slots<SectionRecord>,
}

impl SequenceRecord {
    fn new(duration_seconds: f64, fps: f64) -> Self {
        Self {
            duration_seconds,
            fps,
            bindings: Slots::default(),
            tracks: Slots::default(),
            sections: Slots::default(),
        }
    }

    fn require_binding(&self, binding: BindingId) -> Result<&BindingRecord, HostError> {
        self.bindings
            .get(binding.index(), binding.generation())
            .ok_or_else(|| HostError::not_found(format!("Binding not found: {binding}")))
    }

    fn require_track(&self, track: TrackId) -> Result<&TrackRecord, HostError> {
        self.tracks
            .get(track.index(), track.generation())
            .ok_or_else(|| HostError::not_found(format!("Track not found: {track}")))
    }

    /// Evaluate every keyed channel of every binding at `tick`.
    fn evaluate(&self, tick: i64) -> Vec<(ActorId, Vec<(TransformChannel, f64)>)> {
        self.sections
            .iter()
            .filter_map(|(_, _, section)| {
                let track = section.track;
                let binding = self
                    .tracks
                    .get(track.index(), track.generation())?
                    .binding;
                let actor = self.bindings.get(binding.index(), binding.generation())?.actor;
                let values = section
                    .keys
                    .iter()
                    .filter_map(|(channel, keys)| Some((*channel, interpolate(keys, tick)?)))
                    .collect();
                Some((actor, values))
            })
            .collect()
    }
}

/// Linear interpolation between the keys around `tick`, holding the end
/// values outside the keyed range.
fn interpolate(keys: &BTreeMap<i64, f64>, tick: i64) -> Option<f64> {
    let before = keys.range(..=tick).next_back();
    let after = keys.range(tick..).next();
    match (before, after) {
        (Some((t0, v0)), Some((t1, v1))) if t1 > t0 => {
            #[allow(clippy::cast_precision_loss)]
            let alpha = (tick - t0) as f64 / (t1 - t0) as f64;
            Some(v0 + (v1 - v0) * alpha)
        }
        (Some((_, v)), _) | (None, Some((_, v))) => Some(*v),
        (None, None) => None,
    }
}

fn apply_channel(transform: &mut Transform, channel: TransformChannel, value: f64) {
    match channel {
        TransformChannel::LocationX => transform.location.x = value,
        TransformChannel::LocationY => transform.location.y = value,
        TransformChannel::LocationZ => transform.location.z = value,
        TransformChannel::RotationX => transform.rotation.roll = value,
        TransformChannel::RotationY => transform.rotation.pitch = value,
        TransformChannel::RotationZ => transform.rotation.yaw = value,
        TransformChannel::ScaleX => transform.scale.x = value,
        TransformChannel::ScaleY => transform.scale.y = value,
        TransformChannel::ScaleZ => transform.scale.z = value,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn seconds_to_tick(seconds: f64) -> i64 {
    (seconds * f64::from(TICK_RESOLUTION)).round() as i64
}

fn sequence_info(asset: &AssetRecord, sequence: &SequenceRecord) -> SequenceInfo {
    SequenceInfo {
        name: asset.name.clone(),
        path: asset.object_path(),
        duration_seconds: sequence.duration_seconds,
        fps: sequence.fps,
        tick_resolution: TICK_RESOLUTION,
        bindings: sequence
            .bindings
            .iter()
            .map(|(_, _, b)| b.name.clone())
            .collect(),
    }
}

impl MemoryEditor {
    fn sequence(&self, path: &str) -> Result<(&AssetRecord, &SequenceRecord), HostError> {
        match self.asset(path) {
            Some(asset) => match &asset.kind {
                AssetKind::Sequence(sequence) => Ok((asset, sequence)),
                _ => Err(HostError::not_found(format!("Sequence not found: {path}"))),
            },
            None => Err(HostError::not_found(format!("Sequence not found: {path}"))),
        }
    }

    fn sequence_mut(&mut self, path: &str) -> Result<&mut SequenceRecord, HostError> {
        match self.asset_mut(path).map(|a| &mut a.kind) {
            Some(AssetKind::Sequence(sequence)) => Ok(sequence),
            _ => Err(HostError::not_found(format!("Sequence not found: {path}"))),
        }
    }

    fn require_player_mut(&mut self, player: PlayerId) -> Result<&mut PlayerRecord, HostError> {
        let actor = self
            .players
            .get(player.index(), player.generation())
            .map(|p| p.actor)
            .filter(|actor| self.actor_record(*actor).is_some());
        match actor {
            Some(_) => self
                .players
                .get_mut(player.index(), player.generation())
                .ok_or_else(|| HostError::not_found(format!("Player not found: {player}"))),
            None => Err(HostError::not_found(format!("Player not found: {player}"))),
        }
    }

    /// Drive bound actors to their keyed values at `seconds`.
    fn evaluate_sequence(&mut self, path: &str, seconds: f64) {
        let Ok((_, sequence)) = self.sequence(path) else {
            return;
        };
        let updates = sequence.evaluate(seconds_to_tick(seconds));
        for (actor, values) in updates {
            if let Some(record) = self.actor_record_mut(actor) {
                for (channel, value) in values {
                    apply_channel(&mut record.transform, channel, value);
                }
            }
        }
    }
}

impl SequencerHost for MemoryEditor {
    fn create_sequence(
        &mut self,
        name: &str,
        path: &str,
        duration_seconds: f64,
        fps: f64,
    ) -> Result<SequenceInfo, HostError> {
        let record = AssetRecord::new(
            path,
            name,
            AssetKind::Sequence(Box::new(SequenceRecord::new(duration_seconds, fps))),
        );
        let info = self
            .create_unique(record)
            .ok_or_else(|| HostError::Failed("Failed to create level sequence".to_owned()))?;
        self.sequence_info(&info.path)
    }

    fn sequence_info(&self, sequence: &str) -> Result<SequenceInfo, HostError> {
        let (asset, record) = self.sequence(sequence)?;
        Ok(sequence_info(asset, record))
    }

    fn sequences(&self) -> Vec<SequenceInfo> {
        self.assets
            .values()
            .filter_map(|asset| match &asset.kind {
                AssetKind::Sequence(sequence) => Some(sequence_info(asset, sequence)),
                _ => None,
            })
            .collect()
    }

    fn find_binding(
        &self,
        sequence: &str,
        actor: ActorId,
    ) -> Result<Option<BindingId>, HostError> {
        let (_, record) = self.sequence(sequence)?;
        Ok(record
            .bindings
            .iter()
            .find(|(_, _, b)| b.actor == actor)
            .map(|(index, generation, _)| BindingId::new(index, generation)))
    }

    fn add_binding(&mut self, sequence: &str, actor: ActorId) -> Result<BindingId, HostError> {
        let name = self.require_actor(actor)?.label.clone();
        let record = self.sequence_mut(sequence)?;
        let (index, generation) = record.bindings.insert(BindingRecord { actor, name })?;
        Ok(BindingId::new(index, generation))
    }

    fn find_transform_track(
        &self,
        sequence: &str,
        binding: BindingId,
    ) -> Result<Option<TrackId>, HostError> {
        let (_, record) = self.sequence(sequence)?;
        record.require_binding(binding)?;
        Ok(record
            .tracks
            .iter()
            .find(|(_, _, t)| t.binding == binding)
            .map(|(index, generation, _)| TrackId::new(index, generation)))
    }

    fn add_transform_track(
        &mut self,
        sequence: &str,
        binding: BindingId,
    ) -> Result<TrackId, HostError> {
        let record = self.sequence_mut(sequence)?;
        record.require_binding(binding)?;
        let (index, generation) = record.tracks.insert(TrackRecord { binding })?;
        Ok(TrackId::new(index, generation))
    }

    fn first_section(
        &self,
        sequence: &str,
        track: TrackId,
    ) -> Result<Option<SectionId>, HostError> {
        let (_, record) = self.sequence(sequence)?;
        record.require_track(track)?;
        Ok(record
            .sections
            .iter()
            .find(|(_, _, s)| s.track == track)
            .map(|(index, generation, _)| SectionId::new(index, generation)))
    }

    fn add_section(&mut self, sequence: &str, track: TrackId) -> Result<SectionId, HostError> {
        let record = self.sequence_mut(sequence)?;
        record.require_track(track)?;
        let (index, generation) = record.sections.insert(SectionRecord {
            track,
            keys: BTreeMap::new(),
        })?;
        Ok(SectionId::new(index, generation))
    }

    fn set_key(
        &mut self,
        sequence: &str,
        section: SectionId,
        channel: TransformChannel,
        tick: i64,
        value: f64,
    ) -> Result<(), HostError> {
        let record = self.sequence_mut(sequence)?;
        let section_record = record
            .sections
            .get_mut(section.index(), section.generation())
            .ok_or_else(|| HostError::not_found(format!("Section not found: {section}")))?;
        section_record
            .keys
            .entry(channel)
            .or_default()
            .insert(tick, value);
        Ok(())
    }

    fn create_player(
        &mut self,
        sequence: &str,
        looping: bool,
    ) -> Result<(PlayerId, ActorId), HostError> {
        let path = self.sequence(sequence)?.0.object_path();
        let actor = self.spawn_actor("LevelSequenceActor", Transform::default(), None)?;
        let (index, generation) = self.players.insert(PlayerRecord {
            sequence: path,
            actor,
            playing: false,
            looping,
            time_seconds: 0.0,
        })?;
        debug!(sequence, %actor, "sequence player created");
        Ok((PlayerId::new(index, generation), actor))
    }

    fn player_status(&self, player: PlayerId) -> Option<PlayerStatus> {
        let record = self.players.get(player.index(), player.generation())?;
        self.actor_record(record.actor)?;
        Some(PlayerStatus {
            sequence: record.sequence.clone(),
            playing: record.playing,
            looping: record.looping,
            time_seconds: record.time_seconds,
        })
    }

    fn play(&mut self, player: PlayerId, start_seconds: f64) -> Result<(), HostError> {
        let record = self.require_player_mut(player)?;
        record.playing = true;
        record.time_seconds = start_seconds;
        let sequence = record.sequence.clone();
        self.evaluate_sequence(&sequence, start_seconds);
        Ok(())
    }

    fn stop(&mut self, player: PlayerId) -> Result<(), HostError> {
        self.require_player_mut(player)?.playing = false;
        Ok(())
    }

    fn scrub(&mut self, player: PlayerId, seconds: f64) -> Result<(), HostError> {
        let record = self.require_player_mut(player)?;
        record.time_seconds = seconds;
        let sequence = record.sequence.clone();
        self.evaluate_sequence(&sequence, seconds);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use novabridge_types::{Rotator, Vec3};

    use super::*;

    const SEQ: &str = "/Game/Cinematics/Intro";

    fn keyed_editor() -> (MemoryEditor, ActorId, SectionId) {
        let mut e = MemoryEditor::new("/tmp/SeqTest");
        e.create_sequence("Intro", "/Game/Cinematics", 5.0, 30.0).unwrap();
        let actor = e
            .spawn_actor("CameraActor", Transform::at(Vec3::ZERO, Rotator::ZERO), None)
            .unwrap();
        let binding = e.add_binding(SEQ, actor).unwrap();
        let track = e.add_transform_track(SEQ, binding).unwrap();
        let section = e.add_section(SEQ, track).unwrap();
        (e, actor, section)
    }

    #[test]
    fn interpolate_holds_ends_and_blends_between_keys() {
        let keys = BTreeMap::from([(0, 0.0), (100, 10.0)]);
        assert_eq!(interpolate(&keys, -5), Some(0.0));
        assert_eq!(interpolate(&keys, 50), Some(5.0));
        assert_eq!(interpolate(&keys, 500), Some(10.0));
        assert_eq!(interpolate(&BTreeMap::new(), 0), None);
    }

    #[test]
    fn lookups_find_what_was_added() {
        let (e, actor, section) = keyed_editor();
        let binding = e.find_binding(SEQ, actor).unwrap().unwrap();
        let track = e.find_transform_track(SEQ, binding).unwrap().unwrap();
        assert_eq!(e.first_section(SEQ, track).unwrap(), Some(section));
        assert_eq!(e.sequence_info(SEQ).unwrap().bindings, ["CameraActor_0".to_owned()]);
    }

    #[test]
    fn scrub_moves_bound_actor() {
        let (mut e, actor, section) = keyed_editor();
        e.set_key(SEQ, section, TransformChannel::LocationX, 0, 0.0).unwrap();
        e.set_key(SEQ, section, TransformChannel::LocationX, 48_000, 200.0).unwrap();
        e.set_key(SEQ, section, TransformChannel::RotationZ, 0, 90.0).unwrap();

        let (player, _) = e.create_player(SEQ, false).unwrap();
        e.scrub(player, 1.0).unwrap();
        let transform = e.actor(actor).unwrap().transform;
        assert!((transform.location.x - 100.0).abs() < 1e-9);
        assert!((transform.rotation.yaw - 90.0).abs() < 1e-9);
        assert!((e.player_status(player).unwrap().time_seconds - 1.0).abs() < 1e-9);
    }

    #[test]
    fn player_goes_stale_with_its_actor() {
        let (mut e, _, _) = keyed_editor();
        let (player, player_actor) = e.create_player(SEQ, true).unwrap();
        e.play(player, 0.0).unwrap();
        assert!(e.player_status(player).unwrap().playing);

        e.destroy_actor(player_actor).unwrap();
        assert!(e.player_status(player).is_none());
        assert!(e.stop(player).is_err());
    }
}
