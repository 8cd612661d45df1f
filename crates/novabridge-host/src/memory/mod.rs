//! In-memory headless editor.
//!
//! [`MemoryEditor`] implements every host trait against plain Rust data:
//! worlds with actors and components, an asset registry, render targets
//! rasterized in software, level sequences with keyed transform channels,
//! runtime players, and procedural volumes. It backs the `novabridge`
//! binary when no real editor is attached and every test in the
//! workspace.
//!
//! All objects live in generation-counted slot tables, so handles held
//! by the control plane go stale exactly the way they would against a
//! real editor when the object is destroyed.

mod assets;
mod optimize;
mod procedural;
mod props;
mod render;
mod scene;
mod sequencer;
mod slots;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use novabridge_types::{
    ActorId, LinearColor, PlayerId, RenderTargetId, Rotator, Transform, Vec3, WorldId,
};
use tracing::debug;

use crate::error::HostError;
use crate::optimize::{LumenQuality, LumenSettings};
use crate::procedural::ProceduralHost;
use crate::render::CaptureView;
use crate::scene::{ProjectInfo, SceneHost};
use crate::{ConsoleHost, EditorHost};

use self::assets::{AssetKind, AssetRecord, MeshRecord};
use self::props::{PropValue, PropertyBag};
use self::slots::Slots;

/// Name of the level every new editor opens.
const DEFAULT_LEVEL: &str = "Untitled_1";

/// A live actor.
#[derive(Debug, Clone)]
pub(crate) struct ActorRecord {
    pub(crate) world: WorldId,
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) class: String,
    pub(crate) transform: Transform,
    pub(crate) properties: PropertyBag,
    pub(crate) components: Vec<ComponentRecord>,
    pub(crate) capture: Option<CaptureState>,
    pub(crate) pcg: Option<PcgState>,
}

impl ActorRecord {
    pub(crate) fn component(&self, name: &str) -> Option<&ComponentRecord> {
        self.components.iter().find(|c| c.name == name)
    }

    pub(crate) fn component_mut(&mut self, name: &str) -> Option<&mut ComponentRecord> {
        self.components.iter_mut().find(|c| c.name == name)
    }

    pub(crate) fn hidden(&self) -> bool {
        matches!(self.properties.get("bHidden"), Some(PropValue::Bool(true)))
    }
}

/// A component owned by an actor.
#[derive(Debug, Clone)]
pub(crate) struct ComponentRecord {
    pub(crate) name: String,
    pub(crate) class: String,
    pub(crate) primitive: bool,
    pub(crate) properties: PropertyBag,
    pub(crate) materials: Vec<Option<String>>,
}

/// Capture proxy state.
#[derive(Debug, Clone)]
pub(crate) struct CaptureState {
    pub(crate) target: Option<RenderTargetId>,
    pub(crate) view: CaptureView,
    pub(crate) show_flags: BTreeMap<String, bool>,
}

/// Procedural volume state.
#[derive(Debug, Clone)]
pub(crate) struct PcgState {
    pub(crate) graph: String,
    pub(crate) params: BTreeMap<String, PropValue>,
    pub(crate) generated: usize,
}

/// A runtime sequence player.
#[derive(Debug, Clone)]
pub(crate) struct PlayerRecord {
    pub(crate) sequence: String,
    pub(crate) actor: ActorId,
    pub(crate) playing: bool,
    pub(crate) looping: bool,
    pub(crate) time_seconds: f64,
}

/// Complete in-memory host editor.
#[derive(Debug, Clone)]
pub struct MemoryEditor {
    project: ProjectInfo,
    worlds: Vec<String>,
    current_world: WorldId,
    actors: Slots<ActorRecord>,
    render_targets: Slots<(u32, u32)>,
    assets: BTreeMap<String, AssetRecord>,
    players: Slots<PlayerRecord>,
    lumen: LumenSettings,
    console_log: Vec<String>,
    procedural_enabled: bool,
}

impl MemoryEditor {
    /// Create an editor for a project rooted at `project_dir`, with the
    /// default level and starter content loaded.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir: PathBuf = project_dir.into();
        let project_name = project_dir
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("NovaBridgeProject")
            .to_owned();

        let mut editor = Self {
            project: project_info(&project_dir, &project_name),
            worlds: vec![DEFAULT_LEVEL.to_owned()],
            current_world: WorldId::new(0, 0),
            actors: Slots::default(),
            render_targets: Slots::default(),
            assets: BTreeMap::new(),
            players: Slots::default(),
            lumen: LumenSettings {
                enabled: true,
                quality: LumenQuality::High,
            },
            console_log: Vec::new(),
            procedural_enabled: true,
        };
        editor.seed_content();
        editor.seed_level();
        editor
    }

    /// Disable the procedural-generation subsystem.
    #[must_use]
    pub fn without_procedural(mut self) -> Self {
        self.procedural_enabled = false;
        self
    }

    /// Switch the editor to the level called `name`, creating an empty
    /// level the first time. Actors of other levels stay alive but are no
    /// longer visible through [`SceneHost`].
    pub fn open_level(&mut self, name: &str) -> WorldId {
        let index = match self.worlds.iter().position(|w| w == name) {
            Some(index) => index,
            None => {
                self.worlds.push(name.to_owned());
                self.worlds.len().saturating_sub(1)
            }
        };
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        self.current_world = WorldId::new(index, 0);
        debug!(level = name, "level opened");
        self.current_world
    }

    /// Console commands executed so far, oldest first.
    pub fn console_log(&self) -> &[String] {
        &self.console_log
    }

    /// Number of live render targets.
    pub fn render_target_count(&self) -> usize {
        self.render_targets.len()
    }

    /// Handle of the player's actor, if the player is alive.
    pub fn player_actor(&self, player: PlayerId) -> Option<ActorId> {
        self.players
            .get(player.index(), player.generation())
            .map(|p| p.actor)
    }

    pub(crate) fn actor_record(&self, id: ActorId) -> Option<&ActorRecord> {
        self.actors
            .get(id.index(), id.generation())
            .filter(|a| a.world == self.current_world)
    }

    pub(crate) fn actor_record_mut(&mut self, id: ActorId) -> Option<&mut ActorRecord> {
        let world = self.current_world;
        self.actors
            .get_mut(id.index(), id.generation())
            .filter(|a| a.world == world)
    }

    pub(crate) fn require_actor(&self, id: ActorId) -> Result<&ActorRecord, HostError> {
        self.actor_record(id)
            .ok_or_else(|| HostError::not_found(format!("Actor not found: {id}")))
    }

    pub(crate) fn require_actor_mut(&mut self, id: ActorId) -> Result<&mut ActorRecord, HostError> {
        self.actor_record_mut(id)
            .ok_or_else(|| HostError::not_found(format!("Actor not found: {id}")))
    }

    fn seed_content(&mut self) {
        for shape in ["Cube", "Sphere", "Plane", "Cylinder", "Cone"] {
            self.insert_asset(AssetRecord::new(
                "/Engine/BasicShapes",
                shape,
                AssetKind::StaticMesh(MeshRecord::new(24, 12)),
            ));
        }
        self.insert_asset(AssetRecord::new(
            "/Engine/BasicShapes",
            "BasicShapeMaterial",
            AssetKind::Material {
                color: Some(LinearColor::new(0.8, 0.8, 0.8, 1.0)),
            },
        ));
        self.insert_asset(AssetRecord::new(
            "/Game/Textures",
            "T_Default",
            AssetKind::Texture {
                size: 2048,
                max_size: 0,
                compression: "Default".to_owned(),
            },
        ));
        self.insert_asset(AssetRecord::new(
            "/Game/PCG",
            "PCG_Scatter",
            AssetKind::ProceduralGraph,
        ));
    }

    fn seed_level(&mut self) {
        let floor = Transform {
            location: Vec3::ZERO,
            rotation: Rotator::ZERO,
            scale: Vec3::new(10.0, 10.0, 0.1),
        };
        let seeded = [
            ("StaticMeshActor", "Floor", floor),
            (
                "DirectionalLight",
                "DirectionalLight",
                Transform::at(Vec3::new(0.0, 0.0, 300.0), Rotator::new(-45.0, 30.0, 0.0)),
            ),
            ("SkyLight", "SkyLight", Transform::default()),
            (
                "PlayerStart",
                "PlayerStart",
                Transform::at(Vec3::new(-400.0, 0.0, 92.0), Rotator::ZERO),
            ),
        ];
        for (class, name, transform) in seeded {
            if let Ok(id) = self.spawn_actor(class, transform, Some(name)) {
                if name == "Floor" {
                    if let Some(record) = self.actor_record_mut(id) {
                        if let Some(mesh) = record.component_mut("StaticMeshComponent0") {
                            mesh.properties.set_value(
                                "StaticMesh",
                                PropValue::Text("/Engine/BasicShapes/Cube.Cube".to_owned()),
                            );
                        }
                    }
                }
            }
        }
    }
}

fn project_info(dir: &Path, name: &str) -> ProjectInfo {
    let mut project_dir = dir.display().to_string();
    if !project_dir.ends_with('/') {
        project_dir.push('/');
    }
    ProjectInfo {
        project_name: name.to_owned(),
        project_file: format!("{project_dir}{name}.uproject"),
        content_dir: format!("{project_dir}Content/"),
        project_dir,
    }
}

impl ConsoleHost for MemoryEditor {
    fn exec_command(&mut self, command: &str) -> Result<(), HostError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(HostError::invalid("Missing 'command'"));
        }
        debug!(command, "console command executed");
        self.console_log.push(command.to_owned());
        Ok(())
    }
}

impl EditorHost for MemoryEditor {
    fn procedural(&mut self) -> Option<&mut dyn ProceduralHost> {
        if self.procedural_enabled {
            Some(self)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::assets::AssetHost;

    #[test]
    fn new_editor_opens_default_level_with_starter_actors() {
        let editor = MemoryEditor::new("/tmp/Demo");
        assert_eq!(editor.level_name(), DEFAULT_LEVEL);
        let names: Vec<_> = editor.actors().into_iter().map(|a| a.name).collect();
        assert!(names.contains(&"Floor".to_owned()));
        assert!(names.contains(&"DirectionalLight".to_owned()));
        assert_eq!(editor.project_info().project_name, "Demo");
    }

    #[test]
    fn opening_another_level_hides_previous_actors() {
        let mut editor = MemoryEditor::new("/tmp/Demo");
        let floor = editor.actors().first().unwrap().id;
        editor.open_level("Arena");
        assert!(editor.actors().is_empty());
        assert!(editor.actor(floor).is_none());

        editor.open_level(DEFAULT_LEVEL);
        assert!(editor.actor(floor).is_some());
    }

    #[test]
    fn starter_content_is_registered() {
        let editor = MemoryEditor::new("/tmp/Demo");
        assert!(editor.asset_info("/Engine/BasicShapes/Cube").is_ok());
        assert_eq!(editor.list_assets("/Game/Textures").len(), 1);
    }

    #[test]
    fn procedural_can_be_disabled() {
        let mut editor = MemoryEditor::new("/tmp/Demo").without_procedural();
        assert!(editor.procedural().is_none());
    }

    #[test]
    fn empty_console_command_is_rejected() {
        let mut editor = MemoryEditor::new("/tmp/Demo");
        assert!(editor.exec_command("  ").is_err());
        editor.exec_command("stat fps").unwrap();
        assert_eq!(editor.console_log(), ["stat fps".to_owned()]);
    }
}
