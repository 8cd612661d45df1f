//! Host editor boundary for the NovaBridge control plane.
//!
//! The control plane never owns scene, asset, or renderer state. It calls
//! into a host editor through the traits in this crate, and only ever from
//! the single privileged editor thread. Everything the host owns is
//! referred to by a generation-counted handle from [`novabridge_types`].
//!
//! # Modules
//!
//! - [`scene`] -- Actors, components, and reflected properties
//! - [`assets`] -- Asset registry, meshes, materials, blueprints
//! - [`render`] -- Render targets and scene-capture proxies
//! - [`sequencer`] -- Level sequences, bindings, keys, and players
//! - [`procedural`] -- Optional procedural-generation subsystem
//! - [`optimize`] -- Nanite, LOD, Lumen, texture, and collision settings
//! - [`memory`] -- [`MemoryEditor`], a complete in-memory headless host

pub mod assets;
pub mod error;
pub mod memory;
pub mod optimize;
pub mod procedural;
pub mod render;
pub mod scene;
pub mod sequencer;

pub use assets::{
    AssetHost, AssetInfo, BlueprintHost, BlueprintInfo, ImportReport, MaterialHost, MaterialInfo,
    MaterialParam, MeshData, MeshStats, MeshVertex,
};
pub use error::HostError;
pub use memory::MemoryEditor;
pub use optimize::{CollisionKind, LumenQuality, LumenSettings, OptimizeHost, SceneStats};
pub use procedural::ProceduralHost;
pub use render::{CaptureView, Frame, RenderHost};
pub use scene::{
    ActorSummary, ComponentSummary, ProjectInfo, PropertyEntry, PropertyTarget, SceneHost,
};
pub use sequencer::{PlayerStatus, SequenceInfo, SequencerHost, TransformChannel};

/// Console command execution.
pub trait ConsoleHost {
    /// Execute an editor console command against the active world.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidArgument`] for an empty command.
    fn exec_command(&mut self, command: &str) -> Result<(), HostError>;
}

/// The full host editor surface the control plane drives.
///
/// Procedural generation is a runtime capability: hosts built without it
/// return `None` from [`EditorHost::procedural`] and the control plane
/// answers those routes with 501.
pub trait EditorHost:
    SceneHost
    + AssetHost
    + MaterialHost
    + BlueprintHost
    + RenderHost
    + SequencerHost
    + OptimizeHost
    + ConsoleHost
    + Send
    + 'static
{
    /// The procedural-generation subsystem, if this host has one.
    fn procedural(&mut self) -> Option<&mut dyn ProceduralHost>;
}
