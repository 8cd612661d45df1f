//! Rendering and asset optimization settings.

use novabridge_types::ActorId;
use serde::Serialize;

use crate::error::HostError;

/// Lumen global illumination quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LumenQuality {
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
    /// Epic.
    Epic,
}

impl LumenQuality {
    /// Parse a tier name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "epic" => Some(Self::Epic),
            _ => None,
        }
    }
}

/// Current Lumen settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LumenSettings {
    /// Whether Lumen is the active GI and reflection method.
    pub enabled: bool,
    /// Quality tier.
    pub quality: LumenQuality,
}

/// Collision primitive kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionKind {
    /// Simple convex collision.
    Simple,
    /// Per-triangle collision.
    Complex,
    /// Box.
    Box,
    /// Sphere.
    Sphere,
    /// Capsule.
    Capsule,
}

impl CollisionKind {
    /// Parse a collision kind, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "complex" => Some(Self::Complex),
            "box" => Some(Self::Box),
            "sphere" => Some(Self::Sphere),
            "capsule" => Some(Self::Capsule),
            _ => None,
        }
    }
}

/// Scene and content statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneStats {
    /// Live actors in the current world.
    pub actors: usize,
    /// Actors rendering a static mesh.
    pub static_mesh_actors: usize,
    /// Light actors.
    pub lights: usize,
    /// Triangles across all placed static meshes (LOD 0).
    pub total_triangles: usize,
    /// Assets in the registry.
    pub assets: usize,
    /// Static mesh assets.
    pub meshes: usize,
    /// Static meshes with Nanite enabled.
    pub nanite_meshes: usize,
    /// Material and material instance assets.
    pub materials: usize,
    /// Texture assets.
    pub textures: usize,
}

/// Optimization controls.
pub trait OptimizeHost {
    /// Static mesh rendered by an actor.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a stale actor,
    /// [`HostError::InvalidArgument`] when it renders no static mesh.
    fn actor_mesh(&self, actor: ActorId) -> Result<String, HostError>;

    /// Enable or disable Nanite on a static mesh.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when `mesh` is not a static mesh.
    fn set_nanite(&mut self, mesh: &str, enabled: bool) -> Result<(), HostError>;

    /// Regenerate LODs. Returns the triangle count of each LOD.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when `mesh` is not a static mesh.
    fn set_lods(&mut self, mesh: &str, num_lods: u32, reduction_per_level: f64)
    -> Result<Vec<usize>, HostError>;

    /// Configure Lumen for the project.
    ///
    /// # Errors
    ///
    /// [`HostError::Failed`] when the settings cannot be written.
    fn set_lumen(&mut self, enabled: bool, quality: LumenQuality)
    -> Result<LumenSettings, HostError>;

    /// Scene and content statistics.
    fn scene_stats(&self) -> SceneStats;

    /// Clamp texture size and set compression for textures under `path`.
    /// Returns the number of textures changed.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when no texture lives under `path`,
    /// [`HostError::Unsupported`] for an unknown compression setting.
    fn set_texture_limits(
        &mut self,
        path: &str,
        max_size: u32,
        compression: &str,
    ) -> Result<usize, HostError>;

    /// Replace the collision setup of a static mesh.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when `mesh` is not a static mesh.
    fn set_collision(&mut self, mesh: &str, kind: CollisionKind) -> Result<(), HostError>;
}
