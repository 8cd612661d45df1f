//! Procedural content generation (optional host subsystem).

use novabridge_types::{ActorId, Vec3};

use crate::error::HostError;

/// Procedural graph volumes and generation.
pub trait ProceduralHost {
    /// Object paths of every procedural graph asset.
    fn list_graphs(&self) -> Vec<String>;

    /// Spawn a volume running `graph` centred at `location` with `size`.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when the graph asset does not exist.
    fn create_volume(
        &mut self,
        graph: &str,
        location: Vec3,
        size: Vec3,
        label: Option<&str>,
    ) -> Result<ActorId, HostError>;

    /// Run generation on a volume. Returns the number of generated points.
    ///
    /// # Errors
    ///
    /// [`HostError::InvalidArgument`] when the actor has no graph
    /// component.
    fn generate(
        &mut self,
        volume: ActorId,
        seed: Option<i64>,
        force_regenerate: bool,
    ) -> Result<usize, HostError>;

    /// Override a graph parameter on a volume.
    ///
    /// # Errors
    ///
    /// [`HostError::InvalidArgument`] when the value does not parse as
    /// `param_type`.
    fn set_graph_param(
        &mut self,
        volume: ActorId,
        name: &str,
        value: &str,
        param_type: Option<&str>,
    ) -> Result<(), HostError>;

    /// Remove generated content from a volume.
    ///
    /// # Errors
    ///
    /// [`HostError::InvalidArgument`] when the actor has no graph
    /// component.
    fn cleanup(&mut self, volume: ActorId) -> Result<(), HostError>;
}
