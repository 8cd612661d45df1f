//! Scene graph access: actors, their components, and reflected properties.
//!
//! Reflection is modelled as a capability rather than runtime type
//! introspection: a target lists its editable fields as `(name, text)`
//! pairs and accepts a text value for a named field. The host parses the
//! text into the field's declared type.

use novabridge_types::{ActorId, Transform, WorldId};
use serde::Serialize;

use crate::error::HostError;

/// Static project paths reported by `/project/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectInfo {
    /// Project name.
    pub project_name: String,
    /// Path of the project descriptor file.
    pub project_file: String,
    /// Project root directory.
    pub project_dir: String,
    /// Content root directory.
    pub content_dir: String,
}

/// Identity and pose of a live actor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorSummary {
    /// Handle of the actor.
    #[serde(skip)]
    pub id: ActorId,
    /// Internal identifier (unique within the world).
    pub name: String,
    /// Display label shown in the outliner.
    pub label: String,
    /// Class name.
    pub class: String,
    /// Full object path.
    pub path: String,
    /// Current world transform.
    pub transform: Transform,
}

/// A component owned by an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentSummary {
    /// Component name (unique within the actor).
    pub name: String,
    /// Component class name.
    pub class: String,
    /// Whether the component renders geometry and owns material slots.
    pub primitive: bool,
}

/// One editable field and its current value exported as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyEntry {
    /// Field name.
    pub name: String,
    /// Field value exported as text.
    pub value: String,
}

/// The object a property read or write targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyTarget {
    /// The actor itself.
    Actor(ActorId),
    /// A named component of the actor.
    Component {
        /// Owning actor.
        actor: ActorId,
        /// Exact component name.
        component: String,
    },
}

impl PropertyTarget {
    /// The actor that owns the target.
    pub const fn actor(&self) -> ActorId {
        match self {
            Self::Actor(actor) | Self::Component { actor, .. } => *actor,
        }
    }
}

/// Scene graph operations against the active world.
pub trait SceneHost {
    /// Static project paths.
    fn project_info(&self) -> ProjectInfo;

    /// Handle of the world currently open in the editor.
    fn current_world(&self) -> WorldId;

    /// Map name of the current world.
    fn level_name(&self) -> String;

    /// All live actors in the current world, in spawn order.
    fn actors(&self) -> Vec<ActorSummary>;

    /// Resolve a handle. `None` when the actor was destroyed or lives in
    /// another world.
    fn actor(&self, id: ActorId) -> Option<ActorSummary>;

    /// Spawn an actor of `class` at `transform`.
    ///
    /// `name` requests a specific internal identifier; otherwise the host
    /// assigns one.
    ///
    /// # Errors
    ///
    /// [`HostError::InvalidArgument`] when the class does not resolve.
    fn spawn_actor(
        &mut self,
        class: &str,
        transform: Transform,
        name: Option<&str>,
    ) -> Result<ActorId, HostError>;

    /// Set the display label of an actor.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a stale handle.
    fn set_actor_label(&mut self, id: ActorId, label: &str) -> Result<(), HostError>;

    /// Destroy an actor. Its slot generation advances.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a stale handle.
    fn destroy_actor(&mut self, id: ActorId) -> Result<(), HostError>;

    /// Replace the world transform of an actor.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a stale handle.
    fn set_actor_transform(&mut self, id: ActorId, transform: Transform)
    -> Result<(), HostError>;

    /// Components of an actor, in creation order.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a stale handle.
    fn components(&self, id: ActorId) -> Result<Vec<ComponentSummary>, HostError>;

    /// Editable fields of a target, in declaration order.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when the actor or component does not exist.
    fn properties(&self, target: &PropertyTarget) -> Result<Vec<PropertyEntry>, HostError>;

    /// Import `value` into the field called exactly `name`.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when the field does not exist,
    /// [`HostError::InvalidArgument`] when the text does not parse into
    /// the field's type.
    fn set_property(
        &mut self,
        target: &PropertyTarget,
        name: &str,
        value: &str,
    ) -> Result<(), HostError>;

    /// Assign a material asset to a slot of a primitive component.
    ///
    /// # Errors
    ///
    /// [`HostError::InvalidArgument`] when the material does not load or
    /// the component is not a primitive.
    fn set_material_slot(
        &mut self,
        actor: ActorId,
        component: &str,
        slot: usize,
        material: &str,
    ) -> Result<(), HostError>;
}
