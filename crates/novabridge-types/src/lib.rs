//! Shared value types for the NovaBridge editor control plane.
//!
//! This crate is the single source of truth for the plain-data types that
//! cross the boundary between the HTTP surface, the privileged editor
//! thread, and the host editor collaborators.
//!
//! # Modules
//!
//! - [`ids`] -- Generation-counted handles for host-owned objects
//! - [`math`] -- Vectors, rotators, transforms, and colors

pub mod ids;
pub mod math;

// Re-export all public types at crate root for convenience.
pub use ids::{
    ActorId, BindingId, PlayerId, RenderTargetId, SectionId, TrackId, WorldId,
};
pub use math::{LinearColor, PartialRotator, PartialVec3, Rotator, Transform, Vec2, Vec3};
