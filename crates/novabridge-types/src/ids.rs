//! Generation-counted handles for host-owned objects.
//!
//! The host editor owns every actor, render target, and sequence player.
//! The control plane only ever holds a handle: a slot index plus the
//! generation the slot had when the handle was issued. When the host
//! destroys an object and reuses its slot the generation advances, so a
//! stale handle no longer resolves. Every use site must re-validate a
//! stored handle against the host before dereferencing it.

use serde::{Deserialize, Serialize};

/// Generates a `(index, generation)` handle newtype with standard derives.
macro_rules! define_handle {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl $name {
            /// Build a handle from a slot index and the slot's generation.
            pub const fn new(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            /// Slot index inside the owning host table.
            pub const fn index(self) -> u32 {
                self.index
            }

            /// Generation of the slot when this handle was issued.
            pub const fn generation(self) -> u32 {
                self.generation
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({}#{})", stringify!($name), self.index, self.generation)
            }
        }
    };
}

define_handle! {
    /// Handle to a live entity in the active scene.
    ActorId
}

define_handle! {
    /// Handle to a GPU-backed render target owned by the host renderer.
    RenderTargetId
}

define_handle! {
    /// Handle to a runtime sequence player.
    PlayerId
}

define_handle! {
    /// Handle to a loaded world (level). Changes when the editor switches maps.
    WorldId
}

define_handle! {
    /// Handle to an actor-to-sequence binding.
    BindingId
}

define_handle! {
    /// Handle to a track inside a sequence binding.
    TrackId
}

define_handle! {
    /// Handle to a section inside a sequence track.
    SectionId
}
