//! Vectors, rotators, transforms, and colors.
//!
//! Units follow the host editor: locations in centimetres, rotations in
//! degrees, scale as a unitless multiplier. All components are `f64` so
//! values survive a JSON round trip without loss.

use serde::{Deserialize, Serialize};

/// A 3-component vector (location, scale, or normal).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// The unit-scale vector.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Build a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A 2-component vector (texture coordinate).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// U component.
    pub x: f64,
    /// V component.
    pub y: f64,
}

impl Vec2 {
    /// Build a vector from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Euler rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotator {
    /// Rotation around the right axis.
    pub pitch: f64,
    /// Rotation around the up axis.
    pub yaw: f64,
    /// Rotation around the forward axis.
    pub roll: f64,
}

impl Rotator {
    /// The identity rotation.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Build a rotator from pitch, yaw, and roll in degrees.
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// Location, rotation, and scale of a scene entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World-space location.
    pub location: Vec3,
    /// World-space rotation.
    pub rotation: Rotator,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation: Rotator::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// A transform at `location` with `rotation` and unit scale.
    pub const fn at(location: Vec3, rotation: Rotator) -> Self {
        Self {
            location,
            rotation,
            scale: Vec3::ONE,
        }
    }
}

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearColor {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
    /// Alpha channel.
    pub a: f64,
}

impl LinearColor {
    /// Build a color from its channels.
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for LinearColor {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }
}

/// A vector where each axis may be left unspecified.
///
/// Used by requests that override only some axes of an existing value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialVec3 {
    /// X override.
    pub x: Option<f64>,
    /// Y override.
    pub y: Option<f64>,
    /// Z override.
    pub z: Option<f64>,
}

impl PartialVec3 {
    /// Fill unspecified axes from `base`.
    pub fn resolve(self, base: Vec3) -> Vec3 {
        Vec3 {
            x: self.x.unwrap_or(base.x),
            y: self.y.unwrap_or(base.y),
            z: self.z.unwrap_or(base.z),
        }
    }
}

/// A rotator where each axis may be left unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialRotator {
    /// Pitch override.
    pub pitch: Option<f64>,
    /// Yaw override.
    pub yaw: Option<f64>,
    /// Roll override.
    pub roll: Option<f64>,
}

impl PartialRotator {
    /// Fill unspecified axes from `base`.
    pub fn resolve(self, base: Rotator) -> Rotator {
        Rotator {
            pitch: self.pitch.unwrap_or(base.pitch),
            yaw: self.yaw.unwrap_or(base.yaw),
            roll: self.roll.unwrap_or(base.roll),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transform_has_unit_scale() {
        let t = Transform::default();
        assert_eq!(t.location, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn partial_vector_keeps_unspecified_axes() {
        let base = Vec3::new(1.0, 2.0, 3.0);
        let partial = PartialVec3 {
            x: None,
            y: Some(20.0),
            z: None,
        };
        assert_eq!(partial.resolve(base), Vec3::new(1.0, 20.0, 3.0));
    }

    #[test]
    fn partial_rotator_keeps_unspecified_axes() {
        let base = Rotator::new(-45.0, 90.0, 0.0);
        let partial = PartialRotator {
            pitch: None,
            yaw: None,
            roll: Some(10.0),
        };
        assert_eq!(partial.resolve(base), Rotator::new(-45.0, 90.0, 10.0));
    }
}
