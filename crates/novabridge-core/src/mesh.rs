//! Primitive mesh generation and raw mesh validation.

use std::f64::consts::PI;

use novabridge_host::{MeshData, MeshVertex};
use novabridge_types::Vec3;

const SPHERE_RINGS: u32 = 16;
const ROUND_SEGMENTS: u32 = 24;

/// Errors raised while building mesh geometry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// The primitive name is not recognised.
    #[error("Unknown primitive type: {0}. Supported: cube, box, plane, sphere, cylinder")]
    UnknownPrimitive(String),

    /// The mesh has no vertices or no triangles.
    #[error("Mesh requires at least one vertex and one triangle")]
    Empty,

    /// A triangle references a vertex that does not exist.
    #[error("Triangle {triangle} references vertex {index}, but only {vertices} vertices were given")]
    IndexOutOfRange {
        /// Triangle position in the list.
        triangle: usize,
        /// Offending index.
        index: u32,
        /// Vertex count.
        vertices: usize,
    },

    /// The primitive size is not a positive finite number.
    #[error("size must be a positive number, got {0}")]
    InvalidSize(f64),
}

/// A built-in primitive shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Axis-aligned cube centred on the origin (`cube` or `box`).
    Cube,
    /// Square in the XY plane.
    Plane,
    /// UV sphere.
    Sphere,
    /// Capped cylinder standing on the XY plane.
    Cylinder,
}

impl Primitive {
    /// Parse a primitive name, case-insensitively.
    ///
    /// # Errors
    ///
    /// [`MeshError::UnknownPrimitive`] for anything else.
    pub fn parse(name: &str) -> Result<Self, MeshError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "cube" | "box" => Ok(Self::Cube),
            "plane" => Ok(Self::Plane),
            "sphere" => Ok(Self::Sphere),
            "cylinder" => Ok(Self::Cylinder),
            _ => Err(MeshError::UnknownPrimitive(name.to_owned())),
        }
    }

    /// Build the geometry with the given edge length / diameter.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidSize`] for a non-positive or non-finite size.
    pub fn generate(self, size: f64) -> Result<MeshData, MeshError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(MeshError::InvalidSize(size));
        }
        let half = size * 0.5;
        Ok(match self {
            Self::Cube => cube(half),
            Self::Plane => plane(half),
            Self::Sphere => sphere(half),
            Self::Cylinder => cylinder(half, size),
        })
    }
}

fn vertex(x: f64, y: f64, z: f64) -> MeshVertex {
    MeshVertex {
        position: Vec3::new(x, y, z),
        uv: None,
        normal: None,
    }
}

fn cube(s: f64) -> MeshData {
    MeshData {
        vertices: vec![
            vertex(-s, -s, -s),
            vertex(s, -s, -s),
            vertex(s, s, -s),
            vertex(-s, s, -s),
            vertex(-s, -s, s),
            vertex(s, -s, s),
            vertex(s, s, s),
            vertex(-s, s, s),
        ],
        triangles: vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ],
    }
}

fn plane(s: f64) -> MeshData {
    MeshData {
        vertices: vec![
            vertex(-s, -s, 0.0),
            vertex(s, -s, 0.0),
            vertex(s, s, 0.0),
            vertex(-s, s, 0.0),
        ],
        triangles: vec![[0, 1, 2], [0, 2, 3]],
    }
}

fn ring(radius: f64, z: f64) -> impl Iterator<Item = MeshVertex> {
    (0..ROUND_SEGMENTS).map(move |s| {
        let theta = 2.0 * PI * f64::from(s) / f64::from(ROUND_SEGMENTS);
        vertex(radius * theta.cos(), radius * theta.sin(), z)
    })
}

fn sphere(r: f64) -> MeshData {
    let segs = ROUND_SEGMENTS;
    let mut vertices = vec![vertex(0.0, 0.0, r)];
    for ring_index in 1..SPHERE_RINGS {
        let phi = PI * f64::from(ring_index) / f64::from(SPHERE_RINGS);
        vertices.extend(ring(r * phi.sin(), r * phi.cos()));
    }
    vertices.push(vertex(0.0, 0.0, -r));
    let bottom = segs * (SPHERE_RINGS - 1) + 1;

    let mut triangles = Vec::new();
    for s in 0..segs {
        triangles.push([0, 1 + s, 1 + (s + 1) % segs]);
    }
    for r in 0..SPHERE_RINGS - 2 {
        let row0 = 1 + r * segs;
        let row1 = 1 + (r + 1) * segs;
        for s in 0..segs {
            let s1 = (s + 1) % segs;
            triangles.push([row0 + s, row1 + s, row1 + s1]);
            triangles.push([row0 + s, row1 + s1, row0 + s1]);
        }
    }
    let last = 1 + (SPHERE_RINGS - 2) * segs;
    for s in 0..segs {
        triangles.push([last + s, bottom, last + (s + 1) % segs]);
    }
    MeshData {
        vertices,
        triangles,
    }
}

fn cylinder(r: f64, height: f64) -> MeshData {
    let segs = ROUND_SEGMENTS;
    let mut vertices = vec![vertex(0.0, 0.0, 0.0)];
    vertices.extend(ring(r, 0.0));
    vertices.push(vertex(0.0, 0.0, height));
    vertices.extend(ring(r, height));
    let top = segs + 1;

    let mut triangles = Vec::new();
    for s in 0..segs {
        triangles.push([0, 1 + (s + 1) % segs, 1 + s]);
    }
    for s in 0..segs {
        triangles.push([top, top + 1 + s, top + 1 + (s + 1) % segs]);
    }
    for s in 0..segs {
        let s1 = (s + 1) % segs;
        let (b0, b1) = (1 + s, 1 + s1);
        let (t0, t1) = (top + 1 + s, top + 1 + s1);
        triangles.push([b0, b1, t1]);
        triangles.push([b0, t1, t0]);
    }
    MeshData {
        vertices,
        triangles,
    }
}

/// Check that a caller-supplied mesh is non-empty and every index is in range.
///
/// # Errors
///
/// [`MeshError::Empty`] or [`MeshError::IndexOutOfRange`].
pub fn validate(mesh: &MeshData) -> Result<(), MeshError> {
    if mesh.vertices.is_empty() || mesh.triangles.is_empty() {
        return Err(MeshError::Empty);
    }
    let count = mesh.vertices.len();
    for (triangle, indices) in mesh.triangles.iter().enumerate() {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= count) {
            return Err(MeshError::IndexOutOfRange {
                triangle,
                index,
                vertices: count,
            });
        }
    }
    Ok(())
}
