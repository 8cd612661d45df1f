//! Asset registry, mesh, material, and blueprint operations.

use std::collections::BTreeMap;
use std::path::Path;

use novabridge_types::{LinearColor, Vec2, Vec3};
use serde::Serialize;

use crate::error::HostError;

/// Registry entry for an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetInfo {
    /// Asset name.
    pub name: String,
    /// Object path (`/Game/Dir/Name.Name`).
    pub path: String,
    /// Asset class name.
    pub class: String,
    /// Package path (`/Game/Dir/Name`).
    pub package: String,
    /// Registry tags.
    pub tags: BTreeMap<String, String>,
}

/// One vertex of a mesh description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    /// Position.
    pub position: Vec3,
    /// Texture coordinate, if supplied.
    pub uv: Option<Vec2>,
    /// Normal, if supplied.
    pub normal: Option<Vec3>,
}

/// An indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertices.
    pub vertices: Vec<MeshVertex>,
    /// Triangles as vertex index triples.
    pub triangles: Vec<[u32; 3]>,
}

/// Geometry statistics for a static mesh asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshStats {
    /// Object path.
    pub path: String,
    /// Number of LODs.
    pub lods: u32,
    /// Vertex count of LOD 0.
    pub vertices: usize,
    /// Triangle count of LOD 0.
    pub triangles: usize,
    /// Polygon count of LOD 0.
    pub polygons: usize,
}

/// Result of a file import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Source format (`obj` or `fbx`).
    pub format: String,
    /// Object paths of the created assets.
    pub imported_assets: Vec<String>,
    /// Vertices in the imported geometry.
    pub vertices: usize,
    /// Triangles in the imported geometry.
    pub triangles: usize,
}

/// A material parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialParam {
    /// Scalar parameter.
    Scalar(f64),
    /// Vector (color) parameter.
    Vector(LinearColor),
}

/// Material asset details.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInfo {
    /// Object path.
    pub path: String,
    /// Material class (`Material` or `MaterialInstanceConstant`).
    pub class: String,
    /// Parameter overrides (instances only).
    pub parameters: BTreeMap<String, MaterialParam>,
}

/// Blueprint asset details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlueprintInfo {
    /// Object path.
    pub path: String,
    /// Parent class name.
    pub parent_class: String,
    /// Whether the last compile left the blueprint up to date.
    pub compiled: bool,
}

/// Asset registry and content creation.
pub trait AssetHost {
    /// Assets under a content directory, recursively.
    fn list_assets(&self, path: &str) -> Vec<AssetInfo>;

    /// Look up one asset by package or object path.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when no asset lives at `path`.
    fn asset_info(&self, path: &str) -> Result<AssetInfo, HostError>;

    /// Create an empty asset of `kind` (`Material` or `StaticMesh`).
    ///
    /// # Errors
    ///
    /// [`HostError::Unsupported`] for any other kind.
    fn create_asset(&mut self, kind: &str, name: &str, path: &str)
    -> Result<AssetInfo, HostError>;

    /// Copy an asset to a new package path.
    ///
    /// # Errors
    ///
    /// [`HostError::Failed`] when the source is missing or the
    /// destination is taken.
    fn duplicate_asset(&mut self, source: &str, destination: &str)
    -> Result<AssetInfo, HostError>;

    /// Delete an asset.
    ///
    /// # Errors
    ///
    /// [`HostError::Failed`] when no asset lives at `path`.
    fn delete_asset(&mut self, path: &str) -> Result<(), HostError>;

    /// Move an asset to a new package path.
    ///
    /// # Errors
    ///
    /// [`HostError::Failed`] when the source is missing or the
    /// destination is taken.
    fn rename_asset(&mut self, source: &str, destination: &str) -> Result<AssetInfo, HostError>;

    /// Import a mesh file into `destination`.
    ///
    /// # Errors
    ///
    /// [`HostError::InvalidArgument`] when the file cannot be read or
    /// parsed, [`HostError::Unsupported`] when the importer for the
    /// format is not available.
    fn import_file(
        &mut self,
        file: &Path,
        destination: &str,
        asset_name: Option<&str>,
        scale: f64,
    ) -> Result<ImportReport, HostError>;

    /// Build a static mesh asset from raw geometry.
    ///
    /// # Errors
    ///
    /// [`HostError::Failed`] when the package cannot be created.
    fn create_mesh(&mut self, name: &str, path: &str, mesh: &MeshData)
    -> Result<AssetInfo, HostError>;

    /// Geometry statistics of a static mesh.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when `path` is not a static mesh.
    fn mesh_stats(&self, path: &str) -> Result<MeshStats, HostError>;
}

/// Material graph operations.
pub trait MaterialHost {
    /// Create a base material, optionally wiring a constant base color.
    ///
    /// # Errors
    ///
    /// [`HostError::Failed`] when the package cannot be created.
    fn create_material(
        &mut self,
        name: &str,
        path: &str,
        color: Option<LinearColor>,
    ) -> Result<AssetInfo, HostError>;

    /// Create a material instance parented to `parent`.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when the parent does not exist.
    fn create_material_instance(
        &mut self,
        parent: &str,
        name: &str,
        path: &str,
    ) -> Result<AssetInfo, HostError>;

    /// Override a parameter on a material instance.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when `path` is not a material instance.
    fn set_material_param(
        &mut self,
        path: &str,
        name: &str,
        value: MaterialParam,
    ) -> Result<(), HostError>;

    /// Material details.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when `path` is not a material.
    fn material_info(&self, path: &str) -> Result<MaterialInfo, HostError>;
}

/// Blueprint authoring.
pub trait BlueprintHost {
    /// Create a blueprint deriving from `parent_class`.
    ///
    /// # Errors
    ///
    /// [`HostError::InvalidArgument`] when the parent class does not
    /// resolve.
    fn create_blueprint(
        &mut self,
        name: &str,
        path: &str,
        parent_class: &str,
    ) -> Result<BlueprintInfo, HostError>;

    /// Add a component node to a blueprint. Returns the component name.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a missing blueprint,
    /// [`HostError::InvalidArgument`] for an unknown component class.
    fn add_blueprint_component(
        &mut self,
        blueprint: &str,
        component_class: &str,
        component_name: Option<&str>,
    ) -> Result<String, HostError>;

    /// Compile a blueprint.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] for a missing blueprint.
    fn compile_blueprint(&mut self, blueprint: &str) -> Result<BlueprintInfo, HostError>;
}
