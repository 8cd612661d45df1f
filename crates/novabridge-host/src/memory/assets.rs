//! Asset registry for the in-memory editor.

use std::collections::BTreeMap;
use std::path::Path;

use novabridge_types::LinearColor;
use tracing::debug;

use super::MemoryEditor;
use super::scene::ACTOR_CLASSES;
use super::sequencer::SequenceRecord;
use crate::assets::{
    AssetHost, AssetInfo, BlueprintHost, BlueprintInfo, ImportReport, MaterialHost, MaterialInfo,
    MaterialParam, MeshData, MeshStats,
};
use crate::error::HostError;
use crate::optimize::CollisionKind;

const BLUEPRINT_PARENTS: &[&str] = &["Pawn", "Character", "GameModeBase", "PlayerController"];

const COMPONENT_CLASSES: &[&str] = &[
    "SceneComponent",
    "StaticMeshComponent",
    "SkeletalMeshComponent",
    "PointLightComponent",
    "SpotLightComponent",
    "DirectionalLightComponent",
    "CameraComponent",
    "BoxComponent",
    "SphereComponent",
    "CapsuleComponent",
    "AudioComponent",
    "ArrowComponent",
    "BillboardComponent",
    "TextRenderComponent",
];

/// Static mesh geometry bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MeshRecord {
    pub(crate) vertices: usize,
    pub(crate) lods: Vec<usize>,
    pub(crate) nanite: bool,
    pub(crate) collision: Option<CollisionKind>,
}

impl MeshRecord {
    pub(crate) fn new(vertices: usize, triangles: usize) -> Self {
        Self {
            vertices,
            lods: vec![triangles],
            nanite: false,
            collision: None,
        }
    }

    pub(crate) fn triangles(&self) -> usize {
        self.lods.first().copied().unwrap_or(0)
    }
}

/// What an asset is.
#[derive(Debug, Clone)]
pub(crate) enum AssetKind {
    Material {
        color: Option<LinearColor>,
    },
    MaterialInstance {
        parent: String,
        parameters: BTreeMap<String, MaterialParam>,
    },
    StaticMesh(MeshRecord),
    Blueprint {
        parent_class: String,
        components: Vec<(String, String)>,
        compiled: bool,
    },
    Texture {
        size: u32,
        max_size: u32,
        compression: String,
    },
    Sequence(Box<SequenceRecord>),
    ProceduralGraph,
}

impl AssetKind {
    fn class(&self) -> &'static str {
        match self {
            Self::Material { .. } => "Material",
            Self::MaterialInstance { .. } => "MaterialInstanceConstant",
            Self::StaticMesh(_) => "StaticMesh",
            Self::Blueprint { .. } => "Blueprint",
            Self::Texture { .. } => "Texture2D",
            Self::Sequence(_) => "LevelSequence",
            Self::ProceduralGraph => "PCGGraph",
        }
    }
}

/// One registered asset.
#[derive(Debug, Clone)]
pub(crate) struct AssetRecord {
    pub(crate) name: String,
    pub(crate) dir: String,
    pub(crate) tags: BTreeMap<String, String>,
    pub(crate) kind: AssetKind,
}

impl AssetRecord {
    pub(crate) fn new(dir: &str, name: &str, kind: AssetKind) -> Self {
        Self {
            name: name.to_owned(),
            dir: dir.trim_end_matches('/').to_owned(),
            tags: BTreeMap::new(),
            kind,
        }
    }

    pub(crate) fn package(&self) -> String {
        format!("{}/{}", self.dir, self.name)
    }

    pub(crate) fn object_path(&self) -> String {
        format!("{}.{}", self.package(), self.name)
    }

    pub(crate) fn info(&self) -> AssetInfo {
        let mut tags = self.tags.clone();
        match &self.kind {
            AssetKind::StaticMesh(mesh) => {
                tags.insert("Vertices".to_owned(), mesh.vertices.to_string());
                tags.insert("Triangles".to_owned(), mesh.triangles().to_string());
                tags.insert("LODs".to_owned(), mesh.lods.len().to_string());
                tags.insert("NaniteEnabled".to_owned(), mesh.nanite.to_string());
                if let Some(collision) = mesh.collision {
                    tags.insert("Collision".to_owned(), format!("{collision:?}"));
                }
            }
            AssetKind::Texture {
                size,
                max_size,
                compression,
            } => {
                tags.insert("Dimensions".to_owned(), format!("{size}x{size}"));
                tags.insert("MaxTextureSize".to_owned(), max_size.to_string());
                tags.insert("CompressionSettings".to_owned(), compression.clone());
            }
            AssetKind::Blueprint {
                parent_class,
                compiled,
                ..
            } => {
                tags.insert("ParentClass".to_owned(), parent_class.clone());
                tags.insert("UpToDate".to_owned(), compiled.to_string());
            }
            _ => {}
        }
        AssetInfo {
            name: self.name.clone(),
            path: self.object_path(),
            class: self.kind.class().to_owned(),
            package: self.package(),
            tags,
        }
    }
}

/// Normalize an object or package path to its package path.
///
/// `/Game/M_Red.M_Red` and `/Game/M_Red` both map to `/Game/M_Red`.
pub(crate) fn package_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((dir, leaf)) => match leaf.split_once('.') {
            Some((name, _)) => format!("{dir}/{name}"),
            None => trimmed.to_owned(),
        },
        None => trimmed.to_owned(),
    }
}

/// Split a package path into `(dir, name)`.
fn split_package(package: &str) -> Option<(String, String)> {
    let (dir, name) = package.rsplit_once('/')?;
    if name.is_empty() {
        return None;
    }
    let dir = if dir.is_empty() { "/" } else { dir };
    Some((dir.to_owned(), name.to_owned()))
}

impl MemoryEditor {
    pub(crate) fn insert_asset(&mut self, record: AssetRecord) -> AssetInfo {
        let info = record.info();
        self.assets.insert(record.package(), record);
        info
    }

    /// Insert unless the package path is taken.
    pub(crate) fn create_unique(&mut self, record: AssetRecord) -> Option<AssetInfo> {
        if self.assets.contains_key(&record.package()) {
            return None;
        }
        Some(self.insert_asset(record))
    }

    pub(crate) fn asset(&self, path: &str) -> Option<&AssetRecord> {
        self.assets.get(&package_path(path))
    }

    pub(crate) fn asset_mut(&mut self, path: &str) -> Option<&mut AssetRecord> {
        self.assets.get_mut(&package_path(path))
    }

    pub(crate) fn material_record(&self, path: &str) -> Option<&AssetRecord> {
        self.asset(path).filter(|a| {
            matches!(
                a.kind,
                AssetKind::Material { .. } | AssetKind::MaterialInstance { .. }
            )
        })
    }

    pub(crate) fn mesh_record_mut(&mut self, path: &str) -> Result<&mut MeshRecord, HostError> {
        match self.asset_mut(path).map(|a| &mut a.kind) {
            Some(AssetKind::StaticMesh(mesh)) => Ok(mesh),
            _ => Err(HostError::not_found(format!("Mesh not found: {path}"))),
        }
    }

    fn blueprint_mut(&mut self, path: &str) -> Result<&mut AssetRecord, HostError> {
        self.asset_mut(path)
            .filter(|a| matches!(a.kind, AssetKind::Blueprint { .. }))
            .ok_or_else(|| HostError::not_found(format!("Blueprint not found: {path}")))
    }

    fn move_asset(
        &mut self,
        source: &str,
        destination: &str,
        keep_source: bool,
    ) -> Result<AssetInfo, HostError> {
        let source_key = package_path(source);
        let Some(record) = self.assets.get(&source_key).cloned() else {
            return Err(HostError::not_found(format!("Asset not found: {source}")));
        };
        let target = package_path(destination);
        let (dir, name) = split_package(&target)
            .ok_or_else(|| HostError::invalid(format!("Invalid destination: {destination}")))?;
        if self.assets.contains_key(&target) {
            return Err(HostError::Failed(format!(
                "Destination already exists: {destination}"
            )));
        }
        if !keep_source {
            self.assets.remove(&source_key);
        }
        Ok(self.insert_asset(AssetRecord { name, dir, ..record }))
    }
}

impl AssetHost for MemoryEditor {
    fn list_assets(&self, path: &str) -> Vec<AssetInfo> {
        let root = path.trim().trim_end_matches('/');
        let prefix = format!("{root}/");
        self.assets
            .iter()
            .filter(|(package, _)| package.starts_with(&prefix))
            .map(|(_, record)| record.info())
            .collect()
    }

    fn asset_info(&self, path: &str) -> Result<AssetInfo, HostError> {
        self.asset(path)
            .map(AssetRecord::info)
            .ok_or_else(|| HostError::not_found(format!("Asset not found: {path}")))
    }

    fn create_asset(
        &mut self,
        kind: &str,
        name: &str,
        path: &str,
    ) -> Result<AssetInfo, HostError> {
        let kind = match kind {
            "Material" => AssetKind::Material { color: None },
            "StaticMesh" => AssetKind::StaticMesh(MeshRecord::new(0, 0)),
            other => {
                return Err(HostError::Unsupported(format!(
                    "Unsupported or failed type: {other}"
                )));
            }
        };
        self.create_unique(AssetRecord::new(path, name, kind))
            .ok_or_else(|| HostError::Failed(format!("Asset already exists: {path}/{name}")))
    }

    fn duplicate_asset(
        &mut self,
        source: &str,
        destination: &str,
    ) -> Result<AssetInfo, HostError> {
        self.move_asset(source, destination, true)
    }

    fn delete_asset(&mut self, path: &str) -> Result<(), HostError> {
        self.assets
            .remove(&package_path(path))
            .map(|_| ())
            .ok_or_else(|| HostError::not_found(format!("Asset not found: {path}")))
    }

    fn rename_asset(&mut self, source: &str, destination: &str) -> Result<AssetInfo, HostError> {
        self.move_asset(source, destination, false)
    }

    fn import_file(
        &mut self,
        file: &Path,
        destination: &str,
        asset_name: Option<&str>,
        scale: f64,
    ) -> Result<ImportReport, HostError> {
        let extension = file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if extension == "fbx" {
            return Err(HostError::Unsupported(
                "FBX import failed. This platform/build may not have FBX importer support enabled."
                    .to_owned(),
            ));
        }
        if extension != "obj" {
            return Err(HostError::Unsupported(
                "Unsupported file format. Supported: .obj, .fbx".to_owned(),
            ));
        }

        let contents = std::fs::read_to_string(file)
            .map_err(|_| HostError::invalid("Failed to read OBJ file"))?;
        let (positions, triangles) = count_obj(&contents);
        if positions == 0 || triangles == 0 {
            return Err(HostError::invalid(format!(
                "OBJ parse failed: {positions} positions, {triangles} faces"
            )));
        }

        let name = asset_name
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
            .or_else(|| file.file_stem().and_then(|s| s.to_str()).map(str::to_owned))
            .unwrap_or_else(|| "ImportedMesh".to_owned());
        let mut record = AssetRecord::new(
            destination,
            &name,
            AssetKind::StaticMesh(MeshRecord::new(positions, triangles)),
        );
        record
            .tags
            .insert("import_scale".to_owned(), format!("{scale}"));
        record
            .tags
            .insert("source_file".to_owned(), file.display().to_string());
        let info = self.insert_asset(record);
        debug!(path = info.path, positions, triangles, "OBJ imported");

        Ok(ImportReport {
            format: "obj".to_owned(),
            imported_assets: vec![info.path],
            vertices: positions,
            triangles,
        })
    }

    fn create_mesh(
        &mut self,
        name: &str,
        path: &str,
        mesh: &MeshData,
    ) -> Result<AssetInfo, HostError> {
        let record = AssetRecord::new(
            path,
            name,
            AssetKind::StaticMesh(MeshRecord::new(mesh.vertices.len(), mesh.triangles.len())),
        );
        Ok(self.insert_asset(record))
    }

    fn mesh_stats(&self, path: &str) -> Result<MeshStats, HostError> {
        match self.asset(path) {
            Some(record) => match &record.kind {
                AssetKind::StaticMesh(mesh) => Ok(MeshStats {
                    path: record.object_path(),
                    lods: u32::try_from(mesh.lods.len()).unwrap_or(u32::MAX),
                    vertices: mesh.vertices,
                    triangles: mesh.triangles(),
                    polygons: mesh.triangles(),
                }),
                _ => Err(HostError::not_found("Mesh not found")),
            },
            None => Err(HostError::not_found("Mesh not found")),
        }
    }
}

/// Count positions and fan-triangulated faces in OBJ text.
fn count_obj(contents: &str) -> (usize, usize) {
    let mut positions = 0_usize;
    let mut triangles = 0_usize;
    for line in contents.lines() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => positions = positions.saturating_add(1),
            Some("f") => {
                let corners = tokens.count();
                if corners >= 3 {
                    triangles = triangles.saturating_add(corners.saturating_sub(2));
                }
            }
            _ => {}
        }
    }
    (positions, triangles)
}

impl MaterialHost for MemoryEditor {
    fn create_material(
        &mut self,
        name: &str,
        path: &str,
        color: Option<LinearColor>,
    ) -> Result<AssetInfo, HostError> {
        self.create_unique(AssetRecord::new(path, name, AssetKind::Material { color }))
            .ok_or_else(|| HostError::Failed("Failed to create material".to_owned()))
    }

    fn create_material_instance(
        &mut self,
        parent: &str,
        name: &str,
        path: &str,
    ) -> Result<AssetInfo, HostError> {
        let parent = self
            .material_record(parent)
            .map(AssetRecord::object_path)
            .ok_or_else(|| HostError::not_found("Parent material not found"))?;
        self.create_unique(AssetRecord::new(
            path,
            name,
            AssetKind::MaterialInstance {
                parent,
                parameters: BTreeMap::new(),
            },
        ))
        .ok_or_else(|| HostError::Failed("Failed to create material instance".to_owned()))
    }

    fn set_material_param(
        &mut self,
        path: &str,
        name: &str,
        value: MaterialParam,
    ) -> Result<(), HostError> {
        match self.asset_mut(path).map(|a| &mut a.kind) {
            Some(AssetKind::MaterialInstance { parameters, .. }) => {
                parameters.insert(name.to_owned(), value);
                Ok(())
            }
            _ => Err(HostError::not_found("Material instance not found")),
        }
    }

    fn material_info(&self, path: &str) -> Result<MaterialInfo, HostError> {
        let record = self
            .material_record(path)
            .ok_or_else(|| HostError::not_found("Material not found"))?;
        let parameters = match &record.kind {
            AssetKind::MaterialInstance { parameters, .. } => parameters.clone(),
            _ => BTreeMap::new(),
        };
        Ok(MaterialInfo {
            path: record.object_path(),
            class: record.kind.class().to_owned(),
            parameters,
        })
    }
}

fn short_class(class: &str) -> &str {
    class.rsplit_once('.').map_or(class, |(_, name)| name).trim()
}

impl BlueprintHost for MemoryEditor {
    fn create_blueprint(
        &mut self,
        name: &str,
        path: &str,
        parent_class: &str,
    ) -> Result<BlueprintInfo, HostError> {
        let parent = short_class(parent_class);
        if !ACTOR_CLASSES.contains(&parent) && !BLUEPRINT_PARENTS.contains(&parent) {
            return Err(HostError::invalid(format!(
                "Parent class not found: {parent_class}"
            )));
        }
        let info = self
            .create_unique(AssetRecord::new(
                path,
                name,
                AssetKind::Blueprint {
                    parent_class: parent.to_owned(),
                    components: Vec::new(),
                    compiled: false,
                },
            ))
            .ok_or_else(|| HostError::Failed("Failed to create blueprint".to_owned()))?;
        Ok(BlueprintInfo {
            path: info.path,
            parent_class: parent.to_owned(),
            compiled: false,
        })
    }

    fn add_blueprint_component(
        &mut self,
        blueprint: &str,
        component_class: &str,
        component_name: Option<&str>,
    ) -> Result<String, HostError> {
        let class = short_class(component_class);
        let class = class.strip_prefix('U').filter(|c| COMPONENT_CLASSES.contains(c)).unwrap_or(class);
        if !COMPONENT_CLASSES.contains(&class) {
            return Err(HostError::invalid(format!(
                "Component class not found: {component_class}"
            )));
        }
        let record = self.blueprint_mut(blueprint)?;
        let AssetKind::Blueprint {
            components,
            compiled,
            ..
        } = &mut record.kind
        else {
            return Err(HostError::not_found(format!("Blueprint not found: {blueprint}")));
        };

        let name = match component_name.filter(|n| !n.is_empty()) {
            Some(name) => name.to_owned(),
            None => {
                let mut n = 0_usize;
                loop {
                    let candidate = format!("{class}_{n}");
                    if !components.iter().any(|(existing, _)| *existing == candidate) {
                        break candidate;
                    }
                    n = n.saturating_add(1);
                }
            }
        };
        if components.iter().any(|(existing, _)| *existing == name) {
            return Err(HostError::invalid(format!("Component already exists: {name}")));
        }
        components.push((name.clone(), class.to_owned()));
        *compiled = false;
        Ok(name)
    }

    fn compile_blueprint(&mut self, blueprint: &str) -> Result<BlueprintInfo, HostError> {
        let record = self.blueprint_mut(blueprint)?;
        let path = record.object_path();
        let AssetKind::Blueprint {
            parent_class,
            compiled,
            ..
        } = &mut record.kind
        else {
            return Err(HostError::not_found(format!("Blueprint not found: {blueprint}")));
        };
        *compiled = true;
        Ok(BlueprintInfo {
            path,
            parent_class: parent_class.clone(),
            compiled: true,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Write as _;

    use super::*;

    fn editor() -> MemoryEditor {
        MemoryEditor::new("/tmp/AssetTest")
    }

    #[test]
    fn package_path_strips_object_suffix() {
        assert_eq!(package_path("/Game/M_Red.M_Red"), "/Game/M_Red");
        assert_eq!(package_path("/Game/M_Red"), "/Game/M_Red");
        assert_eq!(package_path("/Game/Dir/"), "/Game/Dir");
    }

    #[test]
    fn create_rejects_unsupported_kind() {
        let mut e = editor();
        let err = e.create_asset("Sound", "S", "/Game").unwrap_err();
        assert!(matches!(err, HostError::Unsupported(_)));
        let info = e.create_asset("Material", "M_New", "/Game/Materials").unwrap();
        assert_eq!(info.path, "/Game/Materials/M_New.M_New");
    }

    #[test]
    fn rename_moves_and_duplicate_copies() {
        let mut e = editor();
        e.create_asset("StaticMesh", "SM_Rock", "/Game/Meshes").unwrap();
        e.duplicate_asset("/Game/Meshes/SM_Rock", "/Game/Meshes/SM_Rock2")
            .unwrap();
        e.rename_asset("/Game/Meshes/SM_Rock.SM_Rock", "/Game/Props/SM_Boulder")
            .unwrap();
        assert!(e.asset_info("/Game/Meshes/SM_Rock").is_err());
        assert!(e.asset_info("/Game/Meshes/SM_Rock2").is_ok());
        assert_eq!(e.asset_info("/Game/Props/SM_Boulder").unwrap().class, "StaticMesh");
    }

    #[test]
    fn material_params_only_apply_to_instances() {
        let mut e = editor();
        e.create_material("M_Base", "/Game", None).unwrap();
        let err = e
            .set_material_param("/Game/M_Base", "Roughness", MaterialParam::Scalar(0.5))
            .unwrap_err();
        assert!(matches!(err, HostError::NotFound(_)));

        e.create_material_instance("/Game/M_Base", "MI_Base", "/Game").unwrap();
        e.set_material_param("/Game/MI_Base", "Roughness", MaterialParam::Scalar(0.5))
            .unwrap();
        let info = e.material_info("/Game/MI_Base").unwrap();
        assert_eq!(info.class, "MaterialInstanceConstant");
        assert_eq!(info.parameters.get("Roughness"), Some(&MaterialParam::Scalar(0.5)));
    }

    #[test]
    fn obj_import_counts_geometry() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        writeln!(file, "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4").unwrap();

        let mut e = editor();
        let report = e.import_file(file.path(), "/Game/Imported", Some("Quad"), 100.0).unwrap();
        assert_eq!(report.vertices, 4);
        assert_eq!(report.triangles, 2);
        assert_eq!(report.imported_assets, ["/Game/Imported/Quad.Quad".to_owned()]);
        assert_eq!(e.mesh_stats("/Game/Imported/Quad").unwrap().triangles, 2);
    }

    #[test]
    fn blueprint_components_invalidate_compile_state() {
        let mut e = editor();
        e.create_blueprint("BP_Door", "/Game/BP", "Actor").unwrap();
        let name = e
            .add_blueprint_component("/Game/BP/BP_Door", "StaticMeshComponent", None)
            .unwrap();
        assert_eq!(name, "StaticMeshComponent_0");
        assert!(e.compile_blueprint("/Game/BP/BP_Door").unwrap().compiled);
        assert!(
            e.add_blueprint_component("/Game/BP/BP_Door", "WarpDrive", None)
                .is_err()
        );
    }
}
