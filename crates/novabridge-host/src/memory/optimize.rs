//! Optimization settings for the in-memory editor.

use novabridge_types::ActorId;
use tracing::debug;

use super::assets::{AssetKind, package_path};
use super::{ActorRecord, MemoryEditor};
use crate::error::HostError;
use crate::optimize::{CollisionKind, LumenQuality, LumenSettings, OptimizeHost, SceneStats};

const COMPRESSION_SETTINGS: &[&str] = &[
    "Default",
    "Normalmap",
    "Masks",
    "Grayscale",
    "HDR",
    "UserInterface2D",
    "Alpha",
    "DistanceFieldFont",
    "BC7",
];

const LIGHT_CLASSES: &[&str] = &["PointLight", "SpotLight", "DirectionalLight", "SkyLight"];

fn static_mesh_of(record: &ActorRecord) -> Option<&str> {
    record
        .components
        .iter()
        .filter(|c| c.primitive)
        .find_map(|c| c.properties.text("StaticMesh"))
        .filter(|mesh| !mesh.is_empty())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn reduce(triangles: usize, factor: f64) -> usize {
    ((triangles as f64) * factor).round().max(1.0) as usize
}

impl OptimizeHost for MemoryEditor {
    fn actor_mesh(&self, actor: ActorId) -> Result<String, HostError> {
        let record = self.require_actor(actor)?;
        static_mesh_of(record)
            .map(str::to_owned)
            .ok_or_else(|| HostError::invalid(format!("Actor has no static mesh: {}", record.name)))
    }

    fn set_nanite(&mut self, mesh: &str, enabled: bool) -> Result<(), HostError> {
        self.mesh_record_mut(mesh)?.nanite = enabled;
        Ok(())
    }

    fn set_lods(
        &mut self,
        mesh: &str,
        num_lods: u32,
        reduction_per_level: f64,
    ) -> Result<Vec<usize>, HostError> {
        let record = self.mesh_record_mut(mesh)?;
        let base = record.triangles();
        let keep = (1.0 - reduction_per_level).clamp(0.0, 1.0);
        let mut factor = 1.0;
        record.lods = (0..num_lods.max(1))
            .map(|level| {
                if level > 0 {
                    factor *= keep;
                }
                if level == 0 { base } else { reduce(base, factor) }
            })
            .collect();
        debug!(mesh, lods = ?record.lods, "LODs regenerated");
        Ok(record.lods.clone())
    }

    fn set_lumen(
        &mut self,
        enabled: bool,
        quality: LumenQuality,
    ) -> Result<LumenSettings, HostError> {
        self.lumen = LumenSettings { enabled, quality };
        Ok(self.lumen)
    }

    fn scene_stats(&self) -> SceneStats {
        let mut stats = SceneStats::default();
        for (_, _, record) in self.actors.iter() {
            if record.world != self.current_world {
                continue;
            }
            stats.actors = stats.actors.saturating_add(1);
            if LIGHT_CLASSES.contains(&record.class.as_str()) {
                stats.lights = stats.lights.saturating_add(1);
            }
            if let Some(mesh) = static_mesh_of(record) {
                stats.static_mesh_actors = stats.static_mesh_actors.saturating_add(1);
                if let Some(AssetKind::StaticMesh(mesh)) = self.asset(mesh).map(|a| &a.kind) {
                    stats.total_triangles = stats.total_triangles.saturating_add(mesh.triangles());
                }
            }
        }
        for asset in self.assets.values() {
            stats.assets = stats.assets.saturating_add(1);
            match &asset.kind {
                AssetKind::StaticMesh(mesh) => {
                    stats.meshes = stats.meshes.saturating_add(1);
                    if mesh.nanite {
                        stats.nanite_meshes = stats.nanite_meshes.saturating_add(1);
                    }
                }
                AssetKind::Material { .. } | AssetKind::MaterialInstance { .. } => {
                    stats.materials = stats.materials.saturating_add(1);
                }
                AssetKind::Texture { .. } => stats.textures = stats.textures.saturating_add(1),
                _ => {}
            }
        }
        stats
    }

    fn set_texture_limits(
        &mut self,
        path: &str,
        max_size: u32,
        compression: &str,
    ) -> Result<usize, HostError> {
        let setting = COMPRESSION_SETTINGS
            .iter()
            .find(|known| known.eq_ignore_ascii_case(compression.trim()))
            .ok_or_else(|| {
                HostError::Unsupported(format!("Unknown compression setting: {compression}"))
            })?;

        let root = package_path(path);
        let prefix = format!("{root}/");
        let mut changed = 0_usize;
        for (package, asset) in &mut self.assets {
            if *package != root && !package.starts_with(&prefix) {
                continue;
            }
            if let AssetKind::Texture {
                max_size: limit,
                compression,
                ..
            } = &mut asset.kind
            {
                *limit = max_size;
                *compression = (*setting).to_owned();
                changed = changed.saturating_add(1);
            }
        }
        if changed == 0 {
            return Err(HostError::not_found(format!("No textures found under {path}")));
        }
        Ok(changed)
    }

    fn set_collision(&mut self, mesh: &str, kind: CollisionKind) -> Result<(), HostError> {
        self.mesh_record_mut(mesh)?.collision = Some(kind);
        Ok(())
    }
}
