//! Procedural volumes for the in-memory editor.

use std::collections::BTreeMap;

use novabridge_types::{ActorId, Rotator, Transform, Vec3};
use tracing::debug;

use super::assets::AssetKind;
use super::props::PropValue;
use super::scene::actor_extent;
use super::{MemoryEditor, PcgState};
use crate::error::HostError;
use crate::procedural::ProceduralHost;
use crate::scene::SceneHost;

/// Points per square metre when the graph has no `Density` override.
const DEFAULT_DENSITY: f64 = 0.1;

/// Edge length of a unit-scale volume brush.
const BRUSH_SIZE: f64 = 200.0;

fn parse_param(value: &str, param_type: Option<&str>) -> Result<PropValue, HostError> {
    let value = value.trim();
    let invalid = || HostError::invalid(format!("Invalid parameter value: {value}"));
    match param_type.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(infer_param(value)),
        Some("float" | "double") => value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(PropValue::Float)
            .ok_or_else(invalid),
        Some("int" | "integer") => value.parse().map(PropValue::Int).map_err(|_| invalid()),
        Some("bool" | "boolean") => PropValue::Bool(false).import(value).ok_or_else(invalid),
        Some("string" | "name") => Ok(PropValue::Text(value.to_owned())),
        Some(other) => Err(HostError::invalid(format!(
            "Unsupported parameter type: {other}"
        ))),
    }
}

fn infer_param(value: &str) -> PropValue {
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
        PropValue::Bool(value.eq_ignore_ascii_case("true"))
    } else if let Ok(i) = value.parse::<i64>() {
        PropValue::Int(i)
    } else if let Some(f) = value.parse::<f64>().ok().filter(|f| f.is_finite()) {
        PropValue::Float(f)
    } else {
        PropValue::Text(value.to_owned())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn point_count(extent: Vec3, density: f64) -> usize {
    let area_m2 = (extent.x * 2.0 / 100.0) * (extent.y * 2.0 / 100.0);
    (area_m2.abs() * density.max(0.0)).round().max(1.0) as usize
}

impl MemoryEditor {
    fn pcg_state_mut(&mut self, volume: ActorId) -> Result<&mut PcgState, HostError> {
        self.require_actor_mut(volume)?
            .pcg
            .as_mut()
            .ok_or_else(|| HostError::invalid("Actor has no PCG component"))
    }
}

impl ProceduralHost for MemoryEditor {
    fn list_graphs(&self) -> Vec<String> {
        self.assets
            .values()
            .filter(|a| matches!(a.kind, AssetKind::ProceduralGraph))
            .map(|a| a.object_path())
            .collect()
    }

    fn create_volume(
        &mut self,
        graph: &str,
        location: Vec3,
        size: Vec3,
        label: Option<&str>,
    ) -> Result<ActorId, HostError> {
        let graph_path = self
            .asset(graph)
            .filter(|a| matches!(a.kind, AssetKind::ProceduralGraph))
            .map(|a| a.object_path())
            .ok_or_else(|| HostError::not_found(format!("PCG graph not found: {graph}")))?;

        let transform = Transform {
            location,
            rotation: Rotator::ZERO,
            scale: Vec3::new(
                size.x / BRUSH_SIZE,
                size.y / BRUSH_SIZE,
                size.z / BRUSH_SIZE,
            ),
        };
        let id = self.spawn_actor("PCGVolume", transform, None)?;
        if let Some(label) = label.filter(|l| !l.is_empty()) {
            self.set_actor_label(id, label)?;
        }
        let record = self.require_actor_mut(id)?;
        if let Some(component) = record.component_mut("PCGComponent") {
            component
                .properties
                .set_value("Graph", PropValue::Text(graph_path.clone()));
        }
        record.pcg = Some(PcgState {
            graph: graph_path,
            params: BTreeMap::new(),
            generated: 0,
        });
        Ok(id)
    }

    fn generate(
        &mut self,
        volume: ActorId,
        seed: Option<i64>,
        force_regenerate: bool,
    ) -> Result<usize, HostError> {
        let record = self.require_actor_mut(volume)?;
        let extent = actor_extent(record);
        let component = record.component_mut("PCGComponent");
        if let (Some(component), Some(seed)) = (component, seed) {
            component.properties.set_value("Seed", PropValue::Int(seed));
        }
        let state = record
            .pcg
            .as_mut()
            .ok_or_else(|| HostError::invalid("Actor has no PCG component"))?;
        if state.generated > 0 && !force_regenerate {
            return Ok(state.generated);
        }
        let density = match state.params.get("Density") {
            Some(PropValue::Float(f)) => *f,
            #[allow(clippy::cast_precision_loss)]
            Some(PropValue::Int(i)) => *i as f64,
            _ => DEFAULT_DENSITY,
        };
        state.generated = point_count(extent, density);
        debug!(graph = state.graph, points = state.generated, "PCG generated");
        Ok(state.generated)
    }

    fn set_graph_param(
        &mut self,
        volume: ActorId,
        name: &str,
        value: &str,
        param_type: Option<&str>,
    ) -> Result<(), HostError> {
        let parsed = parse_param(value, param_type)?;
        self.pcg_state_mut(volume)?
            .params
            .insert(name.to_owned(), parsed);
        Ok(())
    }

    fn cleanup(&mut self, volume: ActorId) -> Result<(), HostError> {
        self.pcg_state_mut(volume)?.generated = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const GRAPH: &str = "/Game/PCG/PCG_Scatter.PCG_Scatter";

    #[test]
    fn volume_requires_known_graph() {
        let mut e = MemoryEditor::new("/tmp/PcgTest");
        assert_eq!(e.list_graphs(), [GRAPH.to_owned()]);
        let err = e
            .create_volume("/Game/PCG/Missing", Vec3::ZERO, Vec3::ONE, None)
            .unwrap_err();
        assert!(matches!(err, HostError::NotFound(_)));
    }

    #[test]
    fn generation_scales_with_area_and_density() {
        let mut e = MemoryEditor::new("/tmp/PcgTest");
        let size = Vec3::new(1000.0, 1000.0, 200.0);
        let volume = e.create_volume(GRAPH, Vec3::ZERO, size, Some("Forest")).unwrap();
        assert_eq!(e.actor(volume).unwrap().label, "Forest");

        assert_eq!(e.generate(volume, Some(7), false).unwrap(), 10);
        e.set_graph_param(volume, "Density", "0.5", Some("float")).unwrap();
        assert_eq!(e.generate(volume, None, false).unwrap(), 10);
        assert_eq!(e.generate(volume, None, true).unwrap(), 50);
    }

    #[test]
    fn typed_params_are_validated() {
        let mut e = MemoryEditor::new("/tmp/PcgTest");
        let volume = e.create_volume(GRAPH, Vec3::ZERO, Vec3::ONE, None).unwrap();
        assert!(e.set_graph_param(volume, "Count", "abc", Some("int")).is_err());
        assert!(e.set_graph_param(volume, "Count", "3", Some("vector")).is_err());
        e.set_graph_param(volume, "Enabled", "true", None).unwrap();
    }

    #[test]
    fn non_volume_actor_is_rejected() {
        let mut e = MemoryEditor::new("/tmp/PcgTest");
        let light = e.spawn_actor("PointLight", Transform::default(), None).unwrap();
        assert!(matches!(e.cleanup(light), Err(HostError::InvalidArgument(_))));
    }
}
