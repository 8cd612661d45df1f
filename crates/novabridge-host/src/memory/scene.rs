//! Scene graph for the in-memory editor, including the class catalogue.

use novabridge_types::{ActorId, LinearColor, Transform, Vec3, WorldId};

use super::props::{ImportFailure, PropValue, PropertyBag};
use super::{ActorRecord, ComponentRecord, MemoryEditor};
use crate::error::HostError;
use crate::scene::{
    ActorSummary, ComponentSummary, ProjectInfo, PropertyEntry, PropertyTarget, SceneHost,
};

/// Actor classes the editor can spawn.
pub(crate) const ACTOR_CLASSES: &[&str] = &[
    "Actor",
    "StaticMeshActor",
    "PointLight",
    "SpotLight",
    "DirectionalLight",
    "SkyLight",
    "CameraActor",
    "PlayerStart",
    "ExponentialHeightFog",
    "PostProcessVolume",
    "SceneCapture2D",
    "LevelSequenceActor",
    "PCGVolume",
];

/// Resolve a class name, accepting `/Script/Engine.` qualified paths.
pub(crate) fn resolve_class(class: &str) -> Option<&'static str> {
    let short = class
        .rsplit_once('.')
        .map_or(class, |(_, name)| name)
        .trim();
    ACTOR_CLASSES.iter().copied().find(|c| *c == short)
}

fn component(name: &str, class: &str, properties: PropertyBag) -> ComponentRecord {
    ComponentRecord {
        name: name.to_owned(),
        class: class.to_owned(),
        primitive: false,
        properties,
        materials: Vec::new(),
    }
}

fn primitive(name: &str, class: &str, properties: PropertyBag, slots: usize) -> ComponentRecord {
    ComponentRecord {
        primitive: true,
        materials: vec![None; slots],
        ..component(name, class, properties)
    }
}

fn light_properties(intensity: f64) -> PropertyBag {
    PropertyBag::default()
        .with("Intensity", PropValue::Float(intensity))
        .with("LightColor", PropValue::Color(LinearColor::default()))
        .with("CastShadows", PropValue::Bool(true))
        .with("bVisible", PropValue::Bool(true))
}

/// Default components for an actor class.
pub(crate) fn class_components(class: &str) -> Vec<ComponentRecord> {
    match class {
        "StaticMeshActor" => vec![primitive(
            "StaticMeshComponent0",
            "StaticMeshComponent",
            PropertyBag::default()
                .with("StaticMesh", PropValue::Text(String::new()))
                .with("Mobility", PropValue::Text("Static".to_owned()))
                .with("CastShadow", PropValue::Bool(true))
                .with("bVisible", PropValue::Bool(true)),
            1,
        )],
        "PointLight" => vec![component(
            "LightComponent0",
            "PointLightComponent",
            light_properties(5000.0).with("AttenuationRadius", PropValue::Float(1000.0)),
        )],
        "SpotLight" => vec![component(
            "LightComponent0",
            "SpotLightComponent",
            light_properties(5000.0)
                .with("InnerConeAngle", PropValue::Float(0.0))
                .with("OuterConeAngle", PropValue::Float(44.0)),
        )],
        "DirectionalLight" => vec![component(
            "LightComponent0",
            "DirectionalLightComponent",
            light_properties(10.0).with("bAtmosphereSunLight", PropValue::Bool(true)),
        )],
        "SkyLight" => vec![component(
            "SkyLightComponent0",
            "SkyLightComponent",
            PropertyBag::default()
                .with("Intensity", PropValue::Float(1.0))
                .with("bRealTimeCapture", PropValue::Bool(false)),
        )],
        "CameraActor" => vec![component(
            "CameraComponent",
            "CameraComponent",
            PropertyBag::default()
                .with("FieldOfView", PropValue::Float(90.0))
                .with("AspectRatio", PropValue::Float(1.777_778))
                .with("bConstrainAspectRatio", PropValue::Bool(false)),
        )],
        "PlayerStart" => vec![primitive(
            "CollisionCapsule",
            "CapsuleComponent",
            PropertyBag::default()
                .with("CapsuleHalfHeight", PropValue::Float(92.0))
                .with("CapsuleRadius", PropValue::Float(40.0)),
            0,
        )],
        "ExponentialHeightFog" => vec![component(
            "HeightFogComponent0",
            "ExponentialHeightFogComponent",
            PropertyBag::default()
                .with("FogDensity", PropValue::Float(0.02))
                .with("FogHeightFalloff", PropValue::Float(0.2))
                .with("FogInscatteringColor", PropValue::Color(LinearColor::default())),
        )],
        "PostProcessVolume" => vec![primitive(
            "BrushComponent0",
            "BrushComponent",
            PropertyBag::default().with("bVisible", PropValue::Bool(false)),
            0,
        )],
        "SceneCapture2D" => vec![component(
            "CaptureComponent2D",
            "SceneCaptureComponent2D",
            PropertyBag::default()
                .with("FOVAngle", PropValue::Float(90.0))
                .with("bCaptureEveryFrame", PropValue::Bool(false))
                .with("bCaptureOnMovement", PropValue::Bool(false)),
        )],
        "PCGVolume" => vec![
            primitive(
                "BrushComponent0",
                "BrushComponent",
                PropertyBag::default().with("bVisible", PropValue::Bool(false)),
                0,
            ),
            component(
                "PCGComponent",
                "PCGComponent",
                PropertyBag::default()
                    .with("Graph", PropValue::Text(String::new()))
                    .with("Seed", PropValue::Int(42))
                    .with("bActivated", PropValue::Bool(true)),
            ),
        ],
        _ => vec![component(
            "DefaultSceneRoot",
            "SceneComponent",
            PropertyBag::default().with("bVisible", PropValue::Bool(true)),
        )],
    }
}

fn class_properties(class: &str) -> PropertyBag {
    let base = PropertyBag::default()
        .with("bHidden", PropValue::Bool(false))
        .with("bCanBeDamaged", PropValue::Bool(true))
        .with("Tags", PropValue::Text(String::new()));
    match class {
        "PostProcessVolume" => base
            .with("bUnbound", PropValue::Bool(false))
            .with("BlendWeight", PropValue::Float(1.0))
            .with("Priority", PropValue::Float(0.0)),
        _ => base,
    }
}

impl MemoryEditor {
    fn name_taken(&self, world: WorldId, name: &str) -> bool {
        self.actors
            .iter()
            .any(|(_, _, a)| a.world == world && a.name == name)
    }

    fn unique_name(&self, world: WorldId, class: &str) -> String {
        let mut n = 0_u32;
        loop {
            let candidate = format!("{class}_{n}");
            if !self.name_taken(world, &candidate) {
                return candidate;
            }
            n = n.saturating_add(1);
        }
    }

    fn summary(&self, id: ActorId, record: &ActorRecord) -> ActorSummary {
        let level = self
            .worlds
            .get(usize::try_from(record.world.index()).unwrap_or(usize::MAX))
            .map_or("Unknown", String::as_str);
        ActorSummary {
            id,
            name: record.name.clone(),
            label: record.label.clone(),
            class: record.class.clone(),
            path: format!("/Game/Maps/{level}.{level}:PersistentLevel.{}", record.name),
            transform: record.transform,
        }
    }
}

impl SceneHost for MemoryEditor {
    fn project_info(&self) -> ProjectInfo {
        self.project.clone()
    }

    fn current_world(&self) -> WorldId {
        self.current_world
    }

    fn level_name(&self) -> String {
        self.worlds
            .get(usize::try_from(self.current_world.index()).unwrap_or(usize::MAX))
            .cloned()
            .unwrap_or_default()
    }

    fn actors(&self) -> Vec<ActorSummary> {
        self.actors
            .iter()
            .filter(|(_, _, a)| a.world == self.current_world)
            .map(|(index, generation, a)| self.summary(ActorId::new(index, generation), a))
            .collect()
    }

    fn actor(&self, id: ActorId) -> Option<ActorSummary> {
        self.actor_record(id).map(|a| self.summary(id, a))
    }

    fn spawn_actor(
        &mut self,
        class: &str,
        transform: Transform,
        name: Option<&str>,
    ) -> Result<ActorId, HostError> {
        let class = resolve_class(class)
            .ok_or_else(|| HostError::invalid(format!("Class not found: {class}")))?;
        let world = self.current_world;
        let name = match name {
            Some(requested) if self.name_taken(world, requested) => {
                return Err(HostError::invalid(format!(
                    "An actor named {requested} already exists"
                )));
            }
            Some(requested) => requested.to_owned(),
            None => self.unique_name(world, class),
        };

        let record = ActorRecord {
            world,
            label: name.clone(),
            name,
            class: class.to_owned(),
            transform,
            properties: class_properties(class),
            components: class_components(class),
            capture: None,
            pcg: None,
        };
        let (index, generation) = self.actors.insert(record)?;
        Ok(ActorId::new(index, generation))
    }

    fn set_actor_label(&mut self, id: ActorId, label: &str) -> Result<(), HostError> {
        self.require_actor_mut(id)?.label = label.to_owned();
        Ok(())
    }

    fn destroy_actor(&mut self, id: ActorId) -> Result<(), HostError> {
        self.require_actor(id)?;
        self.actors.remove(id.index(), id.generation());
        Ok(())
    }

    fn set_actor_transform(
        &mut self,
        id: ActorId,
        transform: Transform,
    ) -> Result<(), HostError> {
        self.require_actor_mut(id)?.transform = transform;
        Ok(())
    }

    fn components(&self, id: ActorId) -> Result<Vec<ComponentSummary>, HostError> {
        Ok(self
            .require_actor(id)?
            .components
            .iter()
            .map(|c| ComponentSummary {
                name: c.name.clone(),
                class: c.class.clone(),
                primitive: c.primitive,
            })
            .collect())
    }

    fn properties(&self, target: &PropertyTarget) -> Result<Vec<PropertyEntry>, HostError> {
        let actor = self.require_actor(target.actor())?;
        match target {
            PropertyTarget::Actor(_) => Ok(actor.properties.entries()),
            PropertyTarget::Component { component, .. } => actor
                .component(component)
                .map(|c| c.properties.entries())
                .ok_or_else(|| HostError::not_found(format!("Component not found: {component}"))),
        }
    }

    fn set_property(
        &mut self,
        target: &PropertyTarget,
        name: &str,
        value: &str,
    ) -> Result<(), HostError> {
        let actor = self.require_actor_mut(target.actor())?;
        let bag = match target {
            PropertyTarget::Actor(_) => &mut actor.properties,
            PropertyTarget::Component { component, .. } => {
                &mut actor
                    .component_mut(component)
                    .ok_or_else(|| {
                        HostError::not_found(format!("Component not found: {component}"))
                    })?
                    .properties
            }
        };
        bag.import(name, value).map_err(|failure| match failure {
            ImportFailure::Missing => HostError::not_found(format!("Property not found: {name}")),
            ImportFailure::Unparseable => {
                HostError::invalid(format!("Failed to set property: {name}"))
            }
        })
    }

    fn set_material_slot(
        &mut self,
        actor: ActorId,
        component: &str,
        slot: usize,
        material: &str,
    ) -> Result<(), HostError> {
        let material_path = self
            .material_record(material)
            .map(|record| record.object_path())
            .ok_or_else(|| HostError::invalid(format!("Material not found: {material}")))?;

        let record = self.require_actor_mut(actor)?;
        let component = record
            .component_mut(component)
            .filter(|c| c.primitive)
            .ok_or_else(|| {
                HostError::invalid(format!("Component is not a primitive: {component}"))
            })?;
        if component.materials.len() <= slot {
            component.materials.resize(slot.saturating_add(1), None);
        }
        if let Some(entry) = component.materials.get_mut(slot) {
            *entry = Some(material_path);
        }
        Ok(())
    }
}

/// Scale factor of an actor, used by volume-based subsystems.
pub(crate) fn actor_extent(record: &ActorRecord) -> Vec3 {
    let s = record.transform.scale;
    Vec3::new(s.x * 100.0, s.y * 100.0, s.z * 100.0)
}
