//! Software scene capture for the in-memory editor.
//!
//! Captures draw a sky/ground backdrop split at the horizon and then every
//! visible primitive as a screen-aligned rectangle, projected through a
//! pinhole camera at the proxy's pose. It is crude, but frames change when
//! the camera or the scene changes, which is what clients observe.

use std::collections::BTreeMap;

use novabridge_types::{ActorId, LinearColor, RenderTargetId, Transform, Vec3};

use super::assets::AssetKind;
use super::props::PropValue;
use super::{ActorRecord, CaptureState, MemoryEditor};
use crate::assets::MaterialParam;
use crate::error::HostError;
use crate::render::{CaptureView, Frame, RenderHost};
use crate::scene::SceneHost;

/// Show flags a capture proxy understands.
const SHOW_FLAGS: &[&str] = &[
    "AntiAliasing",
    "Atmosphere",
    "Bloom",
    "Decals",
    "DynamicShadows",
    "Fog",
    "Game",
    "Grid",
    "Landscape",
    "Lighting",
    "MotionBlur",
    "Particles",
    "PostProcessing",
    "SkeletalMeshes",
    "StaticMeshes",
    "Tonemapper",
    "Translucency",
];

const SKY: [f64; 3] = [0.45, 0.62, 0.85];
const GROUND: [f64; 3] = [0.28, 0.26, 0.24];

fn canonical_flag(flag: &str) -> Option<&'static str> {
    SHOW_FLAGS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(flag.trim()))
}

/// A projected primitive, ready to fill.
struct Quad {
    depth: f64,
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    color: [f64; 3],
}

/// Pinhole camera basis.
struct Camera {
    origin: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    tan_half_fov: f64,
}

impl Camera {
    fn new(view: &CaptureView) -> Self {
        let (sp, cp) = view.rotation.pitch.to_radians().sin_cos();
        let (sy, cy) = view.rotation.yaw.to_radians().sin_cos();
        let fov = view.fov.clamp(5.0, 170.0);
        Self {
            origin: view.location,
            forward: Vec3::new(cp * cy, cp * sy, sp),
            right: Vec3::new(-sy, cy, 0.0),
            up: Vec3::new(-sp * cy, -sp * sy, cp),
            tan_half_fov: (fov / 2.0).to_radians().tan(),
        }
    }

    /// Screen-space centre and pixels-per-unit at `point`, or `None` when
    /// the point is behind the near plane.
    fn project(&self, point: Vec3, width: f64, height: f64) -> Option<(f64, f64, f64, f64)> {
        let rel = Vec3::new(
            point.x - self.origin.x,
            point.y - self.origin.y,
            point.z - self.origin.z,
        );
        let depth = dot(rel, self.forward);
        if depth <= 1.0 {
            return None;
        }
        let scale = width / 2.0 / (depth * self.tan_half_fov);
        let sx = width / 2.0 + dot(rel, self.right) * scale;
        let sy = height / 2.0 - dot(rel, self.up) * scale;
        Some((sx, sy, scale, depth))
    }
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

#[allow(clippy::cast_possible_truncation)]
fn to_pixel(value: f64) -> i64 {
    value.round() as i64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn class_color(class: &str) -> [f64; 3] {
    let hash = class
        .bytes()
        .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
    let channel = |shift: u32| 0.3 + f64::from((hash >> shift) & 0xff) / 255.0 * 0.6;
    [channel(0), channel(8), channel(16)]
}

fn visible_primitive(record: &ActorRecord) -> bool {
    !record.hidden()
        && record.capture.is_none()
        && record.components.iter().any(|c| {
            c.primitive && matches!(c.properties.get("bVisible"), Some(PropValue::Bool(true)))
        })
}

impl MemoryEditor {
    fn capture_state(&self, proxy: ActorId) -> Result<&CaptureState, HostError> {
        self.require_actor(proxy)?
            .capture
            .as_ref()
            .ok_or_else(|| HostError::not_found(format!("Capture proxy not found: {proxy}")))
    }

    fn capture_state_mut(&mut self, proxy: ActorId) -> Result<&mut CaptureState, HostError> {
        self.require_actor_mut(proxy)?
            .capture
            .as_mut()
            .ok_or_else(|| HostError::not_found(format!("Capture proxy not found: {proxy}")))
    }

    fn material_color(&self, path: &str) -> Option<LinearColor> {
        match &self.material_record(path)?.kind {
            AssetKind::Material { color } => *color,
            AssetKind::MaterialInstance { parent, parameters } => {
                match parameters.get("BaseColor") {
                    Some(MaterialParam::Vector(color)) => Some(*color),
                    _ => self.material_color(parent),
                }
            }
            _ => None,
        }
    }

    fn actor_color(&self, record: &ActorRecord) -> [f64; 3] {
        record
            .components
            .iter()
            .filter(|c| c.primitive)
            .flat_map(|c| c.materials.iter().flatten())
            .find_map(|path| self.material_color(path))
            .map_or_else(|| class_color(&record.class), |c| [c.r, c.g, c.b])
    }

    fn rasterize(&self, state: &CaptureState, width: u32, height: u32) -> Vec<u8> {
        let flag = |name: &str| state.show_flags.get(name).copied().unwrap_or(true);
        let lit = flag("Lighting");
        let camera = Camera::new(&state.view);
        let (w, h) = (f64::from(width), f64::from(height));

        let horizon = h / 2.0 + state.view.rotation.pitch.to_radians().tan() * w / 2.0
            / camera.tan_half_fov;
        let mut pixels = Vec::with_capacity(
            usize::try_from(width)
                .unwrap_or(0)
                .saturating_mul(usize::try_from(height).unwrap_or(0))
                .saturating_mul(4),
        );
        for y in 0..height {
            let row = f64::from(y);
            let base = if row < horizon { SKY } else { GROUND };
            let fade = if lit { 1.0 - (row / h) * 0.25 } else { 1.0 };
            let [r, g, b] = base.map(|c| to_byte(c * fade));
            for _ in 0..width {
                pixels.extend_from_slice(&[r, g, b, 255]);
            }
        }

        if !flag("StaticMeshes") {
            return pixels;
        }

        let mut quads: Vec<Quad> = self
            .actors
            .iter()
            .filter(|(_, _, a)| a.world == self.current_world && visible_primitive(a))
            .filter_map(|(_, _, record)| {
                let Transform {
                    location, scale, ..
                } = record.transform;
                let (sx, sy, ppu, depth) = camera.project(location, w, h)?;
                let half_w = scale.x.abs().max(scale.y.abs()) * 50.0 * ppu;
                let half_h = scale.z.abs() * 50.0 * ppu;
                let shade = if lit { 0.35 + 0.65 / (1.0 + depth / 2000.0) } else { 1.0 };
                Some(Quad {
                    depth,
                    x0: to_pixel(sx - half_w),
                    y0: to_pixel(sy - half_h),
                    x1: to_pixel(sx + half_w),
                    y1: to_pixel(sy + half_h),
                    color: self.actor_color(record).map(|c| c * shade),
                })
            })
            .collect();
        quads.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        let stride = i64::from(width);
        for quad in quads {
            let [r, g, b] = quad.color.map(to_byte);
            for y in quad.y0.max(0)..quad.y1.min(i64::from(height)) {
                for x in quad.x0.max(0)..quad.x1.min(stride) {
                    let Ok(offset) = usize::try_from((y * stride + x) * 4) else {
                        continue;
                    };
                    if let Some(px) = pixels.get_mut(offset..offset.saturating_add(4)) {
                        px.copy_from_slice(&[r, g, b, 255]);
                    }
                }
            }
        }
        pixels
    }
}

impl RenderHost for MemoryEditor {
    fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<RenderTargetId, HostError> {
        if width == 0 || height == 0 {
            return Err(HostError::Failed(format!(
                "Cannot allocate a {width}x{height} render target"
            )));
        }
        let (index, generation) = self.render_targets.insert((width, height))?;
        Ok(RenderTargetId::new(index, generation))
    }

    fn release_render_target(&mut self, target: RenderTargetId) {
        self.render_targets.remove(target.index(), target.generation());
    }

    fn render_target_size(&self, target: RenderTargetId) -> Option<(u32, u32)> {
        self.render_targets
            .get(target.index(), target.generation())
            .copied()
    }

    fn spawn_capture_proxy(
        &mut self,
        name: &str,
        view: &CaptureView,
    ) -> Result<ActorId, HostError> {
        let id = self
            .spawn_actor(
                "SceneCapture2D",
                Transform::at(view.location, view.rotation),
                Some(name),
            )
            .map_err(|e| HostError::Failed(e.to_string()))?;
        let record = self.require_actor_mut(id)?;
        record.properties.set_value("bHidden", PropValue::Bool(true));
        if let Some(component) = record.component_mut("CaptureComponent2D") {
            component
                .properties
                .set_value("FOVAngle", PropValue::Float(view.fov));
        }
        record.capture = Some(CaptureState {
            target: None,
            view: *view,
            show_flags: BTreeMap::new(),
        });
        Ok(id)
    }

    fn is_capture_proxy(&self, actor: ActorId) -> bool {
        self.actor_record(actor)
            .is_some_and(|record| record.capture.is_some())
    }

    fn attach_render_target(
        &mut self,
        proxy: ActorId,
        target: RenderTargetId,
    ) -> Result<(), HostError> {
        if self.render_target_size(target).is_none() {
            return Err(HostError::not_found(format!(
                "Render target not found: {target}"
            )));
        }
        self.capture_state_mut(proxy)?.target = Some(target);
        Ok(())
    }

    fn set_capture_view(&mut self, proxy: ActorId, view: &CaptureView) -> Result<(), HostError> {
        self.capture_state_mut(proxy)?.view = *view;
        let record = self.require_actor_mut(proxy)?;
        record.transform.location = view.location;
        record.transform.rotation = view.rotation;
        if let Some(component) = record.component_mut("CaptureComponent2D") {
            component
                .properties
                .set_value("FOVAngle", PropValue::Float(view.fov));
        }
        Ok(())
    }

    fn set_show_flag(
        &mut self,
        proxy: ActorId,
        flag: &str,
        enabled: bool,
    ) -> Result<bool, HostError> {
        let state = self.capture_state_mut(proxy)?;
        match canonical_flag(flag) {
            Some(name) => {
                state.show_flags.insert(name.to_owned(), enabled);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn capture_scene(&mut self, proxy: ActorId) -> Result<Frame, HostError> {
        let state = self.capture_state(proxy)?;
        let target = state
            .target
            .ok_or_else(|| HostError::Failed("No render target attached".to_owned()))?;
        let (width, height) = self
            .render_target_size(target)
            .ok_or_else(|| HostError::Failed("Render target was released".to_owned()))?;
        let rgba = self.rasterize(state, width, height);
        Ok(Frame {
            width,
            height,
            rgba,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use novabridge_types::Rotator;

    use super::*;

    fn view() -> CaptureView {
        CaptureView {
            location: Vec3::new(-500.0, 0.0, 100.0),
            rotation: Rotator::ZERO,
            fov: 90.0,
        }
    }

    fn proxy(editor: &mut MemoryEditor, width: u32, height: u32) -> ActorId {
        let proxy = editor.spawn_capture_proxy("Capture", &view()).unwrap();
        let target = editor.create_render_target(width, height).unwrap();
        editor.attach_render_target(proxy, target).unwrap();
        proxy
    }

    #[test]
    fn capture_without_target_fails() {
        let mut editor = MemoryEditor::new("/tmp/RenderTest");
        let proxy = editor.spawn_capture_proxy("Capture", &view()).unwrap();
        assert!(matches!(
            editor.capture_scene(proxy),
            Err(HostError::Failed(_))
        ));
    }

    #[test]
    fn capture_produces_rgba_of_target_size() {
        let mut editor = MemoryEditor::new("/tmp/RenderTest");
        let proxy = proxy(&mut editor, 64, 32);
        let frame = editor.capture_scene(proxy).unwrap();
        assert_eq!((frame.width, frame.height), (64, 32));
        assert_eq!(frame.rgba.len(), 64 * 32 * 4);
    }

    #[test]
    fn frame_changes_when_actor_enters_view() {
        let mut editor = MemoryEditor::new("/tmp/RenderTest");
        let proxy = proxy(&mut editor, 64, 64);
        let before = editor.capture_scene(proxy).unwrap();
        editor
            .spawn_actor(
                "StaticMeshActor",
                Transform::at(Vec3::new(0.0, 0.0, 100.0), Rotator::ZERO),
                None,
            )
            .unwrap();
        let after = editor.capture_scene(proxy).unwrap();
        assert_ne!(before.rgba, after.rgba);
    }

    #[test]
    fn unknown_show_flag_is_reported() {
        let mut editor = MemoryEditor::new("/tmp/RenderTest");
        let proxy = proxy(&mut editor, 8, 8);
        assert!(editor.set_show_flag(proxy, "lighting", false).unwrap());
        assert!(!editor.set_show_flag(proxy, "Sparkles", true).unwrap());
    }

    #[test]
    fn proxy_is_hidden_from_its_own_capture() {
        let mut editor = MemoryEditor::new("/tmp/RenderTest");
        let proxy = proxy(&mut editor, 8, 8);
        assert!(editor.is_capture_proxy(proxy));
        assert!(editor.actor_record(proxy).unwrap().hidden());
    }
}
