//! Offscreen rendering: render targets and scene-capture proxies.
//!
//! A capture proxy is an actor in the world that rasterizes the scene
//! into the render target attached to it. Render targets are GPU-backed
//! and must be released explicitly.

use novabridge_types::{ActorId, RenderTargetId, Rotator, Vec3};

use crate::error::HostError;

/// Pose and projection of a capture proxy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureView {
    /// Camera location.
    pub location: Vec3,
    /// Camera rotation.
    pub rotation: Rotator,
    /// Horizontal field of view in degrees.
    pub fov: f64,
}

/// Pixels read back from a render target, 8-bit RGBA, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

/// Render target and capture proxy management.
pub trait RenderHost {
    /// Allocate a render target.
    ///
    /// # Errors
    ///
    /// [`HostError::Failed`] when the renderer cannot allocate it.
    fn create_render_target(&mut self, width: u32, height: u32)
    -> Result<RenderTargetId, HostError>;

    /// Release a render target. Stale handles are ignored.
    fn release_render_target(&mut self, target: RenderTargetId);

    /// Dimensions of a live render target; `None` when the handle is stale.
    fn render_target_size(&self, target: RenderTargetId) -> Option<(u32, u32)>;

    /// Spawn a hidden capture proxy called `name` in the current world.
    ///
    /// # Errors
    ///
    /// [`HostError::Failed`] when the actor cannot be spawned.
    fn spawn_capture_proxy(&mut self, name: &str, view: &CaptureView)
    -> Result<ActorId, HostError>;

    /// Whether `actor` is a live capture proxy in the current world.
    fn is_capture_proxy(&self, actor: ActorId) -> bool;

    /// Point a capture proxy at a render target.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when either handle is stale.
    fn attach_render_target(
        &mut self,
        proxy: ActorId,
        target: RenderTargetId,
    ) -> Result<(), HostError>;

    /// Move a capture proxy and set its field of view.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when the proxy handle is stale.
    fn set_capture_view(&mut self, proxy: ActorId, view: &CaptureView) -> Result<(), HostError>;

    /// Toggle a named show flag on a capture proxy. Returns `false` when
    /// the flag name is unknown.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when the proxy handle is stale.
    fn set_show_flag(&mut self, proxy: ActorId, flag: &str, enabled: bool)
    -> Result<bool, HostError>;

    /// Capture the scene synchronously and read the pixels back.
    ///
    /// # Errors
    ///
    /// [`HostError::NotFound`] when the proxy is stale,
    /// [`HostError::Failed`] when no render target is attached.
    fn capture_scene(&mut self, proxy: ActorId) -> Result<Frame, HostError>;
}
