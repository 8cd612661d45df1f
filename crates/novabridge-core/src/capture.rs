//! Offscreen capture sessions.
//!
//! A [`CaptureManager`] owns one render target and one capture proxy in
//! the host world. The pair is created lazily on first use and reused
//! for every later capture until the requested size or the active world
//! changes.
//!
//! # Lifecycle
//!
//! - **Unbound → Bound**: the first [`CaptureManager::ensure`] allocates
//!   a render target and finds or spawns the proxy.
//! - **Bound → Bound**: a world change rebinds. An existing proxy with
//!   the reserved name is reattached before a new one is spawned, and
//!   the render target is kept while it is still alive at the right size.
//! - **Bound → Unbound**: [`CaptureManager::resize`] to new dimensions or
//!   [`CaptureManager::teardown`]. The render target is always released
//!   before anything new is allocated.

use novabridge_host::{CaptureView, Frame, HostError, RenderHost, SceneHost};
use novabridge_types::{ActorId, RenderTargetId, WorldId};
use tracing::debug;

/// Reserved name of the viewport capture proxy.
pub const VIEWPORT_PROXY: &str = "NovaBridge_SceneCapture";
/// Reserved name of the stream capture proxy.
pub const STREAM_PROXY: &str = "NovaBridge_StreamCapture";

/// Whether `name` belongs to a capture proxy the control plane manages.
pub fn is_reserved_proxy_name(name: &str) -> bool {
    name == VIEWPORT_PROXY || name == STREAM_PROXY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bound {
    world: WorldId,
    proxy: ActorId,
    target: RenderTargetId,
}

/// A render target plus capture proxy pair, reused across captures.
#[derive(Debug, Clone)]
pub struct CaptureManager {
    proxy_name: &'static str,
    width: u32,
    height: u32,
    bound: Option<Bound>,
    targets_created: u64,
}

impl CaptureManager {
    /// An unbound session that will capture at `width`×`height`.
    pub const fn new(proxy_name: &'static str, width: u32, height: u32) -> Self {
        Self {
            proxy_name,
            width,
            height,
            bound: None,
            targets_created: 0,
        }
    }

    /// Reserved proxy name.
    pub const fn proxy_name(&self) -> &'static str {
        self.proxy_name
    }

    /// Capture dimensions.
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether a render target and proxy are currently held.
    pub const fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// The render target currently held, if any.
    pub fn target(&self) -> Option<RenderTargetId> {
        self.bound.map(|b| b.target)
    }

    /// The proxy currently held, if any.
    pub fn proxy(&self) -> Option<ActorId> {
        self.bound.map(|b| b.proxy)
    }

    /// Render targets allocated over the lifetime of this manager.
    pub const fn targets_created(&self) -> u64 {
        self.targets_created
    }

    /// Change the capture dimensions. A real change tears the session
    /// down so the next capture rebuilds it; returns whether it did.
    pub fn resize<H>(&mut self, host: &mut H, width: u32, height: u32) -> bool
    where
        H: SceneHost + RenderHost + ?Sized,
    {
        if (width, height) == (self.width, self.height) {
            return false;
        }
        self.teardown(host);
        self.width = width;
        self.height = height;
        true
    }

    /// Make sure a live proxy with an attached render target exists in the
    /// current world and return it.
    ///
    /// # Errors
    ///
    /// Propagates the host failure when the render target or proxy cannot
    /// be created or attached. No render target is leaked on failure.
    pub fn ensure<H>(&mut self, host: &mut H, view: &CaptureView) -> Result<ActorId, HostError>
    where
        H: SceneHost + RenderHost + ?Sized,
    {
        let world = host.current_world();
        let wanted = Some((self.width, self.height));

        if let Some(bound) = self.bound {
            if bound.world == world
                && host.is_capture_proxy(bound.proxy)
                && host.render_target_size(bound.target) == wanted
            {
                return Ok(bound.proxy);
            }
        }

        let kept = match self.bound.take() {
            Some(bound) if host.render_target_size(bound.target) == wanted => Some(bound.target),
            Some(bound) => {
                host.release_render_target(bound.target);
                None
            }
            None => None,
        };
        let target = match kept {
            Some(target) => target,
            None => {
                let target = host.create_render_target(self.width, self.height)?;
                self.targets_created = self.targets_created.saturating_add(1);
                target
            }
        };

        let proxy = match self.find_proxy(host) {
            Some(proxy) => proxy,
            None => match host.spawn_capture_proxy(self.proxy_name, view) {
                Ok(proxy) => proxy,
                Err(e) => {
                    host.release_render_target(target);
                    return Err(e);
                }
            },
        };
        if let Err(e) = host.attach_render_target(proxy, target) {
            host.release_render_target(target);
            return Err(e);
        }

        debug!(
            proxy = self.proxy_name,
            width = self.width,
            height = self.height,
            %world,
            "capture session bound"
        );
        self.bound = Some(Bound {
            world,
            proxy,
            target,
        });
        Ok(proxy)
    }

    fn find_proxy<H>(&self, host: &H) -> Option<ActorId>
    where
        H: SceneHost + RenderHost + ?Sized,
    {
        host.actors()
            .into_iter()
            .find(|a| a.name == self.proxy_name && host.is_capture_proxy(a.id))
            .map(|a| a.id)
    }

    /// Position the proxy at `view` and capture one frame.
    ///
    /// # Errors
    ///
    /// Propagates host failures from binding, positioning, or capture.
    pub fn capture<H>(&mut self, host: &mut H, view: &CaptureView) -> Result<Frame, HostError>
    where
        H: SceneHost + RenderHost + ?Sized,
    {
        let proxy = self.ensure(host, view)?;
        host.set_capture_view(proxy, view)?;
        host.capture_scene(proxy)
    }

    /// Apply show flags to the proxy, binding the session if needed.
    /// Returns the flag names the host does not know.
    ///
    /// # Errors
    ///
    /// Propagates host failures from binding the session.
    pub fn apply_show_flags<H>(
        &mut self,
        host: &mut H,
        view: &CaptureView,
        flags: &[(String, bool)],
    ) -> Result<Vec<String>, HostError>
    where
        H: SceneHost + RenderHost + ?Sized,
    {
        let proxy = self.ensure(host, view)?;
        let mut unknown = Vec::new();
        for (flag, enabled) in flags {
            if !host.set_show_flag(proxy, flag, *enabled)? {
                unknown.push(flag.clone());
            }
        }
        Ok(unknown)
    }

    /// Release the render target and destroy the proxy.
    pub fn teardown<H>(&mut self, host: &mut H)
    where
        H: SceneHost + RenderHost + ?Sized,
    {
        let Some(bound) = self.bound.take() else {
            return;
        };
        host.release_render_target(bound.target);
        if host.is_capture_proxy(bound.proxy) {
            if let Err(e) = host.destroy_actor(bound.proxy) {
                debug!(proxy = self.proxy_name, error = %e, "capture proxy already gone");
            }
        }
        debug!(proxy = self.proxy_name, "capture session torn down");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use novabridge_host::MemoryEditor;
    use novabridge_types::{Rotator, Vec3};

    use super::*;

    fn view() -> CaptureView {
        CaptureView {
            location: Vec3::new(0.0, 0.0, 500.0),
            rotation: Rotator::new(-45.0, 0.0, 0.0),
            fov: 90.0,
        }
    }

    fn proxies(host: &MemoryEditor, name: &str) -> usize {
        host.actors().iter().filter(|a| a.name == name).count()
    }

    #[test]
    fn repeated_captures_reuse_the_target() {
        let mut host = MemoryEditor::new("/tmp/CaptureTest");
        let mut session = CaptureManager::new(VIEWPORT_PROXY, 64, 36);
        let first = session.capture(&mut host, &view()).unwrap();
        let target = session.target();
        let second = session.capture(&mut host, &view()).unwrap();
        assert_eq!(session.target(), target);
        assert_eq!(session.targets_created(), 1);
        assert_eq!(host.render_target_count(), 1);
        assert_eq!((first.width, second.height), (64, 36));
    }

    #[test]
    fn resize_recreates_without_leaking() {
        let mut host = MemoryEditor::new("/tmp/CaptureTest");
        let mut session = CaptureManager::new(VIEWPORT_PROXY, 64, 36);
        session.capture(&mut host, &view()).unwrap();
        let before = session.target();

        assert!(!session.resize(&mut host, 64, 36));
        assert!(session.resize(&mut host, 128, 72));
        assert!(!session.is_bound());
        assert_eq!(host.render_target_count(), 0);

        let frame = session.capture(&mut host, &view()).unwrap();
        assert_eq!((frame.width, frame.height), (128, 72));
        assert_ne!(session.target(), before);
        assert_eq!(host.render_target_count(), 1);
        assert_eq!(proxies(&host, VIEWPORT_PROXY), 1);
    }

    #[test]
    fn world_change_rebinds_and_keeps_target() {
        let mut host = MemoryEditor::new("/tmp/CaptureTest");
        let mut session = CaptureManager::new(VIEWPORT_PROXY, 32, 32);
        session.capture(&mut host, &view()).unwrap();
        let target = session.target();
        let old_proxy = session.proxy();

        host.open_level("Arena");
        session.capture(&mut host, &view()).unwrap();
        assert_eq!(session.target(), target);
        assert_ne!(session.proxy(), old_proxy);
        assert_eq!(proxies(&host, VIEWPORT_PROXY), 1);
        assert_eq!(host.render_target_count(), 1);
    }

    #[test]
    fn existing_proxy_is_reattached() {
        let mut host = MemoryEditor::new("/tmp/CaptureTest");
        let existing = host.spawn_capture_proxy(STREAM_PROXY, &view()).unwrap();
        let mut session = CaptureManager::new(STREAM_PROXY, 16, 16);
        assert_eq!(session.ensure(&mut host, &view()).unwrap(), existing);
        assert_eq!(proxies(&host, STREAM_PROXY), 1);
    }

    #[test]
    fn teardown_destroys_proxy() {
        let mut host = MemoryEditor::new("/tmp/CaptureTest");
        let mut session = CaptureManager::new(VIEWPORT_PROXY, 16, 16);
        session.capture(&mut host, &view()).unwrap();
        session.teardown(&mut host);
        assert_eq!(proxies(&host, VIEWPORT_PROXY), 0);
        assert_eq!(host.render_target_count(), 0);
        session.teardown(&mut host);
    }

    #[test]
    fn unknown_show_flags_are_returned() {
        let mut host = MemoryEditor::new("/tmp/CaptureTest");
        let mut session = CaptureManager::new(VIEWPORT_PROXY, 16, 16);
        let flags = vec![("Lighting".to_owned(), false), ("Sparkles".to_owned(), true)];
        let unknown = session.apply_show_flags(&mut host, &view(), &flags).unwrap();
        assert_eq!(unknown, ["Sparkles"]);
        assert!(session.is_bound());
    }

    #[test]
    fn reserved_names() {
        assert!(is_reserved_proxy_name("NovaBridge_SceneCapture"));
        assert!(is_reserved_proxy_name("NovaBridge_StreamCapture"));
        assert!(!is_reserved_proxy_name("Floor"));
    }
}
