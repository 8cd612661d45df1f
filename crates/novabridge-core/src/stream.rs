//! Live viewport streaming.
//!
//! The [`StreamHub`] owns the client registry, the stream configuration,
//! and a single shared frame timer. The timer polls at the maximum frame
//! rate; a [`FrameGate`] derived from the configured fps decides whether
//! a poll captures. Captures run on the privileged editor thread and the
//! encoded JPEG is pushed to every client's bounded outbound queue.
//!
//! # Lifecycle
//!
//! - The first client to connect switches streaming on and starts the
//!   timer. Later connects leave the timer alone.
//! - The last client to leave stops the timer and switches streaming off.
//! - `start`/`stop` force streaming on or off, but the timer never runs
//!   with an empty registry.
//!
//! # Backpressure
//!
//! Each client queue holds [`CLIENT_QUEUE_FRAMES`] frames. A full queue
//! drops that frame for that client only; a closed queue removes the
//! client in the same pass.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::StreamDefaults;
use crate::dispatcher::EditorThread;
use crate::session::EditorSession;

/// Highest supported frame rate; also the timer poll rate.
pub const MAX_FPS: u32 = 30;
/// Frames buffered per client before frames are dropped for it.
pub const CLIENT_QUEUE_FRAMES: usize = 2;

const FPS_RANGE: (i64, i64) = (1, 30);
const WIDTH_RANGE: (i64, i64) = (64, 1920);
const HEIGHT_RANGE: (i64, i64) = (64, 1080);
const QUALITY_RANGE: (i64, i64) = (1, 100);

/// Errors from a stream configuration request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamConfigError {
    /// A field is outside its allowed range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Inclusive minimum.
        min: i64,
        /// Inclusive maximum.
        max: i64,
    },
}

/// Active stream settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamConfig {
    /// Frames per second, 1..=30.
    pub fps: u32,
    /// Frame width, 64..=1920.
    pub width: u32,
    /// Frame height, 64..=1080.
    pub height: u32,
    /// JPEG quality, 1..=100.
    pub quality: u8,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::from_defaults(&StreamDefaults::default())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_u32(value: u32, (min, max): (i64, i64)) -> u32 {
    i64::from(value).clamp(min, max) as u32
}

impl StreamConfig {
    /// Build from configured defaults, clamping each field into range.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_defaults(defaults: &StreamDefaults) -> Self {
        Self {
            fps: clamp_u32(defaults.fps, FPS_RANGE),
            width: clamp_u32(defaults.width, WIDTH_RANGE),
            height: clamp_u32(defaults.height, HEIGHT_RANGE),
            quality: i64::from(defaults.quality).clamp(QUALITY_RANGE.0, QUALITY_RANGE.1) as u8,
        }
    }
}

/// A partial configuration change. Absent fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamConfigUpdate {
    /// New fps.
    pub fps: Option<i64>,
    /// New width.
    pub width: Option<i64>,
    /// New height.
    pub height: Option<i64>,
    /// New quality.
    pub quality: Option<i64>,
}

fn checked(
    field: &'static str,
    value: Option<i64>,
    (min, max): (i64, i64),
) -> Result<Option<i64>, StreamConfigError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => {
            Err(StreamConfigError::OutOfRange { field, min, max })
        }
        other => Ok(other),
    }
}

impl StreamConfigUpdate {
    /// Apply to `current`. Nothing changes unless every field is valid.
    ///
    /// # Errors
    ///
    /// [`StreamConfigError::OutOfRange`] naming the first bad field.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn apply(&self, current: StreamConfig) -> Result<StreamConfig, StreamConfigError> {
        let fps = checked("fps", self.fps, FPS_RANGE)?;
        let width = checked("width", self.width, WIDTH_RANGE)?;
        let height = checked("height", self.height, HEIGHT_RANGE)?;
        let quality = checked("quality", self.quality, QUALITY_RANGE)?;
        Ok(StreamConfig {
            fps: fps.map_or(current.fps, |v| v as u32),
            width: width.map_or(current.width, |v| v as u32),
            height: height.map_or(current.height, |v| v as u32),
            quality: quality.map_or(current.quality, |v| v as u8),
        })
    }
}

/// Enforces a minimum interval between captured frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameGate {
    last: Option<Instant>,
}

impl FrameGate {
    /// Whether a frame may be captured at `now` under `fps`. A `true`
    /// answer claims the slot.
    pub fn ready(&mut self, now: Instant, fps: u32) -> bool {
        let interval = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
        match self.last {
            Some(last) if now.saturating_duration_since(last) < interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Snapshot reported by `/stream/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamStatus {
    /// Whether streaming is switched on.
    pub streaming: bool,
    /// Connected clients.
    pub clients: usize,
    /// Frames per second.
    pub fps: u32,
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// JPEG quality.
    pub quality: u8,
    /// WebSocket port.
    pub port: u16,
    /// Frames captured and broadcast since startup.
    pub frames_sent: u64,
}

/// What one timer poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Streaming is off or nobody is connected.
    Idle,
    /// The frame gate has not opened yet, or a capture is still queued.
    Throttled,
    /// A frame was captured and offered to this many clients.
    Broadcast(usize),
    /// Capture or encoding failed.
    Failed,
}

/// Client queues, the streaming switch, and the frame timer handle.
///
/// Kept behind one lock so a connect and a disconnect can never disagree
/// about who owns the timer.
#[derive(Debug, Default)]
struct Registry {
    clients: BTreeMap<u64, mpsc::Sender<Bytes>>,
    streaming: bool,
    timer: Option<JoinHandle<()>>,
}

impl Registry {
    fn timer_alive(&self) -> bool {
        self.timer.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Switch streaming off and abort the timer.
    fn idle(&mut self) {
        self.streaming = false;
        if let Some(handle) = self.timer.take() {
            handle.abort();
            debug!("stream timer stopped");
        }
    }
}

/// Marks a capture as in flight until dropped, including when the timer
/// task is aborted mid-capture.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        (!flag.swap(true, Ordering::AcqRel)).then_some(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Client registry, configuration, and frame timer.
#[derive(Debug)]
pub struct StreamHub {
    editor: Arc<EditorThread<EditorSession>>,
    port: u16,
    registry: Mutex<Registry>,
    next_client: AtomicU64,
    tick_in_flight: AtomicBool,
    frames_sent: AtomicU64,
    config: Mutex<StreamConfig>,
    gate: Mutex<FrameGate>,
}

impl StreamHub {
    /// Create a hub that captures through `editor`.
    pub fn new(
        editor: Arc<EditorThread<EditorSession>>,
        config: StreamConfig,
        port: u16,
    ) -> Arc<Self> {
        Arc::new(Self {
            editor,
            port,
            registry: Mutex::new(Registry::default()),
            next_client: AtomicU64::new(1),
            tick_in_flight: AtomicBool::new(false),
            frames_sent: AtomicU64::new(0),
            config: Mutex::new(config),
            gate: Mutex::new(FrameGate::default()),
        })
    }

    // -----------------------------------------------------------------------
    // Clients
    // -----------------------------------------------------------------------

    /// Register a client. Returns its id and its frame queue.
    pub async fn connect(self: &Arc<Self>) -> (u64, mpsc::Receiver<Bytes>) {
        let id = self.next_client.fetch_add(1, Ordering::AcqRel);
        let (tx, rx) = mpsc::channel(CLIENT_QUEUE_FRAMES);
        let mut registry = self.registry.lock().await;
        registry.clients.insert(id, tx);
        info!(client_id = id, "stream client connected");
        if registry.clients.len() == 1 {
            registry.streaming = true;
            self.ensure_timer(&mut registry);
        }
        (id, rx)
    }

    /// Remove a client. The last one out stops streaming.
    pub async fn disconnect(&self, id: u64) {
        let mut registry = self.registry.lock().await;
        if registry.clients.remove(&id).is_none() {
            return;
        }
        info!(client_id = id, "stream client disconnected");
        if registry.clients.is_empty() {
            registry.idle();
        }
    }

    /// Connected client count.
    pub async fn client_count(&self) -> usize {
        self.registry.lock().await.clients.len()
    }

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------

    /// Force streaming on. With no clients connected nothing runs and
    /// streaming stays off.
    pub async fn start(self: &Arc<Self>) -> StreamStatus {
        {
            let mut registry = self.registry.lock().await;
            if !registry.clients.is_empty() {
                registry.streaming = true;
                self.ensure_timer(&mut registry);
            }
        }
        self.status().await
    }

    /// Force streaming off. Clients stay connected.
    pub async fn stop(&self) -> StreamStatus {
        self.registry.lock().await.idle();
        self.status().await
    }

    /// Apply a configuration change. A size change invalidates the
    /// stream capture session on the editor thread.
    ///
    /// # Errors
    ///
    /// [`StreamConfigError`] when any field is out of range; the current
    /// configuration is left untouched.
    pub async fn configure(
        &self,
        update: StreamConfigUpdate,
    ) -> Result<StreamConfig, StreamConfigError> {
        let (old, new) = {
            let mut config = self.config.lock().await;
            let old = *config;
            *config = update.apply(old)?;
            (old, *config)
        };
        if (old.width, old.height) != (new.width, new.height) {
            let (width, height) = (new.width, new.height);
            if let Err(e) = self
                .editor
                .submit(move |session| session.resize_stream(width, height))
            {
                warn!(error = %e, "could not invalidate stream capture");
            }
        }
        debug!(?new, "stream configured");
        Ok(new)
    }

    /// Current configuration.
    pub async fn config(&self) -> StreamConfig {
        *self.config.lock().await
    }

    /// Current status.
    pub async fn status(&self) -> StreamStatus {
        let config = self.config().await;
        let (streaming, clients) = {
            let registry = self.registry.lock().await;
            (registry.streaming, registry.clients.len())
        };
        StreamStatus {
            streaming,
            clients,
            fps: config.fps,
            width: config.width,
            height: config.height,
            quality: config.quality,
            port: self.port,
            frames_sent: self.frames_sent.load(Ordering::Acquire),
        }
    }

    /// Whether the frame timer task is alive.
    pub async fn timer_running(&self) -> bool {
        self.registry.lock().await.timer_alive()
    }

    /// Stop the timer and drop every client queue.
    pub async fn shutdown(&self) {
        let dropped = {
            let mut registry = self.registry.lock().await;
            registry.idle();
            let n = registry.clients.len();
            registry.clients.clear();
            n
        };
        info!(clients = dropped, "stream hub shut down");
    }

    // -----------------------------------------------------------------------
    // Frame timer
    // -----------------------------------------------------------------------

    /// Spawn the timer unless one is alive. Caller holds the registry.
    fn ensure_timer(self: &Arc<Self>, registry: &mut Registry) {
        if registry.timer_alive() {
            return;
        }
        let hub: Weak<Self> = Arc::downgrade(self);
        registry.timer = Some(tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(1) / MAX_FPS);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(hub) = hub.upgrade() else {
                    break;
                };
                hub.tick(Instant::now()).await;
            }
        }));
        debug!("stream timer started");
    }

    /// One timer poll at `now`: gate, capture, encode, broadcast.
    pub async fn tick(&self, now: Instant) -> TickOutcome {
        {
            let registry = self.registry.lock().await;
            if !registry.streaming || registry.clients.is_empty() {
                return TickOutcome::Idle;
            }
        }
        let Some(_in_flight) = InFlight::claim(&self.tick_in_flight) else {
            return TickOutcome::Throttled;
        };
        self.capture_and_broadcast(now).await
    }

    async fn capture_and_broadcast(&self, now: Instant) -> TickOutcome {
        let config = self.config().await;
        if !self.gate.lock().await.ready(now, config.fps) {
            return TickOutcome::Throttled;
        }
        let frame = match self.editor.call(move |s| s.stream_frame(&config)).await {
            Ok(Ok(jpeg)) => Bytes::from(jpeg),
            Ok(Err(e)) => {
                warn!(error = %e, "stream capture failed");
                return TickOutcome::Failed;
            }
            Err(e) => {
                warn!(error = %e, "stream capture not dispatched");
                return TickOutcome::Failed;
            }
        };
        let offered = self.broadcast(frame).await;
        TickOutcome::Broadcast(offered)
    }

    async fn broadcast(&self, frame: Bytes) -> usize {
        let mut registry = self.registry.lock().await;
        let mut offered = 0_usize;
        let mut closed = Vec::new();
        for (id, tx) in &registry.clients {
            match tx.try_send(frame.clone()) {
                Ok(()) => offered = offered.saturating_add(1),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(client_id = id, "client queue full, frame dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
            }
        }
        for id in &closed {
            registry.clients.remove(id);
            info!(client_id = id, "stream client pruned");
        }
        self.frames_sent.fetch_add(1, Ordering::AcqRel);
        if !closed.is_empty() && registry.clients.is_empty() {
            registry.idle();
        }
        offered
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use novabridge_host::MemoryEditor;

    use super::*;
    use crate::config::BridgeConfig;

    fn hub() -> Arc<StreamHub> {
        let session = EditorSession::new(
            Box::new(MemoryEditor::new("/tmp/StreamTest")),
            &BridgeConfig::default(),
        );
        let editor = Arc::new(EditorThread::spawn(session).unwrap());
        let config = StreamConfig {
            fps: 10,
            width: 64,
            height: 64,
            quality: 50,
        };
        StreamHub::new(editor, config, 30011)
    }

    /// Register a client without starting the timer, so only explicit
    /// ticks run.
    async fn attach(hub: &StreamHub, id: u64) -> mpsc::Receiver<Bytes> {
        let (tx, rx) = mpsc::channel(CLIENT_QUEUE_FRAMES);
        let mut registry = hub.registry.lock().await;
        registry.clients.insert(id, tx);
        registry.streaming = true;
        rx
    }

    #[test]
    fn gate_allows_one_frame_per_interval() {
        let mut gate = FrameGate::default();
        let start = Instant::now();
        let allowed = (0..20)
            .filter(|i| gate.ready(start + Duration::from_millis(i * 30), 10))
            .count();
        // 0, 120, 240, 360, 480 ms
        assert_eq!(allowed, 5);
    }

    #[test]
    fn update_validates_every_field_first() {
        let current = StreamConfig::default();
        let bad = StreamConfigUpdate {
            fps: Some(5),
            width: Some(4000),
            ..StreamConfigUpdate::default()
        };
        assert_eq!(
            bad.apply(current),
            Err(StreamConfigError::OutOfRange {
                field: "width",
                min: 64,
                max: 1920
            })
        );
        let good = StreamConfigUpdate {
            fps: Some(5),
            width: Some(320),
            height: Some(240),
            quality: None,
        };
        let applied = good.apply(current).unwrap();
        assert_eq!((applied.fps, applied.width, applied.height), (5, 320, 240));
        assert_eq!(applied.quality, 50);
    }

    #[test]
    fn defaults_are_clamped() {
        let config = StreamConfig::from_defaults(&StreamDefaults {
            fps: 120,
            width: 10,
            height: 5000,
            quality: 0,
        });
        assert_eq!((config.fps, config.width, config.height, config.quality), (30, 64, 1080, 1));
    }

    #[tokio::test]
    async fn first_client_starts_and_last_client_stops_timer() {
        let hub = hub();
        assert!(!hub.timer_running().await);

        let (a, _rx_a) = hub.connect().await;
        assert!(hub.timer_running().await);
        assert!(hub.status().await.streaming);

        let (b, _rx_b) = hub.connect().await;
        assert!(hub.timer_running().await);

        hub.disconnect(a).await;
        assert!(hub.timer_running().await);
        hub.disconnect(b).await;
        assert!(!hub.timer_running().await);
        assert!(!hub.status().await.streaming);
    }

    /// Park the editor thread so the next capture waits behind it.
    fn busy_editor(hub: &StreamHub, millis: u64) {
        hub.editor
            .submit(move |_| std::thread::sleep(Duration::from_millis(millis)))
            .unwrap();
    }

    async fn next_frame(rx: &mut mpsc::Receiver<Bytes>) -> Bytes {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn disconnect_mid_capture_then_reconnect_gets_frames() {
        let hub = hub();
        busy_editor(&hub, 300);
        let (a, _rx_a) = hub.connect().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        hub.disconnect(a).await;
        assert!(!hub.timer_running().await);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!hub.tick_in_flight.load(Ordering::Acquire));

        let (_b, mut rx_b) = hub.connect().await;
        let frame = next_frame(&mut rx_b).await;
        assert!(frame.starts_with(&[0xFF, 0xD8]));
    }

    #[tokio::test]
    async fn stop_mid_capture_then_start_resumes_frames() {
        let hub = hub();
        busy_editor(&hub, 300);
        let (_a, mut rx) = hub.connect().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!hub.stop().await.streaming);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!hub.tick_in_flight.load(Ordering::Acquire));

        assert!(hub.start().await.streaming);
        let frame = next_frame(&mut rx).await;
        assert!(frame.starts_with(&[0xFF, 0xD8]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_last_out_first_in_keeps_timer() {
        let hub = hub();
        for _ in 0..200 {
            let (a, _rx_a) = hub.connect().await;
            let leaving = tokio::spawn({
                let hub = Arc::clone(&hub);
                async move { hub.disconnect(a).await }
            });
            let joining = tokio::spawn({
                let hub = Arc::clone(&hub);
                async move { hub.connect().await }
            });
            leaving.await.unwrap();
            let (b, _rx_b) = joining.await.unwrap();

            assert!(hub.timer_running().await);
            assert!(hub.status().await.streaming);
            hub.disconnect(b).await;
            assert!(!hub.timer_running().await);
        }
    }

    #[tokio::test]
    async fn tick_without_clients_is_idle() {
        let hub = hub();
        hub.start().await;
        assert_eq!(hub.tick(Instant::now()).await, TickOutcome::Idle);
        assert!(!hub.status().await.streaming);
    }

    #[tokio::test]
    async fn tick_broadcasts_jpeg_and_respects_gate() {
        let hub = hub();
        let mut rx = attach(&hub, 1).await;

        let start = Instant::now();
        assert_eq!(hub.tick(start).await, TickOutcome::Broadcast(1));
        assert_eq!(
            hub.tick(start + Duration::from_millis(50)).await,
            TickOutcome::Throttled
        );
        let frame = rx.recv().await.unwrap();
        assert!(frame.starts_with(&[0xFF, 0xD8]));
        assert_eq!(hub.status().await.frames_sent, 1);
    }

    #[tokio::test]
    async fn full_queue_drops_and_closed_queue_prunes() {
        let hub = hub();
        let _rx_keep = attach(&hub, 1).await;
        let rx_gone = attach(&hub, 2).await;
        drop(rx_gone);

        let start = Instant::now();
        for i in 0..4 {
            hub.tick(start + Duration::from_millis(i * 200)).await;
        }
        assert_eq!(hub.client_count().await, 1);
        assert_eq!(hub.status().await.frames_sent, 4);
    }

    #[tokio::test]
    async fn configure_rejects_out_of_range() {
        let hub = hub();
        let err = hub
            .configure(StreamConfigUpdate {
                quality: Some(0),
                ..StreamConfigUpdate::default()
            })
            .await;
        assert!(err.is_err());
        assert_eq!(hub.config().await.quality, 50);
    }
}
