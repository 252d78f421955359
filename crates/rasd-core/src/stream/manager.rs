// ── Stream manager ──
//
// Owns one slot per camera. A slot lives from `connect` until
// `disconnect`; every slot carries a generation number and a cancellation
// token. Scheduled retries check both before acting, so a retry that
// outlives its slot never touches a newer connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backend::{AttachRequest, MediaBackend, Player};
use super::config::{ReconnectPolicy, StreamConfig, StreamSource};
use super::status::{SlotReport, StatusUpdate, StreamStatus};
use super::transport::{Transport, TransportHint};
use crate::error::{StorageError, StreamError};
use crate::model::CameraId;
use crate::storage::{KeyValueStore, STREAM_CONFIG_KEY};

const STATUS_CHANNEL_CAPACITY: usize = 256;

// ── Slot ─────────────────────────────────────────────────────────────

struct Slot {
    generation: u64,
    url: String,
    hint: TransportHint,
    transport: Transport,
    status: StreamStatus,
    /// Automatic retries since the last successful attach.
    attempts: u32,
    player: Option<Box<dyn Player>>,
    cancel: CancellationToken,
}

// ── StreamManager ────────────────────────────────────────────────────

/// Connects camera slots to their streams and keeps them connected.
///
/// Cheaply cloneable; clones share the same slots.
#[derive(Clone)]
pub struct StreamManager {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn MediaBackend>,
    storage: Arc<dyn KeyValueStore>,
    policy: ReconnectPolicy,
    slots: DashMap<CameraId, Slot>,
    config: Mutex<StreamConfig>,
    status_tx: broadcast::Sender<StatusUpdate>,
    generation: AtomicU64,
}

impl StreamManager {
    pub fn new(backend: Arc<dyn MediaBackend>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_policy(backend, storage, ReconnectPolicy::default())
    }

    /// Build a manager and load the stored stream configuration.
    pub fn with_policy(
        backend: Arc<dyn MediaBackend>,
        storage: Arc<dyn KeyValueStore>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        let manager = Self {
            inner: Arc::new(Inner {
                backend,
                storage,
                policy,
                slots: DashMap::new(),
                config: Mutex::new(StreamConfig::new()),
                status_tx,
                generation: AtomicU64::new(0),
            }),
        };
        manager.load_config();
        manager
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.inner.policy
    }

    /// Subscribe to status changes of every slot.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.inner.status_tx.subscribe()
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Connect `camera_id` to `url`, replacing any existing connection.
    ///
    /// Resolves once the first attempt settles. A failed attempt leaves
    /// the slot in `Error` and schedules automatic retries in the
    /// background.
    pub async fn connect(
        &self,
        camera_id: CameraId,
        url: &str,
        hint: TransportHint,
    ) -> Result<(), StreamError> {
        self.disconnect(&camera_id);

        let url = url.trim();
        if url.is_empty() {
            return Err(StreamError::MissingUrl { camera_id });
        }

        let transport = hint.resolve(url);
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.slots.insert(
            camera_id.clone(),
            Slot {
                generation,
                url: url.to_owned(),
                hint,
                transport,
                status: StreamStatus::Connecting,
                attempts: 0,
                player: None,
                cancel: CancellationToken::new(),
            },
        );
        info!(%camera_id, url, %transport, "connecting stream");

        let result = self.inner.attempt(&camera_id, generation).await;
        if let Err(ref e) = result {
            if !matches!(e, StreamError::Superseded { .. }) {
                Inner::spawn_reconnect(&self.inner, camera_id, generation);
            }
        }
        result
    }

    /// Tear down a slot. Returns `false` if nothing was connected.
    pub fn disconnect(&self, camera_id: &CameraId) -> bool {
        let Some((_, mut slot)) = self.inner.slots.remove(camera_id) else {
            return false;
        };

        slot.cancel.cancel();
        if let Some(mut player) = slot.player.take() {
            if let Err(e) = player.teardown() {
                warn!(%camera_id, error = %e, "player teardown failed");
            }
        }
        self.inner.backend.reset_surface(camera_id);
        info!(%camera_id, "stream disconnected");
        self.inner.emit(camera_id, StreamStatus::Disconnected, None);
        true
    }

    pub fn disconnect_all(&self) -> usize {
        let cameras: Vec<CameraId> = self.inner.slots.iter().map(|r| r.key().clone()).collect();
        cameras.iter().filter(|id| self.disconnect(id)).count()
    }

    /// Connect every configured camera concurrently and wait for all first
    /// attempts to settle. Cameras without a URL are skipped.
    pub async fn connect_all(&self) -> Vec<(CameraId, Result<(), StreamError>)> {
        let sources: Vec<(CameraId, StreamSource)> = self
            .config()
            .into_iter()
            .filter(|(_, source)| !source.url.trim().is_empty())
            .collect();
        info!(count = sources.len(), "connecting all configured streams");

        let attempts = sources.into_iter().map(|(camera_id, source)| {
            let manager = self.clone();
            async move {
                let result = manager
                    .connect(camera_id.clone(), &source.url, source.transport)
                    .await;
                (camera_id, result)
            }
        });
        join_all(attempts).await
    }

    /// Reconnect with a fresh retry budget, reusing the slot's URL or the
    /// configured source.
    pub async fn reconnect(&self, camera_id: &CameraId) -> Result<(), StreamError> {
        let source = self
            .inner
            .slots
            .get(camera_id)
            .map(|slot| StreamSource::new(slot.url.clone(), slot.hint))
            .or_else(|| self.source(camera_id))
            .ok_or_else(|| StreamError::UnknownSlot {
                camera_id: camera_id.clone(),
            })?;
        self.connect(camera_id.clone(), &source.url, source.transport).await
    }

    // ── Status ───────────────────────────────────────────────────────

    pub fn status_of(&self, camera_id: &CameraId) -> StreamStatus {
        self.inner
            .slots
            .get(camera_id)
            .map(|slot| slot.status)
            .unwrap_or_default()
    }

    /// One entry per tracked slot, ordered by camera id.
    pub fn status_report(&self) -> Vec<SlotReport> {
        let mut report: Vec<SlotReport> = self
            .inner
            .slots
            .iter()
            .map(|r| {
                let slot = r.value();
                SlotReport {
                    camera_id: r.key().clone(),
                    transport: slot.transport,
                    url: slot.url.clone(),
                    status: slot.status,
                    is_playing: slot.player.as_ref().is_some_and(|p| p.is_playing()),
                }
            })
            .collect();
        report.sort_by(|a, b| a.camera_id.cmp(&b.camera_id));
        report
    }

    // ── Configuration ────────────────────────────────────────────────

    pub fn config(&self) -> StreamConfig {
        self.inner.lock_config().clone()
    }

    pub fn source(&self, camera_id: &CameraId) -> Option<StreamSource> {
        self.inner.lock_config().get(camera_id).cloned()
    }

    /// Add or replace one camera's source and persist.
    pub fn set_source(&self, camera_id: CameraId, source: StreamSource) {
        self.inner.lock_config().insert(camera_id, source);
        self.inner.persist_config();
    }

    /// Remove one camera's source and persist.
    pub fn remove_source(&self, camera_id: &CameraId) -> Option<StreamSource> {
        let removed = self.inner.lock_config().remove(camera_id);
        if removed.is_some() {
            self.inner.persist_config();
        }
        removed
    }

    /// Replace the whole configuration and persist it.
    pub fn save_config(&self, config: StreamConfig) {
        *self.inner.lock_config() = config;
        self.inner.persist_config();
    }

    /// Reload the configuration from storage. Missing or unreadable data
    /// yields an empty mapping.
    pub fn load_config(&self) -> StreamConfig {
        let config = self.inner.read_config().unwrap_or_else(|e| {
            error!(error = %e, "stored stream configuration unreadable, using empty mapping");
            StreamConfig::new()
        });
        debug!(cameras = config.len(), "stream configuration loaded");
        self.inner.lock_config().clone_from(&config);
        config
    }
}

// ── Attempt and retry machinery ──────────────────────────────────────

impl Inner {
    /// One attach attempt for the slot generation `generation`.
    async fn attempt(&self, camera_id: &CameraId, generation: u64) -> Result<(), StreamError> {
        let superseded = || StreamError::Superseded {
            camera_id: camera_id.clone(),
        };

        let request = {
            let Some(mut slot) = self.slots.get_mut(camera_id) else {
                return Err(superseded());
            };
            if slot.generation != generation {
                return Err(superseded());
            }
            slot.status = StreamStatus::Connecting;
            AttachRequest {
                camera_id: camera_id.clone(),
                url: slot.url.clone(),
                transport: slot.transport,
            }
        };
        self.emit(camera_id, StreamStatus::Connecting, None);

        let outcome = tokio::time::timeout(self.policy.ready_timeout, self.backend.attach(request))
            .await
            .unwrap_or_else(|_elapsed| {
                Err(StreamError::Timeout {
                    camera_id: camera_id.clone(),
                    timeout_secs: self.policy.ready_timeout.as_secs(),
                })
            });

        match outcome {
            Ok(player) => {
                if let Err(mut orphan) = self.install(camera_id, generation, player) {
                    debug!(%camera_id, "attach finished for a replaced slot, tearing down");
                    if let Err(e) = orphan.teardown() {
                        warn!(%camera_id, error = %e, "orphaned player teardown failed");
                    }
                    return Err(superseded());
                }
                info!(%camera_id, "stream connected");
                self.emit(camera_id, StreamStatus::Connected, None);
                Ok(())
            }
            Err(e) => {
                if !self.set_status(camera_id, generation, StreamStatus::Error) {
                    return Err(superseded());
                }
                warn!(%camera_id, error = %e, "stream attempt failed");
                self.emit(camera_id, StreamStatus::Error, Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Store a ready player in its slot, or hand it back if the slot moved on.
    fn install(
        &self,
        camera_id: &CameraId,
        generation: u64,
        player: Box<dyn Player>,
    ) -> Result<(), Box<dyn Player>> {
        match self.slots.get_mut(camera_id) {
            Some(mut slot) if slot.generation == generation => {
                slot.status = StreamStatus::Connected;
                slot.attempts = 0;
                slot.player = Some(player);
                Ok(())
            }
            _ => Err(player),
        }
    }

    fn spawn_reconnect(inner: &Arc<Self>, camera_id: CameraId, generation: u64) {
        let cancel = inner
            .slots
            .get(&camera_id)
            .filter(|slot| slot.generation == generation)
            .map(|slot| slot.cancel.clone());
        let Some(cancel) = cancel else { return };

        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            inner.reconnect_loop(camera_id, generation, cancel).await;
        });
    }

    /// Retry with linear backoff until connected, cancelled, superseded or
    /// out of attempts.
    async fn reconnect_loop(&self, camera_id: CameraId, generation: u64, cancel: CancellationToken) {
        let max = self.policy.max_attempts;

        loop {
            let attempt = match self.slots.get_mut(&camera_id) {
                Some(mut slot) if slot.generation == generation => {
                    slot.attempts += 1;
                    if slot.attempts <= max {
                        slot.status = StreamStatus::Reconnecting {
                            attempt: slot.attempts,
                            max,
                        };
                    }
                    slot.attempts
                }
                _ => return,
            };

            if attempt > max {
                if self.set_status(&camera_id, generation, StreamStatus::Error) {
                    error!(%camera_id, max_attempts = max, "reconnection limit reached, giving up");
                    self.emit(
                        &camera_id,
                        StreamStatus::Error,
                        Some("reconnection limit reached".into()),
                    );
                }
                return;
            }

            let delay = self.policy.delay_for(attempt);
            info!(
                %camera_id,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "waiting before reconnect"
            );
            self.emit(&camera_id, StreamStatus::Reconnecting { attempt, max }, None);

            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }

            match self.attempt(&camera_id, generation).await {
                Ok(()) | Err(StreamError::Superseded { .. }) => return,
                Err(_) => {}
            }
        }
    }

    /// Update the slot status if `generation` still owns it.
    fn set_status(&self, camera_id: &CameraId, generation: u64, status: StreamStatus) -> bool {
        match self.slots.get_mut(camera_id) {
            Some(mut slot) if slot.generation == generation => {
                slot.status = status;
                true
            }
            _ => false,
        }
    }

    fn emit(&self, camera_id: &CameraId, status: StreamStatus, message: Option<String>) {
        // No subscribers is fine.
        let _ = self.status_tx.send(StatusUpdate {
            camera_id: camera_id.clone(),
            status,
            message,
        });
    }

    fn lock_config(&self) -> std::sync::MutexGuard<'_, StreamConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_config(&self) -> Result<StreamConfig, StorageError> {
        match self.storage.get(STREAM_CONFIG_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(StreamConfig::new()),
        }
    }

    fn persist_config(&self) {
        let result = serde_json::to_string(&*self.lock_config())
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set(STREAM_CONFIG_KEY, &json));
        if let Err(e) = result {
            error!(error = %e, "failed to save stream configuration");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    use futures_util::future::BoxFuture;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::storage::MemoryStorage;

    // ── Fake backend ─────────────────────────────────────────────────

    #[derive(Default)]
    struct FakeBackend {
        fail: AtomicBool,
        hang: AtomicBool,
        attach_delay_ms: AtomicU64,
        calls: AtomicUsize,
        resets: AtomicUsize,
        teardowns: Arc<AtomicUsize>,
    }

    impl FakeBackend {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    struct FakePlayer {
        teardowns: Arc<AtomicUsize>,
    }

    impl Player for FakePlayer {
        fn teardown(&mut self) -> Result<(), StreamError> {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn is_playing(&self) -> bool {
            true
        }
    }

    impl MediaBackend for FakeBackend {
        fn attach(
            &self,
            request: AttachRequest,
        ) -> BoxFuture<'static, Result<Box<dyn Player>, StreamError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail.load(Ordering::SeqCst) || request.url.contains("bad");
            let hang = self.hang.load(Ordering::SeqCst);
            let delay = Duration::from_millis(self.attach_delay_ms.load(Ordering::SeqCst));
            let teardowns = Arc::clone(&self.teardowns);
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                if hang {
                    std::future::pending::<()>().await;
                }
                if fail {
                    return Err(StreamError::attach(&request.camera_id, "network error"));
                }
                Ok(Box::new(FakePlayer { teardowns }) as Box<dyn Player>)
            })
        }

        fn reset_surface(&self, _camera_id: &CameraId) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn manager() -> (StreamManager, Arc<FakeBackend>, Arc<MemoryStorage>) {
        let backend = Arc::new(FakeBackend::default());
        let storage = Arc::new(MemoryStorage::new());
        let manager = StreamManager::new(backend.clone(), storage.clone());
        (manager, backend, storage)
    }

    fn cam(id: &str) -> CameraId {
        CameraId::from(id)
    }

    // ── Tests ────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn connect_success_reports_connected() {
        let (manager, backend, _) = manager();
        let mut rx = manager.subscribe();

        manager
            .connect(cam("cam1"), "http://cdn/live/cam1.m3u8", TransportHint::Auto)
            .await
            .unwrap();

        assert_eq!(manager.status_of(&cam("cam1")), StreamStatus::Connected);
        assert_eq!(backend.calls(), 1);
        assert_eq!(rx.recv().await.unwrap().status, StreamStatus::Connecting);
        assert_eq!(rx.recv().await.unwrap().status, StreamStatus::Connected);

        let report = manager.status_report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].transport, Transport::Hls);
        assert!(report[0].is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_url_is_rejected_without_attaching() {
        let (manager, backend, _) = manager();
        let err = manager
            .connect(cam("cam1"), "  ", TransportHint::Auto)
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::MissingUrl { .. }));
        assert_eq!(backend.calls(), 0);
        assert_eq!(manager.status_of(&cam("cam1")), StreamStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_stop_after_five_attempts() {
        let (manager, backend, _) = manager();
        backend.fail.store(true, Ordering::SeqCst);
        let mut rx = manager.subscribe();

        let err = manager
            .connect(cam("cam1"), "http://cdn/cam1.flv", TransportHint::Auto)
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Attach { .. }));

        // 3 + 6 + 9 + 12 + 15 seconds of backoff.
        tokio::time::sleep(Duration::from_secs(46)).await;
        assert_eq!(backend.calls(), 6, "initial attempt plus five retries");
        assert_eq!(manager.status_of(&cam("cam1")), StreamStatus::Error);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(backend.calls(), 6, "no sixth retry");

        let mut reconnecting = Vec::new();
        while let Ok(update) = rx.try_recv() {
            if let StreamStatus::Reconnecting { attempt, max } = update.status {
                assert_eq!(max, 5);
                reconnecting.push(attempt);
            }
        }
        assert_eq!(reconnecting, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_send_a_final_error() {
        let (manager, backend, _) = manager();
        backend.fail.store(true, Ordering::SeqCst);
        let mut rx = manager.subscribe();

        let _ = manager
            .connect(cam("cam1"), "http://cdn/cam1.flv", TransportHint::Auto)
            .await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(backend.calls(), 6);

        let mut last = None;
        while let Ok(update) = rx.try_recv() {
            last = Some(update);
        }
        let last = last.unwrap();
        assert_eq!(last.camera_id, cam("cam1"));
        assert_eq!(last.status, StreamStatus::Error);
        assert_eq!(last.message.as_deref(), Some("reconnection limit reached"));
        assert_eq!(manager.status_of(&cam("cam1")), StreamStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_during_slow_attach_discards_the_player() {
        let (manager, backend, _) = manager();
        backend.attach_delay_ms.store(2_000, Ordering::SeqCst);

        let connecting = manager.clone();
        let handle = tokio::spawn(async move {
            connecting
                .connect(cam("cam1"), "http://cdn/a.m3u8", TransportHint::Auto)
                .await
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(backend.calls(), 1);
        assert!(manager.disconnect(&cam("cam1")));
        assert_eq!(backend.teardowns.load(Ordering::SeqCst), 0);

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err, StreamError::Superseded { camera_id: cam("cam1") });
        assert_eq!(manager.status_of(&cam("cam1")), StreamStatus::Disconnected);
        assert_eq!(backend.teardowns.load(Ordering::SeqCst), 1);
        assert!(manager.status_report().is_empty());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.calls(), 1, "no retry for a discarded attach");
    }

    #[tokio::test(start_paused = true)]
    async fn retry_delays_are_linear() {
        let (manager, backend, _) = manager();
        backend.fail.store(true, Ordering::SeqCst);
        let _ = manager
            .connect(cam("cam1"), "http://cdn/a.m3u8", TransportHint::Auto)
            .await;

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert_eq!(backend.calls(), 1);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.calls(), 2);
        tokio::time::sleep(Duration::from_millis(5_800)).await;
        assert_eq!(backend.calls(), 2);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.calls(), 3);

        manager.disconnect(&cam("cam1"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_attach_times_out() {
        let (manager, backend, _) = manager();
        backend.hang.store(true, Ordering::SeqCst);

        let err = manager
            .connect(cam("cam1"), "http://cdn/a.m3u8", TransportHint::Auto)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StreamError::Timeout {
                camera_id: cam("cam1"),
                timeout_secs: 10
            }
        );
        assert_eq!(manager.status_of(&cam("cam1")), StreamStatus::Error);
        manager.disconnect(&cam("cam1"));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_then_success_resets_attempts() {
        let (manager, backend, _) = manager();
        backend.fail.store(true, Ordering::SeqCst);
        let _ = manager
            .connect(cam("cam1"), "http://cdn/a.m3u8", TransportHint::Auto)
            .await;

        backend.fail.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(backend.calls(), 2);
        assert_eq!(manager.status_of(&cam("cam1")), StreamStatus::Connected);

        let attempts = manager.inner.slots.get(&cam("cam1")).unwrap().attempts;
        assert_eq!(attempts, 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_retry_does_not_clobber_new_connection() {
        let (manager, backend, _) = manager();
        backend.fail.store(true, Ordering::SeqCst);
        let _ = manager
            .connect(cam("cam1"), "http://cdn/old.m3u8", TransportHint::Auto)
            .await;

        backend.fail.store(false, Ordering::SeqCst);
        manager
            .connect(cam("cam1"), "http://cdn/new.mp4", TransportHint::Auto)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.calls(), 2, "old retry never fired");

        let report = manager.status_report();
        assert_eq!(report[0].url, "http://cdn/new.mp4");
        assert_eq!(report[0].transport, Transport::Mp4);
        assert_eq!(report[0].status, StreamStatus::Connected);
        assert_eq!(backend.teardowns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_twice_is_harmless() {
        let (manager, backend, _) = manager();
        manager
            .connect(cam("cam1"), "http://cdn/a.m3u8", TransportHint::Auto)
            .await
            .unwrap();

        assert!(manager.disconnect(&cam("cam1")));
        assert!(!manager.disconnect(&cam("cam1")));
        assert_eq!(manager.status_of(&cam("cam1")), StreamStatus::Disconnected);
        assert_eq!(backend.teardowns.load(Ordering::SeqCst), 1);
        assert_eq!(backend.resets.load(Ordering::SeqCst), 1);
        assert!(manager.status_report().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn connect_all_settles_every_camera() {
        let (manager, backend, _) = manager();
        let mut config = StreamConfig::new();
        config.insert(cam("cam1"), StreamSource::new("http://cdn/1.m3u8", TransportHint::Auto));
        config.insert(cam("cam2"), StreamSource::new("", TransportHint::Auto));
        config.insert(cam("cam3"), StreamSource::new("http://bad/3.flv", TransportHint::Flv));
        manager.save_config(config);

        let results = manager.connect_all().await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|(id, r)| id == &cam("cam1") && r.is_ok()));
        assert!(results.iter().any(|(id, r)| id == &cam("cam3") && r.is_err()));
        assert_eq!(backend.calls(), 2);
        assert_eq!(manager.status_of(&cam("cam3")), StreamStatus::Error);

        assert_eq!(manager.disconnect_all(), 2);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.calls(), 2, "disconnect cancels pending retries");
    }

    #[tokio::test(start_paused = true)]
    async fn manual_reconnect_gets_fresh_budget() {
        let (manager, backend, _) = manager();
        backend.fail.store(true, Ordering::SeqCst);
        let _ = manager
            .connect(cam("cam1"), "http://cdn/a.m3u8", TransportHint::Hls)
            .await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(backend.calls(), 6);

        backend.fail.store(false, Ordering::SeqCst);
        manager.reconnect(&cam("cam1")).await.unwrap();
        assert_eq!(backend.calls(), 7);
        assert_eq!(manager.status_of(&cam("cam1")), StreamStatus::Connected);

        let err = manager.reconnect(&cam("nope")).await.unwrap_err();
        assert!(matches!(err, StreamError::UnknownSlot { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn config_persists_and_tolerates_corruption() {
        let (manager, backend, storage) = manager();
        manager.set_source(cam("cam1"), StreamSource::new("http://a.m3u8", TransportHint::Auto));
        manager.set_source(cam("cam2"), StreamSource::new("http://b.flv", TransportHint::Flv));
        assert!(manager.remove_source(&cam("cam2")).is_some());
        assert!(manager.remove_source(&cam("cam2")).is_none());

        let reloaded = StreamManager::new(backend.clone(), storage.clone());
        assert_eq!(reloaded.config().len(), 1);
        assert_eq!(reloaded.source(&cam("cam1")).unwrap().url, "http://a.m3u8");

        storage.set(STREAM_CONFIG_KEY, "not json").unwrap();
        assert!(reloaded.load_config().is_empty());
        assert!(reloaded.config().is_empty());
    }
}
