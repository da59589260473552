//! Preview scheduler: turns bursts of UI state changes into a minimal,
//! race-free sequence of preview renders.
//!
//! # Model
//!
//! One scheduler thread consumes [`PreviewEvent`]s from a channel and is the
//! only writer of [`DisplayState`]. Each state change restarts a debounce
//! timer; when it fires (and the player is paused with a known position) a
//! [`RenderRequest`] snapshot is handed to the worker pool together with a
//! fresh [`CancelToken`].
//!
//! ```text
//! Idle/PendingDebounce/Rendering --change--> PendingDebounce
//! PendingDebounce --fire, playing or no time--> (no render)
//! PendingDebounce --fire--> Rendering   (cancels previous request's token)
//! Rendering --ok, still latest--> Idle   (frame published, error cleared)
//! Rendering --err, still latest--> Error (frame cleared, diagnostic published)
//! superseded completions --> discarded
//! ```
//!
//! Cancellation is cooperative: a running render tool is never killed, its
//! result is simply ignored. Starting playback clears the overlay at once
//! and suppresses rendering until paused again.

use crossbeam_channel::{Receiver, Sender, select, unbounded};
use log::{debug, error, info, trace, warn};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Instant;

use crate::core::cache_dir::CacheDir;
use crate::core::cancel::CancelToken;
use crate::core::debounce::{DEFAULT_DEBOUNCE_MS, Debouncer};
use crate::core::error::{PreviewError, PreviewResult};
use crate::core::events::{DisplayState, PreviewEvent, PreviewUpdate, SchedulerPhase};
use crate::core::filters::FilterState;
use crate::core::frame_cache::RawFrameKey;
use crate::core::pipeline::{FrameRenderer, RenderRequest};
use crate::core::source::FrameSource;
use crate::core::workers::Workers;

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub debounce_ms: u64,
    /// Render jobs that may run at once (superseded ones keep a slot until they finish)
    pub render_workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            render_workers: 2,
        }
    }
}

/// Read-side view shared with the handle.
#[derive(Debug)]
struct Shared {
    display: RwLock<DisplayState>,
    phase: RwLock<SchedulerPhase>,
    renders_started: AtomicU64,
}

/// Handle to the scheduler thread.
pub struct PreviewScheduler {
    events: Sender<PreviewEvent>,
    updates: Receiver<PreviewUpdate>,
    shared: Arc<Shared>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PreviewScheduler {
    /// Start the scheduler thread.
    ///
    /// `cache_dir`, when given, is emptied on every [`PreviewEvent::LoadSource`].
    pub fn spawn(
        renderer: Arc<dyn FrameRenderer>,
        cache_dir: Option<Arc<CacheDir>>,
        config: SchedulerConfig,
    ) -> std::io::Result<Self> {
        let (events_tx, events_rx) = unbounded();
        let (updates_tx, updates_rx) = unbounded();
        let (completions_tx, completions_rx) = unbounded();

        let shared = Arc::new(Shared {
            display: RwLock::new(DisplayState::default()),
            phase: RwLock::new(SchedulerPhase::Idle),
            renders_started: AtomicU64::new(0),
        });

        let state = SchedulerLoop {
            renderer,
            cache_dir,
            workers: Workers::new(config.render_workers)?,
            debouncer: Debouncer::new(config.debounce_ms),
            source: None,
            generation: 0,
            time: None,
            playing: false,
            filters: FilterState::default(),
            next_id: 0,
            active: None,
            display: DisplayState::default(),
            completions_tx,
            updates_tx,
            shared: Arc::clone(&shared),
        };

        let handle = thread::Builder::new()
            .name("livegrade-scheduler".into())
            .spawn(move || state.run(events_rx, completions_rx))?;

        info!(
            "Preview scheduler started (debounce {}ms, {} render workers)",
            config.debounce_ms, config.render_workers
        );

        Ok(Self {
            events: events_tx,
            updates: updates_rx,
            shared,
            handle: Some(handle),
        })
    }

    pub fn send(&self, event: PreviewEvent) {
        trace!("Preview event: {:?}", event);
        if self.events.send(event).is_err() {
            warn!("Preview scheduler is not running, event dropped");
        }
    }

    pub fn load_source(&self, source: Arc<dyn FrameSource>) {
        self.send(PreviewEvent::LoadSource(source));
    }

    pub fn set_time(&self, time: Option<f64>) {
        self.send(PreviewEvent::SetTime(time));
    }

    pub fn set_playing(&self, playing: bool) {
        self.send(PreviewEvent::SetPlaying(playing));
    }

    pub fn set_filters(&self, filters: FilterState) {
        self.send(PreviewEvent::SetFilters(filters));
    }

    /// Display updates, in publication order.
    pub fn updates(&self) -> &Receiver<PreviewUpdate> {
        &self.updates
    }

    pub fn display(&self) -> DisplayState {
        self.shared
            .display
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn phase(&self) -> SchedulerPhase {
        *self.shared.phase.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Render requests started since spawn.
    pub fn renders_started(&self) -> u64 {
        self.shared.renders_started.load(Ordering::Relaxed)
    }

    /// Stop the scheduler and wait for running render jobs to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.events.send(PreviewEvent::Shutdown);
        if handle.join().is_err() {
            warn!("Preview scheduler thread panicked");
        }
    }
}

impl Drop for PreviewScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Request whose result may still be published.
struct ActiveRequest {
    id: u64,
    token: CancelToken,
    started: Instant,
}

/// Result of a render job, tagged with its request id.
struct Completion {
    id: u64,
    result: PreviewResult<PathBuf>,
}

/// State owned by the scheduler thread.
struct SchedulerLoop {
    renderer: Arc<dyn FrameRenderer>,
    cache_dir: Option<Arc<CacheDir>>,
    workers: Workers,
    debouncer: Debouncer,

    source: Option<Arc<dyn FrameSource>>,
    /// Bumped on every source load; part of the raw frame key
    generation: u64,
    time: Option<f64>,
    playing: bool,
    filters: FilterState,

    next_id: u64,
    active: Option<ActiveRequest>,
    display: DisplayState,

    completions_tx: Sender<Completion>,
    updates_tx: Sender<PreviewUpdate>,
    shared: Arc<Shared>,
}

impl SchedulerLoop {
    fn run(mut self, events: Receiver<PreviewEvent>, completions: Receiver<Completion>) {
        loop {
            let timer = match self.debouncer.deadline() {
                Some(deadline) => crossbeam_channel::at(deadline),
                None => crossbeam_channel::never(),
            };

            select! {
                recv(events) -> msg => match msg {
                    Ok(PreviewEvent::Shutdown) | Err(_) => break,
                    Ok(event) => self.handle_event(event),
                },
                recv(completions) -> msg => {
                    if let Ok(completion) = msg {
                        self.handle_completion(completion);
                    }
                },
                recv(timer) -> _ => {
                    if self.debouncer.tick() {
                        self.fire();
                    }
                },
            }

            self.publish_phase();
        }

        self.supersede_active();
        debug!("Preview scheduler stopped");
    }

    fn handle_event(&mut self, event: PreviewEvent) {
        match event {
            PreviewEvent::LoadSource(source) => {
                info!("Loading source {}", source.describe());
                self.supersede_active();
                self.generation += 1;
                self.source = Some(source);
                self.time = None;
                self.playing = false;
                if let Some(dir) = &self.cache_dir {
                    if let Err(e) = dir.empty() {
                        warn!("Failed to empty cache directory: {}", e);
                    }
                }
                self.display.error = None;
                self.clear_frame();
                self.debouncer.schedule();
            }
            PreviewEvent::SetTime(time) => {
                if time != self.time {
                    self.time = time;
                    self.debouncer.schedule();
                }
            }
            PreviewEvent::SetPlaying(playing) => {
                if playing {
                    // A render finishing now must not draw over live playback
                    self.supersede_active();
                    self.clear_frame();
                }
                if playing != self.playing {
                    if !playing {
                        self.clear_frame();
                    }
                    self.playing = playing;
                    self.debouncer.schedule();
                }
            }
            PreviewEvent::SetFilters(filters) => {
                if filters != self.filters {
                    self.filters = filters;
                    self.debouncer.schedule();
                }
            }
            PreviewEvent::Shutdown => {}
        }
    }

    /// Debounce elapsed: start a render for the current snapshot if eligible.
    fn fire(&mut self) {
        if self.playing {
            trace!("Debounce fired while playing, no render");
            return;
        }
        let (Some(time), Some(source)) = (self.time, self.source.clone()) else {
            trace!("Debounce fired without position or source, no render");
            return;
        };

        self.supersede_active();

        self.next_id += 1;
        let request = RenderRequest {
            id: self.next_id,
            key: RawFrameKey::new(self.generation, time),
            timestamp: time,
            filters: self.filters.clone(),
            source,
        };
        let token = CancelToken::new();
        self.active = Some(ActiveRequest {
            id: request.id,
            token: token.clone(),
            started: Instant::now(),
        });
        self.shared.renders_started.fetch_add(1, Ordering::Relaxed);
        debug!("Starting render request {} at {:.3}s", request.id, time);

        let renderer = Arc::clone(&self.renderer);
        let completions = self.completions_tx.clone();
        let job_token = token.clone();
        self.workers.execute_cancellable(token, move || {
            let rendered = std::panic::catch_unwind(AssertUnwindSafe(|| {
                renderer.render(&request, &job_token)
            }));
            let result = match rendered {
                Ok(Ok(Some(path))) => Ok(path),
                Ok(Ok(None)) => return,
                Ok(Err(e)) => Err(e),
                Err(payload) => {
                    error!("Render request {} panicked", request.id);
                    Err(PreviewError::from_panic(payload.as_ref()))
                }
            };
            let _ = completions.send(Completion {
                id: request.id,
                result,
            });
        });
    }

    fn handle_completion(&mut self, completion: Completion) {
        let is_latest = self
            .active
            .as_ref()
            .is_some_and(|a| a.id == completion.id && !a.token.is_cancelled());
        if !is_latest {
            debug!("Discarding result of superseded request {}", completion.id);
            return;
        }
        if let Some(active) = self.active.take() {
            debug!(
                "Request {} finished in {} ms",
                active.id,
                active.started.elapsed().as_millis()
            );
        }

        match completion.result {
            Ok(path) => {
                self.display.frame = Some(path.clone());
                self.display.error = None;
                self.publish(PreviewUpdate::FrameReady(path));
            }
            Err(e) => {
                warn!("Preview render failed: {}", e);
                let diagnostic = e.diagnostic();
                self.display.frame = None;
                self.display.error = Some(diagnostic.clone());
                self.publish(PreviewUpdate::Error(diagnostic));
            }
        }
    }

    fn supersede_active(&mut self) {
        if let Some(prev) = self.active.take() {
            prev.token.cancel();
            debug!("Request {} superseded", prev.id);
        }
    }

    fn clear_frame(&mut self) {
        if self.display.frame.take().is_some() {
            self.publish(PreviewUpdate::FrameCleared);
        } else {
            self.sync_display();
        }
    }

    fn publish(&self, update: PreviewUpdate) {
        self.sync_display();
        // Nobody listening is fine: the shared display state is authoritative
        let _ = self.updates_tx.send(update);
    }

    fn sync_display(&self) {
        *self.shared.display.write().unwrap_or_else(|e| e.into_inner()) = self.display.clone();
        self.publish_phase();
    }

    fn phase(&self) -> SchedulerPhase {
        if self.debouncer.is_pending() {
            SchedulerPhase::PendingDebounce
        } else if self.active.is_some() {
            SchedulerPhase::Rendering
        } else if self.display.error.is_some() {
            SchedulerPhase::Error
        } else {
            SchedulerPhase::Idle
        }
    }

    fn publish_phase(&self) {
        *self.shared.phase.write().unwrap_or_else(|e| e.into_inner()) = self.phase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{RecvTimeoutError, bounded};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    struct NullSource;

    impl FrameSource for NullSource {
        fn capture(&self, _timestamp: f64) -> PreviewResult<Vec<u8>> {
            Ok(vec![0xFF])
        }
    }

    /// Renderer that records requests, can hold a timestamp until released,
    /// and can fail or panic for chosen timestamps.
    #[derive(Default)]
    struct FakeRenderer {
        requests: Mutex<Vec<RenderRequest>>,
        gates: Mutex<HashMap<i64, Receiver<()>>>,
        failing: Mutex<Vec<i64>>,
        panicking: Mutex<Vec<i64>>,
        started: Mutex<Option<Sender<u64>>>,
    }

    impl FakeRenderer {
        fn gate(&self, timestamp: f64) -> Sender<()> {
            let (tx, rx) = bounded(1);
            self.gates.lock().unwrap().insert(millis(timestamp), rx);
            tx
        }

        fn fail_at(&self, timestamp: f64) {
            self.failing.lock().unwrap().push(millis(timestamp));
        }

        fn panic_at(&self, timestamp: f64) {
            self.panicking.lock().unwrap().push(millis(timestamp));
        }

        fn notify_start(&self) -> Receiver<u64> {
            let (tx, rx) = unbounded();
            *self.started.lock().unwrap() = Some(tx);
            rx
        }

        fn rendered_millis(&self) -> Vec<i64> {
            self.requests.lock().unwrap().iter().map(|r| r.key.millis).collect()
        }
    }

    fn millis(t: f64) -> i64 {
        (t * 1000.0).round() as i64
    }

    fn frame_path(t: f64) -> PathBuf {
        PathBuf::from(format!("/filtered/{}.jpeg", millis(t)))
    }

    impl FrameRenderer for FakeRenderer {
        fn render(&self, request: &RenderRequest, _token: &CancelToken) -> PreviewResult<Option<PathBuf>> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(tx) = self.started.lock().unwrap().as_ref() {
                let _ = tx.send(request.id);
            }
            let gate = self.gates.lock().unwrap().remove(&request.key.millis);
            if let Some(gate) = gate {
                let _ = gate.recv_timeout(WAIT);
            }
            let panics = self.panicking.lock().unwrap().contains(&request.key.millis);
            if panics {
                panic!("renderer crashed at {}", request.key.millis);
            }
            if self.failing.lock().unwrap().contains(&request.key.millis) {
                return Err(PreviewError::process_failed(
                    Some(1),
                    format!("boom at {}", request.key.millis),
                ));
            }
            Ok(Some(frame_path(request.timestamp)))
        }
    }

    fn spawn(renderer: &Arc<FakeRenderer>, debounce_ms: u64) -> PreviewScheduler {
        let renderer: Arc<dyn FrameRenderer> = Arc::clone(renderer) as Arc<dyn FrameRenderer>;
        let scheduler = PreviewScheduler::spawn(
            renderer,
            None,
            SchedulerConfig {
                debounce_ms,
                render_workers: 4,
            },
        )
        .unwrap();
        scheduler.load_source(Arc::new(NullSource));
        scheduler
    }

    fn next_update(scheduler: &PreviewScheduler) -> PreviewUpdate {
        scheduler.updates().recv_timeout(WAIT).expect("update expected")
    }

    fn assert_quiet(scheduler: &PreviewScheduler, dur: Duration) {
        match scheduler.updates().recv_timeout(dur) {
            Err(RecvTimeoutError::Timeout) => {}
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[test]
    fn test_burst_coalesces_into_single_render() {
        let renderer = Arc::new(FakeRenderer::default());
        let scheduler = spawn(&renderer, 100);

        for i in 0..20 {
            scheduler.set_time(Some(i as f64 * 0.1));
        }
        let mut filters = FilterState::default();
        filters.set_custom_expression("negate");
        scheduler.set_filters(filters);

        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(1.9)));
        assert_quiet(&scheduler, Duration::from_millis(250));
        assert_eq!(scheduler.renders_started(), 1);
        assert_eq!(renderer.rendered_millis(), vec![1900]);
        let requests = renderer.requests.lock().unwrap();
        assert_eq!(requests[0].filters.custom_expression(), "negate");
        assert_eq!(requests[0].key.generation, 1);
    }

    #[test]
    fn test_superseded_success_is_not_published() {
        let renderer = Arc::new(FakeRenderer::default());
        let release_a = renderer.gate(1.0);
        let started = renderer.notify_start();
        let scheduler = spawn(&renderer, 20);

        scheduler.set_time(Some(1.0));
        let a = started.recv_timeout(WAIT).unwrap();

        scheduler.set_time(Some(2.0));
        let b = started.recv_timeout(WAIT).unwrap();
        assert!(b > a);
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(2.0)));

        // A completes after B
        release_a.send(()).unwrap();
        assert_quiet(&scheduler, Duration::from_millis(200));
        assert_eq!(scheduler.display().frame, Some(frame_path(2.0)));
        assert_eq!(scheduler.phase(), SchedulerPhase::Idle);
    }

    #[test]
    fn test_superseded_error_is_discarded() {
        let renderer = Arc::new(FakeRenderer::default());
        let release_a = renderer.gate(1.0);
        renderer.fail_at(1.0);
        let started = renderer.notify_start();
        let scheduler = spawn(&renderer, 20);

        scheduler.set_time(Some(1.0));
        started.recv_timeout(WAIT).unwrap();
        scheduler.set_time(Some(2.0));
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(2.0)));

        release_a.send(()).unwrap();
        assert_quiet(&scheduler, Duration::from_millis(200));
        assert_eq!(scheduler.display().error, None);
    }

    #[test]
    fn test_latest_error_published_then_cleared() {
        let renderer = Arc::new(FakeRenderer::default());
        renderer.fail_at(3.0);
        let scheduler = spawn(&renderer, 20);

        scheduler.set_time(Some(1.0));
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(1.0)));

        scheduler.set_time(Some(3.0));
        assert_eq!(next_update(&scheduler), PreviewUpdate::Error("boom at 3000".into()));
        let display = scheduler.display();
        assert_eq!(display.frame, None);
        assert_eq!(display.error.as_deref(), Some("boom at 3000"));
        assert_eq!(scheduler.phase(), SchedulerPhase::Error);

        scheduler.set_time(Some(4.0));
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(4.0)));
        assert_eq!(scheduler.display().error, None);
    }

    #[test]
    fn test_playing_clears_frame_and_suppresses_renders() {
        let renderer = Arc::new(FakeRenderer::default());
        let scheduler = spawn(&renderer, 20);

        scheduler.set_time(Some(1.0));
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(1.0)));

        scheduler.set_playing(true);
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameCleared);
        assert_eq!(scheduler.display().frame, None);

        // Playback moves the playhead; nothing renders
        scheduler.set_time(Some(1.5));
        scheduler.set_time(Some(2.0));
        assert_quiet(&scheduler, Duration::from_millis(150));
        assert_eq!(scheduler.renders_started(), 1);

        scheduler.set_playing(false);
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(2.0)));
        assert_eq!(scheduler.renders_started(), 2);
    }

    #[test]
    fn test_redundant_pause_keeps_frame() {
        let renderer = Arc::new(FakeRenderer::default());
        let scheduler = spawn(&renderer, 20);

        scheduler.set_time(Some(1.0));
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(1.0)));

        // Already paused: nothing changes, nothing re-renders
        scheduler.set_playing(false);
        assert_quiet(&scheduler, Duration::from_millis(150));
        assert_eq!(scheduler.display().frame, Some(frame_path(1.0)));
        assert_eq!(scheduler.renders_started(), 1);
    }

    #[test]
    fn test_repeated_play_keeps_overlay_hidden() {
        let renderer = Arc::new(FakeRenderer::default());
        let scheduler = spawn(&renderer, 20);

        scheduler.set_time(Some(1.0));
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(1.0)));
        scheduler.set_playing(true);
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameCleared);
        scheduler.set_playing(true);
        assert_quiet(&scheduler, Duration::from_millis(150));
        assert_eq!(scheduler.display().frame, None);
        assert_eq!(scheduler.renders_started(), 1);
    }

    #[test]
    fn test_panicking_render_publishes_error_and_recovers() {
        let renderer = Arc::new(FakeRenderer::default());
        renderer.panic_at(2.0);
        let scheduler = spawn(&renderer, 20);

        scheduler.set_time(Some(2.0));
        match next_update(&scheduler) {
            PreviewUpdate::Error(text) => assert!(text.contains("renderer crashed at 2000"), "{text}"),
            other => panic!("unexpected update: {other:?}"),
        }
        assert_eq!(scheduler.phase(), SchedulerPhase::Error);

        scheduler.set_time(Some(3.0));
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(3.0)));
        assert_eq!(scheduler.phase(), SchedulerPhase::Idle);
    }

    #[test]
    fn test_play_during_render_discards_result() {
        let renderer = Arc::new(FakeRenderer::default());
        let release = renderer.gate(1.0);
        let started = renderer.notify_start();
        let scheduler = spawn(&renderer, 20);

        scheduler.set_time(Some(1.0));
        started.recv_timeout(WAIT).unwrap();
        scheduler.set_playing(true);
        release.send(()).unwrap();

        assert_quiet(&scheduler, Duration::from_millis(200));
        assert_eq!(scheduler.display(), DisplayState::default());
    }

    #[test]
    fn test_no_render_without_position() {
        let renderer = Arc::new(FakeRenderer::default());
        let scheduler = spawn(&renderer, 20);

        let mut filters = FilterState::default();
        filters.set_lut3d_path("/luts/a.cube");
        scheduler.set_filters(filters);

        assert_quiet(&scheduler, Duration::from_millis(150));
        assert_eq!(scheduler.renders_started(), 0);
        assert_eq!(scheduler.phase(), SchedulerPhase::Idle);
    }

    #[test]
    fn test_unchanged_state_does_not_rerender() {
        let renderer = Arc::new(FakeRenderer::default());
        let scheduler = spawn(&renderer, 20);

        scheduler.set_time(Some(1.0));
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(1.0)));
        scheduler.set_time(Some(1.0));
        scheduler.set_filters(FilterState::default());
        assert_quiet(&scheduler, Duration::from_millis(150));
        assert_eq!(scheduler.renders_started(), 1);
    }

    #[test]
    fn test_load_source_resets_state_and_empties_cache() {
        let renderer = Arc::new(FakeRenderer::default());
        let cache_dir = Arc::new(CacheDir::create(None).unwrap());
        let stale = cache_dir.join("frame-raw-1-1000.jpeg");
        std::fs::write(&stale, b"old").unwrap();

        let scheduler = PreviewScheduler::spawn(
            Arc::clone(&renderer) as Arc<dyn FrameRenderer>,
            Some(Arc::clone(&cache_dir)),
            SchedulerConfig {
                debounce_ms: 20,
                render_workers: 2,
            },
        )
        .unwrap();

        scheduler.load_source(Arc::new(NullSource));
        scheduler.set_time(Some(1.0));
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(1.0)));
        assert!(!stale.exists());

        scheduler.load_source(Arc::new(NullSource));
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameCleared);

        // Position is unknown after a load until the host reports one
        assert_quiet(&scheduler, Duration::from_millis(100));
        scheduler.set_time(Some(1.0));
        assert_eq!(next_update(&scheduler), PreviewUpdate::FrameReady(frame_path(1.0)));

        let generations: Vec<u64> = renderer
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.key.generation)
            .collect();
        assert_eq!(generations, vec![1, 2]);
    }

    #[test]
    fn test_shutdown_joins() {
        let renderer = Arc::new(FakeRenderer::default());
        let scheduler = spawn(&renderer, 20);
        scheduler.shutdown();
    }
}
