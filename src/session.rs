//! Session orchestration: start/stop, statistics, shutdown
//!
//! The controller is the synchronization boundary between the hotkey/host
//! context and the scheduler worker. All starts and stops serialize on one
//! internal lock, so a hotkey toggle and a host action can never race a second
//! worker into existence.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info};

use crate::cancel::HoldCanceller;
use crate::config::ClickConfig;
use crate::input_simulator::InputBackend;
use crate::scheduler::{ClickScheduler, SessionEvent};
use crate::DriftClickError;

/// Observable run state: running flag plus per-run statistics
///
/// Created idle at process start, reset on every session start, never
/// persisted. The click count is monotonic for the lifetime of a single run.
pub struct RunState {
    running: AtomicBool,
    clicks: AtomicU64,
    started_at: Mutex<Option<Instant>>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            clicks: AtomicU64::new(0),
            started_at: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn clicks(&self) -> u64 {
        self.clicks.load(Ordering::SeqCst)
    }

    /// Count the cycle that is about to perform its click
    pub(crate) fn record_cycle(&self) -> u64 {
        self.clicks.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn started_at(&self) -> Option<Instant> {
        *self.started_at.lock().unwrap()
    }

    /// Zero the statistics for a fresh run
    pub(crate) fn reset(&self) {
        self.clicks.store(0, Ordering::SeqCst);
        *self.started_at.lock().unwrap() = Some(Instant::now());
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrates the scheduler, canceller and run state
pub struct SessionController {
    config: Mutex<ClickConfig>,
    state: Arc<RunState>,
    canceller: Arc<HoldCanceller>,
    backend: Arc<Mutex<Box<dyn InputBackend>>>,
    events: Sender<SessionEvent>,
    // Each worker gets its own alive flag; a restart can never resurrect a
    // draining worker through shared state.
    worker: Mutex<Option<(Arc<AtomicBool>, JoinHandle<()>)>>,
}

impl SessionController {
    pub fn new(
        config: ClickConfig,
        backend: Box<dyn InputBackend>,
        events: Sender<SessionEvent>,
    ) -> Self {
        Self {
            config: Mutex::new(config),
            state: Arc::new(RunState::new()),
            canceller: Arc::new(HoldCanceller::new()),
            backend: Arc::new(Mutex::new(backend)),
            events,
            worker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> Arc<RunState> {
        Arc::clone(&self.state)
    }

    pub fn config(&self) -> ClickConfig {
        self.config.lock().unwrap().clone()
    }

    /// Replace the configuration for the next run
    ///
    /// Rejected while a session is running; the per-run snapshot stays frozen.
    pub fn update_config(&self, config: ClickConfig) -> Result<(), DriftClickError> {
        let _slot = self.worker.lock().unwrap();
        if self.state.is_running() {
            return Err(DriftClickError::ConfigLocked);
        }
        config.validate()?;
        *self.config.lock().unwrap() = config;
        Ok(())
    }

    /// Flip between running and idle
    pub fn toggle(&self) {
        if self.state.is_running() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Begin a run; no-op if one is already in progress
    pub fn start(&self) {
        let mut slot = self.worker.lock().unwrap();
        if self.state.is_running() {
            debug!("Start ignored: session already running");
            return;
        }

        // The previous worker (if any) has observed its stop by now; drain it
        // fully so its terminal event precedes this run's start event.
        if let Some((_, handle)) = slot.take() {
            let _ = handle.join();
        }

        let config = self.config.lock().unwrap().clone();
        self.canceller.arm();
        self.state.reset();
        self.state.set_running(true);
        info!("Session started");
        let _ = self.events.send(SessionEvent::RunState { running: true });

        let alive = Arc::new(AtomicBool::new(true));
        let handle = ClickScheduler::new(
            config,
            Arc::clone(&self.backend),
            Arc::clone(&self.canceller),
            Arc::clone(&self.state),
            Arc::clone(&alive),
            self.events.clone(),
        )
        .start();
        *slot = Some((alive, handle));
    }

    /// End a run; no-op if already idle
    ///
    /// Does not block: the worker observes the stop at its next check, and the
    /// cancel signal wakes an in-flight hold or sleep immediately. The worker
    /// releases any held button before it reports idle.
    pub fn stop(&self) {
        let slot = self.worker.lock().unwrap();
        if !self.state.is_running() {
            debug!("Stop ignored: session already idle");
            return;
        }

        self.state.set_running(false);
        if let Some((alive, _)) = slot.as_ref() {
            alive.store(false, Ordering::SeqCst);
        }
        self.canceller.request_cancel();
        info!("Session stopping");
    }

    /// Stop and wait for the worker to finish
    ///
    /// For host shutdown: afterwards no button is held and no worker remains.
    pub fn shutdown(&self) {
        self.stop();
        let mut slot = self.worker.lock().unwrap();
        if let Some((_, handle)) = slot.take() {
            let _ = handle.join();
        }
    }
}
