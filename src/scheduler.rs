//! The click scheduling loop
//!
//! One worker thread per session, strictly sequential cycles. Each cycle draws
//! fresh randomized timings, reports them to the host, performs the click (tap
//! or cancellable hold), then sleeps on the cancellable wait so a stop request
//! never waits out a full interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use rand::Rng;

use crate::cancel::HoldCanceller;
use crate::config::ClickConfig;
use crate::input_simulator::{self, InputBackend};
use crate::session::RunState;
use crate::timing;
use crate::DriftClickError;

/// Status notifications from the core to the host
///
/// Any host (CLI, UI, test harness) can subscribe by handing the session a
/// channel sender and draining the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Fired once per cycle, before the action executes, so the display always
    /// reflects the click about to happen. `clicks` includes that click.
    Cycle {
        interval_ms: u64,
        hold_ms: Option<u64>,
        clicks: u64,
    },

    /// Fired on every start/stop transition, including the terminal transition
    /// after a cancelled run completes its last cycle.
    RunState { running: bool },

    /// A synthetic input call failed; the cycle continues. Never retried.
    InputFault { detail: String },
}

/// The cancellable worker loop behind a running session
pub struct ClickScheduler {
    config: ClickConfig,
    backend: Arc<Mutex<Box<dyn InputBackend>>>,
    canceller: Arc<HoldCanceller>,
    state: Arc<RunState>,
    alive: Arc<AtomicBool>,
    events: Sender<SessionEvent>,
}

impl ClickScheduler {
    pub fn new(
        config: ClickConfig,
        backend: Arc<Mutex<Box<dyn InputBackend>>>,
        canceller: Arc<HoldCanceller>,
        state: Arc<RunState>,
        alive: Arc<AtomicBool>,
        events: Sender<SessionEvent>,
    ) -> Self {
        Self {
            config,
            backend,
            canceller,
            state,
            alive,
            events,
        }
    }

    /// Start the scheduling loop in a background thread
    pub fn start(self) -> thread::JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(self) {
        info!("Click scheduler started");
        let mut rng = rand::thread_rng();

        while self.alive.load(Ordering::SeqCst) {
            // A cancellation left over from a previous hold must not
            // pre-cancel this cycle's waits.
            self.canceller.consume_if_requested();

            let interval_ms = timing::draw_interval(
                &mut rng,
                self.config.base_interval_ms,
                self.config.random_offset_ms,
            );
            let hold_ms = self.config.hold_mode.then(|| {
                timing::draw_hold(
                    &mut rng,
                    self.config.min_hold_ms,
                    self.config.max_extra_hold_ms,
                )
            });

            // Report before acting; the counter includes the click about to
            // happen, even if a stop arrives in between.
            let clicks = self.state.record_cycle();
            let _ = self.events.send(SessionEvent::Cycle {
                interval_ms,
                hold_ms,
                clicks,
            });
            debug!("Cycle {}: interval={}ms hold={:?}", clicks, interval_ms, hold_ms);

            if self.stop_pending() {
                break;
            }

            if let Err(e) = self.dispatch(&mut rng, hold_ms) {
                warn!("Synthetic input failed: {}", e);
                let _ = self.events.send(SessionEvent::InputFault {
                    detail: e.to_string(),
                });
            }

            if self.stop_pending() {
                break;
            }

            self.canceller
                .wait_or_cancelled(Duration::from_millis(interval_ms));
        }

        // Any held button was released inside dispatch before we get here.
        self.state.set_running(false);
        let _ = self.events.send(SessionEvent::RunState { running: false });
        info!("Click scheduler stopped");
    }

    fn stop_pending(&self) -> bool {
        !self.alive.load(Ordering::SeqCst) || self.canceller.is_requested()
    }

    fn dispatch<R: Rng>(&self, rng: &mut R, hold_ms: Option<u64>) -> Result<(), DriftClickError> {
        let mut backend = self.backend.lock().unwrap();
        match hold_ms {
            Some(ms) => {
                input_simulator::hold(backend.as_mut(), &self.canceller, self.config.button, ms)
                    .map(|_| ())
            }
            None => input_simulator::tap(backend.as_mut(), rng, self.config.button),
        }
    }
}
