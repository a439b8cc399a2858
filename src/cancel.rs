//! Cancellable waits for hold operations and inter-click sleeps
//!
//! A `HoldCanceller` is shared between the session controller (which requests
//! cancellation) and the scheduler worker (which waits on it). Both the hold
//! wait and the inter-click sleep block on the same signal, so stop latency is
//! bounded by whichever wait is in progress, never by a full uninterruptible
//! sleep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Shared cancellation primitive: a coarse flag plus a waitable signal
///
/// The flag is cheap to poll at cycle boundaries; the signal unblocks a
/// bounded wait immediately. Any caller that presses a button before waiting
/// must release it on both exit branches of the wait.
pub struct HoldCanceller {
    requested: AtomicBool,
    signal: Mutex<bool>,
    wakeup: Condvar,
}

impl HoldCanceller {
    pub fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            signal: Mutex::new(false),
            wakeup: Condvar::new(),
        }
    }

    /// Clear the requested flag and reset the signal
    ///
    /// Called exactly once per session start, so a stale request from a prior
    /// run can never pre-cancel the new run's first wait.
    pub fn arm(&self) {
        let mut signalled = self.signal.lock().unwrap();
        self.requested.store(false, Ordering::SeqCst);
        *signalled = false;
    }

    /// Request cancellation and wake any in-progress wait
    ///
    /// Idempotent; callable from any thread.
    pub fn request_cancel(&self) {
        let mut signalled = self.signal.lock().unwrap();
        self.requested.store(true, Ordering::SeqCst);
        *signalled = true;
        self.wakeup.notify_all();
    }

    /// Whether cancellation has been requested and not yet consumed
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Atomically read and clear the requested flag, resetting the signal
    ///
    /// Called at the top of each scheduler cycle. Flag and signal change under
    /// the signal lock, so a concurrent `request_cancel` is either observed
    /// here or survives intact for the next check.
    pub fn consume_if_requested(&self) -> bool {
        let mut signalled = self.signal.lock().unwrap();
        if self.requested.swap(false, Ordering::SeqCst) {
            *signalled = false;
            true
        } else {
            false
        }
    }

    /// Block for up to `duration`, or until cancellation is signalled
    ///
    /// Returns `true` if the wait ended early because of cancellation
    /// (including a signal raised before the wait began).
    pub fn wait_or_cancelled(&self, duration: Duration) -> bool {
        let signalled = self.signal.lock().unwrap();
        let (signalled, _timeout) = self
            .wakeup
            .wait_timeout_while(signalled, duration, |cancelled| !*cancelled)
            .unwrap();
        *signalled
    }
}

impl Default for HoldCanceller {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn starts_unrequested() {
        let canceller = HoldCanceller::new();
        assert!(!canceller.is_requested());
        assert!(!canceller.consume_if_requested());
    }

    #[test]
    fn request_is_consumed_exactly_once() {
        let canceller = HoldCanceller::new();
        canceller.request_cancel();
        canceller.request_cancel(); // idempotent

        assert!(canceller.is_requested());
        assert!(canceller.consume_if_requested());
        assert!(!canceller.consume_if_requested());
        assert!(!canceller.is_requested());
    }

    #[test]
    fn arm_clears_a_pending_request() {
        let canceller = HoldCanceller::new();
        canceller.request_cancel();
        canceller.arm();

        assert!(!canceller.is_requested());
        // Signal was reset too: a fresh wait runs to its timeout
        assert!(!canceller.wait_or_cancelled(Duration::from_millis(10)));
    }

    #[test]
    fn wait_times_out_when_not_cancelled() {
        let canceller = HoldCanceller::new();
        let start = Instant::now();
        let cancelled = canceller.wait_or_cancelled(Duration::from_millis(50));

        assert!(!cancelled);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn pre_cancelled_wait_returns_immediately() {
        let canceller = HoldCanceller::new();
        canceller.request_cancel();

        let start = Instant::now();
        assert!(canceller.wait_or_cancelled(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn cancel_from_another_thread_unblocks_the_wait() {
        let canceller = Arc::new(HoldCanceller::new());
        let remote = Arc::clone(&canceller);

        let waiter = thread::spawn(move || {
            let start = Instant::now();
            let cancelled = remote.wait_or_cancelled(Duration::from_secs(10));
            (cancelled, start.elapsed())
        });

        thread::sleep(Duration::from_millis(30));
        canceller.request_cancel();

        let (cancelled, elapsed) = waiter.join().unwrap();
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn consume_resets_the_signal_for_the_next_wait() {
        let canceller = HoldCanceller::new();
        canceller.request_cancel();
        assert!(canceller.consume_if_requested());

        // The next wait must not be pre-cancelled by the consumed request
        assert!(!canceller.wait_or_cancelled(Duration::from_millis(10)));
    }
}
