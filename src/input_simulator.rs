//! Input simulation using ydotool
//!
//! Uses ydotool to send mouse button events via uinput at the kernel level.
//! Works on Wayland by bypassing the display server entirely.
//! Requires ydotoold daemon to be running: sudo systemctl enable --now ydotoold

use std::process::Command;
use std::thread;
use std::time::Duration;
use tracing::debug;

use rand::Rng;

use crate::cancel::HoldCanceller;
use crate::config::MouseButton;
use crate::timing;
use crate::DriftClickError;

/// Get the ydotool socket path
fn get_socket_path() -> String {
    let uid = unsafe { libc::getuid() };
    format!("/run/user/{}/.ydotool_socket", uid)
}

/// Convert a mouse button to its ydotool click code
fn button_code(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "0xC0",
        MouseButton::Right => "0xC1",
        MouseButton::Middle => "0xC2",
    }
}

/// Capability interface for synthetic button events
///
/// `press` and `release` each issue one OS-level event and must not block
/// beyond the OS call itself. Implementations report failures to the caller;
/// the scheduler treats them as non-fatal and never retries.
pub trait InputBackend: Send {
    fn press(&mut self, button: MouseButton) -> Result<(), DriftClickError>;
    fn release(&mut self, button: MouseButton) -> Result<(), DriftClickError>;
}

/// Input backend that sends synthetic button events via ydotool
pub struct YdotoolBackend {
    socket_path: String,
}

impl YdotoolBackend {
    /// Create a new YdotoolBackend
    ///
    /// Requires ydotool to be installed and ydotoold daemon running.
    pub fn new() -> Result<Self, DriftClickError> {
        // Verify ydotool is available
        let output = Command::new("which")
            .arg("ydotool")
            .output()
            .map_err(|e| {
                DriftClickError::InputAccess(format!("Failed to check for ydotool: {}", e))
            })?;

        if !output.status.success() {
            return Err(DriftClickError::InputAccess(
                "ydotool not found. Install it: sudo pacman -S ydotool".to_string(),
            ));
        }

        // Verify ydotoold daemon is reachable by doing a quick test
        let test = Command::new("ydotool").args(["click", "--help"]).output();

        if test.is_err() {
            return Err(DriftClickError::InputAccess(
                "ydotoold daemon may not be running. Start it: sudo systemctl enable --now ydotoold"
                    .to_string(),
            ));
        }

        Ok(Self {
            socket_path: get_socket_path(),
        })
    }

    /// Run a ydotool command with the socket path set
    fn run_ydotool(&self, args: &[&str]) -> Result<(), DriftClickError> {
        let args_str = args.join(" ");
        let cmd = format!("YDOTOOL_SOCKET={} ydotool {}", self.socket_path, args_str);

        let output = Command::new("sh")
            .args(["-c", &cmd])
            .output()
            .map_err(|e| DriftClickError::SendEvent(format!("Failed to run ydotool: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DriftClickError::SendEvent(format!(
                "ydotool failed: {}",
                stderr
            )));
        }

        Ok(())
    }
}

impl InputBackend for YdotoolBackend {
    fn press(&mut self, button: MouseButton) -> Result<(), DriftClickError> {
        debug!("Sending {:?} press via ydotool", button);
        self.run_ydotool(&["click", "-D", button_code(button)])
    }

    fn release(&mut self, button: MouseButton) -> Result<(), DriftClickError> {
        debug!("Sending {:?} release via ydotool", button);
        self.run_ydotool(&["click", "-U", button_code(button)])
    }
}

/// Tap a button: press, wait a short naturalistic gap, release
///
/// If the press itself fails, the release is skipped (nothing is down).
pub fn tap<R: Rng>(
    backend: &mut dyn InputBackend,
    rng: &mut R,
    button: MouseButton,
) -> Result<(), DriftClickError> {
    backend.press(button)?;
    thread::sleep(timing::tap_gap(rng));
    backend.release(button)
}

/// Hold a button for up to `hold_ms`, releasing early on cancellation
///
/// The release runs on both exit branches of the wait, so a pressed button is
/// never left down. Returns `true` if the hold was cut short by cancellation.
pub fn hold(
    backend: &mut dyn InputBackend,
    canceller: &HoldCanceller,
    button: MouseButton,
    hold_ms: u64,
) -> Result<bool, DriftClickError> {
    backend.press(button)?;

    let cancelled = canceller.wait_or_cancelled(Duration::from_millis(hold_ms));

    // Release unconditionally, whether the wait timed out or was cancelled
    let released = backend.release(button);
    released?;

    Ok(cancelled)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ButtonAction {
        Press(MouseButton),
        Release(MouseButton),
    }

    /// Recording backend for tests; optionally fails on press
    #[derive(Clone, Default)]
    pub struct FakeBackend {
        pub actions: Arc<Mutex<Vec<ButtonAction>>>,
        pub fail_press: bool,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn recorded(&self) -> Vec<ButtonAction> {
            self.actions.lock().unwrap().clone()
        }
    }

    impl InputBackend for FakeBackend {
        fn press(&mut self, button: MouseButton) -> Result<(), DriftClickError> {
            if self.fail_press {
                return Err(DriftClickError::SendEvent("injected failure".to_string()));
            }
            self.actions.lock().unwrap().push(ButtonAction::Press(button));
            Ok(())
        }

        fn release(&mut self, button: MouseButton) -> Result<(), DriftClickError> {
            self.actions
                .lock()
                .unwrap()
                .push(ButtonAction::Release(button));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{ButtonAction, FakeBackend};
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn tap_presses_then_releases_once() {
        let mut backend = FakeBackend::new();
        let mut rng = rand::thread_rng();

        tap(&mut backend, &mut rng, MouseButton::Left).unwrap();

        assert_eq!(
            backend.recorded(),
            vec![
                ButtonAction::Press(MouseButton::Left),
                ButtonAction::Release(MouseButton::Left),
            ]
        );
    }

    #[test]
    fn tap_skips_release_when_press_fails() {
        let mut backend = FakeBackend {
            fail_press: true,
            ..FakeBackend::new()
        };
        let mut rng = rand::thread_rng();

        assert!(tap(&mut backend, &mut rng, MouseButton::Left).is_err());
        assert!(backend.recorded().is_empty());
    }

    #[test]
    fn hold_releases_after_timeout() {
        let mut backend = FakeBackend::new();
        let canceller = HoldCanceller::new();

        let cancelled = hold(&mut backend, &canceller, MouseButton::Right, 30).unwrap();

        assert!(!cancelled);
        assert_eq!(
            backend.recorded(),
            vec![
                ButtonAction::Press(MouseButton::Right),
                ButtonAction::Release(MouseButton::Right),
            ]
        );
    }

    #[test]
    fn cancelled_hold_still_releases_exactly_once() {
        let mut backend = FakeBackend::new();
        let canceller = Arc::new(HoldCanceller::new());

        let remote = Arc::clone(&canceller);
        let trigger = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            remote.request_cancel();
        });

        let start = Instant::now();
        let cancelled = hold(&mut backend, &canceller, MouseButton::Left, 10_000).unwrap();
        trigger.join().unwrap();

        assert!(cancelled);
        // Unblocked by the signal, not the 10 s timeout
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(
            backend.recorded(),
            vec![
                ButtonAction::Press(MouseButton::Left),
                ButtonAction::Release(MouseButton::Left),
            ]
        );
    }
}
