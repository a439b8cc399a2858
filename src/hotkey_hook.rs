//! Global hotkey interception using rdev
//!
//! Grabs keyboard events system-wide, so the toggle works no matter which
//! window has focus. A key-down of the watched key is consumed (other
//! listeners never see it) and reported over a channel; everything else passes
//! through untouched. The grab callback runs on an OS-driven thread and must
//! only filter and notify, never do long-running work.

use rdev::{grab, Event, EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use tracing::{debug, error, info};

/// Notifications from the keyboard hook to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    /// The watched key went down; the host should schedule a toggle.
    HotkeyPressed,

    /// The OS declined the grab (e.g. missing input-group membership).
    /// The hotkey is unavailable for this process lifetime; everything else
    /// keeps working.
    InstallFailed(String),
}

/// Handle to the installed keyboard hook
///
/// `install` registers the grab exactly once; `uninstall` consumes the handle,
/// so a double teardown does not compile. Dropping the handle disarms the
/// filter as well, as the guaranteed-cleanup path.
pub struct HotkeyHook {
    hotkey: Arc<Mutex<Key>>,
    armed: Arc<AtomicBool>,
}

impl HotkeyHook {
    /// Install the system-wide keyboard hook watching `initial`
    ///
    /// Hotkey presses and install failures arrive on `sender`.
    pub fn install(initial: Key, sender: mpsc::Sender<HookEvent>) -> Self {
        let hotkey = Arc::new(Mutex::new(initial));
        let armed = Arc::new(AtomicBool::new(true));

        let cb_hotkey = Arc::clone(&hotkey);
        let cb_armed = Arc::clone(&armed);
        let cb_sender = sender.clone();

        thread::spawn(move || {
            info!("Keyboard hook installing");

            let result = grab(move |event| {
                filter_event(event, &cb_hotkey, &cb_armed, &cb_sender)
            });

            if let Err(e) = result {
                error!("Failed to install keyboard hook: {:?}", e);
                let _ = sender.send(HookEvent::InstallFailed(format!("{:?}", e)));
            }
        });

        Self { hotkey, armed }
    }

    /// Replace the watched key; takes effect on the next key event
    pub fn set_hotkey(&self, key: Key) {
        *self.hotkey.lock().unwrap() = key;
        info!("Hotkey set to {:?}", key);
    }

    /// Tear down the hook
    ///
    /// Consumes the handle so this can only happen once. rdev's grab loop has
    /// no teardown call; the disarmed callback passes every event through and
    /// the grab thread ends with the process.
    pub fn uninstall(self) {
        self.disarm();
    }

    fn disarm(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            info!("Keyboard hook disarmed");
        }
    }
}

impl Drop for HotkeyHook {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Decide the fate of one grabbed event
///
/// Returning `None` consumes the event; `Some` lets it propagate.
fn filter_event(
    event: Event,
    hotkey: &Mutex<Key>,
    armed: &AtomicBool,
    sender: &mpsc::Sender<HookEvent>,
) -> Option<Event> {
    if !armed.load(Ordering::SeqCst) {
        return Some(event);
    }

    if let EventType::KeyPress(key) = event.event_type {
        if key == *hotkey.lock().unwrap() {
            debug!("Hotkey {:?} pressed", key);
            if sender.send(HookEvent::HotkeyPressed).is_err() {
                error!("Hotkey notification channel closed");
            }
            return None;
        }
    }

    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn key_event(event_type: EventType) -> Event {
        Event {
            time: SystemTime::now(),
            name: None,
            event_type,
        }
    }

    fn fixture(hotkey: Key) -> (Arc<Mutex<Key>>, Arc<AtomicBool>, mpsc::Sender<HookEvent>, mpsc::Receiver<HookEvent>) {
        let (tx, rx) = mpsc::channel();
        (
            Arc::new(Mutex::new(hotkey)),
            Arc::new(AtomicBool::new(true)),
            tx,
            rx,
        )
    }

    #[test]
    fn hotkey_down_is_consumed_and_reported() {
        let (hotkey, armed, tx, rx) = fixture(Key::F6);

        let verdict = filter_event(key_event(EventType::KeyPress(Key::F6)), &hotkey, &armed, &tx);

        assert!(verdict.is_none());
        assert_eq!(rx.try_recv().unwrap(), HookEvent::HotkeyPressed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn other_keys_pass_through() {
        let (hotkey, armed, tx, rx) = fixture(Key::F6);

        let verdict = filter_event(key_event(EventType::KeyPress(Key::KeyA)), &hotkey, &armed, &tx);

        assert!(verdict.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn hotkey_release_passes_through() {
        let (hotkey, armed, tx, rx) = fixture(Key::F6);

        let verdict =
            filter_event(key_event(EventType::KeyRelease(Key::F6)), &hotkey, &armed, &tx);

        assert!(verdict.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn non_keyboard_events_pass_through() {
        let (hotkey, armed, tx, rx) = fixture(Key::F6);

        let verdict = filter_event(
            key_event(EventType::ButtonPress(rdev::Button::Left)),
            &hotkey,
            &armed,
            &tx,
        );

        assert!(verdict.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn replacing_the_hotkey_moves_the_match() {
        let (hotkey, armed, tx, rx) = fixture(Key::F6);

        *hotkey.lock().unwrap() = Key::F8;

        let old = filter_event(key_event(EventType::KeyPress(Key::F6)), &hotkey, &armed, &tx);
        assert!(old.is_some());
        assert!(rx.try_recv().is_err());

        let new = filter_event(key_event(EventType::KeyPress(Key::F8)), &hotkey, &armed, &tx);
        assert!(new.is_none());
        assert_eq!(rx.try_recv().unwrap(), HookEvent::HotkeyPressed);
    }

    #[test]
    fn disarmed_filter_is_transparent() {
        let (hotkey, armed, tx, rx) = fixture(Key::F6);
        armed.store(false, Ordering::SeqCst);

        let verdict = filter_event(key_event(EventType::KeyPress(Key::F6)), &hotkey, &armed, &tx);

        assert!(verdict.is_some());
        assert!(rx.try_recv().is_err());
    }
}
