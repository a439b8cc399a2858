//! Configuration management for driftclick

use rdev::Key;

use crate::DriftClickError;

/// Mouse button to click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Configuration for the auto-clicker
///
/// A snapshot of this struct is handed to the scheduler on session start and
/// stays frozen for the lifetime of that run.
#[derive(Debug, Clone)]
pub struct ClickConfig {
    /// Base interval between clicks in milliseconds
    pub base_interval_ms: u64,

    /// Symmetric random offset applied to the base interval each cycle
    pub random_offset_ms: u64,

    /// Which mouse button to click
    pub button: MouseButton,

    /// Hold the button down instead of tapping it
    pub hold_mode: bool,

    /// Minimum hold duration in milliseconds (hold mode only)
    pub min_hold_ms: u64,

    /// Maximum random extra hold time in milliseconds (hold mode only)
    pub max_extra_hold_ms: u64,

    /// Key that toggles the session from anywhere
    pub hotkey: Key,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 500,
            random_offset_ms: 100,
            button: MouseButton::Left,
            hold_mode: false,
            min_hold_ms: 200,
            max_extra_hold_ms: 200,
            hotkey: Key::F6,
        }
    }
}

impl ClickConfig {
    /// Create a new ClickConfig with a custom base interval
    pub fn with_interval(mut self, interval_ms: u64) -> Self {
        self.base_interval_ms = interval_ms;
        self
    }

    /// Create a new ClickConfig with a custom random offset
    pub fn with_offset(mut self, offset_ms: u64) -> Self {
        self.random_offset_ms = offset_ms;
        self
    }

    /// Create a new ClickConfig with a custom mouse button
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Enable hold mode with the given duration bounds
    pub fn with_hold(mut self, min_hold_ms: u64, max_extra_hold_ms: u64) -> Self {
        self.hold_mode = true;
        self.min_hold_ms = min_hold_ms;
        self.max_extra_hold_ms = max_extra_hold_ms;
        self
    }

    /// Create a new ClickConfig with a custom hotkey
    pub fn with_hotkey(mut self, hotkey: Key) -> Self {
        self.hotkey = hotkey;
        self
    }

    /// Check the configured bounds
    ///
    /// The base interval and the minimum hold duration must both be at least
    /// 10 ms; the offsets are unconstrained.
    pub fn validate(&self) -> Result<(), DriftClickError> {
        if self.base_interval_ms < 10 {
            return Err(DriftClickError::InvalidConfig(format!(
                "base interval must be at least 10 ms (got {})",
                self.base_interval_ms
            )));
        }
        if self.hold_mode && self.min_hold_ms < 10 {
            return Err(DriftClickError::InvalidConfig(format!(
                "minimum hold duration must be at least 10 ms (got {})",
                self.min_hold_ms
            )));
        }
        Ok(())
    }
}
