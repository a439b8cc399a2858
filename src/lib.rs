//! driftclick - Auto-clicker with randomized timing and a global hotkey toggle
//!
//! This library provides components for:
//! - Input simulation (sending synthetic mouse button events)
//! - Cancellable hold waits with guaranteed button release
//! - The randomized click scheduling loop
//! - Global hotkey interception (start/stop from anywhere)
//! - Session orchestration (toggle, stats, shutdown)

pub mod cancel;
pub mod config;
pub mod hotkey_hook;
pub mod input_simulator;
pub mod scheduler;
pub mod session;
pub mod timing;

pub use cancel::HoldCanceller;
pub use config::{ClickConfig, MouseButton};
pub use hotkey_hook::{HookEvent, HotkeyHook};
pub use input_simulator::{InputBackend, YdotoolBackend};
pub use scheduler::SessionEvent;
pub use session::{RunState, SessionController};

use thiserror::Error;

/// Main error type for driftclick
#[derive(Error, Debug)]
pub enum DriftClickError {
    #[error("Failed to access input devices: {0}")]
    InputAccess(String),

    #[error("Failed to send input event: {0}")]
    SendEvent(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration cannot change while a session is running")]
    ConfigLocked,
}
