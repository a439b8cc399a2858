//! driftclick - Auto-clicker with randomized timing and a global hotkey toggle
//!
//! Headless host: wires the session controller, the keyboard hook and the
//! ydotool backend together, logs status lines, and toggles on the hotkey.

use clap::{Parser, ValueEnum};
use driftclick::{
    ClickConfig, DriftClickError, HookEvent, HotkeyHook, MouseButton, SessionController,
    SessionEvent, YdotoolBackend,
};
use rdev::Key;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ButtonArg {
    Left,
    Right,
    Middle,
}

impl From<ButtonArg> for MouseButton {
    fn from(value: ButtonArg) -> Self {
        match value {
            ButtonArg::Left => MouseButton::Left,
            ButtonArg::Right => MouseButton::Right,
            ButtonArg::Middle => MouseButton::Middle,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HotkeyArg {
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl From<HotkeyArg> for Key {
    fn from(value: HotkeyArg) -> Self {
        match value {
            HotkeyArg::F6 => Key::F6,
            HotkeyArg::F7 => Key::F7,
            HotkeyArg::F8 => Key::F8,
            HotkeyArg::F9 => Key::F9,
            HotkeyArg::F10 => Key::F10,
            HotkeyArg::F11 => Key::F11,
            HotkeyArg::F12 => Key::F12,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base click interval in milliseconds
    #[arg(short, long, default_value_t = 500)]
    interval: u64,

    /// Symmetric random offset on the interval in milliseconds
    #[arg(short, long, default_value_t = 100)]
    offset: u64,

    /// Mouse button to click
    #[arg(short, long, value_enum, default_value = "left")]
    button: ButtonArg,

    /// Hold the button down instead of tapping it
    #[arg(long)]
    hold: bool,

    /// Minimum hold duration in milliseconds (with --hold)
    #[arg(long, default_value_t = 200)]
    min_hold: u64,

    /// Maximum random extra hold time in milliseconds (with --hold)
    #[arg(long, default_value_t = 200)]
    max_extra_hold: u64,

    /// Start/stop hotkey
    #[arg(long, value_enum, default_value = "f6")]
    hotkey: HotkeyArg,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn build_config(args: &Args) -> ClickConfig {
    let config = ClickConfig::default()
        .with_interval(args.interval)
        .with_offset(args.offset)
        .with_button(args.button.into())
        .with_hotkey(args.hotkey.into());

    if args.hold {
        config.with_hold(args.min_hold, args.max_extra_hold)
    } else {
        config
    }
}

fn main() -> Result<(), DriftClickError> {
    let args = Args::parse();

    // Initialize logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_target(false)
        .compact()
        .init();

    info!("driftclick starting...");

    let config = build_config(&args);
    config.validate()?;
    info!(
        "Config: interval={}ms ±{}ms, button={:?}, hold={}, hotkey={:?}",
        config.base_interval_ms,
        config.random_offset_ms,
        config.button,
        config.hold_mode,
        config.hotkey
    );

    // Create the input backend
    let backend = match YdotoolBackend::new() {
        Ok(backend) => backend,
        Err(e) => {
            error!("{}", e);
            return Err(e);
        }
    };
    info!("Input simulator ready");

    // Set up Ctrl+C handler for graceful shutdown
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    ctrlc::set_handler(move || {
        info!("Shutdown signal received");
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .expect("Failed to set Ctrl+C handler");

    // Session events out, hotkey notifications in
    let (event_sender, event_receiver) = mpsc::channel();
    let controller = SessionController::new(config.clone(), Box::new(backend), event_sender);

    let (hook_sender, hook_receiver) = mpsc::channel();
    let hook = HotkeyHook::install(config.hotkey, hook_sender);

    info!(
        "Ready - press {:?} to start/stop, Ctrl+C to exit",
        config.hotkey
    );

    // Main event loop
    let mut hook_alive = true;
    while !shutdown.load(Ordering::SeqCst) {
        if hook_alive {
            match hook_receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(HookEvent::HotkeyPressed) => {
                    // The hook thread only notifies; the toggle happens here
                    controller.toggle();
                }
                Ok(HookEvent::InstallFailed(detail)) => {
                    warn!("Global hotkey unavailable: {}", detail);
                    warn!("Add your user to the 'input' group and log in again");
                }
                Err(RecvTimeoutError::Timeout) => {
                    // No hotkey activity, drain status events below
                }
                Err(RecvTimeoutError::Disconnected) => {
                    // Hook thread gone (install failed); keep the rest running
                    hook_alive = false;
                }
            }
        } else {
            thread::sleep(Duration::from_millis(100));
        }

        while let Ok(event) = event_receiver.try_recv() {
            match event {
                SessionEvent::Cycle {
                    interval_ms,
                    hold_ms: Some(hold_ms),
                    clicks,
                } => info!(
                    "Interval: {} ms | Hold: {} ms | Clicks: {}",
                    interval_ms, hold_ms, clicks
                ),
                SessionEvent::Cycle {
                    interval_ms,
                    hold_ms: None,
                    clicks,
                } => info!("Interval: {} ms | Clicks: {}", interval_ms, clicks),
                SessionEvent::RunState { running: true } => info!("Status: Running"),
                SessionEvent::RunState { running: false } => {
                    let state = controller.state();
                    if let Some(started) = state.started_at() {
                        info!(
                            "Status: Idle ({} clicks in {:.1?})",
                            state.clicks(),
                            started.elapsed()
                        );
                    } else {
                        info!("Status: Idle");
                    }
                }
                SessionEvent::InputFault { detail } => {
                    warn!("Synthetic input failed, continuing: {}", detail);
                }
            }
        }
    }

    info!("driftclick shutting down...");

    // Release any held button and drain the worker before tearing down
    controller.shutdown();
    hook.uninstall();

    Ok(())
}
