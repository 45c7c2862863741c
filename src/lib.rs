//! # barcode-listener
//!
//! Tells barcode-scanner input apart from human typing.
//!
//! A scanner in keyboard-wedge mode "types" its payload as a fast burst of
//! key presses, led by a configured prefix. A listener watches the keystroke
//! stream for that prefix, collects what follows, and delivers the payload
//! once the burst's time window closes (or as soon as the payload passes a
//! value test, if asked to). Integrations that hand over the whole barcode
//! at once go through the assembled-string hook instead.
//!
//! ## Architecture
//!
//! Single-threaded and event-driven. The host loop feeds keystrokes into a
//! `Keyboard` and drives a `TimerQueue`; nothing blocks.
//! ```text
//! keystroke → Keyboard → PrefixMatcher → ScanBuffer → ScanState ─┐
//!                                          TimerQueue (window) ───┴→ handler
//! swipe_track::on_scan_app_bar_code_data(barcode) ── prefix fan-out ──→ handler
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Scan options, value tests, channels
//! - [`state`] - Scan state machine, timers, keystroke source, registration
//! - [`error`] - Registration errors

pub mod error;
pub mod state;
pub mod types;

pub use error::{Result, ScanError};

pub use types::{Channels, ScanHandler, ScanOptions, ValueTest, DEFAULT_SCAN_DURATION};

pub use state::{
    // Registration
    on_scan, ScanHandle, last_scan, reset_last_scan,
    // Keystroke source
    Keyboard, KeypressEvent, KeystrokeSource, SubscriptionId,
    // Timers
    Scheduler, TimerId, TimerQueue,
    // Host loop
    convert_key_event, poll_keypress, pump,
    // Scan state
    PrefixMatcher, PrefixStep, ScanBuffer, ScanPhase, ScanState,
};

pub use state::swipe_track::on_scan_app_bar_code_data;
