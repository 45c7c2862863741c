//! Input Module - Terminal keystrokes and the host event loop
//!
//! Bridges crossterm's event system with the keystroke source and drives
//! scan timers. A USB barcode scanner in keyboard-wedge mode shows up here
//! as a fast burst of ordinary key presses.
//!
//! # API
//!
//! - `convert_key_event` - Convert crossterm KeyEvent to a KeypressEvent
//! - `poll_keypress` - Non-blocking keystroke check with timeout
//! - `pump` - One turn of the host loop: wait, dispatch, run due timers
//!
//! # Example
//!
//! ```ignore
//! use barcode_listener::state::pump;
//! use barcode_listener::{Keyboard, TimerQueue};
//! use std::time::Duration;
//!
//! // Event loop
//! loop {
//!     pump(&keyboard, &timers, Duration::from_millis(100))?;
//! }
//! ```

use crossterm::event::{
    Event as CrosstermEvent,
    KeyCode, KeyEventKind, KeyModifiers,
    KeyEvent as CrosstermKeyEvent,
    poll, read,
};
use std::io;
use std::time::Duration;

use super::keyboard::{Keyboard, KeypressEvent};
use super::timer::TimerQueue;

// =============================================================================
// KEY EVENT CONVERSION
// =============================================================================

/// Convert a crossterm KeyEvent to a keystroke.
///
/// Only printable characters, Enter and Tab produce keystrokes; releases
/// and Ctrl/Alt chords are not typing and are dropped.
pub fn convert_key_event(event: CrosstermKeyEvent) -> Option<KeypressEvent> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    if event
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }

    let c = match event.code {
        KeyCode::Char(c) => c,
        KeyCode::Enter => '\r',
        KeyCode::Tab => '\t',
        _ => return None,
    };
    Some(KeypressEvent::from_char(c))
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for a keystroke with timeout.
/// Returns None if nothing usable arrived within timeout.
pub fn poll_keypress(timeout: Duration) -> io::Result<Option<KeypressEvent>> {
    if !poll(timeout)? {
        return Ok(None);
    }
    match read()? {
        CrosstermEvent::Key(key) => Ok(convert_key_event(key)),
        _ => Ok(None),
    }
}

/// Run one turn of the host loop.
///
/// Waits up to `max_wait` (less if a timer is due sooner) for a keystroke,
/// dispatches it, then runs due timers. One keystroke per turn keeps timer
/// expirations ordered against the keystrokes around them.
/// Returns the number of keystrokes dispatched (0 or 1).
pub fn pump(keyboard: &Keyboard, timers: &TimerQueue, max_wait: Duration) -> io::Result<usize> {
    let wait = timers
        .next_deadline()
        .map_or(max_wait, |deadline| deadline.min(max_wait));

    let dispatched = match poll_keypress(wait)? {
        Some(event) => {
            keyboard.dispatch(event);
            1
        }
        None => 0,
    };

    timers.run_due();
    Ok(dispatched)
}

// =============================================================================
// TESTS
// =============================================================================
