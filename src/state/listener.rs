//! Listener Module - Scan listener registration
//!
//! Wires a `ScanState` to the keystroke stream and the assembled-string hook,
//! and hands back a `ScanHandle` that detaches both.
//!
//! # API
//!
//! - `on_scan(keyboard, timers, options, handler)` - Attach a listener
//! - `ScanHandle::remove()` - Detach it (idempotent)
//! - `last_scan()` - Last payload delivered by any listener
//!
//! # Example
//!
//! ```ignore
//! use barcode_listener::{on_scan, Keyboard, ScanOptions, TimerQueue};
//!
//! let keyboard = Keyboard::new();
//! let timers = TimerQueue::system();
//!
//! let handle = on_scan(&keyboard, &timers, ScanOptions::new("L%"), |lot| {
//!     println!("Scanned lot {}", lot);
//! })?;
//!
//! // Later, on cleanup:
//! handle.remove();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};
use tracing::{debug, trace};

use crate::error::Result;
use crate::types::{Channels, ScanHandler, ScanOptions};

use super::keyboard::{KeypressEvent, KeystrokeSource};
use super::scanner::ScanState;
use super::swipe_track;
use super::timer::Scheduler;

// =============================================================================
// LAST SCAN
// =============================================================================

thread_local! {
    static LAST_SCAN: Signal<Option<String>> = signal(None);
}

/// Last payload delivered to any listener, on either channel.
pub fn last_scan() -> Option<String> {
    LAST_SCAN.with(|s| s.get())
}

/// Clear the last scan (for testing).
pub fn reset_last_scan() {
    LAST_SCAN.with(|s| s.set(None));
}

// =============================================================================
// SCAN HANDLE
// =============================================================================

/// Detaches a listener from every channel it was attached to.
///
/// Dropping the handle does not detach; call `remove`.
pub struct ScanHandle {
    detach: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl ScanHandle {
    /// Detach the listener. Calling again does nothing.
    pub fn remove(&self) {
        let detach = self.detach.borrow_mut().take();
        if let Some(detach) = detach {
            detach();
        }
    }

    /// Whether `remove` has not been called yet.
    pub fn is_active(&self) -> bool {
        self.detach.borrow().is_some()
    }

    /// Convert into a plain cleanup closure.
    pub fn into_cleanup(self) -> impl FnOnce() {
        move || self.remove()
    }
}

// =============================================================================
// REGISTRATION
// =============================================================================

/// Listen for scans with the given characteristics.
///
/// `handler` receives each completed payload (prefix stripped). Fails with
/// `ScanError::InvalidArgument` if `options` don't validate.
pub fn on_scan<K, S, F>(keyboard: &K, timers: &S, options: ScanOptions, handler: F) -> Result<ScanHandle>
where
    K: KeystrokeSource + Clone + 'static,
    S: Scheduler + Clone + 'static,
    F: Fn(&str) + 'static,
{
    options.validate()?;

    let active = Rc::new(Cell::new(true));
    let deliver: ScanHandler = {
        let active = active.clone();
        Rc::new(move |payload: &str| {
            if !active.get() {
                return;
            }
            debug!("scan delivered ({} chars)", payload.chars().count());
            LAST_SCAN.with(|s| s.set(Some(payload.to_string())));
            handler(payload);
        })
    };

    let state = Rc::new(RefCell::new(ScanState::new(
        &options.barcode_prefix,
        options.value_test.clone(),
        options.finish_scan_on_match,
    )));

    let subscription = options.channels.contains(Channels::KEYBOARD).then(|| {
        keyboard.subscribe(keypress_handler(
            &state,
            timers.clone(),
            &options,
            deliver.clone(),
        ))
    });

    let entry = options
        .channels
        .contains(Channels::SWIPE_TRACK)
        .then(|| swipe_track::add_entry(&options.barcode_prefix, deliver));

    debug!(
        "scan listener attached: prefix={:?} duration={:?} channels={:?}",
        options.barcode_prefix, options.scan_window(), options.channels
    );

    let keyboard = keyboard.clone();
    let timers = timers.clone();
    let prefix = options.barcode_prefix;
    let detach = move || {
        active.set(false);
        if let Some(id) = subscription {
            keyboard.unsubscribe(id);
        }
        if let Some(id) = entry {
            swipe_track::remove_entry(id);
        }
        let timer = state.borrow_mut().abandon();
        if let Some(timer) = timer {
            timers.cancel(timer);
        }
        debug!("scan listener detached: prefix={:?}", prefix);
    };

    Ok(ScanHandle {
        detach: RefCell::new(Some(Box::new(detach))),
    })
}

/// Build the stream-channel handler for one listener.
fn keypress_handler<S>(
    state: &Rc<RefCell<ScanState>>,
    timers: S,
    options: &ScanOptions,
    deliver: ScanHandler,
) -> Rc<dyn Fn(&KeypressEvent)>
where
    S: Scheduler + 'static,
{
    let state = state.clone();
    let duration = options.scan_window();

    Rc::new(move |event: &KeypressEvent| {
        let Some(c) = event.char() else {
            return;
        };
        trace!("keypress {:?}", c);

        let early = {
            let mut scan = state.borrow_mut();
            if scan.is_idle() {
                let timer = timers.schedule_once(
                    duration,
                    finish_task(Rc::downgrade(&state), deliver.clone()),
                );
                scan.start_burst(timer);
            }
            scan.feed(c)
        };

        // State borrow is released before the handler runs; it may detach.
        if let Some(done) = early {
            if let Some(timer) = done.timer {
                timers.cancel(timer);
            }
            debug!("scan finished early on value match");
            deliver(&done.payload);
        }
    })
}

/// Timer task that finalizes the burst it was armed for.
fn finish_task(state: Weak<RefCell<ScanState>>, deliver: ScanHandler) -> Box<dyn FnOnce()> {
    Box::new(move || {
        let Some(state) = state.upgrade() else {
            return;
        };
        let payload = state.borrow_mut().finish();
        match payload {
            Some(payload) => deliver(&payload),
            None => trace!("scan window elapsed without a payload"),
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================
