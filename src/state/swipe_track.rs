//! SwipeTrack Module - Assembled-string scan hook
//!
//! Some scanner integrations (the SwipeTrack browser among them) don't type
//! keystrokes; they call one well-known entry point with the whole barcode.
//! The entry point is installed lazily by the first listener that wants it
//! and fans each barcode out to every listener whose prefix it starts with.
//!
//! # Pattern
//!
//! - `install()` is idempotent; the entry point stays resident once installed
//! - Entries are tried independently, not first-match-wins
//! - Each matching entry receives the barcode with its prefix stripped
//! - An empty list is harmless: the hook just matches nothing
//!
//! # Example
//!
//! ```ignore
//! use barcode_listener::state::swipe_track;
//! use std::rc::Rc;
//!
//! let id = swipe_track::add_entry("L%", Rc::new(|lot: &str| println!("lot {}", lot)));
//! swipe_track::on_scan_app_bar_code_data("L%mylot"); // prints "lot mylot"
//! swipe_track::remove_entry(id);
//! ```

use std::cell::RefCell;

use tracing::{debug, trace};

use crate::types::ScanHandler;

// =============================================================================
// FAN-OUT LIST
// =============================================================================

/// Identifies one fan-out entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

struct FanOut {
    entries: Vec<(EntryId, String, ScanHandler)>,
    next_id: usize,
}

impl FanOut {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

thread_local! {
    /// `None` until the entry point is installed.
    static FAN_OUT: RefCell<Option<FanOut>> = const { RefCell::new(None) };
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Install the entry point if it isn't already.
pub fn install() {
    FAN_OUT.with(|fan_out| {
        let mut fan_out = fan_out.borrow_mut();
        if fan_out.is_none() {
            debug!("installing assembled-string scan hook");
            *fan_out = Some(FanOut::new());
        }
    });
}

/// Whether the entry point has been installed.
pub fn is_installed() -> bool {
    FAN_OUT.with(|fan_out| fan_out.borrow().is_some())
}

/// Append an entry for `prefix`, installing the entry point if needed.
pub fn add_entry(prefix: &str, handler: ScanHandler) -> EntryId {
    install();
    FAN_OUT.with(|fan_out| {
        let mut fan_out = fan_out.borrow_mut();
        let fan_out = fan_out.get_or_insert_with(FanOut::new);
        let id = EntryId(fan_out.next_id);
        fan_out.next_id += 1;
        fan_out.entries.push((id, prefix.to_string(), handler));
        id
    })
}

/// Remove an entry. Returns false if it was already gone.
pub fn remove_entry(id: EntryId) -> bool {
    FAN_OUT.with(|fan_out| {
        let mut fan_out = fan_out.borrow_mut();
        let Some(fan_out) = fan_out.as_mut() else {
            return false;
        };
        let before = fan_out.entries.len();
        fan_out.entries.retain(|(entry_id, _, _)| *entry_id != id);
        fan_out.entries.len() != before
    })
}

/// Number of registered entries.
pub fn handler_count() -> usize {
    FAN_OUT.with(|fan_out| {
        fan_out
            .borrow()
            .as_ref()
            .map(|fan_out| fan_out.entries.len())
            .unwrap_or(0)
    })
}

/// The entry point: called by the external integration once per scan.
///
/// Returns false if nothing ever installed the entry point (the external
/// side would see the hook as absent), true otherwise.
pub fn on_scan_app_bar_code_data(barcode: &str) -> bool {
    // Snapshot matching entries so handlers may add or remove entries.
    let matches: Option<Vec<(usize, ScanHandler)>> = FAN_OUT.with(|fan_out| {
        fan_out.borrow().as_ref().map(|fan_out| {
            fan_out
                .entries
                .iter()
                .filter(|(_, prefix, _)| barcode.starts_with(prefix.as_str()))
                .map(|(_, prefix, handler)| (prefix.len(), handler.clone()))
                .collect()
        })
    });

    let Some(matches) = matches else {
        return false;
    };

    trace!("assembled scan matched {} entries", matches.len());
    for (prefix_len, handler) in matches {
        handler(&barcode[prefix_len..]);
    }
    true
}

/// Uninstall the entry point and drop all entries (for testing).
pub fn reset_swipe_track_state() {
    FAN_OUT.with(|fan_out| {
        *fan_out.borrow_mut() = None;
    });
}

// =============================================================================
// TESTS
// =============================================================================
