//! Keyboard Module - Keystroke events and subscriber registry
//!
//! The stream channel's event source: one `KeypressEvent` per physical key
//! press, delivered to subscribers in the order pressed.
//! Does NOT own the terminal (that is the input module).
//!
//! # API
//!
//! - `KeystrokeSource` - subscribe / unsubscribe capability used by listeners
//! - `Keyboard::dispatch(event)` - Deliver one keystroke to every subscriber
//! - `Keyboard::dispatch_str(text)` - Deliver one keystroke per character
//!
//! # Example
//!
//! ```ignore
//! use barcode_listener::state::{Keyboard, KeypressEvent, KeystrokeSource};
//! use std::rc::Rc;
//!
//! let keyboard = Keyboard::new();
//! let id = keyboard.subscribe(Rc::new(|event: &KeypressEvent| {
//!     println!("Key: {:?}", event.char());
//! }));
//!
//! keyboard.dispatch_str("L%123");
//! keyboard.unsubscribe(id);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

// =============================================================================
// TYPES
// =============================================================================

/// One key press, carrying the character code of the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeypressEvent {
    /// Unicode code point of the pressed key.
    pub which: u32,
}

impl KeypressEvent {
    pub fn new(which: u32) -> Self {
        Self { which }
    }

    pub fn from_char(c: char) -> Self {
        Self { which: c as u32 }
    }

    /// Decode the character code. `None` for values that aren't a `char`.
    pub fn char(&self) -> Option<char> {
        char::from_u32(self.which)
    }
}

/// Handler for keystroke events.
pub type KeypressHandler = Rc<dyn Fn(&KeypressEvent)>;

/// Identifies one keystroke subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

/// Source of keystroke events that listeners attach to.
pub trait KeystrokeSource {
    fn subscribe(&self, handler: KeypressHandler) -> SubscriptionId;

    /// Returns false if `id` was not subscribed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

// =============================================================================
// HANDLER REGISTRY
// =============================================================================

struct HandlerRegistry {
    handlers: Vec<(SubscriptionId, KeypressHandler)>,
    next_id: usize,
}

impl HandlerRegistry {
    fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Keystroke source fed by the host event loop. Clones share subscribers.
#[derive(Clone)]
pub struct Keyboard {
    registry: Rc<RefCell<HandlerRegistry>>,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(HandlerRegistry::new())),
        }
    }

    /// Deliver one keystroke to every subscriber, in subscription order.
    ///
    /// Handlers run against a snapshot, so they may subscribe or unsubscribe
    /// while the event is being delivered.
    pub fn dispatch(&self, event: KeypressEvent) {
        let handlers: Vec<KeypressHandler> = self
            .registry
            .borrow()
            .handlers
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(&event);
        }
    }

    /// Deliver one keystroke per character of `text`, in order.
    pub fn dispatch_str(&self, text: &str) {
        for c in text.chars() {
            self.dispatch(KeypressEvent::from_char(c));
        }
    }

    /// Number of active subscriptions.
    pub fn handler_count(&self) -> usize {
        self.registry.borrow().handlers.len()
    }
}

impl KeystrokeSource for Keyboard {
    fn subscribe(&self, handler: KeypressHandler) -> SubscriptionId {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id();
        registry.handlers.push((id, handler));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let before = registry.handlers.len();
        registry.handlers.retain(|(handler_id, _)| *handler_id != id);
        registry.handlers.len() != before
    }
}

// =============================================================================
// TESTS
// =============================================================================
