//! State Module - Runtime state for scan detection
//!
//! Everything here is single-threaded and driven by the host event loop:
//!
//! - **Prefix / Buffer** - Prefix matching and payload collection
//! - **Scanner** - Per-listener scan state machine
//! - **Timer** - Schedule-once cancelable tasks
//! - **Keyboard** - Keystroke events and subscriber registry
//! - **Input** - crossterm bridge and host loop turn
//! - **SwipeTrack** - Assembled-string hook and its fan-out list
//! - **Listener** - Registration and detachment

mod buffer;
mod input;
mod keyboard;
mod listener;
mod prefix;
mod scanner;
pub mod swipe_track;
mod timer;

pub use buffer::*;
pub use input::*;
pub use keyboard::*;
pub use listener::*;
pub use prefix::*;
pub use scanner::*;
pub use timer::*;
