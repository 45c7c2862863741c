//! Scan Terminal Demo - Listen for barcode scans in the terminal
//!
//! Puts the terminal in raw mode and prints every scan whose prefix
//! matches. Plug in a keyboard-wedge scanner, or type fast.
//!
//! Run with: cargo run --example scan_terminal -- L% 30
//! (prefix, seconds to listen). Set RUST_LOG=barcode_listener=debug for logs.

use std::io;
use std::time::{Duration, Instant};

use barcode_listener::{on_scan, pump, Keyboard, ScanOptions, TimerQueue};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let prefix = args.next().unwrap_or_else(|| "L%".to_string());
    let seconds = args.next().and_then(|s| s.parse().ok()).unwrap_or(30);

    let keyboard = Keyboard::new();
    let timers = TimerQueue::system();

    let handle = match on_scan(&keyboard, &timers, ScanOptions::new(prefix.as_str()), |payload| {
        print!("scanned: {}\r\n", payload);
    }) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };

    print!("listening for {:?} scans for {}s\r\n", prefix, seconds);
    enable_raw_mode()?;

    let deadline = Instant::now() + Duration::from_secs(seconds);
    let result = (|| -> io::Result<()> {
        while Instant::now() < deadline {
            pump(&keyboard, &timers, Duration::from_millis(100))?;
        }
        Ok(())
    })();

    disable_raw_mode()?;
    handle.remove();
    result
}
