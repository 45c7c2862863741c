//! Core types for barcode-listener.
//!
//! Options describing one scan listener, the value test that decides whether
//! a payload looks complete, and the channel set a listener attaches to.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;

use crate::error::{Result, ScanError};

/// Default settle time for a scan burst.
pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_millis(50);

/// Consumer of a completed scan payload.
pub type ScanHandler = Rc<dyn Fn(&str)>;

// =============================================================================
// Value test
// =============================================================================

/// Predicate deciding whether a payload looks like a valid completed scan.
///
/// Cheap to clone. Regex tests are unanchored, so anchor the pattern
/// yourself (`^123.*`) when the payload must start with something.
#[derive(Clone)]
pub struct ValueTest(Rc<dyn Fn(&str) -> bool>);

impl ValueTest {
    /// Wrap any predicate.
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        Self(Rc::new(test))
    }

    /// Test payloads against a compiled regex.
    pub fn regex(re: Regex) -> Self {
        Self::new(move |value| re.is_match(value))
    }

    /// Compile `pattern` and test payloads against it.
    pub fn pattern(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern)
            .map_err(|_| ScanError::invalid("barcodeValueTest", "a valid regular expression"))?;
        Ok(Self::regex(re))
    }

    /// Run the test.
    pub fn test(&self, value: &str) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for ValueTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueTest(..)")
    }
}

// =============================================================================
// Channels
// =============================================================================

bitflags::bitflags! {
    /// Input channels a listener attaches to.
    ///
    /// `KEYBOARD` is the per-keystroke stream, `SWIPE_TRACK` the one-shot
    /// hook that delivers an already assembled barcode string.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Channels: u8 {
        const KEYBOARD = 1 << 0;
        const SWIPE_TRACK = 1 << 1;
    }
}

impl Default for Channels {
    fn default() -> Self {
        Self::all()
    }
}

impl Channels {
    fn from_channel_name(name: &str) -> Option<Self> {
        match name {
            "keyboard" => Some(Self::KEYBOARD),
            "swipeTrack" => Some(Self::SWIPE_TRACK),
            _ => None,
        }
    }
}

// =============================================================================
// Scan options
// =============================================================================

/// Characteristics of the scans one listener waits for.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Leading characters identifying the scanner. Stripped from the payload.
    pub barcode_prefix: String,
    /// Optional validity test for the payload.
    pub value_test: Option<ValueTest>,
    /// Deliver as soon as `value_test` passes instead of waiting out the window.
    pub finish_scan_on_match: bool,
    /// How long a burst may last before it is finalized.
    pub scan_duration: Duration,
    /// Channels to attach to.
    pub channels: Channels,
}

impl ScanOptions {
    /// Options for `prefix` with every other setting at its default.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            barcode_prefix: prefix.into(),
            value_test: None,
            finish_scan_on_match: false,
            scan_duration: DEFAULT_SCAN_DURATION,
            channels: Channels::default(),
        }
    }

    pub fn with_value_test(mut self, test: ValueTest) -> Self {
        self.value_test = Some(test);
        self
    }

    pub fn with_finish_scan_on_match(mut self, finish: bool) -> Self {
        self.finish_scan_on_match = finish;
        self
    }

    /// Set the burst window. Zero means the default window.
    pub fn with_scan_duration(mut self, duration: Duration) -> Self {
        self.scan_duration = if duration.is_zero() {
            DEFAULT_SCAN_DURATION
        } else {
            duration
        };
        self
    }

    /// Window a burst actually gets: `scan_duration`, or the default when
    /// it was left at zero.
    pub fn scan_window(&self) -> Duration {
        if self.scan_duration.is_zero() {
            DEFAULT_SCAN_DURATION
        } else {
            self.scan_duration
        }
    }

    pub fn with_channels(mut self, channels: Channels) -> Self {
        self.channels = channels;
        self
    }

    /// Check the values the type system can't rule out.
    pub fn validate(&self) -> Result<()> {
        if self.barcode_prefix.is_empty() {
            return Err(ScanError::invalid("barcodePrefix", "a non-empty string"));
        }
        if self.channels.is_empty() {
            return Err(ScanError::invalid("channels", "a non-empty channel list"));
        }
        Ok(())
    }

    /// Parse an untyped option record.
    ///
    /// Recognized fields: `barcodePrefix` (string, required),
    /// `barcodeValueTest` (regex pattern string), `finishScanOnMatch` (bool),
    /// `scanDuration` (milliseconds, 0 for the default) and `channels` (array of `"keyboard"` /
    /// `"swipeTrack"`). `null` counts as absent. A record that is not an
    /// object is treated as empty.
    pub fn from_json(value: &Value) -> Result<Self> {
        let field = |name: &str| match value.get(name) {
            Some(Value::Null) | None => None,
            Some(v) => Some(v),
        };

        let prefix = field("barcodePrefix")
            .and_then(Value::as_str)
            .ok_or_else(|| ScanError::invalid("barcodePrefix", "a string"))?;
        let mut options = Self::new(prefix);

        if let Some(test) = field("barcodeValueTest") {
            let pattern = test.as_str().ok_or_else(|| {
                ScanError::invalid("barcodeValueTest", "a valid regular expression")
            })?;
            options.value_test = Some(ValueTest::pattern(pattern)?);
        }

        if let Some(finish) = field("finishScanOnMatch") {
            options.finish_scan_on_match = finish
                .as_bool()
                .ok_or_else(|| ScanError::invalid("finishScanOnMatch", "a boolean"))?;
        }

        if let Some(duration) = field("scanDuration") {
            let ms = duration
                .as_f64()
                .ok_or_else(|| ScanError::invalid("scanDuration", "a number"))?;
            if ms.is_nan() || ms < 0.0 {
                return Err(ScanError::invalid("scanDuration", "a positive duration"));
            }
            let duration = Duration::try_from_secs_f64(ms / 1000.0)
                .map_err(|_| ScanError::invalid("scanDuration", "a positive duration"))?;
            options = options.with_scan_duration(duration);
        }

        if let Some(channels) = field("channels") {
            let names = channels
                .as_array()
                .ok_or_else(|| ScanError::invalid("channels", "a non-empty channel list"))?;
            let mut set = Channels::empty();
            for name in names {
                let channel = name
                    .as_str()
                    .and_then(Channels::from_channel_name)
                    .ok_or_else(|| ScanError::invalid("channels", "a non-empty channel list"))?;
                set |= channel;
            }
            options.channels = set;
        }

        options.validate()?;
        Ok(options)
    }
}
