//! Scan Buffer - payload characters collected after the prefix

/// Ordered payload characters for one candidate scan.
///
/// Whitespace is never stored (scanners often terminate with Enter or Tab).
#[derive(Debug, Clone, Default)]
pub struct ScanBuffer {
    payload: String,
}

impl ScanBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `c` unless it is whitespace. Returns true if it was stored.
    pub fn push(&mut self, c: char) -> bool {
        if c.is_whitespace() {
            return false;
        }
        self.payload.push(c);
        true
    }

    pub fn as_str(&self) -> &str {
        &self.payload
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Take the payload, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.payload)
    }
}
