//! Error types for barcode-listener.
//!
//! Registration is the only place anything can fail. Once a listener is
//! attached, bursts that don't look like a scan are ignored, not reported.

use thiserror::Error;

/// Result type for registration and option parsing.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors raised while registering a scan listener.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// An option was missing, had the wrong type, or held an unusable value.
    ///
    /// `field` uses the option-record spelling (`barcodePrefix`,
    /// `scanDuration`, ...) so messages line up with external configuration.
    #[error("{field} must be {expected}")]
    InvalidArgument {
        field: &'static str,
        expected: &'static str,
    },
}

impl ScanError {
    pub(crate) fn invalid(field: &'static str, expected: &'static str) -> Self {
        Self::InvalidArgument { field, expected }
    }

    /// Name of the offending option.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidArgument { field, .. } => field,
        }
    }
}
