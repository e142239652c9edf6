//! Request-level error taxonomy.
//!
//! Every failure a request can hit ends up as one of these variants. None of
//! them are retried; the classifier turns each into an external signal.

use crate::decoder::Diagnostic;
use thiserror::Error;

/// Terminal failure for one scan request
#[derive(Error, Debug)]
pub enum ScanError {
    /// Malformed URL, unreachable host, non-2xx status or transport fault
    #[error("invalid source: {0}")]
    InvalidSource(String),

    /// Byte size over the cap, or pixel dimensions outside the admitted range
    #[error("too large: {0}")]
    TooLarge(String),

    /// The image codec could not produce pixels from the bytes
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Every decode strategy came back empty
    #[error("decode failed: {0}")]
    Decode(#[from] Diagnostic),
}
