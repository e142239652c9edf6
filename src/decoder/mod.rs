//! Decoder capability and decode-attempt configuration
//!
//! The cascade in [`crate::pipeline`] only talks to the [`Decoder`] trait, so
//! symbology algorithms stay behind this seam:
//! - [`qr::QrDecoder`] is the built-in implementation backed by `rqrr`
//! - tests plug in deterministic fakes

use crate::models::{BitMatrix, PayloadResult, Symbology};
use std::fmt;
use thiserror::Error;

/// Built-in QR decoder
pub mod qr;
/// Frame normalisation for the pure-symbol pass
pub mod pure;

pub use qr::QrDecoder;

/// Why a single decode attempt came back empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No symbol located
    NotFound,
    /// A symbol was located but its structure did not parse
    FormatInvalid,
    /// A symbol was located but error correction could not repair it
    ChecksumInvalid,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::FormatInvalid => write!(f, "format invalid"),
            FailureKind::ChecksumInvalid => write!(f, "checksum invalid"),
        }
    }
}

/// The most specific reason available for a failed attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct Diagnostic {
    /// Failure category
    pub kind: FailureKind,
    /// Free-form detail for logs
    pub detail: String,
}

impl Diagnostic {
    /// Build a diagnostic of the given kind
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Generic not-found, used when no attempt produced anything more specific
    pub fn not_found() -> Self {
        Self::new(FailureKind::NotFound, "no symbol found")
    }

    /// Symbol located, structure invalid
    pub fn format(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::FormatInvalid, detail)
    }

    /// Symbol located, error correction failed
    pub fn checksum(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::ChecksumInvalid, detail)
    }
}

/// Symbology scope and strictness for one decode attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeAttemptConfig {
    /// Symbologies the decoder may report
    pub symbologies: &'static [Symbology],
    /// Spend extra effort; the QR decoder also scans the inverted matrix
    pub try_harder: bool,
    /// Assume the symbol fills the frame with no surrounding noise
    pub pure_symbol: bool,
}

impl DecodeAttemptConfig {
    /// All symbologies, tolerant
    pub const STANDARD: Self = Self {
        symbologies: Symbology::ALL,
        try_harder: true,
        pure_symbol: false,
    };

    /// All symbologies, symbol fills the frame
    pub const PURE: Self = Self {
        symbologies: Symbology::ALL,
        try_harder: true,
        pure_symbol: true,
    };

    /// Whether `symbology` is in scope for this attempt
    pub fn allows(&self, symbology: Symbology) -> bool {
        self.symbologies.contains(&symbology)
    }
}

/// The two configurations the cascade uses, built once per [`crate::Scanner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeProfiles {
    /// Configuration for the multi-symbol and standard passes
    pub standard: DecodeAttemptConfig,
    /// Configuration for the pure-symbol pass
    pub pure: DecodeAttemptConfig,
}

impl Default for DecodeProfiles {
    fn default() -> Self {
        Self {
            standard: DecodeAttemptConfig::STANDARD,
            pure: DecodeAttemptConfig::PURE,
        }
    }
}

/// Symbol decoding capability.
///
/// Implementations must be safe to share across request workers; the cascade
/// calls them with a borrowed, already binarized matrix.
pub trait Decoder: Send + Sync {
    /// Find every symbol in the frame. `Ok` with an empty list is allowed and
    /// treated the same as a not-found diagnostic.
    fn decode_all(
        &self,
        bits: &BitMatrix,
        config: &DecodeAttemptConfig,
    ) -> Result<Vec<PayloadResult>, Diagnostic>;

    /// Find one symbol
    fn decode_one(
        &self,
        bits: &BitMatrix,
        config: &DecodeAttemptConfig,
    ) -> Result<PayloadResult, Diagnostic>;
}

impl<D: Decoder + ?Sized> Decoder for std::sync::Arc<D> {
    fn decode_all(
        &self,
        bits: &BitMatrix,
        config: &DecodeAttemptConfig,
    ) -> Result<Vec<PayloadResult>, Diagnostic> {
        (**self).decode_all(bits, config)
    }

    fn decode_one(
        &self,
        bits: &BitMatrix,
        config: &DecodeAttemptConfig,
    ) -> Result<PayloadResult, Diagnostic> {
        (**self).decode_one(bits, config)
    }
}
