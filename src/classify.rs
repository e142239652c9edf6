//! Result/failure classification.
//!
//! Turns a scan outcome into what the caller sees: payload text (plain or
//! structured) on success, one of four failure signals otherwise. Format and
//! checksum diagnostics share a signal; both mean a symbol was located but
//! its content cannot be trusted.

use crate::decoder::FailureKind;
use crate::error::ScanError;
use crate::models::PayloadResult;
use crate::pipeline::{CascadeStage, Decoded};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// External failure destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureSignal {
    /// Source could not be fetched or parsed
    BadUrl,
    /// Bytes were oversized or not an image
    BadImage,
    /// No symbol located
    NotFound,
    /// Symbol located but structure or checksum invalid
    Format,
}

impl FailureSignal {
    /// Redirect target for the HTTP surface
    pub fn path(&self) -> &'static str {
        match self {
            FailureSignal::BadUrl => "/w/badurl",
            FailureSignal::BadImage => "/w/badimage",
            FailureSignal::NotFound => "/w/notfound",
            FailureSignal::Format => "/w/format",
        }
    }

    /// Short human explanation, served by the failure pages
    pub fn message(&self) -> &'static str {
        match self {
            FailureSignal::BadUrl => "The URL was invalid or the image could not be retrieved.",
            FailureSignal::BadImage => "The file was too large or was not a readable image.",
            FailureSignal::NotFound => "No barcode was found in this image.",
            FailureSignal::Format => "A barcode was found, but its content could not be decoded.",
        }
    }
}

impl fmt::Display for FailureSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureSignal::BadUrl => write!(f, "badurl"),
            FailureSignal::BadImage => write!(f, "badimage"),
            FailureSignal::NotFound => write!(f, "notfound"),
            FailureSignal::Format => write!(f, "format"),
        }
    }
}

/// Map a terminal error to its external signal
pub fn classify(error: &ScanError) -> FailureSignal {
    match error {
        ScanError::InvalidSource(detail) => {
            debug!(%detail, "bad source");
            FailureSignal::BadUrl
        }
        ScanError::TooLarge(detail) | ScanError::InvalidImage(detail) => {
            debug!(%detail, "bad image");
            FailureSignal::BadImage
        }
        ScanError::Decode(diagnostic) => match diagnostic.kind {
            FailureKind::NotFound => {
                info!("No barcode found");
                FailureSignal::NotFound
            }
            FailureKind::FormatInvalid | FailureKind::ChecksumInvalid => {
                info!(%diagnostic, "Barcode could not be decoded");
                FailureSignal::Format
            }
        },
    }
}

/// Output rendering chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// One payload text per line
    #[default]
    Plain,
    /// JSON report with symbol metadata
    Full,
}

impl DisplayMode {
    /// `true` selects the structured rendering
    pub fn from_full_flag(full: bool) -> Self {
        if full {
            DisplayMode::Full
        } else {
            DisplayMode::Plain
        }
    }
}

/// Newline-terminated payload texts in discovery order
pub fn plain_text(payloads: &[PayloadResult]) -> String {
    let mut out = String::new();
    for payload in payloads {
        out.push_str(&payload.text);
        out.push('\n');
    }
    out
}

/// Structured rendering of a successful decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeReport {
    /// Cascade step that produced the payloads
    pub stage: CascadeStage,
    /// Number of payloads
    pub count: usize,
    /// Payloads in discovery order
    pub payloads: Vec<PayloadResult>,
}

impl From<Decoded> for DecodeReport {
    fn from(decoded: Decoded) -> Self {
        Self {
            stage: decoded.stage,
            count: decoded.payloads.len(),
            payloads: decoded.payloads,
        }
    }
}

/// A successful decode, rendered for one display mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// `text/plain` body
    Plain(String),
    /// JSON report
    Full(DecodeReport),
}

/// Render a successful decode
pub fn render(decoded: Decoded, mode: DisplayMode) -> Rendered {
    for payload in &decoded.payloads {
        info!(text = %payload.text, stage = %decoded.stage, "Decoded barcode");
    }
    match mode {
        DisplayMode::Plain => Rendered::Plain(plain_text(&decoded.payloads)),
        DisplayMode::Full => Rendered::Full(decoded.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Diagnostic;
    use crate::models::Symbology;

    fn decoded(texts: &[&str]) -> Decoded {
        Decoded {
            payloads: texts
                .iter()
                .map(|t| PayloadResult::new(*t, Symbology::QrCode))
                .collect(),
            stage: CascadeStage::MultiSymbol,
        }
    }

    #[test]
    fn test_error_signals() {
        let cases = [
            (ScanError::InvalidSource("404".into()), FailureSignal::BadUrl),
            (ScanError::TooLarge("big".into()), FailureSignal::BadImage),
            (ScanError::InvalidImage("junk".into()), FailureSignal::BadImage),
            (Diagnostic::not_found().into(), FailureSignal::NotFound),
            (Diagnostic::format("bad version").into(), FailureSignal::Format),
            (Diagnostic::checksum("data ecc").into(), FailureSignal::Format),
        ];
        for (error, signal) in cases {
            assert_eq!(classify(&error), signal, "{error}");
        }
    }

    #[test]
    fn test_signal_paths() {
        assert_eq!(FailureSignal::BadUrl.path(), "/w/badurl");
        assert_eq!(FailureSignal::Format.path(), "/w/format");
        assert_eq!(FailureSignal::NotFound.to_string(), "notfound");
    }

    #[test]
    fn test_plain_rendering_keeps_order_and_duplicates() {
        let Rendered::Plain(body) = render(decoded(&["b", "a", "b"]), DisplayMode::Plain) else {
            panic!("expected plain rendering");
        };
        assert_eq!(body, "b\na\nb\n");
    }

    #[test]
    fn test_full_rendering() {
        let Rendered::Full(report) = render(decoded(&["HELLO"]), DisplayMode::from_full_flag(true))
        else {
            panic!("expected full rendering");
        };
        assert_eq!(report.count, 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stage"], "multi_symbol");
        assert_eq!(json["payloads"][0]["text"], "HELLO");
        assert_eq!(json["payloads"][0]["symbology"], "QR_CODE");
    }
}
