use serde::Serialize;
use std::fmt;

/// Barcode symbologies a decoder can be asked to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Symbology {
    /// QR Code, model 2
    QrCode,
}

impl Symbology {
    /// Every symbology this crate knows about
    pub const ALL: &'static [Symbology] = &[Symbology::QrCode];
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbology::QrCode => write!(f, "QR_CODE"),
        }
    }
}

/// Pixel coordinate of a symbol corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Corner {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

/// One decoded symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadResult {
    /// Decoded text content
    pub text: String,
    /// Symbology the payload was read from
    pub symbology: Symbology,
    /// Symbol version, when the symbology has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<usize>,
    /// Symbol corners in image coordinates, clockwise from top-left
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub corners: Vec<Corner>,
}

impl PayloadResult {
    /// A payload with no positional metadata
    pub fn new(text: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            text: text.into(),
            symbology,
            version: None,
            corners: Vec::new(),
        }
    }
}
