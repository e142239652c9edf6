//! rust_qr_web - barcode decoding service
//!
//! Takes an image fetched from a URL or uploaded in a form, and runs it
//! through a bounded pipeline:
//! 1. acquisition with a byte cap ([`acquire`])
//! 2. image validation with a pixel cap ([`codec`])
//! 3. luminance conversion and a four-step decode cascade ([`pipeline`])
//! 4. classification into payload text or a failure signal ([`classify`])
//!
//! The pipeline itself is synchronous and free of I/O; [`Scanner`] is the
//! entry point for callers that already hold the bytes.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Source acquisition (remote fetch, multipart upload)
pub mod acquire;
/// Outcome classification and rendering
pub mod classify;
/// Image validation
pub mod codec;
/// Service configuration
pub mod config;
/// Decoder capability, attempt configuration and diagnostics
pub mod decoder;
/// Request-level errors
pub mod error;
/// Core data structures (PixelImage, BitMatrix, PayloadResult)
pub mod models;
/// Decode cascade
pub mod pipeline;
/// HTTP surface
pub mod server;
/// Utility functions (grayscale, binarization, logging)
pub mod utils;

use std::time::Duration;

pub use classify::{DecodeReport, DisplayMode, FailureSignal, classify};
pub use codec::{ImageCodec, ImageCrateCodec};
pub use config::{FetchConfig, Limits, ServiceConfig};
pub use decoder::{DecodeAttemptConfig, DecodeProfiles, Decoder, Diagnostic, FailureKind, QrDecoder};
pub use error::ScanError;
pub use models::{BitMatrix, PayloadResult, PixelImage, Symbology};
pub use pipeline::{CascadeStage, Decoded, run_cascade};

use utils::grayscale::SamplingSurface;

/// Largest accepted image, in bytes
pub const MAX_IMAGE_SIZE: u64 = 2_000_000;

/// Largest accepted `width * height`
pub const MAX_PIXELS: u64 = 1 << 21;

/// Connect and read timeout for remote fetches
pub const FETCH_TIMEOUT: Duration = Duration::from_millis(5000);

/// Validate-and-decode pipeline
///
/// Holds the codec, the decoder and the two decode profiles, all immutable
/// once built, so one scanner can be shared by every request worker.
///
/// # Example
/// ```no_run
/// use rust_qr_web::Scanner;
///
/// let bytes = std::fs::read("code.png").unwrap();
/// let decoded = Scanner::new().scan_bytes(&bytes).unwrap();
/// for payload in &decoded.payloads {
///     println!("{}", payload.text);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Scanner<C = ImageCrateCodec, D = QrDecoder> {
    codec: C,
    decoder: D,
    profiles: DecodeProfiles,
    limits: Limits,
}

impl Scanner {
    /// Create a scanner with the built-in codec, QR decoder and default limits
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create a scanner with the built-in codec and QR decoder
    pub fn with_limits(limits: Limits) -> Self {
        Self::with_parts(ImageCrateCodec::new(), QrDecoder::new(), limits)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ImageCodec, D: Decoder> Scanner<C, D> {
    /// Assemble a scanner from its collaborators
    pub fn with_parts(codec: C, decoder: D, limits: Limits) -> Self {
        Self {
            codec,
            decoder,
            profiles: DecodeProfiles::default(),
            limits,
        }
    }

    /// Size bounds this scanner enforces
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Validate `bytes` as an image and run the cascade on it
    pub fn scan_bytes(&self, bytes: &[u8]) -> Result<Decoded, ScanError> {
        if bytes.len() as u64 > self.limits.max_image_size {
            return Err(ScanError::TooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.limits.max_image_size
            )));
        }
        let image = self.codec.decode_bytes(bytes, self.limits.max_pixels)?;
        self.scan_image(&image)
    }

    /// Run the cascade on an already validated image
    pub fn scan_image(&self, image: &PixelImage) -> Result<Decoded, ScanError> {
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            pixels = image.pixel_count(),
            "image admitted"
        );
        let surface = SamplingSurface::from_image(image);
        Ok(run_cascade(&surface, &self.decoder, &self.profiles)?)
    }
}

/// Decode barcodes in an encoded image with default settings
pub fn decode_bytes(bytes: &[u8]) -> Result<Decoded, ScanError> {
    Scanner::new().scan_bytes(bytes)
}
