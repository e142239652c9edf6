//! Image validation: bytes to a dimension-checked [`PixelImage`].

use crate::error::ScanError;
use crate::models::{PixelImage, check_dimensions};
use image::io::{Limits as CodecLimits, Reader as ImageReader};
use std::io::Cursor;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::debug;

/// Bytes-to-pixels capability.
///
/// Every failure, whatever its cause inside the codec, comes back as
/// [`ScanError::InvalidImage`]; dimension violations come back as
/// [`ScanError::TooLarge`].
pub trait ImageCodec: Send + Sync {
    /// Decode `bytes`, admitting at most `max_pixels` pixels
    fn decode_bytes(&self, bytes: &[u8], max_pixels: u64) -> Result<PixelImage, ScanError>;
}

/// Codec backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCrateCodec {
    /// Create a codec
    pub fn new() -> Self {
        Self
    }
}

impl ImageCodec for ImageCrateCodec {
    fn decode_bytes(&self, bytes: &[u8], max_pixels: u64) -> Result<PixelImage, ScanError> {
        // Header first: reject oversized images before any pixel is decoded.
        let (width, height) = guessed_reader(bytes)?
            .into_dimensions()
            .map_err(|e| invalid(format!("unreadable header: {e}")))?;
        check_dimensions(width, height, max_pixels)?;

        let mut reader = guessed_reader(bytes)?;
        let mut limits = CodecLimits::default();
        limits.max_image_width = Some(width);
        limits.max_image_height = Some(height);
        // RGBA at 16 bits per channel is the widest layout a codec may produce
        limits.max_alloc = Some(max_pixels.saturating_mul(8));
        reader.limits(limits);

        let decoded = catch_unwind(AssertUnwindSafe(move || reader.decode()))
            .map_err(|_| invalid("codec panicked"))?
            .map_err(|e| invalid(format!("decode failed: {e}")))?;

        PixelImage::new(decoded, max_pixels)
    }
}

fn guessed_reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, ScanError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| invalid(format!("format sniffing failed: {e}")))?;
    if reader.format().is_none() {
        return Err(invalid("unrecognized image format"));
    }
    Ok(reader)
}

fn invalid(detail: impl Into<String>) -> ScanError {
    let detail = detail.into();
    debug!(%detail, "rejecting image");
    ScanError::InvalidImage(detail)
}
