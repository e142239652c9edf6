use crate::error::ScanError;
use image::DynamicImage;

/// A decoded image that has passed the dimension gate.
///
/// Only [`PixelImage::new`] builds one, so holding a `PixelImage` means
/// `width > 1`, `height > 1` and `width * height <= max_pixels` held at the
/// time it was created.
#[derive(Debug, Clone)]
pub struct PixelImage {
    image: DynamicImage,
}

impl PixelImage {
    /// Wrap a decoded image, rejecting degenerate or oversized dimensions
    pub fn new(image: DynamicImage, max_pixels: u64) -> Result<Self, ScanError> {
        check_dimensions(image.width(), image.height(), max_pixels)?;
        Ok(Self { image })
    }

    /// Image width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Total pixel count
    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Borrow the underlying decoded image
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }
}

/// Admission check on image dimensions.
///
/// Decode cost grows with pixel count, so this runs before any decoding work
/// and again after the codec has produced pixels.
pub fn check_dimensions(width: u32, height: u32, max_pixels: u64) -> Result<(), ScanError> {
    if width <= 1 || height <= 1 {
        return Err(ScanError::TooLarge(format!(
            "degenerate dimensions {width}x{height}"
        )));
    }
    let pixels = width as u64 * height as u64;
    if pixels > max_pixels {
        return Err(ScanError::TooLarge(format!(
            "dimensions {width}x{height} exceed {max_pixels} pixels"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_PIXELS;

    #[test]
    fn test_pixel_boundary() {
        assert!(check_dimensions(2048, 1024, MAX_PIXELS).is_ok());
        // 3 * 699_051 == 2^21 + 1
        assert!(matches!(
            check_dimensions(3, 699_051, MAX_PIXELS),
            Err(ScanError::TooLarge(_))
        ));
    }

    #[test]
    fn test_degenerate_dimensions() {
        assert!(check_dimensions(1, 500, MAX_PIXELS).is_err());
        assert!(check_dimensions(500, 1, MAX_PIXELS).is_err());
        assert!(check_dimensions(2, 2, MAX_PIXELS).is_ok());
    }

    #[test]
    fn test_new_wraps_valid_image() {
        let image = DynamicImage::new_luma8(4, 3);
        let pixel_image = PixelImage::new(image, MAX_PIXELS).unwrap();
        assert_eq!(pixel_image.pixel_count(), 12);
    }
}
