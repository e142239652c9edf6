//! Luminance adapter: pixel image to grayscale sampling surface
//!
//! Y = 0.299*R + 0.587*G + 0.114*B, in fast integer arithmetic:
//! Y = (76*R + 150*G + 29*B) >> 8
//!
//! Transparent pixels are composited onto white so that a symbol drawn on a
//! transparent background reads as dark-on-light.

use crate::models::PixelImage;
use image::DynamicImage;
use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Below this pixel count conversion stays on the calling thread
const PARALLEL_MIN_PIXELS: usize = 256 * 256;

/// Read-only grayscale view of a [`PixelImage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingSurface {
    width: usize,
    height: usize,
    luma: Vec<u8>,
}

impl SamplingSurface {
    /// Wrap raw luminance samples, row-major
    pub fn from_luma(luma: Vec<u8>, width: usize, height: usize) -> Self {
        debug_assert_eq!(luma.len(), width * height);
        Self {
            width,
            height,
            luma,
        }
    }

    /// Convert a validated image
    pub fn from_image(image: &PixelImage) -> Self {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let luma = match image.as_dynamic() {
            DynamicImage::ImageLuma8(gray) => gray.as_raw().clone(),
            DynamicImage::ImageRgb8(rgb) => rgb_to_grayscale(rgb.as_raw(), width, height),
            other => rgba_to_grayscale(other.to_rgba8().as_raw(), width, height),
        };
        Self::from_luma(luma, width, height)
    }

    /// Surface width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Surface height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Luminance at (x, y)
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        self.luma[y * self.width + x]
    }

    /// One row of samples
    pub fn row(&self, y: usize) -> &[u8] {
        &self.luma[y * self.width..(y + 1) * self.width]
    }

    /// All samples, row-major
    pub fn as_slice(&self) -> &[u8] {
        &self.luma
    }
}

#[inline]
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

/// Convert RGB image to grayscale
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let mut gray = vec![0u8; width * height];
    let convert_row = |(y, row): (usize, &mut [u8])| {
        let row_start = y * width * 3;
        for (x, out) in row.iter_mut().enumerate() {
            let idx = row_start + x * 3;
            *out = luminance(rgb[idx], rgb[idx + 1], rgb[idx + 2]);
        }
    };

    if width * height >= PARALLEL_MIN_PIXELS {
        gray.par_chunks_mut(width).enumerate().for_each(convert_row);
    } else {
        gray.chunks_mut(width).enumerate().for_each(convert_row);
    }
    gray
}

/// Convert RGBA image to grayscale, compositing onto white by alpha
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let mut gray = vec![0u8; width * height];
    let convert_row = |(y, row): (usize, &mut [u8])| {
        let row_start = y * width * 4;
        for (x, out) in row.iter_mut().enumerate() {
            let idx = row_start + x * 4;
            let lum = luminance(rgba[idx], rgba[idx + 1], rgba[idx + 2]) as u32;
            let alpha = rgba[idx + 3] as u32;
            *out = ((lum * alpha + 255 * (255 - alpha)) / 255) as u8;
        }
    };

    if width * height >= PARALLEL_MIN_PIXELS {
        gray.par_chunks_mut(width).enumerate().for_each(convert_row);
    } else {
        gray.chunks_mut(width).enumerate().for_each(convert_row);
    }
    gray
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_PIXELS;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_rgb_to_grayscale() {
        // Pure white
        let gray = rgb_to_grayscale(&[255, 255, 255], 1, 1);
        assert!(gray[0] >= 254);

        // Pure black
        let gray = rgb_to_grayscale(&[0, 0, 0], 1, 1);
        assert_eq!(gray[0], 0);

        // Pure green weighs most
        let gray = rgb_to_grayscale(&[0, 255, 0], 1, 1);
        assert!(gray[0] > 100);

        // 2x2 image
        let img = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        assert_eq!(rgb_to_grayscale(&img, 2, 2).len(), 4);
    }

    #[test]
    fn test_transparent_reads_as_white() {
        let rgba = vec![0, 0, 0, 0, 0, 0, 0, 255];
        let gray = rgba_to_grayscale(&rgba, 2, 1);
        assert_eq!(gray, vec![255, 0]);
    }

    #[test]
    fn test_surface_from_image() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let image = PixelImage::new(DynamicImage::ImageRgba8(img), MAX_PIXELS).unwrap();

        let surface = SamplingSurface::from_image(&image);
        assert_eq!((surface.width(), surface.height()), (3, 2));
        assert_eq!(surface.sample(1, 1), 0);
        assert_eq!(surface.row(0), &[254, 254, 254][..]);
    }
}
