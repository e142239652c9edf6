use super::grayscale::SamplingSurface;
use crate::models::BitMatrix;

/// Default adaptive window, in pixels (odd, centred on the sample)
pub const ADAPTIVE_WINDOW: usize = 31;

/// A sample must sit this far below its local mean to count as dark.
/// Keeps flat regions light instead of salt-and-pepper noise.
const ADAPTIVE_BIAS: u32 = 5;

/// Binarize with one global threshold picked by Otsu's method on the
/// luminance histogram. Cheap, but gradients in lighting defeat it.
/// Returns a BitMatrix where true = black, false = white
pub fn histogram_binarize(surface: &SamplingSurface) -> BitMatrix {
    let threshold = calculate_otsu_threshold(surface.as_slice());
    threshold_binarize(surface, threshold)
}

/// Calculate Otsu's optimal threshold
fn calculate_otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total_pixels = gray.len() as f64;
    let total_sum: u64 = histogram
        .iter()
        .enumerate()
        .map(|(intensity, &count)| intensity as u64 * count)
        .sum();

    let mut max_variance = 0.0;
    let mut optimal_threshold = 128u8;
    let mut class1_pixels = 0u64;
    let mut class1_sum = 0u64;

    // class 1 holds every intensity strictly below `threshold`
    for threshold in 1..=255usize {
        class1_pixels += histogram[threshold - 1];
        class1_sum += (threshold as u64 - 1) * histogram[threshold - 1];
        let class2_pixels = gray.len() as u64 - class1_pixels;

        if class1_pixels == 0 || class2_pixels == 0 {
            continue;
        }

        let class1_mean = class1_sum as f64 / class1_pixels as f64;
        let class2_mean = (total_sum - class1_sum) as f64 / class2_pixels as f64;

        let weight1 = class1_pixels as f64 / total_pixels;
        let weight2 = class2_pixels as f64 / total_pixels;

        let variance = weight1 * weight2 * (class1_mean - class2_mean).powi(2);

        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = threshold as u8;
        }
    }

    optimal_threshold
}

/// Simple global threshold binarization
pub fn threshold_binarize(surface: &SamplingSurface, threshold: u8) -> BitMatrix {
    BitMatrix::from_fn(surface.width(), surface.height(), |x, y| {
        surface.sample(x, y) < threshold
    })
}

/// Binarize against the mean of a `window`-sized neighbourhood around each
/// sample, using an integral image so the cost is independent of the window.
///
/// More expensive than [`histogram_binarize`] but tolerant of uneven lighting.
/// Surfaces smaller than the window fall back to the global threshold, where
/// a local mean carries no information.
pub fn adaptive_binarize(surface: &SamplingSurface, window: usize) -> BitMatrix {
    let width = surface.width();
    let height = surface.height();
    if width < window || height < window {
        return histogram_binarize(surface);
    }

    let integral = integral_image(surface);
    let stride = width + 1;
    let radius = window / 2;

    BitMatrix::from_fn(width, height, |x, y| {
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = (x + radius + 1).min(width);
        let y1 = (y + radius + 1).min(height);

        let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
            - integral[y0 * stride + x1]
            - integral[y1 * stride + x0];
        let count = ((x1 - x0) * (y1 - y0)) as u64;
        let mean = (sum / count) as u32;

        (surface.sample(x, y) as u32) + ADAPTIVE_BIAS < mean
    })
}

/// Summed-area table with a zero first row and column
fn integral_image(surface: &SamplingSurface) -> Vec<u64> {
    let width = surface.width();
    let stride = width + 1;
    let mut integral = vec![0u64; stride * (surface.height() + 1)];

    for y in 0..surface.height() {
        let mut row_sum = 0u64;
        for (x, &v) in surface.row(y).iter().enumerate() {
            row_sum += v as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    integral
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(gray: Vec<u8>, width: usize, height: usize) -> SamplingSurface {
        SamplingSurface::from_luma(gray, width, height)
    }

    #[test]
    fn test_threshold_binarize() {
        let binary = threshold_binarize(&surface(vec![100, 150, 200, 50], 2, 2), 128);

        // Pixels < 128 should be black (true)
        assert!(binary.get(0, 0)); // 100 < 128
        assert!(!binary.get(1, 0)); // 150 >= 128
        assert!(!binary.get(0, 1)); // 200 >= 128
        assert!(binary.get(1, 1)); // 50 < 128
    }

    #[test]
    fn test_histogram_binarize() {
        // Create a simple two-class image
        let mut gray = vec![50u8; 50]; // Dark class
        gray.extend(vec![200u8; 50]); // Light class

        let binary = histogram_binarize(&surface(gray, 10, 10));

        // Top half should be black (true), bottom half white (false)
        assert!(binary.get(0, 0));
        assert!(!binary.get(0, 7));
    }

    #[test]
    fn test_adaptive_handles_gradient() {
        // Left-to-right lighting gradient with a dark dot every 8 columns.
        // A single global threshold cannot separate the dots at both ends.
        let (w, h) = (64, 40);
        let mut gray = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                let base = 60 + (x * 3) as u8;
                gray[y * w + x] = if x % 8 == 4 && y % 8 == 4 {
                    base - 50
                } else {
                    base
                };
            }
        }
        let s = surface(gray, w, h);
        let adaptive = adaptive_binarize(&s, 15);

        assert!(adaptive.get(4, 4));
        assert!(adaptive.get(60, 36));
        assert!(!adaptive.get(5, 4));
        assert!(!adaptive.get(59, 36));
    }

    #[test]
    fn test_adaptive_small_surface_falls_back() {
        let mut gray = vec![40u8; 8];
        gray.extend(vec![220u8; 8]);
        let s = surface(gray, 4, 4);
        assert_eq!(adaptive_binarize(&s, ADAPTIVE_WINDOW), histogram_binarize(&s));
    }
}
