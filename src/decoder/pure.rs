use super::{Diagnostic, FailureKind};
use crate::models::BitMatrix;

/// Quiet zone width, in modules, re-added around a cropped pure symbol
const QUIET_ZONE_MODULES: usize = 4;

/// Largest width/height ratio still treated as a square symbol
const MAX_ASPECT: f32 = 1.25;

/// Modules across the smallest QR symbol (version 1)
const MIN_SYMBOL_MODULES: usize = 21;

/// A cropped and re-padded frame
#[derive(Debug, Clone)]
pub struct PureFrame {
    /// Normalised matrix
    pub bits: BitMatrix,
    /// Column of the normalised matrix's origin in the source matrix
    pub origin_x: i32,
    /// Row of the normalised matrix's origin in the source matrix
    pub origin_y: i32,
}

/// Normalise a frame that holds a single symbol and nothing else.
///
/// Crops to the dark content, estimates the module size from the finder
/// pattern in the top-left corner, and pads the crop with a clean quiet zone
/// so the detector sees a textbook symbol regardless of how the image was
/// framed.
pub fn normalize_pure_frame(bits: &BitMatrix) -> Result<PureFrame, Diagnostic> {
    let (left, top, right, bottom) = bits
        .dark_bounds()
        .ok_or_else(|| Diagnostic::new(FailureKind::NotFound, "frame is blank"))?;

    let width = right - left + 1;
    let height = bottom - top + 1;
    let aspect = width.max(height) as f32 / width.min(height) as f32;
    if aspect > MAX_ASPECT {
        return Err(Diagnostic::new(
            FailureKind::NotFound,
            format!("content {width}x{height} is not square"),
        ));
    }

    // A module can be no wider than the smallest symbol allows, which keeps
    // the padded frame under twice the area of the content.
    let max_module = (width.min(height) / MIN_SYMBOL_MODULES).max(1);
    let module = estimate_module_size(bits, left, top, right, bottom).min(max_module);
    let margin = module * QUIET_ZONE_MODULES;

    let normalized = BitMatrix::from_fn(width + 2 * margin, height + 2 * margin, |x, y| {
        if x < margin || y < margin || x >= margin + width || y >= margin + height {
            return false;
        }
        bits.get(left + x - margin, top + y - margin)
    });

    Ok(PureFrame {
        bits: normalized,
        origin_x: left as i32 - margin as i32,
        origin_y: top as i32 - margin as i32,
    })
}

/// Length of the first dark run on the diagonal from the top-left corner.
/// For a QR symbol that run crosses the finder pattern's outer ring, which is
/// one module thick.
fn estimate_module_size(
    bits: &BitMatrix,
    left: usize,
    top: usize,
    right: usize,
    bottom: usize,
) -> usize {
    let mut run = 0;
    while left + run <= right && top + run <= bottom && bits.get(left + run, top + run) {
        run += 1;
    }
    run.max(1)
}
