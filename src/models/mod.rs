/// Validated pixel image and admission bounds
pub mod image;
/// Binarized matrix
pub mod matrix;
/// Decoded payloads
pub mod payload;

pub use self::image::{PixelImage, check_dimensions};
pub use matrix::BitMatrix;
pub use payload::{Corner, PayloadResult, Symbology};
