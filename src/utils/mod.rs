//! Utility functions for image processing
//!
//! This module provides helpers for the decode cascade:
//! - Grayscale conversion (the luminance adapter)
//! - Binarization (Otsu histogram threshold and local-mean adaptive)
//! - Logging setup for the binaries

pub mod binarization;
pub mod grayscale;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Honours `RUST_LOG`; defaults to `info`. Calling it twice is harmless, the
/// second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
