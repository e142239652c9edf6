use super::pure::normalize_pure_frame;
use super::{DecodeAttemptConfig, Decoder, Diagnostic, FailureKind};
use crate::models::{BitMatrix, Corner, PayloadResult, Symbology};
use rqrr::{DeQRError, PreparedImage};
use tracing::trace;

/// QR decoder backed by `rqrr`.
///
/// The matrix handed in is already binarized, so rqrr's own thresholding is
/// bypassed and the cascade's choice of binarizer is what rqrr sees.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl QrDecoder {
    /// Create a decoder
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for QrDecoder {
    fn decode_all(
        &self,
        bits: &BitMatrix,
        config: &DecodeAttemptConfig,
    ) -> Result<Vec<PayloadResult>, Diagnostic> {
        if !config.allows(Symbology::QrCode) {
            return Err(Diagnostic::new(
                FailureKind::NotFound,
                "QR code not in symbology scope",
            ));
        }
        let scan = scan_with_effort(bits, config, false, (0, 0));
        if scan.found.is_empty() {
            return Err(scan.into_diagnostic());
        }
        Ok(scan.found)
    }

    fn decode_one(
        &self,
        bits: &BitMatrix,
        config: &DecodeAttemptConfig,
    ) -> Result<PayloadResult, Diagnostic> {
        if !config.allows(Symbology::QrCode) {
            return Err(Diagnostic::new(
                FailureKind::NotFound,
                "QR code not in symbology scope",
            ));
        }

        let scan = if config.pure_symbol {
            let frame = normalize_pure_frame(bits)?;
            scan_with_effort(&frame.bits, config, true, (frame.origin_x, frame.origin_y))
        } else {
            scan_with_effort(bits, config, true, (0, 0))
        };

        match scan.found.into_iter().next() {
            Some(payload) => Ok(payload),
            None => Err(scan
                .diagnostic
                .unwrap_or_else(|| Diagnostic::new(FailureKind::NotFound, "no QR code located"))),
        }
    }
}

/// Outcome of scanning one matrix
struct Scan {
    found: Vec<PayloadResult>,
    diagnostic: Option<Diagnostic>,
}

impl Scan {
    fn into_diagnostic(self) -> Diagnostic {
        self.diagnostic
            .unwrap_or_else(|| Diagnostic::new(FailureKind::NotFound, "no QR code located"))
    }
}

fn scan_with_effort(
    bits: &BitMatrix,
    config: &DecodeAttemptConfig,
    first_only: bool,
    origin: (i32, i32),
) -> Scan {
    let scan = scan_matrix(bits, first_only, origin);
    if !scan.found.is_empty() || !config.try_harder {
        return scan;
    }

    trace!("retrying QR scan on inverted matrix");
    let inverted = scan_matrix(&bits.inverted(), first_only, origin);
    Scan {
        found: inverted.found,
        diagnostic: inverted.diagnostic.or(scan.diagnostic),
    }
}

fn scan_matrix(bits: &BitMatrix, first_only: bool, origin: (i32, i32)) -> Scan {
    let mut prepared =
        PreparedImage::prepare_from_bitmap(bits.width(), bits.height(), |x, y| bits.get(x, y));
    let grids = prepared.detect_grids();

    let mut found = Vec::new();
    let mut diagnostic = None;
    for grid in grids {
        match grid.decode() {
            Ok((meta, text)) => {
                let corners = grid
                    .bounds
                    .iter()
                    .map(|p| Corner {
                        x: p.x + origin.0,
                        y: p.y + origin.1,
                    })
                    .collect();
                found.push(PayloadResult {
                    text,
                    symbology: Symbology::QrCode,
                    version: Some(meta.version.0),
                    corners,
                });
                if first_only {
                    break;
                }
            }
            Err(err) => {
                trace!(error = ?err, "located QR grid failed to decode");
                diagnostic = Some(diagnose(err));
            }
        }
    }

    Scan { found, diagnostic }
}

/// Map rqrr's failure onto the three diagnostic kinds
fn diagnose(err: DeQRError) -> Diagnostic {
    match err {
        DeQRError::DataEcc => Diagnostic::checksum("data error correction failed"),
        DeQRError::FormatEcc
        | DeQRError::InvalidVersion
        | DeQRError::InvalidGridSize
        | DeQRError::UnknownDataType
        | DeQRError::DataOverflow
        | DeQRError::DataUnderflow => Diagnostic::format(format!("{err:?}")),
        other => Diagnostic::new(FailureKind::NotFound, format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_matrix_is_not_found() {
        let bits = BitMatrix::new(64, 64);
        let err = QrDecoder::new()
            .decode_all(&bits, &DecodeAttemptConfig::STANDARD)
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::NotFound);

        let err = QrDecoder::new()
            .decode_one(&bits, &DecodeAttemptConfig::PURE)
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::NotFound);
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(diagnose(DeQRError::DataEcc).kind, FailureKind::ChecksumInvalid);
        assert_eq!(diagnose(DeQRError::FormatEcc).kind, FailureKind::FormatInvalid);
        assert_eq!(diagnose(DeQRError::IoError).kind, FailureKind::NotFound);
    }

    #[test]
    fn test_out_of_scope_symbology() {
        let config = DecodeAttemptConfig {
            symbologies: &[],
            ..DecodeAttemptConfig::STANDARD
        };
        let err = QrDecoder::new()
            .decode_all(&BitMatrix::new(8, 8), &config)
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::NotFound);
    }
}
