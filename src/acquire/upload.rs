use super::{CappedReadError, read_capped};
use crate::config::Limits;
use crate::error::ScanError;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::http::header::CONTENT_LENGTH;
use std::time::Duration;
use tracing::{debug, info};

/// Buffer the first file part of a multipart form.
///
/// Parts without a file name are plain form fields and are skipped. Parts
/// after the first file are never read. The part's own `Content-Length`, when
/// the client sent one, is checked before the body is touched.
pub async fn read_first_file_part(
    multipart: &mut Multipart,
    limits: &Limits,
    read_timeout: Duration,
) -> Result<Vec<u8>, ScanError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(invalid_image("form carried no file part")),
            Err(e) => return Err(from_multipart(e)),
        };
        if field.file_name().is_none() {
            debug!(name = ?field.name(), "skipping form field");
            continue;
        }

        let declared = field
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        if let Some(declared) = declared {
            if declared > limits.max_image_size {
                debug!(declared, "uploaded file too large");
            } else {
                info!("Decoding uploaded file");
            }
        } else {
            info!("Decoding uploaded file");
        }

        return read_capped(field, declared, limits.max_image_size, read_timeout)
            .await
            .map_err(|e| match e {
                CappedReadError::DeclaredTooLarge { .. } | CappedReadError::StreamTooLarge { .. } => {
                    ScanError::TooLarge(e.to_string())
                }
                CappedReadError::TimedOut(_) | CappedReadError::Stream(_) => {
                    invalid_image(format!("reading upload: {e}"))
                }
            });
    }
}

fn from_multipart(e: MultipartError) -> ScanError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        debug!(error = %e, "upload body over limit");
        ScanError::TooLarge(e.body_text())
    } else {
        invalid_image(format!("malformed multipart body: {}", e.body_text()))
    }
}

fn invalid_image(detail: impl Into<String>) -> ScanError {
    let detail = detail.into();
    debug!(%detail, "rejecting upload");
    ScanError::InvalidImage(detail)
}
