//! Source acquisition: remote fetch and form upload
//!
//! Both origins end in [`read_capped`], which enforces the byte cap on the
//! declared length first and then on the bytes actually read. A stream that
//! goes over the cap is dropped on the spot, which releases the underlying
//! connection.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

pub mod fetch;
pub mod upload;

pub use fetch::{Fetcher, normalize_url};
pub use upload::read_first_file_part;

/// Why a capped read stopped early
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CappedReadError {
    /// The source declared more bytes than the cap allows
    #[error("declared length {declared} exceeds {limit} bytes")]
    DeclaredTooLarge { declared: u64, limit: u64 },

    /// More bytes arrived than the cap allows
    #[error("stream exceeded {limit} bytes")]
    StreamTooLarge { limit: u64 },

    /// No chunk arrived within the read timeout
    #[error("read timed out after {0:?}")]
    TimedOut(Duration),

    /// The underlying stream failed
    #[error("stream error: {0}")]
    Stream(String),
}

/// Buffer a byte stream, refusing to hold more than `limit` bytes.
///
/// A declared length over the cap fails before the stream is polled at all.
/// Each chunk must arrive within `read_timeout`.
pub async fn read_capped<S, E>(
    stream: S,
    declared: Option<u64>,
    limit: u64,
    read_timeout: Duration,
) -> Result<Vec<u8>, CappedReadError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    if let Some(declared) = declared {
        if declared > limit {
            return Err(CappedReadError::DeclaredTooLarge { declared, limit });
        }
    }

    let mut stream = std::pin::pin!(stream);
    let initial = declared.unwrap_or(0).min(limit) as usize;
    let mut buffer = Vec::with_capacity(initial);

    loop {
        let next = tokio::time::timeout(read_timeout, stream.next())
            .await
            .map_err(|_| CappedReadError::TimedOut(read_timeout))?;
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(|e| CappedReadError::Stream(e.to_string()))?;
        if buffer.len() as u64 + chunk.len() as u64 > limit {
            return Err(CappedReadError::StreamTooLarge { limit });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::convert::Infallible;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn chunks(sizes: &[usize]) -> impl Stream<Item = Result<Bytes, Infallible>> {
        let items: Vec<_> = sizes.iter().map(|&n| Ok(Bytes::from(vec![7u8; n]))).collect();
        stream::iter(items)
    }

    #[tokio::test]
    async fn test_reads_under_cap() {
        let bytes = read_capped(chunks(&[4, 4, 2]), Some(10), 10, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(bytes.len(), 10);
    }

    #[tokio::test]
    async fn test_declared_length_rejected_before_read() {
        let polled = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = polled.clone();
        let source = stream::poll_fn(move |_| {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            std::task::Poll::Ready(None::<Result<Bytes, Infallible>>)
        });

        let err = read_capped(source, Some(11), 10, TIMEOUT).await.unwrap_err();
        assert_eq!(
            err,
            CappedReadError::DeclaredTooLarge {
                declared: 11,
                limit: 10
            }
        );
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_undeclared_overflow_stops_stream() {
        let err = read_capped(chunks(&[6, 6]), None, 10, TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err, CappedReadError::StreamTooLarge { limit: 10 });
    }

    #[tokio::test]
    async fn test_lying_declared_length() {
        let err = read_capped(chunks(&[8, 8]), Some(5), 10, TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err, CappedReadError::StreamTooLarge { limit: 10 });
    }

    #[tokio::test]
    async fn test_stream_error_surfaces() {
        let source = stream::iter(vec![Ok(Bytes::from_static(b"ab")), Err("reset")]);
        let err = read_capped(source, None, 10, TIMEOUT).await.unwrap_err();
        assert_eq!(err, CappedReadError::Stream("reset".to_string()));
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out() {
        let source = stream::pending::<Result<Bytes, Infallible>>();
        let err = read_capped(source, None, 10, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, CappedReadError::TimedOut(_)));
    }
}
