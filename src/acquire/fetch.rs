use super::{CappedReadError, read_capped};
use crate::config::{FetchConfig, Limits};
use crate::error::ScanError;
use reqwest::header::CONNECTION;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, info};

/// Turn user input into a fetchable URL.
///
/// Trims whitespace and assumes `http://` when no `http://` or `https://`
/// scheme is given. Input that already names another scheme (`ftp://...`)
/// is rejected rather than prefixed. Only http(s) URLs with a host are
/// accepted.
pub fn normalize_url(raw: &str) -> Result<Url, ScanError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid_source("URL was empty"));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if let Some(scheme) = foreign_scheme(trimmed) {
        return Err(invalid_source(format!("unsupported scheme {scheme} in {trimmed}")));
    } else {
        format!("http://{trimmed}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| invalid_source(format!("URL was not valid: {candidate}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid_source(format!("unsupported scheme in {candidate}")));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid_source(format!("no host in {candidate}")));
    }
    Ok(url)
}

/// The `scheme` of a leading `scheme://`, if the input has one
fn foreign_scheme(input: &str) -> Option<&str> {
    let (scheme, _) = input.split_once("://")?;
    let mut chars = scheme.chars();
    let well_formed = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    well_formed.then_some(scheme)
}

/// Remote image fetcher.
///
/// Holds one connection-pooling client, safe to share between requests. Each
/// fetch asks the server to close the connection, and dropping the response
/// on any early return tears it down.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    limits: Limits,
    read_timeout: Duration,
}

impl Fetcher {
    /// Build the shared client
    pub fn new(config: FetchConfig, limits: Limits) -> reqwest::Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("rust_qr_web/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            limits,
            read_timeout: config.read_timeout,
        })
    }

    /// Fetch the image behind `raw`, bounded by the byte cap and timeouts
    pub async fn fetch(&self, raw: &str) -> Result<Vec<u8>, ScanError> {
        let url = normalize_url(raw)?;

        let request = self.client.get(url.clone()).header(CONNECTION, "close");
        let response = tokio::time::timeout(self.read_timeout, request.send())
            .await
            .map_err(|_| invalid_source(format!("no response from {url} within {:?}", self.read_timeout)))?
            .map_err(|e| invalid_source(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(invalid_source(format!("unsuccessful return code {status} from {url}")));
        }

        let declared = response.content_length();
        if declared.is_some_and(|len| len > self.limits.max_image_size) {
            debug!(%url, ?declared, "declared length too large");
        } else {
            info!(%url, "Decoding");
        }

        read_capped(
            response.bytes_stream(),
            declared,
            self.limits.max_image_size,
            self.read_timeout,
        )
        .await
        .map_err(|e| match e {
            CappedReadError::DeclaredTooLarge { .. } | CappedReadError::StreamTooLarge { .. } => {
                ScanError::TooLarge(e.to_string())
            }
            CappedReadError::TimedOut(_) | CappedReadError::Stream(_) => {
                invalid_source(format!("reading {url}: {e}"))
            }
        })
    }
}

fn invalid_source(detail: impl Into<String>) -> ScanError {
    let detail = detail.into();
    debug!(%detail, "rejecting source");
    ScanError::InvalidSource(detail)
}
