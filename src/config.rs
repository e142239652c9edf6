//! Configuration types for the service and CLI.

use crate::{FETCH_TIMEOUT, MAX_IMAGE_SIZE, MAX_PIXELS};
use std::time::Duration;

/// Size bounds enforced on every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest accepted byte stream
    pub max_image_size: u64,
    /// Largest accepted `width * height`
    pub max_pixels: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_image_size: MAX_IMAGE_SIZE,
            max_pixels: MAX_PIXELS,
        }
    }
}

/// Remote fetch settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Bound on waiting for the response head and on each body read
    pub read_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: FETCH_TIMEOUT,
            read_timeout: FETCH_TIMEOUT,
        }
    }
}

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Size bounds for every request
    pub limits: Limits,
    /// Remote fetch timeouts
    pub fetch: FetchConfig,
    /// Tokio worker threads; `None` uses one per CPU
    pub workers: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            limits: Limits::default(),
            fetch: FetchConfig::default(),
            workers: None,
        }
    }
}
