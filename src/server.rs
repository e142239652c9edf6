//! HTTP server for barcode decoding.
//!
//! `GET /w/decode?u=<url>` fetches and decodes a remote image, `POST
//! /w/decode` decodes the first file of a multipart form. Adding `full` to
//! the query selects the JSON report. Failures redirect to one of the
//! `/w/<signal>` pages.

use crate::acquire::{Fetcher, read_first_file_part};
use crate::classify::{DisplayMode, FailureSignal, Rendered, classify, render};
use crate::config::ServiceConfig;
use crate::decoder::Diagnostic;
use crate::error::ScanError;
use crate::pipeline::Decoded;
use crate::Scanner;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{MethodRouter, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Room for multipart boundaries and part headers on top of the image cap
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Debug)]
pub struct AppState {
    scanner: Arc<Scanner>,
    fetcher: Fetcher,
    read_timeout: Duration,
}

impl AppState {
    /// Build the scanner and the shared HTTP client
    pub fn new(config: &ServiceConfig) -> reqwest::Result<Self> {
        Ok(Self {
            scanner: Arc::new(Scanner::with_limits(config.limits)),
            fetcher: Fetcher::new(config.fetch, config.limits)?,
            read_timeout: config.fetch.read_timeout,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DecodeQuery {
    u: Option<String>,
    full: Option<String>,
}

impl DecodeQuery {
    fn mode(&self) -> DisplayMode {
        DisplayMode::from_full_flag(self.full.is_some())
    }

    /// A query that does not parse (e.g. a repeated `u`) is a bad URL
    fn accept(query: Result<Query<Self>, QueryRejection>) -> Result<Self, Response> {
        query.map(|Query(query)| query).map_err(|rejection| {
            debug!(%rejection, "malformed query");
            redirect(FailureSignal::BadUrl)
        })
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Build the router over `state`
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit =
        usize::try_from(state.scanner.limits().max_image_size).unwrap_or(usize::MAX);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/w/decode",
            get(fetch_handler)
                .post(upload_handler)
                .layer(DefaultBodyLimit::max(upload_limit.saturating_add(MULTIPART_OVERHEAD))),
        )
        .route("/w/badurl", failure_page(FailureSignal::BadUrl))
        .route("/w/badimage", failure_page(FailureSignal::BadImage))
        .route("/w/notfound", failure_page(FailureSignal::NotFound))
        .route("/w/format", failure_page(FailureSignal::Format))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until Ctrl+C or SIGTERM
pub async fn run_server(
    config: ServiceConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = Arc::new(AppState::new(&config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Server listening on http://{}", listener.local_addr()?);
    info!(
        max_image_size = config.limits.max_image_size,
        max_pixels = config.limits.max_pixels,
        "Limits"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Fetch mode
async fn fetch_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DecodeQuery>, QueryRejection>,
) -> Response {
    let query = match DecodeQuery::accept(query) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let mode = query.mode();
    let Some(raw) = query.u.filter(|u| !u.trim().is_empty()) else {
        debug!("missing u parameter");
        return redirect(FailureSignal::BadUrl);
    };

    let outcome = match state.fetcher.fetch(&raw).await {
        Ok(bytes) => scan(&state, bytes).await,
        Err(e) => Err(e),
    };
    respond(outcome, mode)
}

/// Upload mode
async fn upload_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DecodeQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mode = match DecodeQuery::accept(query) {
        Ok(query) => query.mode(),
        Err(response) => return response,
    };
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!(%rejection, "not a multipart request");
            return redirect(FailureSignal::BadImage);
        }
    };

    let outcome = match read_first_file_part(
        &mut multipart,
        state.scanner.limits(),
        state.read_timeout,
    )
    .await
    {
        Ok(bytes) => scan(&state, bytes).await,
        Err(e) => Err(e),
    };
    respond(outcome, mode)
}

/// Validate and decode off the async workers
async fn scan(state: &AppState, bytes: Vec<u8>) -> Result<Decoded, ScanError> {
    let scanner = Arc::clone(&state.scanner);
    match tokio::task::spawn_blocking(move || scanner.scan_bytes(&bytes)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "scan worker failed");
            Err(Diagnostic::not_found().into())
        }
    }
}

fn respond(outcome: Result<Decoded, ScanError>, mode: DisplayMode) -> Response {
    match outcome {
        Ok(decoded) => match render(decoded, mode) {
            Rendered::Plain(body) => {
                ([(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
            }
            Rendered::Full(report) => Json(report).into_response(),
        },
        Err(e) => redirect(classify(&e)),
    }
}

fn redirect(signal: FailureSignal) -> Response {
    Redirect::to(signal.path()).into_response()
}

fn failure_page(signal: FailureSignal) -> MethodRouter<Arc<AppState>> {
    get(move || async move { signal.message() })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown..."),
    }
}
