//! qrweb - barcode decoding via CLI or HTTP server
//!
//! # Usage
//!
//! ## CLI Mode
//! ```bash
//! qrweb decode --url "example.com/qr.png"
//! qrweb decode --file code.png --full
//! ```
//!
//! ## Server Mode
//! ```bash
//! qrweb serve --port 8080
//! curl "http://localhost:8080/w/decode?u=example.com/qr.png"
//! ```

use clap::{Args, Parser, Subcommand};
use rust_qr_web::acquire::Fetcher;
use rust_qr_web::classify::{DisplayMode, Rendered, classify, render};
use rust_qr_web::{
    FetchConfig, Limits, MAX_IMAGE_SIZE, MAX_PIXELS, ScanError, Scanner, ServiceConfig,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "qrweb")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Barcode decoding via CLI or HTTP server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a single image and print the payloads
    Decode {
        /// URL of the image; `http://` is assumed when no scheme is given
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        url: Option<String>,

        /// Local image file
        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,

        /// Print the JSON report instead of one payload per line
        #[arg(long)]
        full: bool,

        #[command(flatten)]
        limits: LimitArgs,
    },
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, short, default_value = "8080", env = "QRWEB_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "QRWEB_HOST")]
        host: String,

        /// Number of worker threads (defaults to number of CPUs)
        #[arg(long, env = "QRWEB_WORKERS")]
        workers: Option<usize>,

        #[command(flatten)]
        limits: LimitArgs,
    },
}

#[derive(Args)]
struct LimitArgs {
    /// Largest accepted image in bytes
    #[arg(long = "max-image-size", env = "QRWEB_MAX_IMAGE_SIZE", default_value_t = MAX_IMAGE_SIZE)]
    max_image_size: u64,

    /// Largest accepted width * height
    #[arg(long = "max-pixels", env = "QRWEB_MAX_PIXELS", default_value_t = MAX_PIXELS)]
    max_pixels: u64,

    /// Connect and read timeout for remote fetches, in milliseconds
    #[arg(long = "fetch-timeout-ms", env = "QRWEB_FETCH_TIMEOUT_MS", default_value_t = 5000)]
    fetch_timeout_ms: u64,
}

impl LimitArgs {
    fn limits(&self) -> Limits {
        Limits {
            max_image_size: self.max_image_size,
            max_pixels: self.max_pixels,
        }
    }

    fn fetch(&self) -> FetchConfig {
        let timeout = Duration::from_millis(self.fetch_timeout_ms);
        FetchConfig {
            connect_timeout: timeout,
            read_timeout: timeout,
        }
    }
}

fn main() -> ExitCode {
    rust_qr_web::utils::init_tracing();

    let cli = Cli::parse();

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Commands::Serve {
        workers: Some(workers),
        ..
    } = &cli.command
    {
        if *workers > 0 {
            builder.worker_threads(*workers);
        }
    }
    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli.command)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<ExitCode, BoxError> {
    match command {
        Commands::Decode {
            url,
            file,
            full,
            limits,
        } => {
            let bytes = match (url, file) {
                (Some(url), _) => {
                    info!("Processing URL: {}", url);
                    Fetcher::new(limits.fetch(), limits.limits())?.fetch(&url).await
                }
                (None, Some(file)) => {
                    info!("Processing file: {}", file.display());
                    read_file(&file, &limits.limits()).await
                }
                (None, None) => {
                    eprintln!("Error: Either --url or --file must be provided");
                    return Ok(ExitCode::FAILURE);
                }
            };

            let scanner = Scanner::with_limits(limits.limits());
            let outcome = match bytes {
                Ok(bytes) => tokio::task::spawn_blocking(move || scanner.scan_bytes(&bytes)).await?,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(decoded) => {
                    match render(decoded, DisplayMode::from_full_flag(full)) {
                        Rendered::Plain(body) => print!("{body}"),
                        Rendered::Full(report) => {
                            println!("{}", serde_json::to_string_pretty(&report)?)
                        }
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}: {e}", classify(&e));
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Serve {
            port,
            host,
            workers,
            limits,
        } => {
            let config = ServiceConfig {
                host,
                port,
                limits: limits.limits(),
                fetch: limits.fetch(),
                workers,
            };

            info!("Starting server on {}:{}", config.host, config.port);
            rust_qr_web::server::run_server(config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn read_file(path: &Path, limits: &Limits) -> Result<Vec<u8>, ScanError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ScanError::InvalidSource(format!("{}: {e}", path.display())))?;
    if metadata.len() > limits.max_image_size {
        return Err(ScanError::TooLarge(format!(
            "{} is {} bytes, limit {}",
            path.display(),
            metadata.len(),
            limits.max_image_size
        )));
    }
    tokio::fs::read(path)
        .await
        .map_err(|e| ScanError::InvalidSource(format!("{}: {e}", path.display())))
}
