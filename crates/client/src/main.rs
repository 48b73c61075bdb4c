//! `hybrid-unwrap` — client binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging on stderr.
//! 3. Build the HTTP transport.
//! 4. Run the pipeline and print the plaintext to stdout.
//!
//! The exit code identifies the failing stage; see [`common::ClientError::exit_code`].

use std::process::ExitCode;

use hybrid_unwrap::config::Config;
use hybrid_unwrap::transport::HttpTransport;
use hybrid_unwrap::{telemetry, HybridUnwrapClient};
use tracing::{error, info};

/// Telemetry could not be initialised.
const EXIT_STARTUP: u8 = 1;
/// Configuration is missing or invalid.
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Telemetry is not yet up; write to stderr directly.
            eprintln!("ERROR: configuration invalid: {e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    if let Err(e) = telemetry::init(&cfg.log_level) {
        eprintln!("ERROR: {e:#}");
        return ExitCode::from(EXIT_STARTUP);
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %cfg.endpoint_url,
        timeout_secs = cfg.request_timeout_secs,
        "hybrid-unwrap starting"
    );

    // -----------------------------------------------------------------------
    // 3. Transport + 4. Pipeline
    // -----------------------------------------------------------------------
    let outcome = match HttpTransport::new(&cfg) {
        Ok(transport) => HybridUnwrapClient::new(transport).run().await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(plaintext) => {
            println!("{}", String::from_utf8_lossy(&plaintext));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(stage = e.stage(), error = %e, "hybrid-unwrap failed");
            ExitCode::from(e.exit_code())
        }
    }
}
