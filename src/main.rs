//! i2-config-export command-line entry point
//!
//! Exit codes: `0` on success, `2` for missing or invalid configuration, `1` for
//! any failure during the export.

use clap::Parser;
use i2_config_export::config::normalize_args;
use i2_config_export::{Config, ExportArgs, ToExitCode};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr, stdout carries the request audit trail only
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "i2_config_export=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = ExportArgs::parse_from(normalize_args(std::env::args_os()));

    let result = match Config::load(args) {
        Ok(config) => i2_config_export::run(&config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(kind = e.error_kind(), error = ?e, "export failed");
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
