//! # i2-config-export
//!
//! Snapshot the config packages of a monitoring system's configuration API into
//! local JSON files, one per package.
//!
//! ## Pipeline
//!
//! The export is a single linear pass, one request at a time:
//! - list all config packages
//! - list the active stage of each package that has one
//! - fetch every file nested below a stage directory
//! - write `<escaped package name>.json` holding `{"files": {path: content}}`
//!
//! Any failure aborts the whole run; bundles written before the failure are
//! left on disk.
//!
//! ## Quick Start
//!
//! ```no_run
//! use i2_config_export::{Config, ExportArgs};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let args = ExportArgs {
//!         host: "10.0.0.5".to_string(),
//!         port: 5665,
//!         ca: "/var/lib/icinga2/certs/ca.crt".into(),
//!         cn: "master1.example.com".to_string(),
//!         user: "root".to_string(),
//!         output_dir: ".".into(),
//!     };
//!     let config = Config::from_args(args, Some("secret".to_string()))?;
//!
//!     let summary = i2_config_export::run(&config).await?;
//!     println!("wrote {} bundles", summary.bundles.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration-management API client
pub mod api;
/// Command-line and environment configuration
pub mod config;
/// Error types
pub mod error;
/// Export driver and bundle writer
pub mod export;
/// HTTPS client construction
pub mod tls;
/// Request execution capability and audit logging
pub mod transport;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use api::{ApiClient, Package, RequestTemplate, Sink, StageFile};
pub use config::{Config, ExportArgs};
pub use error::{Error, Result, ToExitCode};
pub use export::{Bundle, ExportSummary, Exporter};
pub use transport::{AuditLog, Transport};

/// Run a complete export for `config`
///
/// Builds the TLS client, prints every request to standard output and writes
/// the bundles into [`Config::output_dir`].
pub async fn run(config: &Config) -> Result<ExportSummary> {
    let client = tls::build_http_client(config).await?;
    let api = ApiClient::from_config(AuditLog::stdout(client), config)?;

    tracing::info!(
        host = %config.host,
        port = config.port,
        server_name = %config.server_name,
        output_dir = %config.output_dir.display(),
        "starting export"
    );

    Exporter::new(api, config.output_dir.clone()).run().await
}
