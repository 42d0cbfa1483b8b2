//! Error types for i2-config-export
//!
//! Every failure in the export pipeline is fatal. Errors are propagated with `?`
//! up to the binary, which prints the message and exits with the code given by
//! [`ToExitCode`]:
//! - `2` for configuration problems detected before any network activity
//! - `1` for everything that can go wrong at runtime (CA loading, network,
//!   bad HTTP status, decoding, local I/O)

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for i2-config-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for i2-config-export
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid command-line flag or environment variable
    #[error("{message}")]
    Config {
        /// Human-readable error message (e.g. "-host missing")
        message: String,
        /// The flag or environment variable that caused the error
        key: Option<String>,
    },

    /// The CA bundle could not be read or contains no usable certificate
    #[error("failed to load CA bundle {}: {reason}", path.display())]
    CaLoad {
        /// Path of the CA bundle
        path: PathBuf,
        /// Why loading failed
        reason: String,
    },

    /// The API host name could not be resolved
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        /// Host that was looked up
        host: String,
        /// Port that was looked up
        port: u16,
        /// Underlying lookup error
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed from the TLS settings
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Transport-level failure (DNS, connect, TLS, reading the body)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with something other than 200 OK
    #[error("HTTP {status} from {url}")]
    BadStatus {
        /// Numeric HTTP status code
        status: u16,
        /// URL of the failed request
        url: String,
    },

    /// Malformed JSON in a response or unserializable request body
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A request path could not be turned into a URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Local I/O error (writing export bundles)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a configuration error naming the offending key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Returns `true` if this error was raised while validating configuration
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config { .. })
    }
}

/// Map errors to process exit codes
///
/// The binary is the only caller; library code never exits the process.
pub trait ToExitCode {
    /// Exit code to terminate the process with
    fn exit_code(&self) -> u8;

    /// Short machine-readable error kind, used as a structured log field
    fn error_kind(&self) -> &'static str;
}

impl ToExitCode for Error {
    fn exit_code(&self) -> u8 {
        match self {
            // 2 - Invalid or missing configuration, nothing was attempted yet
            Error::Config { .. } => 2,

            // 1 - Runtime failures
            Error::CaLoad { .. }
            | Error::Resolve { .. }
            | Error::ClientBuild(_)
            | Error::Network(_)
            | Error::BadStatus { .. }
            | Error::Serialization(_)
            | Error::InvalidUrl(_)
            | Error::Io(_) => 1,
        }
    }

    fn error_kind(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::CaLoad { .. } => "ca_load_error",
            Error::Resolve { .. } => "resolve_error",
            Error::ClientBuild(_) => "client_build_error",
            Error::Network(_) => "network_error",
            Error::BadStatus { .. } => "bad_status",
            Error::Serialization(_) => "decode_error",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Io(_) => "io_error",
        }
    }
}
