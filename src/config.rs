//! Configuration for i2-config-export
//!
//! Connection settings come from command-line flags, the API password from the
//! `I2_PASS` environment variable. Both are validated once at startup and
//! folded into a single immutable [`Config`] that is passed explicitly to every
//! component.

use crate::error::{Error, Result};
use clap::Parser;
use std::ffi::OsString;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;

/// Environment variable holding the Basic-Auth password
pub const PASSWORD_ENV: &str = "I2_PASS";

/// Default API port of the monitoring system
pub const DEFAULT_PORT: u16 = 5665;

/// Long flags that may also be spelled with a single dash (`-host`)
const SINGLE_DASH_FLAGS: &[&str] = &["host", "port", "ca", "cn", "user", "output-dir"];

/// Command-line flags
#[derive(Clone, Debug, Parser)]
#[command(name = "i2-config-export")]
#[command(
    about = "Export config packages from the monitoring API into one JSON file per package",
    long_about = None
)]
pub struct ExportArgs {
    /// API host to connect to
    #[arg(long, value_name = "HOST")]
    pub host: String,

    /// API port
    #[arg(long, value_name = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// PEM file with the CA certificate(s) the API certificate is verified against
    #[arg(long, value_name = "FILE")]
    pub ca: PathBuf,

    /// Server name expected in the API certificate
    #[arg(long, value_name = "COMMON_NAME")]
    pub cn: String,

    /// API user name
    #[arg(long, value_name = "USERNAME")]
    pub user: String,

    /// Directory the JSON bundles are written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

/// Validated connection and output settings
#[derive(Clone)]
pub struct Config {
    /// Host the TCP connection is made to
    pub host: String,
    /// API port
    pub port: u16,
    /// CA bundle used to verify the API certificate
    pub ca_file: PathBuf,
    /// Name the API certificate must be issued for (sent as SNI as well)
    pub server_name: String,
    /// Basic-Auth user
    pub username: String,
    /// Basic-Auth password
    pub password: String,
    /// Directory the JSON bundles are written to
    pub output_dir: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ca_file", &self.ca_file)
            .field("server_name", &self.server_name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl Config {
    /// Build the config from parsed flags and the password read from [`PASSWORD_ENV`]
    pub fn load(args: ExportArgs) -> Result<Self> {
        let password = std::env::var(PASSWORD_ENV).ok();
        Self::from_args(args, password)
    }

    /// Build the config from parsed flags and an explicitly supplied password
    ///
    /// Checks run in flag order, so the first missing flag is the one reported.
    pub fn from_args(args: ExportArgs, password: Option<String>) -> Result<Self> {
        require_non_empty("host", &args.host)?;
        require_non_empty("ca", &args.ca.to_string_lossy())?;
        require_non_empty("cn", &args.cn)?;
        require_non_empty("user", &args.user)?;
        check_ip_server_name(&args.cn, &args.host)?;

        let password = match password {
            Some(password) if !password.is_empty() => password,
            _ => {
                return Err(Error::Config {
                    message: format!("${PASSWORD_ENV} missing"),
                    key: Some(PASSWORD_ENV.to_string()),
                });
            }
        };

        let output_dir = if args.output_dir.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            args.output_dir
        };

        Ok(Self {
            host: args.host,
            port: args.port,
            ca_file: args.ca,
            server_name: args.cn,
            username: args.user,
            password,
            output_dir,
        })
    }

    /// Base URL every API request is derived from
    ///
    /// Requests are addressed to the server name; the TLS client resolves that
    /// name to the addresses of [`Config::host`].
    pub fn base_url(&self) -> Result<url::Url> {
        Ok(url::Url::parse(&format!(
            "https://{}:{}/",
            self.server_name, self.port
        ))?)
    }
}

// A literal address cannot be routed to another host, so the connection would
// silently go to -cn instead of -host.
fn check_ip_server_name(cn: &str, host: &str) -> Result<()> {
    let literal = cn.trim_start_matches('[').trim_end_matches(']');
    if literal.parse::<IpAddr>().is_ok() && cn != host {
        return Err(Error::config(
            "cn",
            format!("-cn {cn} is an IP address and must equal -host {host}"),
        ));
    }
    Ok(())
}

fn require_non_empty(flag: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::config(flag, format!("-{flag} missing")));
    }
    Ok(())
}

/// Rewrite single-dash long flags (`-host x`, `-port=5665`) into their
/// double-dash form so that older invocations keep working.
///
/// The first element (program name) and anything that is not one of the known
/// flags is passed through unchanged.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            let arg: OsString = arg.into();
            if i == 0 {
                return arg;
            }
            match arg.to_str() {
                Some(s) if is_single_dash_flag(s) => OsString::from(format!("-{s}")),
                _ => arg,
            }
        })
        .collect()
}

fn is_single_dash_flag(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    if rest.starts_with('-') {
        return false;
    }
    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    SINGLE_DASH_FLAGS.contains(&name)
}
