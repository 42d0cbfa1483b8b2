//! HTTPS client construction
//!
//! The API is served with a certificate issued by a private CA, for a name that
//! usually differs from the address we connect to. The client therefore trusts
//! only the supplied CA bundle and routes the certificate's server name to the
//! resolved addresses of the configured host, so SNI and certificate-name
//! verification both use the server name.

use crate::config::Config;
use crate::error::{Error, Result};
use std::net::SocketAddr;
use std::path::Path;
use tracing::debug;

/// Read a PEM bundle and parse every certificate in it
///
/// # Errors
///
/// Returns [`Error::CaLoad`] if the file cannot be read or contains no
/// certificate.
pub async fn load_ca_bundle(path: &Path) -> Result<Vec<reqwest::Certificate>> {
    let pem = tokio::fs::read(path).await.map_err(|e| Error::CaLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let certificates =
        reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| Error::CaLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if certificates.is_empty() {
        return Err(Error::CaLoad {
            path: path.to_path_buf(),
            reason: "no valid certificate found".to_string(),
        });
    }

    debug!(
        path = %path.display(),
        count = certificates.len(),
        "loaded CA bundle"
    );
    Ok(certificates)
}

/// Resolve the configured host to socket addresses
async fn resolve_host(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| Error::Resolve {
            host: host.to_string(),
            port,
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(Error::Resolve {
            host: host.to_string(),
            port,
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "host resolved to no addresses",
            ),
        });
    }
    Ok(addrs)
}

/// Build the HTTP client used for every API request
///
/// No timeouts are configured; a hanging server blocks the export.
pub async fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    let certificates = load_ca_bundle(&config.ca_file).await?;

    let mut builder = reqwest::Client::builder()
        .tls_built_in_root_certs(false)
        .https_only(true);
    for certificate in certificates {
        builder = builder.add_root_certificate(certificate);
    }

    if config.server_name != config.host {
        let addrs = resolve_host(&config.host, config.port).await?;
        debug!(
            server_name = %config.server_name,
            host = %config.host,
            addrs = ?addrs,
            "routing server name to host addresses"
        );
        builder = builder.resolve_to_addrs(&config.server_name, &addrs);
    }

    builder.build().map_err(Error::ClientBuild)
}
