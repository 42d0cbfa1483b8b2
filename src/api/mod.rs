//! Client for the configuration-management API
//!
//! Every logical fetch is one call to [`ApiClient::send_request`]: the request
//! is cloned from a [`RequestTemplate`] carrying the base URL and the Basic-Auth
//! header, only method and path are overridden, and the response body is routed
//! into a [`Sink`] that states up front whether JSON or raw bytes are expected.

mod types;


pub use types::{FILE_TYPE, Package, Results, StageFile};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::utils::{escape_path, escape_path_segment};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::io::Write;
use tracing::{debug, warn};
use url::Url;

/// Path listing all config packages
pub const PACKAGES_PATH: &str = "/v1/config/packages";

/// Path listing the entries of a package stage
///
/// Package and stage are escaped as single path segments.
pub fn stage_path(package: &str, stage: &str) -> String {
    format!(
        "/v1/config/stages/{}/{}",
        escape_path_segment(package),
        escape_path_segment(stage)
    )
}

/// Path of one file inside a package stage
///
/// Package and stage are escaped as single segments. The file name keeps its
/// separators but is escaped otherwise, a literal `%` included, so the server
/// resolves it to the name the stage listing returned.
pub fn file_path(package: &str, stage: &str, file: &str) -> String {
    format!(
        "/v1/config/files/{}/{}/{}",
        escape_path_segment(package),
        escape_path_segment(stage),
        escape_path(file)
    )
}

/// Where a successful response body goes
#[derive(Debug)]
pub enum Sink<'a, T> {
    /// Decode the body as JSON into the target
    Json(&'a mut T),
    /// Store the body bytes unmodified
    Raw(&'a mut Vec<u8>),
    /// Ignore the body
    Discard,
}

/// Base request every API call is cloned from
#[derive(Clone, Debug)]
pub struct RequestTemplate {
    base_url: Url,
    authorization: HeaderValue,
}

impl RequestTemplate {
    /// Create a template for `base_url` authenticating as `username`
    pub fn new(base_url: Url, username: &str, password: &str) -> Result<Self> {
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        let mut authorization = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| Error::config("user", format!("invalid credentials: {e}")))?;
        authorization.set_sensitive(true);

        Ok(Self {
            base_url,
            authorization,
        })
    }

    /// Base URL requests are derived from
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Clone the template, overriding method and path
    pub fn build(&self, method: Method, path: &str) -> reqwest::Request {
        let mut url = self.base_url.clone();
        url.set_path(path);

        let mut request = reqwest::Request::new(method, url);
        request
            .headers_mut()
            .insert(AUTHORIZATION, self.authorization.clone());
        request
    }
}

/// API client over any [`Transport`]
pub struct ApiClient<T> {
    transport: T,
    template: RequestTemplate,
}

impl<T: Transport> ApiClient<T> {
    /// Create a client sending requests built from `template` through `transport`
    pub fn new(transport: T, template: RequestTemplate) -> Self {
        Self {
            transport,
            template,
        }
    }

    /// Create a client for the API described by `config`
    pub fn from_config(transport: T, config: &Config) -> Result<Self> {
        let template =
            RequestTemplate::new(config.base_url()?, &config.username, &config.password)?;
        Ok(Self::new(transport, template))
    }

    /// Send one request and route the response body into `sink`
    ///
    /// # Errors
    ///
    /// - [`Error::Serialization`] if `body` cannot be encoded or a JSON sink
    ///   receives malformed JSON
    /// - [`Error::Network`] for transport failures, returned as-is
    /// - [`Error::BadStatus`] for any status other than 200; the response body
    ///   is copied to standard error first
    pub async fn send_request<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        sink: Sink<'_, R>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.template.build(method, path);

        if let Some(body) = body {
            let encoded = serde_json::to_vec(body)?;
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *request.body_mut() = Some(encoded.into());
        }

        let url = request.url().to_string();
        let response = self.transport.execute(request).await?;

        let status = response.status();
        if status != StatusCode::OK {
            match response.bytes().await {
                Ok(body) => echo_to_stderr(&body),
                Err(e) => warn!(url = %url, error = %e, "failed to read error response body"),
            }
            return Err(Error::BadStatus {
                status: status.as_u16(),
                url,
            });
        }

        match sink {
            Sink::Json(target) => {
                // Only the first value counts; anything after it is ignored
                let bytes = response.bytes().await?;
                let mut decoder = serde_json::Deserializer::from_slice(&bytes);
                *target = R::deserialize(&mut decoder)?;
            }
            Sink::Raw(target) => {
                *target = response.bytes().await?.to_vec();
            }
            Sink::Discard => {}
        }

        Ok(())
    }

    /// List all config packages
    pub async fn list_packages(&self) -> Result<Vec<Package>> {
        let mut packages = Results::<Package>::default();
        self.send_request(
            Method::GET,
            PACKAGES_PATH,
            None::<&()>,
            Sink::Json(&mut packages),
        )
        .await?;
        debug!(count = packages.results.len(), "listed packages");
        Ok(packages.results)
    }

    /// List the entries of a package stage
    pub async fn list_stage_files(&self, package: &str, stage: &str) -> Result<Vec<StageFile>> {
        let mut files = Results::<StageFile>::default();
        self.send_request(
            Method::GET,
            &stage_path(package, stage),
            None::<&()>,
            Sink::Json(&mut files),
        )
        .await?;
        debug!(package, stage, count = files.results.len(), "listed stage files");
        Ok(files.results)
    }

    /// Fetch the raw content of one stage file
    pub async fn fetch_file(&self, package: &str, stage: &str, file: &str) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        self.send_request(
            Method::GET,
            &file_path(package, stage, file),
            None::<&()>,
            Sink::<()>::Raw(&mut content),
        )
        .await?;
        debug!(package, stage, file, bytes = content.len(), "fetched file");
        Ok(content)
    }
}

fn echo_to_stderr(body: &[u8]) {
    let mut stderr = std::io::stderr().lock();
    if let Err(e) = stderr.write_all(body).and_then(|()| stderr.flush()) {
        warn!(error = %e, "failed to echo error response body");
    }
}
