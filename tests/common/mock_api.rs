//! wiremock-backed stand-in for the configuration-management API

use i2_config_export::utils::{escape_path, escape_path_segment};
use i2_config_export::{ApiClient, AuditLog, Exporter, RequestTemplate};
use serde_json::json;
use std::path::Path;
use url::Url;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::AuditBuffer;

/// API user every mock expects
pub const USER: &str = "root";
/// API password every mock expects
pub const PASSWORD: &str = "icinga";

/// One package served by [`MockApi`]
pub struct MockPackage {
    /// Package name as listed (unescaped)
    pub name: &'static str,
    /// Active stage name (unescaped)
    pub stage: &'static str,
    /// `(entry name, entry type, content)`; content is only served for files
    pub entries: Vec<(&'static str, &'static str, &'static str)>,
}

/// Mock API server with helpers to mount package trees
pub struct MockApi {
    /// Underlying wiremock server
    pub server: MockServer,
}

impl MockApi {
    /// Start an empty mock API
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Serve the package listing and every stage listing and file below it
    pub async fn mount_packages(&self, packages: &[MockPackage]) {
        let listing: Vec<_> = packages
            .iter()
            .map(|p| json!({"name": p.name, "active-stage": p.stage}))
            .collect();
        self.mount_json("/v1/config/packages", json!({ "results": listing }))
            .await;

        for package in packages {
            let name = escape_path_segment(package.name);
            let stage = escape_path_segment(package.stage);

            let entries: Vec<_> = package
                .entries
                .iter()
                .map(|(entry, kind, _)| json!({"name": entry, "type": kind}))
                .collect();
            self.mount_json(
                &format!("/v1/config/stages/{name}/{stage}"),
                json!({ "results": entries }),
            )
            .await;

            for (entry, kind, content) in &package.entries {
                if *kind == "file" {
                    let entry = escape_path(entry);
                    Mock::given(method("GET"))
                        .and(path(format!("/v1/config/files/{name}/{stage}/{entry}")))
                        .and(basic_auth(USER, PASSWORD))
                        .respond_with(ResponseTemplate::new(200).set_body_string(*content))
                        .mount(&self.server)
                        .await;
                }
            }
        }
    }

    /// Serve a JSON body for `GET request_path`
    pub async fn mount_json(&self, request_path: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(request_path))
            .and(basic_auth(USER, PASSWORD))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Exporter talking plain HTTP to this server, auditing into `audit`
    pub fn exporter(
        &self,
        output_dir: &Path,
        audit: AuditBuffer,
    ) -> Exporter<AuditLog<reqwest::Client>> {
        let base_url = Url::parse(&self.server.uri()).expect("mock server uri");
        let template = RequestTemplate::new(base_url, USER, PASSWORD).expect("template");
        let transport = AuditLog::new(reqwest::Client::new(), Box::new(audit));
        Exporter::new(ApiClient::new(transport, template), output_dir)
    }
}
