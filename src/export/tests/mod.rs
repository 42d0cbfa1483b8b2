#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::Error;
use crate::api::RequestTemplate;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};
use url::Url;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn exporter_for(server: &MockServer, dir: &TempDir) -> Exporter<reqwest::Client> {
    let base_url = Url::parse(&server.uri()).unwrap();
    let template = RequestTemplate::new(base_url, "root", "icinga").unwrap();
    Exporter::new(ApiClient::new(reqwest::Client::new(), template), dir.path())
}

async fn mount_json(server: &MockServer, request_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(request_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_file(server: &MockServer, request_path: &str, content: &str) {
    Mock::given(method("GET"))
        .and(path(request_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(content))
        .mount(server)
        .await;
}

async fn requests_under(server: &MockServer, prefix: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path().starts_with(prefix))
        .count()
}

async fn read_bundle(path: &Path) -> Bundle {
    serde_json::from_slice(&tokio::fs::read(path).await.unwrap()).unwrap()
}

#[tokio::test]
async fn skips_packages_without_name_or_stage() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1/config/packages",
        json!({"results": [
            {"name": "director", "active-stage": "s1"},
            {"name": "", "active-stage": "s2"},
            {"name": "_api", "active-stage": ""},
            {"name": "custom", "active-stage": "s3"}
        ]}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path_regex("^/v1/config/stages/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let summary = exporter_for(&server, &dir).run().await.unwrap();

    assert_eq!(summary.packages, 4);
    assert_eq!(summary.skipped, 2);
    assert_eq!(requests_under(&server, "/v1/config/stages/").await, 2);
}

#[tokio::test]
async fn only_nested_files_are_fetched_and_bundled() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1/config/packages",
        json!({"results": [{"name": "director", "active-stage": "s1"}]}),
    )
    .await;
    mount_json(
        &server,
        "/v1/config/stages/director/s1",
        json!({"results": [
            {"name": "include.conf", "type": "file"},
            {"name": "zones.d", "type": "directory"},
            {"name": "zones.d/master", "type": "directory"},
            {"name": "zones.d/master/hosts.conf", "type": "file"},
            {"name": "conf.d/link", "type": "symlink"}
        ]}),
    )
    .await;
    mount_file(
        &server,
        "/v1/config/files/director/s1/zones.d/master/hosts.conf",
        "object Host \"web\" {}\n",
    )
    .await;

    let dir = tempdir().unwrap();
    let summary = exporter_for(&server, &dir).run().await.unwrap();

    assert_eq!(requests_under(&server, "/v1/config/files/").await, 1);
    assert_eq!(summary.files, 1);
    assert_eq!(summary.bundles, vec![dir.path().join("director.json")]);

    let bundle = read_bundle(&dir.path().join("director.json")).await;
    assert_eq!(bundle.files.len(), 1);
    assert_eq!(
        bundle.files["zones.d/master/hosts.conf"],
        "object Host \"web\" {}\n"
    );
}

#[tokio::test]
async fn package_without_qualifying_files_writes_nothing() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1/config/packages",
        json!({"results": [{"name": "empty", "active-stage": "s1"}]}),
    )
    .await;
    mount_json(
        &server,
        "/v1/config/stages/empty/s1",
        json!({"results": [
            {"name": "include.conf", "type": "file"},
            {"name": "conf.d", "type": "directory"}
        ]}),
    )
    .await;

    let dir = tempdir().unwrap();
    let summary = exporter_for(&server, &dir).run().await.unwrap();

    assert!(summary.bundles.is_empty());
    assert!(!dir.path().join("empty.json").exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn escaped_file_name_and_literal_keys() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1/config/packages",
        json!({"results": [{"name": "my pkg", "active-stage": "s 1"}]}),
    )
    .await;
    mount_json(
        &server,
        "/v1/config/stages/my%20pkg/s%201",
        json!({"results": [{"name": "sub/dir/file.conf", "type": "file"}]}),
    )
    .await;
    mount_file(
        &server,
        "/v1/config/files/my%20pkg/s%201/sub/dir/file.conf",
        "const Foo = 1\n",
    )
    .await;

    let dir = tempdir().unwrap();
    exporter_for(&server, &dir).run().await.unwrap();

    let bundle = read_bundle(&dir.path().join("my%20pkg.json")).await;
    assert_eq!(
        bundle.files.keys().collect::<Vec<_>>(),
        vec!["sub/dir/file.conf"]
    );
    assert_eq!(bundle.files["sub/dir/file.conf"], "const Foo = 1\n");
}

#[tokio::test]
async fn content_round_trips_byte_for_byte() {
    let content = "// ünïcödé ✓\r\nobject CheckCommand \"x\" {\n\tcommand = [ \"/bin/true\" ]\n}\n";
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1/config/packages",
        json!({"results": [{"name": "director", "active-stage": "s1"}]}),
    )
    .await;
    mount_json(
        &server,
        "/v1/config/stages/director/s1",
        json!({"results": [{"name": "conf.d/commands.conf", "type": "file"}]}),
    )
    .await;
    mount_file(
        &server,
        "/v1/config/files/director/s1/conf.d/commands.conf",
        content,
    )
    .await;

    let dir = tempdir().unwrap();
    exporter_for(&server, &dir).run().await.unwrap();

    let bundle = read_bundle(&dir.path().join("director.json")).await;
    assert_eq!(
        bundle.files["conf.d/commands.conf"].as_bytes(),
        content.as_bytes()
    );
}

#[tokio::test]
async fn bad_status_aborts_and_keeps_earlier_bundles() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1/config/packages",
        json!({"results": [
            {"name": "first", "active-stage": "s1"},
            {"name": "second", "active-stage": "s1"},
            {"name": "third", "active-stage": "s1"}
        ]}),
    )
    .await;
    for package in ["first", "second", "third"] {
        mount_json(
            &server,
            &format!("/v1/config/stages/{package}/s1"),
            json!({"results": [
                {"name": "conf.d/a.conf", "type": "file"},
                {"name": "conf.d/b.conf", "type": "file"}
            ]}),
        )
        .await;
    }
    mount_file(&server, "/v1/config/files/first/s1/conf.d/a.conf", "a").await;
    mount_file(&server, "/v1/config/files/first/s1/conf.d/b.conf", "b").await;
    mount_file(&server, "/v1/config/files/second/s1/conf.d/a.conf", "a").await;
    Mock::given(method("GET"))
        .and(path("/v1/config/files/second/s1/conf.d/b.conf"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let err = exporter_for(&server, &dir).run().await.unwrap_err();

    assert!(matches!(err, Error::BadStatus { status: 500, .. }), "{err:?}");
    assert!(dir.path().join("first.json").exists());
    assert!(!dir.path().join("second.json").exists());
    assert!(!dir.path().join("third.json").exists());
    assert_eq!(requests_under(&server, "/v1/config/stages/third").await, 0);
}

#[tokio::test]
async fn package_listing_failure_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/config/packages"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": 403,
            "status": "No permission to access packages"
        })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let err = exporter_for(&server, &dir).run().await.unwrap_err();

    assert!(matches!(err, Error::BadStatus { status: 403, .. }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn collect_bundle_for_single_package() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/v1/config/stages/director/s1",
        json!({"results": [
            {"name": "conf.d/a.conf", "type": "file"},
            {"name": "conf.d/b.conf", "type": "file"}
        ]}),
    )
    .await;
    mount_file(&server, "/v1/config/files/director/s1/conf.d/a.conf", "A").await;
    mount_file(&server, "/v1/config/files/director/s1/conf.d/b.conf", "B").await;

    let dir = tempdir().unwrap();
    let exporter = exporter_for(&server, &dir);
    let package = Package {
        name: "director".into(),
        active_stage: "s1".into(),
    };

    let bundle = exporter.collect_bundle(&package).await.unwrap();

    assert_eq!(bundle.len(), 2);
    assert_eq!(bundle.files["conf.d/a.conf"], "A");
    assert_eq!(bundle.files["conf.d/b.conf"], "B");
    assert_eq!(exporter.output_dir(), dir.path());
}
