//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::path::Path;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a catalog body with one category holding `models`.
///
/// Each model is `(img, thumb, modelUrl)`; `None` fields are emitted as `null`.
pub fn catalog_body(models: &[(Option<&str>, Option<&str>, Option<&str>)]) -> serde_json::Value {
    let models: Vec<_> = models
        .iter()
        .map(|(img, thumb, model)| json!({ "img": img, "thumb": thumb, "modelUrl": model }))
        .collect();
    json!({ "data": [ { "models": models } ] })
}

/// Mounts `GET <route>` answering 200 with `body`.
pub async fn mount_file(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Mounts `GET <route>` answering with `status` and an error page body.
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string("error page"))
        .mount(server)
        .await;
}

/// Number of requests the mock server received for `route`.
pub async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}

/// Lists the regular files directly inside `dir`, sorted by name.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|entry| entry.path().is_file())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Lists leftover partial files (`.<name>.<random>.part`) inside `dir`.
pub fn partial_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with('.') && name.ends_with(".part"))
                .collect()
        })
        .unwrap_or_default()
}
