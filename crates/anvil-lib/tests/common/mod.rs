#![allow(dead_code)]

use anvil_lib::game::installer::config::VANILLA_MANIFEST_URL;
use anvil_lib::{DigestAlgorithm, Error, ExpectedDigest, Result, Transport};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// In-memory transport: canned responses keyed by URL, every request recorded.
#[derive(Default)]
pub struct FakeTransport {
    json: HashMap<String, Value>,
    text: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, url: impl Into<String>, value: Value) -> Self {
        self.json.insert(url.into(), value);
        self
    }

    pub fn with_text(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.text.insert(url.into(), body.into());
        self
    }

    pub fn with_file(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.files.insert(url.into(), body.into());
        self
    }

    /// Mojang manifest listing `version` as the latest release, with its Java requirement.
    pub fn with_mojang_version(self, version: &str, java_major: u32) -> Self {
        let details_url = format!("https://piston-meta.mojang.com/v1/packages/{}.json", version);
        let server_url = format!("https://piston-data.mojang.com/v1/objects/{}/server.jar", version);
        let body = server_bytes(version);
        self.with_json(
            VANILLA_MANIFEST_URL,
            json!({
                "latest": {"release": version, "snapshot": "25w41a"},
                "versions": [
                    {"id": "25w41a", "type": "snapshot", "url": "https://piston-meta.mojang.com/v1/packages/25w41a.json"},
                    {"id": version, "type": "release", "url": details_url}
                ]
            }),
        )
        .with_json(
            details_url,
            json!({
                "downloads": {"server": {"url": server_url, "sha1": sha1_hex(&body), "size": body.len()}},
                "javaVersion": {"component": "java-runtime-delta", "majorVersion": java_major}
            }),
        )
        .with_file(server_url, body)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, url: &str) {
        self.requests.lock().unwrap().push(url.to_string());
    }

    fn missing(url: &str) -> Error {
        Error::Download(format!("HTTP error 404 Not Found for {}", url))
    }
}

impl Transport for FakeTransport {
    fn fetch_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            self.record(url);
            self.json.get(url).cloned().ok_or_else(|| Self::missing(url))
        })
    }

    fn fetch_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            self.record(url);
            self.text.get(url).cloned().ok_or_else(|| Self::missing(url))
        })
    }

    fn fetch_to_file<'a>(
        &'a self,
        url: &'a str,
        destination: &'a Path,
        expected: Option<&'a ExpectedDigest>,
    ) -> BoxFuture<'a, Result<PathBuf>> {
        Box::pin(async move {
            self.record(url);
            let body = self.files.get(url).ok_or_else(|| Self::missing(url))?;
            if let Some(expected) = expected {
                let actual = digest_hex(expected.algorithm, body);
                if !expected.matches(&actual) {
                    return Err(Error::Download(format!(
                        "Hash mismatch for {}. Expected {} ({}), got {}.",
                        destination.display(),
                        expected.hex,
                        expected.algorithm,
                        actual
                    )));
                }
            }
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(destination, body).unwrap();
            Ok(destination.to_path_buf())
        })
    }
}

pub fn digest_hex(algorithm: DigestAlgorithm, body: &[u8]) -> String {
    let mut hasher = algorithm.hasher();
    hasher.update(body);
    hasher.finalize_hex()
}

pub fn sha1_hex(body: &[u8]) -> String {
    digest_hex(DigestAlgorithm::Sha1, body)
}

pub fn sha256_hex(body: &[u8]) -> String {
    digest_hex(DigestAlgorithm::Sha256, body)
}

pub fn server_bytes(tag: &str) -> Vec<u8> {
    format!("fake server jar {}", tag).into_bytes()
}

/// Executable shell script standing in for `java` in installer and launch tests.
#[cfg(unix)]
pub fn fake_java(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-java.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
