//! Bounded HTTPS fetches used by every resolver and installer.

use crate::api::guard::validate_url;
use crate::error::{Error, Result};
use crate::game::installer::config::{
    MAX_DOWNLOAD_BYTES, MAX_TEXT_RESPONSE_BYTES, REQUEST_RETRIES, REQUEST_TIMEOUT_SECS, USER_AGENT,
};
use crate::utils::hash::{hash_file, ExpectedDigest};
use futures::future::BoxFuture;
use futures::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;

/// Read-only access to upstream metadata services and artifact hosts.
pub trait Transport: Send + Sync {
    fn fetch_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<serde_json::Value>>;

    fn fetch_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String>>;

    /// Download `url` to `destination`, replacing it atomically once verified.
    fn fetch_to_file<'a>(
        &'a self,
        url: &'a str,
        destination: &'a Path,
        expected: Option<&'a ExpectedDigest>,
    ) -> BoxFuture<'a, Result<PathBuf>>;
}

/// Fetch JSON and decode it into `T`.
pub async fn fetch_typed<T: DeserializeOwned>(transport: &dyn Transport, url: &str) -> Result<T> {
    let value = transport.fetch_json(url).await?;
    serde_json::from_value(value)
        .map_err(|e| Error::Download(format!("Unexpected response shape from {}: {}", url, e)))
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub max_text_bytes: u64,
    pub max_download_bytes: u64,
    pub user_agent: String,
    /// Attempts per request for connection failures and 5xx responses.
    pub retries: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_text_bytes: MAX_TEXT_RESPONSE_BYTES,
            max_download_bytes: MAX_DOWNLOAD_BYTES,
            user_agent: USER_AGENT.to_string(),
            retries: REQUEST_RETRIES,
        }
    }
}

/// [`Transport`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Download(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(TransportConfig::default())
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let parsed = validate_url(url)?;
        let attempts = self.config.retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = self.client.get(parsed.clone()).send().await;
            let retryable = match &outcome {
                Ok(resp) => resp.status().is_server_error(),
                Err(e) => e.is_connect() || e.is_timeout(),
            };
            if retryable && attempt < attempts {
                log::warn!("Request to {} failed (attempt {}/{}), retrying", url, attempt, attempts);
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                continue;
            }

            let response =
                outcome.map_err(|e| Error::Download(format!("Request failed for {}: {}", url, e)))?;
            if !response.status().is_success() {
                return Err(Error::Download(format!(
                    "HTTP error {} for {}",
                    response.status(),
                    url
                )));
            }
            return Ok(response);
        }
    }

    async fn read_limited(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(url).await?;
        let limit = self.config.max_text_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(Error::Download(format!(
                "Response from {} exceeded the allowed size limit.",
                url
            )));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::Download(format!("Request failed for {}: {}", url, e)))?;
            if body.len() as u64 + chunk.len() as u64 > limit {
                return Err(Error::Download(format!(
                    "Response from {} exceeded the allowed size limit.",
                    url
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    async fn download(
        &self,
        url: &str,
        destination: &Path,
        expected: Option<&ExpectedDigest>,
    ) -> Result<PathBuf> {
        log::debug!("Downloading: {} -> {:?}", url, destination);
        let start = Instant::now();
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());

        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| Error::io(&parent, e))?;

        validate_url(url)?;
        if let Some(expected) = expected {
            if reusable_artifact(destination, expected).await {
                log::debug!("File exists and hash matches, skipping: {:?}", destination);
                return Ok(destination.to_path_buf());
            }
        }

        let response = self.send(url).await?;
        let limit = self.config.max_download_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(Error::Download(format!(
                "Download for {} exceeds the size limit.",
                name
            )));
        }

        // Removed on drop unless persisted below
        let tmp = tempfile::Builder::new()
            .prefix(".anvil-")
            .suffix(".part")
            .tempfile_in(&parent)
            .map_err(|e| Error::io(&parent, e))?;
        let std_file = tmp.as_file().try_clone().map_err(|e| Error::io(tmp.path(), e))?;
        let mut file = tokio::fs::File::from_std(std_file);
        let mut hasher = expected.map(|d| d.algorithm.hasher());
        let mut received: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::Download(format!("Download failed for {}: {}", url, e)))?;
            received += chunk.len() as u64;
            if received > limit {
                return Err(Error::Download(format!(
                    "Download for {} exceeded the allowed size limit.",
                    name
                )));
            }
            if let Some(h) = hasher.as_mut() {
                h.update(&chunk);
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io(tmp.path(), e))?;
        }
        file.flush().await.map_err(|e| Error::io(tmp.path(), e))?;
        file.sync_all().await.map_err(|e| Error::io(tmp.path(), e))?;
        drop(file);

        if let (Some(expected), Some(hasher)) = (expected, hasher) {
            let actual = hasher.finalize_hex();
            if !expected.matches(&actual) {
                return Err(Error::Download(format!(
                    "Hash mismatch for {}. Expected {} ({}), got {}.",
                    name, expected.hex, expected.algorithm, actual
                )));
            }
            log::debug!("{} validated: {}", expected.algorithm, actual);
        }

        tmp.persist(destination)
            .map_err(|e| Error::io(destination, e.error))?;

        log::info!(
            "Download stats: url={}, size={} bytes, time={:.2}s",
            url,
            received,
            start.elapsed().as_secs_f64()
        );
        Ok(destination.to_path_buf())
    }
}

impl Transport for HttpTransport {
    fn fetch_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<serde_json::Value>> {
        Box::pin(async move {
            let body = self.read_limited(url).await?;
            serde_json::from_slice(&body)
                .map_err(|_| Error::Download(format!("Invalid JSON from {}", url)))
        })
    }

    fn fetch_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let body = self.read_limited(url).await?;
            String::from_utf8(body)
                .map_err(|_| Error::Download(format!("Response from {} is not valid UTF-8", url)))
        })
    }

    fn fetch_to_file<'a>(
        &'a self,
        url: &'a str,
        destination: &'a Path,
        expected: Option<&'a ExpectedDigest>,
    ) -> BoxFuture<'a, Result<PathBuf>> {
        Box::pin(self.download(url, destination, expected))
    }
}

/// True when `path` already holds the expected artifact.
async fn reusable_artifact(path: &Path, expected: &ExpectedDigest) -> bool {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return false;
    }
    match hash_file(path, expected.algorithm).await {
        Ok(actual) if expected.matches(&actual) => true,
        Ok(actual) => {
            log::info!(
                "File exists but hash mismatches ({} != {}), re-downloading: {:?}",
                actual,
                expected.hex,
                path
            );
            false
        }
        Err(e) => {
            log::warn!("Failed to read existing file for validation: {}", e);
            false
        }
    }
}
