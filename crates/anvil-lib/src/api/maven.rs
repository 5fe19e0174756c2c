//! `maven-metadata.xml` as published by the Forge and NeoForge repositories.

use crate::api::transport::Transport;
use crate::error::{Error, Result};
use crate::game::installer::config::maven_metadata_url;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct MavenMetadataXml {
    versioning: MavenVersioning,
}

#[derive(Debug, Deserialize)]
struct MavenVersioning {
    #[serde(default)]
    release: Option<String>,
    #[serde(default)]
    latest: Option<String>,
    #[serde(default)]
    versions: Option<MavenVersionList>,
}

#[derive(Debug, Deserialize)]
struct MavenVersionList {
    #[serde(default)]
    version: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenMetadata {
    /// Versions in document order.
    pub versions: Vec<String>,
    pub release: Option<String>,
    pub latest: Option<String>,
}

pub fn parse_maven_metadata(xml: &str) -> Result<MavenMetadata> {
    let doc: MavenMetadataXml = serde_xml_rs::from_str(xml)
        .map_err(|e| Error::Download(format!("Invalid maven metadata: {}", e)))?;
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    Ok(MavenMetadata {
        versions: doc
            .versioning
            .versions
            .map(|v| v.version)
            .unwrap_or_default()
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect(),
        release: non_empty(doc.versioning.release),
        latest: non_empty(doc.versioning.latest),
    })
}

/// Fetch and parse `<repo>/maven-metadata.xml`.
pub async fn fetch_maven_metadata(transport: &dyn Transport, repo: &str) -> Result<MavenMetadata> {
    let url = maven_metadata_url(repo);
    let xml = transport.fetch_text(&url).await?;
    parse_maven_metadata(&xml).map_err(|e| match e {
        Error::Download(msg) => Error::Download(format!("{} ({})", msg, url)),
        other => other,
    })
}
