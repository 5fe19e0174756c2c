//! The persisted record of an installed server instance.

use crate::error::{Error, Result};
use crate::game::installer::config::{MANIFEST_FILE, MANIFEST_SCHEMA_VERSION};
use crate::game::installer::types::OsType;
use crate::game::metadata::types::LoaderId;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Placeholder token replaced by the java executable.
pub const JAVA_PLACEHOLDER: &str = "{java}";

/// Start command templates: one default plus optional per-OS overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCommands {
    pub default: Vec<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub windows: Option<Vec<String>>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub posix: Option<Vec<String>>,
}

fn empty_as_none<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Vec<String>>, D::Error> {
    let v: Option<Vec<String>> = Option::deserialize(d)?;
    Ok(v.filter(|tokens| !tokens.is_empty()))
}

impl StartCommands {
    pub fn new<S: Into<String>>(default: impl IntoIterator<Item = S>) -> Self {
        Self {
            default: default.into_iter().map(Into::into).collect(),
            windows: None,
            posix: None,
        }
    }

    pub fn with_windows<S: Into<String>>(mut self, tokens: impl IntoIterator<Item = S>) -> Self {
        self.windows = Some(tokens.into_iter().map(Into::into).collect()).filter(|t: &Vec<String>| !t.is_empty());
        self
    }

    pub fn with_posix<S: Into<String>>(mut self, tokens: impl IntoIterator<Item = S>) -> Self {
        self.posix = Some(tokens.into_iter().map(Into::into).collect()).filter(|t: &Vec<String>| !t.is_empty());
        self
    }

    /// `{java} -jar <jar> nogui`
    pub fn jar(jar: &str) -> Self {
        Self::new([JAVA_PLACEHOLDER, "-jar", jar, "nogui"])
    }

    pub fn select(&self, os: OsType) -> &[String] {
        let specific = match os {
            OsType::Windows => self.windows.as_ref(),
            OsType::Posix => self.posix.as_ref(),
        };
        match specific {
            Some(tokens) if !tokens.is_empty() => tokens,
            _ => &self.default,
        }
    }

    pub fn for_current_os(&self) -> &[String] {
        self.select(OsType::current())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub loader: LoaderId,
    pub minecraft_version: String,
    #[serde(default)]
    pub loader_version: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub build: Option<String>,
    #[serde(default)]
    pub java_required: Option<u32>,
    pub start: StartCommands,
    #[serde(default)]
    pub downloaded_urls: Vec<String>,
    #[serde(default)]
    pub installed_at_utc: String,
}

fn default_schema_version() -> u32 {
    MANIFEST_SCHEMA_VERSION
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    let v: Option<serde_json::Value> = Option::deserialize(d)?;
    match v {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "build must be a string or number, got {}",
            other
        ))),
    }
}

impl ServerManifest {
    pub fn new(loader: LoaderId, minecraft_version: impl Into<String>, start: StartCommands) -> Self {
        Self {
            schema_version: MANIFEST_SCHEMA_VERSION,
            loader,
            minecraft_version: minecraft_version.into(),
            loader_version: None,
            build: None,
            java_required: None,
            start,
            downloaded_urls: Vec::new(),
            installed_at_utc: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_loader_version(mut self, version: impl Into<String>) -> Self {
        self.loader_version = Some(version.into());
        self
    }

    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    pub fn with_java_required(mut self, java: Option<u32>) -> Self {
        self.java_required = java;
        self
    }

    pub fn with_downloaded_url(mut self, url: impl Into<String>) -> Self {
        self.downloaded_urls.push(url.into());
        self
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| Error::Manifest(format!("Failed to serialize manifest: {}", e)))
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let manifest: ServerManifest = serde_json::from_value(value)
            .map_err(|e| Error::Manifest(format!("Manifest is invalid: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.schema_version == 0 || self.schema_version > MANIFEST_SCHEMA_VERSION {
            return Err(Error::Manifest(format!(
                "Unsupported manifest schema version {}",
                self.schema_version
            )));
        }
        if self.start.default.is_empty() {
            return Err(Error::Manifest("Manifest has an empty default start command".into()));
        }
        Ok(())
    }
}

pub fn manifest_path(instance_dir: &Path) -> PathBuf {
    instance_dir.join(MANIFEST_FILE)
}

/// Write the manifest through a temp file in the instance directory, then rename it into place.
pub fn save_manifest(instance_dir: &Path, manifest: &ServerManifest) -> Result<PathBuf> {
    let path = manifest_path(instance_dir);
    let body = serde_json::to_vec_pretty(manifest)
        .map_err(|e| Error::Manifest(format!("Failed to serialize manifest: {}", e)))?;

    let persist_err = |e: std::io::Error| {
        Error::Manifest(format!("Failed to write manifest {}: {}", path.display(), e))
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".anvil-manifest-")
        .tempfile_in(instance_dir)
        .map_err(persist_err)?;
    tmp.write_all(&body).map_err(persist_err)?;
    tmp.as_file().sync_all().map_err(persist_err)?;
    tmp.persist(&path).map_err(|e| persist_err(e.error))?;

    log::debug!("Saved manifest to {:?}", path);
    Ok(path)
}

pub fn load_manifest(instance_dir: &Path) -> Result<ServerManifest> {
    let path = manifest_path(instance_dir);
    let raw = std::fs::read(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::Manifest(format!(
            "Manifest not found at {}. Install a server first.",
            path.display()
        )),
        _ => Error::Manifest(format!("Failed to read manifest {}: {}", path.display(), e)),
    })?;
    let value: serde_json::Value = serde_json::from_slice(&raw)
        .map_err(|e| Error::Manifest(format!("Manifest {} is corrupt: {}", path.display(), e)))?;
    ServerManifest::from_json(value).map_err(|e| match e {
        Error::Manifest(msg) => Error::Manifest(format!("{} ({})", msg, path.display())),
        other => other,
    })
}
