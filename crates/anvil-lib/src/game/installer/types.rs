use crate::game::launcher::manifest::ServerManifest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Host operating system family, used to pick a start command variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsType {
    Windows,
    Posix,
}

impl OsType {
    /// Detect the current OS
    pub fn current() -> Self {
        if cfg!(windows) {
            OsType::Windows
        } else {
            OsType::Posix
        }
    }
}

/// Build identifier as published upstream: Paper uses numbers, Purpur strings of digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildId::Number(n) => write!(f, "{}", n),
            BuildId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for BuildId {
    fn from(n: u64) -> Self {
        BuildId::Number(n)
    }
}

impl From<&str> for BuildId {
    fn from(s: &str) -> Self {
        BuildId::Text(s.to_string())
    }
}

impl From<String> for BuildId {
    fn from(s: String) -> Self {
        BuildId::Text(s)
    }
}

/// What to install and where.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    /// Loader name, normalized by the orchestrator (aliases accepted)
    pub loader: String,

    /// Instance directory; created if missing
    pub instance_dir: PathBuf,

    /// Concrete Minecraft version or `"latest"`
    pub minecraft_version: String,

    /// Explicit loader version (Fabric/Quilt/Forge/NeoForge)
    pub loader_version: Option<String>,

    /// Explicit build (Paper-family/Purpur)
    pub build: Option<BuildId>,

    /// Java used to run installers
    pub java_path: String,

    pub accept_eula: bool,

    /// Overrides merged into `server.properties`
    pub server_properties: BTreeMap<String, String>,
}

impl InstallRequest {
    pub fn new(loader: impl Into<String>, instance_dir: impl Into<PathBuf>) -> Self {
        Self {
            loader: loader.into(),
            instance_dir: instance_dir.into(),
            minecraft_version: "latest".to_string(),
            loader_version: None,
            build: None,
            java_path: "java".to_string(),
            accept_eula: false,
            server_properties: BTreeMap::new(),
        }
    }

    pub fn with_minecraft_version(mut self, version: impl Into<String>) -> Self {
        self.minecraft_version = version.into();
        self
    }

    pub fn with_loader_version(mut self, version: impl Into<String>) -> Self {
        self.loader_version = Some(version.into());
        self
    }

    pub fn with_build(mut self, build: impl Into<BuildId>) -> Self {
        self.build = Some(build.into());
        self
    }

    pub fn with_java_path(mut self, java: impl Into<String>) -> Self {
        self.java_path = java.into();
        self
    }

    pub fn accept_eula(mut self, accepted: bool) -> Self {
        self.accept_eula = accepted;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.server_properties.insert(key.into(), value.into());
        self
    }

    pub fn wants_latest(&self) -> bool {
        self.minecraft_version == "latest"
    }

    /// Loader version, treating an empty string as unset.
    pub fn explicit_loader_version(&self) -> Option<&str> {
        self.loader_version.as_deref().filter(|v| !v.is_empty())
    }
}

/// Output of a single provider, consumed by the orchestrator.
#[derive(Debug, Clone)]
pub struct ProviderInstallResult {
    pub manifest: ServerManifest,
    pub server_jar: Option<PathBuf>,
    pub notes: Vec<String>,
}

/// Result of a complete install.
#[derive(Debug, Clone)]
pub struct InstallResult {
    pub instance_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: ServerManifest,
    pub server_jar: Option<PathBuf>,
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let req = InstallRequest::new("paper", "/srv/mc");
        assert!(req.wants_latest());
        assert_eq!(req.java_path, "java");
        assert!(!req.accept_eula);
        assert!(req.build.is_none());
    }

    #[test]
    fn empty_loader_version_is_unset() {
        let req = InstallRequest::new("fabric", "/srv/mc").with_loader_version("");
        assert_eq!(req.explicit_loader_version(), None);
    }

    #[test]
    fn build_id_accepts_numbers_and_strings() {
        let n: BuildId = serde_json::from_str("12").unwrap();
        let s: BuildId = serde_json::from_str("\"2400\"").unwrap();
        assert_eq!(n.to_string(), "12");
        assert_eq!(s.to_string(), "2400");
    }
}
