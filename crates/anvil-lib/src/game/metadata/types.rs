use crate::error::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server software distribution an instance is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LoaderId {
    Vanilla,
    Paper,
    Folia,
    Purpur,
    Fabric,
    Quilt,
    Forge,
    NeoForge,
}

impl LoaderId {
    pub const ALL: [LoaderId; 8] = [
        LoaderId::Vanilla,
        LoaderId::Paper,
        LoaderId::Folia,
        LoaderId::Purpur,
        LoaderId::Fabric,
        LoaderId::Quilt,
        LoaderId::Forge,
        LoaderId::NeoForge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderId::Vanilla => "vanilla",
            LoaderId::Paper => "paper",
            LoaderId::Folia => "folia",
            LoaderId::Purpur => "purpur",
            LoaderId::Fabric => "fabric",
            LoaderId::Quilt => "quilt",
            LoaderId::Forge => "forge",
            LoaderId::NeoForge => "neoforge",
        }
    }
}

impl std::fmt::Display for LoaderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoaderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::utils::version::normalize_loader(s)
    }
}

impl Serialize for LoaderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LoaderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// Mojang launcher metadata

#[derive(Debug, Clone, Deserialize)]
pub struct MojangVersionManifest {
    pub latest: MojangLatest,
    #[serde(default)]
    pub versions: Vec<MojangVersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MojangLatest {
    pub release: String,
    #[serde(default)]
    pub snapshot: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MojangVersionEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MojangVersionDetails {
    #[serde(default)]
    pub downloads: MojangDownloads,
    #[serde(default)]
    pub java_version: Option<MojangJavaVersion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MojangDownloads {
    #[serde(default)]
    pub server: Option<MojangArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MojangArtifact {
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MojangJavaVersion {
    pub major_version: u32,
}

// PaperMC v2 API

#[derive(Debug, Clone, Deserialize)]
pub struct PaperProject {
    #[serde(default)]
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaperBuildList {
    #[serde(default)]
    pub builds: Vec<PaperBuild>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaperBuild {
    pub build: u64,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub downloads: PaperDownloads,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaperDownloads {
    #[serde(default)]
    pub application: Option<PaperArtifact>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaperArtifact {
    pub name: String,
    #[serde(default)]
    pub sha256: Option<String>,
}

// Purpur v2 API

#[derive(Debug, Clone, Deserialize)]
pub struct PurpurProject {
    #[serde(default)]
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurpurVersion {
    #[serde(default)]
    pub builds: PurpurBuilds,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurpurBuilds {
    #[serde(default)]
    pub latest: Option<serde_json::Value>,
    #[serde(default)]
    pub all: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurpurBuild {
    #[serde(default)]
    pub md5: Option<String>,
}

// Fabric / Quilt meta (same shape)

#[derive(Debug, Clone, Deserialize)]
pub struct MetaGameVersion {
    pub version: String,
    #[serde(default)]
    pub stable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaLoaderEntry {
    pub loader: MetaLoader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaLoader {
    pub version: String,
    #[serde(default)]
    pub stable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaInstaller {
    pub version: String,
    pub url: String,
    #[serde(default)]
    pub stable: Option<bool>,
}

/// Render a JSON scalar (string or number) the way upstream APIs print build ids.
pub(crate) fn json_scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loader_id_serializes_lowercase() {
        assert_eq!(serde_json::to_value(LoaderId::NeoForge).unwrap(), json!("neoforge"));
        let parsed: LoaderId = serde_json::from_value(json!("PaperMC")).unwrap();
        assert_eq!(parsed, LoaderId::Paper);
        assert!(serde_json::from_value::<LoaderId>(json!("spigot")).is_err());
    }

    #[test]
    fn paper_build_tolerates_missing_fields() {
        let builds: PaperBuildList = serde_json::from_value(json!({
            "builds": [
                {"build": 10, "channel": "experimental"},
                {"build": 11, "channel": "default", "downloads": {"application": {"name": "paper-11.jar", "sha256": "ab"}}}
            ]
        }))
        .unwrap();
        assert_eq!(builds.builds.len(), 2);
        assert!(builds.builds[0].downloads.application.is_none());
        assert_eq!(
            builds.builds[1].downloads.application.as_ref().map(|a| a.name.as_str()),
            Some("paper-11.jar")
        );
    }

    #[test]
    fn json_scalars_render_as_build_ids() {
        assert_eq!(json_scalar_to_string(&json!(2400)), Some("2400".into()));
        assert_eq!(json_scalar_to_string(&json!("2401")), Some("2401".into()));
        assert_eq!(json_scalar_to_string(&json!("")), None);
        assert_eq!(json_scalar_to_string(&json!(null)), None);
    }
}
