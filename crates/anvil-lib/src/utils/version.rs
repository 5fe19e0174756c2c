use crate::error::{Error, Result};
use crate::game::metadata::types::LoaderId;
use std::cmp::Ordering;

/// Substrings that mark a version string as a pre-release.
const UNSTABLE_MARKERS: &[&str] = &["alpha", "beta", "rc", "pre", "snapshot"];

/// Resolve a user-supplied loader name (case-insensitive, with aliases) to its canonical id.
pub fn normalize_loader(name: &str) -> Result<LoaderId> {
    let id = match name.trim().to_ascii_lowercase().as_str() {
        "vanilla" | "mojang" | "minecraft" => LoaderId::Vanilla,
        "paper" | "papermc" => LoaderId::Paper,
        "folia" => LoaderId::Folia,
        "purpur" | "purpurmc" => LoaderId::Purpur,
        "fabric" | "fabricmc" => LoaderId::Fabric,
        "quilt" | "quiltmc" => LoaderId::Quilt,
        "forge" | "minecraftforge" => LoaderId::Forge,
        "neoforge" | "neo" | "neoforged" | "neo-forge" => LoaderId::NeoForge,
        _ => return Err(Error::UnsupportedLoader(name.to_string())),
    };
    Ok(id)
}

/// A version is stable when it carries none of the pre-release markers.
pub fn is_stable_version(version: &str) -> bool {
    let lower = version.to_ascii_lowercase();
    !UNSTABLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    raw: String,
    number: Option<u64>,
}

impl Ord for Part {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number, other.number) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.raw.cmp(&other.raw),
        }
    }
}

impl PartialOrd for Part {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Natural-sort key for loose version strings.
///
/// Components are split on `.` and `-`. Two numeric components compare as numbers,
/// anything else compares as text. When one key is a prefix of the other the longer
/// key wins, and fully equal keys fall back to comparing the raw strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionKey {
    parts: Vec<Part>,
    raw: String,
}

impl VersionKey {
    pub fn new(version: &str) -> Self {
        let parts = version
            .split(['.', '-'])
            .filter(|s| !s.is_empty())
            .map(|s| Part {
                raw: s.to_string(),
                number: if s.bytes().all(|b| b.is_ascii_digit()) {
                    s.parse().ok()
                } else {
                    None
                },
            })
            .collect();
        VersionKey {
            parts,
            raw: version.to_string(),
        }
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.parts.iter().zip(other.parts.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.parts
            .len()
            .cmp(&other.parts.len())
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn version_key(version: &str) -> VersionKey {
    VersionKey::new(version)
}

pub fn compare_versions(a: &str, b: &str) -> Ordering {
    version_key(a).cmp(&version_key(b))
}

/// Pick the greatest version, preferring stable entries when `stable_only` is set.
///
/// If filtering leaves nothing, the unfiltered set is used instead.
pub fn pick_latest_version<S: AsRef<str>>(values: &[S], stable_only: bool) -> Result<String> {
    if values.is_empty() {
        return Err(Error::VersionResolution(
            "No versions available to choose from.".into(),
        ));
    }

    let stable: Vec<&str> = values
        .iter()
        .map(AsRef::as_ref)
        .filter(|v| !stable_only || is_stable_version(v))
        .collect();
    let pool: Vec<&str> = if stable.is_empty() {
        values.iter().map(AsRef::as_ref).collect()
    } else {
        stable
    };

    pool.into_iter()
        .max_by(|a, b| compare_versions(a, b))
        .map(str::to_string)
        .ok_or_else(|| Error::VersionResolution("No versions available to choose from.".into()))
}

/// Deduplicate and sort versions newest first.
pub fn sort_versions_desc(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
    unique.sort_by(|a, b| compare_versions(b, a));
    unique.dedup();
    unique
}
