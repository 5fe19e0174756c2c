//! Mojang launcher metadata: version lookup and Java requirements.

use crate::api::transport::{fetch_typed, Transport};
use crate::error::{Error, Result};
use crate::game::installer::config::VANILLA_MANIFEST_URL;
use crate::game::metadata::types::{MojangVersionDetails, MojangVersionManifest};

pub async fn fetch_version_manifest(transport: &dyn Transport) -> Result<MojangVersionManifest> {
    fetch_typed(transport, VANILLA_MANIFEST_URL).await
}

/// Resolve `requested` (or `"latest"`, the current release) and fetch its version document.
pub async fn resolve_mojang_version(
    transport: &dyn Transport,
    requested: &str,
) -> Result<(String, MojangVersionDetails)> {
    let manifest = fetch_version_manifest(transport).await?;
    let version = if requested == "latest" {
        manifest.latest.release.clone()
    } else {
        requested.to_string()
    };

    let entry = manifest
        .versions
        .iter()
        .find(|v| v.id == version)
        .ok_or_else(|| {
            Error::VersionResolution(format!(
                "Minecraft version '{}' was not found in Mojang metadata.",
                version
            ))
        })?;

    let details = fetch_typed(transport, &entry.url).await?;
    Ok((version, details))
}

pub async fn minecraft_java_requirement(
    transport: &dyn Transport,
    minecraft_version: &str,
) -> Result<Option<u32>> {
    let (_, details) = resolve_mojang_version(transport, minecraft_version).await?;
    Ok(details.java_version.map(|j| j.major_version))
}

/// Like [`minecraft_java_requirement`], but a lookup failure only logs and yields `None`.
pub async fn java_requirement_best_effort(
    transport: &dyn Transport,
    minecraft_version: &str,
) -> Option<u32> {
    match minecraft_java_requirement(transport, minecraft_version).await {
        Ok(v) => v,
        Err(e) => {
            log::warn!(
                "Could not determine Java requirement for Minecraft {}: {}",
                minecraft_version,
                e
            );
            None
        }
    }
}
