use crate::api::maven::fetch_maven_metadata;
use crate::api::mojang::fetch_version_manifest;
use crate::api::transport::{fetch_typed, Transport};
use crate::error::Result;
use crate::game::installer::config::{
    FABRIC_META_URL, FORGE_MAVEN_URL, NEOFORGE_MAVEN_URL, PURPUR_API_URL, QUILT_META_URL,
};
use crate::game::installer::modloaders::forge::forge_minecraft_version;
use crate::game::installer::modloaders::neoforge::neoforge_minecraft_version;
use crate::game::installer::modloaders::paper::{builds_url, project_url};
use crate::game::metadata::types::{
    LoaderId, MetaGameVersion, MetaLoaderEntry, PaperBuildList, PaperProject, PurpurProject,
};
use crate::utils::version::{is_stable_version, normalize_loader, sort_versions_desc};
use std::sync::Arc;

pub const DEFAULT_LIST_LIMIT: usize = 200;

/// Read-only version listings for pickers and CLIs.
/// Queries the same upstream services as the providers, with no install side effects.
#[derive(Clone)]
pub struct VersionCatalog {
    transport: Arc<dyn Transport>,
}

impl VersionCatalog {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Minecraft versions `loader` can install, newest first, deduplicated.
    pub async fn list_minecraft_versions(
        &self,
        loader: &str,
        stable_only: bool,
        limit: usize,
    ) -> Result<Vec<String>> {
        let loader = normalize_loader(loader)?;
        let versions = match loader {
            LoaderId::Vanilla => self.vanilla_versions(stable_only).await?,
            LoaderId::Paper | LoaderId::Folia => {
                let data: PaperProject =
                    fetch_typed(self.transport.as_ref(), &project_url(loader.as_str())).await?;
                filter_stable(data.versions, stable_only)
            }
            LoaderId::Purpur => {
                let data: PurpurProject = fetch_typed(self.transport.as_ref(), PURPUR_API_URL).await?;
                filter_stable(data.versions, stable_only)
            }
            LoaderId::Fabric => self.meta_game_versions(FABRIC_META_URL, stable_only).await?,
            LoaderId::Quilt => self.meta_game_versions(QUILT_META_URL, stable_only).await?,
            LoaderId::Forge => {
                let metadata = fetch_maven_metadata(self.transport.as_ref(), FORGE_MAVEN_URL).await?;
                forge_minecraft_versions(&metadata.versions, stable_only)
            }
            LoaderId::NeoForge => {
                let metadata =
                    fetch_maven_metadata(self.transport.as_ref(), NEOFORGE_MAVEN_URL).await?;
                neoforge_minecraft_versions(&metadata.versions, stable_only)
            }
        };
        Ok(truncate(sort_versions_desc(versions), limit))
    }

    /// Loader versions (or builds) published for one Minecraft version, newest first.
    /// Vanilla and Purpur have no such axis and return nothing.
    pub async fn list_loader_versions(
        &self,
        loader: &str,
        minecraft_version: &str,
        stable_only: bool,
        limit: usize,
    ) -> Result<Vec<String>> {
        let loader = normalize_loader(loader)?;
        let versions = match loader {
            LoaderId::Vanilla | LoaderId::Purpur => Vec::new(),
            LoaderId::Paper | LoaderId::Folia => {
                let data: PaperBuildList = fetch_typed(
                    self.transport.as_ref(),
                    &builds_url(loader.as_str(), minecraft_version),
                )
                .await?;
                data.builds
                    .iter()
                    .filter(|b| !stable_only || b.channel == "default")
                    .map(|b| b.build.to_string())
                    .collect()
            }
            LoaderId::Fabric => {
                self.meta_loader_versions(FABRIC_META_URL, minecraft_version, stable_only)
                    .await?
            }
            // Quilt does not flag loader stability reliably
            LoaderId::Quilt => {
                self.meta_loader_versions(QUILT_META_URL, minecraft_version, false)
                    .await?
            }
            LoaderId::Forge => {
                let metadata = fetch_maven_metadata(self.transport.as_ref(), FORGE_MAVEN_URL).await?;
                forge_versions_for(&metadata.versions, minecraft_version, stable_only)
            }
            LoaderId::NeoForge => {
                let metadata =
                    fetch_maven_metadata(self.transport.as_ref(), NEOFORGE_MAVEN_URL).await?;
                neoforge_versions_for(&metadata.versions, minecraft_version, stable_only)
            }
        };
        Ok(truncate(sort_versions_desc(versions), limit))
    }

    async fn vanilla_versions(&self, stable_only: bool) -> Result<Vec<String>> {
        let manifest = fetch_version_manifest(self.transport.as_ref()).await?;
        Ok(manifest
            .versions
            .into_iter()
            .filter(|v| !stable_only || v.version_type == "release")
            .map(|v| v.id)
            .collect())
    }

    async fn meta_game_versions(&self, meta_url: &str, stable_only: bool) -> Result<Vec<String>> {
        let games: Vec<MetaGameVersion> =
            fetch_typed(self.transport.as_ref(), &format!("{}/game", meta_url)).await?;
        Ok(games
            .into_iter()
            .filter(|g| !stable_only || g.stable)
            .map(|g| g.version)
            .collect())
    }

    async fn meta_loader_versions(
        &self,
        meta_url: &str,
        minecraft_version: &str,
        stable_only: bool,
    ) -> Result<Vec<String>> {
        let entries: Vec<MetaLoaderEntry> = fetch_typed(
            self.transport.as_ref(),
            &format!("{}/loader/{}", meta_url, minecraft_version),
        )
        .await?;
        Ok(entries
            .into_iter()
            .filter(|e| !stable_only || e.loader.stable == Some(true))
            .map(|e| e.loader.version)
            .collect())
    }
}

fn truncate(mut values: Vec<String>, limit: usize) -> Vec<String> {
    values.truncate(limit);
    values
}

fn filter_stable(values: Vec<String>, stable_only: bool) -> Vec<String> {
    values
        .into_iter()
        .filter(|v| !stable_only || is_stable_version(v))
        .collect()
}

fn forge_minecraft_versions(versions: &[String], stable_only: bool) -> Vec<String> {
    versions
        .iter()
        .filter(|v| !stable_only || is_stable_version(v))
        .filter_map(|v| forge_minecraft_version(v))
        .map(str::to_string)
        .collect()
}

fn neoforge_minecraft_versions(versions: &[String], stable_only: bool) -> Vec<String> {
    versions
        .iter()
        .filter(|v| !stable_only || is_stable_version(v))
        .filter_map(|v| neoforge_minecraft_version(v))
        .collect()
}

fn forge_versions_for(versions: &[String], minecraft_version: &str, stable_only: bool) -> Vec<String> {
    let prefix = format!("{}-", minecraft_version);
    versions
        .iter()
        .filter(|v| v.starts_with(&prefix))
        .filter(|v| !stable_only || is_stable_version(v))
        .cloned()
        .collect()
}

fn neoforge_versions_for(versions: &[String], minecraft_version: &str, stable_only: bool) -> Vec<String> {
    versions
        .iter()
        .filter(|v| !stable_only || is_stable_version(v))
        .filter(|v| neoforge_minecraft_version(v).as_deref() == Some(minecraft_version))
        .cloned()
        .collect()
}
