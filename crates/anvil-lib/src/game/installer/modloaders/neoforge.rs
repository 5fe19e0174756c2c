use crate::api::maven::fetch_maven_metadata;
use crate::api::mojang::java_requirement_best_effort;
use crate::api::transport::Transport;
use crate::error::{Error, Result};
use crate::game::installer::config::NEOFORGE_MAVEN_URL;
use crate::game::installer::core::traits::LoaderProvider;
use crate::game::installer::modloaders::forge::{
    argfile_note, argfile_start_commands, run_server_installer,
};
use crate::game::installer::types::{InstallRequest, ProviderInstallResult};
use crate::game::launcher::manifest::ServerManifest;
use crate::game::metadata::types::LoaderId;
use crate::utils::version::{is_stable_version, pick_latest_version};
use futures::future::BoxFuture;

pub struct NeoForgeProvider;

impl LoaderProvider for NeoForgeProvider {
    fn loader(&self) -> LoaderId {
        LoaderId::NeoForge
    }

    fn install<'a>(
        &'a self,
        request: &'a InstallRequest,
        transport: &'a dyn Transport,
    ) -> BoxFuture<'a, Result<ProviderInstallResult>> {
        Box::pin(install_neoforge(request, transport))
    }
}

/// Map a NeoForge version (`21.10.64`) to its Minecraft release (`1.21.10`).
/// Both leading components must be numeric.
pub fn neoforge_minecraft_version(neoforge_version: &str) -> Option<String> {
    let mut parts = neoforge_version.split('.');
    let major = parts.next()?;
    let minor = parts.next()?;
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !numeric(major) || !numeric(minor) {
        return None;
    }
    Some(format!("1.{}.{}", major, minor))
}

/// Version prefix NeoForge uses for a Minecraft release: `1.21.1` -> `21.1.`, `1.21` -> `21.0.`.
fn version_prefix(minecraft_version: &str) -> String {
    let trimmed = minecraft_version
        .strip_prefix("1.")
        .unwrap_or(minecraft_version);
    if trimmed.contains('.') {
        format!("{}.", trimmed)
    } else {
        format!("{}.0.", trimmed)
    }
}

fn newest_preferring_stable(pool: &[&String]) -> Result<String> {
    let stable: Vec<&String> = pool.iter().copied().filter(|v| is_stable_version(v)).collect();
    if stable.is_empty() {
        pick_latest_version(pool, false)
    } else {
        pick_latest_version(&stable, false)
    }
}

pub fn resolve_neoforge_version(request: &InstallRequest, versions: &[String]) -> Result<String> {
    if let Some(wanted) = request.explicit_loader_version() {
        if !versions.iter().any(|v| v == wanted) {
            return Err(Error::VersionResolution(format!(
                "NeoForge version {} was not found.",
                wanted
            )));
        }
        return Ok(wanted.to_string());
    }

    if request.wants_latest() {
        let all: Vec<&String> = versions.iter().collect();
        return newest_preferring_stable(&all);
    }

    let mc = request.minecraft_version.as_str();
    let bare = mc.strip_prefix("1.").unwrap_or(mc);
    let prefix = version_prefix(mc);
    let matching: Vec<&String> = versions
        .iter()
        .filter(|v| v.starts_with(&prefix) || v.as_str() == bare)
        .collect();
    if matching.is_empty() {
        return Err(Error::VersionResolution(format!(
            "No NeoForge versions found for Minecraft {}.",
            mc
        )));
    }
    newest_preferring_stable(&matching)
}

/// Install a NeoForge server through the official installer
pub async fn install_neoforge(
    request: &InstallRequest,
    transport: &dyn Transport,
) -> Result<ProviderInstallResult> {
    let metadata = fetch_maven_metadata(transport, NEOFORGE_MAVEN_URL).await?;
    if metadata.versions.is_empty() {
        return Err(Error::VersionResolution("NeoForge metadata returned no versions.".into()));
    }
    let neoforge_version = resolve_neoforge_version(request, &metadata.versions)?;

    let mc_version = if request.wants_latest() {
        neoforge_minecraft_version(&neoforge_version)
    } else {
        Some(request.minecraft_version.clone())
    };
    log::info!(
        "Installing NeoForge {} (Minecraft {})",
        neoforge_version,
        mc_version.as_deref().unwrap_or("unknown")
    );

    let installer_url = format!(
        "{}/{}/neoforge-{}-installer.jar",
        NEOFORGE_MAVEN_URL, neoforge_version, neoforge_version
    );
    run_server_installer("NeoForge", &installer_url, request, transport).await?;

    let java_required = match &mc_version {
        Some(mc) => java_requirement_best_effort(transport, mc).await,
        None => None,
    };

    let manifest = ServerManifest::new(
        LoaderId::NeoForge,
        mc_version.unwrap_or_else(|| request.minecraft_version.clone()),
        argfile_start_commands("net/neoforged/neoforge", &neoforge_version),
    )
    .with_loader_version(&neoforge_version)
    .with_java_required(java_required)
    .with_downloaded_url(&installer_url);

    Ok(ProviderInstallResult {
        manifest,
        server_jar: None,
        notes: vec![argfile_note("NeoForge")],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn maps_to_minecraft_versions() {
        assert_eq!(neoforge_minecraft_version("21.11.38-beta").as_deref(), Some("1.21.11"));
        assert_eq!(neoforge_minecraft_version("21.10.64").as_deref(), Some("1.21.10"));
        assert_eq!(neoforge_minecraft_version("21.1.219").as_deref(), Some("1.21.1"));
        assert_eq!(neoforge_minecraft_version("21"), None);
        assert_eq!(neoforge_minecraft_version("21.x.1"), None);
    }

    #[test]
    fn latest_prefers_stable() {
        let all = versions(&["21.11.30-beta", "21.1.218", "21.1.219", "26.1.0.0-alpha.12+snapshot-7"]);
        let req = InstallRequest::new("neoforge", "/srv/mc");
        assert_eq!(resolve_neoforge_version(&req, &all).unwrap(), "21.1.219");
    }

    #[test]
    fn matches_minecraft_release() {
        let all = versions(&["21.0.167", "21.1.218", "21.1.219", "21.10.64", "21.11.30-beta"]);

        let req = InstallRequest::new("neoforge", "/srv/mc").with_minecraft_version("1.21.1");
        assert_eq!(resolve_neoforge_version(&req, &all).unwrap(), "21.1.219");

        let req = InstallRequest::new("neoforge", "/srv/mc").with_minecraft_version("1.21");
        assert_eq!(resolve_neoforge_version(&req, &all).unwrap(), "21.0.167");

        let req = InstallRequest::new("neoforge", "/srv/mc").with_minecraft_version("1.21.11");
        assert_eq!(resolve_neoforge_version(&req, &all).unwrap(), "21.11.30-beta");

        let req = InstallRequest::new("neoforge", "/srv/mc").with_minecraft_version("1.20.4");
        assert!(resolve_neoforge_version(&req, &all).is_err());
    }

    #[test]
    fn explicit_version_must_exist() {
        let all = versions(&["21.1.219"]);
        let req = InstallRequest::new("neoforge", "/srv/mc").with_loader_version("21.1.218");
        let err = resolve_neoforge_version(&req, &all).unwrap_err();
        assert!(err.to_string().contains("21.1.218"));
    }
}
