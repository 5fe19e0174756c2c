use crate::api::mojang::java_requirement_best_effort;
use crate::api::transport::{fetch_typed, Transport};
use crate::error::{Error, Result};
use crate::game::installer::config::{PURPUR_API_URL, SERVER_JAR};
use crate::game::installer::core::traits::LoaderProvider;
use crate::game::installer::types::{InstallRequest, ProviderInstallResult};
use crate::game::launcher::manifest::{ServerManifest, StartCommands};
use crate::game::metadata::types::{
    json_scalar_to_string, LoaderId, PurpurBuild, PurpurProject, PurpurVersion,
};
use crate::utils::hash::ExpectedDigest;
use crate::utils::version::pick_latest_version;
use futures::future::BoxFuture;

pub struct PurpurProvider;

impl LoaderProvider for PurpurProvider {
    fn loader(&self) -> LoaderId {
        LoaderId::Purpur
    }

    fn install<'a>(
        &'a self,
        request: &'a InstallRequest,
        transport: &'a dyn Transport,
    ) -> BoxFuture<'a, Result<ProviderInstallResult>> {
        Box::pin(install_purpur(request, transport))
    }
}

async fn resolve_mc_version(request: &InstallRequest, transport: &dyn Transport) -> Result<String> {
    let data: PurpurProject = fetch_typed(transport, PURPUR_API_URL).await?;
    if data.versions.is_empty() {
        return Err(Error::VersionResolution("Purpur API returned no versions.".into()));
    }
    if request.wants_latest() {
        return pick_latest_version(&data.versions, true);
    }
    if !data.versions.iter().any(|v| *v == request.minecraft_version) {
        return Err(Error::VersionResolution(format!(
            "Purpur version {} was not found.",
            request.minecraft_version
        )));
    }
    Ok(request.minecraft_version.clone())
}

/// Pick the requested build (validated against the published list when there is one), else `builds.latest`.
fn resolve_build(request: &InstallRequest, info: &PurpurVersion, mc_version: &str) -> Result<String> {
    if let Some(requested) = &request.build {
        let wanted = requested.to_string();
        let all: Vec<String> = info.builds.all.iter().filter_map(json_scalar_to_string).collect();
        if !all.is_empty() && !all.contains(&wanted) {
            return Err(Error::VersionResolution(format!(
                "Purpur build {} not found for {}.",
                wanted, mc_version
            )));
        }
        return Ok(wanted);
    }

    info.builds
        .latest
        .as_ref()
        .and_then(json_scalar_to_string)
        .ok_or_else(|| Error::VersionResolution(format!("Purpur has no build for {}.", mc_version)))
}

/// Install a Purpur server jar
pub async fn install_purpur(
    request: &InstallRequest,
    transport: &dyn Transport,
) -> Result<ProviderInstallResult> {
    let mc_version = resolve_mc_version(request, transport).await?;
    let info: PurpurVersion = fetch_typed(transport, &format!("{}/{}", PURPUR_API_URL, mc_version)).await?;
    let build = resolve_build(request, &info, &mc_version)?;
    log::info!("Installing Purpur {} build {}", mc_version, build);

    let build_info: PurpurBuild =
        fetch_typed(transport, &format!("{}/{}/{}", PURPUR_API_URL, mc_version, build)).await?;

    let download_url = format!("{}/{}/{}/download", PURPUR_API_URL, mc_version, build);
    let server_jar = request.instance_dir.join(SERVER_JAR);
    let expected = build_info.md5.as_deref().map(ExpectedDigest::md5);
    transport
        .fetch_to_file(&download_url, &server_jar, expected.as_ref())
        .await?;

    let manifest = ServerManifest::new(LoaderId::Purpur, &mc_version, StartCommands::jar(SERVER_JAR))
        .with_build(build)
        .with_java_required(java_requirement_best_effort(transport, &mc_version).await)
        .with_downloaded_url(&download_url);

    Ok(ProviderInstallResult {
        manifest,
        server_jar: Some(server_jar),
        notes: Vec::new(),
    })
}
