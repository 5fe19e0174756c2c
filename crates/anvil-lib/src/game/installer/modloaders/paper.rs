use crate::api::mojang::java_requirement_best_effort;
use crate::api::transport::{fetch_typed, Transport};
use crate::error::{Error, Result};
use crate::game::installer::config::{PAPER_API_URL, SERVER_JAR};
use crate::game::installer::core::traits::LoaderProvider;
use crate::game::installer::types::{BuildId, InstallRequest, ProviderInstallResult};
use crate::game::launcher::manifest::{ServerManifest, StartCommands};
use crate::game::metadata::types::{LoaderId, PaperBuild, PaperBuildList, PaperProject};
use crate::utils::hash::ExpectedDigest;
use crate::utils::version::pick_latest_version;
use futures::future::BoxFuture;

/// PaperMC projects (Paper, Folia) share the v2 builds API.
pub struct PaperFamilyProvider {
    loader: LoaderId,
    project: &'static str,
}

impl PaperFamilyProvider {
    pub fn paper() -> Self {
        Self {
            loader: LoaderId::Paper,
            project: "paper",
        }
    }

    pub fn folia() -> Self {
        Self {
            loader: LoaderId::Folia,
            project: "folia",
        }
    }

    pub fn project(&self) -> &'static str {
        self.project
    }
}

impl LoaderProvider for PaperFamilyProvider {
    fn loader(&self) -> LoaderId {
        self.loader
    }

    fn install<'a>(
        &'a self,
        request: &'a InstallRequest,
        transport: &'a dyn Transport,
    ) -> BoxFuture<'a, Result<ProviderInstallResult>> {
        Box::pin(install_paper_family(self.loader, self.project, request, transport))
    }
}

pub fn project_url(project: &str) -> String {
    format!("{}/{}", PAPER_API_URL, project)
}

pub fn builds_url(project: &str, mc_version: &str) -> String {
    format!("{}/{}/versions/{}/builds", PAPER_API_URL, project, mc_version)
}

/// Choose a build: the explicit one if requested, else the highest default-channel build
/// (or highest of all builds when no default-channel build exists).
pub fn select_build<'b>(
    builds: &'b [PaperBuild],
    requested: Option<&BuildId>,
    project: &str,
    mc_version: &str,
) -> Result<&'b PaperBuild> {
    if builds.is_empty() {
        return Err(Error::VersionResolution(format!(
            "No builds found for {} {}.",
            project, mc_version
        )));
    }

    if let Some(requested) = requested {
        let wanted = requested.to_string();
        return builds
            .iter()
            .find(|b| b.build.to_string() == wanted.trim())
            .ok_or_else(|| {
                Error::VersionResolution(format!(
                    "{} build {} not found for {}.",
                    project, wanted, mc_version
                ))
            });
    }

    let defaults: Vec<&PaperBuild> = builds.iter().filter(|b| b.channel == "default").collect();
    let pool: Vec<&PaperBuild> = if defaults.is_empty() {
        builds.iter().collect()
    } else {
        defaults
    };
    pool.into_iter().max_by_key(|b| b.build).ok_or_else(|| {
        Error::VersionResolution(format!("No builds found for {} {}.", project, mc_version))
    })
}

async fn resolve_mc_version(
    project: &str,
    request: &InstallRequest,
    transport: &dyn Transport,
) -> Result<String> {
    let data: PaperProject = fetch_typed(transport, &project_url(project)).await?;
    if data.versions.is_empty() {
        return Err(Error::VersionResolution(format!(
            "No {} versions were returned by API.",
            project
        )));
    }
    if request.wants_latest() {
        return pick_latest_version(&data.versions, true);
    }
    if !data.versions.iter().any(|v| *v == request.minecraft_version) {
        return Err(Error::VersionResolution(format!(
            "{} does not have Minecraft version {}.",
            project, request.minecraft_version
        )));
    }
    Ok(request.minecraft_version.clone())
}

/// Install a Paper-family server jar
pub async fn install_paper_family(
    loader: LoaderId,
    project: &str,
    request: &InstallRequest,
    transport: &dyn Transport,
) -> Result<ProviderInstallResult> {
    let mc_version = resolve_mc_version(project, request, transport).await?;
    let builds: PaperBuildList = fetch_typed(transport, &builds_url(project, &mc_version)).await?;
    let build = select_build(&builds.builds, request.build.as_ref(), project, &mc_version)?;
    log::info!("Installing {} {} build {}", project, mc_version, build.build);

    let app = build.downloads.application.as_ref().ok_or_else(|| {
        Error::Download(format!(
            "{} build {} metadata did not include an application download.",
            project, build.build
        ))
    })?;

    let download_url = format!(
        "{}/{}/downloads/{}",
        builds_url(project, &mc_version),
        build.build,
        app.name
    );
    let server_jar = request.instance_dir.join(SERVER_JAR);
    let expected = app.sha256.as_deref().map(ExpectedDigest::sha256);
    transport
        .fetch_to_file(&download_url, &server_jar, expected.as_ref())
        .await?;

    let manifest = ServerManifest::new(loader, &mc_version, StartCommands::jar(SERVER_JAR))
        .with_build(build.build.to_string())
        .with_java_required(java_requirement_best_effort(transport, &mc_version).await)
        .with_downloaded_url(&download_url);

    Ok(ProviderInstallResult {
        manifest,
        server_jar: Some(server_jar),
        notes: Vec::new(),
    })
}
