use crate::api::mojang::java_requirement_best_effort;
use crate::api::transport::{fetch_typed, Transport};
use crate::error::{Error, Result};
use crate::game::installer::config::{FABRIC_META_URL, QUILT_META_URL};
use crate::game::installer::core::runner::run_checked;
use crate::game::installer::core::traits::LoaderProvider;
use crate::game::installer::types::{InstallRequest, ProviderInstallResult};
use crate::game::launcher::manifest::{ServerManifest, StartCommands};
use crate::game::metadata::types::{LoaderId, MetaGameVersion, MetaInstaller, MetaLoaderEntry};
use futures::future::BoxFuture;
use std::path::Path;

/// Fabric and Quilt publish the same meta shape and ship a CLI installer; only the
/// installer invocation and a few selection rules differ.
pub struct MetaLoaderProvider {
    flavor: &'static Flavor,
}

struct Flavor {
    loader: LoaderId,
    name: &'static str,
    meta_url: &'static str,
    launch_jar: &'static str,
    /// Default loader version: first stable entry (else first) instead of simply the first.
    prefer_stable_loader: bool,
    /// Same rule for the installer listing.
    prefer_stable_installer: bool,
    installer_args: fn(&Path, &Path, &str, &str) -> Vec<String>,
}

fn fabric_installer_args(installer: &Path, dir: &Path, mc: &str, loader: &str) -> Vec<String> {
    vec![
        "-jar".to_string(),
        installer.to_string_lossy().into_owned(),
        "server".to_string(),
        "-dir".to_string(),
        dir.to_string_lossy().into_owned(),
        "-mcversion".to_string(),
        mc.to_string(),
        "-loader".to_string(),
        loader.to_string(),
        "-downloadMinecraft".to_string(),
    ]
}

fn quilt_installer_args(installer: &Path, dir: &Path, mc: &str, loader: &str) -> Vec<String> {
    vec![
        "-jar".to_string(),
        installer.to_string_lossy().into_owned(),
        "install".to_string(),
        "server".to_string(),
        mc.to_string(),
        loader.to_string(),
        format!("--install-dir={}", dir.to_string_lossy()),
        "--download-server".to_string(),
    ]
}

static FABRIC: Flavor = Flavor {
    loader: LoaderId::Fabric,
    name: "Fabric",
    meta_url: FABRIC_META_URL,
    launch_jar: "fabric-server-launch.jar",
    prefer_stable_loader: true,
    prefer_stable_installer: true,
    installer_args: fabric_installer_args,
};

static QUILT: Flavor = Flavor {
    loader: LoaderId::Quilt,
    name: "Quilt",
    meta_url: QUILT_META_URL,
    launch_jar: "quilt-server-launch.jar",
    prefer_stable_loader: false,
    prefer_stable_installer: false,
    installer_args: quilt_installer_args,
};

impl MetaLoaderProvider {
    pub fn fabric() -> Self {
        Self { flavor: &FABRIC }
    }

    pub fn quilt() -> Self {
        Self { flavor: &QUILT }
    }
}

impl LoaderProvider for MetaLoaderProvider {
    fn loader(&self) -> LoaderId {
        self.flavor.loader
    }

    fn install<'a>(
        &'a self,
        request: &'a InstallRequest,
        transport: &'a dyn Transport,
    ) -> BoxFuture<'a, Result<ProviderInstallResult>> {
        Box::pin(install_loader(self.flavor, request, transport))
    }
}

fn resolve_mc_version(flavor: &Flavor, request: &InstallRequest, games: &[MetaGameVersion]) -> Result<String> {
    if request.wants_latest() {
        return games
            .iter()
            .find(|g| g.stable)
            .map(|g| g.version.clone())
            .ok_or_else(|| {
                Error::VersionResolution(format!("{} returned no stable game versions.", flavor.name))
            });
    }
    if !games.iter().any(|g| g.version == request.minecraft_version) {
        return Err(Error::VersionResolution(format!(
            "{} does not publish Minecraft version {}.",
            flavor.name, request.minecraft_version
        )));
    }
    Ok(request.minecraft_version.clone())
}

fn resolve_loader_version(
    flavor: &Flavor,
    request: &InstallRequest,
    entries: &[MetaLoaderEntry],
    mc_version: &str,
) -> Result<String> {
    if let Some(wanted) = request.explicit_loader_version() {
        if entries.iter().any(|e| e.loader.version == wanted) {
            return Ok(wanted.to_string());
        }
        return Err(Error::VersionResolution(format!(
            "{} loader version {} not found for {}.",
            flavor.name, wanted, mc_version
        )));
    }

    let stable = entries
        .iter()
        .find(|e| flavor.prefer_stable_loader && e.loader.stable == Some(true));
    stable
        .or_else(|| entries.first())
        .map(|e| e.loader.version.clone())
        .ok_or_else(|| {
            Error::VersionResolution(format!(
                "No {} loader versions found for {}.",
                flavor.name, mc_version
            ))
        })
}

fn resolve_installer<'i>(flavor: &Flavor, installers: &'i [MetaInstaller]) -> Result<&'i MetaInstaller> {
    installers
        .iter()
        .find(|i| flavor.prefer_stable_installer && i.stable == Some(true))
        .or_else(|| installers.first())
        .ok_or_else(|| {
            Error::VersionResolution(format!("{} returned no installer versions.", flavor.name))
        })
}

/// Shared installation logic for Fabric and Quilt
async fn install_loader(
    flavor: &Flavor,
    request: &InstallRequest,
    transport: &dyn Transport,
) -> Result<ProviderInstallResult> {
    let games: Vec<MetaGameVersion> =
        fetch_typed(transport, &format!("{}/game", flavor.meta_url)).await?;
    let mc_version = resolve_mc_version(flavor, request, &games)?;

    let loaders: Vec<MetaLoaderEntry> =
        fetch_typed(transport, &format!("{}/loader/{}", flavor.meta_url, mc_version)).await?;
    let loader_version = resolve_loader_version(flavor, request, &loaders, &mc_version)?;

    let installers: Vec<MetaInstaller> =
        fetch_typed(transport, &format!("{}/installer", flavor.meta_url)).await?;
    let installer = resolve_installer(flavor, &installers)?;

    log::info!(
        "Installing {} {} for Minecraft {} (installer {})",
        flavor.name,
        loader_version,
        mc_version,
        installer.version
    );

    let workdir = tempfile::tempdir()
        .map_err(|e| Error::Install(format!("Failed to create a temporary directory: {}", e)))?;
    let installer_jar = workdir
        .path()
        .join(format!("{}-installer.jar", flavor.name.to_ascii_lowercase()));
    transport
        .fetch_to_file(&installer.url, &installer_jar, None)
        .await?;

    let mut command = vec![request.java_path.clone()];
    command.extend((flavor.installer_args)(
        &installer_jar,
        &request.instance_dir,
        &mc_version,
        &loader_version,
    ));
    run_checked(&command, &request.instance_dir).await?;
    drop(workdir);

    let launch_jar = request.instance_dir.join(flavor.launch_jar);
    if !launch_jar.exists() {
        return Err(Error::Install(format!(
            "{} install completed but {} was not found.",
            flavor.name, flavor.launch_jar
        )));
    }

    let manifest = ServerManifest::new(flavor.loader, &mc_version, StartCommands::jar(flavor.launch_jar))
        .with_loader_version(&loader_version)
        .with_build(&installer.version)
        .with_java_required(java_requirement_best_effort(transport, &mc_version).await)
        .with_downloaded_url(&installer.url);

    Ok(ProviderInstallResult {
        manifest,
        server_jar: Some(launch_jar),
        notes: vec![format!(
            "{} installer was used to generate launcher and dependencies.",
            flavor.name
        )],
    })
}
