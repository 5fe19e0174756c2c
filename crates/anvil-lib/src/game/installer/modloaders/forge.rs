use crate::api::maven::fetch_maven_metadata;
use crate::api::mojang::java_requirement_best_effort;
use crate::api::transport::Transport;
use crate::error::{Error, Result};
use crate::game::installer::config::FORGE_MAVEN_URL;
use crate::game::installer::core::runner::run_checked;
use crate::game::installer::core::traits::LoaderProvider;
use crate::game::installer::types::{InstallRequest, ProviderInstallResult};
use crate::game::launcher::manifest::{ServerManifest, StartCommands, JAVA_PLACEHOLDER};
use crate::game::metadata::types::LoaderId;
use crate::utils::version::{is_stable_version, pick_latest_version};
use futures::future::BoxFuture;

pub struct ForgeProvider;

impl LoaderProvider for ForgeProvider {
    fn loader(&self) -> LoaderId {
        LoaderId::Forge
    }

    fn install<'a>(
        &'a self,
        request: &'a InstallRequest,
        transport: &'a dyn Transport,
    ) -> BoxFuture<'a, Result<ProviderInstallResult>> {
        Box::pin(install_forge(request, transport))
    }
}

/// Forge versions are `<mc>-<forge>`; the Minecraft part is everything before the first dash.
pub fn forge_minecraft_version(forge_version: &str) -> Option<&str> {
    forge_version.split_once('-').map(|(mc, _)| mc)
}

/// Pick a Forge version.
///
/// An explicit loader version must be published. For "latest" the repository's
/// `<release>` marker wins when it looks stable, otherwise the newest stable entry.
/// For a concrete Minecraft version the newest `<mc>-*` entry, stable ones first.
pub fn resolve_forge_version(
    request: &InstallRequest,
    versions: &[String],
    release: Option<&str>,
) -> Result<String> {
    if let Some(wanted) = request.explicit_loader_version() {
        if !versions.iter().any(|v| v == wanted) {
            return Err(Error::VersionResolution(format!(
                "Forge version {} was not found.",
                wanted
            )));
        }
        return Ok(wanted.to_string());
    }

    if request.wants_latest() {
        if let Some(release) = release.filter(|r| is_stable_version(r)) {
            return Ok(release.to_string());
        }
        let stable: Vec<&String> = versions.iter().filter(|v| is_stable_version(v)).collect();
        return pick_latest_version(&stable, false);
    }

    let prefix = format!("{}-", request.minecraft_version);
    let candidates: Vec<&String> = versions.iter().filter(|v| v.starts_with(&prefix)).collect();
    if candidates.is_empty() {
        return Err(Error::VersionResolution(format!(
            "No Forge versions found for Minecraft {}.",
            request.minecraft_version
        )));
    }
    let stable: Vec<&String> = candidates
        .iter()
        .copied()
        .filter(|v| is_stable_version(v))
        .collect();
    if stable.is_empty() {
        pick_latest_version(&candidates, false)
    } else {
        pick_latest_version(&stable, false)
    }
}

/// Start commands that launch straight from the installer's argfiles instead of its run scripts.
pub(crate) fn argfile_start_commands(library_path: &str, version: &str) -> StartCommands {
    let args = |file: &str| {
        vec![
            JAVA_PLACEHOLDER.to_string(),
            "@user_jvm_args.txt".to_string(),
            format!("@libraries/{}/{}/{}", library_path, version, file),
            "nogui".to_string(),
        ]
    };
    StartCommands::new(args("unix_args.txt"))
        .with_windows(args("win_args.txt"))
        .with_posix(args("unix_args.txt"))
}

/// Download an installer jar to a scratch directory and run it with `--installServer`.
/// The installer must leave `run.bat` or `run.sh` behind.
pub(crate) async fn run_server_installer(
    name: &str,
    installer_url: &str,
    request: &InstallRequest,
    transport: &dyn Transport,
) -> Result<()> {
    let workdir = tempfile::tempdir()
        .map_err(|e| Error::Install(format!("Failed to create a temporary directory: {}", e)))?;
    let installer_jar = workdir
        .path()
        .join(format!("{}-installer.jar", name.to_ascii_lowercase()));
    transport.fetch_to_file(installer_url, &installer_jar, None).await?;

    let command = vec![
        request.java_path.clone(),
        "-jar".to_string(),
        installer_jar.to_string_lossy().into_owned(),
        "--installServer".to_string(),
        request.instance_dir.to_string_lossy().into_owned(),
    ];
    run_checked(&command, &request.instance_dir).await?;

    let has_scripts = ["run.bat", "run.sh"]
        .iter()
        .any(|script| request.instance_dir.join(script).exists());
    if !has_scripts {
        return Err(Error::Install(format!(
            "{} install completed but run scripts were not found.",
            name
        )));
    }
    Ok(())
}

pub(crate) fn argfile_note(name: &str) -> String {
    format!(
        "{} installer artifacts installed. Startup uses Java argfiles directly (not run.bat).",
        name
    )
}

/// Install a Forge server through the official installer
pub async fn install_forge(
    request: &InstallRequest,
    transport: &dyn Transport,
) -> Result<ProviderInstallResult> {
    let metadata = fetch_maven_metadata(transport, FORGE_MAVEN_URL).await?;
    if metadata.versions.is_empty() {
        return Err(Error::VersionResolution("Forge metadata returned no versions.".into()));
    }
    let forge_version = resolve_forge_version(request, &metadata.versions, metadata.release.as_deref())?;
    let mc_version = forge_minecraft_version(&forge_version)
        .unwrap_or(&forge_version)
        .to_string();
    log::info!("Installing Forge {} (Minecraft {})", forge_version, mc_version);

    let installer_url = format!(
        "{}/{}/forge-{}-installer.jar",
        FORGE_MAVEN_URL, forge_version, forge_version
    );
    run_server_installer("Forge", &installer_url, request, transport).await?;

    let manifest = ServerManifest::new(
        LoaderId::Forge,
        &mc_version,
        argfile_start_commands("net/minecraftforge/forge", &forge_version),
    )
    .with_loader_version(&forge_version)
    .with_java_required(java_requirement_best_effort(transport, &mc_version).await)
    .with_downloaded_url(&installer_url);

    Ok(ProviderInstallResult {
        manifest,
        server_jar: None,
        notes: vec![argfile_note("Forge")],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::installer::types::OsType;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn resolves_newest_for_minecraft_version() {
        let all = versions(&["1.21.1-52.0.1", "1.21.1-52.0.2", "1.21.2-53.0.1"]);
        let req = InstallRequest::new("forge", "/srv/mc").with_minecraft_version("1.21.1");
        assert_eq!(resolve_forge_version(&req, &all, None).unwrap(), "1.21.1-52.0.2");

        let req = InstallRequest::new("forge", "/srv/mc").with_minecraft_version("1.20.4");
        let err = resolve_forge_version(&req, &all, None).unwrap_err();
        assert!(err.to_string().contains("1.20.4"));
    }

    #[test]
    fn latest_uses_stable_release_marker() {
        let all = versions(&["1.21.10-60.0.1", "1.21.11-61.1.1", "1.21.11-61.2.0-beta"]);
        let req = InstallRequest::new("forge", "/srv/mc");
        assert_eq!(
            resolve_forge_version(&req, &all, Some("1.21.10-60.0.1")).unwrap(),
            "1.21.10-60.0.1"
        );
        assert_eq!(
            resolve_forge_version(&req, &all, Some("1.21.11-61.2.0-beta")).unwrap(),
            "1.21.11-61.1.1"
        );
        assert_eq!(resolve_forge_version(&req, &all, None).unwrap(), "1.21.11-61.1.1");
    }

    #[test]
    fn explicit_version_must_exist() {
        let all = versions(&["1.21.1-52.0.1"]);
        let req = InstallRequest::new("forge", "/srv/mc").with_loader_version("1.21.1-52.0.1");
        assert_eq!(resolve_forge_version(&req, &all, None).unwrap(), "1.21.1-52.0.1");

        let req = InstallRequest::new("forge", "/srv/mc").with_loader_version("1.21.1-99.0.0");
        assert!(resolve_forge_version(&req, &all, None).is_err());
    }

    #[test]
    fn minecraft_part_of_forge_version() {
        assert_eq!(forge_minecraft_version("1.21.11-61.1.1"), Some("1.21.11"));
        assert_eq!(forge_minecraft_version("61.1.1"), None);
    }

    #[test]
    fn argfile_commands_per_os() {
        let start = argfile_start_commands("net/minecraftforge/forge", "1.21.1-52.0.2");
        assert_eq!(start.default[0], JAVA_PLACEHOLDER);
        assert_eq!(
            start.select(OsType::Windows)[2],
            "@libraries/net/minecraftforge/forge/1.21.1-52.0.2/win_args.txt"
        );
        assert_eq!(
            start.select(OsType::Posix)[2],
            "@libraries/net/minecraftforge/forge/1.21.1-52.0.2/unix_args.txt"
        );
    }
}
