use crate::api::mojang::resolve_mojang_version;
use crate::api::transport::Transport;
use crate::error::{Error, Result};
use crate::game::installer::config::SERVER_JAR;
use crate::game::installer::core::traits::LoaderProvider;
use crate::game::installer::types::{InstallRequest, ProviderInstallResult};
use crate::game::launcher::manifest::{ServerManifest, StartCommands};
use crate::game::metadata::types::LoaderId;
use crate::utils::hash::ExpectedDigest;
use futures::future::BoxFuture;

/// The official Mojang server jar.
pub struct VanillaProvider;

impl LoaderProvider for VanillaProvider {
    fn loader(&self) -> LoaderId {
        LoaderId::Vanilla
    }

    fn install<'a>(
        &'a self,
        request: &'a InstallRequest,
        transport: &'a dyn Transport,
    ) -> BoxFuture<'a, Result<ProviderInstallResult>> {
        Box::pin(install_vanilla(request, transport))
    }
}

/// Install the vanilla server
pub async fn install_vanilla(
    request: &InstallRequest,
    transport: &dyn Transport,
) -> Result<ProviderInstallResult> {
    let (mc_version, details) = resolve_mojang_version(transport, &request.minecraft_version).await?;
    log::info!("Installing vanilla server {}", mc_version);

    let server = details.downloads.server.ok_or_else(|| {
        Error::VersionResolution(format!(
            "Minecraft version {} does not publish a server download.",
            mc_version
        ))
    })?;

    let server_jar = request.instance_dir.join(SERVER_JAR);
    let expected = server.sha1.as_deref().map(ExpectedDigest::sha1);
    transport
        .fetch_to_file(&server.url, &server_jar, expected.as_ref())
        .await?;

    let manifest = ServerManifest::new(LoaderId::Vanilla, &mc_version, StartCommands::jar(SERVER_JAR))
        .with_java_required(details.java_version.map(|j| j.major_version))
        .with_downloaded_url(&server.url);

    Ok(ProviderInstallResult {
        manifest,
        server_jar: Some(server_jar),
        notes: Vec::new(),
    })
}
