//! Facade tying providers, manifest persistence and process supervision together.

use crate::api::transport::{HttpTransport, Transport};
use crate::error::{Error, Result};
use crate::game::installer::types::{InstallRequest, InstallResult};
use crate::game::installer::ProviderRegistry;
use crate::game::launcher::arguments::{build_start_command, validate_start_paths, validate_start_template};
use crate::game::launcher::manifest::{self, ServerManifest};
use crate::game::launcher::process::{LogSink, ManagedProcess};
use crate::game::launcher::types::LaunchOptions;
use crate::game::metadata::catalog::VersionCatalog;
use crate::game::metadata::types::LoaderId;
use crate::utils::properties::{read_server_endpoint, write_eula, write_server_properties};
use crate::utils::version::normalize_loader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ServerManager {
    transport: Arc<dyn Transport>,
    registry: ProviderRegistry,
}

impl ServerManager {
    /// Manager backed by the default HTTPS transport.
    pub fn new() -> Result<Self> {
        Ok(Self::with_transport(Arc::new(HttpTransport::with_defaults()?)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            registry: ProviderRegistry::with_defaults(),
        }
    }

    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn list_supported_loaders(&self) -> Vec<LoaderId> {
        self.registry.loaders()
    }

    /// Catalog sharing this manager's transport.
    pub fn catalog(&self) -> VersionCatalog {
        VersionCatalog::new(self.transport.clone())
    }

    /// Install a server into `request.instance_dir`.
    ///
    /// The manifest is only written once the provider has produced a runnable instance.
    pub async fn install(&self, request: InstallRequest) -> Result<InstallResult> {
        let loader = normalize_loader(&request.loader)?;
        let provider = self.registry.get(loader)?;

        let instance_dir = prepare_instance_dir(&request.instance_dir).await?;
        let request = InstallRequest {
            loader: loader.as_str().to_string(),
            instance_dir: instance_dir.clone(),
            ..request
        };

        log::info!(
            "Starting installation: loader={}, minecraft={}, dir={:?}",
            loader,
            request.minecraft_version,
            instance_dir
        );

        let result = provider.install(&request, self.transport.as_ref()).await?;

        write_eula(&instance_dir, request.accept_eula).await?;
        write_server_properties(&instance_dir, &request.server_properties).await?;
        let manifest_path = manifest::save_manifest(&instance_dir, &result.manifest)?;

        log::info!(
            "Installation completed successfully: {} {}",
            result.manifest.loader,
            result.manifest.minecraft_version
        );

        Ok(InstallResult {
            instance_dir,
            manifest_path,
            manifest: result.manifest,
            server_jar: result.server_jar,
            notes: result.notes,
        })
    }

    pub fn load_manifest(&self, instance_dir: &Path) -> Result<ServerManifest> {
        manifest::load_manifest(instance_dir)
    }

    pub fn build_start_command(
        &self,
        manifest: &ServerManifest,
        options: &LaunchOptions,
    ) -> Result<Vec<String>> {
        build_start_command(manifest, options)
    }

    /// Validate the installed start command against the instance sandbox and spawn it.
    pub async fn start(
        &self,
        instance_dir: &Path,
        options: &LaunchOptions,
        log_sink: Option<LogSink>,
    ) -> Result<ManagedProcess> {
        let instance_dir = dunce::canonicalize(instance_dir).map_err(|e| Error::io(instance_dir, e))?;
        let manifest = manifest::load_manifest(&instance_dir)?;

        let template = manifest.start.for_current_os();
        validate_start_template(template)?;
        validate_start_paths(template, &instance_dir)?;

        let command = build_start_command(&manifest, options)?;
        ManagedProcess::start(command, &instance_dir, &options.env, log_sink)
    }

    /// Address the server will listen on, from its `server.properties`.
    pub async fn server_endpoint(&self, instance_dir: &Path) -> Result<(String, u16)> {
        read_server_endpoint(instance_dir).await
    }
}

async fn prepare_instance_dir(dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io(dir, e))?;
    dunce::canonicalize(dir).map_err(|e| Error::io(dir, e))
}
