use crate::api::transport::Transport;
use crate::error::Result;
use crate::game::installer::types::{InstallRequest, ProviderInstallResult};
use crate::game::metadata::types::LoaderId;
use futures::future::BoxFuture;

/// Trait for loader providers.
/// Each loader (Paper, Fabric, Forge, ...) resolves its own versions and produces
/// a runnable instance plus the manifest describing how to start it.
pub trait LoaderProvider: Send + Sync {
    fn loader(&self) -> LoaderId;

    /// Install into `request.instance_dir`, which already exists.
    fn install<'a>(
        &'a self,
        request: &'a InstallRequest,
        transport: &'a dyn Transport,
    ) -> BoxFuture<'a, Result<ProviderInstallResult>>;
}
