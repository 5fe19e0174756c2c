//! Minecraft server installation and supervision.
//!
//! Resolves versions for vanilla, Paper, Folia, Purpur, Fabric, Quilt, Forge and NeoForge,
//! installs them into an instance directory with a persisted manifest, and runs the
//! resulting server as a managed child process.

pub mod api;
pub mod error;
pub mod game;
pub mod utils;

pub use api::{HttpTransport, Transport, TransportConfig};
pub use error::{Error, ErrorKind, Result};
pub use game::installer::types::OsType;
pub use game::launcher::{LogSink, ProcessObserver, ProcessState, StopOutcome, StopTimeouts};
pub use game::{
    BuildId, InstallRequest, InstallResult, LaunchOptions, LoaderId, ManagedProcess, ServerManager,
    ServerManifest, StartCommands, VersionCatalog,
};
pub use utils::hash::{DigestAlgorithm, ExpectedDigest};
pub use utils::version::{is_stable_version, normalize_loader, pick_latest_version, version_key};
