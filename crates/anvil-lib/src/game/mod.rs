pub mod installer;
pub mod launcher;
pub mod manager;
pub mod metadata;

// Re-export commonly used types
pub use installer::types::{BuildId, InstallRequest, InstallResult};
pub use launcher::{LaunchOptions, ManagedProcess, ServerManifest, StartCommands};
pub use manager::ServerManager;
pub use metadata::{LoaderId, VersionCatalog};
