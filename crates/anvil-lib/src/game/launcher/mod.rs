/// Start-command construction and supervision of the running server
pub mod arguments;
pub mod manifest;
pub mod process;
pub mod types;

// Re-export commonly used types
pub use crate::game::installer::types::OsType;
pub use arguments::{build_start_command, build_start_command_for, validate_start_paths};
pub use manifest::{load_manifest, save_manifest, ServerManifest, StartCommands};
pub use process::{LogSink, ManagedProcess, ProcessObserver};
pub use types::{LaunchOptions, ProcessState, StopOutcome, StopTimeouts};
