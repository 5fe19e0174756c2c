/// Core types for starting an installed server
use std::collections::BTreeMap;
use std::time::Duration;

/// JVM settings applied on top of the manifest's start template
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Java executable substituted for `{java}`
    pub java_path: String,

    /// Initial heap, e.g. "2G" (becomes `-Xms2G`)
    pub xms: Option<String>,

    /// Maximum heap, e.g. "4G" (becomes `-Xmx4G`)
    pub xmx: Option<String>,

    /// Extra JVM arguments, inserted after the memory flags
    pub jvm_args: Vec<String>,

    /// Extra environment variables for the server process
    pub env: BTreeMap<String, String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            java_path: "java".to_string(),
            xms: None,
            xmx: None,
            jvm_args: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}

impl LaunchOptions {
    pub fn new(java_path: impl Into<String>) -> Self {
        Self {
            java_path: java_path.into(),
            ..Self::default()
        }
    }

    pub fn with_memory(mut self, xms: Option<&str>, xmx: Option<&str>) -> Self {
        self.xms = xms.map(str::to_string);
        self.xmx = xmx.map(str::to_string);
        self
    }

    pub fn with_jvm_arg(mut self, arg: impl Into<String>) -> Self {
        self.jvm_args.push(arg.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// How long each escalation stage of a stop may take after the graceful window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTimeouts {
    /// Wait after the terminate signal
    pub terminate: Duration,
    /// Wait after the kill signal
    pub kill: Duration,
}

impl Default for StopTimeouts {
    fn default() -> Self {
        Self {
            terminate: Duration::from_secs(10),
            kill: Duration::from_secs(5),
        }
    }
}

/// Lifecycle of a managed server process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Starting,
    Running,
    Stopping,
    Exited,
}

/// Which stage of [`stop`](crate::game::launcher::process::ManagedProcess::stop) ended the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Had already exited before the stop was requested
    AlreadyExited,
    /// Exited on its own after the `stop` command
    Graceful,
    /// Exited after the terminate signal
    Terminated,
    /// Exited after the kill signal
    Killed,
}
