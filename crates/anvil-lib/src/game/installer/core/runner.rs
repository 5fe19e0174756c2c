use crate::error::{Error, Result};
use crate::game::installer::config::INSTALLER_TIMEOUT_SECS;
use crate::utils::process::{display_command, AnvilCommandExt};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Run an installer to completion, failing with its output if it exits non-zero.
pub async fn run_checked(command: &[String], cwd: &Path) -> Result<()> {
    run_checked_with_timeout(command, cwd, Duration::from_secs(INSTALLER_TIMEOUT_SECS)).await
}

pub async fn run_checked_with_timeout(command: &[String], cwd: &Path, timeout: Duration) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::Install("Installer command is empty".into()))?;
    let rendered = display_command(command);
    log::info!("Running installer: {}", rendered);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .suppress_console();

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| {
            Error::Install(format!(
                "Command timed out after {}s: {}",
                timeout.as_secs(),
                rendered
            ))
        })?
        .map_err(|e| Error::Install(format!("Failed to run {}: {}", rendered, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let details = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
        let code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string());
        log::error!("Installer failed with exit code {}", code);
        return Err(Error::Install(format!(
            "Command failed with exit code {}: {}\n{}",
            code, rendered, details
        )));
    }

    log::debug!("Installer finished: {}", rendered);
    Ok(())
}
