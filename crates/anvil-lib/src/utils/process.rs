/// Extension trait for commands spawned by the installer and server supervisor.
pub trait AnvilCommandExt {
    /// Hides the console window on Windows. No-op on other platforms.
    fn suppress_console(&mut self) -> &mut Self;
}

impl AnvilCommandExt for tokio::process::Command {
    fn suppress_console(&mut self) -> &mut Self {
        #[cfg(windows)]
        {
            self.creation_flags(windows_sys::Win32::System::Threading::CREATE_NO_WINDOW);
        }
        self
    }
}

/// Render an argv for logs, quoting only where the shell would need it.
pub fn display_command(argv: &[String]) -> String {
    shlex::try_join(argv.iter().map(String::as_str))
        .unwrap_or_else(|_| argv.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_paths_with_spaces() {
        let argv = vec![
            "java".to_string(),
            "-jar".to_string(),
            "/srv/my server/server.jar".to_string(),
        ];
        let rendered = display_command(&argv);
        assert_eq!(shlex::split(&rendered), Some(argv));
    }
}
