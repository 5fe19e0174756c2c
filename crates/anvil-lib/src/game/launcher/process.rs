//! Supervision of a running server process.
use crate::error::{Error, Result};
use crate::game::launcher::types::{ProcessState, StopOutcome, StopTimeouts};
use crate::utils::process::{display_command, AnvilCommandExt};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Number of output lines retained by [`ManagedProcess::recent_lines`].
pub const RECENT_LINES_CAPACITY: usize = 400;

/// Time allowed for the reader tasks to drain remaining output once the process exits.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Log sink - receives every line the server writes to stdout or stderr.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync + 'static>;

type LineBuffer = Arc<Mutex<VecDeque<String>>>;

fn push_line(buffer: &LineBuffer, line: String) {
    let mut guard = buffer.lock().unwrap_or_else(|p| p.into_inner());
    if guard.len() == RECENT_LINES_CAPACITY {
        guard.pop_front();
    }
    guard.push_back(line);
}

fn spawn_reader<R>(stream: R, tx: mpsc::UnboundedSender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {
                    while matches!(raw.last(), Some(b'\n' | b'\r')) {
                        raw.pop();
                    }
                    if tx.send(String::from_utf8_lossy(&raw).into_owned()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::debug!("Output reader stopped: {}", e);
                    break;
                }
            }
        }
    })
}

/// Single consumer for both output streams, so the buffer and sink see one arrival order.
fn spawn_collector(
    mut rx: mpsc::UnboundedReceiver<String>,
    buffer: LineBuffer,
    sink: Option<LogSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            // The lock is released before the sink runs
            push_line(&buffer, line.clone());
            if let Some(ref sink) = sink {
                sink(&line);
            }
        }
    })
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

#[derive(Debug)]
struct Status {
    state: ProcessState,
    exit_code: Option<i32>,
}

type StatusCell = Arc<Mutex<Status>>;

fn lock_status(status: &StatusCell) -> std::sync::MutexGuard<'_, Status> {
    status.lock().unwrap_or_else(|p| p.into_inner())
}

/// Read-only view of a [`ManagedProcess`] that stays usable while the owner waits or stops it.
#[derive(Clone)]
pub struct ProcessObserver {
    pid: u32,
    lines: LineBuffer,
    status: StatusCell,
}

impl std::fmt::Debug for ProcessObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessObserver")
            .field("pid", &self.pid)
            .field("state", &self.state())
            .finish()
    }
}

impl ProcessObserver {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        lock_status(&self.status).state
    }

    /// Exit code once the owner has observed the exit.
    pub fn exit_code(&self) -> Option<i32> {
        lock_status(&self.status).exit_code
    }

    pub fn is_running(&self) -> bool {
        self.state() != ProcessState::Exited
    }

    /// Snapshot of the most recent output lines, oldest first.
    pub fn recent_lines(&self) -> Vec<String> {
        snapshot(&self.lines)
    }
}

fn snapshot(lines: &LineBuffer) -> Vec<String> {
    let guard = lines.lock().unwrap_or_else(|p| p.into_inner());
    guard.iter().cloned().collect()
}

/// A server process with piped stdio and a bounded log of its recent output.
///
/// Stdout and stderr are merged into one log in the order lines arrive.
pub struct ManagedProcess {
    command: Vec<String>,
    cwd: PathBuf,
    pid: u32,
    child: Child,
    stdin: Option<ChildStdin>,
    lines: LineBuffer,
    readers: Vec<JoinHandle<()>>,
    status: StatusCell,
    stop_timeouts: StopTimeouts,
}

impl std::fmt::Debug for ManagedProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = lock_status(&self.status);
        f.debug_struct("ManagedProcess")
            .field("command", &self.command)
            .field("cwd", &self.cwd)
            .field("pid", &self.pid)
            .field("state", &status.state)
            .field("exit_code", &status.exit_code)
            .finish()
    }
}

impl ManagedProcess {
    /// Spawn `command` in `cwd` and start draining its output.
    pub fn start(
        command: Vec<String>,
        cwd: &Path,
        env: &BTreeMap<String, String>,
        log_sink: Option<LogSink>,
    ) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Manifest("Cannot start an empty command".into()))?;

        log::info!("Exec command: {}", display_command(&command));
        log::debug!("Working directory: {:?}", cwd);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(cwd)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .suppress_console();

        let status: StatusCell = Arc::new(Mutex::new(Status {
            state: ProcessState::Starting,
            exit_code: None,
        }));
        let mut child = cmd
            .spawn()
            .map_err(|e| Error::process(format!("Failed to spawn {}", program), e))?;
        let pid = child.id().ok_or_else(|| {
            Error::process(
                "Failed to get process ID",
                std::io::Error::new(std::io::ErrorKind::Other, "process exited immediately"),
            )
        })?;
        log::info!("Server process started with PID: {}", pid);

        let lines: LineBuffer = Arc::new(Mutex::new(VecDeque::with_capacity(RECENT_LINES_CAPACITY)));
        let (tx, rx) = mpsc::unbounded_channel();
        let mut readers = Vec::with_capacity(3);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, tx));
        }
        readers.push(spawn_collector(rx, lines.clone(), log_sink));
        let stdin = child.stdin.take();
        lock_status(&status).state = ProcessState::Running;

        Ok(Self {
            command,
            cwd: cwd.to_path_buf(),
            pid,
            child,
            stdin,
            lines,
            readers,
            status,
            stop_timeouts: StopTimeouts::default(),
        })
    }

    /// Override the escalation waits used by [`stop`](Self::stop).
    pub fn with_stop_timeouts(mut self, timeouts: StopTimeouts) -> Self {
        self.stop_timeouts = timeouts;
        self
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        lock_status(&self.status).state
    }

    /// Exit code, once the exit has been observed by `poll`, `wait` or `stop`.
    pub fn exit_code(&self) -> Option<i32> {
        lock_status(&self.status).exit_code
    }

    /// Snapshot of the most recent output lines, oldest first.
    pub fn recent_lines(&self) -> Vec<String> {
        snapshot(&self.lines)
    }

    /// Handle for reading output and state from other tasks.
    pub fn observer(&self) -> ProcessObserver {
        ProcessObserver {
            pid: self.pid,
            lines: self.lines.clone(),
            status: self.status.clone(),
        }
    }

    async fn mark_exited(&mut self, status: ExitStatus) -> i32 {
        let code = exit_code(status);
        if self.exit_code().is_none() {
            log::info!("Server process (PID {}) exited with code {}", self.pid, code);
        }
        self.stdin = None;
        for handle in self.readers.drain(..) {
            if tokio::time::timeout(READER_DRAIN_TIMEOUT, handle).await.is_err() {
                log::debug!("Output reader for PID {} still busy after exit", self.pid);
            }
        }
        let mut current = lock_status(&self.status);
        current.exit_code = Some(code);
        current.state = ProcessState::Exited;
        code
    }

    /// Non-blocking exit check.
    pub async fn poll(&mut self) -> Result<Option<i32>> {
        if let Some(code) = self.exit_code() {
            return Ok(Some(code));
        }
        match self.child.try_wait() {
            Ok(Some(status)) => Ok(Some(self.mark_exited(status).await)),
            Ok(None) => Ok(None),
            Err(e) => Err(Error::process(format!("Failed to poll PID {}", self.pid), e)),
        }
    }

    pub async fn is_running(&mut self) -> Result<bool> {
        Ok(self.poll().await?.is_none())
    }

    /// Wait for exit; `None` timeout waits indefinitely. Returns `Ok(None)` if the timeout elapses.
    pub async fn wait(&mut self, timeout: Option<Duration>) -> Result<Option<i32>> {
        if let Some(code) = self.exit_code() {
            return Ok(Some(code));
        }
        let status = match timeout {
            Some(limit) => match tokio::time::timeout(limit, self.child.wait()).await {
                Ok(status) => status,
                Err(_) => return Ok(None),
            },
            None => self.child.wait().await,
        };
        let status =
            status.map_err(|e| Error::process(format!("Failed to wait for PID {}", self.pid), e))?;
        Ok(Some(self.mark_exited(status).await))
    }

    /// Write a console command, appending a newline if needed. A closed stdin is ignored.
    pub async fn send_command(&mut self, text: &str) -> Result<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            log::debug!("Ignoring command for PID {}: stdin is closed", self.pid);
            return Ok(());
        };
        let mut line = text.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        let written = match stdin.write_all(line.as_bytes()).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                log::debug!("stdin of PID {} is closed, dropping command", self.pid);
                self.stdin = None;
                Ok(())
            }
            Err(e) => Err(Error::process(
                format!("Failed to write to stdin of PID {}", self.pid),
                e,
            )),
        }
    }

    fn terminate(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;
            if let Err(e) = kill(Pid::from_raw(self.pid as i32), Signal::SIGTERM) {
                log::warn!("Failed to send SIGTERM to PID {}: {}", self.pid, e);
            }
        }
        #[cfg(not(unix))]
        {
            if let Err(e) = self.child.start_kill() {
                log::warn!("Failed to terminate PID {}: {}", self.pid, e);
            }
        }
    }

    /// Stop the server and return its exit code.
    pub async fn stop(&mut self, graceful_timeout: Duration) -> Result<i32> {
        self.stop_with_outcome(graceful_timeout).await.map(|(code, _)| code)
    }

    /// Send `stop`, then escalate to terminate and kill, each only after the previous wait times out.
    pub async fn stop_with_outcome(&mut self, graceful_timeout: Duration) -> Result<(i32, StopOutcome)> {
        if let Some(code) = self.poll().await? {
            return Ok((code, StopOutcome::AlreadyExited));
        }

        lock_status(&self.status).state = ProcessState::Stopping;
        log::info!("Stopping server process (PID {})", self.pid);
        if let Err(e) = self.send_command("stop").await {
            log::warn!("Could not send stop command to PID {}: {}", self.pid, e);
        }
        if let Some(code) = self.wait(Some(graceful_timeout)).await? {
            return Ok((code, StopOutcome::Graceful));
        }

        log::warn!(
            "PID {} did not stop within {:?}, sending terminate signal",
            self.pid,
            graceful_timeout
        );
        self.terminate();
        if let Some(code) = self.wait(Some(self.stop_timeouts.terminate)).await? {
            return Ok((code, StopOutcome::Terminated));
        }

        log::warn!("PID {} ignored terminate signal, killing", self.pid);
        self.child
            .start_kill()
            .map_err(|e| Error::process(format!("Failed to kill PID {}", self.pid), e))?;
        match self.wait(Some(self.stop_timeouts.kill)).await? {
            Some(code) => Ok((code, StopOutcome::Killed)),
            None => Err(Error::process(
                format!("PID {} did not exit after kill", self.pid),
                std::io::Error::new(std::io::ErrorKind::TimedOut, "kill wait timed out"),
            )),
        }
    }
}
