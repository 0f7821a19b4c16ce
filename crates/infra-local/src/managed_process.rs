// Managed background processes (setup / tear_down)
// reason: tokio for output observation, nix for process-group signals

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tether_core::constants::{INTERRUPT_BYTE, OUTPUT_CHUNK_SIZE};
use tether_core::domain::ReadinessMatcher;
use tether_core::{ConnectorError, Result};

use crate::shell::shell_command;

/// Outcome reported by the output observer
#[derive(Debug)]
enum Readiness {
    Ready,
    Failed(String),
}

#[derive(Debug)]
enum ReadinessState {
    Pending(oneshot::Receiver<Readiness>),
    Ready,
    Failed(String),
    TornDown,
}

/// A background process started by `setup`, owned by the caller until torn down
///
/// Dropping a live handle kills the process group.
#[derive(Debug)]
pub struct ManagedProcess {
    pid: Option<u32>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    observer: Option<JoinHandle<()>>,
    readiness: ReadinessState,
}

impl ManagedProcess {
    /// Spawn `cmd` under `cwd` and start observing its output.
    ///
    /// Returns at once; with a readiness token, await [`wait_ready`](Self::wait_ready).
    ///
    /// # Errors
    /// - ConnectorError::SpawnFailed if the shell cannot be started
    pub fn start(cmd: &str, wait_for: Option<&str>, cwd: &Path) -> Result<Self> {
        let mut std_command = shell_command(cmd);
        std_command.current_dir(cwd);

        // Own process group so teardown reaches the shell's children too
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_command.process_group(0);
        }

        let mut child = Command::from(std_command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConnectorError::SpawnFailed(format!("{}: {}", cmd, e)))?;

        let pid = child.id();
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        info!(pid = ?pid, cmd = %cmd, wait_for = ?wait_for, "Started managed process");

        let (readiness, notify) = match wait_for {
            Some(token) => {
                let (tx, rx) = oneshot::channel();
                (ReadinessState::Pending(rx), Some((ReadinessMatcher::new(token), tx)))
            }
            None => (ReadinessState::Ready, None),
        };

        let observer = tokio::spawn(observe_output(pid, stdout, stderr, notify));

        Ok(Self {
            pid,
            child: Some(child),
            stdin,
            observer: Some(observer),
            readiness,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// True until [`tear_down`](Self::tear_down) has run
    pub fn is_live(&self) -> bool {
        self.child.is_some()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.readiness, ReadinessState::Ready)
    }

    /// Wait until stdout has contained the readiness token.
    ///
    /// Completes immediately when no token was given.
    ///
    /// # Errors
    /// - ConnectorError::ReadinessFailed if stderr output (or exit) came first
    pub async fn wait_ready(&mut self) -> Result<()> {
        // Awaited in place so a cancelled wait leaves the handle pending
        if let ReadinessState::Pending(rx) = &mut self.readiness {
            self.readiness = match rx.await {
                Ok(Readiness::Ready) => {
                    info!(pid = ?self.pid, "Managed process is ready");
                    ReadinessState::Ready
                }
                Ok(Readiness::Failed(msg)) => ReadinessState::Failed(msg),
                Err(_) => ReadinessState::Failed("output observer stopped before readiness".to_string()),
            };
        }

        match &self.readiness {
            ReadinessState::Ready => Ok(()),
            ReadinessState::Failed(msg) => Err(ConnectorError::ReadinessFailed(msg.clone())),
            ReadinessState::TornDown | ReadinessState::Pending(_) => Err(
                ConnectorError::ReadinessFailed("process was torn down".to_string()),
            ),
        }
    }

    /// Detach observers, send Ctrl-C on stdin, then force-terminate.
    ///
    /// Only acts on a live handle; a second call is a no-op. Termination
    /// failures are logged, not returned.
    pub async fn tear_down(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        info!(pid = ?self.pid, "Tearing down managed process");

        if let Some(observer) = self.observer.take() {
            observer.abort();
        }
        self.readiness = ReadinessState::TornDown;

        if let Some(mut stdin) = self.stdin.take() {
            let written = match stdin.write_all(&[INTERRUPT_BYTE]).await {
                Ok(()) => stdin.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                debug!(pid = ?self.pid, error = %e, "Interrupt byte not delivered");
            }
        }

        kill_group(self.pid);

        if let Err(e) = child.start_kill() {
            debug!(pid = ?self.pid, error = %e, "Kill signal not delivered");
        }

        match child.wait().await {
            Ok(status) => debug!(pid = ?self.pid, status = %status, "Managed process reaped"),
            Err(e) => warn!(pid = ?self.pid, error = %e, "Failed to reap managed process"),
        }
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Some(observer) = self.observer.take() {
                observer.abort();
            }
            kill_group(self.pid);
        }
    }
}

/// Drain stdout/stderr until both close, reporting the first readiness outcome
async fn observe_output(
    pid: Option<u32>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    notify: Option<(ReadinessMatcher, oneshot::Sender<Readiness>)>,
) {
    let (mut matcher, mut notify) = match notify {
        Some((matcher, tx)) => (Some(matcher), Some(tx)),
        None => (None, None),
    };

    let mut out_open = stdout.is_some();
    let mut err_open = stderr.is_some();
    let mut stdout = stdout;
    let mut stderr = stderr;
    let mut out_buf = vec![0u8; OUTPUT_CHUNK_SIZE];
    let mut err_buf = vec![0u8; OUTPUT_CHUNK_SIZE];

    while out_open || err_open {
        // Error output written before the token must win when both are pending
        tokio::select! {
            biased;

            read = read_chunk(&mut stderr, &mut err_buf), if err_open => match read {
                Some(n) => {
                    let text = String::from_utf8_lossy(&err_buf[..n]).into_owned();
                    warn!(pid = ?pid, stderr = %text.trim_end(), "Managed process wrote to stderr");
                    if let Some(tx) = notify.take() {
                        let _ = tx.send(Readiness::Failed(format!("error output: {}", text.trim_end())));
                    }
                }
                None => err_open = false,
            },
            read = read_chunk(&mut stdout, &mut out_buf), if out_open => match read {
                Some(n) => {
                    debug!(
                        pid = ?pid,
                        output = %String::from_utf8_lossy(&out_buf[..n]).trim_end(),
                        "Managed process stdout"
                    );
                    let matched = matcher.as_mut().is_some_and(|m| m.feed(&out_buf[..n]));
                    if matched {
                        if let Some(tx) = notify.take() {
                            info!(pid = ?pid, "Resolved wait_for condition on stdout");
                            let _ = tx.send(Readiness::Ready);
                        }
                    }
                }
                None => out_open = false,
            },
        }
    }

    if let Some(tx) = notify.take() {
        let _ = tx.send(Readiness::Failed(
            "output closed before the readiness token appeared".to_string(),
        ));
    }
    debug!(pid = ?pid, "Managed process output closed");
}

/// Read one chunk; `None` on EOF or error
async fn read_chunk<R>(stream: &mut Option<R>, buf: &mut [u8]) -> Option<usize>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let reader = stream.as_mut()?;
    match reader.read(buf).await {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

/// SIGKILL the whole process group led by `pid`
fn kill_group(pid: Option<u32>) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = pid {
            if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                debug!(pid = %pid, error = %e, "Process group already gone");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
    }
}

/// Check if a process is still alive
pub fn is_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        // No signal: existence check only
        kill(Pid::from_raw(pid as i32), None::<Signal>).is_ok()
    }

    #[cfg(windows)]
    {
        use std::process::Command;

        let output = Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH"])
            .output();

        if let Ok(output) = output {
            let output_str = String::from_utf8_lossy(&output.stdout);
            output_str.contains(&pid.to_string())
        } else {
            false
        }
    }
}
