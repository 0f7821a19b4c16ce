// Detached one-shot spawn with an asynchronous error channel

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use tether_core::constants::{OUTPUT_CHUNK_SIZE, SPAWN_ERROR_CHANNEL_CAPACITY};
use tether_core::domain::SpawnOptions;
use tether_core::{ConnectorError, Result};

use crate::shell::shell_command;

/// Handle returned by `spawn`: the pid now, error output later.
///
/// Dropping the handle (or calling [`detach`](Self::detach)) stops error
/// delivery; the process itself keeps running.
#[derive(Debug)]
pub struct SpawnedProcess {
    pid: Option<u32>,
    errors: mpsc::Receiver<String>,
}

impl SpawnedProcess {
    /// Spawn `cmd` in the shell under `cwd` and return without waiting
    ///
    /// # Errors
    /// - ConnectorError::SpawnFailed if the shell cannot be started
    pub fn start(cmd: &str, options: &SpawnOptions, cwd: &Path) -> Result<Self> {
        let mut command = Command::from(shell_command(cmd));
        if options.clear_env {
            command.env_clear();
        }
        command
            .envs(&options.env)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| ConnectorError::SpawnFailed(format!("{}: {}", cmd, e)))?;

        let pid = child.id();
        let stderr = child.stderr.take();
        let (tx, rx) = mpsc::channel(SPAWN_ERROR_CHANNEL_CAPACITY);

        info!(pid = ?pid, cmd = %cmd, cwd = %cwd.display(), "Spawned detached process");

        tokio::spawn(watch_errors(pid, child, stderr, tx));

        Ok(Self { pid, errors: rx })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Next chunk of error output; `None` once stderr has closed
    pub async fn next_error(&mut self) -> Option<String> {
        self.errors.recv().await
    }

    /// Stop observing error output
    pub fn detach(self) {
        debug!(pid = ?self.pid, "Detached from spawned process");
    }
}

/// Forward stderr chunks, then reap the child
async fn watch_errors(
    pid: Option<u32>,
    mut child: Child,
    stderr: Option<ChildStderr>,
    tx: mpsc::Sender<String>,
) {
    if let Some(mut stderr) = stderr {
        let mut buf = vec![0u8; OUTPUT_CHUNK_SIZE];
        loop {
            let n = match stderr.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            let text = String::from_utf8_lossy(&buf[..n]).into_owned();
            error!(pid = ?pid, stderr = %text.trim_end(), "Spawned process wrote to stderr");

            // Keep draining when nobody listens so the child never blocks on the pipe
            if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(text) {
                warn!(pid = ?pid, "Error channel full, dropping output");
            }
        }
    }

    match child.wait().await {
        Ok(status) => debug!(pid = ?pid, status = %status, "Spawned process exited"),
        Err(e) => warn!(pid = ?pid, error = %e, "Failed to reap spawned process"),
    }
}
