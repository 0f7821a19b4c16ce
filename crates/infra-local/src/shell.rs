// Shell invocation and one-shot execution
// reason: tokio::process for async round-trips

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use tether_core::domain::status_line;
use tether_core::domain::ExecutionResult;
use tether_core::{ConnectorError, ExecCapture, Result};

/// Platform shell running `script` verbatim
pub fn shell_command(script: &str) -> std::process::Command {
    #[cfg(windows)]
    {
        let mut command = std::process::Command::new("cmd");
        command.arg("/C").arg(script);
        command
    }

    #[cfg(not(windows))]
    {
        let mut command = std::process::Command::new("sh");
        command.arg("-c").arg(script);
        command
    }
}

/// Run `cmd` to completion under `cwd` and recover its exit code
///
/// # Errors
/// - ConnectorError::SpawnFailed if the shell cannot be started
/// - ConnectorError::ProtocolViolation if no exit code can be recovered
pub async fn run(cmd: &str, cwd: &Path, capture: ExecCapture) -> Result<ExecutionResult> {
    let script = match capture {
        ExecCapture::Native => cmd.to_string(),
        ExecCapture::StatusLine => {
            if cfg!(windows) {
                return Err(ConnectorError::UnsupportedPlatform(
                    "status-line capture requires a POSIX shell".to_string(),
                ));
            }
            status_line::wrap_command(cmd)
        }
    };

    info!(
        cmd = %cmd,
        cwd = %cwd.display(),
        capture = %capture,
        "Executing command"
    );

    let output = Command::from(shell_command(&script))
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ConnectorError::SpawnFailed(format!("{}: {}", cwd.display(), e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    let result = match capture {
        ExecCapture::Native => {
            let exit_code = output.status.code().ok_or_else(|| {
                ConnectorError::ProtocolViolation(format!(
                    "shell ended without an exit code ({})",
                    output.status
                ))
            })?;
            ExecutionResult::from_raw(stdout, stderr, exit_code)
        }
        ExecCapture::StatusLine => status_line::parse_result(&stdout, stderr)?,
    };

    debug!(
        cmd = %cmd,
        exit_code = result.exit_code,
        stdout_bytes = result.stdout.len(),
        stderr_bytes = result.stderr.len(),
        "Command completed"
    );

    Ok(result)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    async fn both_modes(cmd: &str) -> (ExecutionResult, ExecutionResult) {
        let cwd = std::env::temp_dir();
        let native = run(cmd, &cwd, ExecCapture::Native).await.unwrap();
        let inline = run(cmd, &cwd, ExecCapture::StatusLine).await.unwrap();
        (native, inline)
    }

    #[tokio::test]
    async fn test_echo_hello() {
        let (native, inline) = both_modes("echo hello").await;
        for result in [native, inline] {
            assert_eq!(result.stdout, "hello");
            assert_eq!(result.exit_code, 0);
        }
    }

    #[tokio::test]
    async fn test_exit_codes() {
        let (native, inline) = both_modes("exit 7").await;
        assert_eq!(native.exit_code, 7);
        assert_eq!(inline.exit_code, 7);
        assert_eq!(native.stdout, "");
        assert_eq!(inline.stdout, "");

        let (native, inline) = both_modes("exit 0").await;
        assert_eq!(native.exit_code, 0);
        assert_eq!(inline.exit_code, 0);
    }

    #[tokio::test]
    async fn test_empty_command() {
        let (native, inline) = both_modes("").await;
        for result in [native, inline] {
            assert_eq!(result.exit_code, 0);
            assert_eq!(result.stdout, "");
        }
    }

    #[tokio::test]
    async fn test_heredoc_keeps_status_line() {
        let (native, inline) = both_modes("cat <<EOF\nline one\nline two\nEOF\n").await;
        for result in [native, inline] {
            assert_eq!(result.stdout, "line one\nline two");
            assert_eq!(result.exit_code, 0);
        }
    }

    #[tokio::test]
    async fn test_stderr_and_failure_are_data() {
        let (native, inline) = both_modes("echo oops >&2; echo partial; false").await;
        for result in [native, inline] {
            assert_eq!(result.stdout, "partial");
            assert_eq!(result.stderr, "oops\n");
            assert_eq!(result.exit_code, 1);
        }
    }

    #[tokio::test]
    async fn test_numeric_last_line_is_output() {
        let (native, inline) = both_modes("echo 42; exit 3").await;
        for result in [native, inline] {
            assert_eq!(result.stdout, "42");
            assert_eq!(result.exit_code, 3);
        }
    }

    #[tokio::test]
    async fn test_missing_cwd_is_spawn_failure() {
        let result = run(
            "true",
            Path::new("/definitely/not/a/dir"),
            ExecCapture::Native,
        )
        .await;
        assert!(matches!(result, Err(ConnectorError::SpawnFailed(_))));
    }

    #[tokio::test]
    async fn test_killed_shell_is_protocol_violation() {
        let result = run("kill -9 $$", &std::env::temp_dir(), ExecCapture::Native).await;
        assert!(matches!(result, Err(ConnectorError::ProtocolViolation(_))));
    }
}
