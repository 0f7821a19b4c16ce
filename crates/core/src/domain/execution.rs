// Execution Result Domain Model

use serde::{Deserialize, Serialize};

/// Result of a one-shot command
///
/// The exit code is always present: a round-trip that yields no status is a
/// [`ProtocolViolation`](crate::ConnectorError::ProtocolViolation), never a zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionResult {
    /// Build a result from raw stdout, dropping its final line terminator
    pub fn from_raw(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self {
            stdout: strip_line_terminator(stdout),
            stderr,
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Remove one trailing `\n` (or `\r\n`).
///
/// Joining a command's output lines never reproduces the terminator of the
/// last line, so both capture modes hand back `"hello"` for `echo hello`.
pub fn strip_line_terminator(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}
