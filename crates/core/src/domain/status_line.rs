// Status-line protocol for transports without a native exit status
//
// The command runs in a subshell followed by a separately terminated
// `printf`, so the last stdout line is always the original command's `$?`.
// POSIX shells only.

use crate::domain::ExecutionResult;
use crate::error::{ConnectorError, Result};

/// Wrap `cmd` so its exit code is printed as the final stdout line.
///
/// The subshell keeps `exit N` from killing the shell before the status is
/// printed; the newline before `)` keeps heredoc terminators on their own line.
pub fn wrap_command(cmd: &str) -> String {
    // `( )` with an empty body is a syntax error
    let body = if cmd.trim().is_empty() { ":" } else { cmd };
    format!("(\n{}\n)\nprintf '\\n%s\\n' \"$?\"\n", body)
}

/// Split captured stdout into the real output and the exit code.
///
/// Steps: split into lines, parse the last one as the exit code, drop the
/// blank line injected before it, rejoin the rest.
pub fn split_status_output(raw: &str) -> Result<(String, i32)> {
    let trimmed = raw.trim_end_matches(|c| c == '\n' || c == '\r');
    let mut lines: Vec<&str> = trimmed.split('\n').collect();

    let status_line = lines.pop().unwrap_or_default();
    let exit_code = status_line.trim().parse::<i32>().map_err(|_| {
        ConnectorError::ProtocolViolation(format!(
            "expected exit code on last line, got '{}'",
            status_line
        ))
    })?;

    if lines.last().is_some_and(|line| line.trim_end_matches('\r').is_empty()) {
        lines.pop();
    }
    // same single terminator as native capture drops
    if let Some(last) = lines.last_mut() {
        let line: &str = *last;
        *last = line.strip_suffix('\r').unwrap_or(line);
    }

    Ok((lines.join("\n"), exit_code))
}

/// Build an [`ExecutionResult`] from a wrapped command's captured streams
pub fn parse_result(stdout: &str, stderr: String) -> Result<ExecutionResult> {
    let (stdout, exit_code) = split_status_output(stdout)?;
    Ok(ExecutionResult {
        stdout,
        stderr,
        exit_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_is_last_statement() {
        let wrapped = wrap_command("echo hello");
        assert!(wrapped.starts_with("(\necho hello\n)\n"));
        assert!(wrapped.ends_with("\"$?\"\n"));
    }

    #[test]
    fn test_empty_command_becomes_noop() {
        assert!(wrap_command("").starts_with("(\n:\n)\n"));
        assert!(wrap_command("  \n").starts_with("(\n:\n)\n"));
    }

    #[test]
    fn test_heredoc_terminator_stays_on_own_line() {
        let wrapped = wrap_command("cat <<EOF\nhi\nEOF");
        assert!(wrapped.contains("\nEOF\n)\n"));
    }

    #[test]
    fn test_split_simple_output() {
        let (stdout, code) = split_status_output("hello\n\n0\n").unwrap();
        assert_eq!(stdout, "hello");
        assert_eq!(code, 0);
    }

    #[test]
    fn test_split_empty_output() {
        let (stdout, code) = split_status_output("\n7\n").unwrap();
        assert_eq!(stdout, "");
        assert_eq!(code, 7);
    }

    #[test]
    fn test_split_output_without_trailing_newline() {
        // printf 'a' leaves no terminator, so no blank line precedes the status
        let (stdout, code) = split_status_output("a\n0\n").unwrap();
        assert_eq!(stdout, "a");
        assert_eq!(code, 0);
    }

    #[test]
    fn test_crlf_output_matches_native_capture() {
        let (stdout, _) = split_status_output("a\r\n\n0\n").unwrap();
        assert_eq!(stdout, "a");

        let (stdout, _) = split_status_output("a\r\nb\r\n\n0\n").unwrap();
        assert_eq!(stdout, "a\r\nb");
        assert_eq!(
            stdout,
            ExecutionResult::from_raw("a\r\nb\r\n".to_string(), String::new(), 0).stdout
        );
    }

    #[test]
    fn test_only_one_blank_line_removed() {
        let (stdout, _) = split_status_output("a\n\n\n0\n").unwrap();
        assert_eq!(stdout, "a\n");
    }

    #[test]
    fn test_numeric_output_is_not_mistaken_for_status() {
        let (stdout, code) = split_status_output("42\n\n1\n").unwrap();
        assert_eq!(stdout, "42");
        assert_eq!(code, 1);
    }

    #[test]
    fn test_missing_status_is_protocol_violation() {
        assert!(matches!(
            split_status_output(""),
            Err(ConnectorError::ProtocolViolation(_))
        ));
        assert!(matches!(
            split_status_output("hello\n"),
            Err(ConnectorError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_parse_result_keeps_stderr() {
        let result = parse_result("out\n\n2\n", "boom".to_string()).unwrap();
        assert_eq!(result.stdout, "out");
        assert_eq!(result.stderr, "boom");
        assert_eq!(result.exit_code, 2);
    }
}
