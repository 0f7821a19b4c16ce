// Connector configuration (environment driven)

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{DEFAULT_CWD, REACHABILITY_TIMEOUT};

pub const ENV_CWD: &str = "TETHER_CWD";
pub const ENV_EXEC_CAPTURE: &str = "TETHER_EXEC_CAPTURE";
pub const ENV_REACHABILITY_TIMEOUT_MS: &str = "TETHER_REACHABILITY_TIMEOUT_MS";

/// How `exec` recovers a command's exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecCapture {
    /// Structured exit status reported by the OS
    #[default]
    Native,
    /// Exit code smuggled as the last stdout line (text-only transports)
    StatusLine,
}

impl fmt::Display for ExecCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecCapture::Native => write!(f, "native"),
            ExecCapture::StatusLine => write!(f, "status-line"),
        }
    }
}

impl FromStr for ExecCapture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(ExecCapture::Native),
            "status-line" | "status_line" => Ok(ExecCapture::StatusLine),
            other => Err(format!("unknown exec capture mode '{}'", other)),
        }
    }
}

/// Connector configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// Initial working directory, absolute or `~`-relative
    pub cwd: String,
    pub capture: ExecCapture,
    pub reachability_timeout: Duration,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            cwd: DEFAULT_CWD.to_string(),
            capture: ExecCapture::default(),
            reachability_timeout: REACHABILITY_TIMEOUT,
        }
    }
}

impl ConnectorConfig {
    /// Load configuration from `TETHER_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    /// Unparseable values fall back to defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(cwd) = lookup(ENV_CWD).filter(|v| !v.trim().is_empty()) {
            config.cwd = cwd;
        }

        if let Some(raw) = lookup(ENV_EXEC_CAPTURE) {
            match raw.parse::<ExecCapture>() {
                Ok(capture) => config.capture = capture,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_EXEC_CAPTURE),
            }
        }

        if let Some(raw) = lookup(ENV_REACHABILITY_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.reachability_timeout = Duration::from_millis(ms),
                Err(e) => warn!(value = %raw, error = %e, "Ignoring {}", ENV_REACHABILITY_TIMEOUT_MS),
            }
        }

        config
    }
}
