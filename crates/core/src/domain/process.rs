// Process Domain Model (managed + detached processes)

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// What `setup` should start, and how it knows the process is up
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupSpec {
    pub cmd: Option<String>,
    /// Readiness token matched against stdout chunks
    pub wait_for: Option<String>,
}

impl SetupSpec {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: Some(cmd.into()),
            wait_for: None,
        }
    }

    pub fn wait_for(mut self, token: impl Into<String>) -> Self {
        self.wait_for = Some(token.into());
        self
    }

    /// Readiness token, ignoring an empty one
    pub fn readiness_token(&self) -> Option<&str> {
        self.wait_for.as_deref().filter(|t| !t.is_empty())
    }
}

/// Caller options for a detached spawn.
/// Shell mode and working directory are always forced by the connector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnOptions {
    pub env: BTreeMap<String, String>,
    /// Start from an empty environment instead of inheriting
    pub clear_env: bool,
}

impl SpawnOptions {
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Lifecycle state of a target environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetState {
    Running,
    Stopped,
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetState::Running => write!(f, "running"),
            TargetState::Stopped => write!(f, "stopped"),
        }
    }
}
