// Central Error Type for connector operations

use thiserror::Error;

/// Connector-level error type
///
/// A non-zero exit code is never an error; it travels inside
/// [`ExecutionResult`](crate::domain::ExecutionResult).
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Exit status missing or unparseable after a shell round-trip
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    /// Error output (or exit) observed before the readiness token
    #[error("Readiness failed: {0}")]
    ReadinessFailed(String),

    #[error("Missing file: {0}")]
    MissingFile(String),

    #[error("No filesystem found for: {0}")]
    DiskNotFound(String),

    #[error("Resource probe failed: {0}")]
    ProbeFailed(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using ConnectorError
pub type Result<T> = std::result::Result<T, ConnectorError>;
