// Tether Core - Connector Port & Domain Logic
// NO infrastructure dependencies (Hexagonal Architecture)

pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod port;

pub use config::{ConnectorConfig, ExecCapture};
pub use error::{ConnectorError, Result};
pub use port::Connector;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
