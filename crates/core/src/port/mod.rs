// Port Layer - Interface every target backend implements

pub mod connector;

// Re-exports
pub use connector::Connector;
