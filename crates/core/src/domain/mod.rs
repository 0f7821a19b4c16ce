// Domain Layer - Connector data model and pure protocol logic

pub mod address;
pub mod execution;
pub mod path;
pub mod process;
pub mod readiness;
pub mod resources;
pub mod status_line;

// Re-exports
pub use address::normalize_address;
pub use execution::ExecutionResult;
pub use path::{normalize, resolve_path, working_dir};
pub use process::{SetupSpec, SpawnOptions, TargetState};
pub use readiness::ReadinessMatcher;
pub use resources::{to_capacity_units, ResourceReport};
