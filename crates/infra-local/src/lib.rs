// Tether Infrastructure - Local Target Adapter
// Implements: Connector for the machine the caller runs on

pub mod detached;
pub mod local_connector;
pub mod managed_process;
pub mod reachability;
pub mod resource_probe;
pub mod shell;
pub mod virtualization;

pub use detached::SpawnedProcess;
pub use local_connector::LocalConnector;
pub use managed_process::{is_alive, ManagedProcess};
pub use resource_probe::ResourceProbe;
