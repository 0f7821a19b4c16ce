// Connector Port
// One capability set, one implementation per target kind (local, remote, virtualized)

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::{ExecutionResult, ResourceReport, SetupSpec, SpawnOptions, TargetState};
use crate::error::{ConnectorError, Result};

/// Uniform execution and probe interface bound to one target environment
///
/// Method names and semantics are shared by every backend so an
/// orchestration layer can drive any target the same way.
///
/// Implementations:
/// - LocalConnector: the local machine (tether-infra-local)
#[async_trait]
pub trait Connector: Send + Sync {
    /// Handle to a process started by [`setup`](Connector::setup)
    type Process: Send;

    /// Handle to a process started by [`spawn`](Connector::spawn)
    type Spawned: Send;

    /// Current working directory, as configured (not resolved)
    fn cwd(&self) -> &str;

    fn set_cwd(&mut self, cwd: String);

    /// Address under which services on the target are reached
    async fn container_ip(&self) -> String;

    async fn name(&self) -> String;

    async fn ready(&self) -> bool;

    async fn state(&self, vm_name: &str) -> TargetState;

    /// Spawn the process described by `spec` and hand it back before readiness.
    ///
    /// Without a command, `Ok(None)`. The returned handle can be passed to
    /// [`tear_down`](Connector::tear_down) at any point, readiness or not.
    async fn start(&self, spec: &SetupSpec) -> Result<Option<Self::Process>>;

    /// Wait for the readiness token of a started process.
    ///
    /// # Errors
    /// - ConnectorError::ReadinessFailed if error output (or exit) came first
    async fn wait_ready(&self, process: &mut Self::Process) -> Result<()>;

    /// [`start`](Connector::start) followed by [`wait_ready`](Connector::wait_ready).
    ///
    /// With a readiness token, completes only once stdout contains it; error
    /// output first fails the call and tears the process down. Without a
    /// token, completes at spawn.
    async fn setup(&self, spec: &SetupSpec) -> Result<Option<Self::Process>> {
        let Some(mut process) = self.start(spec).await? else {
            return Ok(None);
        };

        if let Err(e) = self.wait_ready(&mut process).await {
            self.tear_down(Some(&mut process)).await;
            return Err(e);
        }
        Ok(Some(process))
    }

    /// Detach output observers, send Ctrl-C, then force-terminate.
    /// No-op for `None` or an already torn-down handle.
    async fn tear_down(&self, process: Option<&mut Self::Process>);

    /// Run `cmd` in a shell rooted at the working directory
    ///
    /// # Errors
    /// - ConnectorError::SpawnFailed if the shell cannot be started
    /// - ConnectorError::ProtocolViolation if no exit code can be recovered
    async fn exec(&self, cmd: &str) -> Result<ExecutionResult>;

    /// Start `cmd` detached and return at once with its handle
    async fn spawn(&self, cmd: &str, options: SpawnOptions) -> Result<Self::Spawned>;

    async fn resolve_host(&self, host: &str) -> bool;

    /// Single timed HTTP GET; true only on status 200
    async fn is_reachable(&self, address: &str) -> bool;

    async fn path_exists(&self, path: &str) -> bool;

    /// `expect == (file at path contains needle)`
    ///
    /// # Errors
    /// - ConnectorError::MissingFile if the path does not exist
    async fn contains(&self, path: &str, needle: &str, expect: bool) -> Result<bool>;

    /// Hardware virtualization support
    async fn check_virt(&self) -> Result<bool>;

    async fn cpu_cores(&self) -> Result<usize>;

    /// Total memory in capacity units (bytes / 1,024,000,000, floored)
    async fn memory(&self) -> Result<u64>;

    /// Free disk space at `location` in capacity units
    async fn disk_space(&self, location: &str) -> Result<u64>;

    fn resolve_path(&self, path: &str) -> PathBuf;

    /// All resource probes in one report
    async fn resource_report(&self, location: &str) -> Result<ResourceReport> {
        Ok(ResourceReport {
            cpu_cores: self.cpu_cores().await?,
            memory_gb: self.memory().await?,
            disk_free_gb: self.disk_space(location).await?,
            virtualization: self.check_virt().await?,
        })
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::domain::resolve_path;

    /// Mock Connector that replays a fixed exec result and records commands
    pub struct MockConnector {
        cwd: String,
        result: ExecutionResult,
        report: ResourceReport,
        commands: Arc<Mutex<Vec<String>>>,
    }

    impl MockConnector {
        pub fn new(result: ExecutionResult, report: ResourceReport) -> Self {
            Self {
                cwd: ".".to_string(),
                result,
                report,
                commands: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn executed_commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Connector for MockConnector {
        type Process = String;
        type Spawned = u32;

        fn cwd(&self) -> &str {
            &self.cwd
        }

        fn set_cwd(&mut self, cwd: String) {
            self.cwd = cwd;
        }

        async fn container_ip(&self) -> String {
            "mock".to_string()
        }

        async fn name(&self) -> String {
            "mock".to_string()
        }

        async fn ready(&self) -> bool {
            true
        }

        async fn state(&self, _vm_name: &str) -> TargetState {
            TargetState::Running
        }

        /// The handle is the command text; torn down means cleared
        async fn start(&self, spec: &SetupSpec) -> Result<Option<Self::Process>> {
            Ok(spec.cmd.clone().filter(|cmd| !cmd.trim().is_empty()))
        }

        async fn wait_ready(&self, process: &mut Self::Process) -> Result<()> {
            if process.is_empty() {
                return Err(ConnectorError::ReadinessFailed(
                    "process was torn down".to_string(),
                ));
            }
            Ok(())
        }

        async fn tear_down(&self, process: Option<&mut Self::Process>) {
            if let Some(cmd) = process {
                cmd.clear();
            }
        }

        async fn exec(&self, cmd: &str) -> Result<ExecutionResult> {
            self.commands.lock().unwrap().push(cmd.to_string());
            Ok(self.result.clone())
        }

        async fn spawn(&self, cmd: &str, _options: SpawnOptions) -> Result<Self::Spawned> {
            self.commands.lock().unwrap().push(cmd.to_string());
            Ok(1)
        }

        async fn resolve_host(&self, _host: &str) -> bool {
            false
        }

        async fn is_reachable(&self, _address: &str) -> bool {
            true
        }

        async fn path_exists(&self, _path: &str) -> bool {
            true
        }

        async fn contains(&self, _path: &str, _needle: &str, expect: bool) -> Result<bool> {
            Ok(expect)
        }

        async fn check_virt(&self) -> Result<bool> {
            Ok(self.report.virtualization)
        }

        async fn cpu_cores(&self) -> Result<usize> {
            Ok(self.report.cpu_cores)
        }

        async fn memory(&self) -> Result<u64> {
            Ok(self.report.memory_gb)
        }

        async fn disk_space(&self, _location: &str) -> Result<u64> {
            Ok(self.report.disk_free_gb)
        }

        fn resolve_path(&self, path: &str) -> PathBuf {
            resolve_path(path, &self.cwd)
        }
    }
}
