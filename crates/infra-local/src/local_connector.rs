// Local connector - the machine the caller runs on
// Composes shell execution, managed processes, probes and path resolution

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use tether_core::constants::LOCAL_HOSTNAME;
use tether_core::domain::readiness::contains_subslice;
use tether_core::domain::{self, ExecutionResult, SetupSpec, SpawnOptions, TargetState};
use tether_core::{Connector, ConnectorConfig, ConnectorError, ExecCapture, Result};

use crate::detached::SpawnedProcess;
use crate::managed_process::{self, ManagedProcess};
use crate::reachability;
use crate::resource_probe::ResourceProbe;
use crate::shell;
use crate::virtualization;

/// Connector bound to the local machine
///
/// # Example
/// ```ignore
/// let mut connector = LocalConnector::new();
/// connector.set_cwd("~/project".to_string());
/// let result = connector.exec("cargo --version").await?;
/// ```
pub struct LocalConnector {
    cwd: String,
    capture: ExecCapture,
    reachability_timeout: Duration,
    http: Client,
    resources: ResourceProbe,
}

impl LocalConnector {
    pub fn new() -> Self {
        Self::from_config(&ConnectorConfig::default())
    }

    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self::with_http_client(config, Client::new())
    }

    /// Use a preconfigured HTTP client for reachability probes
    pub fn with_http_client(config: &ConnectorConfig, http: Client) -> Self {
        Self {
            cwd: config.cwd.clone(),
            capture: config.capture,
            reachability_timeout: config.reachability_timeout,
            http,
            resources: ResourceProbe::new(),
        }
    }

    /// Absolute working directory, resolved at call time
    pub fn working_dir(&self) -> PathBuf {
        domain::working_dir(&self.cwd)
    }

    pub fn capture(&self) -> ExecCapture {
        self.capture
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        managed_process::is_alive(pid)
    }
}

impl Default for LocalConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for LocalConnector {
    type Process = ManagedProcess;
    type Spawned = SpawnedProcess;

    fn cwd(&self) -> &str {
        &self.cwd
    }

    fn set_cwd(&mut self, cwd: String) {
        debug!(from = %self.cwd, to = %cwd, "Working directory changed");
        self.cwd = cwd;
    }

    async fn container_ip(&self) -> String {
        LOCAL_HOSTNAME.to_string()
    }

    async fn name(&self) -> String {
        LOCAL_HOSTNAME.to_string()
    }

    async fn ready(&self) -> bool {
        // localhost is always ready
        true
    }

    async fn state(&self, _vm_name: &str) -> TargetState {
        TargetState::Running
    }

    async fn start(&self, spec: &SetupSpec) -> Result<Option<ManagedProcess>> {
        let Some(cmd) = spec.cmd.as_deref().filter(|c| !c.trim().is_empty()) else {
            return Ok(None);
        };

        info!(cmd = %cmd, "Setup");
        ManagedProcess::start(cmd, spec.readiness_token(), &self.working_dir()).map(Some)
    }

    async fn wait_ready(&self, process: &mut ManagedProcess) -> Result<()> {
        process.wait_ready().await
    }

    async fn tear_down(&self, process: Option<&mut ManagedProcess>) {
        if let Some(process) = process {
            process.tear_down().await;
        }
    }

    async fn exec(&self, cmd: &str) -> Result<ExecutionResult> {
        shell::run(cmd, &self.working_dir(), self.capture).await
    }

    async fn spawn(&self, cmd: &str, options: SpawnOptions) -> Result<SpawnedProcess> {
        SpawnedProcess::start(cmd, &options, &self.working_dir())
    }

    async fn resolve_host(&self, _host: &str) -> bool {
        false
    }

    async fn is_reachable(&self, address: &str) -> bool {
        reachability::is_reachable(&self.http, address, self.reachability_timeout).await
    }

    async fn path_exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(self.resolve_path(path))
            .await
            .unwrap_or(false)
    }

    async fn contains(&self, path: &str, needle: &str, expect: bool) -> Result<bool> {
        if !self.path_exists(path).await {
            return Err(ConnectorError::MissingFile(path.to_string()));
        }

        let content = tokio::fs::read(self.resolve_path(path)).await?;
        Ok(expect == contains_subslice(&content, needle.as_bytes()))
    }

    async fn check_virt(&self) -> Result<bool> {
        virtualization::check_virt().await
    }

    async fn cpu_cores(&self) -> Result<usize> {
        Ok(self.resources.cpu_cores())
    }

    async fn memory(&self) -> Result<u64> {
        self.resources.memory()
    }

    async fn disk_space(&self, location: &str) -> Result<u64> {
        let resolved = if location.is_empty() {
            self.working_dir()
        } else {
            self.resolve_path(location)
        };
        self.resources.disk_space(&resolved)
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        domain::resolve_path(path, &self.cwd)
    }
}
