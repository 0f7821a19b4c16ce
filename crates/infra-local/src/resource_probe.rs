// Host resource probe
// reason: sysinfo for cross-platform CPU/memory/disk queries
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sysinfo::{Disks, System};
use tracing::{debug, warn};

use tether_core::domain::to_capacity_units;
use tether_core::{ConnectorError, Result};

/// CPU, memory and disk queries against the local host
///
/// Memory and disk figures are capacity units (bytes / 1,024,000,000).
#[derive(Clone)]
pub struct ResourceProbe {
    system: Arc<Mutex<System>>,
}

impl ResourceProbe {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }

    /// Logical processor count, at least 1
    pub fn cpu_cores(&self) -> usize {
        let cores = match self.system.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.cpus().len()
            }
            Err(e) => {
                warn!(error = %e, "System handle poisoned, using available parallelism");
                0
            }
        };

        let cores = if cores == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            cores
        };

        debug!(cores = %cores, "CPU cores probed");
        cores.max(1)
    }

    /// Total memory in capacity units, floor-rounded
    ///
    /// # Errors
    /// - ConnectorError::ProbeFailed if the shared system handle is poisoned
    pub fn memory(&self) -> Result<u64> {
        let total_bytes = {
            let mut sys = self
                .system
                .lock()
                .map_err(|e| ConnectorError::ProbeFailed(format!("memory: {}", e)))?;
            sys.refresh_memory();
            sys.total_memory()
        };

        let units = to_capacity_units(total_bytes);
        debug!(total_bytes = %total_bytes, units = %units, "Memory probed");
        Ok(units)
    }

    /// Free space of the filesystem holding `location`, in capacity units
    ///
    /// # Errors
    /// - ConnectorError::DiskNotFound if no mounted filesystem covers the location
    pub fn disk_space(&self, location: &Path) -> Result<u64> {
        let target = std::fs::canonicalize(location).unwrap_or_else(|_| location.to_path_buf());
        let disks = Disks::new_with_refreshed_list();

        let mounts: Vec<(PathBuf, u64)> = disks
            .iter()
            .map(|disk| (disk.mount_point().to_path_buf(), disk.available_space()))
            .collect();

        let available_bytes = available_at(&target, &mounts)
            .ok_or_else(|| ConnectorError::DiskNotFound(location.display().to_string()))?;

        let units = to_capacity_units(available_bytes);
        debug!(
            location = %target.display(),
            available_bytes = %available_bytes,
            units = %units,
            "Disk space probed"
        );
        Ok(units)
    }
}

impl Default for ResourceProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Available bytes of the mount point that is the longest prefix of `target`
fn available_at(target: &Path, mounts: &[(PathBuf, u64)]) -> Option<u64> {
    mounts
        .iter()
        .filter(|(mount, _)| target.starts_with(mount))
        .max_by_key(|(mount, _)| mount.components().count())
        .map(|(_, available)| *available)
}
