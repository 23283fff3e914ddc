//! Device signals read from the host.

use tracing::debug;

use crate::domain::entities::{DeviceSignals, EffectiveConnectionType};
use crate::domain::errors::EnvironmentError;
use crate::domain::ports::SignalSourcePort;

const MEMINFO_PATH: &str = "/proc/meminfo";

/// Samples CPU count and total memory from the operating system.
///
/// Network class has no host-level equivalent and comes from configuration.
#[derive(Debug, Clone, Default)]
pub struct SystemSignalSource {
    effective_type: Option<EffectiveConnectionType>,
    save_data: bool,
}

impl SystemSignalSource {
    /// Creates a source reporting `effective_type` as the network class.
    #[must_use]
    pub const fn new(effective_type: Option<EffectiveConnectionType>) -> Self {
        Self {
            effective_type,
            save_data: false,
        }
    }

    /// Reports the user's save-data preference.
    #[must_use]
    pub const fn with_save_data(mut self, save_data: bool) -> Self {
        self.save_data = save_data;
        self
    }

    fn logical_cores() -> Result<usize, EnvironmentError> {
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .map_err(|e| EnvironmentError::Unreadable {
                source_name: "available_parallelism",
                message: e.to_string(),
            })
    }

    fn device_memory_gb() -> Result<f64, EnvironmentError> {
        let content =
            std::fs::read_to_string(MEMINFO_PATH).map_err(|_| EnvironmentError::Unsupported {
                feature: "device memory",
            })?;
        parse_meminfo_total_gb(&content).ok_or(EnvironmentError::Unreadable {
            source_name: MEMINFO_PATH,
            message: "MemTotal line missing".to_string(),
        })
    }
}

impl SignalSourcePort for SystemSignalSource {
    fn sample(&self) -> DeviceSignals {
        let logical_cores = Self::logical_cores()
            .inspect_err(|e| debug!(error = %e, "Core count unavailable"))
            .ok();
        let device_memory_gb = Self::device_memory_gb()
            .inspect_err(|e| debug!(error = %e, "Device memory unavailable"))
            .ok();

        DeviceSignals {
            device_memory_gb,
            logical_cores,
            effective_type: self.effective_type,
            save_data: self.save_data,
        }
    }
}

/// Extracts `MemTotal` from `/proc/meminfo` content, in GiB.
#[allow(clippy::cast_precision_loss)]
fn parse_meminfo_total_gb(content: &str) -> Option<f64> {
    let line = content.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib as f64 / (1024.0 * 1024.0))
}
