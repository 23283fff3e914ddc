//! Device and network signals sampled by the heuristics manager.

use serde::{Deserialize, Serialize};

/// Network quality class, as reported by browsers' `effectiveType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum EffectiveConnectionType {
    /// Slower than 2G.
    #[serde(rename = "slow-2g")]
    #[value(name = "slow-2g")]
    Slow2g,
    /// 2G.
    #[serde(rename = "2g")]
    #[value(name = "2g")]
    TwoG,
    /// 3G.
    #[serde(rename = "3g")]
    #[value(name = "3g")]
    ThreeG,
    /// 4G or better.
    #[serde(rename = "4g")]
    #[value(name = "4g")]
    FourG,
}

impl EffectiveConnectionType {
    /// Returns true for 4G.
    #[must_use]
    pub const fn is_fast(self) -> bool {
        matches!(self, Self::FourG)
    }
}

impl std::fmt::Display for EffectiveConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slow2g => write!(f, "slow-2g"),
            Self::TwoG => write!(f, "2g"),
            Self::ThreeG => write!(f, "3g"),
            Self::FourG => write!(f, "4g"),
        }
    }
}

/// One sample of device capabilities. Missing fields mean the platform did not report them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceSignals {
    /// Approximate device memory in GiB.
    pub device_memory_gb: Option<f64>,
    /// Logical CPU count.
    pub logical_cores: Option<usize>,
    /// Network class.
    pub effective_type: Option<EffectiveConnectionType>,
    /// User asked to save data.
    pub save_data: bool,
}

impl DeviceSignals {
    /// Returns true if no signal at all was reported.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.device_memory_gb.is_none()
            && self.logical_cores.is_none()
            && self.effective_type.is_none()
    }
}
