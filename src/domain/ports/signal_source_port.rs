//! Port definition for device signal sampling.

use crate::domain::entities::DeviceSignals;

/// Reports device memory, CPU and network hints.
///
/// Sources report what they can; absent values stay `None`.
#[cfg_attr(test, mockall::automock)]
pub trait SignalSourcePort: Send + Sync {
    /// Takes a fresh sample.
    fn sample(&self) -> DeviceSignals;
}

/// A source that always returns the same sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSignals(pub DeviceSignals);

impl SignalSourcePort for FixedSignals {
    fn sample(&self) -> DeviceSignals {
        self.0
    }
}
