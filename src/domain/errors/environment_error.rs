//! Errors for missing platform observation APIs.

use thiserror::Error;

/// A platform signal the heuristics wanted is not available.
///
/// Never fatal: callers disable the dependent feature and log at debug level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum EnvironmentError {
    #[error("unsupported environment: {feature} is not available")]
    Unsupported { feature: &'static str },

    #[error("failed to read {source_name}: {message}")]
    Unreadable {
        source_name: &'static str,
        message: String,
    },
}
