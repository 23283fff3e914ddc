//! Image load error types.

use thiserror::Error;

/// Result type for load operations.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Errors that can occur while fetching or decoding an image.
///
/// `Clone` so that one in-flight failure can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum LoadError {
    /// Connection-level failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// Body was not a decodable image.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// Attempt exceeded its timeout.
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Every fallback strategy failed.
    #[error("all {attempts} fetch strategies failed, last error: {last}")]
    Exhausted { attempts: usize, last: Box<LoadError> },
}

impl LoadError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_includes_last() {
        let err = LoadError::Exhausted {
            attempts: 2,
            last: Box::new(LoadError::Timeout { timeout_ms: 500 }),
        };
        assert!(err.to_string().contains("timed out after 500ms"));
    }
}
