//! Domain error types.

mod environment_error;
mod load_error;

pub use environment_error::EnvironmentError;
pub use load_error::{LoadError, LoadResult};
