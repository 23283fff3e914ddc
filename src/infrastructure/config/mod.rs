//! Application configuration.

/// Configuration model.
pub mod app_config;
/// Command line arguments.
pub mod args;
/// Configuration file persistence.
pub mod storage;

pub use app_config::{AppConfig, CdnConfig, HeuristicsConfig, LoaderConfig, LogLevel};
pub use args::{CliArgs, Command, TransformArgs};
pub use storage::{ConfigError, StorageManager};
