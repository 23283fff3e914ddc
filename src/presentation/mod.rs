//! Presentation layer with the progressive image component and CLI handlers.

/// CLI command handlers.
pub mod commands;
/// Reusable widgets.
pub mod widgets;

pub use commands::{CommandError, CommandRunner, PrefetchReport};
