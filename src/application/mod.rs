//! Application layer with URL derivation and prefetch heuristics.

/// Application services.
pub mod services;

pub use services::{PerformanceManager, UrlBuilder};
