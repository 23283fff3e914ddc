//! Cardmedia - progressive image delivery for a print shop storefront.
//!
//! This crate builds image CDN URLs for the storefront's asset catalog,
//! derives progressive tier sets and responsive descriptor sets, and
//! prefetches images through a deduplicating cache driven by a priority
//! queue and device heuristics.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing URL derivation and heuristics services.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the progressive image component and CLI handlers.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "cardmedia";
