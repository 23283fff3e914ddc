//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{AssetCatalog, LoadedImage, ProgressiveUrlSet, Tier, TransformRequest};
pub use errors::{LoadError, LoadResult};
pub use ports::{ImageFetchPort, SignalSourcePort};
