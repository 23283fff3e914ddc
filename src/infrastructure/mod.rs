//! Infrastructure layer with external service adapters.

/// Image CDN query encoding.
pub mod cdn;
/// Application configuration.
pub mod config;
/// Image handling (caching, preloading, prefetch queue, HTTP fetch).
pub mod image;
/// Cancellable periodic tasks.
pub mod scheduler;
/// Device signal sampling.
pub mod system_signals;

pub use cdn::CdnQuery;
pub use config::{AppConfig, CliArgs, LogLevel, StorageManager};
pub use image::{
    CacheStats, FallbackFetcher, HttpImageFetcher, LoadQueue, MemoryImageCache, PreloadCache,
    PreloadStats,
};
pub use scheduler::{TaskHandle, spawn_periodic};
pub use system_signals::SystemSignalSource;
