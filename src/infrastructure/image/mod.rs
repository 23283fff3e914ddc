//! Image handling infrastructure.
//!
//! This module provides:
//! - Memory caching with LRU eviction
//! - Deduplicated preloading keyed by URL
//! - A priority queue that prefetches under a concurrency cap
//! - HTTP fetching with an ordered fallback chain

/// Fallback fetch chain.
pub mod fallback;
/// HTTP fetcher.
pub mod http_fetcher;
/// Priority prefetch queue.
pub mod load_queue;
/// LRU memory cache.
pub mod memory_cache;
/// Deduplicating preload cache.
pub mod preload_cache;

pub use fallback::{FallbackFetcher, UrlRewrite, strip_transforms};
pub use http_fetcher::HttpImageFetcher;
pub use load_queue::{ItemStatus, LoadQueue, QueueItem};
pub use memory_cache::{CacheStats, MemoryImageCache};
pub use preload_cache::{PreloadCache, PreloadStats};
