//! In-memory LRU cache of decoded images, keyed by resolved URL.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::entities::LoadedImage;

/// Default maximum number of images to cache in memory.
pub const DEFAULT_CACHE_SIZE: usize = 64;

/// Bounded cache of loaded images. Least-recently-used entries are evicted first.
pub struct MemoryImageCache {
    cache: Mutex<LruCache<String, Arc<LoadedImage>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryImageCache {
    /// Creates a new cache with the specified capacity (at least one entry).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Looks up an image and marks it most recently used.
    pub fn get(&self, url: &str) -> Option<Arc<LoadedImage>> {
        let mut cache = self.cache.lock();
        if let Some(img) = cache.get(url) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(url = %url, "Memory cache hit");
            Some(img.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(url = %url, "Memory cache miss");
            None
        }
    }

    /// Peeks at an image without promoting it or touching statistics.
    pub fn peek(&self, url: &str) -> Option<Arc<LoadedImage>> {
        self.cache.lock().peek(url).cloned()
    }

    /// Returns true if `url` is cached. Does not promote.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.cache.lock().contains(url)
    }

    /// Stores an image, evicting the least recently used entry when full.
    pub fn put(&self, url: String, image: Arc<LoadedImage>) {
        let mut cache = self.cache.lock();
        if let Some((evicted, _)) = cache.push(url.clone(), image)
            && evicted != url
        {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(url = %evicted, "Evicted image from memory cache");
        }
    }

    /// Number of cached images.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached images.
    pub fn capacity(&self) -> usize {
        self.cache.lock().cap().get()
    }

    /// Drops every cached image.
    pub fn clear(&self) {
        self.cache.lock().clear();
        debug!("Cleared memory image cache");
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate,
            size: self.len(),
        }
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Entries pushed out by capacity.
    pub evictions: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached images.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {:.1}% hit rate ({} hits, {} misses, {} evictions)",
            self.size, self.hit_rate, self.hits, self.misses, self.evictions
        )
    }
}
