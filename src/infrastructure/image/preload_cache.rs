//! Deduplicating image preloader.
//!
//! Every URL has at most one load in flight. Concurrent callers share the
//! pending operation; finished images land in a bounded LRU. A failed load
//! leaves no trace, so the next caller starts a fresh attempt.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::entities::{ImageSource, LoadState, LoadedImage};
use crate::domain::errors::{LoadError, LoadResult};
use crate::domain::ports::ImageFetchPort;

use super::memory_cache::{CacheStats, MemoryImageCache};

type SharedLoad = Shared<BoxFuture<'static, LoadResult<Arc<LoadedImage>>>>;

/// Snapshot of preloader activity.
#[derive(Debug, Clone)]
pub struct PreloadStats {
    /// Memory cache statistics.
    pub cache: CacheStats,
    /// Loads currently in flight.
    pub in_flight: usize,
    /// Loads that reached the fetcher.
    pub network_loads: u64,
    /// Loads that failed.
    pub failures: u64,
}

impl std::fmt::Display for PreloadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}; {} in flight, {} fetched, {} failed",
            self.cache, self.in_flight, self.network_loads, self.failures
        )
    }
}

#[derive(Default)]
struct Counters {
    network_loads: AtomicU64,
    failures: AtomicU64,
}

/// Process-wide image preloader. Construct once and share through `Arc`.
pub struct PreloadCache {
    fetcher: Arc<dyn ImageFetchPort>,
    memory: Arc<MemoryImageCache>,
    in_flight: Arc<Mutex<HashMap<String, SharedLoad>>>,
    counters: Arc<Counters>,
}

impl PreloadCache {
    /// Creates a preloader that keeps at most `capacity` decoded images.
    #[must_use]
    pub fn new(fetcher: Arc<dyn ImageFetchPort>, capacity: usize) -> Self {
        Self {
            fetcher,
            memory: Arc::new(MemoryImageCache::new(capacity)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Returns the loaded image for `url`, loading it if needed.
    ///
    /// # Errors
    /// Returns the fetch or decode error of the load this call joined.
    pub async fn ensure_loaded(&self, url: &str) -> LoadResult<Arc<LoadedImage>> {
        self.load(url).await.map(|(image, _)| image)
    }

    /// Like [`Self::ensure_loaded`], also reporting where the image came from.
    ///
    /// # Errors
    /// Returns the fetch or decode error of the load this call joined.
    pub async fn load(&self, url: &str) -> LoadResult<(Arc<LoadedImage>, ImageSource)> {
        if let Some(image) = self.memory.get(url) {
            return Ok((image, ImageSource::MemoryCache));
        }

        let (pending, source) = {
            let mut in_flight = self.in_flight.lock();
            // A load may have finished between the miss above and taking the lock.
            if let Some(image) = self.memory.peek(url) {
                return Ok((image, ImageSource::MemoryCache));
            }
            if let Some(existing) = in_flight.get(url) {
                debug!(url = %url, "Joining in-flight load");
                (existing.clone(), ImageSource::InFlight)
            } else {
                let pending = self.start_load(url.to_string());
                in_flight.insert(url.to_string(), pending.clone());
                (pending, ImageSource::Network)
            }
        };

        pending.await.map(|image| (image, source))
    }

    /// Spawns the fetch so it completes even if every waiter goes away.
    fn start_load(&self, url: String) -> SharedLoad {
        let fetcher = self.fetcher.clone();
        let memory = self.memory.clone();
        let in_flight = self.in_flight.clone();
        let counters = self.counters.clone();

        let task = tokio::spawn(async move {
            counters.network_loads.fetch_add(1, Ordering::Relaxed);
            debug!(url = %url, fetcher = fetcher.name(), "Loading image");

            let result = fetcher.fetch(&url).await.map(Arc::new);
            match &result {
                Ok(image) => {
                    memory.put(url.clone(), image.clone());
                    debug!(url = %url, bytes = image.byte_len, "Image loaded");
                }
                Err(e) => {
                    counters.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(url = %url, error = %e, "Image load failed");
                }
            }
            in_flight.lock().remove(&url);
            result
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(LoadError::network(format!("load task aborted: {e}"))))
        }
        .boxed()
        .shared()
    }

    /// Returns true if `url` is decoded and cached.
    #[must_use]
    pub fn is_loaded(&self, url: &str) -> bool {
        self.memory.contains(url)
    }

    /// Returns the completion state of `url`.
    #[must_use]
    pub fn state(&self, url: &str) -> LoadState {
        if self.memory.contains(url) {
            LoadState::Loaded
        } else if self.in_flight.lock().contains_key(url) {
            LoadState::Pending
        } else {
            LoadState::Absent
        }
    }

    /// Returns the cached image without loading or promoting it.
    #[must_use]
    pub fn peek(&self, url: &str) -> Option<Arc<LoadedImage>> {
        self.memory.peek(url)
    }

    /// Number of loads currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Drops every cached image. In-flight loads still complete and are cached.
    pub fn clear_cache(&self) {
        self.memory.clear();
    }

    /// Number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Cache and load counters.
    #[must_use]
    pub fn stats(&self) -> PreloadStats {
        PreloadStats {
            cache: self.memory.stats(),
            in_flight: self.in_flight(),
            network_loads: self.counters.network_loads.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for PreloadCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadCache")
            .field("fetcher", &self.fetcher.name())
            .field("cached", &self.memory.len())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio_test::{assert_pending, assert_ready_ok, task};

    use crate::domain::ports::mocks::{CountingFetcher, MockImageFetchPort};

    const URL: &str = "https://images.cardpress.example/site/design-studio.jpg?w=400";

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_load() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::from_millis(200)));
        let cache = PreloadCache::new(fetcher.clone(), 8);

        let (a, b) = tokio::join!(cache.load(URL), cache.load(URL));
        let (a, source_a) = a.unwrap();
        let (b, source_b) = b.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source_a, ImageSource::Network);
        assert_eq!(source_b, ImageSource::InFlight);
    }

    #[tokio::test]
    async fn test_cached_image_needs_no_io() {
        let mut mock = MockImageFetchPort::new();
        mock.expect_name().return_const("mock");
        mock.expect_fetch()
            .times(1)
            .returning(|url| Ok(LoadedImage::new(url, image::DynamicImage::new_rgb8(2, 2), 12)));
        let cache = PreloadCache::new(Arc::new(mock), 8);

        cache.ensure_loaded(URL).await.unwrap();
        let (_, source) = cache.load(URL).await.unwrap();

        assert_eq!(source, ImageSource::MemoryCache);
        assert!(cache.is_loaded(URL));
        assert_eq!(cache.state(URL), LoadState::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_is_pending_while_loading() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::from_millis(100)));
        let cache = PreloadCache::new(fetcher, 8);

        let mut waiter = task::spawn(cache.ensure_loaded(URL));
        assert_pending!(waiter.poll());
        assert_eq!(cache.state(URL), LoadState::Pending);
        assert_eq!(cache.in_flight(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(waiter.is_woken());
        assert_ready_ok!(waiter.poll());
        drop(waiter);

        assert_eq!(cache.state(URL), LoadState::Loaded);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_can_be_retried() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::from_millis(5)));
        fetcher.fail_on(URL);
        let cache = PreloadCache::new(fetcher.clone(), 8);

        let err = cache.ensure_loaded(URL).await.unwrap_err();
        assert!(matches!(err, LoadError::Network { .. }));
        assert_eq!(cache.state(URL), LoadState::Absent);

        fetcher.heal(URL);
        cache.ensure_loaded(URL).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_completes_after_waiter_drops() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::from_millis(100)));
        let cache = PreloadCache::new(fetcher.clone(), 8);

        let _ = tokio::time::timeout(Duration::from_millis(10), cache.ensure_loaded(URL)).await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(cache.is_loaded(URL));
        cache.ensure_loaded(URL).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_cache_evicts_and_clear_cache_empties() {
        let fetcher = Arc::new(CountingFetcher::new(Duration::from_millis(1)));
        let cache = PreloadCache::new(fetcher.clone(), 2);

        for url in ["u1", "u2", "u3"] {
            cache.ensure_loaded(url).await.unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(!cache.is_loaded("u1"));

        cache.clear_cache();
        assert!(cache.is_empty());
        cache.ensure_loaded("u2").await.unwrap();
        assert_eq!(fetcher.calls_for("u2"), 2);
    }
}
