//! Port definition for fetching and decoding images.

use async_trait::async_trait;

use crate::domain::entities::LoadedImage;
use crate::domain::errors::LoadResult;

/// Fetches one URL and decodes it.
/// Implementations must be thread-safe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Fetches and decodes the image at `url`.
    async fn fetch(&self, url: &str) -> LoadResult<LoadedImage>;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "fetcher"
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::domain::errors::LoadError;

    /// Fetcher that records call counts and peak concurrency.
    pub struct CountingFetcher {
        delay: Duration,
        failing: Mutex<HashSet<String>>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        log: Mutex<Vec<String>>,
    }

    impl CountingFetcher {
        /// Creates a fetcher that succeeds after `delay`.
        pub fn new(delay: Duration) -> Self {
            Self {
                delay,
                failing: Mutex::new(HashSet::new()),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                log: Mutex::new(Vec::new()),
            }
        }

        /// Makes every fetch of `url` fail with a network error.
        pub fn fail_on(&self, url: impl Into<String>) {
            self.failing.lock().insert(url.into());
        }

        /// Lets `url` succeed again.
        pub fn heal(&self, url: &str) {
            self.failing.lock().remove(url);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn calls_for(&self, url: &str) -> usize {
            self.log.lock().iter().filter(|u| *u == url).count()
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        pub fn fetched_urls(&self) -> Vec<String> {
            self.log.lock().clone()
        }
    }

    #[async_trait]
    impl ImageFetchPort for CountingFetcher {
        async fn fetch(&self, url: &str) -> LoadResult<LoadedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log.lock().push(url.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(self.delay).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.failing.lock().contains(url) {
                return Err(LoadError::network(format!("refused {url}")));
            }
            Ok(LoadedImage::new(
                url,
                image::DynamicImage::new_rgb8(4, 4),
                48,
            ))
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }
}
