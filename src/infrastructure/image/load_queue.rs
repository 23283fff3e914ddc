//! Priority prefetch queue drained under a concurrency cap.
//!
//! Entries are unique by URL for the lifetime of the queue: a URL that was
//! queued once is never queued again, whatever its status or priority. Higher
//! priorities are served first, so low-priority entries can starve.

use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::preload_cache::PreloadCache;
use crate::infrastructure::scheduler::{TaskHandle, spawn_periodic};

/// Lifecycle of one queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Waiting to be picked.
    Queued,
    /// Handed to the preload cache.
    Loading,
    /// Loaded; never picked again.
    Loaded,
    /// Load failed; stays abandoned until [`LoadQueue::retry`].
    Failed,
}

/// One queued URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Resolved image URL.
    pub url: String,
    /// Higher is served first.
    pub priority: i32,
    /// Current lifecycle state.
    pub status: ItemStatus,
}

impl QueueItem {
    /// Returns true once the image is cached.
    #[must_use]
    pub fn loaded(&self) -> bool {
        self.status == ItemStatus::Loaded
    }
}

/// Prefetch queue feeding the [`PreloadCache`].
pub struct LoadQueue {
    cache: Arc<PreloadCache>,
    items: Arc<Mutex<Vec<QueueItem>>>,
    in_flight: Arc<AtomicUsize>,
    concurrency: AtomicUsize,
}

impl LoadQueue {
    /// Creates a queue allowing `concurrency` simultaneous loads (at least one).
    #[must_use]
    pub fn new(cache: Arc<PreloadCache>, concurrency: usize) -> Self {
        Self {
            cache,
            items: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            concurrency: AtomicUsize::new(concurrency.max(1)),
        }
    }

    /// Queues `url`. Returns false if the URL was already queued, in which
    /// case the new priority is ignored.
    ///
    /// `high` puts the entry at the head. Otherwise it is appended and the
    /// queue is stably re-sorted by descending priority, which may also move
    /// earlier head insertions.
    pub fn enqueue(&self, url: impl Into<String>, priority: i32, high: bool) -> bool {
        let url = url.into();
        let mut items = self.items.lock();
        if items.iter().any(|item| item.url == url) {
            trace!(url = %url, "Already queued");
            return false;
        }

        let item = QueueItem {
            url,
            priority,
            status: ItemStatus::Queued,
        };
        if high {
            items.insert(0, item);
        } else {
            items.push(item);
            items.sort_by_key(|item| Reverse(item.priority));
        }
        true
    }

    /// Puts a failed entry back in line. Returns false if `url` is not failed.
    pub fn retry(&self, url: &str) -> bool {
        let mut items = self.items.lock();
        match items
            .iter_mut()
            .find(|item| item.url == url && item.status == ItemStatus::Failed)
        {
            Some(item) => {
                item.status = ItemStatus::Queued;
                true
            }
            None => false,
        }
    }

    /// Starts the highest-priority queued entry if the concurrency budget allows.
    ///
    /// Returns the URL that was handed to the cache, if any. Entries the cache
    /// already holds are marked loaded without spending budget.
    pub fn drain_once(&self) -> Option<String> {
        let cap = self.concurrency();
        let url = {
            let mut items = self.items.lock();
            loop {
                if self.in_flight.load(Ordering::SeqCst) >= cap {
                    return None;
                }
                let item = items
                    .iter_mut()
                    .find(|item| item.status == ItemStatus::Queued)?;
                if self.cache.is_loaded(&item.url) {
                    item.status = ItemStatus::Loaded;
                    continue;
                }
                item.status = ItemStatus::Loading;
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                break item.url.clone();
            }
        };

        let cache = self.cache.clone();
        let items = self.items.clone();
        let in_flight = self.in_flight.clone();
        let target = url.clone();
        tokio::spawn(async move {
            let status = match cache.ensure_loaded(&target).await {
                Ok(_) => ItemStatus::Loaded,
                Err(e) => {
                    warn!(url = %target, error = %e, "Prefetch failed");
                    ItemStatus::Failed
                }
            };
            if let Some(item) = items.lock().iter_mut().find(|item| item.url == target) {
                item.status = status;
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        debug!(url = %url, "Prefetch started");
        Some(url)
    }

    /// Drains on a fixed interval until the handle is cancelled.
    pub fn start(self: &Arc<Self>, interval: Duration) -> TaskHandle {
        let queue = self.clone();
        spawn_periodic("load-queue", interval, move || {
            queue.drain_once();
            std::future::ready(())
        })
    }

    /// Sets the maximum number of loads in flight (at least one).
    pub fn set_concurrency(&self, concurrency: usize) {
        self.concurrency.store(concurrency.max(1), Ordering::SeqCst);
        debug!(concurrency, "Queue concurrency updated");
    }

    /// Current concurrency cap.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency.load(Ordering::SeqCst)
    }

    /// Total entries, finished ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns true if nothing was ever queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Entries still waiting to start.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.count(ItemStatus::Queued)
    }

    /// Loads started by this queue that have not finished.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Number of entries with `status`.
    #[must_use]
    pub fn count(&self, status: ItemStatus) -> usize {
        self.items
            .lock()
            .iter()
            .filter(|item| item.status == status)
            .count()
    }

    /// Returns true if `url` has an entry, whatever its status.
    #[must_use]
    pub fn is_queued(&self, url: &str) -> bool {
        self.items.lock().iter().any(|item| item.url == url)
    }

    /// Status of the entry for `url`.
    #[must_use]
    pub fn status(&self, url: &str) -> Option<ItemStatus> {
        self.items
            .lock()
            .iter()
            .find(|item| item.url == url)
            .map(|item| item.status)
    }

    /// Snapshot of every entry in queue order.
    #[must_use]
    pub fn items(&self) -> Vec<QueueItem> {
        self.items.lock().clone()
    }
}

impl std::fmt::Debug for LoadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadQueue")
            .field("len", &self.len())
            .field("in_flight", &self.in_flight())
            .field("concurrency", &self.concurrency())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::ports::mocks::CountingFetcher;

    fn queue_with(delay: Duration, cap: usize) -> (Arc<CountingFetcher>, Arc<LoadQueue>) {
        let fetcher = Arc::new(CountingFetcher::new(delay));
        let cache = Arc::new(PreloadCache::new(fetcher.clone(), 32));
        (fetcher, Arc::new(LoadQueue::new(cache, cap)))
    }

    fn urls(queue: &LoadQueue) -> Vec<String> {
        queue.items().into_iter().map(|item| item.url).collect()
    }

    #[tokio::test]
    async fn test_duplicate_url_is_ignored_even_with_new_priority() {
        let (_, queue) = queue_with(Duration::ZERO, 2);

        assert!(queue.enqueue("a", 1, false));
        assert!(!queue.enqueue("a", 10, false));
        assert!(!queue.enqueue("a", 10, true));

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.items()[0].priority, 1);
        assert!(queue.is_queued("a"));
        assert!(!queue.is_queued("b"));
    }

    #[tokio::test]
    async fn test_sorted_descending_and_stable_on_ties() {
        let (_, queue) = queue_with(Duration::ZERO, 2);
        queue.enqueue("low", 1, false);
        queue.enqueue("first-mid", 5, false);
        queue.enqueue("top", 9, false);
        queue.enqueue("second-mid", 5, false);

        assert_eq!(urls(&queue), ["top", "first-mid", "second-mid", "low"]);
    }

    #[tokio::test]
    async fn test_high_inserts_at_head() {
        let (_, queue) = queue_with(Duration::ZERO, 2);
        queue.enqueue("a", 5, false);
        queue.enqueue("urgent", 0, true);

        assert_eq!(urls(&queue), ["urgent", "a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_cap_is_respected() {
        let (fetcher, queue) = queue_with(Duration::from_millis(500), 2);
        for i in 0..5 {
            queue.enqueue(format!("img-{i}"), i, false);
        }

        let handle = queue.start(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_secs(3)).await;
        handle.shutdown().await;

        assert_eq!(fetcher.calls(), 5);
        assert_eq!(fetcher.max_in_flight(), 2);
        assert_eq!(queue.count(ItemStatus::Loaded), 5);
        assert_eq!(queue.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_highest_priority_is_started_first() {
        let (fetcher, queue) = queue_with(Duration::from_millis(50), 1);
        queue.enqueue("low", 1, false);
        queue.enqueue("high", 9, false);

        assert_eq!(queue.drain_once().as_deref(), Some("high"));
        assert_eq!(queue.drain_once(), None);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(queue.drain_once().as_deref(), Some("low"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fetcher.fetched_urls(), ["high", "low"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_swallowed_and_not_requeued() {
        let (fetcher, queue) = queue_with(Duration::from_millis(5), 2);
        fetcher.fail_on("broken");
        queue.enqueue("broken", 5, false);
        queue.enqueue("fine", 1, false);

        let handle = queue.start(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(queue.status("broken"), Some(ItemStatus::Failed));
        assert_eq!(queue.status("fine"), Some(ItemStatus::Loaded));
        assert!(!queue.enqueue("broken", 5, false));

        fetcher.heal("broken");
        assert!(queue.retry("broken"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown().await;

        assert_eq!(queue.status("broken"), Some(ItemStatus::Loaded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loaded_entry_never_requeued() {
        let (fetcher, queue) = queue_with(Duration::from_millis(5), 2);
        queue.enqueue("a", 1, false);
        queue.drain_once();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(queue.items()[0].loaded());
        assert!(!queue.enqueue("a", 1, false));
        assert_eq!(queue.drain_once(), None);
        assert_eq!(fetcher.calls(), 1);
    }
}
