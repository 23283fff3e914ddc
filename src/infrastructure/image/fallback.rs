//! Ordered fallback chain of fetch strategies.
//!
//! Strategies run one at a time in the order given. Each attempt is bounded by
//! a timeout; an attempt that times out is dropped before the next starts, so
//! at most one strategy is ever working on a URL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::entities::LoadedImage;
use crate::domain::errors::{LoadError, LoadResult};
use crate::domain::ports::ImageFetchPort;

/// Rewrites the URL a strategy fetches (e.g. strip CDN transforms).
pub type UrlRewrite = Arc<dyn Fn(&str) -> String + Send + Sync>;

struct Strategy {
    fetcher: Arc<dyn ImageFetchPort>,
    rewrite: Option<UrlRewrite>,
}

/// Tries each strategy in turn; the first success wins.
pub struct FallbackFetcher {
    strategies: Vec<Strategy>,
    attempt_timeout: Duration,
}

impl FallbackFetcher {
    /// Creates an empty chain; each attempt gets `attempt_timeout`.
    #[must_use]
    pub fn new(attempt_timeout: Duration) -> Self {
        Self {
            strategies: Vec::new(),
            attempt_timeout,
        }
    }

    /// Appends a strategy that fetches the URL as given.
    #[must_use]
    pub fn then(mut self, fetcher: Arc<dyn ImageFetchPort>) -> Self {
        self.strategies.push(Strategy {
            fetcher,
            rewrite: None,
        });
        self
    }

    /// Appends a strategy that fetches a rewritten URL.
    #[must_use]
    pub fn then_rewritten(mut self, fetcher: Arc<dyn ImageFetchPort>, rewrite: UrlRewrite) -> Self {
        self.strategies.push(Strategy {
            fetcher,
            rewrite: Some(rewrite),
        });
        self
    }

    /// Number of strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns true if no strategy was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// Drops the query string, asking the origin for the untransformed original.
#[must_use]
pub fn strip_transforms(url: &str) -> String {
    url.split_once('?').map_or(url, |(base, _)| base).to_string()
}

#[async_trait]
impl ImageFetchPort for FallbackFetcher {
    async fn fetch(&self, url: &str) -> LoadResult<LoadedImage> {
        let timeout_ms = u64::try_from(self.attempt_timeout.as_millis()).unwrap_or(u64::MAX);
        let mut last = LoadError::network("no fetch strategy configured");

        for (attempt, strategy) in self.strategies.iter().enumerate() {
            let target = strategy
                .rewrite
                .as_ref()
                .map_or_else(|| url.to_string(), |rewrite| rewrite(url));

            match tokio::time::timeout(self.attempt_timeout, strategy.fetcher.fetch(&target)).await
            {
                Ok(Ok(image)) => {
                    if attempt > 0 {
                        debug!(url = %url, attempt, strategy = strategy.fetcher.name(), "Fallback strategy succeeded");
                    }
                    return Ok(image);
                }
                Ok(Err(e)) => {
                    warn!(url = %target, strategy = strategy.fetcher.name(), error = %e, "Fetch strategy failed");
                    last = e;
                }
                Err(_) => {
                    warn!(url = %target, strategy = strategy.fetcher.name(), timeout_ms, "Fetch strategy timed out");
                    last = LoadError::Timeout { timeout_ms };
                }
            }
        }

        Err(LoadError::Exhausted {
            attempts: self.strategies.len(),
            last: Box::new(last),
        })
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
