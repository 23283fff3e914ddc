//! CLI command handlers. Each returns the text to print.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::application::services::{PerformanceManager, UrlBuilder, descriptor_set, sizes_hint};
use crate::domain::entities::{AssetCatalog, TransformRequest};
use crate::domain::errors::LoadError;
use crate::domain::ports::{ImageFetchPort, SignalSourcePort};
use crate::infrastructure::config::{AppConfig, Command};
use crate::infrastructure::image::{
    FallbackFetcher, HttpImageFetcher, ItemStatus, LoadQueue, PreloadCache, PreloadStats,
    strip_transforms,
};
use crate::infrastructure::system_signals::SystemSignalSource;
use crate::presentation::widgets::{ImageState, ProgressiveImage, ProgressiveOptions};

/// Asset rendered with priority during a prefetch session.
const PRIORITY_ASSET: &str = "hero.jpg";

/// Command execution errors.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum CommandError {
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to set up image fetching: {0}")]
    Setup(#[from] LoadError),
}

/// Summary of one prefetch session.
#[derive(Debug, Clone)]
pub struct PrefetchReport {
    /// Entries in the queue at the end.
    pub queued: usize,
    /// Entries loaded.
    pub loaded: usize,
    /// Entries that failed.
    pub failed: usize,
    /// Concurrency cap in effect.
    pub concurrency: usize,
    /// Whether the profile was aggressive.
    pub aggressive: bool,
    /// Reduced-motion flag at the end.
    pub reduced_motion: bool,
    /// Final state of the priority image.
    pub priority_state: ImageState,
    /// Preload cache counters.
    pub cache: PreloadStats,
}

impl std::fmt::Display for PrefetchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "queue: {} queued, {} loaded, {} failed (cap {})",
            self.queued, self.loaded, self.failed, self.concurrency
        )?;
        writeln!(
            f,
            "profile: aggressive={} reduced_motion={}",
            self.aggressive, self.reduced_motion
        )?;
        writeln!(f, "{PRIORITY_ASSET}: {:?}", self.priority_state)?;
        write!(f, "cache: {}", self.cache)
    }
}

/// Executes CLI subcommands against one configuration.
pub struct CommandRunner {
    config: AppConfig,
    builder: Arc<UrlBuilder>,
}

impl CommandRunner {
    /// Creates a runner over the built-in catalog.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let builder = Arc::new(UrlBuilder::new(AssetCatalog::builtin(), &config.cdn));
        Self { config, builder }
    }

    /// URL builder used by every command.
    #[must_use]
    pub fn builder(&self) -> &UrlBuilder {
        &self.builder
    }

    /// Runs a parsed subcommand.
    ///
    /// # Errors
    /// Returns error if output cannot be encoded or the HTTP client cannot be built.
    pub async fn execute(&self, command: &Command) -> Result<String, CommandError> {
        match command {
            Command::Resolve { id, transform } => Ok(self.resolve(id, &(*transform).into())),
            Command::Progressive {
                id,
                transform,
                json,
            } => self.progressive(id, &(*transform).into(), *json),
            Command::Srcset { id, adaptive } => Ok(self.srcset(id, *adaptive)),
            Command::Catalog => Ok(self.catalog()),
            Command::Prefetch { seconds } => {
                let report = self.prefetch(Duration::from_secs(*seconds)).await?;
                Ok(report.to_string())
            }
        }
    }

    /// Delivery URL for `id`.
    #[must_use]
    pub fn resolve(&self, id: &str, transform: &TransformRequest) -> String {
        self.builder.resolve(id, transform)
    }

    /// Tier URLs, one `tier: url` line each, or a JSON object.
    ///
    /// # Errors
    /// Returns error if JSON encoding fails.
    pub fn progressive(
        &self,
        id: &str,
        base: &TransformRequest,
        json: bool,
    ) -> Result<String, CommandError> {
        let set = self.builder.progressive_set(id, base);
        if json {
            return Ok(serde_json::to_string_pretty(&set)?);
        }
        Ok(format!(
            "placeholder: {}\nlow: {}\nmedium: {}\nhigh: {}",
            set.placeholder, set.low, set.medium, set.high
        ))
    }

    /// Descriptor set and `sizes` hint, one per line.
    #[must_use]
    pub fn srcset(&self, id: &str, adaptive: bool) -> String {
        let set = self.descriptor_set(id, adaptive);
        format!("srcset: {set}\nsizes: {}", sizes_hint())
    }

    fn descriptor_set(&self, id: &str, adaptive: bool) -> String {
        if !adaptive {
            return descriptor_set(&self.builder, id, &TransformRequest::new());
        }
        let manager = self.performance_manager(Arc::new(self.signal_source()));
        manager.descriptor_set(id, &TransformRequest::new())
    }

    /// One line per catalog entry, sorted by id.
    #[must_use]
    pub fn catalog(&self) -> String {
        let catalog = self.builder.catalog();
        let mut out = String::new();
        for id in catalog.ids() {
            if let Some(descriptor) = catalog.get(id) {
                let _ = writeln!(
                    out,
                    "{:<20} {:<10} {}x{}  {}",
                    descriptor.id,
                    descriptor.category,
                    descriptor.native.width,
                    descriptor.native.height,
                    descriptor.source_key
                );
            }
        }
        out.trim_end().to_string()
    }

    /// Prefetches seed assets from the configured CDN for `duration`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub async fn prefetch(&self, duration: Duration) -> Result<PrefetchReport, CommandError> {
        let timeout = self.config.loader.timeout();
        let http: Arc<dyn ImageFetchPort> = Arc::new(HttpImageFetcher::new(timeout)?);
        let fetcher = FallbackFetcher::new(timeout)
            .then(http.clone())
            .then_rewritten(http, Arc::new(strip_transforms));
        let signals = Arc::new(self.signal_source());
        Ok(self.prefetch_with(Arc::new(fetcher), signals, duration).await)
    }

    /// Prefetch session over the given fetcher and signal source.
    pub async fn prefetch_with(
        &self,
        fetcher: Arc<dyn ImageFetchPort>,
        signals: Arc<dyn SignalSourcePort>,
        duration: Duration,
    ) -> PrefetchReport {
        let loader = &self.config.loader;
        let cache = Arc::new(PreloadCache::new(fetcher, loader.cache_capacity));
        let queue = Arc::new(LoadQueue::new(cache.clone(), loader.max_concurrent));
        let manager = Arc::new(self.performance_manager(signals));

        let top_up = manager.start(queue.clone());
        queue.set_concurrency(queue.concurrency().min(loader.max_concurrent));
        let drain = queue.start(loader.drain_interval());
        let sampler = manager.start_frame_sampler();
        info!(
            concurrency = queue.concurrency(),
            aggressive = manager.is_aggressive(),
            seconds = duration.as_secs(),
            "Prefetch session started"
        );

        let priority = ProgressiveImage::new(
            &self.builder,
            cache.clone(),
            PRIORITY_ASSET,
            &TransformRequest::new(),
            ProgressiveOptions::from(loader).priority(),
        );
        let priority_state = tokio::select! {
            state = priority.run() => {
                tokio::time::sleep(duration).await;
                state
            }
            () = tokio::time::sleep(duration) => priority.state(),
        };
        if !priority_state.is_settled() {
            debug!(asset = PRIORITY_ASSET, state = ?priority_state, "Priority image still loading");
        }
        priority.unmount();

        for handle in [top_up, drain, sampler] {
            debug!(task = handle.name(), "Stopping");
            handle.shutdown().await;
        }

        let report = PrefetchReport {
            queued: queue.len(),
            loaded: queue.count(ItemStatus::Loaded),
            failed: queue.count(ItemStatus::Failed),
            concurrency: queue.concurrency(),
            aggressive: manager.is_aggressive(),
            reduced_motion: manager.reduced_motion(),
            priority_state,
            cache: cache.stats(),
        };
        info!(
            loaded = report.loaded,
            failed = report.failed,
            "Prefetch session finished"
        );
        report
    }

    /// Host signals, with the configured network class and save-data preference.
    #[must_use]
    pub fn signal_source(&self) -> SystemSignalSource {
        let heuristics = &self.config.heuristics;
        SystemSignalSource::new(heuristics.effective_type).with_save_data(heuristics.save_data)
    }

    fn performance_manager(&self, signals: Arc<dyn SignalSourcePort>) -> PerformanceManager {
        PerformanceManager::new(
            signals,
            self.builder.clone(),
            self.config.heuristics.clone(),
        )
    }
}

impl std::fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRunner")
            .field("origin", &self.builder.origin())
            .finish_non_exhaustive()
    }
}
