//! Progressive image state for one rendered image instance.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::application::services::UrlBuilder;
use crate::domain::entities::{LoadedImage, ProgressiveUrlSet, Rect, Tier, TransformRequest};
use crate::infrastructure::config::LoaderConfig;
use crate::infrastructure::image::PreloadCache;

/// Final result of a progressive load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every tier loaded.
    Loaded,
    /// A tier failed; later tiers were skipped.
    Error,
}

/// Lifecycle of one progressive image instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageState {
    /// Not yet near the viewport.
    #[default]
    NotVisible,
    /// In or near the viewport, waiting for [`ProgressiveImage::run`].
    Visible,
    /// Fetching a tier.
    Loading(Tier),
    /// Terminal.
    Settled(Outcome),
}

impl ImageState {
    /// Returns true in a terminal state.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Settled(_))
    }
}

/// Per-instance knobs.
#[derive(Debug, Clone, Copy)]
pub struct ProgressiveOptions {
    /// Pause between tiers.
    pub settle_delay: Duration,
    /// Distance outside the viewport that counts as visible.
    pub proximity_margin: i32,
    /// Visible on construction, without waiting for [`ProgressiveImage::observe`].
    pub priority: bool,
}

impl ProgressiveOptions {
    /// Marks the instance as priority.
    #[must_use]
    pub const fn priority(mut self) -> Self {
        self.priority = true;
        self
    }
}

impl Default for ProgressiveOptions {
    fn default() -> Self {
        Self::from(&LoaderConfig::default())
    }
}

impl From<&LoaderConfig> for ProgressiveOptions {
    fn from(config: &LoaderConfig) -> Self {
        Self {
            settle_delay: config.settle_delay(),
            proximity_margin: config.proximity_margin,
            priority: false,
        }
    }
}

/// Walks one image through placeholder, low, medium and high tiers.
///
/// Each instance runs its own sequence even when another instance already
/// loaded the same URLs; those loads are served from the shared cache.
pub struct ProgressiveImage {
    id: Uuid,
    asset: String,
    urls: ProgressiveUrlSet,
    cache: Arc<PreloadCache>,
    options: ProgressiveOptions,
    mounted: AtomicBool,
    state: watch::Sender<ImageState>,
    history: Mutex<Vec<ImageState>>,
    current_src: RwLock<Option<String>>,
    image: RwLock<Option<Arc<LoadedImage>>>,
}

impl ProgressiveImage {
    /// Creates an instance for `asset`. Priority instances start visible.
    #[must_use]
    pub fn new(
        builder: &UrlBuilder,
        cache: Arc<PreloadCache>,
        asset: &str,
        base: &TransformRequest,
        options: ProgressiveOptions,
    ) -> Self {
        let (state, _) = watch::channel(ImageState::NotVisible);
        let image = Self {
            id: Uuid::new_v4(),
            asset: asset.to_string(),
            urls: builder.progressive_set(asset, base),
            cache,
            options,
            mounted: AtomicBool::new(true),
            state,
            history: Mutex::new(vec![ImageState::NotVisible]),
            current_src: RwLock::new(None),
            image: RwLock::new(None),
        };
        if options.priority {
            image.become_visible();
        }
        image
    }

    /// Unique instance id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Asset id or original reference.
    #[must_use]
    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Tier URLs for this instance.
    #[must_use]
    pub const fn urls(&self) -> &ProgressiveUrlSet {
        &self.urls
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ImageState {
        *self.state.borrow()
    }

    /// Receiver for state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ImageState> {
        self.state.subscribe()
    }

    /// Every state this instance has been in, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<ImageState> {
        self.history.lock().clone()
    }

    /// URL currently displayed. `None` until the instance is visible.
    #[must_use]
    pub fn current_src(&self) -> Option<String> {
        self.current_src.read().clone()
    }

    /// Most refined tier decoded so far.
    #[must_use]
    pub fn image(&self) -> Option<Arc<LoadedImage>> {
        self.image.read().clone()
    }

    /// Returns false after [`Self::unmount`].
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Detaches the instance. Loads already started still finish and fill
    /// the cache, but this instance stops updating.
    pub fn unmount(&self) {
        if self.mounted.swap(false, Ordering::AcqRel) {
            debug!(instance = %self.id, asset = %self.asset, "Progressive image unmounted");
        }
    }

    /// Reports the element position. Returns true when this call made it visible.
    pub fn observe(&self, element: Rect, viewport: Rect) -> bool {
        if self.state() != ImageState::NotVisible || !self.is_mounted() {
            return false;
        }
        if !element.intersects(&viewport.expanded(self.options.proximity_margin)) {
            return false;
        }
        self.become_visible();
        true
    }

    /// Loads the low, medium and high tiers in order through the cache.
    ///
    /// Does nothing unless the instance is visible and idle. Returns the state
    /// it stopped in.
    pub async fn run(&self) -> ImageState {
        if self.state() != ImageState::Visible {
            return self.state();
        }

        for tier in Tier::LOADING_ORDER {
            if !self.is_mounted() {
                return self.state();
            }
            self.transition(ImageState::Loading(tier));

            let url = self.urls.get(tier);
            match self.cache.ensure_loaded(url).await {
                Ok(image) => {
                    if !self.is_mounted() {
                        return self.state();
                    }
                    trace!(instance = %self.id, tier = %tier, url = %url, "Tier ready");
                    *self.current_src.write() = Some(url.to_string());
                    *self.image.write() = Some(image);
                }
                Err(e) => {
                    warn!(asset = %self.asset, tier = %tier, error = %e, "Progressive load failed");
                    if self.is_mounted() {
                        self.transition(ImageState::Settled(Outcome::Error));
                    }
                    return self.state();
                }
            }

            if tier != Tier::High {
                tokio::time::sleep(self.options.settle_delay).await;
            }
        }

        if self.is_mounted() {
            self.transition(ImageState::Settled(Outcome::Loaded));
        }
        self.state()
    }

    fn become_visible(&self) {
        *self.current_src.write() = Some(self.urls.placeholder.clone());
        self.transition(ImageState::Visible);
    }

    fn transition(&self, next: ImageState) {
        self.history.lock().push(next);
        self.state.send_replace(next);
    }
}

impl std::fmt::Debug for ProgressiveImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressiveImage")
            .field("id", &self.id)
            .field("asset", &self.asset)
            .field("state", &self.state())
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::AssetCatalog;
    use crate::domain::ports::mocks::CountingFetcher;
    use crate::infrastructure::config::CdnConfig;

    const FETCH_DELAY: Duration = Duration::from_millis(40);

    struct Fixture {
        builder: UrlBuilder,
        fetcher: Arc<CountingFetcher>,
        cache: Arc<PreloadCache>,
    }

    impl Fixture {
        fn new() -> Self {
            let fetcher = Arc::new(CountingFetcher::new(FETCH_DELAY));
            Self {
                builder: UrlBuilder::new(AssetCatalog::builtin(), &CdnConfig::default()),
                cache: Arc::new(PreloadCache::new(fetcher.clone(), 32)),
                fetcher,
            }
        }

        fn image(&self, asset: &str, options: ProgressiveOptions) -> ProgressiveImage {
            let base = TransformRequest::new().with_width(600);
            ProgressiveImage::new(&self.builder, self.cache.clone(), asset, &base, options)
        }
    }

    fn full_sequence() -> Vec<ImageState> {
        vec![
            ImageState::NotVisible,
            ImageState::Visible,
            ImageState::Loading(Tier::Low),
            ImageState::Loading(Tier::Medium),
            ImageState::Loading(Tier::High),
            ImageState::Settled(Outcome::Loaded),
        ]
    }

    #[test]
    fn test_observe_with_proximity_margin() {
        let fixture = Fixture::new();
        let image = fixture.image("flyers.jpg", ProgressiveOptions::default());
        let viewport = Rect::new(0, 0, 800, 600);

        assert!(!image.observe(Rect::new(0, 700, 200, 200), viewport));
        assert_eq!(image.state(), ImageState::NotVisible);
        assert_eq!(image.current_src(), None);

        assert!(image.observe(Rect::new(0, 640, 200, 200), viewport));
        assert_eq!(image.state(), ImageState::Visible);
        assert_eq!(image.current_src().as_deref(), Some(image.urls().placeholder.as_str()));

        assert!(!image.observe(Rect::new(0, 0, 10, 10), viewport));
    }

    #[test]
    fn test_priority_is_visible_immediately() {
        let fixture = Fixture::new();
        let image = fixture.image("hero.jpg", ProgressiveOptions::default().priority());
        assert_eq!(image.state(), ImageState::Visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_visible_does_not_load() {
        let fixture = Fixture::new();
        let image = fixture.image("flyers.jpg", ProgressiveOptions::default());

        assert_eq!(image.run().await, ImageState::NotVisible);
        assert_eq!(fixture.fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tiers_load_in_order() {
        let fixture = Fixture::new();
        let image = fixture.image("design.jpg", ProgressiveOptions::default().priority());

        assert_eq!(image.run().await, ImageState::Settled(Outcome::Loaded));
        assert_eq!(image.history(), full_sequence());
        assert_eq!(
            fixture.fetcher.fetched_urls(),
            vec![
                image.urls().low.clone(),
                image.urls().medium.clone(),
                image.urls().high.clone()
            ]
        );
        assert_eq!(image.current_src().as_deref(), Some(image.urls().high.as_str()));
        assert!(image.image().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_stops_later_tiers() {
        let fixture = Fixture::new();
        let image = fixture.image("letterhead.jpg", ProgressiveOptions::default().priority());
        fixture.fetcher.fail_on(image.urls().medium.clone());

        assert_eq!(image.run().await, ImageState::Settled(Outcome::Error));
        assert_eq!(fixture.fetcher.calls_for(&image.urls().high), 0);
        assert_eq!(image.current_src().as_deref(), Some(image.urls().low.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remount_replays_from_cache() {
        let fixture = Fixture::new();
        let first = fixture.image("about.jpg", ProgressiveOptions::default().priority());
        first.run().await;
        first.unmount();
        assert_eq!(fixture.fetcher.calls(), 3);

        let second = fixture.image("about.jpg", ProgressiveOptions::default().priority());
        assert_ne!(first.id(), second.id());
        assert_eq!(second.run().await, ImageState::Settled(Outcome::Loaded));
        assert_eq!(second.history(), full_sequence());
        assert_eq!(fixture.fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmounted_instance_stops_writing() {
        let fixture = Fixture::new();
        let image = Arc::new(fixture.image("owner.jpg", ProgressiveOptions::default().priority()));
        let placeholder = image.urls().placeholder.clone();
        let low = image.urls().low.clone();

        let runner = tokio::spawn({
            let image = image.clone();
            async move { image.run().await }
        });
        tokio::time::sleep(FETCH_DELAY / 2).await;
        image.unmount();

        assert_eq!(runner.await.unwrap(), ImageState::Loading(Tier::Low));
        assert_eq!(image.current_src(), Some(placeholder));
        assert!(fixture.cache.is_loaded(&low));
        assert_eq!(fixture.fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remount_during_load_joins_in_flight_request() {
        let fixture = Fixture::new();
        let first = Arc::new(fixture.image("business-cards.jpg", ProgressiveOptions::default().priority()));
        let low = first.urls().low.clone();

        let runner = tokio::spawn({
            let first = first.clone();
            async move { first.run().await }
        });
        tokio::time::sleep(FETCH_DELAY / 2).await;
        first.unmount();
        assert_eq!(fixture.cache.in_flight(), 1);

        let second = fixture.image("business-cards.jpg", ProgressiveOptions::default().priority());
        assert_eq!(second.run().await, ImageState::Settled(Outcome::Loaded));
        assert_eq!(runner.await.unwrap(), ImageState::Loading(Tier::Low));

        assert_eq!(second.history(), full_sequence());
        assert_eq!(fixture.fetcher.calls(), 3);
        assert_eq!(fixture.fetcher.calls_for(&low), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_settled_state() {
        let fixture = Fixture::new();
        let image = fixture.image("portfolio-1.jpg", ProgressiveOptions::default().priority());
        let mut rx = image.subscribe();

        image.run().await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ImageState::Settled(Outcome::Loaded));
    }
}
