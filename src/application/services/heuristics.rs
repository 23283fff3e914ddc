//! Device and network heuristics steering prefetch behavior.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use super::frame_rate::FrameRateMonitor;
use super::srcset::descriptor_set_with;
use super::url_builder::{UrlBuilder, tier_transform};
use crate::domain::entities::{DeviceSignals, Tier, TransformRequest};
use crate::domain::errors::EnvironmentError;
use crate::domain::ports::SignalSourcePort;
use crate::infrastructure::config::HeuristicsConfig;
use crate::infrastructure::image::LoadQueue;
use crate::infrastructure::scheduler::{TaskHandle, spawn_periodic};

/// Hard ceiling on prefetch concurrency.
pub const MAX_CONCURRENCY: usize = 8;

/// Display-rate tick used by the frame sampler.
pub const FRAME_TICK: Duration = Duration::from_millis(16);

const ASSUMED_MEMORY_GB: f64 = 4.0;
const ASSUMED_CORES: usize = 4;
const AGGRESSIVE_MIN_MEMORY_GB: f64 = 4.0;
const AGGRESSIVE_MIN_CORES: usize = 4;
const QUALITY_STEP_DOWN: u32 = 10;
const QUALITY_FLOOR: u32 = 30;
const SEED_PRIORITY: i32 = 1;

/// Outcome of evaluating one signal sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceProfile {
    /// The sample this profile was computed from.
    pub signals: DeviceSignals,
    /// Device can afford eager prefetching.
    pub aggressive: bool,
    /// Concurrency cap for the prefetch queue.
    pub concurrency: usize,
    /// False when no signal at all was reported.
    pub supported: bool,
}

/// Computes the aggressive flag and concurrency cap for a sample.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn evaluate(signals: &DeviceSignals) -> PerformanceProfile {
    if signals.is_empty() {
        let e = EnvironmentError::Unsupported {
            feature: "device signals",
        };
        debug!(error = %e, "Heuristics disabled");
        return PerformanceProfile {
            signals: *signals,
            aggressive: false,
            concurrency: ASSUMED_CORES / 2,
            supported: false,
        };
    }

    let aggressive = !signals.save_data
        && signals
            .device_memory_gb
            .is_some_and(|gb| gb >= AGGRESSIVE_MIN_MEMORY_GB)
        && signals
            .logical_cores
            .is_some_and(|cores| cores >= AGGRESSIVE_MIN_CORES)
        && signals.effective_type.is_none_or(|t| t.is_fast());

    let memory = signals.device_memory_gb.unwrap_or(ASSUMED_MEMORY_GB);
    let memory_slots = (memory * 2.0).floor().max(0.0) as usize;
    let cores = signals.logical_cores.unwrap_or(ASSUMED_CORES);
    let mut concurrency = memory_slots.min(cores).min(MAX_CONCURRENCY).max(1);
    if !aggressive {
        concurrency = (concurrency / 2).max(1);
    }

    PerformanceProfile {
        signals: *signals,
        aggressive,
        concurrency,
        supported: true,
    }
}

/// Samples device signals and frame rate, and feeds the prefetch queue.
pub struct PerformanceManager {
    source: Arc<dyn SignalSourcePort>,
    builder: Arc<UrlBuilder>,
    config: HeuristicsConfig,
    profile: RwLock<PerformanceProfile>,
    frames: Mutex<FrameRateMonitor>,
    reduced_motion: watch::Sender<bool>,
}

impl PerformanceManager {
    /// Creates a manager and takes the first signal sample.
    #[must_use]
    pub fn new(
        source: Arc<dyn SignalSourcePort>,
        builder: Arc<UrlBuilder>,
        config: HeuristicsConfig,
    ) -> Self {
        let profile = evaluate(&source.sample());
        let frames = FrameRateMonitor::new(config.sample_window(), config.fps_threshold);
        let (reduced_motion, _) = watch::channel(false);
        info!(
            aggressive = profile.aggressive,
            concurrency = profile.concurrency,
            "Performance profile evaluated"
        );
        Self {
            source,
            builder,
            config,
            profile: RwLock::new(profile),
            frames: Mutex::new(frames),
            reduced_motion,
        }
    }

    /// Re-samples device signals.
    pub fn refresh(&self) -> PerformanceProfile {
        let profile = evaluate(&self.source.sample());
        *self.profile.write() = profile;
        profile
    }

    /// Last evaluated profile.
    #[must_use]
    pub fn profile(&self) -> PerformanceProfile {
        *self.profile.read()
    }

    /// Whether the last profile allows aggressive prefetching.
    #[must_use]
    pub fn is_aggressive(&self) -> bool {
        self.profile.read().aggressive
    }

    /// Concurrency cap of the last profile.
    #[must_use]
    pub fn concurrency_cap(&self) -> usize {
        self.profile.read().concurrency
    }

    /// Quality to request for a nominal `base` quality.
    #[must_use]
    pub fn preferred_quality(&self, base: u32) -> u32 {
        if self.is_aggressive() {
            base
        } else {
            base.saturating_sub(QUALITY_STEP_DOWN).max(QUALITY_FLOOR.min(base))
        }
    }

    /// Responsive descriptor set with qualities adjusted to the profile.
    #[must_use]
    pub fn descriptor_set(&self, id: &str, base: &TransformRequest) -> String {
        descriptor_set_with(&self.builder, id, base, |q| self.preferred_quality(q))
    }

    /// Feeds one frame timestamp to the sampler.
    pub fn record_frame(&self, at: Instant) {
        let sample = self.frames.lock().record_frame(at);
        if let Some(sample) = sample {
            let changed = self.reduced_motion.send_if_modified(|current| {
                let changed = *current != sample.reduced_motion;
                *current = sample.reduced_motion;
                changed
            });
            if changed {
                info!(
                    fps = sample.fps,
                    reduced_motion = sample.reduced_motion,
                    "Reduced motion toggled"
                );
            }
        }
    }

    /// Current reduced-motion flag.
    #[must_use]
    pub fn reduced_motion(&self) -> bool {
        *self.reduced_motion.borrow()
    }

    /// Receiver for reduced-motion changes, read by styling code.
    #[must_use]
    pub fn subscribe_reduced_motion(&self) -> watch::Receiver<bool> {
        self.reduced_motion.subscribe()
    }

    /// Queues every seed asset at the high tier. Returns how many were new.
    pub fn top_up(&self, queue: &LoadQueue) -> usize {
        if self.profile().signals.save_data {
            debug!("Save-data requested, skipping seed prefetch");
            return 0;
        }

        let high = tier_transform(Tier::High, &TransformRequest::new());
        let added = self
            .config
            .seed_assets
            .iter()
            .filter(|id| queue.enqueue(self.builder.resolve(id, &high), SEED_PRIORITY, false))
            .count();
        if added > 0 {
            debug!(added, "Seed assets queued");
        }
        added
    }

    /// Applies the concurrency cap to `queue`, then keeps topping it up.
    pub fn start(self: &Arc<Self>, queue: Arc<LoadQueue>) -> TaskHandle {
        queue.set_concurrency(self.concurrency_cap());
        let manager = self.clone();
        spawn_periodic("seed-top-up", self.config.top_up_interval(), move || {
            manager.top_up(&queue);
            std::future::ready(())
        })
    }

    /// Samples scheduling rate at display cadence.
    pub fn start_frame_sampler(self: &Arc<Self>) -> TaskHandle {
        let manager = self.clone();
        spawn_periodic("frame-sampler", FRAME_TICK, move || {
            manager.record_frame(Instant::now());
            std::future::ready(())
        })
    }
}

impl std::fmt::Debug for PerformanceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceManager")
            .field("profile", &self.profile())
            .field("reduced_motion", &self.reduced_motion())
            .finish_non_exhaustive()
    }
}
