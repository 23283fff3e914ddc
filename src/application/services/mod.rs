/// Frame-rate sampling.
pub mod frame_rate;
/// Device heuristics and the performance manager.
pub mod heuristics;
/// Responsive descriptor sets.
pub mod srcset;
/// CDN URL resolution and progressive tiers.
pub mod url_builder;

pub use frame_rate::{FrameRateMonitor, FrameSample};
pub use heuristics::{PerformanceManager, PerformanceProfile, evaluate};
pub use srcset::{BREAKPOINTS, descriptor_set, descriptor_set_with, quality_for_width, sizes_hint};
pub use url_builder::{UrlBuilder, tier_transform};
