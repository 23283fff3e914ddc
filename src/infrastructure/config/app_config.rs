//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{AssetCatalog, EffectiveConnectionType};
use crate::infrastructure::cdn::{DEFAULT_DPR, DEFAULT_ORIGIN};

const APP_NAME: &str = "cardmedia";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "cardpress";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, loaded from `config.toml` and overridden by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Image CDN settings.
    #[serde(default)]
    pub cdn: CdnConfig,

    /// Preload cache and queue settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Performance heuristics settings.
    #[serde(default)]
    pub heuristics: HeuristicsConfig,
}

/// Image CDN configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdnConfig {
    /// Origin that serves transformed images.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Device pixel ratio hint sent as `dpr`.
    #[serde(default = "default_dpr")]
    pub dpr: u32,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            dpr: default_dpr(),
        }
    }
}

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Maximum decoded images kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Upper bound on simultaneous loads started by the queue.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Queue drain polling interval.
    #[serde(default = "default_drain_interval_ms")]
    pub drain_interval_ms: u64,

    /// Pause between progressive tiers.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Distance in pixels outside the viewport that already counts as visible.
    #[serde(default = "default_proximity_margin")]
    pub proximity_margin: i32,
}

impl LoaderConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Queue drain period.
    #[must_use]
    pub const fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }

    /// Pause between progressive tiers.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            max_concurrent: default_max_concurrent(),
            timeout_secs: default_timeout_secs(),
            drain_interval_ms: default_drain_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            proximity_margin: default_proximity_margin(),
        }
    }
}

/// Performance heuristics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    /// Frame rate under which reduced motion kicks in.
    #[serde(default = "default_fps_threshold")]
    pub fps_threshold: f64,

    /// Length of one frame-rate sampling window.
    #[serde(default = "default_sample_window_ms")]
    pub sample_window_ms: u64,

    /// How often the seed list is pushed into the queue.
    #[serde(default = "default_top_up_interval_ms")]
    pub top_up_interval_ms: u64,

    /// Catalog ids prefetched in the background.
    #[serde(default = "default_seed_assets")]
    pub seed_assets: Vec<String>,

    /// Network class override. The platform does not report one natively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_type: Option<EffectiveConnectionType>,

    /// User preference to save data. Disables seed prefetching.
    #[serde(default)]
    pub save_data: bool,
}

impl HeuristicsConfig {
    /// Frame-rate sampling window.
    #[must_use]
    pub const fn sample_window(&self) -> Duration {
        Duration::from_millis(self.sample_window_ms)
    }

    /// Seed top-up period.
    #[must_use]
    pub const fn top_up_interval(&self) -> Duration {
        Duration::from_millis(self.top_up_interval_ms)
    }

    /// Drops seed ids the catalog does not know and returns them.
    ///
    /// Unknown ids resolve to themselves, so prefetching them would request
    /// a bare reference instead of a CDN URL.
    pub fn retain_known_seeds(&mut self, catalog: &AssetCatalog) -> Vec<String> {
        let (known, unknown) = std::mem::take(&mut self.seed_assets)
            .into_iter()
            .partition(|id| catalog.contains(id));
        self.seed_assets = known;
        unknown
    }
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            fps_threshold: default_fps_threshold(),
            sample_window_ms: default_sample_window_ms(),
            top_up_interval_ms: default_top_up_interval_ms(),
            seed_assets: default_seed_assets(),
            effective_type: None,
            save_data: false,
        }
    }
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

const fn default_dpr() -> u32 {
    DEFAULT_DPR
}

const fn default_cache_capacity() -> usize {
    64
}

const fn default_max_concurrent() -> usize {
    4
}

const fn default_timeout_secs() -> u64 {
    15
}

const fn default_drain_interval_ms() -> u64 {
    100
}

const fn default_settle_delay_ms() -> u64 {
    150
}

const fn default_proximity_margin() -> i32 {
    50
}

fn default_fps_threshold() -> f64 {
    30.0
}

const fn default_sample_window_ms() -> u64 {
    1000
}

const fn default_top_up_interval_ms() -> u64 {
    2000
}

fn default_seed_assets() -> Vec<String> {
    ["hero.jpg", "design.jpg", "business-cards.jpg", "about.jpg"]
        .into_iter()
        .map(String::from)
        .collect()
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(origin) = &args.origin {
            self.cdn.origin.clone_from(origin);
        }
        if let Some(dpr) = args.dpr {
            self.cdn.dpr = dpr;
        }
        if let Some(max_concurrent) = args.max_concurrent {
            self.loader.max_concurrent = max_concurrent;
        }
        if let Some(cache_capacity) = args.cache_capacity {
            self.loader.cache_capacity = cache_capacity;
        }
        if let Some(effective_type) = args.effective_type {
            self.heuristics.effective_type = Some(effective_type);
        }
        if args.save_data {
            self.heuristics.save_data = true;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("cardmedia.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            cdn: CdnConfig::default(),
            loader: LoaderConfig::default(),
            heuristics: HeuristicsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
            log_level = "debug"

            [cdn]
            origin = "https://cdn.test"

            [loader]
            max_concurrent = 2

            [heuristics]
            effective_type = "3g"
            seed_assets = ["logo.png"]
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.cdn.origin, "https://cdn.test");
        assert_eq!(config.cdn.dpr, 2);
        assert_eq!(config.loader.max_concurrent, 2);
        assert_eq!(config.loader.cache_capacity, 64);
        assert_eq!(
            config.heuristics.effective_type,
            Some(EffectiveConnectionType::ThreeG)
        );
        assert_eq!(config.heuristics.seed_assets, vec!["logo.png".to_string()]);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").expect("Failed to parse config");
        assert_eq!(config.loader, LoaderConfig::default());
        assert_eq!(config.heuristics.seed_assets.len(), 4);
    }

    #[test]
    fn test_retain_known_seeds() {
        let mut heuristics = HeuristicsConfig {
            seed_assets: vec!["hero.jpg".into(), "banner.gif".into(), "logo.png".into()],
            ..HeuristicsConfig::default()
        };

        let dropped = heuristics.retain_known_seeds(&AssetCatalog::builtin());
        assert_eq!(dropped, vec!["banner.gif".to_string()]);
        assert_eq!(heuristics.seed_assets, vec!["hero.jpg".to_string(), "logo.png".to_string()]);
    }

    #[test]
    fn test_merge_with_args() {
        let args = CliArgs::parse_from([
            "cardmedia",
            "--origin",
            "https://cdn.other",
            "--max-concurrent",
            "6",
            "--effective-type",
            "4g",
            "--save-data",
            "srcset",
            "design.jpg",
        ]);
        let mut config = AppConfig::default();
        config.merge_with_args(&args);

        assert_eq!(config.cdn.origin, "https://cdn.other");
        assert_eq!(config.loader.max_concurrent, 6);
        assert_eq!(
            config.heuristics.effective_type,
            Some(EffectiveConnectionType::FourG)
        );
        assert!(config.heuristics.save_data);
    }

    #[test]
    fn test_save_data_flag_absent_keeps_config() {
        let args = CliArgs::parse_from(["cardmedia", "catalog"]);
        let mut config = AppConfig::default();
        config.heuristics.save_data = true;
        config.merge_with_args(&args);

        assert!(config.heuristics.save_data);
    }
}
