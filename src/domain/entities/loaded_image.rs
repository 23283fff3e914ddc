//! Domain types for loaded images.

use std::sync::Arc;

use super::asset::Dimensions;

/// A decoded image held by the preload cache.
#[derive(Clone)]
pub struct LoadedImage {
    /// URL the image was fetched from.
    pub url: String,
    /// Decoded dimensions.
    pub dimensions: Dimensions,
    /// Size of the encoded payload in bytes.
    pub byte_len: usize,
    /// Decoded pixels.
    pub image: Arc<image::DynamicImage>,
}

impl LoadedImage {
    /// Wraps a decoded image.
    #[must_use]
    pub fn new(url: impl Into<String>, image: image::DynamicImage, byte_len: usize) -> Self {
        Self {
            url: url.into(),
            dimensions: Dimensions::new(image.width(), image.height()),
            byte_len,
            image: Arc::new(image),
        }
    }
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedImage")
            .field("url", &self.url)
            .field("dimensions", &self.dimensions)
            .field("byte_len", &self.byte_len)
            .finish_non_exhaustive()
    }
}

/// Completion state of a URL in the preload cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing known about this URL (never requested, failed, or evicted).
    #[default]
    Absent,
    /// A load is in flight.
    Pending,
    /// Decoded and cached.
    Loaded,
}

/// Where a load was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Served from the in-memory LRU.
    MemoryCache,
    /// Joined a load another caller had already started.
    InFlight,
    /// Fetched over the network.
    Network,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemoryCache => write!(f, "memory"),
            Self::InFlight => write!(f, "in-flight"),
            Self::Network => write!(f, "network"),
        }
    }
}
