//! Static image asset catalog.

use std::collections::HashMap;

use super::transform::{CropMode, Gravity, ImageFormat, TransformRequest};

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Creates new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Category of a catalog image. Drives the default transform preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageCategory {
    /// Full-width banner imagery.
    Hero,
    /// Product shots (cards, letterheads, flyers).
    Product,
    /// Portfolio and design samples.
    Portfolio,
    /// People and team photography.
    Team,
    /// Logos and small icons.
    Icon,
}

impl ImageCategory {
    /// Returns the default transform preset for this category.
    #[must_use]
    pub const fn defaults(self) -> TransformRequest {
        let (quality, format, crop, gravity) = match self {
            Self::Hero => (90, ImageFormat::Webp, CropMode::Fill, Gravity::Center),
            Self::Product | Self::Portfolio => {
                (85, ImageFormat::Webp, CropMode::Fill, Gravity::Center)
            }
            Self::Team => (80, ImageFormat::Webp, CropMode::Crop, Gravity::Faces),
            Self::Icon => (90, ImageFormat::Png, CropMode::Max, Gravity::Center),
        };
        TransformRequest {
            width: None,
            height: None,
            quality: Some(quality),
            format: Some(format),
            blur: None,
            crop: Some(crop),
            gravity: Some(gravity),
        }
    }
}

impl std::fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hero => write!(f, "hero"),
            Self::Product => write!(f, "product"),
            Self::Portfolio => write!(f, "portfolio"),
            Self::Team => write!(f, "team"),
            Self::Icon => write!(f, "icon"),
        }
    }
}

/// An image known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Logical identifier (the filename used by pages).
    pub id: &'static str,
    /// Object key on the CDN origin.
    pub source_key: &'static str,
    /// Dimensions of the stored original.
    pub native: Dimensions,
    /// Category used for default transforms.
    pub category: ImageCategory,
}

const BUILTIN: &[ImageDescriptor] = &[
    ImageDescriptor {
        id: "hero.jpg",
        source_key: "site/hero-press-floor.jpg",
        native: Dimensions::new(2400, 1350),
        category: ImageCategory::Hero,
    },
    ImageDescriptor {
        id: "design.jpg",
        source_key: "site/design-studio.jpg",
        native: Dimensions::new(1920, 1280),
        category: ImageCategory::Product,
    },
    ImageDescriptor {
        id: "business-cards.jpg",
        source_key: "products/business-cards-stack.jpg",
        native: Dimensions::new(1600, 1067),
        category: ImageCategory::Product,
    },
    ImageDescriptor {
        id: "letterhead.jpg",
        source_key: "products/letterhead-set.jpg",
        native: Dimensions::new(1600, 1200),
        category: ImageCategory::Product,
    },
    ImageDescriptor {
        id: "flyers.jpg",
        source_key: "products/flyers-fan.jpg",
        native: Dimensions::new(1600, 1067),
        category: ImageCategory::Product,
    },
    ImageDescriptor {
        id: "portfolio-1.jpg",
        source_key: "portfolio/foil-cards.jpg",
        native: Dimensions::new(1800, 1200),
        category: ImageCategory::Portfolio,
    },
    ImageDescriptor {
        id: "portfolio-2.jpg",
        source_key: "portfolio/embossed-invites.jpg",
        native: Dimensions::new(1800, 1200),
        category: ImageCategory::Portfolio,
    },
    ImageDescriptor {
        id: "about.jpg",
        source_key: "site/about-team.jpg",
        native: Dimensions::new(2000, 1333),
        category: ImageCategory::Team,
    },
    ImageDescriptor {
        id: "owner.jpg",
        source_key: "site/owner-portrait.jpg",
        native: Dimensions::new(1200, 1500),
        category: ImageCategory::Team,
    },
    ImageDescriptor {
        id: "logo.png",
        source_key: "brand/logo-mark.png",
        native: Dimensions::new(512, 512),
        category: ImageCategory::Icon,
    },
];

/// Immutable lookup table of known images, keyed by id.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    entries: HashMap<&'static str, ImageDescriptor>,
}

impl AssetCatalog {
    /// Builds a catalog from descriptors. Later duplicates replace earlier ones.
    #[must_use]
    pub fn new(descriptors: impl IntoIterator<Item = ImageDescriptor>) -> Self {
        let entries = descriptors.into_iter().map(|d| (d.id, d)).collect();
        Self { entries }
    }

    /// The storefront's built-in table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(BUILTIN.iter().cloned())
    }

    /// Looks up a descriptor by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ImageDescriptor> {
        self.entries.get(id)
    }

    /// Returns true if the id is known.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
