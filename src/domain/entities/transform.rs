//! CDN transform requests and progressive tier URLs.

use serde::{Deserialize, Serialize};

/// Output encoding requested from the CDN.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// WebP.
    Webp,
    /// AVIF.
    Avif,
    /// JPEG.
    Jpg,
    /// PNG.
    Png,
    /// Let the CDN negotiate. No `fm` parameter is emitted.
    Auto,
}

impl ImageFormat {
    /// Query value for the `fm` parameter, if one is emitted.
    #[must_use]
    pub const fn query_value(self) -> Option<&'static str> {
        match self {
            Self::Webp => Some("webp"),
            Self::Avif => Some("avif"),
            Self::Jpg => Some("jpg"),
            Self::Png => Some("png"),
            Self::Auto => None,
        }
    }
}

/// Resize behavior, emitted as `fit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    /// Resize to fill the box, cropping overflow.
    Fill,
    /// Crop to the box around the gravity point.
    Crop,
    /// Stretch to the exact box.
    Scale,
    /// Fit inside the box without upscaling.
    Max,
    /// Fit inside the box.
    Clip,
}

impl CropMode {
    /// Query value for the `fit` parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Crop => "crop",
            Self::Scale => "scale",
            Self::Max => "max",
            Self::Clip => "clip",
        }
    }
}

/// Focal point used when cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    /// Image center.
    #[default]
    Center,
    /// Detected faces.
    Faces,
    /// Most detailed region.
    Entropy,
    /// Strongest edges.
    Edges,
}

impl Gravity {
    /// Query value for the `crop` parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Faces => "faces",
            Self::Entropy => "entropy",
            Self::Edges => "edges",
        }
    }
}

/// A per-call transform. Unset fields fall back to category defaults.
///
/// Values are not validated; a quality of 250 is sent to the CDN as `q=250`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Target width in pixels.
    pub width: Option<u32>,
    /// Target height in pixels.
    pub height: Option<u32>,
    /// Encoder quality.
    pub quality: Option<u32>,
    /// Output format.
    pub format: Option<ImageFormat>,
    /// Blur radius.
    pub blur: Option<u32>,
    /// Resize behavior.
    pub crop: Option<CropMode>,
    /// Crop focal point.
    pub gravity: Option<Gravity>,
}

impl TransformRequest {
    /// An empty request; every field falls back to defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the width.
    #[must_use]
    pub const fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Sets the height.
    #[must_use]
    pub const fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Sets the quality.
    #[must_use]
    pub const fn with_quality(mut self, quality: u32) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Sets the format.
    #[must_use]
    pub const fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the blur radius.
    #[must_use]
    pub const fn with_blur(mut self, blur: u32) -> Self {
        self.blur = Some(blur);
        self
    }

    /// Sets the crop mode.
    #[must_use]
    pub const fn with_crop(mut self, crop: CropMode) -> Self {
        self.crop = Some(crop);
        self
    }

    /// Sets the gravity.
    #[must_use]
    pub const fn with_gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = Some(gravity);
        self
    }

    /// Shallow merge: every field set on `self` wins over `defaults`.
    #[must_use]
    pub fn merged_over(self, defaults: Self) -> Self {
        Self {
            width: self.width.or(defaults.width),
            height: self.height.or(defaults.height),
            quality: self.quality.or(defaults.quality),
            format: self.format.or(defaults.format),
            blur: self.blur.or(defaults.blur),
            crop: self.crop.or(defaults.crop),
            gravity: self.gravity.or(defaults.gravity),
        }
    }
}

/// One quality level of the progressive sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Tiny blurred preview.
    Placeholder,
    /// 40% width, low quality.
    Low,
    /// 70% width, medium quality.
    Medium,
    /// Requested size, full quality.
    High,
}

impl Tier {
    /// Tiers loaded after the placeholder, in order.
    pub const LOADING_ORDER: [Self; 3] = [Self::Low, Self::Medium, Self::High];
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placeholder => write!(f, "placeholder"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Four URLs for staged refinement of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressiveUrlSet {
    /// Placeholder tier URL.
    pub placeholder: String,
    /// Low tier URL.
    pub low: String,
    /// Medium tier URL.
    pub medium: String,
    /// High tier URL.
    pub high: String,
}

impl ProgressiveUrlSet {
    /// A set whose every tier is the same URL.
    #[must_use]
    pub fn uniform(url: &str) -> Self {
        Self {
            placeholder: url.to_string(),
            low: url.to_string(),
            medium: url.to_string(),
            high: url.to_string(),
        }
    }

    /// URL for `tier`.
    #[must_use]
    pub fn get(&self, tier: Tier) -> &str {
        match tier {
            Tier::Placeholder => &self.placeholder,
            Tier::Low => &self.low,
            Tier::Medium => &self.medium,
            Tier::High => &self.high,
        }
    }

    /// Returns true if every tier points at the same URL.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        self.placeholder == self.low && self.low == self.medium && self.medium == self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_caller_wins() {
        let defaults = TransformRequest::new()
            .with_quality(85)
            .with_format(ImageFormat::Webp)
            .with_crop(CropMode::Fill);
        let caller = TransformRequest::new().with_width(400).with_quality(50);

        let merged = caller.merged_over(defaults);
        assert_eq!(merged.width, Some(400));
        assert_eq!(merged.quality, Some(50));
        assert_eq!(merged.format, Some(ImageFormat::Webp));
        assert_eq!(merged.crop, Some(CropMode::Fill));
        assert_eq!(merged.blur, None);
    }

    #[test]
    fn test_auto_format_has_no_query_value() {
        assert_eq!(ImageFormat::Auto.query_value(), None);
        assert_eq!(ImageFormat::Jpg.query_value(), Some("jpg"));
    }

    #[test]
    fn test_uniform_set() {
        let set = ProgressiveUrlSet::uniform("/img/x.png");
        assert!(set.is_uniform());
        assert_eq!(set.get(Tier::High), "/img/x.png");
    }
}
