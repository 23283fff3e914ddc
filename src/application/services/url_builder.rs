//! Catalog-aware CDN URL builder.

use tracing::trace;

use crate::domain::entities::{
    AssetCatalog, ImageFormat, ProgressiveUrlSet, Tier, TransformRequest,
};
use crate::infrastructure::cdn::CdnQuery;
use crate::infrastructure::config::CdnConfig;

/// Width assumed for progressive tiers when the caller gives none.
pub const DEFAULT_PROGRESSIVE_WIDTH: u32 = 800;

const PLACEHOLDER_SIZE: u32 = 50;
const PLACEHOLDER_QUALITY: u32 = 10;
const PLACEHOLDER_BLUR: u32 = 20;

/// Builds delivery URLs for catalog assets.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    catalog: AssetCatalog,
    origin: String,
    dpr: u32,
}

impl UrlBuilder {
    /// Creates a builder over `catalog` using the origin and dpr from `cdn`.
    #[must_use]
    pub fn new(catalog: AssetCatalog, cdn: &CdnConfig) -> Self {
        Self {
            catalog,
            origin: cdn.origin.clone(),
            dpr: cdn.dpr,
        }
    }

    /// The catalog ids are resolved against.
    #[must_use]
    pub const fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    /// CDN origin without a trailing slash.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Resolves `id` to a transformed CDN URL.
    ///
    /// Unknown ids are returned unchanged so callers can pass arbitrary
    /// references through. Transform values are not validated.
    #[must_use]
    pub fn resolve(&self, id: &str, transform: &TransformRequest) -> String {
        let Some(descriptor) = self.catalog.get(id) else {
            trace!(id = %id, "Unknown asset, passing reference through");
            return id.to_string();
        };

        let merged = transform.merged_over(descriptor.category.defaults());
        CdnQuery::from_transform(&merged, self.dpr).to_url(&self.origin, descriptor.source_key)
    }

    /// Derives the four progressive tiers for `id`.
    #[must_use]
    pub fn progressive_set(&self, id: &str, base: &TransformRequest) -> ProgressiveUrlSet {
        if !self.catalog.contains(id) {
            return ProgressiveUrlSet::uniform(id);
        }

        ProgressiveUrlSet {
            placeholder: self.resolve(id, &tier_transform(Tier::Placeholder, base)),
            low: self.resolve(id, &tier_transform(Tier::Low, base)),
            medium: self.resolve(id, &tier_transform(Tier::Medium, base)),
            high: self.resolve(id, &tier_transform(Tier::High, base)),
        }
    }
}

/// The fixed recipe for one tier, applied over the caller's transform.
///
/// Low and medium scale the requested width (and height, when given) to 40%
/// and 70%. High keeps the caller's dimensions.
#[must_use]
pub fn tier_transform(tier: Tier, base: &TransformRequest) -> TransformRequest {
    let width = base.width.unwrap_or(DEFAULT_PROGRESSIVE_WIDTH);
    let recipe = match tier {
        Tier::Placeholder => TransformRequest::new()
            .with_width(PLACEHOLDER_SIZE)
            .with_height(PLACEHOLDER_SIZE)
            .with_quality(PLACEHOLDER_QUALITY)
            .with_blur(PLACEHOLDER_BLUR)
            .with_format(ImageFormat::Jpg),
        Tier::Low => scaled(base, width, 0.4)
            .with_quality(40)
            .with_format(ImageFormat::Webp),
        Tier::Medium => scaled(base, width, 0.7)
            .with_quality(65)
            .with_format(ImageFormat::Webp),
        Tier::High => TransformRequest::new()
            .with_quality(85)
            .with_format(ImageFormat::Webp),
    };
    recipe.merged_over(*base)
}

fn scaled(base: &TransformRequest, width: u32, factor: f64) -> TransformRequest {
    let mut transform = TransformRequest::new().with_width(scale(width, factor));
    transform.height = base.height.map(|h| scale(h, factor));
    transform
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(value: u32, factor: f64) -> u32 {
    (f64::from(value) * factor).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cdn::query_param;
    use test_case::test_case;

    fn builder() -> UrlBuilder {
        UrlBuilder::new(AssetCatalog::builtin(), &CdnConfig::default())
    }

    #[test]
    fn test_resolve_design_scenario() {
        let url = builder().resolve("design.jpg", &TransformRequest::new().with_width(400));

        assert_eq!(query_param(&url, "w"), Some("400"));
        assert_eq!(query_param(&url, "q"), Some("85"));
        assert_eq!(query_param(&url, "fm"), Some("webp"));
        assert_eq!(query_param(&url, "fit"), Some("fill"));
        assert_eq!(query_param(&url, "auto"), Some("format,compress,enhance"));
        assert_eq!(query_param(&url, "cs"), Some("srgb"));
        assert_eq!(query_param(&url, "dpr"), Some("2"));
        assert!(url.starts_with("https://images.cardpress.example/site/design-studio.jpg?"));
    }

    #[test]
    fn test_caller_overrides_category_default() {
        let url = builder().resolve(
            "design.jpg",
            &TransformRequest::new()
                .with_quality(50)
                .with_format(ImageFormat::Avif),
        );
        assert_eq!(query_param(&url, "q"), Some("50"));
        assert_eq!(query_param(&url, "fm"), Some("avif"));
        assert_eq!(query_param(&url, "fit"), Some("fill"));
    }

    #[test]
    fn test_team_category_crops_on_faces() {
        let url = builder().resolve("about.jpg", &TransformRequest::new());
        assert_eq!(query_param(&url, "fit"), Some("crop"));
        assert_eq!(query_param(&url, "crop"), Some("faces"));
        assert_eq!(query_param(&url, "w"), None);
    }

    #[test]
    fn test_malformed_values_pass_through() {
        let url = builder().resolve(
            "design.jpg",
            &TransformRequest::new().with_quality(400).with_width(0),
        );
        assert_eq!(query_param(&url, "q"), Some("400"));
        assert_eq!(query_param(&url, "w"), Some("0"));
    }

    #[test_case("unknown.jpg" ; "unknown filename")]
    #[test_case("https://example.com/photo.png" ; "absolute url")]
    #[test_case("" ; "empty reference")]
    fn test_unknown_ids_pass_through(reference: &str) {
        let b = builder();
        let transform = TransformRequest::new().with_width(640).with_quality(70);

        assert_eq!(b.resolve(reference, &transform), reference);
        let set = b.progressive_set(reference, &transform);
        assert_eq!(set, ProgressiveUrlSet::uniform(reference));
    }

    #[test]
    fn test_progressive_about_scenario() {
        let set = builder().progressive_set("about.jpg", &TransformRequest::new().with_width(800));

        assert_eq!(query_param(&set.low, "w"), Some("320"));
        assert_eq!(query_param(&set.medium, "w"), Some("560"));
        assert_eq!(query_param(&set.high, "w"), Some("800"));
        assert!(!set.is_uniform());
    }

    #[test]
    fn test_progressive_default_width() {
        let set = builder().progressive_set("design.jpg", &TransformRequest::new());
        assert_eq!(query_param(&set.low, "w"), Some("320"));
        assert_eq!(query_param(&set.medium, "w"), Some("560"));
        assert_eq!(query_param(&set.high, "w"), None);
    }

    #[test_case(TransformRequest::new() ; "empty transform")]
    #[test_case(TransformRequest::new().with_width(1200).with_quality(99).with_format(ImageFormat::Png) ; "explicit transform")]
    #[test_case(TransformRequest::new().with_blur(3).with_height(900) ; "blur and height")]
    fn test_fixed_tiers_ignore_input(input: TransformRequest) {
        for id in ["design.jpg", "logo.png", "about.jpg"] {
            let set = builder().progressive_set(id, &input);

            assert_eq!(query_param(&set.high, "q"), Some("85"));
            assert_eq!(query_param(&set.high, "fm"), Some("webp"));

            assert_eq!(query_param(&set.placeholder, "w"), Some("50"));
            assert_eq!(query_param(&set.placeholder, "h"), Some("50"));
            assert_eq!(query_param(&set.placeholder, "q"), Some("10"));
            assert_eq!(query_param(&set.placeholder, "blur"), Some("20"));
            assert_eq!(query_param(&set.placeholder, "fm"), Some("jpg"));
        }
    }

    #[test]
    fn test_height_scales_with_width() {
        let base = TransformRequest::new().with_width(1000).with_height(500);
        let low = tier_transform(Tier::Low, &base);
        assert_eq!(low.width, Some(400));
        assert_eq!(low.height, Some(200));
    }
}
