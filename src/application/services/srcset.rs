//! Responsive descriptor sets.

use super::url_builder::UrlBuilder;
use crate::domain::entities::TransformRequest;

/// Candidate widths for responsive images.
pub const BREAKPOINTS: [u32; 7] = [320, 480, 768, 1024, 1280, 1600, 1920];

const DEFAULT_SIZES: &str = "(max-width: 480px) 100vw, (max-width: 1024px) 80vw, 1200px";

/// Quality used for a breakpoint width.
#[must_use]
pub const fn quality_for_width(width: u32) -> u32 {
    match width {
        0..=480 => 60,
        481..=768 => 70,
        769..=1024 => 75,
        _ => 80,
    }
}

/// `sizes` attribute paired with [`descriptor_set`].
#[must_use]
pub const fn sizes_hint() -> &'static str {
    DEFAULT_SIZES
}

/// Builds `"<url> <width>w"` candidates across [`BREAKPOINTS`].
///
/// Width and quality come from the breakpoint; other fields of `base` apply.
/// Unknown ids yield the bare reference.
#[must_use]
pub fn descriptor_set(builder: &UrlBuilder, id: &str, base: &TransformRequest) -> String {
    descriptor_set_with(builder, id, base, |quality| quality)
}

/// Like [`descriptor_set`], passing each breakpoint quality through `adjust`.
pub fn descriptor_set_with(
    builder: &UrlBuilder,
    id: &str,
    base: &TransformRequest,
    adjust: impl Fn(u32) -> u32,
) -> String {
    if !builder.catalog().contains(id) {
        return id.to_string();
    }

    BREAKPOINTS
        .iter()
        .map(|&width| {
            let transform = TransformRequest {
                width: Some(width),
                quality: Some(adjust(quality_for_width(width))),
                ..*base
            };
            format!("{} {width}w", builder.resolve(id, &transform))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
