//! Image CDN URL encoding.

use crate::domain::entities::{Gravity, TransformRequest};

/// Default CDN origin.
pub const DEFAULT_ORIGIN: &str = "https://images.cardpress.example";

/// Fixed optimization flags appended to every transformed URL.
pub const AUTO_FLAGS: &str = "format,compress,enhance";

/// Color space pinned on every transformed URL.
pub const COLOR_SPACE: &str = "srgb";

/// Default device pixel ratio hint.
pub const DEFAULT_DPR: u32 = 2;

/// Ordered query-string builder for the image CDN.
///
/// Parameters are emitted in insertion order; absent values are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CdnQuery {
    params: Vec<(&'static str, String)>,
}

impl CdnQuery {
    /// An empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes a merged transform followed by the fixed flags.
    #[must_use]
    pub fn from_transform(transform: &TransformRequest, dpr: u32) -> Self {
        let mut query = Self::new();
        query.push_opt("w", transform.width);
        query.push_opt("h", transform.height);
        query.push_opt("q", transform.quality);
        query.push_opt("fm", transform.format.and_then(|f| f.query_value()));
        query.push_opt("fit", transform.crop.map(|c| c.as_str()));
        query.push_opt(
            "crop",
            transform
                .gravity
                .filter(|g| *g != Gravity::Center)
                .map(Gravity::as_str),
        );
        query.push_opt("blur", transform.blur);
        query.push("auto", AUTO_FLAGS);
        query.push("cs", COLOR_SPACE);
        query.push("dpr", dpr);
        query
    }

    /// Appends `key=value`.
    pub fn push(&mut self, key: &'static str, value: impl ToString) {
        self.params.push((key, value.to_string()));
    }

    /// Appends `key=value` when `value` is set.
    pub fn push_opt<T: ToString>(&mut self, key: &'static str, value: Option<T>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Returns the first value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Appends the query to `origin/source_key`.
    #[must_use]
    pub fn to_url(&self, origin: &str, source_key: &str) -> String {
        let base = format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            source_key.trim_start_matches('/')
        );
        if self.params.is_empty() {
            return base;
        }
        format!("{base}?{self}")
    }
}

impl std::fmt::Display for CdnQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, (key, value)) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str("&")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Reads a single query parameter from a URL.
#[must_use]
pub fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}
