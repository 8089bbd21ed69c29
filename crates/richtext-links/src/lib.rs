//! `richtext-links` - Regex-based link detection for `richtext-core`.
//!
//! Scans text snapshots for URLs and proposes [`DerivedSpan`]s the engine can merge as
//! [`DisplayType::HttpLink`] / [`DisplayType::PearLink`] ranges. This crate is intended for
//! plain chat-style input where a scheme prefix is signal enough; it is *not* a full URL
//! parser.

use regex::Regex;
use richtext_core::{DerivedSpan, DisplayType, LinkScanner};

/// One recognized URL scheme.
#[derive(Debug, Clone)]
pub struct Protocol {
    scheme: String,
    slashes_optional: bool,
    ty: DisplayType,
}

impl Protocol {
    /// Describe a scheme; `ty` must be a link type.
    ///
    /// With `slashes_optional` the `//` authority prefix may be omitted (`pear:abc…` and
    /// `pear://abc…` both match).
    pub fn new(scheme: &str, slashes_optional: bool, ty: DisplayType) -> Option<Self> {
        if !ty.is_link() {
            return None;
        }
        Some(Self {
            scheme: scheme.to_owned(),
            slashes_optional,
            ty,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    fn pattern(&self) -> String {
        let slashes = if self.slashes_optional {
            "(?://)?"
        } else {
            "//"
        };
        format!(r"\b{}:{}[^\s<>]+", regex::escape(&self.scheme), slashes)
    }
}

/// A regex-based [`LinkScanner`].
#[derive(Debug, Clone)]
pub struct RegexLinkScanner {
    rules: Vec<(Regex, DisplayType)>,
}

impl RegexLinkScanner {
    /// Build a scanner from a protocol list.
    pub fn new(protocols: Vec<Protocol>) -> Result<Self, regex::Error> {
        let mut rules = Vec::with_capacity(protocols.len());
        for protocol in protocols {
            rules.push((Regex::new(&protocol.pattern())?, protocol.ty));
        }
        Ok(Self { rules })
    }

    /// The standard scheme set: `http`/`https` and `pear`.
    pub fn standard() -> Result<Self, regex::Error> {
        let protocols = [
            Protocol::new("https", false, DisplayType::HttpLink),
            Protocol::new("http", false, DisplayType::HttpLink),
            Protocol::new("pear", true, DisplayType::PearLink),
        ];
        Self::new(protocols.into_iter().flatten().collect())
    }
}

impl LinkScanner for RegexLinkScanner {
    fn scan(&self, text: &str) -> Vec<DerivedSpan> {
        let mut spans = Vec::new();
        for (regex, ty) in &self.rules {
            for m in regex.find_iter(text) {
                let Some((start, length)) = span_from_match(text, m.start(), m.end()) else {
                    continue;
                };
                // an earlier rule already claimed this span (http is a prefix of https)
                if spans
                    .iter()
                    .any(|s: &DerivedSpan| start < s.start + s.length && s.start < start + length)
                {
                    continue;
                }
                tracing::trace!(url = m.as_str(), start, "link detected");
                spans.push(DerivedSpan {
                    start,
                    length,
                    ty: *ty,
                    content: Some(m.as_str().to_owned()),
                });
            }
        }
        spans.sort_by_key(|s| s.start);
        spans
    }
}

/// Convert a byte-offset regex match into a char-offset span.
fn span_from_match(text: &str, start_byte: usize, end_byte: usize) -> Option<(usize, usize)> {
    if start_byte >= end_byte || end_byte > text.len() {
        return None;
    }
    let start = text[..start_byte].chars().count();
    let end = text[..end_byte].chars().count();
    (start < end).then_some((start, end - start))
}
