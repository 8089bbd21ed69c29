//! Derived-attribute providers.
//!
//! Syntax highlighting and link detection run outside the engine (often off-thread, or in a
//! separate crate with its own dependencies). Providers hand back [`DerivedSpan`]s over a text
//! snapshot; the engine merges them through its own guards, so a provider never has to reason
//! about exclusivity or atomic tokens.

use crate::attributes::DisplayType;

/// A formatting span proposed by a provider, in char offsets over the snapshot it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedSpan {
    /// Start char offset.
    pub start: usize,
    /// Span length in chars.
    pub length: usize,
    /// Proposed range type.
    pub ty: DisplayType,
    /// Optional payload (e.g. the matched URL).
    pub content: Option<String>,
}

/// Produces formatting spans from markup syntax found in the text.
pub trait SyntaxTokenizer: Send + Sync {
    /// Scan `text` and propose spans.
    fn tokenize(&self, text: &str) -> Vec<DerivedSpan>;
}

/// Detects link spans in the text.
pub trait LinkScanner: Send + Sync {
    /// Scan `text` and propose link spans.
    fn scan(&self, text: &str) -> Vec<DerivedSpan>;
}
