//! `richtext-markdown` - Regex-based markdown-style tokenizer for `richtext-core`.
//!
//! Recognizes the inline chat-markdown subset (`**bold**`, `*italic*`, `~strike~`,
//! `` `code` ``, fenced ```` ``` ```` blocks, `:shortcode:` emoji) and proposes
//! [`DerivedSpan`]s over the full marker-to-marker run. It is intended for lightweight
//! chat input, not a conforming markdown parser: no nesting inside code, no multi-line
//! inline runs.

use regex::Regex;
use richtext_core::{DerivedSpan, DisplayType, SyntaxTokenizer};

struct Rule {
    regex: Regex,
    ty: DisplayType,
    /// Match only this capture group (used where the pattern needs context chars the run
    /// itself must not include).
    capture_group: Option<usize>,
    /// Payload taken from this capture group (emoji shortcodes).
    content_group: Option<usize>,
}

impl Rule {
    fn new(pattern: &str, ty: DisplayType) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            ty,
            capture_group: None,
            content_group: None,
        })
    }

    fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = Some(group);
        self
    }

    fn with_content_group(mut self, group: usize) -> Self {
        self.content_group = Some(group);
        self
    }
}

/// Tokenizer for the inline chat-markdown subset.
pub struct MarkdownTokenizer {
    rules: Vec<Rule>,
}

impl MarkdownTokenizer {
    /// Build the standard rule set.
    pub fn new() -> Result<Self, regex::Error> {
        // Order matters: code runs claim their span first, so markers inside them are
        // not re-tokenized. The single-asterisk/tilde patterns anchor on a preceding
        // non-marker char (capture group 1 is the run) so they skip double markers.
        Ok(Self {
            rules: vec![
                Rule::new(r"(?s)```.*?```", DisplayType::CodeBlock)?,
                Rule::new(r"`[^`\n]+`", DisplayType::Code)?,
                Rule::new(r"\*\*[^*\n]+\*\*", DisplayType::Bold)?,
                Rule::new(r"(?:^|[^*])(\*[^*\n]+\*)", DisplayType::Italic)?.with_capture_group(1),
                Rule::new(r"(?:^|[^~])(~[^~\n]+~)", DisplayType::Strikethrough)?
                    .with_capture_group(1),
                Rule::new(r":([\w+-]+):", DisplayType::Emoji)?.with_content_group(1),
            ],
        })
    }
}

impl SyntaxTokenizer for MarkdownTokenizer {
    fn tokenize(&self, text: &str) -> Vec<DerivedSpan> {
        let mut spans: Vec<DerivedSpan> = Vec::new();
        for rule in &self.rules {
            for caps in rule.regex.captures_iter(text) {
                let Some(m) = caps.get(rule.capture_group.unwrap_or(0)) else {
                    continue;
                };
                let Some((start, length)) = span_from_match(text, m.start(), m.end()) else {
                    continue;
                };
                let claimed = spans.iter().any(|s| {
                    s.ty.is_exclusive() && start < s.start + s.length && s.start < start + length
                });
                if claimed {
                    continue;
                }
                let content = rule
                    .content_group
                    .and_then(|g| caps.get(g))
                    .map(|c| c.as_str().to_owned());
                tracing::trace!(ty = ?rule.ty, start, length, "syntax run");
                spans.push(DerivedSpan {
                    start,
                    length,
                    ty: rule.ty,
                    content,
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
