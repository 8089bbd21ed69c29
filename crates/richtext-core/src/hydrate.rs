//! Logical/display buffer mapping.
//!
//! Hosts exchange the *logical* buffer: mention spans cover the bare label and emoji spans
//! cover the shortcode. The engine edits the *display* buffer: labels carry the mention
//! marker and shortcodes are rendered as their glyph. [`HydrationTransform`] converts text,
//! attributes, and selection between the two spaces.

use std::fmt;
use std::sync::Arc;

use crate::attributes::{Attribute, DisplayType};
use crate::selection::Selection;
use crate::text;

/// Converts emoji shortcodes to glyphs and back.
///
/// Both directions are fallible: an unknown shortcode or glyph returns `None` and the span is
/// left untouched in that direction.
pub trait EmojiConverter: Send + Sync {
    /// Glyph for a shortcode (`"smile"` → `"😄"`).
    fn glyph(&self, short_code: &str) -> Option<String>;
    /// Shortcode for a glyph (`"😄"` → `"smile"`).
    fn short_code(&self, glyph: &str) -> Option<String>;
}

/// No-op converter: emoji spans keep their shortcode text in both spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEmojiConversion;

impl EmojiConverter for NoEmojiConversion {
    fn glyph(&self, _short_code: &str) -> Option<String> {
        None
    }

    fn short_code(&self, _glyph: &str) -> Option<String> {
        None
    }
}

/// One span replacement applied to the buffer during hydration.
///
/// Non-overlapping and sorted by `start`; positions are mapped through the list by
/// [`map_point`].
#[derive(Debug, Clone)]
struct SpanEdit {
    start: usize,
    old_len: usize,
    new_len: usize,
    replacement: String,
}

/// Map a char offset through a sorted list of span edits.
///
/// Offsets at an edit's start stay put (an insertion lands *after* the point), offsets at or
/// past its old end shift by the length delta, and offsets inside the replaced span clamp to
/// the replacement.
fn map_point(pos: usize, edits: &[SpanEdit]) -> usize {
    let mut out = pos as i64;
    for e in edits {
        if pos <= e.start {
            break;
        }
        if pos >= e.start + e.old_len {
            out += e.new_len as i64 - e.old_len as i64;
        } else {
            let inside = pos - e.start;
            out += inside.min(e.new_len) as i64 - inside as i64;
        }
    }
    out.max(0) as usize
}

/// Apply a sorted, non-overlapping edit list to `buffer`.
fn apply_edits(buffer: &str, edits: &[SpanEdit]) -> String {
    let len = text::char_len(buffer);
    let mut out = String::with_capacity(buffer.len());
    let mut consumed = 0usize;
    for e in edits {
        out.push_str(text::slice(buffer, consumed, e.start));
        out.push_str(&e.replacement);
        consumed = e.start + e.old_len;
    }
    out.push_str(text::slice(buffer, consumed, len));
    out
}

/// Converts buffers between logical and display space.
#[derive(Clone)]
pub struct HydrationTransform {
    mention_marker: String,
    converter: Arc<dyn EmojiConverter>,
}

impl fmt::Debug for HydrationTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationTransform")
            .field("mention_marker", &self.mention_marker)
            .finish_non_exhaustive()
    }
}

impl HydrationTransform {
    /// Create a transform with the given mention marker and emoji converter.
    pub fn new(mention_marker: impl Into<String>, converter: Arc<dyn EmojiConverter>) -> Self {
        Self {
            mention_marker: mention_marker.into(),
            converter,
        }
    }

    /// Logical → display: prepend the marker to mention labels and swap emoji shortcodes for
    /// their glyph. Spans that are out of bounds or overlap an earlier token are skipped.
    pub fn hydrate(
        &self,
        buffer: &str,
        attrs: &[Attribute],
        selection: Selection,
    ) -> (String, Vec<Attribute>, Selection) {
        let edits = self.collect_edits(buffer, attrs, |ty, span, content| match ty {
            DisplayType::Mention => Some((0, self.mention_marker.clone())),
            DisplayType::Emoji => {
                let code = content.unwrap_or(span);
                self.converter.glyph(code).map(|glyph| (text::char_len(span), glyph))
            }
            _ => None,
        });
        self.apply(buffer, attrs, selection, edits)
    }

    /// Display → logical: strip the marker from mention spans and swap emoji glyphs back to
    /// their shortcode. A mention span that does not start with the marker, or a glyph the
    /// converter cannot name, is left untouched.
    pub fn dehydrate(
        &self,
        buffer: &str,
        attrs: &[Attribute],
        selection: Selection,
    ) -> (String, Vec<Attribute>, Selection) {
        let edits = self.collect_edits(buffer, attrs, |ty, span, content| match ty {
            DisplayType::Mention => span
                .starts_with(self.mention_marker.as_str())
                .then(|| (text::char_len(&self.mention_marker), String::new())),
            DisplayType::Emoji => {
                let code = match content {
                    Some(code) => code.to_owned(),
                    None => self.converter.short_code(span)?,
                };
                Some((text::char_len(span), code))
            }
            _ => None,
        });
        self.apply(buffer, attrs, selection, edits)
    }

    /// Build the edit list for the mention/emoji spans of `attrs`, in order, skipping spans
    /// that fall outside the buffer or overlap a previously edited span.
    fn collect_edits<'a, F>(
        &self,
        buffer: &'a str,
        attrs: &'a [Attribute],
        edit_for: F,
    ) -> Vec<SpanEdit>
    where
        F: Fn(DisplayType, &'a str, Option<&'a str>) -> Option<(usize, String)>,
    {
        let len = text::char_len(buffer);
        let mut ordered: Vec<&Attribute> = attrs
            .iter()
            .filter(|a| matches!(a.ty, DisplayType::Mention | DisplayType::Emoji))
            .collect();
        ordered.sort_by_key(|a| a.start);

        let mut edits: Vec<SpanEdit> = Vec::new();
        let mut consumed = 0usize;
        for attr in ordered {
            if attr.start < consumed || attr.end() > len {
                tracing::warn!(
                    start = attr.start,
                    length = attr.length,
                    ty = ?attr.ty,
                    "skipping out-of-place token span during hydration"
                );
                continue;
            }
            let span = text::slice(buffer, attr.start, attr.end());
            let Some((old_len, replacement)) = edit_for(attr.ty, span, attr.content.as_deref())
            else {
                continue;
            };
            consumed = attr.start + attr.length;
            edits.push(SpanEdit {
                start: attr.start,
                old_len,
                new_len: text::char_len(&replacement),
                replacement,
            });
        }
        edits
    }

    fn apply(
        &self,
        buffer: &str,
        attrs: &[Attribute],
        selection: Selection,
        edits: Vec<SpanEdit>,
    ) -> (String, Vec<Attribute>, Selection) {
        let out = apply_edits(buffer, &edits);
        let mapped: Vec<Attribute> = attrs
            .iter()
            .map(|a| {
                let start = map_point(a.start, &edits);
                let end = map_point(a.end(), &edits);
                Attribute {
                    start,
                    length: end.saturating_sub(start),
                    ty: a.ty,
                    content: a.content.clone(),
                }
            })
            .collect();
        let sel = Selection::new(
            map_point(selection.start, &edits),
            map_point(selection.end, &edits),
        );
        (out, mapped, sel)
    }
}
