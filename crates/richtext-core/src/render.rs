//! Render-range production.
//!
//! Flattens the attribute set into host-drawable ranges. Style types map one-to-one; mention
//! spans are classified (so a `@here`-style broadcast can draw differently from a user
//! mention); token types the host draws as plain text are filtered out.

use crate::attributes::{AttributeSet, DisplayType};
use crate::text;

/// Visual class of a mention token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionClass {
    /// A plain user mention.
    User,
    /// A channel-wide broadcast (`here`, `channel`).
    Broadcast,
    /// A report/issue reference.
    Report,
}

/// Decides the visual class of a mention from its label and payload.
pub trait MentionClassifier: Send + Sync {
    /// Classify a mention; `label` excludes the marker, `content` is the attribute payload.
    fn classify(&self, label: &str, content: Option<&str>) -> MentionClass;
}

/// Classifier that draws every mention as a user mention.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformMentions;

impl MentionClassifier for UniformMentions {
    fn classify(&self, _label: &str, _content: Option<&str>) -> MentionClass {
        MentionClass::User
    }
}

/// What the host should draw over a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Struck-through text.
    Strikethrough,
    /// Inline code.
    Code,
    /// Code block.
    Pre,
    /// A user mention token.
    MentionUser,
    /// A broadcast mention token.
    MentionBroadcast,
    /// A report-reference mention token.
    MentionReport,
}

/// One drawable range over the display buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRange {
    /// What to draw.
    pub kind: RenderKind,
    /// Start char offset.
    pub start: usize,
    /// Length in chars.
    pub length: usize,
}

/// Flatten `attrs` into drawable ranges over `buffer`.
///
/// Ranges reaching past the end of the buffer are clamped; degenerate ranges are dropped.
/// Emoji and link spans produce nothing: the host draws them as ordinary text (links get
/// their affordance from the platform, emoji are already glyphs).
pub fn render_ranges(
    buffer: &str,
    attrs: &AttributeSet,
    mention_marker: &str,
    classifier: &dyn MentionClassifier,
) -> Vec<RenderRange> {
    let len = text::char_len(buffer);
    let mut out = Vec::with_capacity(attrs.len());
    for attr in attrs {
        if attr.start >= len {
            continue;
        }
        let length = attr.length.min(len - attr.start);
        if length < 1 {
            continue;
        }
        let kind = match attr.ty {
            DisplayType::Bold => RenderKind::Bold,
            DisplayType::Italic => RenderKind::Italic,
            DisplayType::Strikethrough => RenderKind::Strikethrough,
            DisplayType::Code => RenderKind::Code,
            DisplayType::CodeBlock => RenderKind::Pre,
            DisplayType::Mention => {
                let label_start = attr.start + text::char_len(mention_marker);
                let label = text::slice(buffer, label_start, attr.start + length);
                match classifier.classify(label.trim_end(), attr.content.as_deref()) {
                    MentionClass::User => RenderKind::MentionUser,
                    MentionClass::Broadcast => RenderKind::MentionBroadcast,
                    MentionClass::Report => RenderKind::MentionReport,
                }
            }
            DisplayType::Emoji | DisplayType::HttpLink | DisplayType::PearLink => {
                tracing::trace!(ty = ?attr.ty, start = attr.start, "token drawn as plain text");
                continue;
            }
        };
        out.push(RenderRange {
            kind,
            start: attr.start,
            length,
        });
    }
    out
}
