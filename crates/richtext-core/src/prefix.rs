//! Prefix detection for autocomplete.
//!
//! Watches the text behind the caret for an open mention (`@…`) or emoji (`:…`) fragment and
//! reports it so the host can drive a suggestion popup. Detection is passive: it never touches
//! the buffer or the attribute set.

use crate::attributes::{AttributeSet, DisplayType};
use crate::selection::Selection;
use crate::text;

/// Default cap on fragment length; anything longer stops being a completion candidate.
pub const DEFAULT_PREFIX_MAX_LENGTH: usize = 140;

/// Marker strings that open a completion fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixTrigger {
    /// Marker opening a mention fragment.
    pub mention: String,
    /// Marker opening an emoji fragment.
    pub emoji: String,
}

impl Default for PrefixTrigger {
    fn default() -> Self {
        Self {
            mention: "@".into(),
            emoji: ":".into(),
        }
    }
}

impl PrefixTrigger {
    /// The marker string for a token type, if that type is completable.
    pub fn marker_for(&self, ty: DisplayType) -> Option<&str> {
        match ty {
            DisplayType::Mention => Some(&self.mention),
            DisplayType::Emoji => Some(&self.emoji),
            _ => None,
        }
    }
}

/// An open completion fragment behind the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixHit {
    /// Token type the fragment would complete into.
    pub ty: DisplayType,
    /// Fragment text between the marker and the caret.
    pub prefix: String,
}

/// Look for an open completion fragment ending at the caret.
///
/// The nearest marker before the caret wins; an emoji marker only counts as open while the
/// caret sits closer to it than to the next space (otherwise a lone `:` earlier in a sentence
/// would keep a suggestion popup alive forever). A fragment inside an exclusive range, one
/// already claimed by a token of the same type, or one at or past the length cap yields no hit.
pub fn detect_prefix(
    buffer: &str,
    selection: Selection,
    attrs: &AttributeSet,
    trigger: &PrefixTrigger,
    prefix_max_length: usize,
) -> Option<PrefixHit> {
    if !selection.is_caret() {
        return None;
    }
    let caret = selection.end;
    if !buffer.contains(trigger.mention.as_str()) && !buffer.contains(trigger.emoji.as_str()) {
        return None;
    }

    let mention_pos = text::rfind_before(buffer, &trigger.mention, caret);
    let emoji_pos = text::rfind_before(buffer, &trigger.emoji, caret);
    let space_pos = text::find_from(buffer, ' ', caret);
    let emoji_open =
        emoji_pos.is_some_and(|p| space_pos.is_none_or(|sp| caret - p < sp - caret));

    let (ty, pos, marker) = if emoji_open && emoji_pos > mention_pos {
        (DisplayType::Emoji, emoji_pos?, trigger.emoji.as_str())
    } else if mention_pos.is_some() && mention_pos > emoji_pos {
        (DisplayType::Mention, mention_pos?, trigger.mention.as_str())
    } else {
        return None;
    };

    if attrs
        .iter()
        .any(|a| a.ty.is_exclusive() && a.start <= pos && a.end() >= caret)
    {
        return None;
    }
    if attrs.iter().any(|a| a.ty == ty && a.start == pos) {
        // the fragment is already a completed token
        return None;
    }

    let prefix = text::slice(buffer, pos + text::char_len(marker), caret);
    if text::char_len(prefix) >= prefix_max_length {
        return None;
    }

    Some(PrefixHit {
        ty,
        prefix: prefix.to_owned(),
    })
}
