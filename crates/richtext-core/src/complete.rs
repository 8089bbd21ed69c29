//! Autocomplete token insertion.
//!
//! Replaces a marker-prefixed fragment (`@al`, `:smi`) with a finished token: the marker, the
//! completed text, and a trailing space when the token is not already followed by whitespace.
//! The inserted token becomes one atomic attribute; surrounding attributes are rebased around
//! the net length change.

use crate::attributes::{Attribute, AttributeSet, DisplayType};
use crate::selection::Selection;
use crate::text;

/// Buffer and caret after a completion was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// The rewritten buffer.
    pub text: String,
    /// Caret placed just past the inserted token.
    pub selection: Selection,
}

/// Replace the marker-prefixed fragment before the caret with a completed token.
///
/// `marker` is the trigger string the fragment starts with; the last marker occurrence before
/// the caret anchors the token. Returns `None` (leaving all state untouched) when `ty` is not
/// a completable token type, no marker precedes the caret, or the fragment exceeds
/// `prefix_max_length`.
pub fn complete(
    buffer: &str,
    selection: Selection,
    attrs: &mut AttributeSet,
    marker: &str,
    prefix_max_length: usize,
    ty: DisplayType,
    completion: &str,
    content: Option<String>,
) -> Option<CompletionOutcome> {
    if !matches!(ty, DisplayType::Mention | DisplayType::Emoji) {
        tracing::debug!(?ty, "ignoring completion for non-token type");
        return None;
    }

    let (_, caret) = selection.normalized();
    let pos = text::rfind_before(buffer, marker, caret)?;
    if caret - pos > prefix_max_length {
        tracing::debug!(pos, caret, "fragment too long, skipping completion");
        return None;
    }

    let len = text::char_len(buffer);
    let marker_len = text::char_len(marker);
    let append_space = !matches!(text::char_at(buffer, caret), Some(c) if c.is_whitespace());
    let token_len = marker_len + text::char_len(completion) + usize::from(append_space);

    let mut out = String::with_capacity(buffer.len() + completion.len() + marker.len() + 1);
    out.push_str(text::slice(buffer, 0, pos));
    out.push_str(marker);
    out.push_str(completion);
    if append_space {
        out.push(' ');
    }
    out.push_str(text::slice(buffer, caret, len));

    // net length change of the replaced region
    let removed = caret - pos;
    let mut rebased: Vec<Attribute> = Vec::with_capacity(attrs.len() + 1);
    for mut attr in attrs.to_vec() {
        if attr.ty.is_block() && attr.contains(pos) {
            // a block absorbing the token would swallow it whole
            continue;
        }
        if attr.ty.is_exclusive() && attr.start < pos && attr.end() > pos {
            attr.length = pos - attr.start;
        } else if attr.start >= caret {
            let shifted = attr.start + token_len;
            attr.start = shifted.checked_sub(removed)?;
        } else if attr.start >= pos {
            // the fragment itself; replaced by the token attribute
            continue;
        }
        rebased.push(attr);
    }
    rebased.push(Attribute {
        ty,
        content,
        start: pos,
        length: token_len,
    });
    attrs.replace(rebased);

    Some(CompletionOutcome {
        text: out,
        selection: Selection::caret(pos + token_len),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mention_completion_appends_space() {
        let mut attrs = AttributeSet::new();
        let outcome = complete(
            "hi @al",
            Selection::caret(6),
            &mut attrs,
            "@",
            140,
            DisplayType::Mention,
            "alice",
            Some("user-1".into()),
        )
        .unwrap();

        assert_eq!(outcome.text, "hi @alice ");
        assert_eq!(outcome.selection, Selection::caret(10));
        assert_eq!(
            attrs.as_slice(),
            &[Attribute::with_content(DisplayType::Mention, 3, 7, "user-1")]
        );
    }

    #[test]
    fn test_completion_before_existing_space() {
        let mut attrs = AttributeSet::new();
        let outcome = complete(
            "hi @al there",
            Selection::caret(6),
            &mut attrs,
            "@",
            140,
            DisplayType::Mention,
            "alice",
            None,
        )
        .unwrap();

        // no second space is inserted
        assert_eq!(outcome.text, "hi @alice there");
        assert_eq!(outcome.selection, Selection::caret(9));
        assert_eq!(attrs.as_slice(), &[Attribute::new(DisplayType::Mention, 3, 6)]);
    }

    #[test]
    fn test_no_marker_is_a_no_op() {
        let mut attrs = AttributeSet::from_vec(vec![Attribute::new(DisplayType::Bold, 0, 2)]);
        let before = attrs.clone();
        assert_eq!(
            complete(
                "hello",
                Selection::caret(5),
                &mut attrs,
                "@",
                140,
                DisplayType::Mention,
                "alice",
                None,
            ),
            None
        );
        assert_eq!(attrs, before);
    }

    #[test]
    fn test_fragment_over_limit_is_rejected() {
        let mut attrs = AttributeSet::new();
        assert_eq!(
            complete(
                "@abcdef",
                Selection::caret(7),
                &mut attrs,
                "@",
                4,
                DisplayType::Mention,
                "abcdefg",
                None,
            ),
            None
        );
    }

    #[test]
    fn test_surrounding_attributes_rebase() {
        // "xx @al yy" with bold over "xx" and italic over "yy"
        let mut attrs = AttributeSet::from_vec(vec![
            Attribute::new(DisplayType::Bold, 0, 2),
            Attribute::new(DisplayType::Italic, 7, 2),
        ]);
        let outcome = complete(
            "xx @al yy",
            Selection::caret(6),
            &mut attrs,
            "@",
            140,
            DisplayType::Mention,
            "alice",
            None,
        )
        .unwrap();

        assert_eq!(outcome.text, "xx @alice yy");
        assert_eq!(
            attrs.as_slice(),
            &[
                Attribute::new(DisplayType::Bold, 0, 2),
                Attribute::new(DisplayType::Mention, 3, 6),
                Attribute::new(DisplayType::Italic, 10, 2),
            ]
        );
        assert!(attrs.check_invariants().is_ok());
    }

    #[test]
    fn test_exclusive_range_crossing_marker_is_truncated() {
        let mut attrs = AttributeSet::from_vec(vec![Attribute::new(DisplayType::Code, 0, 6)]);
        let outcome = complete(
            "xx :sm",
            Selection::caret(6),
            &mut attrs,
            ":",
            140,
            DisplayType::Emoji,
            "smile",
            None,
        )
        .unwrap();

        assert_eq!(outcome.text, "xx :smile ");
        assert_eq!(
            attrs.as_slice(),
            &[
                Attribute::new(DisplayType::Code, 0, 3),
                Attribute::new(DisplayType::Emoji, 3, 7),
            ]
        );
        assert!(attrs.check_invariants().is_ok());
    }

    #[test]
    fn test_block_covering_marker_is_dropped() {
        let mut attrs = AttributeSet::from_vec(vec![Attribute::new(DisplayType::CodeBlock, 0, 6)]);
        complete(
            "xx @al",
            Selection::caret(6),
            &mut attrs,
            "@",
            140,
            DisplayType::Mention,
            "alice",
            None,
        )
        .unwrap();

        assert_eq!(attrs.as_slice(), &[Attribute::new(DisplayType::Mention, 3, 7)]);
    }
}
