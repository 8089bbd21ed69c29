//! Explicit formatting commands (bold, italic, strikethrough, code, code block).

use crate::attributes::{Attribute, AttributeSet, DisplayType};
use crate::selection::Selection;
use crate::text;
use crate::typing::TypingAttributes;

/// Apply a manual format toggle at the current caret or over the current selection.
///
/// Returns `false` (and leaves all state untouched) for non-manual types.
///
/// At a caret the toggle only flips pending types; over a selection it rewrites the attribute
/// set. Exclusivity at the caret means "at most one exclusive type pending": toggling an
/// exclusive type clears every other pending type, and toggling an inline type while an
/// exclusive type is pending replaces the pending set.
pub fn format_selection(
    buffer: &str,
    selection: Selection,
    attrs: &mut AttributeSet,
    typing: &mut TypingAttributes,
    ty: DisplayType,
    content: Option<String>,
) -> bool {
    if !ty.is_manual() {
        tracing::debug!(?ty, "ignoring format toggle for non-manual type");
        return false;
    }

    let (start, end) = selection.normalized();
    if start == end {
        if ty.is_exclusive() {
            if ty.is_block() {
                expand_block_lines(buffer, selection, attrs, typing, ty, content);
            }
            let had = typing.contains(&ty);
            typing.clear();
            if !had {
                typing.insert(ty);
            }
        } else if typing.iter().any(|t| t.is_exclusive()) {
            typing.clear();
            typing.insert(ty);
        } else if !typing.remove(&ty) {
            typing.insert(ty);
        }
    } else if ty.is_block() {
        expand_block_lines(buffer, selection, attrs, typing, ty, content);
    } else {
        toggle_range(attrs, start, end, ty, content);
    }
    true
}

/// Toggle an inline type over `[start, end]`.
///
/// A same-type covering range toggles off, leaving the portions outside the selection as two
/// residual ranges. Any other covering range that conflicts on exclusivity is dropped; the
/// rest survive verbatim. With no same-type covering range, a new range over exactly
/// `[start, end)` toggles on.
fn toggle_range(
    attrs: &mut AttributeSet,
    start: usize,
    end: usize,
    ty: DisplayType,
    content: Option<String>,
) {
    let mut kept: Vec<Attribute> = Vec::new();
    let mut removed: Option<Attribute> = None;

    for attr in attrs.to_vec() {
        if attr.covers(start, end) {
            if attr.ty == ty && removed.is_none() {
                removed = Some(attr);
            } else if ty.is_exclusive() || attr.ty.is_exclusive() {
                // conflicting exclusive coverage is dropped entirely
            } else {
                kept.push(attr);
            }
        } else {
            kept.push(attr);
        }
    }

    if let Some(old) = removed {
        if start > old.start {
            kept.push(Attribute {
                ty,
                content: old.content.clone(),
                start: old.start,
                length: start - old.start,
            });
        }
        if old.end() > end {
            kept.push(Attribute {
                ty,
                length: old.end() - end,
                content: old.content,
                start: end,
            });
        }
    } else {
        kept.push(Attribute {
            ty,
            content,
            start,
            length: end - start,
        });
    }

    attrs.replace(kept);
}

/// Expand a block toggle to the full line span around the selection: from the previous
/// newline (the newline char itself, or buffer start) through the next newline inclusive
/// (or buffer end). Ranges partially overlapping either edge are trimmed, ranges spanning
/// the whole line are split around it, ranges wholly inside are removed, and (unless the
/// block type is already pending) one new range covering the line span is inserted.
fn expand_block_lines(
    buffer: &str,
    selection: Selection,
    attrs: &mut AttributeSet,
    typing: &TypingAttributes,
    ty: DisplayType,
    content: Option<String>,
) {
    let (start, end) = selection.normalized();
    let len = text::char_len(buffer);
    let line_start = text::rfind_char_before(buffer, '\n', start).unwrap_or(0);
    let line_end = match text::find_from(buffer, '\n', end) {
        Some(i) if i > 0 => i + 1,
        _ => len,
    };

    let mut kept: Vec<Attribute> = Vec::new();
    let mut to_split: Vec<Attribute> = Vec::new();
    for mut attr in attrs.to_vec() {
        let attr_end = attr.end();
        if attr.start < line_start && attr_end > line_start && attr_end <= line_end {
            attr.length = line_start - attr.start;
        } else if attr.start >= line_start && attr.start < line_end && attr_end > line_end {
            attr.length = attr_end - line_end;
            attr.start = line_end;
        } else if attr.start < line_start && attr_end > line_end {
            to_split.push(attr);
            continue;
        }
        if attr.start >= line_start && attr.end() <= line_end {
            continue;
        }
        kept.push(attr);
    }
    for attr in to_split {
        kept.push(Attribute {
            length: line_start - attr.start,
            ..attr.clone()
        });
        kept.push(Attribute {
            start: line_end,
            length: attr.end() - line_end,
            ..attr
        });
    }

    if !typing.contains(&ty) {
        kept.push(Attribute {
            ty,
            content,
            start: line_start,
            length: line_end - line_start,
        });
    }

    attrs.replace(kept);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_toggle_off_leaves_residue() {
        let mut attrs = AttributeSet::from_vec(vec![Attribute::new(DisplayType::Bold, 0, 6)]);
        let mut typing = TypingAttributes::new();

        assert!(format_selection(
            "abcdef",
            Selection::new(2, 4),
            &mut attrs,
            &mut typing,
            DisplayType::Bold,
            None,
        ));

        assert_eq!(
            attrs.as_slice(),
            &[
                Attribute::new(DisplayType::Bold, 0, 2),
                Attribute::new(DisplayType::Bold, 4, 2),
            ]
        );
    }

    #[test]
    fn test_toggle_on_over_plain_selection() {
        let mut attrs = AttributeSet::new();
        let mut typing = TypingAttributes::new();

        format_selection(
            "abcdef",
            Selection::new(1, 4),
            &mut attrs,
            &mut typing,
            DisplayType::Italic,
            None,
        );

        assert_eq!(attrs.as_slice(), &[Attribute::new(DisplayType::Italic, 1, 3)]);
    }

    #[test]
    fn test_exclusive_toggle_drops_conflicting_coverage() {
        let mut attrs = AttributeSet::from_vec(vec![
            Attribute::new(DisplayType::Bold, 0, 6),
            Attribute::new(DisplayType::Italic, 6, 2),
        ]);
        let mut typing = TypingAttributes::new();

        format_selection(
            "abcdefgh",
            Selection::new(1, 5),
            &mut attrs,
            &mut typing,
            DisplayType::Code,
            None,
        );

        // bold covered the selection and conflicts with the exclusive toggle; italic is outside
        assert_eq!(
            attrs.as_slice(),
            &[
                Attribute::new(DisplayType::Code, 1, 4),
                Attribute::new(DisplayType::Italic, 6, 2),
            ]
        );
        assert!(attrs.check_invariants().is_ok());
    }

    #[test]
    fn test_caret_toggle_flips_pending_type() {
        let mut attrs = AttributeSet::new();
        let mut typing = TypingAttributes::new();

        format_selection("", Selection::caret(0), &mut attrs, &mut typing, DisplayType::Bold, None);
        assert!(typing.contains(&DisplayType::Bold));

        format_selection("", Selection::caret(0), &mut attrs, &mut typing, DisplayType::Italic, None);
        assert_eq!(typing.len(), 2);

        format_selection("", Selection::caret(0), &mut attrs, &mut typing, DisplayType::Bold, None);
        assert!(!typing.contains(&DisplayType::Bold));
    }

    #[test]
    fn test_caret_exclusive_toggle_clears_other_pending() {
        let mut attrs = AttributeSet::new();
        let mut typing: TypingAttributes =
            [DisplayType::Bold, DisplayType::Italic].into_iter().collect();

        format_selection("", Selection::caret(0), &mut attrs, &mut typing, DisplayType::Code, None);
        assert_eq!(typing.iter().copied().collect::<Vec<_>>(), vec![DisplayType::Code]);

        // toggling it again leaves nothing pending
        format_selection("", Selection::caret(0), &mut attrs, &mut typing, DisplayType::Code, None);
        assert!(typing.is_empty());
    }

    #[test]
    fn test_inline_toggle_replaces_pending_exclusive() {
        let mut attrs = AttributeSet::new();
        let mut typing: TypingAttributes = [DisplayType::Code].into_iter().collect();

        format_selection("", Selection::caret(0), &mut attrs, &mut typing, DisplayType::Bold, None);
        assert_eq!(typing.iter().copied().collect::<Vec<_>>(), vec![DisplayType::Bold]);
    }

    #[test]
    fn test_non_manual_type_is_ignored() {
        let mut attrs = AttributeSet::new();
        let mut typing = TypingAttributes::new();
        assert!(!format_selection(
            "abc",
            Selection::new(0, 3),
            &mut attrs,
            &mut typing,
            DisplayType::Mention,
            None,
        ));
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_block_expands_to_line_span() {
        let buffer = "one\ntwo three\nfour";
        let mut attrs = AttributeSet::new();
        let mut typing = TypingAttributes::new();

        format_selection(
            buffer,
            Selection::new(5, 8),
            &mut attrs,
            &mut typing,
            DisplayType::CodeBlock,
            None,
        );

        // previous newline at 3, next newline at 13 (inclusive)
        assert_eq!(attrs.as_slice(), &[Attribute::new(DisplayType::CodeBlock, 3, 11)]);
    }

    #[test]
    fn test_block_trims_and_splits_overlapping_ranges() {
        let buffer = "one\ntwo\nfour";
        let mut attrs = AttributeSet::from_vec(vec![
            Attribute::new(DisplayType::Bold, 0, 6),
            Attribute::new(DisplayType::Italic, 0, 12),
            Attribute::new(DisplayType::Strikethrough, 4, 3),
        ]);
        let mut typing = TypingAttributes::new();

        format_selection(
            buffer,
            Selection::new(4, 7),
            &mut attrs,
            &mut typing,
            DisplayType::CodeBlock,
            None,
        );

        // line span is [3, 8): bold trimmed, italic split, strike removed
        assert_eq!(
            attrs.as_slice(),
            &[
                Attribute::new(DisplayType::Bold, 0, 3),
                Attribute::new(DisplayType::Italic, 0, 3),
                Attribute::new(DisplayType::CodeBlock, 3, 5),
                Attribute::new(DisplayType::Italic, 8, 4),
            ]
        );
        assert!(attrs.check_invariants().is_ok());
    }
}
