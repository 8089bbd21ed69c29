//! Typing attribute resolution.
//!
//! Derives which formatting types are "active" for the current caret or selection: the set
//! the next keystroke inherits even though no attribute covers the insertion point yet.

use std::collections::BTreeSet;

use crate::attributes::{AttributeSet, DisplayType};
use crate::selection::Selection;
use crate::text;

/// The set of formats pending application at the caret.
pub type TypingAttributes = BTreeSet<DisplayType>;

/// Resolve the active formatting types for `selection`.
///
/// `text_changed` distinguishes "just edited" from "just moved the caret"; the caret rules
/// differ between the two (see below). Atomic token types and links are never typing
/// attributes: they cannot be extended by typing and are filtered from the result.
///
/// Caret rules:
/// - a block range is active while it covers the caret, except that a block ending exactly at
///   the caret is not active when the char before the caret is a newline (typing after the
///   block's closing newline starts a fresh, unformatted line);
/// - an inline range must strictly contain the caret on the left and reach at least to the
///   caret on the right; after a plain caret move it must reach strictly past the caret unless
///   the type was already pending.
pub fn resolve_typing_attributes(
    buffer: &str,
    selection: Selection,
    attrs: &AttributeSet,
    previous: &TypingAttributes,
    text_changed: bool,
) -> TypingAttributes {
    let (start, end) = selection.normalized();
    let mut types = TypingAttributes::new();

    if start == end {
        for attr in attrs {
            let attr_end = attr.end();
            if attr.ty.is_block() {
                let after_closing_newline = !text_changed
                    && end > 0
                    && text::char_at(buffer, end - 1) == Some('\n')
                    && attr.start <= start
                    && attr_end == end;
                if after_closing_newline {
                    continue;
                }
                if attr.start <= start && attr_end >= end {
                    types.insert(attr.ty);
                }
            } else if !text_changed {
                if previous.contains(&attr.ty) && attr.start < start && attr_end >= end {
                    types.insert(attr.ty);
                } else if attr.start < start && attr_end > end {
                    types.insert(attr.ty);
                }
            } else if attr.start < start && attr_end >= end {
                types.insert(attr.ty);
            }
        }
    } else {
        for attr in attrs {
            if attr.covers(start, end) {
                types.insert(attr.ty);
            }
        }
    }

    types.retain(|ty| !ty.is_atomic());
    types
}
