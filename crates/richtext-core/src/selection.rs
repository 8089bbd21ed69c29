//! Caret/selection model.
//!
//! A selection is a pair of char offsets into the current buffer; `start == end` is a caret.
//! The interface does not require `start <= end` (hosts report backward selections), it is
//! normalized internally.

use unicode_segmentation::UnicodeSegmentation;

use crate::attributes::AttributeSet;
use crate::text;

/// A selection over the buffer; `start == end` denotes a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Anchor offset.
    pub start: usize,
    /// Active offset.
    pub end: usize,
}

impl Selection {
    /// Create a selection.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a caret.
    pub fn caret(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// Whether the selection is zero-width.
    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    /// `(min, max)` offsets.
    pub fn normalized(&self) -> (usize, usize) {
        if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        }
    }

    /// Clamp both offsets to `[0, len(text)]` and snap them back onto grapheme-cluster
    /// boundaries, so a caret never lands inside a multi-scalar emoji glyph.
    pub fn clamped(&self, buffer: &str) -> Selection {
        let len = text::char_len(buffer);
        Selection::new(
            snap_to_grapheme(buffer, self.start.min(len)),
            snap_to_grapheme(buffer, self.end.min(len)),
        )
    }
}

/// Snap a char offset back to the nearest preceding grapheme-cluster boundary.
fn snap_to_grapheme(buffer: &str, pos: usize) -> usize {
    let target = text::byte_at(buffer, pos);
    let mut chars_before = 0usize;
    let mut last_boundary = 0usize;
    for (byte_idx, grapheme) in buffer.grapheme_indices(true) {
        if byte_idx > target {
            return last_boundary;
        }
        last_boundary = chars_before;
        if byte_idx == target {
            return last_boundary;
        }
        chars_before += grapheme.chars().count();
    }
    chars_before
}

/// Move a selection that landed strictly inside an atomic token out of it: a caret snaps to
/// the nearer token edge (ties go to the trailing edge), a range grows to cover the token.
pub fn snap_out_of_atomic(selection: Selection, attrs: &AttributeSet) -> Selection {
    let (start, end) = selection.normalized();
    let hit = attrs.iter().find(|a| {
        a.ty.is_atomic()
            && ((a.start < start && a.end() > end)
                || (a.start > start && a.start < end)
                || (a.end() > start && a.end() < end))
    });
    let Some(attr) = hit else {
        return Selection::new(start, end);
    };

    if start == end {
        let pos = if start - attr.start < attr.end() - start {
            attr.start
        } else {
            attr.end()
        };
        Selection::caret(pos)
    } else {
        Selection::new(start.min(attr.start), end.max(attr.end()))
    }
}
