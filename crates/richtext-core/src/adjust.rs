//! Range adjustment: rewrites the attribute set when the buffer is edited.
//!
//! One edit is modeled as the deletion of the old selection followed by an insertion at its
//! start; the pass runs exactly once per edit and must complete before the next edit is
//! accepted. The rules, in order:
//!
//! 1. a range covering the edit point whose type is pending absorbs the edit delta (inline
//!    code stops absorbing at the first inserted newline);
//! 2. a range ending exactly at the edit point contracts on a pure deletion;
//! 3. ranges at or after the edit point shift by the delta; atomic tokens are special, a
//!    deletion eating into the token removes the whole token and re-derives the text;
//! 4. degenerate ranges are dropped, adjacent same-type ranges coalesce;
//! 5. a pure insertion with pending types appends one new range per pending type.

use crate::attributes::{Attribute, AttributeSet, DisplayType};
use crate::selection::Selection;
use crate::text;
use crate::typing::TypingAttributes;

/// Result of one edit's adjustment pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustOutcome {
    /// The authoritative post-edit text. Usually the incoming text; differs when a deletion
    /// into an atomic token was expanded to remove the whole token.
    pub text: String,
    /// Post-edit selection (moved only when the text was rewritten).
    pub selection: Selection,
    /// Types whose pending state was absorbed into an existing range this edit.
    pub absorbed: Vec<DisplayType>,
    /// Whether the incoming text was rewritten.
    pub text_rewritten: bool,
}

/// Rewrite `attrs` for the edit that turned `old_text` into `new_text`, with `selection`
/// being the selection at the time the edit was made (old-buffer offsets).
///
/// `typing` is read, not written: a type absorbed here stays pending, so the range keeps
/// growing keystroke by keystroke until the caret leaves its trailing edge.
pub fn adjust_for_edit(
    old_text: &str,
    new_text: &str,
    selection: Selection,
    attrs: &mut AttributeSet,
    typing: &TypingAttributes,
) -> AdjustOutcome {
    let old_len = text::char_len(old_text);
    let new_len = text::char_len(new_text);
    let delta = new_len as isize - old_len as isize;
    let (sel_start, sel_end) = selection.normalized();

    // Deleting into an atomic token deletes the entire token in one step.
    if delta < 0 && sel_start == sel_end {
        let deleted = (-delta) as usize;
        let del_start = sel_start.saturating_sub(deleted);
        if let Some(outcome) = remove_atomic_token(old_text, del_start, sel_start, attrs) {
            return outcome;
        }
    }

    let inserted = if delta > 0 {
        text::slice(new_text, sel_end, sel_end + delta as usize).to_string()
    } else {
        String::new()
    };

    let mut pending = typing.clone();
    let mut absorbed = Vec::new();
    let mut result: Vec<Attribute> = Vec::with_capacity(attrs.len());
    for mut attr in attrs.to_vec() {
        let attr_end = attr.end();
        if pending.contains(&attr.ty) && attr.start <= sel_start && attr_end >= sel_end {
            pending.remove(&attr.ty);
            absorbed.push(attr.ty);
            if attr.ty == DisplayType::Code && delta > 0 {
                if !inserted.starts_with('\n') {
                    attr.length += inserted
                        .find('\n')
                        .map(|b| inserted[..b].chars().count())
                        .unwrap_or_else(|| text::char_len(&inserted));
                }
            } else {
                let length = attr.length as isize + delta;
                if length <= 0 {
                    continue;
                }
                attr.length = length as usize;
            }
        } else if attr_end == sel_start && delta < 0 {
            let length = attr.length as isize + delta;
            if length <= 0 {
                continue;
            }
            attr.length = length as usize;
        } else if attr.start >= sel_start {
            let start = attr.start as isize + delta;
            if start < 0 {
                continue;
            }
            attr.start = start as usize;
        }

        if attr.end() > new_len {
            if attr.start >= new_len {
                continue;
            }
            attr.length = new_len - attr.start;
        }
        if attr.length == 0 {
            continue;
        }
        result.push(attr);
    }
    attrs.replace(result);

    // A pure insertion materializes every still-pending type at the caret.
    if delta > 0 && !pending.is_empty() {
        for ty in pending.iter().copied() {
            let length = if ty == DisplayType::Code {
                match inserted.find('\n') {
                    Some(0) => 0,
                    Some(b) => inserted[..b].chars().count(),
                    None => delta as usize,
                }
            } else {
                delta as usize
            };
            if length == 0 {
                continue;
            }
            attrs.insert(Attribute::new(ty, sel_start, length));
        }
        attrs.normalize();
    }

    AdjustOutcome {
        text: new_text.to_string(),
        selection: Selection::new(sel_start.min(new_len), sel_end.min(new_len)),
        absorbed,
        text_rewritten: false,
    }
}

/// If the pure deletion `[del_start, del_end)` eats into an atomic token, remove the token's
/// whole span (unioned with the deleted range) from `old_text` and rebase the survivors.
fn remove_atomic_token(
    old_text: &str,
    del_start: usize,
    del_end: usize,
    attrs: &mut AttributeSet,
) -> Option<AdjustOutcome> {
    let token = attrs
        .iter()
        .find(|a| a.ty.is_atomic() && a.start < del_end && a.end() > del_start)?
        .clone();

    let rm_start = token.start.min(del_start);
    let rm_end = token.end().max(del_end);
    let rm_len = rm_end - rm_start;

    let mut buffer = String::with_capacity(old_text.len());
    buffer.push_str(text::slice(old_text, 0, rm_start));
    buffer.push_str(text::slice(old_text, rm_end, text::char_len(old_text)));

    let mut result: Vec<Attribute> = Vec::with_capacity(attrs.len().saturating_sub(1));
    for attr in attrs.iter() {
        if *attr == token {
            continue;
        }
        let mut attr = attr.clone();
        let attr_end = attr.end();
        if attr_end <= rm_start {
            // before the removed span
        } else if attr.start >= rm_end {
            attr.start -= rm_len;
        } else if attr.start >= rm_start && attr_end <= rm_end {
            continue;
        } else if attr.start < rm_start && attr_end > rm_end {
            attr.length -= rm_len;
        } else if attr.start < rm_start {
            attr.length = rm_start - attr.start;
        } else {
            attr.length = attr_end - rm_end;
            attr.start = rm_start;
        }
        if attr.length > 0 {
            result.push(attr);
        }
    }
    attrs.replace(result);

    Some(AdjustOutcome {
        text: buffer,
        selection: Selection::caret(rm_start),
        absorbed: Vec::new(),
        text_rewritten: true,
    })
}
