//! Character-offset helpers.
//!
//! Every offset the engine exposes is a count of Unicode scalar values (`char`s). These helpers
//! convert between char offsets and byte offsets without panicking: out-of-range offsets clamp
//! to the end of the string.

/// Length of `s` in chars.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `idx`-th char, clamped to `s.len()`.
pub(crate) fn byte_at(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map(|(b, _)| b).unwrap_or(s.len())
}

/// Slice by char offsets, clamped.
pub(crate) fn slice(s: &str, start: usize, end: usize) -> &str {
    if end <= start {
        return "";
    }
    &s[byte_at(s, start)..byte_at(s, end)]
}

/// Char at char offset `idx`, if in range.
pub(crate) fn char_at(s: &str, idx: usize) -> Option<char> {
    s.chars().nth(idx)
}

/// Char offset of the last occurrence of `needle` fully inside the first `before` chars.
pub(crate) fn rfind_before(s: &str, needle: &str, before: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let window = slice(s, 0, before);
    window.rfind(needle).map(|b| window[..b].chars().count())
}

/// Char offset of the last `c` strictly before char offset `before`.
pub(crate) fn rfind_char_before(s: &str, c: char, before: usize) -> Option<usize> {
    let window = slice(s, 0, before);
    window.rfind(c).map(|b| window[..b].chars().count())
}

/// Char offset of the first `c` at or after char offset `from`.
pub(crate) fn find_from(s: &str, c: char, from: usize) -> Option<usize> {
    let base = byte_at(s, from);
    s[base..]
        .find(c)
        .map(|rel| from + s[base..base + rel].chars().count())
}
