//! Typed formatting ranges and the ordered collection that holds them.
//!
//! An [`Attribute`] is a typed, positioned span over the display buffer. The [`AttributeSet`]
//! keeps the spans ordered by start offset and is the engine's core invariant holder:
//! exclusive types never overlap each other and no span has zero length.

/// Formatting range type tag.
///
/// The numeric values are stable: they are shared with the host exchange format
/// (`richtext-wire`) and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DisplayType {
    /// An inserted mention token (marker + label).
    Mention = 1,
    /// An `http://` / `https://` link.
    HttpLink = 2,
    /// A `pear://` custom-scheme link.
    PearLink = 3,
    /// Bold.
    Bold = 4,
    /// Italic.
    Italic = 5,
    /// Inline code span.
    Code = 6,
    /// An inserted emoji token.
    Emoji = 7,
    /// A code block covering whole lines.
    CodeBlock = 8,
    /// Strikethrough.
    Strikethrough = 9,
}

impl DisplayType {
    /// All display types, in tag order.
    pub const ALL: [DisplayType; 9] = [
        DisplayType::Mention,
        DisplayType::HttpLink,
        DisplayType::PearLink,
        DisplayType::Bold,
        DisplayType::Italic,
        DisplayType::Code,
        DisplayType::Emoji,
        DisplayType::CodeBlock,
        DisplayType::Strikethrough,
    ];

    /// Block types cover whole lines (expanded by the formatter).
    pub fn is_block(self) -> bool {
        matches!(self, DisplayType::CodeBlock)
    }

    /// Exclusive types never overlap another exclusive type.
    pub fn is_exclusive(self) -> bool {
        matches!(
            self,
            DisplayType::Mention
                | DisplayType::HttpLink
                | DisplayType::PearLink
                | DisplayType::Code
                | DisplayType::CodeBlock
        )
    }

    /// Link types.
    pub fn is_link(self) -> bool {
        matches!(self, DisplayType::HttpLink | DisplayType::PearLink)
    }

    /// Atomic ("never typed") types are entered, exited, and deleted as a whole token.
    pub fn is_atomic(self) -> bool {
        matches!(
            self,
            DisplayType::Mention | DisplayType::Emoji | DisplayType::HttpLink | DisplayType::PearLink
        )
    }

    /// Types reachable through `format_selection`.
    pub fn is_manual(self) -> bool {
        matches!(
            self,
            DisplayType::Bold
                | DisplayType::Italic
                | DisplayType::Strikethrough
                | DisplayType::Code
                | DisplayType::CodeBlock
        )
    }

    /// Stable numeric tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Decode a numeric tag; `None` for unknown tags.
    pub fn from_tag(tag: u8) -> Option<Self> {
        DisplayType::ALL.into_iter().find(|ty| ty.tag() == tag)
    }
}

/// A typed, positioned formatting span over the display buffer.
///
/// Offsets and lengths are char counts. `content` carries the payload for token types
/// (mention id, emoji shortcode, link URL) and is `None` for pure style types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Start char offset.
    pub start: usize,
    /// Span length in chars (always positive in a normalized set).
    pub length: usize,
    /// Range type.
    pub ty: DisplayType,
    /// Optional payload.
    pub content: Option<String>,
}

impl Attribute {
    /// Create a payload-free attribute.
    pub fn new(ty: DisplayType, start: usize, length: usize) -> Self {
        Self {
            start,
            length,
            ty,
            content: None,
        }
    }

    /// Create an attribute carrying a payload.
    pub fn with_content(
        ty: DisplayType,
        start: usize,
        length: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            start,
            length,
            ty,
            content: Some(content.into()),
        }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Whether the span fully covers `[start, end]`.
    pub fn covers(&self, start: usize, end: usize) -> bool {
        self.start <= start && self.end() >= end
    }

    /// Whether the span contains `pos` (half-open).
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end()
    }

    /// Whether the span overlaps `[start, end)`.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end()
    }
}

/// Ordered collection of formatting ranges.
///
/// Kept sorted by start offset. [`AttributeSet::normalize`] restores the ordering, drops
/// degenerate spans, and coalesces touching same-type/same-content spans (atomic token types
/// are never merged: two adjacent mentions stay two mentions).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    attrs: Vec<Attribute>,
}

impl AttributeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self { attrs: Vec::new() }
    }

    /// Build a normalized set from arbitrary input.
    pub fn from_vec(attrs: Vec<Attribute>) -> Self {
        let mut set = Self { attrs };
        set.normalize();
        set
    }

    /// The ordered spans.
    pub fn as_slice(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Iterate the spans in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attrs.iter()
    }

    /// Clone the spans out.
    pub fn to_vec(&self) -> Vec<Attribute> {
        self.attrs.clone()
    }

    /// Number of spans.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Remove all spans.
    pub fn clear(&mut self) {
        self.attrs.clear();
    }

    /// Insert one span, keeping the start ordering.
    pub fn insert(&mut self, attr: Attribute) {
        let pos = self
            .attrs
            .binary_search_by_key(&attr.start, |a| a.start)
            .unwrap_or_else(|pos| pos);
        self.attrs.insert(pos, attr);
    }

    /// Replace the whole set and normalize.
    pub fn replace(&mut self, attrs: Vec<Attribute>) {
        self.attrs = attrs;
        self.normalize();
    }

    /// Sort by start, drop zero-length spans, and merge touching same-type/same-content spans.
    ///
    /// Atomic token types never merge. Merging same-type spans cannot introduce an
    /// exclusive-type overlap, so the pass preserves the exclusivity invariant.
    pub fn normalize(&mut self) {
        self.attrs.retain(|a| a.length > 0);
        self.attrs
            .sort_by(|a, b| a.start.cmp(&b.start).then(a.ty.tag().cmp(&b.ty.tag())));

        let mut merged: Vec<Attribute> = Vec::with_capacity(self.attrs.len());
        for attr in self.attrs.drain(..) {
            if !attr.ty.is_atomic() {
                if let Some(prev) = merged
                    .iter_mut()
                    .find(|p| p.ty == attr.ty && p.content == attr.content && p.end() >= attr.start)
                {
                    prev.length = prev.end().max(attr.end()) - prev.start;
                    continue;
                }
            }
            merged.push(attr);
        }
        self.attrs = merged;
    }

    /// Spans fully covering `[start, end]`.
    pub fn covering(&self, start: usize, end: usize) -> impl Iterator<Item = &Attribute> {
        self.attrs.iter().filter(move |a| a.covers(start, end))
    }

    /// Spans containing `pos`.
    pub fn covering_point(&self, pos: usize) -> impl Iterator<Item = &Attribute> {
        self.attrs.iter().filter(move |a| a.contains(pos))
    }

    /// Spans overlapping `[start, end)`.
    pub fn overlapping(&self, start: usize, end: usize) -> impl Iterator<Item = &Attribute> {
        self.attrs.iter().filter(move |a| a.overlaps(start, end))
    }

    /// Invariant check used by tests (not enforced in the hot path): spans are ordered and
    /// positive-length, and no two exclusive-type spans overlap.
    pub fn check_invariants(&self) -> Result<(), String> {
        for pair in self.attrs.windows(2) {
            if pair[0].start > pair[1].start {
                return Err(format!(
                    "spans out of order: {} after {}",
                    pair[1].start, pair[0].start
                ));
            }
        }
        for (i, a) in self.attrs.iter().enumerate() {
            if a.length == 0 {
                return Err(format!("zero-length span at offset {}", a.start));
            }
            for b in &self.attrs[i + 1..] {
                if a.ty.is_exclusive() && b.ty.is_exclusive() && a.overlaps(b.start, b.end()) {
                    return Err(format!(
                        "exclusive overlap: {:?} at {} and {:?} at {}",
                        a.ty, a.start, b.ty, b.start
                    ));
                }
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for ty in DisplayType::ALL {
            assert_eq!(DisplayType::from_tag(ty.tag()), Some(ty));
        }
        assert_eq!(DisplayType::from_tag(0), None);
        assert_eq!(DisplayType::from_tag(42), None);
    }

    #[test]
    fn test_type_classes() {
        assert!(DisplayType::CodeBlock.is_block());
        assert!(!DisplayType::Code.is_block());
        assert!(DisplayType::Mention.is_exclusive());
        assert!(!DisplayType::Emoji.is_exclusive());
        assert!(DisplayType::Emoji.is_atomic());
        assert!(DisplayType::PearLink.is_atomic());
        assert!(!DisplayType::Bold.is_atomic());
        assert!(DisplayType::Strikethrough.is_manual());
        assert!(!DisplayType::Mention.is_manual());
    }

    #[test]
    fn test_normalize_sorts_and_drops_degenerate() {
        let set = AttributeSet::from_vec(vec![
            Attribute::new(DisplayType::Bold, 10, 2),
            Attribute::new(DisplayType::Italic, 0, 0),
            Attribute::new(DisplayType::Italic, 4, 3),
        ]);
        let starts: Vec<usize> = set.iter().map(|a| a.start).collect();
        assert_eq!(starts, vec![4, 10]);
    }

    #[test]
    fn test_normalize_merges_touching_same_type() {
        let set = AttributeSet::from_vec(vec![
            Attribute::new(DisplayType::Bold, 0, 3),
            Attribute::new(DisplayType::Bold, 3, 2),
            Attribute::new(DisplayType::Bold, 7, 1),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0], Attribute::new(DisplayType::Bold, 0, 5));
        assert_eq!(set.as_slice()[1], Attribute::new(DisplayType::Bold, 7, 1));
    }

    #[test]
    fn test_normalize_never_merges_atomic_tokens() {
        let set = AttributeSet::from_vec(vec![
            Attribute::with_content(DisplayType::Mention, 0, 6, "id-1"),
            Attribute::with_content(DisplayType::Mention, 6, 4, "id-1"),
        ]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_normalize_keeps_different_content_apart() {
        let set = AttributeSet::from_vec(vec![
            Attribute::with_content(DisplayType::HttpLink, 0, 5, "https://a"),
            Attribute::with_content(DisplayType::HttpLink, 5, 5, "https://b"),
        ]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_queries() {
        let set = AttributeSet::from_vec(vec![
            Attribute::new(DisplayType::Bold, 0, 6),
            Attribute::new(DisplayType::Code, 2, 3),
        ]);
        assert_eq!(set.covering(2, 5).count(), 2);
        assert_eq!(set.covering(0, 6).count(), 1);
        assert_eq!(set.covering_point(5).count(), 1);
        assert_eq!(set.overlapping(4, 10).count(), 2);
        assert_eq!(set.overlapping(6, 10).count(), 0);
    }

    #[test]
    fn test_invariant_check_flags_exclusive_overlap() {
        let mut set = AttributeSet::new();
        set.insert(Attribute::new(DisplayType::Code, 0, 5));
        set.insert(Attribute::new(DisplayType::CodeBlock, 3, 4));
        assert!(set.check_invariants().is_err());

        let ok = AttributeSet::from_vec(vec![
            Attribute::new(DisplayType::Bold, 0, 5),
            Attribute::new(DisplayType::Code, 3, 4),
        ]);
        assert!(ok.check_invariants().is_ok());
    }
}
