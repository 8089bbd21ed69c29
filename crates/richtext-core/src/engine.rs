//! The formatting engine.
//!
//! [`Engine`] owns the display-space buffer, selection, attribute set, and pending typing
//! attributes, and applies every operation the host can request: text/selection/attribute
//! sync, formatting toggles, autocomplete insertion, derived-span merging, and the per-edit
//! [`Engine::parse`] pass that keeps attributes consistent with what was typed.
//!
//! The host talks logical space (mention labels without markers, emoji as shortcodes); every
//! outgoing [`EngineEvent`] is dehydrated back to logical space before it is queued.

use std::fmt;
use std::mem;
use std::sync::Arc;

use crate::adjust::adjust_for_edit;
use crate::attributes::{Attribute, AttributeSet, DisplayType};
use crate::complete;
use crate::format;
use crate::hydrate::{EmojiConverter, HydrationTransform, NoEmojiConversion};
use crate::prefix::{self, PrefixTrigger, DEFAULT_PREFIX_MAX_LENGTH};
use crate::providers::DerivedSpan;
use crate::render::{self, MentionClassifier, RenderRange, UniformMentions};
use crate::selection::{snap_out_of_atomic, Selection};
use crate::text;
use crate::typing::{resolve_typing_attributes, TypingAttributes};

/// Engine construction parameters.
#[derive(Clone)]
pub struct EngineConfig {
    /// Markers opening completion fragments.
    pub prefix_trigger: PrefixTrigger,
    /// Cap on completion fragment length.
    pub prefix_max_length: usize,
    /// Shortcode/glyph conversion used by hydration.
    pub emoji_converter: Arc<dyn EmojiConverter>,
    /// Mention classification used when rendering.
    pub mention_classifier: Arc<dyn MentionClassifier>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefix_trigger: PrefixTrigger::default(),
            prefix_max_length: DEFAULT_PREFIX_MAX_LENGTH,
            emoji_converter: Arc::new(NoEmojiConversion),
            mention_classifier: Arc::new(UniformMentions),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("prefix_trigger", &self.prefix_trigger)
            .field("prefix_max_length", &self.prefix_max_length)
            .finish_non_exhaustive()
    }
}

impl EngineConfig {
    /// Replace the completion markers.
    pub fn with_prefix_trigger(mut self, trigger: PrefixTrigger) -> Self {
        self.prefix_trigger = trigger;
        self
    }

    /// Replace the fragment length cap.
    pub fn with_prefix_max_length(mut self, max: usize) -> Self {
        self.prefix_max_length = max;
        self
    }

    /// Replace the emoji converter.
    pub fn with_emoji_converter(mut self, converter: Arc<dyn EmojiConverter>) -> Self {
        self.emoji_converter = converter;
        self
    }

    /// Replace the mention classifier.
    pub fn with_mention_classifier(mut self, classifier: Arc<dyn MentionClassifier>) -> Self {
        self.mention_classifier = classifier;
        self
    }
}

/// State change notification for the host, in logical space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The logical text changed.
    Text(String),
    /// The selection moved (logical offsets).
    Selection(Selection),
    /// The attribute set changed (logical offsets).
    Attributes(Vec<Attribute>),
    /// The pending typing attributes changed.
    TypingAttributes(Vec<DisplayType>),
    /// An open completion fragment appeared, changed, or went away.
    Prefix {
        /// Token type of the open fragment, `None` when no fragment is open.
        ty: Option<DisplayType>,
        /// Fragment text, `None` when no fragment is open.
        prefix: Option<String>,
    },
}

/// The formatting-context state machine.
pub struct Engine {
    config: EngineConfig,
    hydrator: HydrationTransform,
    /// Display-space buffer (markers and glyphs materialized).
    text: String,
    /// Display-space selection.
    selection: Selection,
    /// Display-space attribute set.
    attributes: AttributeSet,
    typing: TypingAttributes,
    edits_applied: u64,
    host_revision: u64,
    events: Vec<EngineEvent>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("text", &self.text)
            .field("selection", &self.selection)
            .field("attributes", &self.attributes.len())
            .field("typing", &self.typing)
            .field("edits_applied", &self.edits_applied)
            .field("host_revision", &self.host_revision)
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Create an empty engine.
    pub fn new(config: EngineConfig) -> Self {
        let hydrator = HydrationTransform::new(
            config.prefix_trigger.mention.clone(),
            Arc::clone(&config.emoji_converter),
        );
        Self {
            config,
            hydrator,
            text: String::new(),
            selection: Selection::default(),
            attributes: AttributeSet::new(),
            typing: TypingAttributes::new(),
            edits_applied: 0,
            host_revision: 0,
            events: Vec::new(),
        }
    }

    /// The display-space buffer the host's input field should show.
    pub fn display_text(&self) -> &str {
        &self.text
    }

    /// The logical buffer (markers stripped, glyphs as shortcodes).
    pub fn logical_text(&self) -> String {
        self.logical_snapshot().0
    }

    /// Current display-space selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Current display-space attribute set.
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Pending typing attributes.
    pub fn typing_attributes(&self) -> &TypingAttributes {
        &self.typing
    }

    /// Number of text edits applied through [`Engine::parse`].
    pub fn edits_applied(&self) -> u64 {
        self.edits_applied
    }

    /// Number of host-originated state pushes seen (`set_text` / `set_selection` /
    /// `set_attributes` / `reset`), including echoes. Comparing counters is how a host can
    /// tell a stale snapshot from a fresh one.
    pub fn host_revision(&self) -> u64 {
        self.host_revision
    }

    /// Take the queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        mem::take(&mut self.events)
    }

    /// Replace the buffer with host-provided logical text.
    ///
    /// An echo of the engine's own logical text is a no-op; otherwise the attribute set and
    /// selection are carried over (rebased by rehydration), pending typing attributes are
    /// dropped, and the typing set is re-resolved as after an edit.
    pub fn set_text(&mut self, logical: &str) {
        self.host_revision += 1;
        let (current, attrs, selection) = self.logical_snapshot();
        if current == logical {
            return;
        }
        tracing::debug!(len = logical.len(), "host replaced text");
        let (display, display_attrs, display_sel) =
            self.hydrator.hydrate(logical, &attrs, selection);
        self.text = display;
        self.attributes = AttributeSet::from_vec(display_attrs);
        self.selection = display_sel.clamped(&self.text);
        self.typing.clear();
        self.resolve_typing(true);
        self.emit_attributes();
        self.emit_typing();
        self.emit_prefix();
    }

    /// Replace the attribute set with host-provided logical attributes.
    pub fn set_attributes(&mut self, logical_attrs: Vec<Attribute>) {
        self.host_revision += 1;
        let (logical, _, selection) = self.logical_snapshot();
        let (display, display_attrs, display_sel) =
            self.hydrator.hydrate(&logical, &logical_attrs, selection);
        self.text = display;
        self.attributes = AttributeSet::from_vec(display_attrs);
        self.selection = display_sel.clamped(&self.text);
        self.resolve_typing(false);
        self.emit_typing();
    }

    /// Move the selection (logical offsets).
    ///
    /// The selection is clamped to the buffer, snapped onto grapheme boundaries, and pushed
    /// out of any atomic token it landed inside. The (possibly corrected) logical selection,
    /// the re-resolved typing attributes, and the current completion fragment are emitted.
    pub fn set_selection(&mut self, logical: Selection) {
        self.host_revision += 1;
        let (logical_text, attrs, _) = self.logical_snapshot();
        let (_, _, display_sel) = self.hydrator.hydrate(&logical_text, &attrs, logical);
        let snapped = snap_out_of_atomic(display_sel.clamped(&self.text), &self.attributes);
        self.selection = snapped;
        self.resolve_typing(false);
        self.emit_selection();
        self.emit_typing();
        self.emit_prefix();
    }

    /// Clear buffer, attributes, selection, and pending state.
    pub fn reset(&mut self) {
        self.host_revision += 1;
        self.text.clear();
        self.attributes.clear();
        self.selection = Selection::default();
        self.typing.clear();
        self.emit_text();
        self.emit_selection();
        self.emit_attributes();
        self.emit_typing();
        self.events.push(EngineEvent::Prefix { ty: None, prefix: None });
    }

    /// Toggle a manual format at the caret or over the selection.
    pub fn format_selection(&mut self, ty: DisplayType, content: Option<String>) {
        let changed = format::format_selection(
            &self.text,
            self.selection,
            &mut self.attributes,
            &mut self.typing,
            ty,
            content,
        );
        if !changed {
            return;
        }
        if !self.selection.is_caret() {
            // a range toggle changes coverage under the selection
            self.resolve_typing(false);
        }
        self.emit_attributes();
        self.emit_typing();
    }

    /// Replace the completion fragment before the caret with a finished token.
    ///
    /// No-op when no fragment is open for `ty` (no marker before the caret, fragment over the
    /// length cap, or a non-completable type).
    pub fn complete(&mut self, ty: DisplayType, completion: &str, content: Option<String>) {
        let Some(marker) = self.config.prefix_trigger.marker_for(ty) else {
            tracing::debug!(?ty, "completion requested for non-token type");
            return;
        };
        let outcome = complete::complete(
            &self.text,
            self.selection,
            &mut self.attributes,
            marker,
            self.config.prefix_max_length,
            ty,
            completion,
            content,
        );
        let Some(outcome) = outcome else {
            return;
        };
        self.text = outcome.text;
        self.selection = outcome.selection;
        self.resolve_typing(true);
        self.emit_text();
        self.emit_selection();
        self.emit_attributes();
        self.emit_typing();
        // the fragment was consumed by the completion
        self.events.push(EngineEvent::Prefix { ty: None, prefix: None });
    }

    /// Process the host's current display text: reconcile attributes with the edit (if any)
    /// and return the drawable ranges.
    ///
    /// Calling this twice with the same text is idempotent: the second call reconciles
    /// nothing, emits nothing, and returns the same ranges.
    pub fn parse(&mut self, display_text: &str) -> Vec<RenderRange> {
        if display_text != self.text {
            self.apply_edit(display_text);
        }
        render::render_ranges(
            &self.text,
            &self.attributes,
            &self.config.prefix_trigger.mention,
            self.config.mention_classifier.as_ref(),
        )
    }

    fn apply_edit(&mut self, display_text: &str) {
        // the edit-site selection may predate the edit; keep it inside the old buffer
        let selection = self.selection.clamped(&self.text);
        let outcome = adjust_for_edit(
            &self.text,
            display_text,
            selection,
            &mut self.attributes,
            &self.typing,
        );
        self.text = outcome.text;
        self.edits_applied += 1;
        if outcome.text_rewritten {
            // atomic token removal rewrote the buffer past what the host typed
            self.selection = outcome.selection.clamped(&self.text);
            self.emit_selection();
        } else {
            self.selection = selection.clamped(&self.text);
        }
        self.emit_text();
        self.emit_attributes();
        self.emit_typing();
        self.emit_prefix();
    }

    /// Merge provider-derived spans into the attribute set.
    ///
    /// Guarded: spans outside the buffer, spans overlapping an atomic token, exclusive spans
    /// overlapping an existing exclusive range, and exact duplicates are all skipped.
    pub fn apply_derived_spans(&mut self, spans: Vec<DerivedSpan>) {
        let len = text::char_len(&self.text);
        let mut merged = self.attributes.to_vec();
        let mut changed = false;
        for span in spans {
            let end = span.start + span.length;
            if span.length == 0 || end > len {
                tracing::debug!(start = span.start, length = span.length, "derived span out of bounds");
                continue;
            }
            let conflict = merged.iter().any(|a| {
                let overlap = a.overlaps(span.start, end);
                (overlap && a.ty.is_atomic())
                    || (overlap && span.ty.is_exclusive() && a.ty.is_exclusive())
                    || (a.ty == span.ty && a.start == span.start && a.length == span.length)
            });
            if conflict {
                continue;
            }
            merged.push(Attribute {
                start: span.start,
                length: span.length,
                ty: span.ty,
                content: span.content,
            });
            changed = true;
        }
        if changed {
            self.attributes.replace(merged);
            self.emit_attributes();
        }
    }

    fn logical_snapshot(&self) -> (String, Vec<Attribute>, Selection) {
        self.hydrator
            .dehydrate(&self.text, self.attributes.as_slice(), self.selection)
    }

    fn resolve_typing(&mut self, text_changed: bool) {
        self.typing = resolve_typing_attributes(
            &self.text,
            self.selection,
            &self.attributes,
            &self.typing,
            text_changed,
        );
    }

    fn emit_text(&mut self) {
        let (logical, _, _) = self.logical_snapshot();
        self.events.push(EngineEvent::Text(logical));
    }

    fn emit_selection(&mut self) {
        let (_, _, sel) = self.logical_snapshot();
        self.events.push(EngineEvent::Selection(sel));
    }

    fn emit_attributes(&mut self) {
        let (_, attrs, _) = self.logical_snapshot();
        self.events.push(EngineEvent::Attributes(attrs));
    }

    fn emit_typing(&mut self) {
        self.events
            .push(EngineEvent::TypingAttributes(self.typing.iter().copied().collect()));
    }

    fn emit_prefix(&mut self) {
        let hit = prefix::detect_prefix(
            &self.text,
            self.selection,
            &self.attributes,
            &self.config.prefix_trigger,
            self.config.prefix_max_length,
        );
        let (ty, prefix) = match hit {
            Some(hit) => (Some(hit.ty), Some(hit.prefix)),
            None => (None, None),
        };
        self.events.push(EngineEvent::Prefix { ty, prefix });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn last_attrs(events: &[EngineEvent]) -> Option<&Vec<Attribute>> {
        events.iter().rev().find_map(|e| match e {
            EngineEvent::Attributes(a) => Some(a),
            _ => None,
        })
    }

    #[test]
    fn test_parse_is_idempotent() {
        let mut engine = Engine::default();
        engine.set_selection(Selection::caret(0));
        engine.drain_events();

        let first = engine.parse("hello");
        assert_eq!(engine.edits_applied(), 1);
        let events = engine.drain_events();
        assert!(!events.is_empty());

        let second = engine.parse("hello");
        assert_eq!(first, second);
        assert_eq!(engine.edits_applied(), 1);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_pending_format_applies_on_type() {
        let mut engine = Engine::default();
        engine.parse("hello ");
        engine.set_selection(Selection::caret(6));
        engine.format_selection(DisplayType::Bold, None);
        assert!(engine.typing_attributes().contains(&DisplayType::Bold));
        engine.drain_events();

        engine.parse("hello w");
        assert_eq!(
            engine.attributes().as_slice(),
            &[Attribute::new(DisplayType::Bold, 6, 1)]
        );
        // still pending: the next keystroke keeps extending the range
        assert!(engine.typing_attributes().contains(&DisplayType::Bold));
    }

    #[test]
    fn test_completion_emits_logical_event() {
        let mut engine = Engine::default();
        engine.parse("hi @al");
        engine.set_selection(Selection::caret(6));
        engine.drain_events();

        engine.complete(DisplayType::Mention, "alice", Some("user-1".into()));
        assert_eq!(engine.display_text(), "hi @alice ");

        let events = engine.drain_events();
        // logical space strips the marker
        assert!(events.contains(&EngineEvent::Text("hi alice ".into())));
        assert_eq!(
            last_attrs(&events).map(Vec::as_slice),
            Some(&[Attribute::with_content(DisplayType::Mention, 3, 6, "user-1")][..])
        );
        assert!(events.contains(&EngineEvent::Prefix { ty: None, prefix: None }));
    }

    #[test]
    fn test_set_text_echo_is_noop() {
        let mut engine = Engine::default();
        engine.parse("hello");
        let logical = engine.logical_text();
        engine.drain_events();

        engine.set_text(&logical);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_selection_snaps_out_of_token() {
        let mut engine = Engine::default();
        engine.parse("hi @al");
        engine.set_selection(Selection::caret(6));
        engine.complete(DisplayType::Mention, "alice", None);
        engine.drain_events();

        // display "hi @alice ": logical caret 4 maps into the token, snaps to its start
        engine.set_selection(Selection::caret(4));
        assert_eq!(engine.selection(), Selection::caret(3));
    }

    #[test]
    fn test_derived_span_guards() {
        let mut engine = Engine::default();
        engine.parse("see https://x rest");
        engine.set_selection(Selection::caret(18));
        engine.drain_events();

        engine.apply_derived_spans(vec![DerivedSpan {
            start: 4,
            length: 9,
            ty: DisplayType::HttpLink,
            content: Some("https://x".into()),
        }]);
        assert_eq!(engine.attributes().len(), 1);

        // duplicate and out-of-bounds spans are ignored
        engine.apply_derived_spans(vec![
            DerivedSpan {
                start: 4,
                length: 9,
                ty: DisplayType::HttpLink,
                content: Some("https://x".into()),
            },
            DerivedSpan { start: 30, length: 2, ty: DisplayType::Bold, content: None },
        ]);
        assert_eq!(engine.attributes().len(), 1);

        // an exclusive span over the existing link is rejected
        engine.apply_derived_spans(vec![DerivedSpan {
            start: 2,
            length: 14,
            ty: DisplayType::Code,
            content: None,
        }]);
        assert_eq!(engine.attributes().len(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut engine = Engine::default();
        engine.parse("some text");
        engine.format_selection(DisplayType::Bold, None);
        engine.drain_events();

        engine.reset();
        assert_eq!(engine.display_text(), "");
        assert!(engine.attributes().is_empty());
        assert!(engine.typing_attributes().is_empty());
        let events = engine.drain_events();
        assert!(events.contains(&EngineEvent::Text(String::new())));
    }
}
