//! Headless rich-text input engine.
//!
//! The crate keeps a text buffer, a caret/selection, and a set of typed formatting
//! attributes (bold, inline code, mentions, links, …) consistent while the user types,
//! deletes, toggles formats, and accepts autocomplete suggestions. It owns no widget: the
//! host renders the text and reports edits; the engine answers with drawable ranges and
//! logical-space state events.
//!
//! Two coordinate spaces are involved. The host exchanges the *logical* buffer (mention
//! labels without their marker, emoji as shortcodes); the engine edits the *display* buffer
//! the input field actually shows. [`HydrationTransform`] maps between the two, and every
//! offset in either space counts Unicode scalar values.
//!
//! Typical embedding:
//!
//! ```
//! use richtext_core::{DisplayType, EditorSession, EngineConfig, Selection};
//!
//! let session = EditorSession::spawn(EngineConfig::default())?;
//! session.parse("hello ")?;
//! session.set_selection(Selection::caret(6))?;
//! session.format_selection(DisplayType::Bold, None)?;
//! let ranges = session.parse("hello w")?;
//! assert_eq!(ranges.len(), 1);
//! # Ok::<(), richtext_core::SessionError>(())
//! ```
//!
//! For single-threaded hosts, [`Engine`] can be driven directly without the session layer.

#![warn(missing_docs)]

mod adjust;
mod attributes;
mod complete;
mod engine;
mod format;
mod hydrate;
mod prefix;
mod providers;
mod render;
mod selection;
mod session;
mod text;
mod typing;

pub use adjust::{adjust_for_edit, AdjustOutcome};
pub use attributes::{Attribute, AttributeSet, DisplayType};
pub use complete::{complete, CompletionOutcome};
pub use engine::{Engine, EngineConfig, EngineEvent};
pub use format::format_selection;
pub use hydrate::{EmojiConverter, HydrationTransform, NoEmojiConversion};
pub use prefix::{detect_prefix, PrefixHit, PrefixTrigger, DEFAULT_PREFIX_MAX_LENGTH};
pub use providers::{DerivedSpan, LinkScanner, SyntaxTokenizer};
pub use render::{
    render_ranges, MentionClass, MentionClassifier, RenderKind, RenderRange, UniformMentions,
};
pub use selection::{snap_out_of_atomic, Selection};
pub use session::{EditorSession, SessionError};
pub use typing::{resolve_typing_attributes, TypingAttributes};
