//! End-to-end flows through the public engine API.

use richtext_core::{
    Attribute, DisplayType, Engine, EngineEvent, RenderKind, Selection,
};

fn attrs_of(engine: &Engine) -> Vec<Attribute> {
    engine.attributes().to_vec()
}

#[test]
fn bold_toggle_then_typing_extends_the_range() {
    let mut engine = Engine::default();
    engine.parse("hello ");
    engine.set_selection(Selection::caret(6));
    engine.format_selection(DisplayType::Bold, None);

    engine.parse("hello w");
    engine.set_selection(Selection::caret(7));
    engine.parse("hello wo");
    engine.set_selection(Selection::caret(8));
    engine.parse("hello wor");

    assert_eq!(attrs_of(&engine), vec![Attribute::new(DisplayType::Bold, 6, 3)]);
}

#[test]
fn toggling_off_mid_range_leaves_residue() {
    let mut engine = Engine::default();
    engine.parse("abcdef");
    engine.set_selection(Selection::new(0, 6));
    engine.format_selection(DisplayType::Bold, None);
    engine.set_selection(Selection::new(2, 4));
    engine.format_selection(DisplayType::Bold, None);

    assert_eq!(
        attrs_of(&engine),
        vec![
            Attribute::new(DisplayType::Bold, 0, 2),
            Attribute::new(DisplayType::Bold, 4, 2),
        ]
    );
}

#[test]
fn mention_completion_full_flow() {
    let mut engine = Engine::default();
    engine.parse("hi @al");
    engine.set_selection(Selection::caret(6));

    // the fragment is open before the completion
    let events = engine.drain_events();
    assert!(events.contains(&EngineEvent::Prefix {
        ty: Some(DisplayType::Mention),
        prefix: Some("al".into()),
    }));

    engine.complete(DisplayType::Mention, "alice", Some("user-1".into()));

    assert_eq!(engine.display_text(), "hi @alice ");
    assert_eq!(engine.selection(), Selection::caret(10));
    assert_eq!(
        attrs_of(&engine),
        vec![Attribute::with_content(DisplayType::Mention, 3, 7, "user-1")]
    );
}

#[test]
fn deleting_into_a_mention_removes_the_whole_token() {
    let mut engine = Engine::default();
    engine.parse("hi @al");
    engine.set_selection(Selection::caret(6));
    engine.complete(DisplayType::Mention, "alice", Some("user-1".into()));
    engine.drain_events();

    // host backspaced the char before the caret (display "hi @alice " -> "hi @alice")
    engine.parse("hi @alice");

    assert_eq!(engine.display_text(), "hi ");
    assert_eq!(engine.selection(), Selection::caret(3));
    assert!(engine.attributes().is_empty());

    let events = engine.drain_events();
    assert!(events.contains(&EngineEvent::Text("hi ".into())));
    assert!(events.contains(&EngineEvent::Selection(Selection::caret(3))));
}

#[test]
fn prefix_events_track_the_open_fragment() {
    let mut engine = Engine::default();
    engine.parse("say :smi");
    engine.set_selection(Selection::caret(8));

    let events = engine.drain_events();
    assert!(events.contains(&EngineEvent::Prefix {
        ty: Some(DisplayType::Emoji),
        prefix: Some("smi".into()),
    }));
}

#[test]
fn render_ranges_survive_a_selection_only_parse() {
    let mut engine = Engine::default();
    engine.parse("abc");
    engine.set_selection(Selection::new(0, 3));
    engine.format_selection(DisplayType::Code, None);

    let ranges = engine.parse("abc");
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].kind, RenderKind::Code);

    // parsing the unchanged text again produces no new events
    engine.drain_events();
    engine.parse("abc");
    assert!(engine.drain_events().is_empty());
}
