//! Integration tests for App and Bridge behavior.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - The App's transcript mirror equals the client's transcript
//! - Outgoing frames match what the user did
//! - Delete mode only ever targets our own confirmed messages

use murmur_app::{App, AppAction, AppEvent, Bridge, KeyInput};
use murmur_proto::{BasicMessage, Envelope};

const INIT: &str = r#"{"Initialization":{"user_id":"u1","ws_id":"c1","username":"alice",
    "user_map":{"u1":"alice","u2":"bob"}}}"#;

/// Create an App and Bridge with an open connection and live session.
fn connected() -> (App, Bridge) {
    let mut app = App::default();
    let mut bridge = Bridge::default();

    for event in bridge.begin_discovery() {
        app.handle(event);
    }
    bridge.endpoint_resolved("127.0.0.1").expect("resolve");
    for event in bridge.connection_opened() {
        app.handle(event);
    }
    deliver(&mut app, &mut bridge, INIT);

    (app, bridge)
}

/// Process actions from App through Bridge and update App state.
fn process_actions(app: &mut App, bridge: &mut Bridge, actions: Vec<AppAction>) -> Vec<String> {
    let mut pending = actions;
    while !pending.is_empty() {
        for action in std::mem::take(&mut pending) {
            match action {
                AppAction::SendMessage { .. } | AppAction::DeleteMessages { .. } => {
                    for event in bridge.process_app_action(action, 1_700_000_000_000) {
                        pending.extend(app.handle(event));
                    }
                },
                AppAction::Render
                | AppAction::Quit
                | AppAction::Navigate(_)
                | AppAction::ChangeUsername { .. }
                | AppAction::Upload { .. } => {},
            }
        }
    }

    bridge.take_outgoing()
}

/// Deliver a server frame through the Bridge into the App.
fn deliver(app: &mut App, bridge: &mut Bridge, text: &str) {
    for event in bridge.handle_text(text) {
        app.handle(event);
    }
}

/// Type and submit a message through the composer.
fn compose(app: &mut App, bridge: &mut Bridge, text: &str) -> Vec<String> {
    for c in text.chars() {
        app.handle(AppEvent::Key(KeyInput::Char(c)));
    }
    let actions = app.handle(AppEvent::Key(KeyInput::Enter));
    process_actions(app, bridge, actions)
}

fn echo_of(frame: &str, message_id: &str) -> String {
    let Ok(Envelope::Basic(sent)) = Envelope::decode(frame) else {
        unreachable!("outgoing frame is a Basic message: {frame}");
    };
    Envelope::Basic(BasicMessage { message_id: message_id.to_string(), ..sent })
        .encode()
        .expect("encode")
}

#[test]
fn composed_message_round_trips_through_echo() {
    let (mut app, mut bridge) = connected();

    let outgoing = compose(&mut app, &mut bridge, "hello");
    assert_eq!(outgoing.len(), 1);
    assert_eq!(app.transcript().len(), 1);
    assert!(app.transcript().entries()[0].pending);

    deliver(&mut app, &mut bridge, &echo_of(&outgoing[0], "m1"));

    // Oracle: mirror matches the client, one confirmed entry
    assert_eq!(app.transcript(), bridge.client().transcript());
    assert_eq!(app.transcript().len(), 1);
    assert_eq!(app.transcript().entries()[0].message_id.as_deref(), Some("m1"));
}

#[test]
fn delete_mode_sends_deletions_for_selected_messages() {
    let (mut app, mut bridge) = connected();
    let outgoing = compose(&mut app, &mut bridge, "oops");
    deliver(&mut app, &mut bridge, &echo_of(&outgoing[0], "m1"));
    deliver(
        &mut app,
        &mut bridge,
        r#"{"Basic":{"content":"hey","sender_id":"u2","message_id":"m2","ws_id":"c2"}}"#,
    );

    app.toggle_delete_mode();
    app.toggle_selection("m1");
    app.toggle_selection("m2");
    let actions = app.delete_selected();
    let outgoing = process_actions(&mut app, &mut bridge, actions);

    // Oracle: only our own message was deleted, locally and on the wire
    assert_eq!(outgoing, vec![r#"{"Deletion":{"sender_id":"u1","message_id":"m1"}}"#.to_string()]);
    assert_eq!(app.transcript().len(), 1);
    assert_eq!(app.transcript(), bridge.client().transcript());

    // Server confirmation is a no-op
    deliver(&mut app, &mut bridge, r#"{"Deletion":{"sender_id":"u1","message_id":"m1"}}"#);
    assert_eq!(app.transcript().len(), 1);
}

#[test]
fn own_rename_relabels_and_updates_display_name() {
    let (mut app, mut bridge) = connected();
    let outgoing = compose(&mut app, &mut bridge, "first");
    deliver(&mut app, &mut bridge, &echo_of(&outgoing[0], "m1"));

    deliver(&mut app, &mut bridge, r#"{"UsernameChange":{"sender_id":"u1","new_username":"alicia"}}"#);
    compose(&mut app, &mut bridge, "second");

    assert_eq!(app.display_name(), Some("alicia"));
    assert!(app.transcript().entries().iter().all(|v| v.author_label == "alicia"));
    assert_eq!(app.transcript(), bridge.client().transcript());
}

#[test]
fn sends_after_close_are_dropped_silently() {
    let (mut app, mut bridge) = connected();
    for event in bridge.connection_closed(true) {
        app.handle(event);
    }

    let outgoing = compose(&mut app, &mut bridge, "anyone?");

    assert!(outgoing.is_empty());
    assert!(app.notice().is_none(), "dropped sends are not surfaced");
}
