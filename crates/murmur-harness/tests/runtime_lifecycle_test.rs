//! Runtime lifecycle tests.
//!
//! These run the real [`Runtime`] against the simulated server through
//! [`SimDriver`], on a virtual clock. They cover what only shows up with the
//! full event loop: connection setup, close handling and navigation, HTTP
//! outcomes surfacing as timed notices, and the render-time invariants.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use murmur_app::{ConnectionState, NoticeKind, NoticePhase, Runtime, RuntimeConfig, View};
use murmur_harness::{
    ClientSnapshot, InvariantRegistry, SharedSimServer, SimDriver, SimInput, SimServerConfig,
    SystemSnapshot, create_shared_server,
};

fn server() -> SharedSimServer {
    let server = create_shared_server(SimServerConfig::default());
    {
        let mut guard = server.lock().unwrap();
        guard.add_user("u1", "alice");
        guard.add_user("u2", "bob");
    }
    server
}

fn runtime(server: &SharedSimServer, user_id: &str) -> Runtime<SimDriver> {
    let driver = SimDriver::new(server.clone(), user_id)
        .with_tick(Duration::from_millis(500))
        .with_invariants(InvariantRegistry::standard());
    Runtime::new(driver, RuntimeConfig::default())
}

/// Start and process the Initialization frame.
async fn started(server: &SharedSimServer, user_id: &str) -> Runtime<SimDriver> {
    let mut rt = runtime(server, user_id);
    assert!(!rt.start().await.unwrap());
    assert!(!rt.step().await.unwrap());
    rt
}

/// Step `n` times. Returns `true` if the runtime asked to quit.
async fn steps(rt: &mut Runtime<SimDriver>, n: usize) -> bool {
    for _ in 0..n {
        if rt.step().await.unwrap() {
            return true;
        }
    }
    false
}

fn assert_invariants(rt: &Runtime<SimDriver>) {
    assert!(rt.driver().violations().is_empty(), "{:?}", rt.driver().violations());
    let snapshot = SystemSnapshot::single(ClientSnapshot::capture("rt", rt.app(), rt.bridge()));
    InvariantRegistry::standard().assert_all(&snapshot, "runtime");
}

#[tokio::test]
async fn start_connects_to_discovered_endpoint() {
    let server = server();
    let rt = started(&server, "u1").await;

    assert_eq!(rt.driver().connected_url(), Some("ws://127.0.0.1:8080/ws/"));
    assert_eq!(rt.app().connection_state(), &ConnectionState::Connected {
        user_id: "u1".to_string()
    });
    assert_eq!(rt.app().display_name(), Some("alice"));
    assert!(rt.driver().renders() > 0);
}

#[tokio::test]
async fn composed_message_is_confirmed_by_echo() {
    let server = server();
    let mut rt = started(&server, "u1").await;

    rt.driver_mut().push_input(SimInput::Compose("hello".to_string()));
    steps(&mut rt, 1).await;

    let entries = rt.app().transcript().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message_id.as_deref(), Some("m1"));
    assert!(!entries[0].pending);
    assert_invariants(&rt);
}

#[tokio::test]
async fn messages_reach_other_runtimes() {
    let server = server();
    let mut alice = started(&server, "u1").await;
    let mut bob = started(&server, "u2").await;

    alice.driver_mut().push_input(SimInput::Compose("hi bob".to_string()));
    steps(&mut alice, 1).await;
    steps(&mut bob, 2).await;

    let entries = bob.app().transcript().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].author_label, "alice");
    assert_eq!(entries[0].content, "hi bob");
    assert_invariants(&alice);
    assert_invariants(&bob);
}

#[tokio::test]
async fn unclean_close_navigates_to_login_and_quits() {
    let server = server();
    let mut rt = started(&server, "u1").await;
    let ws_id = rt.driver().ws_id().unwrap().to_string();

    server.lock().unwrap().close(&ws_id, false);

    assert!(steps(&mut rt, 1).await);
    assert_eq!(rt.driver().navigations(), &[View::Login]);
    assert_eq!(rt.app().view(), View::Login);
}

#[tokio::test]
async fn send_racing_an_unclean_close_still_reaches_login() {
    let server = server();
    let mut rt = started(&server, "u1").await;
    let ws_id = rt.driver().ws_id().unwrap().to_string();

    // The socket is gone but the close has not been read yet
    server.lock().unwrap().close(&ws_id, false);
    rt.driver_mut().push_input(SimInput::Compose("too late".to_string()));

    assert!(steps(&mut rt, 1).await);
    assert_eq!(rt.driver().navigations(), &[View::Login]);
    assert!(server.lock().unwrap().live_message_ids().is_empty());
}

#[tokio::test]
async fn one_step_applies_every_queued_frame() {
    const FRAMES: usize = 25;

    let server = server();
    let mut rt = started(&server, "u2").await;
    let ws_id = rt.driver().ws_id().unwrap().to_string();

    {
        let mut guard = server.lock().unwrap();
        for i in 0..FRAMES {
            guard.inject(
                &ws_id,
                format!(
                    r#"{{"Basic":{{"content":"burst {i}","sender_id":"u1","message_id":"x{i}","ws_id":"elsewhere"}}}}"#
                ),
            );
        }
    }

    steps(&mut rt, 1).await;

    assert_eq!(rt.app().transcript().len(), FRAMES);
    assert_eq!(server.lock().unwrap().queued(&ws_id), 0);
    assert_invariants(&rt);
}

#[tokio::test]
async fn clean_close_quits_without_navigation() {
    let server = server();
    let mut rt = started(&server, "u1").await;
    let ws_id = rt.driver().ws_id().unwrap().to_string();

    server.lock().unwrap().close(&ws_id, true);

    assert!(steps(&mut rt, 1).await);
    assert!(rt.driver().navigations().is_empty());
    assert_eq!(rt.app().connection_state(), &ConnectionState::Closed { clean: true });
}

#[tokio::test]
async fn failed_username_change_shows_error_that_expires() {
    let server = server();
    let mut rt = started(&server, "u1").await;

    rt.driver_mut().push_input(SimInput::ChangeUsername("bob".to_string()));
    steps(&mut rt, 1).await;

    let notice = rt.app().notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(notice.text.contains("already taken"), "{}", notice.text);
    assert_eq!(rt.app().display_name(), Some("alice"));

    // 2.5s later the notice is still fully visible
    steps(&mut rt, 4).await;
    assert_eq!(rt.app().notice().unwrap().phase, NoticePhase::Visible);

    // Gone once the visible period and the fade have both passed
    steps(&mut rt, 7).await;
    assert!(rt.app().notice().is_none());
}

#[tokio::test]
async fn successful_username_change_relabels_after_broadcast() {
    let server = server();
    let mut rt = started(&server, "u1").await;
    rt.driver_mut().push_input(SimInput::Compose("before".to_string()));
    steps(&mut rt, 1).await;

    rt.driver_mut().push_input(SimInput::ChangeUsername("alicia".to_string()));
    steps(&mut rt, 2).await;

    assert_eq!(rt.app().notice().unwrap().kind, NoticeKind::Success);
    assert_eq!(rt.app().display_name(), Some("alicia"));
    assert_eq!(rt.app().transcript().entries()[0].author_label, "alicia");
    assert_eq!(server.lock().unwrap().username("u1"), Some("alicia"));
    assert_invariants(&rt);
}

#[tokio::test]
async fn upload_reaches_server_and_shows_success() {
    let server = server();
    let mut rt = started(&server, "u1").await;

    rt.driver_mut().push_input(SimInput::Upload {
        filename: "cat.png".to_string(),
        bytes: b"meow".to_vec(),
    });
    steps(&mut rt, 1).await;

    assert_eq!(rt.app().notice().unwrap().kind, NoticeKind::Success);
    assert_eq!(server.lock().unwrap().uploads(), &[("cat.png".to_string(), b"meow".to_vec())]);
}

#[tokio::test]
async fn delete_mode_removes_own_message_everywhere() {
    let server = server();
    let mut alice = started(&server, "u1").await;
    let mut bob = started(&server, "u2").await;

    alice.driver_mut().push_input(SimInput::Compose("oops".to_string()));
    steps(&mut alice, 1).await;
    steps(&mut bob, 2).await;
    assert_eq!(bob.app().transcript().len(), 1);

    for input in [
        SimInput::ToggleDeleteMode,
        SimInput::Select("m1".to_string()),
        SimInput::DeleteSelected,
    ] {
        alice.driver_mut().push_input(input);
    }
    steps(&mut alice, 3).await;
    steps(&mut bob, 1).await;

    assert!(alice.app().transcript().is_empty());
    assert!(bob.app().transcript().is_empty());
    assert!(!alice.app().delete_mode());
    assert_invariants(&alice);
    assert_invariants(&bob);
}

#[tokio::test]
async fn run_stops_on_quit() {
    let server = server();
    let mut rt = runtime(&server, "u1");
    rt.driver_mut().push_input(SimInput::Quit);

    let driver = rt.run().await.unwrap();

    // Initialization was never read; stop closed the connection cleanly
    assert!(driver.is_stopped());
    assert!(driver.navigations().is_empty());
    assert_eq!(server.lock().unwrap().queued("ws1"), 2);
}
