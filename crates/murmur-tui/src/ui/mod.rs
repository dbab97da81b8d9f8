//! UI rendering
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod chat;
mod input;
mod login;
mod notice;
mod status;

use murmur_app::{App, View};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    const CHAT_AREA_MIN_HEIGHT: u16 = 3;
    const NOTICE_HEIGHT: u16 = 1;
    const STATUS_HEIGHT: u16 = 1;

    if app.view() == View::Login {
        login::render(frame, app, frame.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(CHAT_AREA_MIN_HEIGHT),
            Constraint::Length(NOTICE_HEIGHT),
            Constraint::Length(input::height(app.input())),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [chat_area, notice_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    chat::render(frame, app, *chat_area);
    notice::render(frame, app, *notice_area);
    input::render(frame, app, *input_area);
    status::render(frame, app, *status_area);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Instant;

    use murmur_app::{AppConfig, AppEvent, KeyInput, NoticeKind};
    use murmur_client::{Direction as MessageDirection, LocalId, MessageView, TranscriptOp};
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    use super::*;

    fn draw(app: &App) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn text(buffer: &Buffer) -> String {
        buffer
            .content()
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn connected_app() -> App {
        let mut app = App::new(AppConfig::default());
        app.handle(AppEvent::SessionStarted {
            user_id: "u1".to_string(),
            display_name: "alice".to_string(),
        });
        app
    }

    fn message(local_id: LocalId, id: Option<&str>, author: &str, content: &str) -> MessageView {
        MessageView {
            local_id,
            message_id: id.map(str::to_string),
            correlation_id: None,
            sender_id: if author == "alice" { "u1" } else { "u2" }.to_string(),
            room_id: "general".to_string(),
            author_label: author.to_string(),
            content: content.to_string(),
            timestamp: 0,
            direction: if author == "alice" {
                MessageDirection::Sent
            } else {
                MessageDirection::Received
            },
            pending: id.is_none(),
        }
    }

    #[test]
    fn chat_view_shows_messages_and_status() {
        let mut app = connected_app();
        let next = app.transcript().next_local_id();
        app.handle(AppEvent::Transcript(TranscriptOp::Append(message(
            next,
            Some("m1"),
            "bob",
            "hi alice",
        ))));

        let screen = text(&draw(&app));
        assert!(screen.contains("bob"), "{screen}");
        assert!(screen.contains("hi alice"), "{screen}");
        assert!(screen.contains("Connected as alice"), "{screen}");
    }

    #[test]
    fn delete_mode_shows_ids_of_own_messages() {
        let mut app = connected_app();
        let next = app.transcript().next_local_id();
        app.handle(AppEvent::Transcript(TranscriptOp::Append(message(
            next,
            Some("m7"),
            "alice",
            "mine",
        ))));
        app.toggle_delete_mode();
        app.toggle_selection("m7");

        let screen = text(&draw(&app));
        assert!(screen.contains("[x] m7"), "{screen}");
        assert!(screen.contains("DELETE"), "{screen}");
    }

    #[test]
    fn pending_messages_are_marked() {
        let mut app = connected_app();
        let next = app.transcript().next_local_id();
        app.handle(AppEvent::Transcript(TranscriptOp::Append(message(next, None, "alice", "wait"))));

        let screen = text(&draw(&app));
        assert!(screen.contains("wait (sending)"), "{screen}");
    }

    #[test]
    fn notice_and_composer_are_drawn() {
        let mut app = connected_app();
        for c in "draft".chars() {
            app.handle(AppEvent::Key(KeyInput::Char(c)));
        }
        app.show_notice("Username changed", NoticeKind::Success);
        app.handle(AppEvent::Tick { now: Instant::now() });

        let screen = text(&draw(&app));
        assert!(screen.contains("Username changed"), "{screen}");
        assert!(screen.contains("> draft"), "{screen}");
    }

    #[test]
    fn unclean_close_draws_login_view() {
        let mut app = connected_app();
        app.handle(AppEvent::ConnectionClosed { clean: false });

        let screen = text(&draw(&app));
        assert!(screen.contains("Log in"), "{screen}");
    }
}
