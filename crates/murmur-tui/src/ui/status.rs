//! Status bar
//!
//! Displays connection status and delete mode.

use murmur_app::{App, ConnectionState};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let connection_status = match app.connection_state() {
        ConnectionState::Disconnected => {
            Span::styled("Disconnected", Style::default().fg(Color::Red))
        },
        ConnectionState::Connecting => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        ConnectionState::Connected { .. } => Span::styled(
            format!("Connected as {}", app.display_name().unwrap_or_default()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        ConnectionState::Closed { clean: true } => {
            Span::styled("Closed", Style::default().fg(Color::Yellow))
        },
        ConnectionState::Closed { clean: false } => {
            Span::styled("Connection lost", Style::default().fg(Color::Red))
        },
    };

    let mode = if app.delete_mode() {
        Span::styled(
            format!(" | DELETE: {} selected, /confirm or Esc", app.selected().len()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            format!(" | Messages: {} | /name /delete /upload /quit", app.transcript().len()),
            Style::default().fg(Color::Gray),
        )
    };

    let status_line = Line::from(vec![Span::raw(" "), connection_status, mode]);
    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
