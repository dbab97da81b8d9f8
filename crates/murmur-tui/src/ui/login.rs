//! Login view
//!
//! Shown after the server drops the connection. Authentication happens in
//! the browser, so this only tells the user where to go.

use murmur_app::App;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Render the login view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let name = app.display_name().map_or_else(String::new, |name| format!(", {name}"));
    let lines = vec![
        Line::styled(
            format!("Your session has ended{name}."),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::raw("Log in again on the server's /login page, then restart the client."),
    ];

    let block = Block::default().borders(Borders::ALL).title(" Log in ");
    let paragraph =
        Paragraph::new(lines).block(block).alignment(Alignment::Center).wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}
