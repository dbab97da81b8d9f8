//! Notice line
//!
//! Shows the current transient notice. Fading notices are dimmed.

use murmur_app::{App, NoticeKind, NoticePhase};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Paragraph,
};

/// Render the notice line.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(notice) = app.notice() else {
        return;
    };

    let color = match notice.kind {
        NoticeKind::Success => Color::Green,
        NoticeKind::Error => Color::Red,
    };
    let mut style = Style::default().fg(color);
    if notice.phase == NoticePhase::Fading {
        style = style.add_modifier(Modifier::DIM);
    }

    frame.render_widget(Paragraph::new(format!(" {}", notice.text)).style(style), area);
}
