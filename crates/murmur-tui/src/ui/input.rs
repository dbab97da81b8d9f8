//! Input area
//!
//! Displays the composer with cursor. Shift+Enter adds lines; only the last
//! few are shown.

use murmur_app::App;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

const PROMPT: &str = "> ";
const CONTINUATION: &str = "  ";
const PROMPT_WIDTH: u16 = 3; // left border + "> "
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border
const BORDER_SIZE: u16 = 2;
const MAX_VISIBLE_LINES: usize = 4;

/// Height of the input area for the given composer contents.
pub fn height(input: &str) -> u16 {
    let lines = input.split('\n').count().clamp(1, MAX_VISIBLE_LINES);
    u16::try_from(lines).unwrap_or(1) + BORDER_SIZE
}

/// Render the input area.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL);

    let all: Vec<&str> = app.input().split('\n').collect();
    let skip = all.len().saturating_sub(MAX_VISIBLE_LINES);
    let visible: Vec<Line> = all
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, line)| {
            let prefix = if i == 0 { PROMPT } else { CONTINUATION };
            Line::from(format!("{prefix}{line}"))
        })
        .collect();
    let shown = visible.len();

    let paragraph = Paragraph::new(visible).style(Style::default().fg(Color::White)).block(block);
    frame.render_widget(paragraph, area);

    let last = all.last().map_or(0, |line| line.chars().count());
    let available_width = area.width.saturating_sub(PROMPT_WIDTH + RIGHT_PADDING);
    let cursor_offset = u16::try_from(last).unwrap_or(u16::MAX).min(available_width);

    let cursor_x = area.x.saturating_add(PROMPT_WIDTH).saturating_add(cursor_offset);
    let row = u16::try_from(shown.saturating_sub(1)).unwrap_or(0);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y).saturating_add(row);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);

    frame.set_cursor_position((cursor_x.min(max_x), cursor_y));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_grows_with_lines_up_to_cap() {
        assert_eq!(height(""), 3);
        assert_eq!(height("a\nb"), 4);
        assert_eq!(height("1\n2\n3\n4\n5\n6"), 6);
    }
}
