//! Chat area
//!
//! Displays the transcript. In delete mode our own confirmed messages carry
//! their id and a selection box so they can be picked with `/select`.

use murmur_app::App;
use murmur_client::{Direction, MessageView};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem},
};

const BORDER_SIZE: u16 = 2;
const CONTINUATION_INDENT: &str = "    ";
const MILLIS_PER_MINUTE: u64 = 60_000;
const MINUTES_PER_DAY: u64 = 24 * 60;

/// Render the chat area.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.delete_mode() { " Chat (select to delete) " } else { " Chat " };
    let block = Block::default().borders(Borders::ALL).title(title);

    let items: Vec<ListItem> = if app.transcript().is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No messages yet",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        app.transcript().entries().iter().map(|view| message_item(app, view)).collect()
    };

    let visible_height = usize::from(area.height.saturating_sub(BORDER_SIZE));
    let visible_items = tail_fitting(items, visible_height);

    frame.render_widget(List::new(visible_items).block(block), area);
}

/// Keep the newest items whose combined height fits.
fn tail_fitting(items: Vec<ListItem>, height: usize) -> Vec<ListItem> {
    let mut used = 0;
    let mut keep = 0;
    for item in items.iter().rev() {
        used += item.height();
        if used > height {
            break;
        }
        keep += 1;
    }
    let skip = items.len() - keep;
    items.into_iter().skip(skip).collect()
}

fn message_item<'a>(app: &App, view: &'a MessageView) -> ListItem<'a> {
    let sender_style = match view.direction {
        Direction::Sent => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        Direction::Received => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    };

    let mut head = Vec::new();
    if app.delete_mode()
        && view.is_confirmed_own()
        && let Some(id) = &view.message_id
    {
        let mark = if app.selected().contains(id) { "[x]" } else { "[ ]" };
        head.push(Span::styled(format!("{mark} {id} "), Style::default().fg(Color::Red)));
    }
    head.push(Span::styled(clock(view.timestamp), Style::default().fg(Color::DarkGray)));
    head.push(Span::raw(" "));
    head.push(Span::styled(view.author_label.as_str(), sender_style));
    head.push(Span::raw(": "));

    let mut lines = view.content.split('\n');
    head.push(Span::raw(lines.next().unwrap_or_default()));
    let mut text = Text::from(Line::from(head));
    for line in lines {
        text.push_line(Line::from(vec![Span::raw(CONTINUATION_INDENT), Span::raw(line)]));
    }

    if view.pending {
        text.push_span(Span::styled(" (sending)", Style::default().fg(Color::DarkGray)));
    }

    ListItem::new(text)
}

/// `HH:MM` in UTC.
fn clock(timestamp: u64) -> String {
    let minutes = (timestamp / MILLIS_PER_MINUTE) % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
