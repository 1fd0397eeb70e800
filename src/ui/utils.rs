// ui/utils.rs

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
};

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Wraps one transcript entry to `width`, labelling the first line and leaving a blank line after.
pub fn transcript_entry(
    label: &str,
    content: &str,
    width: usize,
    label_style: Style,
    body_style: Style,
) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(label.to_string(), label_style))];
    for paragraph in content.lines() {
        if paragraph.trim().is_empty() {
            lines.push(Line::default());
            continue;
        }
        for wrapped in textwrap::wrap(paragraph, width.max(1)) {
            lines.push(Line::from(Span::styled(wrapped.into_owned(), body_style)));
        }
    }
    lines.push(Line::default());
    lines
}

/// Scroll offset that pins the transcript to its bottom, minus what the user scrolled back.
pub fn bottom_scroll(total_lines: usize, visible: u16, scroll_back: u16) -> u16 {
    let max_scroll = total_lines.saturating_sub(visible as usize);
    let max_scroll = u16::try_from(max_scroll).unwrap_or(u16::MAX);
    max_scroll.saturating_sub(scroll_back)
}
