// ui/conspiracy.rs

use super::utils::{bottom_scroll, transcript_entry};
use crate::{app::App, conspiracy::ConspiracyMessageKind};

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
};

pub fn draw_conspiracy(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(36)])
        .split(area);

    render_conversation(f, app, chunks[0]);
    render_archive(f, app, chunks[1]);
}

fn render_conversation(f: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let mut lines = Vec::new();
    for message in app.conspiracy.messages() {
        let (label, color) = match message.kind {
            ConspiracyMessageKind::User => ("TRUTH SEEKER", Color::Cyan),
            ConspiracyMessageKind::System => ("NEURAL INTERFACE", Color::Green),
        };
        lines.extend(transcript_entry(
            label,
            &message.content,
            width,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::White),
        ));
    }

    if app.conspiracy.is_generating() {
        lines.push(Line::from(Span::styled(
            format!("Decrypting classified streams {}", app.spinner.get_frame()),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let visible = area.height.saturating_sub(2);
    let scroll = bottom_scroll(lines.len(), visible, app.scroll_back);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Green))
                .title(" Conspiracy Builder "),
        )
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

fn render_archive(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .conspiracy
        .past_conversations()
        .iter()
        .map(|conversation| {
            ListItem::new(vec![
                Line::from(conversation.title.clone()),
                Line::from(Span::styled(
                    conversation.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let title = format!(" Archive ({}) ", items.len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut app.archive_list);
}
