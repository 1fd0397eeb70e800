// ui/agents.rs

use super::utils::{bottom_scroll, transcript_entry};
use crate::{app::App, chat::profile_greeting, message::MessageKind};

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap},
};

pub fn draw_agents(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(30)])
        .split(area);

    render_agent_list(f, app, chunks[0]);
    render_transcript(f, app, chunks[1]);
}

fn render_agent_list(f: &mut Frame, app: &mut App, area: Rect) {
    let active_id = app.chat.active_agent().map(|agent| agent.id.clone());
    let items: Vec<ListItem> = app
        .chat
        .registry()
        .all()
        .iter()
        .map(|agent| {
            let marker = if active_id.as_deref() == Some(agent.id.as_str()) {
                "● "
            } else {
                "  "
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Green)),
                    Span::styled(agent.name.clone(), Style::default().fg(Color::White)),
                ]),
                Line::from(Span::styled(
                    format!("  {}", agent.title),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Green))
                .title(" Agents "),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut app.agent_list);
}

fn render_transcript(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Green));

    // No open channel: preview the highlighted profile instead.
    let Some(agent) = app.chat.active_agent() else {
        let preview = app
            .agent_list
            .selected()
            .and_then(|index| app.chat.registry().all().get(index))
            .map(profile_greeting)
            .unwrap_or_default();
        let paragraph = Paragraph::new(preview)
            .block(block.title(" Dossier "))
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
        return;
    };

    let width = area.width.saturating_sub(2) as usize;
    let mut lines = Vec::new();
    for message in app.chat.messages(&agent.id) {
        let (label, color) = match message.kind {
            MessageKind::User => ("YOU".to_string(), Color::Cyan),
            MessageKind::Agent => (agent.name.to_uppercase(), Color::Green),
            MessageKind::System => ("SYSTEM".to_string(), Color::Yellow),
        };
        let label = if message.pending {
            format!("{label} [{}] · sending", message.timestamp.format("%H:%M"))
        } else {
            format!("{label} [{}]", message.timestamp.format("%H:%M"))
        };
        lines.extend(transcript_entry(
            &label,
            &message.content,
            width,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::White),
        ));
    }

    if app.chat.is_awaiting_reply(&agent.id) {
        lines.push(Line::from(Span::styled(
            format!("{} is typing {}", agent.name, app.spinner.get_frame()),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let visible = area.height.saturating_sub(2);
    let scroll = bottom_scroll(lines.len(), visible, app.scroll_back);
    let paragraph = Paragraph::new(lines)
        .block(block.title(format!(" {} · {} ", agent.name, agent.title)))
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}
