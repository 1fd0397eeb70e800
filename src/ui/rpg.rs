// ui/rpg.rs

use super::utils::{bottom_scroll, transcript_entry};
use crate::{app::App, rpg::RpgMessageKind};

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph, Wrap},
};

pub fn draw_rpg(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(36)])
        .split(area);

    render_log(f, app, chunks[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(8)])
        .split(chunks[1]);
    render_experience(f, app, side[0]);
    render_character(f, app, side[1]);
}

fn render_log(f: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let mut lines = Vec::new();
    for message in &app.rpg.state().messages {
        let (label, color) = match message.kind {
            RpgMessageKind::User => ("> YOU", Color::Cyan),
            RpgMessageKind::Command => ("> CMD", Color::Magenta),
            RpgMessageKind::System => ("SYSTEM", Color::Green),
        };
        lines.extend(transcript_entry(
            label,
            &message.content,
            width,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::White),
        ));
    }

    if app.rpg.is_awaiting_game_master() {
        lines.push(Line::from(Span::styled(
            format!("Game master is thinking {}", app.spinner.get_frame()),
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
                .title(" Quantum Realm "),
        )
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

fn render_experience(f: &mut Frame, app: &App, area: Rect) {
    let state = app.rpg.state();
    // Level n starts at 100 * (n - 1)^2 experience.
    let floor = 100 * u64::from(state.level.saturating_sub(1)).pow(2);
    let ceiling = 100 * u64::from(state.level).pow(2);
    let ratio = if ceiling > floor {
        (state.experience.saturating_sub(floor)) as f64 / (ceiling - floor) as f64
    } else {
        0.0
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" Level {} ", state.level)),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{} / {} XP", state.experience, ceiling));
    f.render_widget(gauge, area);
}

fn render_character(f: &mut Frame, app: &App, area: Rect) {
    let state = app.rpg.state();
    let heading = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(format!("Reputation: {}", state.reputation)),
        Line::default(),
        Line::from(Span::styled("SKILLS", heading)),
    ];
    for (skill, value) in app.rpg.effective_skills() {
        let base = state.skill(&skill);
        let bonus = if value > base {
            format!(" (+{})", value - base)
        } else {
            String::new()
        };
        lines.push(Line::from(format!("  {skill:<12}{value:>3}{bonus}")));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("EQUIPPED", heading)));
    if state.equipped_items.is_empty() {
        lines.push(Line::from(Span::styled(
            "  nothing",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for id in &state.equipped_items {
        let name = state.item(id).map_or(id.as_str(), |item| item.name.as_str());
        lines.push(Line::from(format!("  {name}")));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("ACTIVE QUESTS", heading)));
    for quest in &state.active_quests {
        lines.push(Line::from(format!("  {}", quest.title)));
        for objective in &quest.objectives {
            let mark = if objective.completed { "x" } else { " " };
            lines.push(Line::from(Span::styled(
                format!(
                    "   [{mark}] {} {}/{}",
                    objective.description, objective.progress, objective.required
                ),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Operative "),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
