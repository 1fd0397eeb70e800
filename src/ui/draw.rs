// ui/draw.rs

use super::{
    agents, conspiracy,
    constants::{
        AGENT_KEYS, CONSPIRACY_KEYS, EDITING_KEYS, NORMAL_KEYS, RPG_KEYS, TITLE, VAULT_KEYS,
        VAULT_LOCKED_KEYS,
    },
    phone, rpg,
    spinner::spinner_frame,
    vault,
};
use crate::app::{App, InputMode, Tab};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Tabs},
};
use strum::IntoEnumIterator;

pub const MIN_WIDTH: u16 = 80;
pub const MIN_HEIGHT: u16 = 24;

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    if size.width < MIN_WIDTH || size.height < MIN_HEIGHT {
        let warning = Paragraph::new("Terminal too small. Please resize.")
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center);
        f.render_widget(warning, size);
        return;
    }

    let show_title = size.height > 40;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if show_title { 6 } else { 0 }),
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(size);

    if show_title {
        render_title(f, chunks[0]);
    }
    render_tabs(f, app, chunks[1]);

    match app.tab {
        Tab::Agents => agents::draw_agents(f, app, chunks[2]),
        Tab::Conspiracy => conspiracy::draw_conspiracy(f, app, chunks[2]),
        Tab::DataVault => vault::draw_vault(f, app, chunks[2]),
        Tab::QuantumRpg => rpg::draw_rpg(f, app, chunks[2]),
    }

    render_input(f, app, chunks[3]);
    render_status(f, app, chunks[4]);

    if app.phone.is_some() {
        phone::draw_phone(f, app);
    }
}

fn render_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(TITLE)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Green));
    f.render_widget(title, area);
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!("{}. {}", i + 1, tab)))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" Project X v{} ", env!("CARGO_PKG_VERSION"))),
        )
        .style(Style::default().fg(Color::Green))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_input(f: &mut Frame, app: &mut App, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && app.phone.is_none();
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let title = match app.tab {
        Tab::DataVault if !app.vault_unlocked() => " Access code ",
        Tab::DataVault => " Query ",
        Tab::QuantumRpg => " Command ",
        _ => " Transmission ",
    };

    app.input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .title(title),
    );
    app.input.set_cursor_line_style(Style::default());
    app.input.set_cursor_style(if editing {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    });
    f.render_widget(&app.input, area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let keys = match app.input_mode {
        InputMode::Editing => EDITING_KEYS,
        InputMode::Normal => match app.tab {
            Tab::Agents => AGENT_KEYS,
            Tab::Conspiracy => CONSPIRACY_KEYS,
            Tab::DataVault if !app.vault_unlocked() => VAULT_LOCKED_KEYS,
            Tab::DataVault => VAULT_KEYS,
            Tab::QuantumRpg => RPG_KEYS,
        },
    };

    let mut spans = Vec::new();
    if app.spinner.is_spinning {
        spans.push(Span::styled(
            spinner_frame(&app.spinner, "Processing"),
            Style::default().fg(Color::Green),
        ));
    }
    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!("{status}  "),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled(
        format!("{keys} · {NORMAL_KEYS}"),
        Style::default().fg(Color::DarkGray),
    ));

    let status = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    f.render_widget(status, area);
}
