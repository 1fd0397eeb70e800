// ui/vault.rs

use super::utils::centered_rect;
use crate::app::App;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Wrap},
};

const LOCKED_TEXT: &str = "RESTRICTED ACCESS

This archive holds intercepted transmissions from six monitored channels.
Enter the vault passcode to be issued an API key, or paste an existing px_ key.";

pub fn draw_vault(f: &mut Frame, app: &mut App, area: Rect) {
    if !app.vault_unlocked() {
        render_locked(f, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    render_files(f, app, chunks[0]);
    render_table(f, app, chunks[1]);
}

fn render_locked(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Red))
        .title(" Data Vault ");
    f.render_widget(block, area);

    let notice = Paragraph::new(LOCKED_TEXT)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true });
    f.render_widget(notice, centered_rect(70, 50, area));
}

fn render_files(f: &mut Frame, app: &App, area: Rect) {
    let view = &app.vault_view;
    let spans: Vec<Span> = view
        .files
        .iter()
        .enumerate()
        .flat_map(|(i, file)| {
            let style = if i == view.selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            [Span::styled(file.trim_end_matches(".csv").to_string(), style), Span::raw("  ")]
        })
        .collect();

    let files = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Green))
            .title(format!(
                " Files · {} requests left this window ",
                app.remaining_vault_requests()
            )),
    );
    f.render_widget(files, area);
}

fn render_table(f: &mut Frame, app: &mut App, area: Rect) {
    let view = &mut app.vault_view;
    let mut title = match &view.page {
        Some(page) => format!(
            " {} · page {}/{} · {} rows ",
            view.files.get(view.selected).map(String::as_str).unwrap_or_default(),
            page.page,
            page.total_pages(),
            page.total
        ),
        None => " No data loaded ".to_string(),
    };
    if !view.query_text.is_empty() {
        title.push_str(&format!("· query \"{}\" ", view.query_text));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Green))
        .title(title);

    if let Some(error) = &view.error {
        let paragraph = Paragraph::new(format!("ACCESS ERROR: {error}"))
            .block(block)
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    }

    let Some(page) = &view.page else {
        let message = if view.loading {
            "Decrypting..."
        } else {
            "Select a file with ←→"
        };
        f.render_widget(Paragraph::new(message).block(block), area);
        return;
    };

    let header = Row::new(
        page.headers
            .iter()
            .map(|h| Cell::from(h.to_uppercase()))
            .collect::<Vec<_>>(),
    )
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = page
        .rows
        .iter()
        .map(|row| {
            Row::new(
                page.headers
                    .iter()
                    .map(|h| Cell::from(row.get(h).cloned().unwrap_or_default()))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    // The text column soaks up whatever width is left.
    let widths: Vec<Constraint> = page
        .headers
        .iter()
        .map(|h| match h.as_str() {
            "text" => Constraint::Min(30),
            "date" => Constraint::Length(12),
            _ => Constraint::Length(14),
        })
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut view.table_state);
}
