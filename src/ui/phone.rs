// ui/phone.rs

use super::utils::centered_rect;
use crate::app::{App, CallPhase, PhoneField};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

pub fn draw_phone(f: &mut Frame, app: &mut App) {
    let area = centered_rect(60, 40, f.area());
    let frame_char = app.spinner.get_frame();
    let Some(dialog) = app.phone.as_mut() else {
        return;
    };

    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Green))
        .title(format!(" Secure line · {} ", dialog.agent_name));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(2),
            Constraint::Length(1),
        ])
        .split(inner);

    let fields = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(10), Constraint::Min(10)])
        .split(chunks[0]);

    let editable = dialog.is_editable();
    for (field, area) in [
        (PhoneField::CountryCode, fields[0]),
        (PhoneField::Number, fields[1]),
    ] {
        let focused = editable && dialog.focus == field;
        let title = match field {
            PhoneField::CountryCode => " +Code ",
            PhoneField::Number => " Number ",
        };
        let textarea = match field {
            PhoneField::CountryCode => &mut dialog.country_code,
            PhoneField::Number => &mut dialog.number,
        };
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(if focused {
                    Color::Yellow
                } else {
                    Color::DarkGray
                }))
                .title(title),
        );
        textarea.set_cursor_line_style(Style::default());
        textarea.set_cursor_style(if focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        });
        f.render_widget(&*textarea, area);
    }

    let (message, color) = match &dialog.phase {
        CallPhase::Input => (
            "Enter the number to patch the agent through.".to_string(),
            Color::White,
        ),
        CallPhase::Dialing => (
            format!("Establishing quantum link {frame_char}"),
            Color::Green,
        ),
        CallPhase::Connected(handle) => (
            format!(
                "{}\nCall id: {}{}",
                handle.message,
                handle.call_id,
                if handle.simulated { " (simulated)" } else { "" }
            ),
            Color::Green,
        ),
        CallPhase::Finished(summary) => (summary.clone(), Color::Green),
        CallPhase::Failed(error) => (format!("TRANSMISSION FAILED: {error}"), Color::Red),
    };
    let status = Paragraph::new(message)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(status, chunks[1]);

    let keys = match dialog.phase {
        CallPhase::Input => "Tab switch field · Enter call · Esc close",
        CallPhase::Failed(_) => "Enter retry · Esc close",
        CallPhase::Finished(_) => "Enter or Esc close",
        _ => "Esc hang up",
    };
    let hint = Paragraph::new(keys)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(hint, chunks[2]);
}
