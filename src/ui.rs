use std::time::Instant;

use ratatui::widgets::{Cell, Clear, Gauge, List, ListItem, ListState, Row, Table};
use ratatui::{prelude::*, widgets::*};

use crate::app::{App, DialogField, Mode, SAVE_KEY};
use crate::timestamps::{extract_timestamps, parse_antidelay};

pub fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status message
            Constraint::Min(0),    // Buffer and preview
            Constraint::Length(3), // Save button
            Constraint::Length(1), // Help
        ])
        .split(frame.size());

    frame.render_widget(
        Paragraph::new(app.status_message.clone()).style(Style::default().fg(Color::Cyan)),
        chunks[0],
    );

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    let title = match &app.input_path {
        Some(path) => format!("Signals ({})", path.display()),
        None => "Signals".to_string(),
    };
    frame.render_widget(
        Paragraph::new(app.signals_text.as_str())
            .scroll((app.scroll, 0))
            .block(Block::default().borders(Borders::ALL).title(title)),
        body[0],
    );

    render_preview(frame, app, body[1]);
    render_save_button(frame, app, chunks[2]);

    frame.render_widget(
        Paragraph::new(format!(
            "{}: tap to save, hold to edit | Up/Down/PgUp/PgDn: scroll | r: reload | q: quit",
            SAVE_KEY
        ))
        .alignment(Alignment::Center),
        chunks[3],
    );

    match app.mode {
        Mode::Normal => {}
        Mode::SaveDialog => render_save_dialog(frame, app),
        Mode::Browse => render_browser(frame, app),
    }
}

// Extracted markers next to what would be written with the current antidelay
fn render_preview(frame: &mut Frame, app: &App, area: Rect) {
    let markers = extract_timestamps(&app.signals_text);
    let adjusted = app.preview();
    let rows: Vec<Row> = markers
        .iter()
        .zip(adjusted.iter())
        .map(|(marker, shifted)| {
            Row::new(vec![
                Cell::from(marker.clone()).style(Style::default().fg(Color::DarkGray)),
                Cell::from(shifted.clone()).style(Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(7), Constraint::Length(10)])
        .header(Row::new(vec![
            Cell::from("Found").style(Style::default().add_modifier(Modifier::BOLD)),
            Cell::from("Saved as").style(Style::default().add_modifier(Modifier::BOLD)),
        ]))
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Timestamps ({}, -{}s)",
            markers.len(),
            parse_antidelay(&app.antidelay_input)
        )));

    frame.render_widget(table, area);
}

fn render_save_button(frame: &mut Frame, app: &App, area: Rect) {
    let pressed = app.press.is_pressed();
    let style = if pressed {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Save Ts [{}] via {}", SAVE_KEY, app.sink_name())),
        )
        .gauge_style(style)
        .ratio(app.press.hold_progress(Instant::now()))
        .label(if pressed { "hold to edit..." } else { "" });
    frame.render_widget(gauge, area);
}

fn render_save_dialog(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 9, frame.size());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Save Timestamps ")
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let field = |label: &str, value: &str, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let cursor = if focused { "_" } else { "" };
        Paragraph::new(format!("{}{}", value, cursor))
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(label.to_string()))
    };

    frame.render_widget(
        field("Location", &app.location_input, app.focus == DialogField::Location),
        rows[0],
    );
    frame.render_widget(
        field(
            "Antidelay (seconds)",
            &app.antidelay_input,
            app.focus == DialogField::Antidelay,
        ),
        rows[1],
    );
}

fn render_browser(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 14, frame.size());
    frame.render_widget(Clear, area);

    let items: Vec<ListItem> = app
        .browse_entries
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown");
            ListItem::new(name.to_string())
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Pick a file "))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.browse_idx);
    frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((r.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((r.height.saturating_sub(height)) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((r.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((r.width.saturating_sub(width)) / 2),
        ])
        .split(popup_layout[1])[1]
}
