use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};

use clickloop_core::logger::{Level, LogRecord, COLOR_BLUE, COLOR_GRAY, COLOR_GREEN};
use clickloop_core::platform::hotkey::CAPTURE_KEY;
use clickloop_core::types::{ConfigField, PlayerState, RunOutcome};

use crate::app::{App, Dialog};

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(f.area());

    draw_banner(f, app, rows[0]);

    let chunks = if app.log_visible {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1])
    } else {
        Layout::default()
            .constraints([Constraint::Percentage(100)])
            .split(rows[1])
    };

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // capture
            Constraint::Min(5),    // coordinates
            Constraint::Length(5), // configuration
            Constraint::Length(4), // help
        ])
        .split(chunks[0]);

    draw_capture(f, app, left[0]);
    draw_coordinates(f, app, left[1]);
    draw_config(f, app, left[2]);
    draw_help(f, left[3]);

    if app.log_visible && chunks.len() > 1 {
        draw_log(f, app, chunks[1]);
    }

    match &app.dialog {
        Some(Dialog::ConfirmClear(d)) => d.render(f),
        Some(Dialog::Notice(d)) => d.render(f),
        None => {}
    }
}

fn banner_for(state: PlayerState) -> (&'static str, Color) {
    match state {
        PlayerState::Idle => ("IDLE (Press S to start)", Color::Gray),
        PlayerState::Running => ("RUNNING (Press X to stop)", Color::Green),
        PlayerState::Stopping => ("STOPPING...", Color::Yellow),
        PlayerState::Finished(RunOutcome::Completed) => ("COMPLETED (Press S to start)", Color::LightBlue),
        PlayerState::Finished(RunOutcome::Stopped) => ("STOPPED (Press S to start)", Color::Red),
        PlayerState::Finished(RunOutcome::Errored) => ("ERROR (Press S to start)", Color::Red),
    }
}

fn draw_banner(f: &mut Frame, app: &App, area: Rect) {
    let (label, bg) = banner_for(app.state);
    let label = match (app.state, app.last_clicks()) {
        (PlayerState::Finished(_), Some(n)) => format!("{} | {} click(s)", label, n),
        _ => label.to_string(),
    };

    // Full-width centered banner
    let width = area.width as usize;
    let pad_total = width.saturating_sub(label.len());
    let pad_left = pad_total / 2;
    let pad_right = pad_total - pad_left;
    let centered = format!("{}{}{}", " ".repeat(pad_left), label, " ".repeat(pad_right));
    let banner = Paragraph::new(Line::from(Span::styled(
        centered,
        Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD),
    )));
    f.render_widget(banner, area);
}

fn draw_capture(f: &mut Frame, app: &App, area: Rect) {
    let (status, color) = if app.recorder.is_capturing() {
        ("Capturing...", Color::Green)
    } else {
        ("Off", Color::Red)
    };
    let line = Line::from(vec![
        Span::styled(" c", Style::default().fg(Color::Yellow)),
        Span::raw(" toggle  "),
        Span::styled(status, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  press '{}' to save", CAPTURE_KEY),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let panel = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Capture ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(panel, area);
}

fn draw_coordinates(f: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec![Cell::from("#"), Cell::from("X"), Cell::from("Y")])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .recorder
        .coordinates()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Row::new(vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(format!("{}", c.x)),
                Cell::from(format!("{}", c.y)),
            ])
        })
        .collect();

    let title = format!(" Coordinates ({}) ", app.recorder.len());
    let table = Table::new(
        rows,
        [Constraint::Length(5), Constraint::Length(8), Constraint::Length(8)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Cyan)),
    )
    .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
    .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(app.selected);
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_config(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = ConfigField::ALL
        .iter()
        .map(|&field| {
            let value = match field {
                ConfigField::Delay => format!("{:.1}", app.config.delay_secs),
                ConfigField::LoopRepetitions => app.config.loop_repetitions.to_string(),
                ConfigField::TotalRepetitions => app.config.total_repetitions.to_string(),
            };
            let focused = field == app.focus;
            let marker = if focused { "> " } else { "  " };
            let value_style = if focused {
                Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<12}", field.label()), Style::default().fg(Color::Gray)),
                Span::styled(format!(" {} ", value), value_style),
            ])
        })
        .collect();

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Settings ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(panel, area);
}

fn key(k: &str) -> Span<'_> {
    Span::styled(k, Style::default().fg(Color::Yellow))
}

fn draw_help(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(vec![
            key(" j/k"), Span::raw(" select  "),
            key("d"), Span::raw(" remove  "),
            key("D"), Span::raw(" clear all  "),
            key("esc"), Span::raw(" unselect"),
        ]),
        Line::from(vec![
            key(" tab"), Span::raw(" field  "),
            key("+/-"), Span::raw(" adjust  "),
            key("s"), Span::raw(" start  "),
            key("x"), Span::raw(" stop"),
        ]),
        Line::from(vec![
            key(" l"), Span::raw(" log  "),
            key("pgup/pgdn"), Span::raw(" scroll  "),
            key("q"), Span::raw(" quit"),
        ]),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_log(f: &mut Frame, app: &App, area: Rect) {
    let visible_height = area.height.saturating_sub(2) as usize;
    let total = app.log_messages.len();
    let max_scroll = total.saturating_sub(visible_height);
    let scroll = app.log_scroll.min(max_scroll);
    let start = total.saturating_sub(visible_height + scroll);
    let end = total.saturating_sub(scroll);
    let log_lines: Vec<Line> = app.log_messages[start..end].iter().map(log_line).collect();

    let log_panel = Paragraph::new(log_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Log ")
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(log_panel, area);
}

/// Colored line for one log record.
fn log_line(rec: &LogRecord) -> Line<'_> {
    let color = match rec.color {
        COLOR_GRAY => Color::DarkGray,
        COLOR_BLUE => Color::LightBlue,
        COLOR_GREEN => Color::LightGreen,
        _ => Color::White,
    };

    let mut spans = vec![
        Span::styled(rec.timestamp.as_str(), Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
    ];

    // Level tag only for warn/error
    match rec.level {
        Level::Error => spans.push(Span::styled("error ", Style::default().fg(Color::Red))),
        Level::Warn => spans.push(Span::styled("warn ", Style::default().fg(Color::Yellow))),
        Level::Info => {}
    }

    if !rec.prefix.is_empty() {
        spans.push(Span::styled(
            rec.prefix.as_str(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(rec.message.as_str(), Style::default().fg(color)));

    Line::from(spans)
}
