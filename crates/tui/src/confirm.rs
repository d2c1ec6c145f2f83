use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

pub struct ConfirmDialog {
    pub message: String,
    pub selected: bool, // true = Yes, false = No
}

impl ConfirmDialog {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            selected: false, // default to No
        }
    }

    pub fn toggle(&mut self) {
        self.selected = !self.selected;
    }

    pub fn render(&self, f: &mut Frame) {
        let chunks = dialog_frame(f, " Confirm ", Color::Yellow);
        render_message(f, &self.message, chunks[1]);

        let yes_style = if self.selected {
            Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let no_style = if !self.selected {
            Style::default().fg(Color::Black).bg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let buttons = Line::from(vec![
            Span::styled("  [Yes]  ", yes_style),
            Span::raw("   "),
            Span::styled("  [No]  ", no_style),
        ]);
        f.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), chunks[3]);
    }
}

/// Single-button warning for rejected user input.
pub struct NoticeDialog {
    pub message: String,
}

impl NoticeDialog {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn render(&self, f: &mut Frame) {
        let chunks = dialog_frame(f, " Warning ", Color::Red);
        render_message(f, &self.message, chunks[1]);

        let ok = Span::styled(
            "  [OK]  ",
            Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
        );
        f.render_widget(Paragraph::new(Line::from(ok)).alignment(Alignment::Center), chunks[3]);
    }
}

/// Draw the bordered box and return its rows: padding, message, spacing, buttons.
fn dialog_frame(f: &mut Frame, title: &str, color: Color) -> std::rc::Rc<[Rect]> {
    let area = centered_rect(40, 7, f.area());

    // Clear the area behind the dialog
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title.to_string());

    let inner = block.inner(area);
    f.render_widget(block, area);

    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner)
}

fn render_message(f: &mut Frame, message: &str, area: Rect) {
    let msg = Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(Color::White),
    )))
    .alignment(Alignment::Center);
    f.render_widget(msg, area);
}

/// Return a centered `Rect` of `width` columns and `height` rows inside `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
