use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use clickloop_core::platform::hotkey::CAPTURE_KEY;

use crate::App;
use crate::ui;

pub fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    loop {
        if app.should_quit {
            return Ok(());
        }

        // Captures, log lines, worker state
        app.tick();

        // Render
        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for events with 100ms timeout (keeps TUI responsive)
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key(app, key);
                }
                Event::Mouse(mouse) => {
                    match mouse.kind {
                        MouseEventKind::ScrollUp => {
                            app.scroll_log_up(3);
                        }
                        MouseEventKind::ScrollDown => {
                            app.scroll_log_down(3);
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }
}

pub fn handle_key(app: &mut App, key: KeyEvent) {
    if app.dialog.is_some() {
        handle_dialog_key(app, key.code);
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => app.quit(),
        KeyCode::Char('c') | KeyCode::Char('C') => app.toggle_capture(),
        KeyCode::Char(ch) if ch == CAPTURE_KEY => app.capture_here(),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => app.move_down(),
        KeyCode::Esc => app.escape(),
        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected(),
        KeyCode::Char('D') => app.request_clear(),
        KeyCode::Tab => app.next_field(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust(1),
        KeyCode::Char('-') | KeyCode::Char('_') => app.adjust(-1),
        KeyCode::Char('s') | KeyCode::Char('S') => app.start(),
        KeyCode::Char('x') | KeyCode::Char('X') => app.stop(),
        KeyCode::Char('l') | KeyCode::Char('L') => app.toggle_log(),
        KeyCode::PageUp => app.scroll_log_up(10),
        KeyCode::PageDown => app.scroll_log_down(10),
        _ => {}
    }
}

fn handle_dialog_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Left | KeyCode::Right | KeyCode::Tab => app.dialog_toggle(),
        KeyCode::Enter => app.dialog_accept(),
        KeyCode::Char('y') | KeyCode::Char('Y') => app.dialog_answer(true),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.dialog_answer(false),
        _ => {}
    }
}
