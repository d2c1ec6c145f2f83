use std::io;
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Result;
use crossterm::{
    execute,
    event::{EnableMouseCapture, DisableMouseCapture},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use clickloop_core::capture::Recorder;
use clickloop_core::logger::{self, LogRecord};
use clickloop_core::platform::{create_platform, hotkey};
use clickloop_core::player::Player;
use clickloop_core::settings::Settings;
use clickloop_core::types::CaptureEvent;

fn main() -> Result<()> {
    let force_stub = std::env::args().any(|a| a == "--stub");

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    logger::init(&cwd.join("logs"))?;

    // Channels
    let (log_tx, log_rx) = mpsc::channel::<LogRecord>();
    let (capture_tx, capture_rx) = mpsc::channel::<CaptureEvent>();

    // Wire logger to TUI
    logger::set_tui_sender(log_tx);
    logger::info("clickloop started");

    let settings = Settings::load(&cwd.join("settings.json"));
    let config = settings.run_config();

    let platform = create_platform(force_stub);
    logger::info(&format!(
        "platform {}, delay {:.1}s, loop {}x, total {}x",
        platform.name(),
        config.delay_secs,
        config.loop_repetitions,
        config.total_repetitions
    ));

    let recorder = Recorder::new();
    let listener = hotkey::start_capture_listener(recorder.capture_flag(), capture_tx);
    let local_capture = !listener.is_active();
    let player = Player::new(platform.clone());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = clickloop_tui::App::new(
        recorder,
        player,
        platform,
        config,
        local_capture,
        capture_rx,
        log_rx,
    );

    // Run TUI event loop on main thread
    let result = clickloop_tui::event::run(&mut terminal, &mut app);

    // Cancel any run, then stop observing the keyboard
    app.shutdown();
    listener.release();
    logger::info("clickloop exited");

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}
