use std::sync::{mpsc, Arc};

use clickloop_core::capture::Recorder;
use clickloop_core::logger::{self, LogRecord};
use clickloop_core::platform::Platform;
use clickloop_core::player::Player;
use clickloop_core::types::{CaptureEvent, ConfigField, PlayerState, RunConfig, StartResult};

use crate::confirm::{ConfirmDialog, NoticeDialog};

// Oldest log lines are dropped past this
const LOG_CAPACITY: usize = 5_000;

/// Modal overlay; while one is open it receives every key.
pub enum Dialog {
    ConfirmClear(ConfirmDialog),
    Notice(NoticeDialog),
}

pub struct App {
    pub recorder: Recorder,
    pub config: RunConfig,
    pub focus: ConfigField,
    pub selected: Option<usize>,
    pub state: PlayerState,
    pub dialog: Option<Dialog>,
    pub log_visible: bool,
    pub log_messages: Vec<LogRecord>,
    pub log_scroll: usize, // scroll offset from bottom (0 = latest)
    pub should_quit: bool,
    pub local_capture: bool, // no global observer, so the terminal key captures
    player: Player,
    platform: Arc<dyn Platform>,
    capture_rx: mpsc::Receiver<CaptureEvent>,
    log_rx: mpsc::Receiver<LogRecord>,
}

impl App {
    pub fn new(
        recorder: Recorder,
        player: Player,
        platform: Arc<dyn Platform>,
        config: RunConfig,
        local_capture: bool,
        capture_rx: mpsc::Receiver<CaptureEvent>,
        log_rx: mpsc::Receiver<LogRecord>,
    ) -> Self {
        Self {
            recorder,
            config,
            focus: ConfigField::Delay,
            selected: None,
            state: PlayerState::Idle,
            dialog: None,
            log_visible: true,
            log_messages: Vec::new(),
            log_scroll: 0,
            should_quit: false,
            local_capture,
            player,
            platform,
            capture_rx,
            log_rx,
        }
    }

    /// Pull everything that happened since the last frame.
    pub fn tick(&mut self) {
        self.drain_captures();
        self.drain_logs();
        self.state = self.player.poll();
    }

    pub fn drain_logs(&mut self) {
        while let Ok(rec) = self.log_rx.try_recv() {
            self.log_messages.push(rec);
        }
        if self.log_messages.len() > LOG_CAPACITY {
            let excess = self.log_messages.len() - LOG_CAPACITY;
            self.log_messages.drain(..excess);
        }
    }

    pub fn drain_captures(&mut self) {
        while let Ok(ev) = self.capture_rx.try_recv() {
            match ev {
                CaptureEvent::PositionCaptured(at) => {
                    if self.editable() {
                        self.recorder.capture(at);
                    }
                }
            }
        }
    }

    /// Interface-side mutation is closed while a run is active.
    pub fn editable(&mut self) -> bool {
        self.state = self.player.poll();
        !self.state.is_active()
    }

    pub fn last_clicks(&self) -> Option<u64> {
        self.player.last_report().map(|r| r.clicks)
    }

    // -- capture --

    pub fn toggle_capture(&mut self) {
        if !self.editable() {
            return;
        }
        self.recorder.toggle_capture();
    }

    /// Capture key pressed inside the terminal. The global observer already
    /// sees this press when it is running.
    pub fn capture_here(&mut self) {
        if !self.local_capture || !self.editable() || !self.recorder.is_capturing() {
            return;
        }
        match self.platform.cursor_position() {
            Ok(at) => {
                self.recorder.capture(at);
            }
            Err(e) => logger::error(&format!("capture failed: {:#}", e)),
        }
    }

    // -- coordinate list --

    pub fn move_up(&mut self) {
        let len = self.recorder.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) if i > 0 => i - 1,
            Some(i) => i,
            None => len - 1,
        });
    }

    pub fn move_down(&mut self) {
        let len = self.recorder.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        });
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn remove_selected(&mut self) {
        if !self.editable() {
            return;
        }
        let Some(idx) = self.selected.filter(|i| *i < self.recorder.len()) else {
            logger::warn("select a coordinate first");
            self.dialog = Some(Dialog::Notice(NoticeDialog::new("Select a coordinate.")));
            return;
        };
        self.recorder.remove(idx);
        let len = self.recorder.len();
        self.selected = if len == 0 { None } else { Some(idx.min(len - 1)) };
    }

    pub fn request_clear(&mut self) {
        if !self.editable() {
            return;
        }
        self.dialog = Some(Dialog::ConfirmClear(ConfirmDialog::new("Clear all coordinates?")));
    }

    // -- configuration --

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn adjust(&mut self, dir: i32) {
        if !self.editable() {
            return;
        }
        self.config.adjust(self.focus, dir);
    }

    // -- playback --

    pub fn start(&mut self) {
        match self.player.start(self.recorder.coordinates(), self.config) {
            StartResult::Started => {}
            StartResult::AlreadyRunning => {}
            StartResult::NoCoordinates => {
                self.dialog = Some(Dialog::Notice(NoticeDialog::new(
                    "Add at least one coordinate.",
                )));
            }
        }
        self.state = self.player.poll();
    }

    pub fn stop(&mut self) {
        self.player.stop();
        self.state = self.player.poll();
    }

    /// Esc: stop a run if one is active, otherwise drop the selection.
    pub fn escape(&mut self) {
        if self.player.is_active() {
            self.stop();
        } else {
            self.clear_selection();
        }
    }

    /// Block until the current run (if any) has ended.
    pub fn wait_for_run(&mut self) {
        self.player.wait();
        self.state = self.player.poll();
    }

    // -- dialogs --

    pub fn dialog_toggle(&mut self) {
        if let Some(Dialog::ConfirmClear(d)) = &mut self.dialog {
            d.toggle();
        }
    }

    /// Enter: take the highlighted answer, or dismiss a notice.
    pub fn dialog_accept(&mut self) {
        match self.dialog.take() {
            Some(Dialog::ConfirmClear(d)) if d.selected => self.clear_confirmed(),
            _ => {}
        }
    }

    pub fn dialog_answer(&mut self, yes: bool) {
        match self.dialog.take() {
            Some(Dialog::ConfirmClear(_)) if yes => self.clear_confirmed(),
            _ => {}
        }
    }

    fn clear_confirmed(&mut self) {
        if !self.editable() {
            return;
        }
        self.recorder.clear();
        self.selected = None;
    }

    // -- log panel --

    pub fn scroll_log_up(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_add(n);
    }

    pub fn scroll_log_down(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    pub fn toggle_log(&mut self) {
        self.log_visible = !self.log_visible;
    }

    pub fn quit(&mut self) {
        self.player.stop();
        self.should_quit = true;
    }

    /// Cancel any active run and wait for its worker.
    pub fn shutdown(&mut self) {
        self.player.shutdown();
    }
}
