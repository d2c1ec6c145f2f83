use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Screen position in global display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

pub const DELAY_MIN: f64 = 0.1;
pub const DELAY_MAX: f64 = 60.0;
pub const DELAY_STEP: f64 = 0.1;
pub const REPS_MIN: u32 = 1;
pub const REPS_MAX: u32 = 1000;

/// Pause between moving the pointer and clicking
pub const SETTLE: Duration = Duration::from_millis(100);

/// Delay and repeat counts for one playback run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfig {
    pub delay_secs: f64,
    pub loop_repetitions: u32,
    pub total_repetitions: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { delay_secs: 1.0, loop_repetitions: 1, total_repetitions: 1 }
    }
}

impl RunConfig {
    /// Build a config, clamping every field into its allowed range.
    pub fn new(delay_secs: f64, loop_repetitions: u32, total_repetitions: u32) -> Self {
        Self {
            delay_secs: clamp_delay(delay_secs),
            loop_repetitions: loop_repetitions.clamp(REPS_MIN, REPS_MAX),
            total_repetitions: total_repetitions.clamp(REPS_MIN, REPS_MAX),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_secs)
    }

    /// Clicks an uninterrupted run issues for `coords` recorded positions.
    pub fn expected_clicks(&self, coords: usize) -> u64 {
        self.total_repetitions as u64 * self.loop_repetitions as u64 * coords as u64
    }

    /// Step one field up (`dir > 0`) or down (`dir < 0`).
    pub fn adjust(&mut self, field: ConfigField, dir: i32) {
        match field {
            ConfigField::Delay => {
                self.delay_secs = clamp_delay(self.delay_secs + DELAY_STEP * dir.signum() as f64);
            }
            ConfigField::LoopRepetitions => {
                self.loop_repetitions = step_reps(self.loop_repetitions, dir);
            }
            ConfigField::TotalRepetitions => {
                self.total_repetitions = step_reps(self.total_repetitions, dir);
            }
        }
    }
}

fn clamp_delay(secs: f64) -> f64 {
    if !secs.is_finite() {
        return RunConfig::default().delay_secs;
    }
    // round to one decimal so repeated steps don't drift (0.30000000000000004)
    let rounded = (secs * 10.0).round() / 10.0;
    rounded.clamp(DELAY_MIN, DELAY_MAX)
}

fn step_reps(value: u32, dir: i32) -> u32 {
    let next = if dir < 0 { value.saturating_sub(1) } else { value.saturating_add(1) };
    next.clamp(REPS_MIN, REPS_MAX)
}

/// Editable run configuration field, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Delay,
    LoopRepetitions,
    TotalRepetitions,
}

impl ConfigField {
    pub const ALL: [ConfigField; 3] =
        [ConfigField::Delay, ConfigField::LoopRepetitions, ConfigField::TotalRepetitions];

    pub fn next(self) -> Self {
        match self {
            ConfigField::Delay => ConfigField::LoopRepetitions,
            ConfigField::LoopRepetitions => ConfigField::TotalRepetitions,
            ConfigField::TotalRepetitions => ConfigField::Delay,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfigField::Delay => "Delay (s)",
            ConfigField::LoopRepetitions => "Loop reps",
            ConfigField::TotalRepetitions => "Total reps",
        }
    }
}

/// Per-run active flag. Cleared once, by stop or shutdown; never set again.
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a playback worker needs, frozen at start time
#[derive(Debug, Clone)]
pub struct RunContext {
    pub coordinates: Arc<[Coordinate]>,
    pub config: RunConfig,
    pub token: CancelToken,
}

impl RunContext {
    pub fn new(coordinates: &[Coordinate], config: RunConfig) -> Self {
        Self {
            coordinates: Arc::from(coordinates),
            config,
            token: CancelToken::new(),
        }
    }
}

/// How a playback run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Stopped,
    Errored,
}

/// Result of one playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub clicks: u64,
}

/// Player lifecycle as seen by the interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Running,
    Stopping,
    Finished(RunOutcome),
}

impl PlayerState {
    /// A worker thread exists and has not yet unwound.
    pub fn is_active(self) -> bool {
        matches!(self, PlayerState::Running | PlayerState::Stopping)
    }
}

/// Answer to a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartResult {
    Started,
    AlreadyRunning,
    NoCoordinates,
}

/// Published by the capture-key observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    PositionCaptured(Coordinate),
}
