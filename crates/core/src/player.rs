use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};

use crate::logger;
use crate::platform::{Platform, Pointer};
use crate::sleep::{Sleep, ThreadSleep};
use crate::types::*;

/// Replay `ctx.coordinates` as clicks, `total x loop` times over.
///
/// The cancel token is polled at the top of every outer and inner
/// iteration and before every pointer move. One delay separates any two
/// consecutive clicks; nothing follows the final click. Pointer failures
/// end the run as `Errored`; clicks already issued stay issued.
pub fn play(ctx: &RunContext, pointer: &mut dyn Pointer, sleeper: &dyn Sleep) -> RunReport {
    let mut clicks = 0;
    let outcome = match run_loops(ctx, pointer, sleeper, &mut clicks) {
        Ok(()) if ctx.token.is_active() => {
            logger::info_p("play", "completed");
            RunOutcome::Completed
        }
        Ok(()) => {
            logger::info_p("play", "stopped");
            RunOutcome::Stopped
        }
        Err(e) => {
            logger::error_p("play", &format!("error: {:#}", e));
            RunOutcome::Errored
        }
    };
    RunReport { outcome, clicks }
}

fn run_loops(
    ctx: &RunContext,
    pointer: &mut dyn Pointer,
    sleeper: &dyn Sleep,
    clicks: &mut u64,
) -> Result<()> {
    let coords = &ctx.coordinates[..];
    let cfg = ctx.config;
    let token = &ctx.token;
    let total = cfg.total_repetitions;
    let loops = cfg.loop_repetitions;

    logger::info_p("play", &format!("starting: {} coords", coords.len()));
    logger::info_p("play", &format!("loop: {}x | total: {}x", loops, total));

    for t in 1..=total {
        if !token.is_active() {
            return Ok(());
        }
        logger::info_p("play", &format!("--- loop {}/{} ---", t, total));

        for l in 1..=loops {
            if !token.is_active() {
                return Ok(());
            }
            logger::info_p("play", &format!("rep {}/{}", l, loops));

            for (i, &at) in coords.iter().enumerate() {
                if !token.is_active() {
                    return Ok(());
                }
                pointer.move_to(at).with_context(|| format!("move to {}", at))?;
                sleeper.pause(SETTLE, token);
                pointer.click().with_context(|| format!("click #{} at {}", i + 1, at))?;
                *clicks += 1;
                logger::info_p("play", &format!("  click #{} {}", i + 1, at));

                let last = t == total && l == loops && i + 1 == coords.len();
                if !last {
                    sleeper.pause(cfg.delay(), token);
                }
            }
        }
    }
    Ok(())
}

/// Owns the (at most one) playback worker thread.
pub struct Player {
    platform: Arc<dyn Platform>,
    sleeper: Arc<dyn Sleep>,
    state: Arc<Mutex<PlayerState>>,
    token: Option<CancelToken>,
    worker: Option<JoinHandle<RunReport>>,
    last_report: Option<RunReport>,
}

impl Player {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self::with_sleeper(platform, Arc::new(ThreadSleep))
    }

    pub fn with_sleeper(platform: Arc<dyn Platform>, sleeper: Arc<dyn Sleep>) -> Self {
        logger::register_prefix("play", logger::COLOR_BLUE);
        Self {
            platform,
            sleeper,
            state: Arc::new(Mutex::new(PlayerState::Idle)),
            token: None,
            worker: None,
            last_report: None,
        }
    }

    /// Current state; reaps a finished worker first.
    pub fn poll(&mut self) -> PlayerState {
        self.reap();
        self.read_state()
    }

    pub fn is_active(&mut self) -> bool {
        self.poll().is_active()
    }

    pub fn last_report(&self) -> Option<RunReport> {
        self.last_report
    }

    /// Start a run over a snapshot of `coordinates` and `config`.
    pub fn start(&mut self, coordinates: &[Coordinate], config: RunConfig) -> StartResult {
        if self.is_active() {
            return StartResult::AlreadyRunning;
        }
        if coordinates.is_empty() {
            logger::warn_p("play", "add at least one coordinate before starting");
            return StartResult::NoCoordinates;
        }

        let ctx = RunContext::new(coordinates, config);
        self.token = Some(ctx.token.clone());
        self.set_state(PlayerState::Running);

        let platform = Arc::clone(&self.platform);
        let sleeper = Arc::clone(&self.sleeper);
        let state = Arc::clone(&self.state);
        self.worker = Some(thread::spawn(move || {
            let mut pointer = platform.create_pointer();
            let report = play(&ctx, pointer.as_mut(), sleeper.as_ref());
            if let Ok(mut s) = state.lock() {
                *s = PlayerState::Finished(report.outcome);
            }
            report
        }));
        StartResult::Started
    }

    /// Clear the active flag. The worker unwinds at its next poll point.
    pub fn stop(&mut self) {
        // Under the lock so a worker finishing right now can't be overwritten
        let Ok(mut state) = self.state.lock() else { return };
        if *state != PlayerState::Running {
            return;
        }
        if let Some(token) = &self.token {
            token.stop();
        }
        *state = PlayerState::Stopping;
        drop(state);
        logger::info_p("play", "stopping...");
    }

    /// Block until the current worker (if any) exits.
    pub fn wait(&mut self) -> Option<RunReport> {
        let worker = self.worker.take()?;
        self.collect(worker);
        self.last_report
    }

    /// Stop any active run and wait for the worker.
    pub fn shutdown(&mut self) {
        self.stop();
        self.wait();
    }

    fn reap(&mut self) {
        if self.worker.as_ref().is_some_and(|w| w.is_finished()) {
            if let Some(worker) = self.worker.take() {
                self.collect(worker);
            }
        }
    }

    fn collect(&mut self, worker: JoinHandle<RunReport>) {
        self.token = None;
        match worker.join() {
            Ok(report) => {
                self.last_report = Some(report);
                self.set_state(PlayerState::Finished(report.outcome));
            }
            Err(_) => {
                logger::error_p("play", "playback worker panicked");
                self.last_report = Some(RunReport { outcome: RunOutcome::Errored, clicks: 0 });
                self.set_state(PlayerState::Finished(RunOutcome::Errored));
            }
        }
    }

    fn read_state(&self) -> PlayerState {
        self.state.lock().map(|s| *s).unwrap_or(PlayerState::Finished(RunOutcome::Errored))
    }

    fn set_state(&self, next: PlayerState) {
        if let Ok(mut s) = self.state.lock() {
            *s = next;
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use anyhow::anyhow;

    use crate::platform::stub::{PointerAction, StubPlatform};
    use crate::sleep::RecordingSleep;

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y)
    }

    fn run(coords: &[Coordinate], cfg: RunConfig) -> (RunReport, StubPlatform, RecordingSleep) {
        let platform = StubPlatform::new();
        let sleeper = RecordingSleep::new();
        let ctx = RunContext::new(coords, cfg);
        let mut pointer = platform.create_pointer();
        let report = play(&ctx, pointer.as_mut(), &sleeper);
        (report, platform, sleeper)
    }

    #[test]
    fn two_coords_two_loops_one_total() {
        let coords = [c(10, 10), c(20, 20)];
        let (report, platform, sleeper) = run(&coords, RunConfig::new(0.5, 2, 1));

        assert_eq!(report, RunReport { outcome: RunOutcome::Completed, clicks: 4 });
        assert_eq!(platform.clicks(), vec![c(10, 10), c(20, 20), c(10, 10), c(20, 20)]);

        let delay = Duration::from_millis(500);
        let waits: Vec<_> = sleeper.pauses().into_iter().filter(|d| *d == delay).collect();
        assert_eq!(waits.len(), 3);
        // final click is the last thing that happens
        assert_eq!(sleeper.pauses().last(), Some(&SETTLE));
    }

    #[test]
    fn move_settles_before_every_click() {
        let (_, platform, sleeper) = run(&[c(1, 2)], RunConfig::new(0.2, 1, 2));
        assert_eq!(
            platform.actions(),
            vec![
                PointerAction::Move(c(1, 2)),
                PointerAction::Click(c(1, 2)),
                PointerAction::Move(c(1, 2)),
                PointerAction::Click(c(1, 2)),
            ]
        );
        assert_eq!(
            sleeper.pauses(),
            vec![SETTLE, Duration::from_millis(200), SETTLE]
        );
    }

    #[test]
    fn click_count_is_total_times_loop_times_len() {
        let coords = [c(0, 0), c(1, 1), c(2, 2)];
        for (t, l) in [(1, 1), (2, 3), (4, 1), (1, 5)] {
            let cfg = RunConfig::new(0.1, l, t);
            let (report, platform, _) = run(&coords, cfg);
            assert_eq!(report.clicks, cfg.expected_clicks(coords.len()));
            assert_eq!(platform.clicks().len() as u64, report.clicks);
        }
    }

    #[test]
    fn cleared_token_issues_nothing() {
        let platform = StubPlatform::new();
        let ctx = RunContext::new(&[c(1, 1)], RunConfig::default());
        ctx.token.stop();
        let mut pointer = platform.create_pointer();
        let report = play(&ctx, pointer.as_mut(), &RecordingSleep::new());
        assert_eq!(report, RunReport { outcome: RunOutcome::Stopped, clicks: 0 });
        assert!(platform.actions().is_empty());
    }

    /// Sleeper that clears the token on its Nth delay-length pause.
    struct StopAfter {
        delay: Duration,
        remaining: Mutex<usize>,
    }

    impl Sleep for StopAfter {
        fn pause(&self, dur: Duration, token: &CancelToken) {
            if dur != self.delay {
                return;
            }
            let mut n = self.remaining.lock().unwrap();
            *n = n.saturating_sub(1);
            if *n == 0 {
                token.stop();
            }
        }
    }

    #[test]
    fn stop_between_actions_halts_at_next_poll() {
        let platform = StubPlatform::new();
        let cfg = RunConfig::new(0.3, 10, 10);
        let ctx = RunContext::new(&[c(1, 1), c(2, 2)], cfg);
        let sleeper = StopAfter { delay: cfg.delay(), remaining: Mutex::new(3) };
        let mut pointer = platform.create_pointer();

        let report = play(&ctx, pointer.as_mut(), &sleeper);
        assert_eq!(report.outcome, RunOutcome::Stopped);
        assert_eq!(report.clicks, 3);
        assert_eq!(platform.clicks().len(), 3);
    }

    #[test]
    fn pointer_failure_errors_and_keeps_prior_clicks() {
        let platform = StubPlatform::new();
        platform.fail_click(3);
        let ctx = RunContext::new(&[c(1, 1), c(2, 2)], RunConfig::new(0.1, 3, 1));
        let mut pointer = platform.create_pointer();

        let report = play(&ctx, pointer.as_mut(), &RecordingSleep::new());
        assert_eq!(report, RunReport { outcome: RunOutcome::Errored, clicks: 2 });
        assert_eq!(platform.clicks(), vec![c(1, 1), c(2, 2)]);
    }

    struct BrokenPointer;

    impl Pointer for BrokenPointer {
        fn move_to(&mut self, _at: Coordinate) -> Result<()> {
            Err(anyhow!("no display"))
        }
        fn click(&mut self) -> Result<()> {
            Err(anyhow!("no display"))
        }
    }

    #[test]
    fn move_failure_issues_no_click() {
        let ctx = RunContext::new(&[c(1, 1)], RunConfig::default());
        let report = play(&ctx, &mut BrokenPointer, &RecordingSleep::new());
        assert_eq!(report, RunReport { outcome: RunOutcome::Errored, clicks: 0 });
    }

    fn instant_player() -> (Player, StubPlatform) {
        let platform = StubPlatform::new();
        let player = Player::with_sleeper(Arc::new(platform.clone()), Arc::new(RecordingSleep::new()));
        (player, platform)
    }

    #[test]
    fn player_rejects_empty_sequence() {
        let (mut player, platform) = instant_player();
        assert_eq!(player.start(&[], RunConfig::default()), StartResult::NoCoordinates);
        assert_eq!(player.poll(), PlayerState::Idle);
        assert!(player.wait().is_none());
        assert!(platform.actions().is_empty());
    }

    #[test]
    fn player_runs_to_completion() {
        let (mut player, platform) = instant_player();
        let coords = [c(5, 5), c(6, 6)];
        assert_eq!(player.start(&coords, RunConfig::new(1.0, 2, 2)), StartResult::Started);

        let report = player.wait().unwrap();
        assert_eq!(report, RunReport { outcome: RunOutcome::Completed, clicks: 8 });
        assert_eq!(player.poll(), PlayerState::Finished(RunOutcome::Completed));
        assert!(!player.is_active());
        assert_eq!(platform.clicks().len(), 8);
    }

    #[test]
    fn player_ignores_second_start_and_stops() {
        let platform = StubPlatform::new();
        // real sleeper with a long delay keeps the first run busy
        let mut player = Player::new(Arc::new(platform.clone()));
        let coords = [c(1, 1), c(2, 2)];
        assert_eq!(player.start(&coords, RunConfig::new(30.0, 1, 1)), StartResult::Started);
        assert_eq!(player.start(&coords, RunConfig::default()), StartResult::AlreadyRunning);

        player.stop();
        assert!(matches!(
            player.poll(),
            PlayerState::Stopping | PlayerState::Finished(RunOutcome::Stopped)
        ));
        let report = player.wait().unwrap();
        assert_eq!(report.outcome, RunOutcome::Stopped);
        assert!(report.clicks <= 1);
        assert_eq!(player.poll(), PlayerState::Finished(RunOutcome::Stopped));
    }

    #[test]
    fn snapshot_is_immune_to_later_edits() {
        let (mut player, platform) = instant_player();
        let mut coords = vec![c(1, 1), c(2, 2)];
        player.start(&coords, RunConfig::default());
        coords.clear();
        coords.push(c(9, 9));
        player.wait();
        assert_eq!(platform.clicks(), vec![c(1, 1), c(2, 2)]);
    }

    #[test]
    fn stop_when_idle_is_noop() {
        let (mut player, _) = instant_player();
        player.stop();
        assert_eq!(player.poll(), PlayerState::Idle);
    }
}
