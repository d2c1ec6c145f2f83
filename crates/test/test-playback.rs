//! End-to-end playback scenarios against the stub platform.
//!
//!     cargo run -p clickloop-test --bin test-playback

use std::sync::Arc;
use std::time::{Duration, Instant};

use libtest_mimic::{Arguments, Failed, Trial};

use clickloop_core::platform::stub::StubPlatform;
use clickloop_core::player::Player;
use clickloop_core::sleep::RecordingSleep;
use clickloop_core::types::*;

fn c(x: i32, y: i32) -> Coordinate {
    Coordinate::new(x, y)
}

fn check(cond: bool, msg: impl Into<String>) -> Result<(), Failed> {
    if cond {
        return Ok(());
    }
    let msg: String = msg.into();
    Err(msg.into())
}

fn instant_player() -> (Player, StubPlatform, Arc<RecordingSleep>) {
    let platform = StubPlatform::new();
    let sleeper = Arc::new(RecordingSleep::new());
    let player = Player::with_sleeper(Arc::new(platform.clone()), sleeper.clone());
    (player, platform, sleeper)
}

fn documented_example() -> Result<(), Failed> {
    let (mut player, platform, sleeper) = instant_player();
    let started = player.start(&[c(10, 10), c(20, 20)], RunConfig::new(0.5, 2, 1));
    check(started == StartResult::Started, format!("start returned {:?}", started))?;

    let report = player.wait().ok_or("no report")?;
    check(report.outcome == RunOutcome::Completed, format!("{:?}", report))?;

    let clicks = platform.clicks();
    check(
        clicks == vec![c(10, 10), c(20, 20), c(10, 10), c(20, 20)],
        format!("clicks {:?}", clicks),
    )?;

    let waits = sleeper.pauses().into_iter().filter(|d| *d == Duration::from_millis(500)).count();
    check(waits == 3, format!("{} delay waits", waits))
}

fn click_count_grid() -> Result<(), Failed> {
    let coords = [c(1, 1), c(2, 2), c(3, 3), c(4, 4)];
    for total in [1, 2, 5] {
        for loops in [1, 3] {
            let (mut player, platform, _) = instant_player();
            let cfg = RunConfig::new(0.1, loops, total);
            player.start(&coords, cfg);
            let report = player.wait().ok_or("no report")?;
            let want = cfg.expected_clicks(coords.len());
            check(report.clicks == want, format!("T={} L={}: {} != {}", total, loops, report.clicks, want))?;
            check(platform.clicks().len() as u64 == want, "stub saw a different count")?;
        }
    }
    Ok(())
}

fn empty_start_is_rejected() -> Result<(), Failed> {
    let (mut player, platform, _) = instant_player();
    let r = player.start(&[], RunConfig::default());
    check(r == StartResult::NoCoordinates, format!("{:?}", r))?;
    check(player.poll() == PlayerState::Idle, "state changed")?;
    check(platform.actions().is_empty(), "pointer touched")
}

fn stop_with_real_delays() -> Result<(), Failed> {
    let platform = StubPlatform::new();
    let mut player = Player::new(Arc::new(platform.clone()));
    player.start(&[c(1, 1), c(2, 2)], RunConfig::new(10.0, 100, 100));

    std::thread::sleep(Duration::from_millis(300));
    let before = platform.clicks().len();
    let t0 = Instant::now();
    player.stop();
    let report = player.wait().ok_or("no report")?;

    check(report.outcome == RunOutcome::Stopped, format!("{:?}", report))?;
    check(t0.elapsed() < Duration::from_secs(2), "stop took too long")?;
    // at most the click already past its last poll point
    check(platform.clicks().len() <= before + 1, "clicks kept coming after stop")
}

fn failure_resets_for_next_run() -> Result<(), Failed> {
    let (mut player, platform, _) = instant_player();
    platform.fail_click(2);
    player.start(&[c(1, 1), c(2, 2)], RunConfig::default());
    let report = player.wait().ok_or("no report")?;
    check(report.outcome == RunOutcome::Errored, format!("{:?}", report))?;
    check(player.poll() == PlayerState::Finished(RunOutcome::Errored), "state not errored")?;

    let again = player.start(&[c(3, 3)], RunConfig::default());
    check(again == StartResult::Started, "could not start after error")?;
    let report = player.wait().ok_or("no report")?;
    check(report.outcome == RunOutcome::Completed, format!("{:?}", report))
}

fn main() {
    let args = Arguments::from_args();
    let tests = vec![
        Trial::test("documented_example", documented_example),
        Trial::test("click_count_grid", click_count_grid),
        Trial::test("empty_start_is_rejected", empty_start_is_rejected),
        Trial::test("stop_with_real_delays", stop_with_real_delays),
        Trial::test("failure_resets_for_next_run", failure_resets_for_next_run),
    ];
    libtest_mimic::run(&args, tests).exit();
}
