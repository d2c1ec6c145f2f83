//! Recorder and capture-key plumbing against the stub platform.
//!
//!     cargo run -p clickloop-test --bin test-capture

use std::sync::atomic::Ordering;
use std::sync::mpsc;

use libtest_mimic::{Arguments, Failed, Trial};

use clickloop_core::capture::Recorder;
use clickloop_core::platform::hotkey;
use clickloop_core::platform::stub::StubPlatform;
use clickloop_core::platform::Platform;
use clickloop_core::types::*;

fn check(cond: bool, msg: impl Into<String>) -> Result<(), Failed> {
    if cond {
        return Ok(());
    }
    let msg: String = msg.into();
    Err(msg.into())
}

fn capture_from_cursor() -> Result<(), Failed> {
    let platform = StubPlatform::new();
    let mut rec = Recorder::new();
    rec.toggle_capture();
    for (x, y) in [(5, 6), (5, 6), (700, 80)] {
        platform.set_cursor(Coordinate::new(x, y));
        let at = platform.cursor_position().map_err(|e| e.to_string())?;
        rec.capture(at);
    }
    check(rec.len() == 3, format!("{} coordinates", rec.len()))?;

    rec.toggle_capture();
    rec.capture(Coordinate::new(0, 0));
    check(rec.len() == 3, "captured while off")
}

fn remove_then_clear() -> Result<(), Failed> {
    let mut rec = Recorder::new();
    rec.toggle_capture();
    for i in 1..=3 {
        rec.capture(Coordinate::new(i, i));
    }
    rec.remove(1);
    check(
        rec.coordinates() == [Coordinate::new(1, 1), Coordinate::new(3, 3)],
        format!("{:?}", rec.coordinates()),
    )?;
    rec.clear();
    check(rec.is_empty(), "clear left entries")
}

fn listener_starts_and_releases() -> Result<(), Failed> {
    let rec = Recorder::new();
    let flag = rec.capture_flag();
    let (tx, _rx) = mpsc::channel::<CaptureEvent>();
    let listener = hotkey::start_capture_listener(flag.clone(), tx);
    // capture mode stays owned by the recorder
    check(!flag.load(Ordering::Acquire), "listener flipped capture mode")?;
    listener.release();
    Ok(())
}

fn main() {
    let args = Arguments::from_args();
    let tests = vec![
        Trial::test("capture_from_cursor", capture_from_cursor),
        Trial::test("remove_then_clear", remove_then_clear),
        Trial::test("listener_starts_and_releases", listener_starts_and_releases),
    ];
    libtest_mimic::run(&args, tests).exit();
}
