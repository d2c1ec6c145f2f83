use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crate::types::CancelToken;

const SLICE: Duration = Duration::from_millis(50);

/// Waits between playback actions.
pub trait Sleep: Send + Sync {
    /// Wait for `dur`, or less if `token` is cleared meanwhile.
    fn pause(&self, dur: Duration, token: &CancelToken);
}

/// Real-time sleeper. Sleeps in short slices so a stop request is seen quickly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn pause(&self, dur: Duration, token: &CancelToken) {
        let deadline = Instant::now() + dur;
        loop {
            if !token.is_active() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::sleep((deadline - now).min(SLICE));
        }
    }
}

/// Records requested pauses without waiting. Used by tests.
#[derive(Debug, Default)]
pub struct RecordingSleep {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingSleep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Sleep for RecordingSleep {
    fn pause(&self, dur: Duration, _token: &CancelToken) {
        if let Ok(mut p) = self.pauses.lock() {
            p.push(dur);
        }
    }
}

/// Sleep for exact milliseconds (no cancellation).
pub fn sleep_ms(ms: u64) {
    thread::sleep(Duration::from_millis(ms));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_sleep_returns_early_when_cancelled() {
        let token = CancelToken::new();
        token.stop();
        let start = Instant::now();
        ThreadSleep.pause(Duration::from_secs(5), &token);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn thread_sleep_waits_roughly_the_duration() {
        let token = CancelToken::new();
        let start = Instant::now();
        ThreadSleep.pause(Duration::from_millis(120), &token);
        assert!(start.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn recording_sleep_keeps_order() {
        let s = RecordingSleep::new();
        let token = CancelToken::new();
        s.pause(Duration::from_millis(1), &token);
        s.pause(Duration::from_millis(2), &token);
        assert_eq!(s.pauses(), vec![Duration::from_millis(1), Duration::from_millis(2)]);
    }
}
