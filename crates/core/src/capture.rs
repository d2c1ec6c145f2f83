use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::logger;
use crate::platform::hotkey::CAPTURE_KEY;
use crate::types::Coordinate;

/// Ordered list of captured pointer positions plus the capture-mode switch.
///
/// The capture-mode flag is shared with the key listener thread so it can
/// skip sampling while capture is off. The coordinate list itself is only
/// touched from the interface thread.
pub struct Recorder {
    coordinates: Vec<Coordinate>,
    capturing: Arc<AtomicBool>,
}

impl Recorder {
    pub fn new() -> Self {
        logger::register_prefix("capture", logger::COLOR_GREEN);
        Self { coordinates: Vec::new(), capturing: Arc::new(AtomicBool::new(false)) }
    }

    /// Flag handed to the key listener.
    pub fn capture_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.capturing)
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Acquire)
    }

    /// Flip capture mode. Returns the new state. Existing coordinates are kept.
    pub fn toggle_capture(&mut self) -> bool {
        let on = !self.is_capturing();
        self.capturing.store(on, Ordering::Release);
        if on {
            logger::info_p("capture", &format!("capture enabled, press '{}' to save", CAPTURE_KEY));
        } else {
            logger::info_p("capture", "capture disabled");
        }
        on
    }

    /// Append `at` if capture mode is on. Returns its 1-based number.
    pub fn capture(&mut self, at: Coordinate) -> Option<usize> {
        if !self.is_capturing() {
            return None;
        }
        self.coordinates.push(at);
        let n = self.coordinates.len();
        logger::info_p("capture", &format!("#{}: {}", n, at));
        Some(n)
    }

    /// Remove the entry at 0-based `index`.
    pub fn remove(&mut self, index: usize) -> Option<Coordinate> {
        if index >= self.coordinates.len() {
            return None;
        }
        let removed = self.coordinates.remove(index);
        logger::info_p("capture", &format!("removed: {}", removed));
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.coordinates.clear();
        logger::info_p("capture", "coordinates cleared");
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y)
    }

    #[test]
    fn capture_only_while_enabled() {
        let mut rec = Recorder::new();
        assert_eq!(rec.capture(c(1, 1)), None);

        assert!(rec.toggle_capture());
        assert_eq!(rec.capture(c(1, 1)), Some(1));
        assert_eq!(rec.capture(c(1, 1)), Some(2)); // no dedup

        assert!(!rec.toggle_capture());
        assert_eq!(rec.capture(c(5, 5)), None);
        assert_eq!(rec.coordinates(), &[c(1, 1), c(1, 1)]);
    }

    #[test]
    fn flag_is_shared_with_listener() {
        let mut rec = Recorder::new();
        let flag = rec.capture_flag();
        rec.toggle_capture();
        assert!(flag.load(Ordering::Acquire));
    }

    #[test]
    fn remove_second_of_three() {
        let mut rec = Recorder::new();
        rec.toggle_capture();
        for i in 1..=3 {
            rec.capture(c(i, i));
        }
        // #2 in the 1-based display is index 1
        assert_eq!(rec.remove(1), Some(c(2, 2)));
        assert_eq!(rec.coordinates(), &[c(1, 1), c(3, 3)]);
        assert_eq!(rec.remove(7), None);
    }

    #[test]
    fn clear_empties_everything() {
        let mut rec = Recorder::new();
        rec.toggle_capture();
        rec.capture(c(4, 2));
        rec.capture(c(9, 9));
        rec.clear();
        assert!(rec.is_empty());
        assert!(rec.is_capturing());
    }
}
