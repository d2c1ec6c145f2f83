use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::types::*;
use crate::logger;
use super::{Platform, Pointer};

/// Pointer action observed by the stub backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Move(Coordinate),
    Click(Coordinate),
}

#[derive(Debug)]
struct StubState {
    cursor: Coordinate,
    actions: Vec<PointerAction>,
    // fail the Nth click (1-based, counted across all pointers)
    fail_click: Option<usize>,
    clicks: usize,
}

/// In-memory platform: logs and records every pointer action.
#[derive(Debug, Clone)]
pub struct StubPlatform {
    state: Arc<Mutex<StubState>>,
}

impl StubPlatform {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StubState {
                cursor: Coordinate::new(960, 540),
                actions: Vec::new(),
                fail_click: None,
                clicks: 0,
            })),
        }
    }

    /// Place the simulated cursor (what the next capture will read).
    pub fn set_cursor(&self, at: Coordinate) {
        if let Ok(mut s) = self.state.lock() {
            s.cursor = at;
        }
    }

    /// Make the `n`th click (1-based) fail.
    pub fn fail_click(&self, n: usize) {
        if let Ok(mut s) = self.state.lock() {
            s.fail_click = Some(n);
        }
    }

    pub fn actions(&self) -> Vec<PointerAction> {
        self.state.lock().map(|s| s.actions.clone()).unwrap_or_default()
    }

    /// Positions of every click issued so far, in order.
    pub fn clicks(&self) -> Vec<Coordinate> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                PointerAction::Click(at) => Some(at),
                PointerAction::Move(_) => None,
            })
            .collect()
    }
}

impl Default for StubPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for StubPlatform {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn cursor_position(&self) -> Result<Coordinate> {
        let s = self.state.lock().map_err(|_| anyhow!("stub state poisoned"))?;
        Ok(s.cursor)
    }

    fn create_pointer(&self) -> Box<dyn Pointer> {
        Box::new(StubPointer { state: Arc::clone(&self.state) })
    }
}

struct StubPointer {
    state: Arc<Mutex<StubState>>,
}

impl Pointer for StubPointer {
    fn move_to(&mut self, at: Coordinate) -> Result<()> {
        let mut s = self.state.lock().map_err(|_| anyhow!("stub state poisoned"))?;
        s.cursor = at;
        s.actions.push(PointerAction::Move(at));
        drop(s);
        logger::info_p("stub", &format!("move_to{}", at));
        Ok(())
    }

    fn click(&mut self) -> Result<()> {
        let mut s = self.state.lock().map_err(|_| anyhow!("stub state poisoned"))?;
        s.clicks += 1;
        if s.fail_click == Some(s.clicks) {
            return Err(anyhow!("simulated click failure at {}", s.cursor));
        }
        let at = s.cursor;
        s.actions.push(PointerAction::Click(at));
        drop(s);
        logger::info_p("stub", &format!("click{}", at));
        Ok(())
    }
}
