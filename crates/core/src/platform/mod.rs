pub mod stub;
pub mod hotkey;

#[cfg(target_os = "macos")]
pub mod darwin;

#[cfg(target_os = "windows")]
pub mod win32;

use std::sync::Arc;

use anyhow::Result;

use crate::types::*;
use crate::logger;

/// Pointer control used by one playback worker.
pub trait Pointer: Send {
    fn move_to(&mut self, at: Coordinate) -> Result<()>;
    /// Single primary-button click at the current position.
    fn click(&mut self) -> Result<()>;
}

/// Platform-level operations (cursor query, pointer factory).
pub trait Platform: Send + Sync {
    fn name(&self) -> &'static str;
    fn cursor_position(&self) -> Result<Coordinate>;
    fn create_pointer(&self) -> Box<dyn Pointer>;
}

/// Create the platform appropriate for the current OS.
pub fn create_platform(force_stub: bool) -> Arc<dyn Platform> {
    if force_stub {
        logger::register_prefix("stub", logger::COLOR_GRAY);
        return Arc::new(stub::StubPlatform::new());
    }
    #[cfg(target_os = "macos")]
    {
        logger::register_prefix("darwin", logger::COLOR_GRAY);
        return Arc::new(darwin::DarwinPlatform);
    }
    #[cfg(target_os = "windows")]
    {
        logger::register_prefix("windows", logger::COLOR_GRAY);
        return Arc::new(win32::WindowsPlatform);
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        logger::register_prefix("stub", logger::COLOR_GRAY);
        logger::warn("no pointer backend for this OS, using stub platform");
        return Arc::new(stub::StubPlatform::new());
    }
}
