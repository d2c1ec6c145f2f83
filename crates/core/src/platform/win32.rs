use std::mem::size_of;

use anyhow::{anyhow, Context, Result};
use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
    MOUSE_EVENT_FLAGS, MOUSEINPUT,
};
use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, SetCursorPos};

use crate::logger;
use crate::sleep;
use crate::types::*;
use super::{Platform, Pointer};

pub(crate) fn current_location() -> Result<Coordinate> {
    let mut pt = POINT::default();
    unsafe { GetCursorPos(&mut pt) }.context("GetCursorPos failed")?;
    Ok(Coordinate::new(pt.x, pt.y))
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(flags: MOUSE_EVENT_FLAGS) -> Result<()> {
    let inputs = [mouse_input(flags)];
    let sent = unsafe { SendInput(&inputs, size_of::<INPUT>() as i32) };
    if sent != inputs.len() as u32 {
        return Err(anyhow!("SendInput injected {} of {} events", sent, inputs.len()));
    }
    Ok(())
}

pub struct WindowsPlatform;

impl Platform for WindowsPlatform {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn cursor_position(&self) -> Result<Coordinate> {
        current_location()
    }

    fn create_pointer(&self) -> Box<dyn Pointer> {
        Box::new(WindowsPointer)
    }
}

struct WindowsPointer;

impl Pointer for WindowsPointer {
    fn move_to(&mut self, at: Coordinate) -> Result<()> {
        unsafe { SetCursorPos(at.x, at.y) }.with_context(|| format!("SetCursorPos{} failed", at))
    }

    fn click(&mut self) -> Result<()> {
        send(MOUSEEVENTF_LEFTDOWN)?;
        sleep::sleep_ms(15);
        send(MOUSEEVENTF_LEFTUP)?;
        if let Ok(at) = current_location() {
            logger::info_p("windows", &format!("click{}", at));
        }
        Ok(())
    }
}
