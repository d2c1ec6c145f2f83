use anyhow::{anyhow, Result};
use core_graphics::event::*;
use core_graphics::event_source::*;
use core_graphics::geometry::*;

use crate::logger;
use crate::sleep;
use crate::types::*;
use super::{Platform, Pointer};

fn event_source() -> Result<CGEventSource> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|_| anyhow!("failed to create CGEventSource"))
}

fn to_point(at: Coordinate) -> CGPoint {
    CGPoint::new(at.x as f64, at.y as f64)
}

/// Current cursor location, read from an empty event.
fn current_location() -> Result<Coordinate> {
    let event = CGEvent::new(event_source()?).map_err(|_| anyhow!("failed to create CGEvent"))?;
    let p = event.location();
    Ok(Coordinate::new(p.x.round() as i32, p.y.round() as i32))
}

pub struct DarwinPlatform;

impl Platform for DarwinPlatform {
    fn name(&self) -> &'static str {
        "darwin"
    }

    fn cursor_position(&self) -> Result<Coordinate> {
        current_location()
    }

    fn create_pointer(&self) -> Box<dyn Pointer> {
        Box::new(DarwinPointer { at: None })
    }
}

struct DarwinPointer {
    at: Option<Coordinate>,
}

impl DarwinPointer {
    fn post_mouse(&self, kind: CGEventType, at: Coordinate) -> Result<()> {
        let event = CGEvent::new_mouse_event(event_source()?, kind, to_point(at), CGMouseButton::Left)
            .map_err(|_| anyhow!("failed to create mouse event at {}", at))?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

impl Pointer for DarwinPointer {
    fn move_to(&mut self, at: Coordinate) -> Result<()> {
        self.post_mouse(CGEventType::MouseMoved, at)?;
        self.at = Some(at);
        Ok(())
    }

    fn click(&mut self) -> Result<()> {
        let at = match self.at {
            Some(at) => at,
            None => current_location()?,
        };
        self.post_mouse(CGEventType::LeftMouseDown, at)?;
        sleep::sleep_ms(15);
        self.post_mouse(CGEventType::LeftMouseUp, at)?;
        logger::info_p("darwin", &format!("click{}", at));
        Ok(())
    }
}
