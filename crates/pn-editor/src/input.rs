//! Platform-agnostic input events.
//!
//! Pointer coordinates are in screen space (pixels relative to the SVG
//! root). The editor maps them into graph space itself.

use pn_core::Point;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    /// Pointer left the canvas. Ends a gesture like `PointerUp`.
    PointerLeave { x: f64, y: f64 },
    /// Wheel notch. Negative `delta_y` is a scroll up.
    Wheel { delta_y: f64 },
    /// Keyboard shortcut. `key` is the DOM `KeyboardEvent.key` value.
    Key {
        key: String,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    },
}

impl InputEvent {
    /// Screen position of a pointer event.
    pub fn screen_point(&self) -> Option<Point> {
        match self {
            InputEvent::PointerDown { x, y }
            | InputEvent::PointerMove { x, y }
            | InputEvent::PointerUp { x, y }
            | InputEvent::PointerLeave { x, y } => Some(Point::new(*x, *y)),
            InputEvent::Wheel { .. } | InputEvent::Key { .. } => None,
        }
    }
}
