//! Viewport ↔ graph-space mapping.
//!
//! The view applies `scale(zoom)` followed by `translate(pan / zoom)`, the
//! translation being expressed in pre-scale units. Composed, a graph point
//! lands on screen at `zoom · p + pan`, so a pointer drag of `d` screen
//! pixels pans by exactly `d` whatever the zoom level.

use kurbo::{Affine, Point, Vec2};

pub const MIN_ZOOM: f64 = 0.125;
pub const MAX_ZOOM: f64 = 4.0;

/// Local pan/zoom state. Never synchronized with the server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// Screen-space translation.
    pub pan: Vec2,
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewState {
    pub fn new(pan: Vec2, zoom: f64) -> Self {
        Self { pan, zoom }
    }

    /// Graph → screen affine map.
    pub fn affine(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(self.pan / self.zoom)
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Multiply zoom by `factor`, clamped to `[min, max]`. The origin of the
    /// coordinate system stays fixed.
    pub fn zoom_by(&mut self, factor: f64, min: f64, max: f64) {
        self.zoom = (self.zoom * factor).clamp(min, max);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Map a screen point into graph space.
pub fn to_graph_space(screen: Point, view: &ViewState) -> Point {
    // inverse of `zoom · p + pan`, written out to avoid the general 2×2 inverse
    Point::new(
        (screen.x - view.pan.x) / view.zoom,
        (screen.y - view.pan.y) / view.zoom,
    )
}

/// Map a graph point onto the screen.
pub fn to_screen_space(graph: Point, view: &ViewState) -> Point {
    view.affine() * graph
}

/// Zoom multiplier for one wheel event. Scrolling up (negative `delta_y`)
/// zooms in; a zero delta leaves the zoom unchanged.
pub fn wheel_factor(delta_y: f64, step: f64) -> f64 {
    if delta_y < 0.0 {
        step
    } else if delta_y > 0.0 {
        1.0 / step
    } else {
        1.0
    }
}

/// SVG `transform` attribute value for the view.
pub fn svg_transform(view: &ViewState) -> String {
    let shift = view.pan / view.zoom;
    format!(
        "scale({}) translate({} {})",
        view.zoom, shift.x, shift.y
    )
}
