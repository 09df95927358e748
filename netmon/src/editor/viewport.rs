//! Pan/zoom transform between screen pixels and graph space.
//!
//! `screen = graph * zoom + pan`, so `graph = (screen - pan) / zoom`.

use netmon_common::{EditorConfig, Point};

/// Pan and zoom of one open canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f64,
    pan: Point,
    min_zoom: f64,
    max_zoom: f64,
}

const DEFAULT_MIN_ZOOM: f64 = 0.1;
const DEFAULT_MAX_ZOOM: f64 = 4.0;

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_ZOOM, DEFAULT_MAX_ZOOM)
    }
}

impl Viewport {
    /// Identity viewport with the given zoom bounds.
    ///
    /// Swapped bounds are reordered; bounds that are not finite and
    /// positive fall back to the defaults.
    pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
        let usable = |z: f64| z.is_finite() && z > 0.0;
        let (min_zoom, max_zoom) = if usable(min_zoom) && usable(max_zoom) {
            (min_zoom.min(max_zoom), min_zoom.max(max_zoom))
        } else {
            tracing::warn!(min_zoom, max_zoom, "Unusable zoom range, using defaults");
            (DEFAULT_MIN_ZOOM, DEFAULT_MAX_ZOOM)
        };
        Self {
            zoom: 1.0_f64.clamp(min_zoom, max_zoom),
            pan: Point::ORIGIN,
            min_zoom,
            max_zoom,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.min_zoom, config.max_zoom)
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn zoom_range(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// Set zoom and pan directly; zoom is clamped.
    pub fn set(&mut self, zoom: f64, pan: Point) {
        self.zoom = self.clamp(zoom);
        self.pan = pan;
    }

    pub fn screen_to_graph(&self, screen: Point) -> Point {
        (screen - self.pan) / self.zoom
    }

    pub fn graph_to_screen(&self, graph: Point) -> Point {
        graph * self.zoom + self.pan
    }

    /// Multiply the zoom by `factor`, keeping `anchor` (screen space) fixed.
    ///
    /// The resulting zoom is clamped to the configured range. Non-finite or
    /// non-positive factors are ignored.
    pub fn zoom_by(&mut self, factor: f64, anchor: Point) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let fixed = self.screen_to_graph(anchor);
        self.zoom = self.clamp(self.zoom * factor);
        self.pan = anchor - fixed * self.zoom;
    }

    /// Translate by a screen-space delta.
    pub fn pan_by(&mut self, delta: Point) {
        self.pan += delta;
    }

    /// Back to zoom 1 and no pan.
    pub fn reset(&mut self) {
        self.zoom = self.clamp(1.0);
        self.pan = Point::ORIGIN;
    }

    pub fn is_identity(&self) -> bool {
        self.zoom == 1.0 && self.pan == Point::ORIGIN
    }

    fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}
