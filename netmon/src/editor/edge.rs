//! Edge path computation.
//!
//! The renderer is pure: given two anchors, a line kind and the selection
//! flag it always yields the same [`PathDescriptor`]. Drawing backends only
//! replay the layers in order.

use netmon_common::document::{MarkerEnd, StrokeStyle};
use netmon_common::{EdgeKind, Point};

/// Arrowhead length in screen pixels.
pub const ARROW_SIZE: f64 = 12.0;

/// Dash pattern of an unselected cable (on, off).
pub const CABLE_DASH: [f64; 2] = [5.0, 5.0];

const UNSELECTED_WIDTH: f64 = 2.5;
const SELECTED_WIDTH: f64 = 3.5;
const SHADOW_EXTRA_WIDTH: f64 = 4.0;
const SHADOW_ALPHA: f32 = 0.2;
const SHEEN_WIDTH: f64 = 1.0;
const SHEEN_ALPHA: f32 = 0.35;

/// 8-bit RGB color with a separate opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// CSS hex notation, ignoring opacity.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Slate, the resting cable color.
pub const CABLE_COLOR: Rgba = Rgba::rgb(0x94, 0xa3, 0xb8);
/// Blue, the selected cable color.
pub const SELECTED_COLOR: Rgba = Rgba::rgb(0x3b, 0x82, 0xf6);
/// Indigo written into persisted edge styles.
pub const STORED_COLOR: Rgba = Rgba::rgb(0x63, 0x66, 0xf1);
const SHEEN_COLOR: Rgba = Rgba::rgb(0xff, 0xff, 0xff);

/// Which part of the cable a stroke layer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    Shadow,
    Main,
    Sheen,
}

/// One stroke over the whole path.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeLayer {
    pub role: LayerRole,
    pub color: Rgba,
    pub width: f64,
    /// `None` draws a solid line.
    pub dash: Option<[f64; 2]>,
}

/// Closed triangle at the target end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrowhead {
    pub tip: Point,
    pub left: Point,
    pub right: Point,
    pub color: Rgba,
}

/// Everything needed to draw one edge, in screen space.
#[derive(Debug, Clone, PartialEq)]
pub struct PathDescriptor {
    /// Polyline from source anchor to target anchor.
    pub points: Vec<Point>,
    /// Strokes, bottom to top.
    pub layers: Vec<StrokeLayer>,
    pub arrow: Option<Arrowhead>,
}

impl PathDescriptor {
    /// Distance from `point` to the nearest segment of the path.
    pub fn distance_to(&self, point: Point) -> f64 {
        match self.points.as_slice() {
            [] => f64::INFINITY,
            [only] => point.distance(*only),
            points => points
                .windows(2)
                .map(|pair| point.distance_to_segment(pair[0], pair[1]))
                .fold(f64::INFINITY, f64::min),
        }
    }

    pub fn main_layer(&self) -> Option<&StrokeLayer> {
        self.layers.iter().find(|l| l.role == LayerRole::Main)
    }
}

/// Cable path between two anchors: shadow, main stroke, sheen, arrowhead.
pub fn compute_cable_path(source: Point, target: Point, selected: bool) -> PathDescriptor {
    layered(vec![source, target], selected)
}

/// Path for any edge kind between two node centers (screen space).
///
/// Anchors are pulled back along the first and last segments by
/// `node_radius` so the arrowhead stays outside the target node.
pub fn compute_edge_path(
    kind: EdgeKind,
    source_center: Point,
    target_center: Point,
    node_radius: f64,
    selected: bool,
) -> PathDescriptor {
    let route = match kind {
        EdgeKind::Cable | EdgeKind::Straight => vec![source_center, target_center],
        EdgeKind::Step => step_route(source_center, target_center),
    };
    let points = clip_to_nodes(route, node_radius);

    match kind {
        EdgeKind::Cable | EdgeKind::Step => layered(points, selected),
        EdgeKind::Straight => {
            let main = main_layer(selected, false);
            let arrow = arrowhead(&points, main.color);
            PathDescriptor {
                points,
                layers: vec![main],
                arrow,
            }
        }
    }
}

/// Style persisted with an edge of the given kind.
pub fn stored_style(kind: EdgeKind) -> (StrokeStyle, MarkerEnd) {
    let width = match kind {
        EdgeKind::Cable => 4.0,
        EdgeKind::Straight | EdgeKind::Step => 2.5,
    };
    (
        StrokeStyle {
            stroke: STORED_COLOR.hex(),
            stroke_width: width,
        },
        MarkerEnd {
            marker_type: "arrowclosed".to_string(),
            width: 24.0,
            height: 24.0,
            color: STORED_COLOR.hex(),
        },
    )
}

fn layered(points: Vec<Point>, selected: bool) -> PathDescriptor {
    let main = main_layer(selected, true);
    let shadow = StrokeLayer {
        role: LayerRole::Shadow,
        color: main.color.with_alpha(SHADOW_ALPHA),
        width: main.width + SHADOW_EXTRA_WIDTH,
        dash: None,
    };
    let sheen = StrokeLayer {
        role: LayerRole::Sheen,
        color: SHEEN_COLOR.with_alpha(SHEEN_ALPHA),
        width: SHEEN_WIDTH,
        dash: main.dash,
    };
    let arrow = arrowhead(&points, main.color);

    PathDescriptor {
        points,
        layers: vec![shadow, main, sheen],
        arrow,
    }
}

fn main_layer(selected: bool, dashed_at_rest: bool) -> StrokeLayer {
    if selected {
        StrokeLayer {
            role: LayerRole::Main,
            color: SELECTED_COLOR,
            width: SELECTED_WIDTH,
            dash: None,
        }
    } else {
        StrokeLayer {
            role: LayerRole::Main,
            color: CABLE_COLOR,
            width: UNSELECTED_WIDTH,
            dash: dashed_at_rest.then_some(CABLE_DASH),
        }
    }
}

/// Horizontal, vertical, horizontal through the midpoint x.
fn step_route(source: Point, target: Point) -> Vec<Point> {
    let mid_x = (source.x + target.x) / 2.0;
    vec![
        source,
        Point::new(mid_x, source.y),
        Point::new(mid_x, target.y),
        target,
    ]
}

/// Pull both ends of a polyline in by `radius`.
///
/// Overlapping nodes keep their centers as anchors.
pub fn clip_to_nodes(mut points: Vec<Point>, radius: f64) -> Vec<Point> {
    if points.len() < 2 || radius <= 0.0 {
        return points;
    }
    let first = points[0];
    let last = points[points.len() - 1];
    if first.distance(last) <= radius * 2.0 {
        return points;
    }

    if let Some(next) = points.iter().skip(1).copied().find(|p| p.distance(first) > f64::EPSILON)
    {
        points[0] = clip_anchor(first, next, radius);
    }
    let end = points.len() - 1;
    if let Some(prev) = points
        .iter()
        .rev()
        .skip(1)
        .copied()
        .find(|p| p.distance(last) > f64::EPSILON)
    {
        points[end] = clip_anchor(last, prev, radius);
    }
    points
}

/// Move `center` toward `toward` by at most `radius`.
pub fn clip_anchor(center: Point, toward: Point, radius: f64) -> Point {
    let delta = toward - center;
    match delta.normalized() {
        Some(direction) => center + direction * radius.min(delta.length()),
        None => center,
    }
}

fn arrowhead(points: &[Point], color: Rgba) -> Option<Arrowhead> {
    let tip = *points.last()?;
    let from = points
        .iter()
        .rev()
        .skip(1)
        .copied()
        .find(|p| p.distance(tip) > f64::EPSILON)?;
    let direction = (tip - from).normalized()?;
    let base = tip - direction * ARROW_SIZE;
    let half = direction.perpendicular() * (ARROW_SIZE / 2.0);

    Some(Arrowhead {
        tip,
        left: base + half,
        right: base - half,
        color,
    })
}
