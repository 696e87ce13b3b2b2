//! Node shapes and edge endpoint clipping.
//!
//! Places render as circles and transitions as axis-aligned squares, both
//! fitting the same bounding box. Edges run centre to centre but are clipped
//! to each node's outline (plus arrowhead clearance) so arrows stop at the
//! boundary instead of the centre.

use crate::model::NodeType;
use kurbo::{Line, Point, Vec2};

/// Endpoints of an edge after clipping against both node outlines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeEndpoints {
    pub start: Point,
    pub end: Point,
}

impl EdgeEndpoints {
    pub fn line(&self) -> Line {
        Line::new(self.start, self.end)
    }
}

/// Distance from a node centre to its outline along direction `dir`
/// (unit vector), for a shape whose half-extent is `margin`.
fn boundary_offset(node_type: NodeType, dir: Vec2, margin: f64) -> f64 {
    match node_type {
        NodeType::Place => margin,
        NodeType::Transition => {
            let along_x = margin / dir.x.abs();
            let along_y = margin / dir.y.abs();
            along_x.min(along_y)
        }
    }
}

/// Clip the centre-to-centre segment against both outlines.
///
/// `margin` is the half-extent of a node plus any arrowhead clearance.
/// Coincident centres yield the centres unchanged.
pub fn edge_endpoints(
    start: Point,
    end: Point,
    start_type: NodeType,
    end_type: NodeType,
    margin: f64,
) -> EdgeEndpoints {
    let delta = end - start;
    let length = delta.hypot();
    if length <= f64::EPSILON {
        return EdgeEndpoints { start, end };
    }
    let dir = delta / length;
    EdgeEndpoints {
        start: start + dir * boundary_offset(start_type, dir, margin),
        end: end - dir * boundary_offset(end_type, dir, margin),
    }
}

/// Whether `point` lies inside the outline of a node centred at `center`
/// whose bounding box is `size` wide.
pub fn shape_contains(node_type: NodeType, center: Point, size: f64, point: Point) -> bool {
    let half = size / 2.0;
    let d = point - center;
    match node_type {
        NodeType::Place => d.hypot2() <= half * half,
        NodeType::Transition => d.x.abs() <= half && d.y.abs() <= half,
    }
}

/// Shortest distance from `point` to the segment `line`.
pub fn distance_to_segment(line: Line, point: Point) -> f64 {
    let seg = line.p1 - line.p0;
    let len2 = seg.hypot2();
    if len2 <= f64::EPSILON {
        return (point - line.p0).hypot();
    }
    let t = ((point - line.p0).dot(seg) / len2).clamp(0.0, 1.0);
    let nearest = line.p0 + seg * t;
    (point - nearest).hypot()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn places_clip_by_radius() {
        let r = 25.0;
        let e = edge_endpoints(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            NodeType::Place,
            NodeType::Place,
            r,
        );
        assert!(close(e.start, Point::new(r, 0.0)), "{e:?}");
        assert!(close(e.end, Point::new(100.0 - r, 0.0)), "{e:?}");
    }

    #[test]
    fn transition_clips_to_square_edge_on_axis() {
        let e = edge_endpoints(
            Point::new(0.0, 0.0),
            Point::new(0.0, 100.0),
            NodeType::Transition,
            NodeType::Transition,
            25.0,
        );
        assert!(close(e.start, Point::new(0.0, 25.0)), "{e:?}");
        assert!(close(e.end, Point::new(0.0, 75.0)), "{e:?}");
    }

    #[test]
    fn transition_clips_to_corner_on_diagonal() {
        // at 45° the square boundary is at the corner: offset = margin·√2
        let e = edge_endpoints(
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
            NodeType::Transition,
            NodeType::Place,
            25.0,
        );
        assert!(close(e.start, Point::new(25.0, 25.0)), "{e:?}");
        let d = 25.0 / 2f64.sqrt();
        assert!(close(e.end, Point::new(100.0 - d, 100.0 - d)), "{e:?}");
    }

    #[test]
    fn coincident_centres_are_left_alone() {
        let p = Point::new(7.0, 7.0);
        let e = edge_endpoints(p, p, NodeType::Place, NodeType::Transition, 25.0);
        assert_eq!(e.start, p);
        assert_eq!(e.end, p);
    }

    #[test]
    fn shapes_contain_points() {
        let c = Point::new(50.0, 50.0);
        // corner of the bounding box: inside the square, outside the circle
        let corner = Point::new(70.0, 70.0);
        assert!(shape_contains(NodeType::Transition, c, 50.0, corner));
        assert!(!shape_contains(NodeType::Place, c, 50.0, corner));
        assert!(shape_contains(NodeType::Place, c, 50.0, Point::new(74.0, 50.0)));
        assert!(!shape_contains(NodeType::Place, c, 50.0, Point::new(76.0, 50.0)));
    }

    #[test]
    fn segment_distance() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!((distance_to_segment(line, Point::new(50.0, 3.0)) - 3.0).abs() < 1e-9);
        assert!((distance_to_segment(line, Point::new(-4.0, 3.0)) - 5.0).abs() < 1e-9);
        assert!((distance_to_segment(line, Point::new(103.0, 4.0)) - 5.0).abs() < 1e-9);
    }
}
