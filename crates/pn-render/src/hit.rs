//! Hit testing in graph space.

use pn_core::geometry::{distance_to_segment, shape_contains};
use pn_core::{EdgeKey, Line, NodeId, NodeType, Point};

/// What the hit tester needs to know about one drawn node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitShape {
    pub id: NodeId,
    pub node_type: NodeType,
    pub center: Point,
}

/// Topmost node whose outline contains `point`.
///
/// `shapes` are in draw order (back to front), so the last hit wins.
pub fn hit_test<'a>(
    shapes: impl IntoIterator<Item = &'a HitShape>,
    point: Point,
    size: f64,
) -> Option<NodeId> {
    shapes
        .into_iter()
        .filter(|s| shape_contains(s.node_type, s.center, size, point))
        .last()
        .map(|s| s.id)
}

/// Nearest edge within `tolerance` of `point`.
pub fn hit_test_edge(
    edges: impl IntoIterator<Item = (EdgeKey, Line)>,
    point: Point,
    tolerance: f64,
) -> Option<EdgeKey> {
    let mut best: Option<(EdgeKey, f64)> = None;
    for (key, line) in edges {
        let d = distance_to_segment(line, point);
        if d > tolerance {
            continue;
        }
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((key, d));
        }
    }
    best.map(|(key, _)| key)
}
