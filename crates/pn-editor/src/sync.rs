//! Model reconciler: keeps the rendered scene in step with server snapshots.
//!
//! Every `update_model` carries the whole model. Rather than rebuild the
//! scene, the reconciler diffs the snapshot against what it has rendered and
//! applies the minimal set of surface operations:
//!
//! 1. nodes gone from the snapshot are removed, with every edge touching them
//! 2. new nodes are created
//! 3. surviving nodes are updated in place (label, position)
//! 4. edges gone from the snapshot are removed
//! 5. new edges are created; surviving edges get fresh endpoints
//!
//! Nodes always settle before edges, so edge geometry is derived from the
//! new positions. The surface is only touched where something visible
//! changed, which makes reconciling the same snapshot twice a no-op.
//!
//! Structure is never read back from the surface: the reconciler owns an
//! index from `NodeId` and `EdgeKey` to view handles.

use pn_core::{EdgeEndpoints, EdgeKey, Model, NodeId, NodeType, Point, edge_endpoints};
use pn_render::{HitShape, Surface};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};

struct NodeEntry<H> {
    handle: H,
    node_type: NodeType,
    /// Where the surface currently draws the node centre.
    position: Point,
    label: String,
}

struct EdgeEntry<H> {
    handle: H,
    endpoints: EdgeEndpoints,
}

/// What one reconcile pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub nodes_added: Vec<NodeId>,
    pub nodes_removed: Vec<NodeId>,
    pub nodes_updated: Vec<NodeId>,
    pub edges_added: Vec<EdgeKey>,
    pub edges_removed: Vec<EdgeKey>,
    pub edges_updated: Vec<EdgeKey>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.nodes_added.is_empty()
            && self.nodes_removed.is_empty()
            && self.nodes_updated.is_empty()
            && self.edges_added.is_empty()
            && self.edges_removed.is_empty()
            && self.edges_updated.is_empty()
    }

    pub fn removed(&self, id: NodeId) -> bool {
        self.nodes_removed.contains(&id)
    }
}

pub struct Reconciler<S: Surface> {
    nodes: HashMap<NodeId, NodeEntry<S::NodeHandle>>,
    /// Draw order, back to front.
    order: Vec<NodeId>,
    /// Keyed in `EdgeKey` order, so edge hit testing breaks ties stably.
    edges: BTreeMap<EdgeKey, EdgeEntry<S::EdgeHandle>>,
    incident: HashMap<NodeId, SmallVec<[EdgeKey; 4]>>,
    /// Node held at its local drag position through reconciliation.
    pinned: Option<NodeId>,
    highlighted: Option<NodeId>,
    /// Centre-to-endpoint offset for edges.
    margin: f64,
}

impl<S: Surface> Reconciler<S> {
    pub fn new(margin: f64) -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            edges: BTreeMap::new(),
            incident: HashMap::new(),
            pinned: None,
            highlighted: None,
            margin,
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_rendered(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn has_edge(&self, key: EdgeKey) -> bool {
        self.edges.contains_key(&key)
    }

    pub fn rendered_position(&self, id: NodeId) -> Option<Point> {
        self.nodes.get(&id).map(|n| n.position)
    }

    pub fn pinned(&self) -> Option<NodeId> {
        self.pinned
    }

    pub fn highlighted(&self) -> Option<NodeId> {
        self.highlighted
    }

    /// Rendered nodes in draw order, for hit testing.
    pub fn hit_shapes(&self) -> Vec<HitShape> {
        self.order
            .iter()
            .filter_map(|id| {
                self.nodes.get(id).map(|n| HitShape {
                    id: *id,
                    node_type: n.node_type,
                    center: n.position,
                })
            })
            .collect()
    }

    /// Rendered edge segments, for hit testing.
    pub fn edge_lines(&self) -> impl Iterator<Item = (EdgeKey, pn_core::Line)> + '_ {
        self.edges.iter().map(|(key, e)| (*key, e.endpoints.line()))
    }

    // ─── Reconcile ───────────────────────────────────────────────────────

    /// Bring the surface in line with `model`.
    pub fn reconcile(&mut self, model: &Model, surface: &mut S) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut moved: Vec<NodeId> = Vec::new();

        // 1. removed nodes, and their edges
        let gone: Vec<NodeId> = self
            .order
            .iter()
            .copied()
            .filter(|id| !model.contains(*id))
            .collect();
        for id in gone {
            self.remove_node(id, surface, &mut report);
        }

        for node in model.nodes() {
            match self.nodes.get_mut(&node.id) {
                // 2. new nodes
                None => {
                    let handle = surface.create_node(node);
                    self.nodes.insert(
                        node.id,
                        NodeEntry {
                            handle,
                            node_type: node.node_type,
                            position: node.position,
                            label: node.label(),
                        },
                    );
                    self.order.push(node.id);
                    report.nodes_added.push(node.id);
                }
                // 3. surviving nodes, in place
                Some(entry) => {
                    let mut changed = false;
                    let label = node.label();
                    if entry.label != label {
                        surface.set_label(&mut entry.handle, &label);
                        entry.label = label;
                        changed = true;
                    }
                    if self.pinned != Some(node.id) && entry.position != node.position {
                        surface.move_node(&mut entry.handle, node.position);
                        entry.position = node.position;
                        moved.push(node.id);
                        changed = true;
                    }
                    if changed {
                        report.nodes_updated.push(node.id);
                    }
                }
            }
        }

        // 4. removed edges
        let stale: Vec<EdgeKey> = self
            .edges
            .keys()
            .copied()
            .filter(|key| !model.has_edge(*key))
            .collect();
        for key in stale {
            self.remove_edge(key, surface);
            report.edges_removed.push(key);
        }

        // 5. new edges, and geometry of surviving ones
        for key in model.edges() {
            let Some(endpoints) = self.endpoints_for(key) else {
                continue;
            };
            match self.edges.get_mut(&key) {
                None => {
                    let handle = surface.create_edge(key, endpoints);
                    self.edges.insert(key, EdgeEntry { handle, endpoints });
                    self.incident.entry(key.start).or_default().push(key);
                    if key.end != key.start {
                        self.incident.entry(key.end).or_default().push(key);
                    }
                    report.edges_added.push(key);
                }
                Some(entry) => {
                    if entry.endpoints != endpoints {
                        surface.move_edge(&mut entry.handle, endpoints);
                        entry.endpoints = endpoints;
                        report.edges_updated.push(key);
                    }
                }
            }
        }

        if !report.is_empty() {
            log::debug!(
                "reconciled: +{} -{} ~{} nodes, +{} -{} ~{} edges ({} nodes moved)",
                report.nodes_added.len(),
                report.nodes_removed.len(),
                report.nodes_updated.len(),
                report.edges_added.len(),
                report.edges_removed.len(),
                report.edges_updated.len(),
                moved.len(),
            );
        }
        report
    }

    fn endpoints_for(&self, key: EdgeKey) -> Option<EdgeEndpoints> {
        let start = self.nodes.get(&key.start)?;
        let end = self.nodes.get(&key.end)?;
        Some(edge_endpoints(
            start.position,
            end.position,
            start.node_type,
            end.node_type,
            self.margin,
        ))
    }

    fn remove_node(&mut self, id: NodeId, surface: &mut S, report: &mut ReconcileReport) {
        let Some(entry) = self.nodes.remove(&id) else {
            return;
        };
        surface.remove_node(entry.handle);
        self.order.retain(|n| *n != id);
        for key in self.incident.remove(&id).unwrap_or_default() {
            if self.edges.contains_key(&key) {
                self.remove_edge(key, surface);
                report.edges_removed.push(key);
            }
        }
        if self.pinned == Some(id) {
            self.pinned = None;
        }
        if self.highlighted == Some(id) {
            self.highlighted = None;
        }
        report.nodes_removed.push(id);
    }

    fn remove_edge(&mut self, key: EdgeKey, surface: &mut S) {
        if let Some(entry) = self.edges.remove(&key) {
            surface.remove_edge(entry.handle);
        }
        for id in [key.start, key.end] {
            if let Some(list) = self.incident.get_mut(&id) {
                list.retain(|k| *k != key);
            }
        }
    }

    // ─── Local drag ──────────────────────────────────────────────────────

    /// Hold `id` at its rendered position until `release`.
    pub fn pin(&mut self, id: NodeId) {
        if self.nodes.contains_key(&id) {
            self.pinned = Some(id);
        }
    }

    /// Move a node and its incident edges locally, without a snapshot.
    /// Returns false if the node is not rendered.
    pub fn preview_move(&mut self, id: NodeId, position: Point, surface: &mut S) -> bool {
        let Some(entry) = self.nodes.get_mut(&id) else {
            return false;
        };
        if entry.position != position {
            surface.move_node(&mut entry.handle, position);
            entry.position = position;
            self.refresh_incident(id, surface);
        }
        true
    }

    /// End a drag. An uncommitted drag snaps back to the snapshot position;
    /// a committed one stays where it was dropped until the server answers.
    pub fn release(&mut self, id: NodeId, committed: bool, model: &Model, surface: &mut S) {
        if self.pinned == Some(id) {
            self.pinned = None;
        }
        if committed {
            return;
        }
        if let Some(node) = model.node(id) {
            self.preview_move(id, node.position, surface);
        }
    }

    fn refresh_incident(&mut self, id: NodeId, surface: &mut S) {
        let keys = self.incident.get(&id).cloned().unwrap_or_default();
        for key in keys {
            let Some(endpoints) = self.endpoints_for(key) else {
                continue;
            };
            if let Some(entry) = self.edges.get_mut(&key) {
                if entry.endpoints != endpoints {
                    surface.move_edge(&mut entry.handle, endpoints);
                    entry.endpoints = endpoints;
                }
            }
        }
    }

    // ─── Selection highlight ─────────────────────────────────────────────

    /// Move the selection highlight to `id` (or clear it).
    pub fn highlight(&mut self, id: Option<NodeId>, surface: &mut S) {
        let id = id.filter(|id| self.nodes.contains_key(id));
        if id == self.highlighted {
            return;
        }
        if let Some(old) = self.highlighted.take() {
            if let Some(entry) = self.nodes.get_mut(&old) {
                surface.set_highlight(&mut entry.handle, false);
            }
        }
        if let Some(new) = id {
            if let Some(entry) = self.nodes.get_mut(&new) {
                surface.set_highlight(&mut entry.handle, true);
            }
        }
        self.highlighted = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pn_core::{ModelPayload, Node, WireEdge};
    use pn_render::RetainedScene;
    use pretty_assertions::assert_eq;

    const MARGIN: f64 = 29.0;

    fn snapshot(nodes: &[(u32, NodeType, f64, f64, u32)], edges: &[(u32, u32)]) -> Model {
        let mut payload = ModelPayload::default();
        for &(id, node_type, x, y, balls) in nodes {
            payload.nodes.insert(
                NodeId(id),
                Node::new(NodeId(id), node_type, Point::new(x, y)).with_balls(balls),
            );
        }
        payload.edges = edges
            .iter()
            .map(|&(s, e)| WireEdge {
                start_node_id: NodeId(s),
                end_node_id: NodeId(e),
            })
            .collect();
        Model::from_payload(payload)
    }

    fn two_nodes() -> Model {
        snapshot(
            &[
                (1, NodeType::Place, 0.0, 0.0, 2),
                (2, NodeType::Transition, 200.0, 0.0, 0),
            ],
            &[(1, 2)],
        )
    }

    #[test]
    fn first_reconcile_creates_everything() {
        let mut scene = RetainedScene::new();
        let mut rec = Reconciler::new(MARGIN);
        let report = rec.reconcile(&two_nodes(), &mut scene);

        assert_eq!(report.nodes_added, vec![NodeId(1), NodeId(2)]);
        assert_eq!(report.edges_added.len(), 1);
        assert_eq!(scene.node_count(), 2);
        assert_eq!(scene.edge_count(), 1);
        let edge = scene.edge(EdgeKey::new(NodeId(1), NodeId(2))).unwrap();
        assert_eq!(edge.endpoints.start, Point::new(MARGIN, 0.0));
        assert_eq!(edge.endpoints.end, Point::new(200.0 - MARGIN, 0.0));
    }

    #[test]
    fn same_snapshot_twice_touches_nothing() {
        let mut scene = RetainedScene::new();
        let mut rec = Reconciler::new(MARGIN);
        let model = two_nodes();
        rec.reconcile(&model, &mut scene);
        let before = scene.mutation_count();

        let report = rec.reconcile(&model, &mut scene);
        assert!(report.is_empty(), "{report:?}");
        assert_eq!(scene.mutation_count(), before);
    }

    #[test]
    fn surviving_nodes_update_in_place() {
        let mut scene = RetainedScene::new();
        let mut rec = Reconciler::new(MARGIN);
        rec.reconcile(&two_nodes(), &mut scene);
        let moved = snapshot(
            &[
                (1, NodeType::Place, 0.0, 100.0, 5),
                (2, NodeType::Transition, 200.0, 0.0, 0),
            ],
            &[(1, 2)],
        );

        let report = rec.reconcile(&moved, &mut scene);
        assert_eq!(report.nodes_added, vec![]);
        assert_eq!(report.nodes_removed, vec![]);
        assert_eq!(report.nodes_updated, vec![NodeId(1)]);
        assert_eq!(report.edges_updated, vec![EdgeKey::new(NodeId(1), NodeId(2))]);

        let node = scene.node(NodeId(1)).unwrap();
        assert_eq!(node.label, "5");
        assert_eq!(node.position, Point::new(0.0, 100.0));
    }

    #[test]
    fn removing_a_node_removes_its_edges() {
        let mut scene = RetainedScene::new();
        let mut rec = Reconciler::new(MARGIN);
        rec.reconcile(
            &snapshot(
                &[
                    (1, NodeType::Place, 0.0, 0.0, 0),
                    (2, NodeType::Transition, 100.0, 0.0, 0),
                    (3, NodeType::Place, 200.0, 0.0, 0),
                ],
                &[(1, 2), (2, 3)],
            ),
            &mut scene,
        );

        let report = rec.reconcile(
            &snapshot(
                &[
                    (1, NodeType::Place, 0.0, 0.0, 0),
                    (3, NodeType::Place, 200.0, 0.0, 0),
                ],
                &[],
            ),
            &mut scene,
        );
        assert_eq!(report.nodes_removed, vec![NodeId(2)]);
        assert_eq!(report.edges_removed.len(), 2);
        assert_eq!(scene.edge_count(), 0);
        assert_eq!(rec.edge_count(), 0);
        assert!(rec.is_rendered(NodeId(3)));
    }

    #[test]
    fn highlight_survives_and_clears() {
        let mut scene = RetainedScene::new();
        let mut rec = Reconciler::new(MARGIN);
        rec.reconcile(&two_nodes(), &mut scene);
        rec.highlight(Some(NodeId(1)), &mut scene);

        let moved = snapshot(
            &[
                (1, NodeType::Place, 50.0, 50.0, 2),
                (2, NodeType::Transition, 200.0, 0.0, 0),
            ],
            &[],
        );
        rec.reconcile(&moved, &mut scene);
        assert_eq!(scene.highlighted(), vec![NodeId(1)]);
        assert_eq!(rec.highlighted(), Some(NodeId(1)));

        let without = snapshot(&[(2, NodeType::Transition, 200.0, 0.0, 0)], &[]);
        let report = rec.reconcile(&without, &mut scene);
        assert!(report.removed(NodeId(1)));
        assert_eq!(rec.highlighted(), None);
        assert!(scene.highlighted().is_empty());
    }

    #[test]
    fn pinned_node_keeps_its_drag_position() {
        let mut scene = RetainedScene::new();
        let mut rec = Reconciler::new(MARGIN);
        let model = two_nodes();
        rec.reconcile(&model, &mut scene);

        rec.pin(NodeId(1));
        assert!(rec.preview_move(NodeId(1), Point::new(0.0, 80.0), &mut scene));

        // another collaborator changes the token count meanwhile
        let update = snapshot(
            &[
                (1, NodeType::Place, 0.0, 0.0, 9),
                (2, NodeType::Transition, 200.0, 0.0, 0),
            ],
            &[(1, 2)],
        );
        rec.reconcile(&update, &mut scene);
        let node = scene.node(NodeId(1)).unwrap();
        assert_eq!(node.position, Point::new(0.0, 80.0));
        assert_eq!(node.label, "9");

        // uncommitted release snaps back
        rec.release(NodeId(1), false, &update, &mut scene);
        assert_eq!(rec.pinned(), None);
        assert_eq!(scene.node(NodeId(1)).unwrap().position, Point::ORIGIN);
    }

    #[test]
    fn preview_moves_incident_edges() {
        let mut scene = RetainedScene::new();
        let mut rec = Reconciler::new(MARGIN);
        rec.reconcile(&two_nodes(), &mut scene);
        rec.preview_move(NodeId(2), Point::new(0.0, 200.0), &mut scene);

        let edge = scene.edge(EdgeKey::new(NodeId(1), NodeId(2))).unwrap();
        assert_eq!(edge.endpoints.start, Point::new(0.0, MARGIN));
        assert_eq!(edge.endpoints.end, Point::new(0.0, 200.0 - MARGIN));
        assert!(!rec.preview_move(NodeId(42), Point::ORIGIN, &mut scene));
    }

    #[test]
    fn hit_shapes_follow_draw_order() {
        let mut scene = RetainedScene::new();
        let mut rec = Reconciler::new(MARGIN);
        rec.reconcile(&two_nodes(), &mut scene);
        rec.reconcile(
            &snapshot(
                &[
                    (1, NodeType::Place, 0.0, 0.0, 2),
                    (2, NodeType::Transition, 200.0, 0.0, 0),
                    (0, NodeType::Place, 10.0, 0.0, 0),
                ],
                &[],
            ),
            &mut scene,
        );
        let ids: Vec<NodeId> = rec.hit_shapes().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(0)]);
    }

    #[test]
    fn edge_lines_follow_key_order() {
        let mut scene = RetainedScene::new();
        let mut rec = Reconciler::new(MARGIN);
        rec.reconcile(
            &snapshot(
                &[
                    (1, NodeType::Place, 0.0, 0.0, 0),
                    (2, NodeType::Transition, 200.0, 0.0, 0),
                    (3, NodeType::Place, 100.0, 100.0, 0),
                ],
                &[(3, 2), (1, 2), (2, 3)],
            ),
            &mut scene,
        );
        let keys: Vec<EdgeKey> = rec.edge_lines().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            vec![
                EdgeKey::new(NodeId(1), NodeId(2)),
                EdgeKey::new(NodeId(2), NodeId(3)),
                EdgeKey::new(NodeId(3), NodeId(2)),
            ]
        );
    }
}
