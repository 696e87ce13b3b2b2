//! In-memory retained scene.
//!
//! Mirrors what a DOM-backed surface would hold, and counts every mutation
//! so callers can check that a no-change reconcile really touched nothing.

use crate::surface::Surface;
use pn_core::{EdgeEndpoints, EdgeKey, Node, NodeId, NodeType, Point, ViewState};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SceneNodeHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SceneEdgeHandle(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub node_type: NodeType,
    pub position: Point,
    pub label: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneEdge {
    pub key: EdgeKey,
    pub endpoints: EdgeEndpoints,
}

#[derive(Debug, Default)]
pub struct RetainedScene {
    next_handle: u64,
    nodes: BTreeMap<SceneNodeHandle, SceneNode>,
    edges: BTreeMap<SceneEdgeHandle, SceneEdge>,
    view: ViewState,
    mutations: usize,
}

impl RetainedScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) -> u64 {
        self.next_handle += 1;
        self.mutations += 1;
        self.next_handle
    }

    /// Total number of surface mutations since creation.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The visual for node `id`, if one exists. Linear scan; for tests and
    /// diagnostics only.
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.values().find(|n| n.id == id)
    }

    pub fn edge(&self, key: EdgeKey) -> Option<&SceneEdge> {
        self.edges.values().find(|e| e.key == key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &SceneEdge> {
        self.edges.values()
    }

    pub fn highlighted(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.highlighted)
            .map(|n| n.id)
            .collect()
    }

    pub fn view(&self) -> ViewState {
        self.view
    }
}

impl Surface for RetainedScene {
    type NodeHandle = SceneNodeHandle;
    type EdgeHandle = SceneEdgeHandle;

    fn create_node(&mut self, node: &Node) -> SceneNodeHandle {
        let handle = SceneNodeHandle(self.bump());
        self.nodes.insert(
            handle,
            SceneNode {
                id: node.id,
                node_type: node.node_type,
                position: node.position,
                label: node.label(),
                highlighted: false,
            },
        );
        handle
    }

    fn move_node(&mut self, handle: &mut SceneNodeHandle, position: Point) {
        if let Some(n) = self.nodes.get_mut(handle) {
            n.position = position;
            self.mutations += 1;
        }
    }

    fn set_label(&mut self, handle: &mut SceneNodeHandle, label: &str) {
        if let Some(n) = self.nodes.get_mut(handle) {
            n.label = label.to_string();
            self.mutations += 1;
        }
    }

    fn set_highlight(&mut self, handle: &mut SceneNodeHandle, highlighted: bool) {
        if let Some(n) = self.nodes.get_mut(handle) {
            n.highlighted = highlighted;
            self.mutations += 1;
        }
    }

    fn remove_node(&mut self, handle: SceneNodeHandle) {
        if self.nodes.remove(&handle).is_some() {
            self.mutations += 1;
        }
    }

    fn create_edge(&mut self, key: EdgeKey, endpoints: EdgeEndpoints) -> SceneEdgeHandle {
        let handle = SceneEdgeHandle(self.bump());
        self.edges.insert(handle, SceneEdge { key, endpoints });
        handle
    }

    fn move_edge(&mut self, handle: &mut SceneEdgeHandle, endpoints: EdgeEndpoints) {
        if let Some(e) = self.edges.get_mut(handle) {
            e.endpoints = endpoints;
            self.mutations += 1;
        }
    }

    fn remove_edge(&mut self, handle: SceneEdgeHandle) {
        if self.edges.remove(&handle).is_some() {
            self.mutations += 1;
        }
    }

    fn set_view(&mut self, view: &ViewState) {
        self.view = *view;
        self.mutations += 1;
    }
}
