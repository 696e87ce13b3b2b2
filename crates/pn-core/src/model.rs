//! Petri-net data model as seen by the client.
//!
//! The server owns the model. The client only ever holds the last snapshot it
//! received, rebuilt from scratch on each `update_model` event. Edges are kept
//! in a `DiGraphMap`, which stores at most one edge per ordered node pair, so
//! the uniqueness invariant holds by construction even if the wire repeats an
//! edge.

use crate::id::{EdgeKey, NodeId};
use kurbo::Point;
use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Logical graph-space coordinates of a node centre.
pub type Position = Point;

// ─── Nodes ───────────────────────────────────────────────────────────────

/// The two node kinds of a Petri net. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Place,
    Transition,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Place => "place",
            NodeType::Transition => "transition",
        }
    }
}

/// A node of the authoritative model. Unknown wire fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub position: Position,
    /// Token count. Only meaningful for places.
    #[serde(default)]
    pub ball_count: u32,
    #[serde(default)]
    pub name: String,
}

impl Node {
    pub fn new(id: NodeId, node_type: NodeType, position: Position) -> Self {
        Self {
            id,
            node_type,
            position,
            ball_count: 0,
            name: format!("Node#{}", id.get()),
        }
    }

    pub fn with_balls(mut self, ball_count: u32) -> Self {
        self.ball_count = ball_count;
        self
    }

    /// Text shown inside the node shape: the token count for places,
    /// nothing for transitions.
    pub fn label(&self) -> String {
        match self.node_type {
            NodeType::Place => self.ball_count.to_string(),
            NodeType::Transition => String::new(),
        }
    }
}

// ─── Wire payload ────────────────────────────────────────────────────────

/// Edge as transmitted: ids only. Geometry is always derived client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEdge {
    pub start_node_id: NodeId,
    pub end_node_id: NodeId,
}

impl WireEdge {
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.start_node_id, self.end_node_id)
    }
}

/// Body of an `update_model` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPayload {
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, Node>,
    #[serde(default)]
    pub edges: Vec<WireEdge>,
}

// ─── Authoritative snapshot ──────────────────────────────────────────────

/// A complete, self-consistent node + edge set pushed by the server.
#[derive(Debug, Clone, Default)]
pub struct Model {
    nodes: BTreeMap<NodeId, Node>,
    edges: DiGraphMap<NodeId, ()>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from its wire form.
    ///
    /// Edges naming a node absent from the snapshot are dropped; repeated
    /// `(start, end)` pairs collapse into one edge.
    pub fn from_payload(payload: ModelPayload) -> Self {
        let mut model = Model::new();
        for (key, mut node) in payload.nodes {
            if node.id != key {
                log::warn!("node keyed {key} carries id {}; using the key", node.id);
                node.id = key;
            }
            model.insert_node(node);
        }
        for edge in payload.edges {
            if !model.insert_edge(edge.key()) {
                log::warn!("dropping edge {:?} from snapshot", edge.key());
            }
        }
        model
    }

    pub fn to_payload(&self) -> ModelPayload {
        ModelPayload {
            nodes: self.nodes.clone(),
            edges: self
                .edges()
                .map(|key| WireEdge {
                    start_node_id: key.start,
                    end_node_id: key.end,
                })
                .collect(),
        }
    }

    pub fn insert_node(&mut self, node: Node) {
        self.edges.add_node(node.id);
        self.nodes.insert(node.id, node);
    }

    /// Add the edge `(start, end)`. Returns `false` if either endpoint is
    /// unknown or the pair already exists.
    pub fn insert_edge(&mut self, key: EdgeKey) -> bool {
        if !self.nodes.contains_key(&key.start) || !self.nodes.contains_key(&key.end) {
            return false;
        }
        if self.edges.contains_edge(key.start, key.end) {
            return false;
        }
        self.edges.add_edge(key.start, key.end, ());
        true
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in the order they were received.
    pub fn edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges
            .all_edges()
            .map(|(start, end, _)| EdgeKey::new(start, end))
    }

    pub fn has_edge(&self, key: EdgeKey) -> bool {
        self.edges.contains_edge(key.start, key.end)
    }

    /// Every edge with `id` as either endpoint.
    pub fn incident(&self, id: NodeId) -> SmallVec<[EdgeKey; 4]> {
        if !self.edges.contains_node(id) {
            return SmallVec::new();
        }
        let outgoing = self
            .edges
            .neighbors_directed(id, Direction::Outgoing)
            .map(move |end| EdgeKey::new(id, end));
        let incoming = self
            .edges
            .neighbors_directed(id, Direction::Incoming)
            .filter(move |start| *start != id)
            .map(move |start| EdgeKey::new(start, id));
        outgoing.chain(incoming).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
