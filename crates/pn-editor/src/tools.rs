//! Tool system for canvas interactions.
//!
//! Each editing mode has one tool. A tool sees pointer events (already
//! hit-tested and mapped into graph space) and answers with `Action`s: wire
//! intents, selection changes, and local-only drag/pan updates. Tools never
//! touch the model or the surface themselves.
//!
//! | Mode | Pointer-down on node | Pointer-down on background |
//! |------|----------------------|----------------------------|
//! | Move | select + start drag | deselect + start pan |
//! | CreatePlace / CreateTransition | create at pointer | create at pointer |
//! | Connect | pick start / complete edge | nothing |
//! | Delete | delete node | delete edge under pointer |

use crate::commands::Intent;
use pn_core::{EdgeKey, NodeId, NodeType, Point, Vec2};
use smallvec::{SmallVec, smallvec};

/// The active editing mode. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditingMode {
    #[default]
    Move,
    CreatePlace,
    CreateTransition,
    Connect,
    Delete,
}

impl EditingMode {
    /// Mode after the user activates `requested` while in `self`:
    /// activating the current mode reverts to `Move`.
    pub fn toggled(self, requested: EditingMode) -> EditingMode {
        if requested == self {
            EditingMode::Move
        } else {
            requested
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EditingMode::Move => "move",
            EditingMode::CreatePlace => "create_place",
            EditingMode::CreateTransition => "create_transition",
            EditingMode::Connect => "connect",
            EditingMode::Delete => "delete",
        }
    }

    pub fn parse(name: &str) -> Option<EditingMode> {
        match name {
            "move" => Some(EditingMode::Move),
            "create_place" | "place" => Some(EditingMode::CreatePlace),
            "create_transition" | "transition" => Some(EditingMode::CreateTransition),
            "connect" => Some(EditingMode::Connect),
            "delete" => Some(EditingMode::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Leave,
}

/// A pointer position in both coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub screen: Point,
    pub graph: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeHit {
    pub id: NodeId,
    /// Rendered centre of the node.
    pub center: Point,
}

/// What lies under the pointer. Only filled in for pointer-down.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Hit {
    pub node: Option<NodeHit>,
    pub edge: Option<EdgeKey>,
}

impl Hit {
    pub const NOTHING: Hit = Hit {
        node: None,
        edge: None,
    };
}

/// Effect requested by a tool. Applied by the editor in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send to the server.
    Emit(Intent),
    Select(Option<NodeId>),
    /// Pin `id` at its rendered position for the duration of a drag.
    BeginDrag { id: NodeId },
    /// Optimistic local move; never sent.
    PreviewMove { id: NodeId, position: Point },
    /// Drag finished. `committed` is true when a move intent was emitted.
    EndDrag { id: NodeId, committed: bool },
    /// Screen-space pan delta.
    Pan(Vec2),
}

pub type Actions = SmallVec<[Action; 2]>;

/// Trait for tools that turn pointer input into actions.
pub trait Tool {
    fn mode(&self) -> EditingMode;

    fn handle(&mut self, phase: PointerPhase, pointer: Pointer, hit: &Hit) -> Actions;

    /// Drop any in-progress state without emitting anything.
    fn cancel(&mut self) -> Actions {
        Actions::new()
    }
}

// ─── Move Tool ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    None,
    MovingNode {
        id: NodeId,
        /// Node centre minus pointer, graph space.
        grab_offset: Vec2,
        /// Pre-drag position, for no-op suppression.
        start: Point,
        current: Point,
    },
    MovingGraph {
        last: Point,
    },
}

pub struct MoveTool {
    gesture: Gesture,
    drag_nodes: bool,
}

impl Default for MoveTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveTool {
    pub fn new() -> Self {
        Self {
            gesture: Gesture::None,
            drag_nodes: true,
        }
    }

    /// A move tool that selects and pans but never drags nodes.
    pub fn read_only() -> Self {
        Self {
            gesture: Gesture::None,
            drag_nodes: false,
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Node currently being dragged.
    pub fn dragging(&self) -> Option<NodeId> {
        match self.gesture {
            Gesture::MovingNode { id, .. } => Some(id),
            _ => None,
        }
    }

    fn finish(&mut self) -> Actions {
        match std::mem::take(&mut self.gesture) {
            Gesture::MovingNode {
                id, start, current, ..
            } => {
                if current == start {
                    log::debug!("drag of {id} ended where it started; nothing to send");
                    smallvec![Action::EndDrag {
                        id,
                        committed: false
                    }]
                } else {
                    smallvec![
                        Action::Emit(Intent::MoveNode {
                            id,
                            position: current
                        }),
                        Action::EndDrag {
                            id,
                            committed: true
                        },
                    ]
                }
            }
            Gesture::MovingGraph { .. } | Gesture::None => Actions::new(),
        }
    }
}

impl Tool for MoveTool {
    fn mode(&self) -> EditingMode {
        EditingMode::Move
    }

    fn handle(&mut self, phase: PointerPhase, pointer: Pointer, hit: &Hit) -> Actions {
        match phase {
            PointerPhase::Down => {
                // a second down without an up (lost pointer capture) ends the first gesture
                let mut actions = self.finish();
                match hit.node {
                    Some(node) => {
                        actions.push(Action::Select(Some(node.id)));
                        if self.drag_nodes {
                            self.gesture = Gesture::MovingNode {
                                id: node.id,
                                grab_offset: node.center - pointer.graph,
                                start: node.center,
                                current: node.center,
                            };
                            actions.push(Action::BeginDrag { id: node.id });
                        }
                    }
                    None => {
                        actions.push(Action::Select(None));
                        self.gesture = Gesture::MovingGraph {
                            last: pointer.screen,
                        };
                    }
                }
                actions
            }
            PointerPhase::Move => match &mut self.gesture {
                Gesture::MovingNode {
                    id,
                    grab_offset,
                    current,
                    ..
                } => {
                    *current = pointer.graph + *grab_offset;
                    smallvec![Action::PreviewMove {
                        id: *id,
                        position: *current
                    }]
                }
                Gesture::MovingGraph { last } => {
                    let delta = pointer.screen - *last;
                    *last = pointer.screen;
                    if delta == Vec2::ZERO {
                        Actions::new()
                    } else {
                        smallvec![Action::Pan(delta)]
                    }
                }
                Gesture::None => Actions::new(),
            },
            PointerPhase::Up | PointerPhase::Leave => self.finish(),
        }
    }

    fn cancel(&mut self) -> Actions {
        match std::mem::take(&mut self.gesture) {
            Gesture::MovingNode { id, .. } => smallvec![Action::EndDrag {
                id,
                committed: false
            }],
            Gesture::MovingGraph { .. } | Gesture::None => Actions::new(),
        }
    }
}

// ─── Create Tool ─────────────────────────────────────────────────────────

/// Creates one node per click. Used for both node kinds.
pub struct CreateTool {
    node_type: NodeType,
}

impl CreateTool {
    pub fn new(node_type: NodeType) -> Self {
        Self { node_type }
    }
}

impl Tool for CreateTool {
    fn mode(&self) -> EditingMode {
        match self.node_type {
            NodeType::Place => EditingMode::CreatePlace,
            NodeType::Transition => EditingMode::CreateTransition,
        }
    }

    fn handle(&mut self, phase: PointerPhase, pointer: Pointer, _hit: &Hit) -> Actions {
        match phase {
            PointerPhase::Down => smallvec![Action::Emit(Intent::CreateNode {
                node_type: self.node_type,
                position: pointer.graph,
            })],
            _ => Actions::new(),
        }
    }
}

// ─── Connect Tool ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ConnectTool {
    pending: Option<NodeId>,
}

impl ConnectTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start node of the half-made edge.
    pub fn pending(&self) -> Option<NodeId> {
        self.pending
    }
}

impl Tool for ConnectTool {
    fn mode(&self) -> EditingMode {
        EditingMode::Connect
    }

    fn handle(&mut self, phase: PointerPhase, _pointer: Pointer, hit: &Hit) -> Actions {
        let (PointerPhase::Down, Some(node)) = (phase, hit.node) else {
            return Actions::new();
        };
        match self.pending {
            None => {
                self.pending = Some(node.id);
                smallvec![Action::Select(Some(node.id))]
            }
            Some(start) if start == node.id => Actions::new(),
            Some(start) => {
                self.pending = None;
                smallvec![
                    Action::Emit(Intent::CreateEdge {
                        start,
                        end: node.id
                    }),
                    Action::Select(None),
                ]
            }
        }
    }

    fn cancel(&mut self) -> Actions {
        self.pending = None;
        Actions::new()
    }
}

// ─── Delete Tool ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct DeleteTool;

impl Tool for DeleteTool {
    fn mode(&self) -> EditingMode {
        EditingMode::Delete
    }

    fn handle(&mut self, phase: PointerPhase, _pointer: Pointer, hit: &Hit) -> Actions {
        if phase != PointerPhase::Down {
            return Actions::new();
        }
        match (hit.node, hit.edge) {
            (Some(node), _) => smallvec![Action::Emit(Intent::DeleteNode { id: node.id })],
            (None, Some(key)) => smallvec![Action::Emit(Intent::DeleteEdge { key })],
            (None, None) => Actions::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(x: f64, y: f64) -> Pointer {
        Pointer {
            screen: Point::new(x, y),
            graph: Point::new(x, y),
        }
    }

    fn on_node(id: u32, x: f64, y: f64) -> Hit {
        Hit {
            node: Some(NodeHit {
                id: NodeId(id),
                center: Point::new(x, y),
            }),
            edge: None,
        }
    }

    fn emitted(actions: &Actions) -> Vec<Intent> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Emit(intent) => Some(intent.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn mode_toggle_self_cancels() {
        let mode = EditingMode::Move.toggled(EditingMode::CreatePlace);
        assert_eq!(mode, EditingMode::CreatePlace);
        assert_eq!(mode.toggled(EditingMode::CreatePlace), EditingMode::Move);
        assert_eq!(mode.toggled(EditingMode::Connect), EditingMode::Connect);
        assert_eq!(EditingMode::Move.toggled(EditingMode::Move), EditingMode::Move);
    }

    #[test]
    fn mode_names_parse_back() {
        for mode in [
            EditingMode::Move,
            EditingMode::CreatePlace,
            EditingMode::CreateTransition,
            EditingMode::Connect,
            EditingMode::Delete,
        ] {
            assert_eq!(EditingMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(EditingMode::parse("simulate"), None);
    }

    #[test]
    fn drag_emits_move_with_grab_offset() {
        let mut tool = MoveTool::new();
        // grab the node 5px right of its centre
        let down = tool.handle(PointerPhase::Down, at(105.0, 100.0), &on_node(1, 100.0, 100.0));
        assert_eq!(
            down.as_slice(),
            &[
                Action::Select(Some(NodeId(1))),
                Action::BeginDrag { id: NodeId(1) }
            ]
        );

        let moved = tool.handle(PointerPhase::Move, at(155.0, 120.0), &Hit::NOTHING);
        assert_eq!(
            moved.as_slice(),
            &[Action::PreviewMove {
                id: NodeId(1),
                position: Point::new(150.0, 120.0)
            }]
        );

        let up = tool.handle(PointerPhase::Up, at(155.0, 120.0), &Hit::NOTHING);
        assert_eq!(
            emitted(&up),
            vec![Intent::MoveNode {
                id: NodeId(1),
                position: Point::new(150.0, 120.0)
            }]
        );
        assert_eq!(tool.gesture(), Gesture::None);
    }

    #[test]
    fn drag_back_to_start_emits_nothing() {
        let mut tool = MoveTool::new();
        tool.handle(PointerPhase::Down, at(100.0, 100.0), &on_node(1, 100.0, 100.0));
        tool.handle(PointerPhase::Move, at(180.0, 30.0), &Hit::NOTHING);
        tool.handle(PointerPhase::Move, at(100.0, 100.0), &Hit::NOTHING);
        let up = tool.handle(PointerPhase::Up, at(100.0, 100.0), &Hit::NOTHING);
        assert!(emitted(&up).is_empty());
        assert_eq!(
            up.as_slice(),
            &[Action::EndDrag {
                id: NodeId(1),
                committed: false
            }]
        );
    }

    #[test]
    fn click_without_move_emits_nothing() {
        let mut tool = MoveTool::new();
        tool.handle(PointerPhase::Down, at(10.0, 10.0), &on_node(4, 12.0, 12.0));
        let leave = tool.handle(PointerPhase::Leave, at(10.0, 10.0), &Hit::NOTHING);
        assert!(emitted(&leave).is_empty());
    }

    #[test]
    fn leave_ends_drag_like_up() {
        let mut tool = MoveTool::new();
        tool.handle(PointerPhase::Down, at(0.0, 0.0), &on_node(2, 0.0, 0.0));
        tool.handle(PointerPhase::Move, at(30.0, 0.0), &Hit::NOTHING);
        let leave = tool.handle(PointerPhase::Leave, at(30.0, 0.0), &Hit::NOTHING);
        assert_eq!(emitted(&leave).len(), 1);
    }

    #[test]
    fn background_drag_pans_in_screen_space() {
        let mut tool = MoveTool::new();
        let down = tool.handle(PointerPhase::Down, at(10.0, 10.0), &Hit::NOTHING);
        assert_eq!(down.as_slice(), &[Action::Select(None)]);
        let pan = tool.handle(PointerPhase::Move, at(25.0, 5.0), &Hit::NOTHING);
        assert_eq!(pan.as_slice(), &[Action::Pan(Vec2::new(15.0, -5.0))]);
        let up = tool.handle(PointerPhase::Up, at(25.0, 5.0), &Hit::NOTHING);
        assert!(up.is_empty());
    }

    #[test]
    fn read_only_move_tool_selects_without_dragging() {
        let mut tool = MoveTool::read_only();
        let down = tool.handle(PointerPhase::Down, at(0.0, 0.0), &on_node(3, 0.0, 0.0));
        assert_eq!(down.as_slice(), &[Action::Select(Some(NodeId(3)))]);
        assert!(tool.handle(PointerPhase::Move, at(50.0, 0.0), &Hit::NOTHING).is_empty());
    }

    #[test]
    fn cancel_releases_drag_without_emit() {
        let mut tool = MoveTool::new();
        tool.handle(PointerPhase::Down, at(0.0, 0.0), &on_node(2, 0.0, 0.0));
        tool.handle(PointerPhase::Move, at(30.0, 0.0), &Hit::NOTHING);
        let cancelled = tool.cancel();
        assert_eq!(
            cancelled.as_slice(),
            &[Action::EndDrag {
                id: NodeId(2),
                committed: false
            }]
        );
        assert!(tool.handle(PointerPhase::Up, at(30.0, 0.0), &Hit::NOTHING).is_empty());
    }

    #[test]
    fn create_tool_emits_at_graph_point() {
        let mut tool = CreateTool::new(NodeType::Transition);
        let pointer = Pointer {
            screen: Point::new(100.0, 100.0),
            graph: Point::new(40.0, 40.0),
        };
        let actions = tool.handle(PointerPhase::Down, pointer, &Hit::NOTHING);
        assert_eq!(
            emitted(&actions),
            vec![Intent::CreateNode {
                node_type: NodeType::Transition,
                position: Point::new(40.0, 40.0)
            }]
        );
        assert_eq!(tool.mode(), EditingMode::CreateTransition);
    }

    #[test]
    fn connect_picks_then_completes() {
        let mut tool = ConnectTool::new();
        let first = tool.handle(PointerPhase::Down, at(0.0, 0.0), &on_node(1, 0.0, 0.0));
        assert_eq!(first.as_slice(), &[Action::Select(Some(NodeId(1)))]);
        assert_eq!(tool.pending(), Some(NodeId(1)));

        // same node again: nothing
        assert!(
            tool.handle(PointerPhase::Down, at(0.0, 0.0), &on_node(1, 0.0, 0.0))
                .is_empty()
        );
        // background: nothing, pick kept
        assert!(
            tool.handle(PointerPhase::Down, at(500.0, 0.0), &Hit::NOTHING)
                .is_empty()
        );

        let second = tool.handle(PointerPhase::Down, at(100.0, 0.0), &on_node(2, 100.0, 0.0));
        assert_eq!(
            emitted(&second),
            vec![Intent::CreateEdge {
                start: NodeId(1),
                end: NodeId(2)
            }]
        );
        assert_eq!(tool.pending(), None);
    }

    #[test]
    fn delete_prefers_node_over_edge() {
        let mut tool = DeleteTool;
        let key = EdgeKey::new(NodeId(1), NodeId(2));
        let mut hit = on_node(1, 0.0, 0.0);
        hit.edge = Some(key);
        assert_eq!(
            emitted(&tool.handle(PointerPhase::Down, at(0.0, 0.0), &hit)),
            vec![Intent::DeleteNode { id: NodeId(1) }]
        );
        let edge_only = Hit {
            node: None,
            edge: Some(key),
        };
        assert_eq!(
            emitted(&tool.handle(PointerPhase::Down, at(50.0, 0.0), &edge_only)),
            vec![Intent::DeleteEdge { key }]
        );
        assert!(
            tool.handle(PointerPhase::Down, at(50.0, 90.0), &Hit::NOTHING)
                .is_empty()
        );
    }
}
