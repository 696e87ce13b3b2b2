//! Editing intents and server-side history availability.
//!
//! An `Intent` is what a tool or shortcut wants to happen. It is turned into
//! a wire `Request` only at the channel boundary. Undo/redo history lives on
//! the server; the client only mirrors whether each direction is available.

use pn_core::protocol::CreateNodeKwargs;
use pn_core::{Command, EdgeKey, NodeId, NodeType, Point, Request};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    CreateNode { node_type: NodeType, position: Point },
    CreateEdge { start: NodeId, end: NodeId },
    MoveNode { id: NodeId, position: Point },
    DeleteNode { id: NodeId },
    DeleteEdge { key: EdgeKey },
    ClearModel,
    SaveModel,
    /// Inspector edits, forwarded without local validation.
    UpdateProperties {
        id: NodeId,
        fields: BTreeMap<String, serde_json::Value>,
    },
    Undo,
    Redo,
}

impl Intent {
    /// Wire request for this intent. `model_id` doubles as the save path.
    pub fn into_request(self, model_id: &str) -> Request {
        let command = match self {
            Intent::Undo => return Request::Undo,
            Intent::Redo => return Request::Redo,
            Intent::CreateNode {
                node_type,
                position,
            } => Command::CreateNode {
                x: position.x,
                y: position.y,
                node_kwargs: CreateNodeKwargs { node_type },
            },
            Intent::CreateEdge { start, end } => Command::CreateEdge {
                start_node_id: start,
                end_node_id: end,
            },
            Intent::MoveNode { id, position } => Command::MoveNode {
                node_id: id,
                x: position.x,
                y: position.y,
            },
            Intent::DeleteNode { id } => Command::DeleteNode { node_id: id },
            Intent::DeleteEdge { key } => Command::DeleteEdge { edge_id: key },
            Intent::ClearModel => Command::ClearModel,
            Intent::SaveModel => Command::SaveModel {
                path: model_id.to_string(),
            },
            Intent::UpdateProperties { id, fields } => Command::UpdateInspectables {
                node_id: id,
                node_kwargs: fields,
            },
        };
        Request::ExecuteCommand { command }
    }

    /// Whether this intent would change the model. Saving does not.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Intent::SaveModel)
    }
}

// ─── History ─────────────────────────────────────────────────────────────

/// Mirror of the server's undo/redo availability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
}

impl HistoryState {
    /// Whether `intent` may be sent given current availability. Only undo
    /// and redo are ever gated.
    pub fn permits(&self, intent: &Intent) -> bool {
        match intent {
            Intent::Undo => self.can_undo,
            Intent::Redo => self.can_redo,
            _ => true,
        }
    }
}
