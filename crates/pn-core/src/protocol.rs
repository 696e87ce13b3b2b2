//! Session wire protocol (JSON over a WebSocket).
//!
//! Outbound messages are wrapped in `{"request": {"request_type": ...}}`;
//! `execute_command` nests a second tagged object keyed by `command_type`.
//! Inbound messages are flat objects tagged by `event_type`.

use crate::id::{EdgeKey, NodeId};
use crate::model::{ModelPayload, NodeType};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// ─── Outbound ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum Request {
    JoinSession { model_id: String },
    /// Read-only participation: the server never expects commands back.
    WatchSession { model_id: String },
    ExecuteCommand { command: Command },
    Inspector { node_id: NodeId },
    Undo,
    Redo,
}

/// Extra constructor arguments for `create_node`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNodeKwargs {
    pub node_type: NodeType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command_type", rename_all = "snake_case")]
pub enum Command {
    CreateNode {
        x: f64,
        y: f64,
        node_kwargs: CreateNodeKwargs,
    },
    CreateEdge {
        start_node_id: NodeId,
        end_node_id: NodeId,
    },
    MoveNode {
        node_id: NodeId,
        x: f64,
        y: f64,
    },
    DeleteNode {
        node_id: NodeId,
    },
    DeleteEdge {
        edge_id: EdgeKey,
    },
    ClearModel,
    SaveModel {
        path: String,
    },
    /// Inspector edits, forwarded verbatim. The server validates.
    UpdateInspectables {
        node_id: NodeId,
        node_kwargs: BTreeMap<String, serde_json::Value>,
    },
}

// ─── Inbound ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    /// Full snapshot; supersedes all prior model state.
    UpdateModel { model: ModelPayload },
    UpdateUndoRedo { can_undo: bool, can_redo: bool },
    UpdateInspector {
        node_id: NodeId,
        inspector_html: String,
    },
    UpdateCollaborators {
        #[serde(deserialize_with = "collaborator_ids")]
        collaborator_ids: Vec<String>,
    },
    CloseInspector,
    SavedSuccess,
    /// The server refused a command. The model is unchanged.
    CommandRejected {
        #[serde(default)]
        reason: String,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::UpdateModel { .. } => "update_model",
            Event::UpdateUndoRedo { .. } => "update_undo_redo",
            Event::UpdateInspector { .. } => "update_inspector",
            Event::UpdateCollaborators { .. } => "update_collaborators",
            Event::CloseInspector => "close_inspector",
            Event::SavedSuccess => "saved_success",
            Event::CommandRejected { .. } => "command_rejected",
        }
    }
}

/// Collaborator ids arrive as strings or as bare numbers (address hashes).
fn collaborator_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|value| match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}

// ─── Codec ───────────────────────────────────────────────────────────────

/// Serialize a request in its envelope.
///
/// # Errors
/// Returns the serializer message; in practice only non-finite coordinates
/// can fail.
pub fn encode_request(request: &Request) -> Result<String, String> {
    let envelope = RequestEnvelope {
        request: request.clone(),
    };
    serde_json::to_string(&envelope).map_err(|e| format!("cannot encode request: {e}"))
}

/// Parse one inbound message.
///
/// # Errors
/// Returns a message if the text is not a known event.
pub fn decode_event(text: &str) -> Result<Event, String> {
    serde_json::from_str(text).map_err(|e| format!("cannot decode event: {e}"))
}
