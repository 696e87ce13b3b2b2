//! Selection and inspector binding.
//!
//! At most one node is selected. Selecting asks the server for the node's
//! property panel (rendered HTML) and shows a loading state until it comes
//! back; replies for any other node are stale and dropped.

use crate::commands::Intent;
use pn_core::{NodeId, Request};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InspectorState {
    #[default]
    Hidden,
    Loading {
        node_id: NodeId,
    },
    Showing {
        node_id: NodeId,
        html: String,
    },
}

#[derive(Debug, Default)]
pub struct SelectionBinder {
    selected: Option<NodeId>,
    state: InspectorState,
}

impl SelectionBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn state(&self) -> &InspectorState {
        &self.state
    }

    /// Change the selection. Returns the inspector request to send, if any.
    /// Re-selecting the current node asks for nothing.
    pub fn select(&mut self, id: Option<NodeId>) -> Option<Request> {
        if id == self.selected {
            return None;
        }
        self.selected = id;
        match id {
            Some(node_id) => {
                self.state = InspectorState::Loading { node_id };
                Some(Request::Inspector { node_id })
            }
            None => {
                self.state = InspectorState::Hidden;
                None
            }
        }
    }

    /// Forced deselection (mode change, node removed, `close_inspector`).
    pub fn clear(&mut self) {
        self.selected = None;
        self.state = InspectorState::Hidden;
    }

    /// Apply an `update_inspector` event. Returns false if it was stale.
    pub fn on_inspector(&mut self, node_id: NodeId, html: String) -> bool {
        if self.selected != Some(node_id) {
            log::debug!("discarding inspector for {node_id}; selection is {:?}", self.selected);
            return false;
        }
        self.state = InspectorState::Showing { node_id, html };
        true
    }

    /// After a snapshot: clear if the selected node is gone, otherwise ask
    /// for fresh properties. The panel keeps its current content meanwhile.
    pub fn after_snapshot(&mut self, still_present: bool) -> Option<Request> {
        let node_id = self.selected?;
        if !still_present {
            log::debug!("selected node {node_id} vanished; deselecting");
            self.clear();
            return None;
        }
        Some(Request::Inspector { node_id })
    }

    /// Property edits for the selected node, forwarded verbatim.
    pub fn submit(&self, fields: BTreeMap<String, serde_json::Value>) -> Option<Intent> {
        self.selected
            .map(|id| Intent::UpdateProperties { id, fields })
    }
}
