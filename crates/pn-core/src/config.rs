//! Editor configuration.
//!
//! Hosts pass a (possibly partial) JSON object; missing fields take their
//! defaults.

use crate::transform::{MAX_ZOOM, MIN_ZOOM};
use serde::{Deserialize, Serialize};

/// How this client takes part in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    /// Joins with `join_session` and may edit.
    #[default]
    Collaborator,
    /// Joins with `watch_session`; receives updates, never sends edits.
    Spectator,
}

/// Tunables for the interaction core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Bounding-box edge length of every node, graph units. Default: **50**.
    pub node_size: f64,

    /// Extra gap between a node outline and an edge endpoint, leaving room
    /// for the arrowhead. Default: **4**.
    pub edge_clearance: f64,

    /// Max distance (graph units) at which a click still hits an edge in
    /// delete mode. Default: **6**.
    pub edge_hit_tolerance: f64,

    /// Zoom bounds applied on every wheel update. Default: **[0.125, 4]**.
    pub min_zoom: f64,
    pub max_zoom: f64,

    /// Zoom multiplier per wheel notch. Default: **1.1**.
    pub zoom_step: f64,

    pub role: SessionRole,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            node_size: 50.0,
            edge_clearance: 4.0,
            edge_hit_tolerance: 6.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: 1.1,
            role: SessionRole::Collaborator,
        }
    }
}

impl EditorConfig {
    /// Parse a JSON config object. An empty string yields the defaults.
    ///
    /// # Errors
    /// Returns a message if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, String> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EditorConfig =
            serde_json::from_str(json).map_err(|e| format!("invalid editor config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns a message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.node_size > 0.0) {
            return Err(format!("node_size must be positive, got {}", self.node_size));
        }
        if self.edge_clearance < 0.0 || self.edge_hit_tolerance < 0.0 {
            return Err("edge_clearance and edge_hit_tolerance must not be negative".into());
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(format!(
                "zoom bounds must satisfy 0 < min_zoom <= max_zoom, got [{}, {}]",
                self.min_zoom, self.max_zoom
            ));
        }
        if !(self.zoom_step > 1.0) {
            return Err(format!("zoom_step must exceed 1, got {}", self.zoom_step));
        }
        Ok(())
    }

    /// Offset from a node centre to an edge endpoint.
    pub fn edge_margin(&self) -> f64 {
        self.node_size / 2.0 + self.edge_clearance
    }

    pub fn is_spectator(&self) -> bool {
        self.role == SessionRole::Spectator
    }
}
