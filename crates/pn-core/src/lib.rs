pub mod config;
pub mod geometry;
pub mod id;
pub mod model;
pub mod protocol;
pub mod transform;

pub use config::{EditorConfig, SessionRole};
pub use geometry::{EdgeEndpoints, edge_endpoints};
pub use id::{EdgeKey, NodeId};
pub use model::*;
pub use protocol::{Command, Event, Request};
pub use transform::{ViewState, to_graph_space, to_screen_space};

// Re-export kurbo geometry types so downstream crates don't need a direct dependency
pub use kurbo::{Affine, Line, Point, Vec2};
