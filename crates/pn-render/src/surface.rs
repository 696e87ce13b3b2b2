//! The render boundary.
//!
//! A `Surface` owns the visual tree (an SVG document in the browser, a
//! `RetainedScene` natively). The reconciler is the only caller: it keeps
//! the handles returned here in its own index and never queries the surface
//! for structure. A node handle owns both the shape and its label.

use pn_core::{EdgeEndpoints, EdgeKey, Node, Point, ViewState};

pub trait Surface {
    /// View handle of one node (shape + label).
    type NodeHandle;
    /// View handle of one edge line.
    type EdgeHandle;

    /// Create the visual for `node` at its position, with its label.
    fn create_node(&mut self, node: &Node) -> Self::NodeHandle;

    /// Move an existing node visual so that its centre is at `position`.
    fn move_node(&mut self, handle: &mut Self::NodeHandle, position: Point);

    fn set_label(&mut self, handle: &mut Self::NodeHandle, label: &str);

    /// Toggle the selection highlight.
    fn set_highlight(&mut self, handle: &mut Self::NodeHandle, highlighted: bool);

    fn remove_node(&mut self, handle: Self::NodeHandle);

    fn create_edge(&mut self, key: EdgeKey, endpoints: EdgeEndpoints) -> Self::EdgeHandle;

    fn move_edge(&mut self, handle: &mut Self::EdgeHandle, endpoints: EdgeEndpoints);

    fn remove_edge(&mut self, handle: Self::EdgeHandle);

    /// Apply the pan/zoom transform to the whole graph layer.
    fn set_view(&mut self, view: &ViewState);
}
