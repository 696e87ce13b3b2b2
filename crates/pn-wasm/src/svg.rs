//! SVG DOM surface.
//!
//! The host page provides an `<svg>` root holding a graph layer `<g>` with
//! two child layers, edges below nodes. Each node is one `<g>` group owning
//! its shape and its label, positioned by a `translate` on the group.

use pn_core::transform::svg_transform;
use pn_core::{EdgeEndpoints, EdgeKey, Node, NodeType, Point, ViewState};
use pn_render::Surface;
use web_sys::{Document, Element};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

pub const ROOT_ID: &str = "pn-canvas";
pub const GRAPH_LAYER_ID: &str = "pn-graph";
pub const EDGE_LAYER_ID: &str = "pn-edges";
pub const NODE_LAYER_ID: &str = "pn-nodes";

struct NodeParts {
    group: Element,
    shape: Element,
    label: Element,
}

/// One node's view: group, shape and label together.
pub struct SvgNode {
    parts: Option<NodeParts>,
    node_type: NodeType,
}

pub struct SvgEdge {
    line: Option<Element>,
}

pub struct SvgSurface {
    document: Document,
    graph_layer: Element,
    edge_layer: Element,
    node_layer: Element,
    node_size: f64,
}

fn anchor(document: &Document, id: &str) -> Result<Element, String> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| format!("required element #{id} is missing"))
}

fn set(el: &Element, name: &str, value: &str) {
    if let Err(e) = el.set_attribute(name, value) {
        log::error!("cannot set {name}={value:?}: {e:?}");
    }
}

pub(crate) fn translate(p: Point) -> String {
    format!("translate({} {})", p.x, p.y)
}

pub(crate) fn node_class(node_type: NodeType, highlighted: bool) -> String {
    if highlighted {
        format!("pn-node pn-{} pn-selected", node_type.as_str())
    } else {
        format!("pn-node pn-{}", node_type.as_str())
    }
}

impl SvgSurface {
    /// Bind to the page's SVG anchors.
    ///
    /// # Errors
    /// Returns a message naming the first missing anchor.
    pub fn mount(document: &Document, node_size: f64) -> Result<Self, String> {
        // the root is only checked; the view transform goes on the graph layer
        anchor(document, ROOT_ID)?;
        Ok(Self {
            document: document.clone(),
            graph_layer: anchor(document, GRAPH_LAYER_ID)?,
            edge_layer: anchor(document, EDGE_LAYER_ID)?,
            node_layer: anchor(document, NODE_LAYER_ID)?,
            node_size,
        })
    }

    fn element(&self, tag: &str) -> Option<Element> {
        match self.document.create_element_ns(Some(SVG_NS), tag) {
            Ok(el) => Some(el),
            Err(e) => {
                log::error!("cannot create <{tag}>: {e:?}");
                None
            }
        }
    }

    fn append(parent: &Element, child: &Element) {
        if let Err(e) = parent.append_child(child) {
            log::error!("cannot attach element: {e:?}");
        }
    }

    fn build_node(&self, node: &Node) -> Option<NodeParts> {
        let group = self.element("g")?;
        let half = self.node_size / 2.0;
        let shape = match node.node_type {
            NodeType::Place => {
                let circle = self.element("circle")?;
                set(&circle, "r", &half.to_string());
                circle
            }
            NodeType::Transition => {
                let rect = self.element("rect")?;
                set(&rect, "x", &(-half).to_string());
                set(&rect, "y", &(-half).to_string());
                set(&rect, "width", &self.node_size.to_string());
                set(&rect, "height", &self.node_size.to_string());
                rect
            }
        };
        set(&shape, "class", "pn-shape");
        let label = self.element("text")?;
        set(&label, "class", "pn-label");
        set(&label, "text-anchor", "middle");
        set(&label, "dominant-baseline", "central");
        label.set_text_content(Some(&node.label()));

        set(&group, "class", &node_class(node.node_type, false));
        set(&group, "data-node-id", &node.id.get().to_string());
        set(&group, "transform", &translate(node.position));
        Self::append(&group, &shape);
        Self::append(&group, &label);
        Self::append(&self.node_layer, &group);
        Some(NodeParts {
            group,
            shape,
            label,
        })
    }

    fn place_line(line: &Element, endpoints: EdgeEndpoints) {
        set(line, "x1", &endpoints.start.x.to_string());
        set(line, "y1", &endpoints.start.y.to_string());
        set(line, "x2", &endpoints.end.x.to_string());
        set(line, "y2", &endpoints.end.y.to_string());
    }
}

impl Surface for SvgSurface {
    type NodeHandle = SvgNode;
    type EdgeHandle = SvgEdge;

    fn create_node(&mut self, node: &Node) -> SvgNode {
        SvgNode {
            parts: self.build_node(node),
            node_type: node.node_type,
        }
    }

    fn move_node(&mut self, handle: &mut SvgNode, position: Point) {
        if let Some(parts) = &handle.parts {
            set(&parts.group, "transform", &translate(position));
        }
    }

    fn set_label(&mut self, handle: &mut SvgNode, label: &str) {
        if let Some(parts) = &handle.parts {
            parts.label.set_text_content(Some(label));
        }
    }

    fn set_highlight(&mut self, handle: &mut SvgNode, highlighted: bool) {
        if let Some(parts) = &handle.parts {
            set(
                &parts.group,
                "class",
                &node_class(handle.node_type, highlighted),
            );
            set(
                &parts.shape,
                "class",
                if highlighted {
                    "pn-shape pn-shape-selected"
                } else {
                    "pn-shape"
                },
            );
        }
    }

    fn remove_node(&mut self, handle: SvgNode) {
        if let Some(parts) = handle.parts {
            parts.group.remove();
        }
    }

    fn create_edge(&mut self, key: EdgeKey, endpoints: EdgeEndpoints) -> SvgEdge {
        let line = self.element("line");
        if let Some(line) = &line {
            set(line, "class", "pn-edge");
            set(line, "marker-end", "url(#pn-arrow)");
            set(line, "data-start", &key.start.get().to_string());
            set(line, "data-end", &key.end.get().to_string());
            Self::place_line(line, endpoints);
            Self::append(&self.edge_layer, line);
        }
        SvgEdge { line }
    }

    fn move_edge(&mut self, handle: &mut SvgEdge, endpoints: EdgeEndpoints) {
        if let Some(line) = &handle.line {
            Self::place_line(line, endpoints);
        }
    }

    fn remove_edge(&mut self, handle: SvgEdge) {
        if let Some(line) = handle.line {
            line.remove();
        }
    }

    fn set_view(&mut self, view: &ViewState) {
        set(&self.graph_layer, "transform", &svg_transform(view));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_translation() {
        assert_eq!(translate(Point::new(40.0, 12.5)), "translate(40 12.5)");
    }

    #[test]
    fn classes_carry_kind_and_selection() {
        assert_eq!(node_class(NodeType::Place, false), "pn-node pn-place");
        assert_eq!(
            node_class(NodeType::Transition, true),
            "pn-node pn-transition pn-selected"
        );
    }
}
