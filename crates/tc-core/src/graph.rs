//! Entity graph construction.
//!
//! Turns the `graph` block of a case into typed nodes and edges for a
//! force-directed layout surface. Node identity is `entity_type:entity_value`.
//!
//! ## Merge policy
//!
//! Duplicate identities are merged keep-last: the later record's attributes
//! replace the earlier ones, and the node keeps the position where the
//! identity first appeared. Merges are counted in
//! [`EntityGraph::merged_duplicates`] so backend duplication stays visible.
//!
//! ## Dangling edges
//!
//! Edges are never dropped. An edge whose endpoint has no node is flagged
//! with [`VisualEdge::dangling`] and left for the surface to style.

use crate::error::CoreResult;
use crate::models::GraphBlock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Border color shared by all nodes.
pub const NODE_BORDER: &str = "#0b1220";
/// Label color for nodes.
pub const NODE_FONT: &str = "#e5e7eb";
/// Stroke color for edges.
pub const EDGE_COLOR: &str = "#334155";
/// Label color for edges.
pub const EDGE_FONT: &str = "#94a3b8";
/// Label size for edges.
pub const EDGE_FONT_SIZE: u8 = 10;

/// Closed set of entity kinds the console knows how to style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Host,
    Ip,
    Domain,
    Unknown,
}

impl EntityKind {
    /// Classifies a backend `entity_type`, case-insensitively.
    ///
    /// Any other type containing `ip` is an address: `ip`, `src_ip`,
    /// `ipv4`, `client_ip_addr` and similar.
    pub fn parse(entity_type: &str) -> Self {
        let t = entity_type.trim().to_lowercase();
        match t.as_str() {
            "user" => EntityKind::User,
            "host" => EntityKind::Host,
            _ if t.contains("ip") => EntityKind::Ip,
            "domain" => EntityKind::Domain,
            _ => EntityKind::Unknown,
        }
    }

    /// Display color for this kind.
    pub fn color(&self) -> NodeColor {
        match self {
            EntityKind::User => NodeColor::Violet,
            EntityKind::Host => NodeColor::Green,
            EntityKind::Ip => NodeColor::Cyan,
            EntityKind::Domain => NodeColor::Orange,
            EntityKind::Unknown => NodeColor::Gray,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Host => "host",
            EntityKind::Ip => "ip",
            EntityKind::Domain => "domain",
            EntityKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Node background palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeColor {
    Violet,
    Green,
    Cyan,
    Orange,
    Gray,
}

impl NodeColor {
    /// Hex value for the background.
    pub fn hex(&self) -> &'static str {
        match self {
            NodeColor::Violet => "#7c3aed",
            NodeColor::Green => "#22c55e",
            NodeColor::Cyan => "#06b6d4",
            NodeColor::Orange => "#f97316",
            NodeColor::Gray => "#94a3b8",
        }
    }
}

/// Builds the stable identity of an entity.
pub fn node_identity(entity_type: &str, entity_value: &str) -> String {
    format!("{}:{}", entity_type, entity_value)
}

/// A node ready for the layout surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualNode {
    /// `entity_type:entity_value`.
    pub id: String,
    /// The entity value.
    pub label: String,
    /// The raw backend entity type, used for grouping.
    pub group: String,
    pub kind: EntityKind,
    pub color: NodeColor,
}

/// An edge ready for the layout surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualEdge {
    pub from: String,
    pub to: String,
    /// The backend `edge_type`.
    pub label: String,
    /// True when `from` or `to` does not name a node in the graph.
    pub dangling: bool,
}

/// Typed, de-duplicated entity graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
    /// Number of input nodes that overwrote an earlier identity.
    pub merged_duplicates: usize,
}

impl EntityGraph {
    /// Builds the graph from a backend graph block.
    pub fn build(block: &GraphBlock) -> Self {
        let mut nodes: Vec<VisualNode> = Vec::with_capacity(block.nodes.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(block.nodes.len());
        let mut merged_duplicates = 0;

        for record in &block.nodes {
            let kind = EntityKind::parse(&record.entity_type);
            let node = VisualNode {
                id: node_identity(&record.entity_type, &record.entity_value),
                label: record.entity_value.clone(),
                group: record.entity_type.clone(),
                kind,
                color: kind.color(),
            };

            match index.get(&node.id) {
                Some(&pos) => {
                    debug!(node_id = %node.id, "Merging duplicate entity (keep-last)");
                    merged_duplicates += 1;
                    nodes[pos] = node;
                }
                None => {
                    index.insert(node.id.clone(), nodes.len());
                    nodes.push(node);
                }
            }
        }

        let edges = block
            .edges
            .iter()
            .map(|record| {
                let from = node_identity(&record.src_type, &record.src_value);
                let to = node_identity(&record.dst_type, &record.dst_value);
                let dangling = !index.contains_key(&from) || !index.contains_key(&to);
                if dangling {
                    warn!(
                        from = %from,
                        to = %to,
                        edge_type = %record.edge_type,
                        "Edge endpoint has no matching entity"
                    );
                }
                VisualEdge {
                    from,
                    to,
                    label: record.edge_type.clone(),
                    dangling,
                }
            })
            .collect();

        Self {
            nodes,
            edges,
            merged_duplicates,
        }
    }

    /// Looks up a node by identity.
    pub fn node(&self, id: &str) -> Option<&VisualNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns true if the graph has no nodes and no edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Edges with at least one unresolved endpoint.
    pub fn dangling_edges(&self) -> impl Iterator<Item = &VisualEdge> {
        self.edges.iter().filter(|e| e.dangling)
    }

    /// Outgoing edges of a node, in input order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a VisualEdge> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// Identities of nodes with no incident edge.
    pub fn isolated_nodes(&self) -> Vec<&str> {
        let touched: HashSet<&str> = self
            .edges
            .iter()
            .flat_map(|e| [e.from.as_str(), e.to.as_str()])
            .collect();
        self.nodes
            .iter()
            .map(|n| n.id.as_str())
            .filter(|id| !touched.contains(id))
            .collect()
    }

    /// Renders the graph as Graphviz DOT.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph case {\n");
        out.push_str(&format!(
            "  node [shape=circle, style=filled, color=\"{}\", fontcolor=\"{}\"];\n",
            NODE_BORDER, NODE_FONT
        ));
        out.push_str(&format!(
            "  edge [color=\"{}\", fontcolor=\"{}\", fontsize={}];\n",
            EDGE_COLOR, EDGE_FONT, EDGE_FONT_SIZE
        ));
        for node in &self.nodes {
            out.push_str(&format!(
                "  \"{}\" [label=\"{}\", fillcolor=\"{}\"];\n",
                dot_escape(&node.id),
                dot_escape(&node.label),
                node.color.hex()
            ));
        }
        for edge in &self.edges {
            let style = if edge.dangling { ", style=dashed" } else { "" };
            out.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"{}];\n",
                dot_escape(&edge.from),
                dot_escape(&edge.to),
                dot_escape(&edge.label),
                style
            ));
        }
        out.push_str("}\n");
        out
    }
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Layout and physics options handed to a graph surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub auto_resize: bool,
    /// Surface height in pixels.
    pub height: u32,
    pub node_shape: String,
    pub node_size: u32,
    pub smooth_edges: bool,
    pub stabilize: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            auto_resize: true,
            height: 360,
            node_shape: "dot".to_string(),
            node_size: 14,
            smooth_edges: true,
            stabilize: true,
        }
    }
}

/// A rendering surface that can display an entity graph.
///
/// `mount` acquires whatever the surface needs and returns a handle. The
/// handle owns that acquisition and must release it when dropped, so a view
/// holds the handle exactly as long as it is shown.
pub trait GraphSurface {
    type Handle;

    fn mount(&self, graph: &EntityGraph, layout: &LayoutOptions) -> CoreResult<Self::Handle>;
}
