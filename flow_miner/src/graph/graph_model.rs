use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifier of the start pseudo-event
pub const START_EVENT_ID: &str = "start";
/// Identifier of the end pseudo-event
pub const END_EVENT_ID: &str = "end";

/// Prefix of activity node identifiers
///
/// Pseudo-event and gateway identifiers never carry it, so no activity label can collide with them.
pub const ACTIVITY_ID_PREFIX: &str = "act:";

/// Node identifier of the activity with the given label
pub fn activity_id(label: &str) -> String {
    format!("{ACTIVITY_ID_PREFIX}{label}")
}

/// Fill color of activity nodes
pub const ACTIVITY_FILL_COLOR: &str = "#FFFFCC";
/// Fill color of gateway nodes
pub const GATEWAY_FILL_COLOR: &str = "#E0E0E0";
/// Fill color of the start pseudo-event
pub const START_EVENT_FILL_COLOR: &str = "#90EE90";
/// Fill color of the end pseudo-event
pub const END_EVENT_FILL_COLOR: &str = "#FFB6C1";

///
/// Type of a gateway: all outgoing/incoming branches (AND) or exactly one of them (XOR)
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum GatewayType {
    /// Parallel gateway
    And,
    /// Exclusive gateway
    Xor,
}

impl GatewayType {
    /// [`GatewayType::And`] if any pair of the gateway's neighbors is parallel, otherwise [`GatewayType::Xor`]
    pub fn from_parallelism(any_parallel_pair: bool) -> Self {
        if any_parallel_pair {
            GatewayType::And
        } else {
            GatewayType::Xor
        }
    }

    /// Symbol used as the gateway's label
    pub fn symbol(&self) -> &'static str {
        match self {
            GatewayType::And => "+",
            GatewayType::Xor => "×",
        }
    }
}

/// Start or end pseudo-event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PseudoEvent {
    /// Start of the process
    Start,
    /// End of the process
    End,
}

/// Kind of a [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind")]
pub enum NodeKind {
    /// Activity
    Activity,
    /// Split or merge gateway
    Gateway {
        /// AND or XOR
        gateway_type: GatewayType,
    },
    /// Start or end pseudo-event
    PseudoEvent {
        /// Start or end
        event: PseudoEvent,
    },
}

/// Shape of a rendered [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    /// Rectangle
    Box,
    /// Diamond
    Diamond,
    /// Circle
    Circle,
    /// Two nested circles
    DoubleCircle,
}

impl NodeShape {
    /// Shape name as understood by Graphviz
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeShape::Box => "box",
            NodeShape::Diamond => "diamond",
            NodeShape::Circle => "circle",
            NodeShape::DoubleCircle => "doublecircle",
        }
    }
}

/// Visual attributes of a [`Node`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeAttributes {
    /// Shape
    pub shape: NodeShape,
    /// Style (e.g., `rounded,filled`)
    pub style: Option<String>,
    /// Fill color (e.g., `#FFFFCC`)
    pub fill_color: Option<String>,
    /// Width (in inches)
    pub width: Option<f64>,
    /// Height (in inches)
    pub height: Option<f64>,
    /// Fix the node size instead of fitting the label
    pub fixed_size: bool,
    /// Font size (in points)
    pub font_size: Option<u32>,
}

impl NodeAttributes {
    /// Rounded box filled with the given color
    pub fn activity(fill_color: impl Into<String>) -> Self {
        Self {
            shape: NodeShape::Box,
            style: Some("rounded,filled".to_string()),
            fill_color: Some(fill_color.into()),
            width: None,
            height: None,
            fixed_size: false,
            font_size: None,
        }
    }

    /// Small gray diamond
    pub fn gateway() -> Self {
        Self {
            shape: NodeShape::Diamond,
            style: Some("filled".to_string()),
            fill_color: Some(GATEWAY_FILL_COLOR.to_string()),
            width: Some(0.5),
            height: Some(0.5),
            fixed_size: true,
            font_size: Some(20),
        }
    }

    /// Small green circle (start) or pink double circle (end)
    pub fn pseudo_event(event: PseudoEvent) -> Self {
        let (shape, fill_color) = match event {
            PseudoEvent::Start => (NodeShape::Circle, START_EVENT_FILL_COLOR),
            PseudoEvent::End => (NodeShape::DoubleCircle, END_EVENT_FILL_COLOR),
        };
        Self {
            shape,
            style: Some("filled".to_string()),
            fill_color: Some(fill_color.to_string()),
            width: Some(0.3),
            height: None,
            fixed_size: true,
            font_size: None,
        }
    }
}

/// Node of a [`GraphModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    /// Unique identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Kind of node
    pub kind: NodeKind,
    /// Visual attributes
    pub attributes: NodeAttributes,
}

impl Node {
    /// Activity node, identified by [`activity_id`] of its label
    pub fn activity(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            id: activity_id(&label),
            label,
            kind: NodeKind::Activity,
            attributes: NodeAttributes::activity(ACTIVITY_FILL_COLOR),
        }
    }

    /// Gateway node labeled with the symbol of its [`GatewayType`]
    pub fn gateway(id: impl Into<String>, gateway_type: GatewayType) -> Self {
        Self {
            id: id.into(),
            label: gateway_type.symbol().to_string(),
            kind: NodeKind::Gateway { gateway_type },
            attributes: NodeAttributes::gateway(),
        }
    }

    /// Start or end pseudo-event (with [`START_EVENT_ID`] or [`END_EVENT_ID`] as identifier)
    pub fn pseudo_event(event: PseudoEvent) -> Self {
        let id = match event {
            PseudoEvent::Start => START_EVENT_ID,
            PseudoEvent::End => END_EVENT_ID,
        };
        Self {
            id: id.to_string(),
            label: String::new(),
            kind: NodeKind::PseudoEvent { event },
            attributes: NodeAttributes::pseudo_event(event),
        }
    }

    /// Gateway type (if this node is a gateway)
    pub fn gateway_type(&self) -> Option<GatewayType> {
        match self.kind {
            NodeKind::Gateway { gateway_type } => Some(gateway_type),
            _ => None,
        }
    }
}

/// Directed edge of a [`GraphModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Edge {
    /// Identifier of the source node
    pub source: String,
    /// Identifier of the target node
    pub target: String,
    /// Optional label
    pub label: Option<String>,
    /// Optional line weight
    pub pen_width: Option<f64>,
}

///
/// Abstract control-flow graph handed to a rendering backend
///
/// Nodes and edges are kept in insertion order, which is deterministic for all miners.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GraphModel {
    /// Name of the graph
    pub name: String,
    /// Default line weight of edges without an explicit one
    pub default_pen_width: Option<f64>,
    /// Separation between nodes of the same rank (in inches)
    pub node_separation: Option<f64>,
    /// Nodes
    pub nodes: Vec<Node>,
    /// Edges
    pub edges: Vec<Edge>,
}

impl GraphModel {
    /// Create new [`GraphModel`] without nodes and edges
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_pen_width: None,
            node_separation: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Add a node
    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Add an edge without label and explicit line weight
    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.edges.push(Edge {
            source: source.into(),
            target: target.into(),
            label: None,
            pen_width: None,
        });
    }

    /// Add a labeled edge with an explicit line weight
    pub fn add_weighted_edge(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
        pen_width: f64,
    ) {
        self.edges.push(Edge {
            source: source.into(),
            target: target.into(),
            label: Some(label.into()),
            pen_width: Some(pen_width),
        });
    }

    /// Get node by identifier
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Checks if there is a node with the identifier
    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Checks if there is an edge from `source` to `target`
    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|e| e.source == source && e.target == target)
    }

    /// All gateway nodes
    pub fn gateways(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.gateway_type().is_some())
    }

    /// Identifiers of the direct successors of a node
    pub fn successors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> {
        self.edges
            .iter()
            .filter(move |e| e.source == id)
            .map(|e| e.target.as_str())
    }

    /// Identifiers of the direct predecessors of a node
    pub fn predecessors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> {
        self.edges
            .iter()
            .filter(move |e| e.target == id)
            .map(|e| e.source.as_str())
    }

    /// Convert to a [`petgraph`] graph, e.g., for running graph algorithms on it
    ///
    /// Edges referencing unknown node identifiers are skipped.
    pub fn to_petgraph(&self) -> DiGraph<&Node, &Edge> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let indices: HashMap<&str, NodeIndex> = self
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), graph.add_node(n)))
            .collect();
        for e in &self.edges {
            if let (Some(from), Some(to)) = (
                indices.get(e.source.as_str()),
                indices.get(e.target.as_str()),
            ) {
                graph.add_edge(*from, *to, e);
            }
        }
        graph
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// JSON schema of the serialized [`GraphModel`]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(GraphModel)
    }

    #[cfg(feature = "graphviz-export")]
    ///
    /// Export the graph as a PNG image
    ///
    /// __Requires the `graphviz-export` feature to be enabled__
    ///
    pub fn export_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), std::io::Error> {
        super::image_export::export_graph_image_png(self, path)
    }

    #[cfg(feature = "graphviz-export")]
    ///
    /// Export the graph as a SVG image
    ///
    /// __Requires the `graphviz-export` feature to be enabled__
    ///
    pub fn export_svg<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), std::io::Error> {
        super::image_export::export_graph_image_svg(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_query_graph() {
        let a = activity_id("a");
        let b = activity_id("b");
        let mut g = GraphModel::new("test");
        g.add_node(Node::activity("a"));
        g.add_node(Node::activity("b"));
        g.add_node(Node::gateway("g1", GatewayType::And));
        g.add_node(Node::pseudo_event(PseudoEvent::Start));
        g.add_edge(START_EVENT_ID, a.as_str());
        g.add_edge(a.as_str(), "g1");
        g.add_weighted_edge("g1", b.as_str(), "3", 2.0);

        assert!(g.contains_node("start"));
        assert!(!g.contains_node("end"));
        assert!(g.contains_edge(&a, "g1"));
        assert!(!g.contains_edge("g1", &a));
        assert_eq!(g.gateways().count(), 1);
        assert_eq!(g.node("g1").unwrap().label, "+");
        assert_eq!(g.node(&a).unwrap().label, "a");
        assert_eq!(g.successors("g1").collect::<Vec<_>>(), vec!["act:b"]);
        assert_eq!(g.predecessors(&a).collect::<Vec<_>>(), vec!["start"]);

        let pg = g.to_petgraph();
        assert_eq!(pg.node_count(), 4);
        assert_eq!(pg.edge_count(), 3);
    }

    #[test]
    fn activity_ids_do_not_collide_with_pseudo_events() {
        let mut g = GraphModel::new("ids");
        g.add_node(Node::pseudo_event(PseudoEvent::Start));
        g.add_node(Node::activity(START_EVENT_ID));
        g.add_node(Node::pseudo_event(PseudoEvent::End));
        g.add_node(Node::activity(END_EVENT_ID));
        assert_eq!(g.nodes.len(), 4);
        assert_eq!(
            g.node(START_EVENT_ID).unwrap().kind,
            NodeKind::PseudoEvent {
                event: PseudoEvent::Start
            }
        );
        let act = g.node("act:start").unwrap();
        assert_eq!(act.kind, NodeKind::Activity);
        assert_eq!(act.label, "start");
    }

    #[test]
    fn json_roundtrip_keeps_node_kinds() {
        let mut g = GraphModel::new("kinds");
        g.add_node(Node::gateway("x", GatewayType::Xor));
        g.add_node(Node::pseudo_event(PseudoEvent::End));
        let json = g.to_json().unwrap();
        assert!(json.contains(r#""kind":{"kind":"Gateway","gateway_type":"Xor"}"#));
        assert!(json.contains(r#""shape":"doublecircle""#));
        let back: GraphModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn schema_describes_nodes_and_edges() {
        let schema = serde_json::to_string(&GraphModel::json_schema()).unwrap();
        assert!(schema.contains("nodes"));
        assert!(schema.contains("pen_width"));
    }
}
