use std::{fs::File, io::Write, path::Path};

use graphviz_rust::{
    cmd::Format,
    dot_generator::{attr, edge, id, node_id, stmt},
    dot_structures::*,
    printer::{DotPrinter, PrinterContext},
};

use super::graph_model::{GraphModel, Node as ModelNode};

/// Default DPI of Graphviz, scaled by the `dpi_factor` of the export functions
const BASE_DPI: f32 = 96.0;

///
/// Escape a string for use inside a quoted DOT identifier
///
/// Backslashes and quotes are escaped and line breaks are turned into the `\n` escape sequence of Graphviz.
///
pub fn escape_dot_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

fn node_stmt(node: &ModelNode) -> Stmt {
    let a = &node.attributes;
    let shape = a.shape.as_str();
    let mut attributes = vec![
        attr!("label", esc escape_dot_string(&node.label)),
        attr!("shape", shape),
    ];
    if let Some(style) = &a.style {
        attributes.push(attr!("style", esc style));
    }
    if let Some(fill_color) = &a.fill_color {
        attributes.push(attr!("fillcolor", esc fill_color));
    }
    if let Some(width) = a.width {
        attributes.push(attr!("width", width));
    }
    if let Some(height) = a.height {
        attributes.push(attr!("height", height));
    }
    if a.fixed_size {
        attributes.push(attr!("fixedsize", true));
    }
    if let Some(font_size) = a.font_size {
        attributes.push(attr!("fontsize", font_size));
    }
    Stmt::Node(Node {
        id: node_id!(esc escape_dot_string(&node.id)),
        attributes,
    })
}

///
/// Convert a [`GraphModel`] to a DOT graph (used in Graphviz)
///
/// The graph is laid out left to right. Its identifier is derived from the name of the model,
/// so that converting the same model twice yields the same DOT source.
///
/// Also see [`export_graph_image`], as well as [`export_graph_image_svg`] and [`export_graph_image_png`]
///
pub fn export_graph_to_dot_graph(model: &GraphModel, dpi_factor: Option<f32>) -> Graph {
    let mut global_graph_options = vec![stmt!(attr!("rankdir", "LR"))];
    if let Some(node_separation) = model.node_separation {
        global_graph_options.push(stmt!(attr!("nodesep", node_separation)));
    }
    if let Some(dpi_fac) = dpi_factor {
        global_graph_options.push(stmt!(attr!("dpi", (dpi_fac * BASE_DPI))));
    }
    if let Some(pen_width) = model.default_pen_width {
        global_graph_options.push(Stmt::GAttribute(GraphAttributes::Node(vec![attr!(
            "penwidth", pen_width
        )])));
        global_graph_options.push(Stmt::GAttribute(GraphAttributes::Edge(vec![attr!(
            "penwidth", pen_width
        )])));
    }

    let nodes: Vec<Stmt> = model.nodes.iter().map(node_stmt).collect();

    let edges: Vec<Stmt> = model
        .edges
        .iter()
        .map(|e| {
            let mut attrs = Vec::new();
            if let Some(label) = &e.label {
                attrs.push(attr!("label", esc escape_dot_string(label)));
            }
            if let Some(pen_width) = e.pen_width {
                attrs.push(attr!("penwidth", pen_width));
            }
            stmt!(edge!(node_id!(esc escape_dot_string(&e.source)) => node_id!(esc escape_dot_string(&e.target)), attrs))
        })
        .collect();

    Graph::DiGraph {
        id: id!(esc escape_dot_string(&model.name)),
        strict: false,
        stmts: vec![global_graph_options, nodes, edges]
            .into_iter()
            .flatten()
            .collect(),
    }
}

///
/// Convert a DOT graph to a String containing the DOT source
///
pub fn graph_to_dot(g: &Graph) -> String {
    g.print(&mut PrinterContext::default())
}

///
/// Convert a [`GraphModel`] directly to its DOT source
///
pub fn graph_model_to_dot(model: &GraphModel) -> String {
    graph_to_dot(&export_graph_to_dot_graph(model, None))
}

///
/// Render the image of a [`GraphModel`] using Graphviz
///
/// Requires an active graphviz installation in the PATH.
///
/// Also see [`export_graph_image_svg`] and [`export_graph_image_png`]
///
pub fn export_graph_image<P: AsRef<Path>>(
    model: &GraphModel,
    path: P,
    format: Format,
    dpi_factor: Option<f32>,
) -> Result<(), std::io::Error> {
    let g = export_graph_to_dot_graph(model, dpi_factor);
    let out = graphviz_rust::exec(g, &mut PrinterContext::default(), vec![format.into()])?;

    let mut f = File::create(path)?;
    f.write_all(&out)?;
    Ok(())
}

///
/// Export the image of a [`GraphModel`] as a SVG file
///
pub fn export_graph_image_svg<P: AsRef<Path>>(
    model: &GraphModel,
    path: P,
) -> Result<(), std::io::Error> {
    export_graph_image(model, path, Format::Svg, None)
}

///
/// Export the image of a [`GraphModel`] as a PNG file
///
pub fn export_graph_image_png<P: AsRef<Path>>(
    model: &GraphModel,
    path: P,
) -> Result<(), std::io::Error> {
    export_graph_image(model, path, Format::Png, Some(2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::graph_model::{
        activity_id, GatewayType, PseudoEvent, END_EVENT_ID, START_EVENT_ID,
    };

    fn small_model() -> GraphModel {
        let mut g = GraphModel::new("Small \"graph\"");
        g.default_pen_width = Some(1.5);
        g.node_separation = Some(0.6);
        g.add_node(ModelNode::activity("a"));
        g.add_node(ModelNode::activity("b"));
        g.add_node(ModelNode::gateway("ANDs_1_a->b", GatewayType::And));
        g.add_node(ModelNode::pseudo_event(PseudoEvent::Start));
        g.add_node(ModelNode::pseudo_event(PseudoEvent::End));
        g.add_edge(START_EVENT_ID, activity_id("a"));
        g.add_edge(activity_id("a"), "ANDs_1_a->b");
        g.add_weighted_edge("ANDs_1_a->b", activity_id("b"), "7", 3.5);
        g.add_edge(activity_id("b"), END_EVENT_ID);
        g
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_dot_string("a\n(3)"), "a\\n(3)");
        assert_eq!(escape_dot_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_dot_string("plain"), "plain");
        assert_eq!(escape_dot_string("C:\\"), "C:\\\\");
        assert_eq!(escape_dot_string("\\\""), "\\\\\\\"");
    }

    #[test]
    fn backslashes_survive_dot_parsing() {
        let mut g = GraphModel::new("paths \\");
        g.add_node(ModelNode::activity("C:\\"));
        g.add_node(ModelNode::activity("a\\\"b"));
        g.add_node(ModelNode::pseudo_event(PseudoEvent::Start));
        g.add_edge(START_EVENT_ID, activity_id("C:\\"));
        g.add_weighted_edge(activity_id("C:\\"), activity_id("a\\\"b"), "1", 1.0);
        let dot = graph_model_to_dot(&g);
        assert!(dot.contains("\"act:C:\\\\\""));
        assert!(graphviz_rust::parse(&dot).is_ok());
    }

    #[test]
    fn dot_source_contains_nodes_edges_and_attributes() {
        let dot = graph_model_to_dot(&small_model());
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("rankdir=LR"));
        assert!(dot.contains("nodesep=0.6"));
        assert!(dot.contains("\"Small \\\"graph\\\"\""));
        assert!(dot.contains("\"ANDs_1_a->b\""));
        assert!(dot.contains("\"act:a\""));
        assert!(graphviz_rust::parse(&dot).is_ok());
        assert!(dot.contains("diamond"));
        assert!(dot.contains("doublecircle"));
        assert!(dot.contains("penwidth=3.5"));
        assert!(dot.contains("penwidth=1.5"));
        assert!(dot.contains("\"#FFFFCC\""));
    }

    #[test]
    fn multi_line_labels_are_escaped() {
        let mut g = GraphModel::new("labels");
        let mut node = ModelNode::activity("act");
        node.label = "act\n(12)".to_string();
        g.add_node(node);
        let dot = graph_model_to_dot(&g);
        assert!(dot.contains("act\\n(12)"));
        assert!(!dot.contains("act\n(12)"));
    }

    #[test]
    fn dot_export_is_deterministic() {
        let model = small_model();
        assert_eq!(graph_model_to_dot(&model), graph_model_to_dot(&model));
    }

    #[test]
    fn dpi_factor_is_applied() {
        let dot = graph_to_dot(&export_graph_to_dot_graph(&small_model(), Some(2.0)));
        assert!(dot.contains("dpi=192"));
    }
}
