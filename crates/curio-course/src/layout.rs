//! Layered flowchart layout.
//!
//! Nodes are grouped into horizontal layers by `step_order`. Each layer is
//! centered on the canvas as a group of fixed-width nodes separated by a fixed
//! gap, and sits at `step_order * LEVEL_HEIGHT` vertically. The layout is a
//! pure function of its inputs and must be recomputed whenever the node or
//! edge set changes.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use serde::Serialize;

use crate::model::{FlowEdge, FlowNode};

/// Width of a rendered node.
pub const NODE_WIDTH: f64 = 160.0;

/// Height of a rendered node.
pub const NODE_HEIGHT: f64 = 60.0;

/// Horizontal gap between adjacent nodes of the same layer.
pub const LAYER_GAP: f64 = 40.0;

/// Vertical distance between consecutive layers.
pub const LEVEL_HEIGHT: f64 = 150.0;

/// Canvas width used when the caller has no preference.
pub const DEFAULT_CANVAS_WIDTH: f64 = 800.0;

/// Labels longer than this are truncated in the text rendering.
const MAX_LABEL_CHARS: usize = 18;

/// Characters kept from a truncated label.
const TRUNCATED_LABEL_CHARS: usize = 16;

/// A 2D coordinate on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

/// A node with its computed center coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaidOutNode {
    /// Node id.
    pub id: String,
    /// Node label.
    pub label: String,
    /// Node description.
    pub description: String,
    /// Layer index the node was placed in.
    pub step_order: u32,
    /// Center x coordinate.
    pub x: f64,
    /// Center y coordinate.
    pub y: f64,
}

/// An edge whose endpoints both resolved to laid-out nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaidOutEdge {
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
    /// Optional caption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Bottom-center of the source node.
    pub start: Point,
    /// Top-center of the target node.
    pub end: Point,
}

/// Result of laying out a flowchart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowLayout {
    /// Nodes in their original input order.
    pub nodes: Vec<LaidOutNode>,
    /// Edges whose endpoints both exist, in input order.
    pub edges: Vec<LaidOutEdge>,
    /// Canvas width.
    pub width: f64,
    /// Canvas height, `(max step_order + 1) * LEVEL_HEIGHT`, or 0 when empty.
    pub height: f64,
    /// Width of every node.
    pub node_width: f64,
    /// Height of every node.
    pub node_height: f64,
}

/// Computes node coordinates for a flowchart.
///
/// Within a layer of `k` nodes the group width is
/// `k * NODE_WIDTH + (k - 1) * LAYER_GAP`; the leftmost center sits at
/// `(canvas_width - group_width) / 2 + NODE_WIDTH / 2` and each following
/// center advances by `NODE_WIDTH + LAYER_GAP`, keeping input order.
///
/// Edges referencing a missing node id are omitted. Cycles are not detected.
///
/// # Examples
///
/// ```
/// use curio_course::{layout, FlowNode, LEVEL_HEIGHT};
///
/// let nodes = vec![
///     FlowNode { id: "a".into(), label: "A".into(), description: String::new(), step_order: 0 },
///     FlowNode { id: "b".into(), label: "B".into(), description: String::new(), step_order: 2 },
/// ];
/// let flow = layout(&nodes, &[], 800.0);
///
/// assert!((flow.height - 3.0 * LEVEL_HEIGHT).abs() < f64::EPSILON);
/// assert!((flow.nodes[1].y - 2.0 * LEVEL_HEIGHT).abs() < f64::EPSILON);
/// ```
#[must_use]
pub fn layout(nodes: &[FlowNode], edges: &[FlowEdge], canvas_width: f64) -> FlowLayout {
    let layers = group_by_layer(nodes);

    let mut centers = vec![Point { x: 0.0, y: 0.0 }; nodes.len()];
    for (&step_order, members) in &layers {
        let y = f64::from(step_order) * LEVEL_HEIGHT;
        let count = members.len() as f64;
        let group_width = count.mul_add(NODE_WIDTH, (count - 1.0) * LAYER_GAP);
        let mut x = (canvas_width - group_width) / 2.0 + NODE_WIDTH / 2.0;
        for &index in members {
            centers[index] = Point { x, y };
            x += NODE_WIDTH + LAYER_GAP;
        }
    }

    let laid_out: Vec<LaidOutNode> = nodes
        .iter()
        .zip(&centers)
        .map(|(node, center)| LaidOutNode {
            id: node.id.clone(),
            label: node.label.clone(),
            description: node.description.clone(),
            step_order: node.step_order,
            x: center.x,
            y: center.y,
        })
        .collect();

    let height = layers
        .keys()
        .next_back()
        .map_or(0.0, |&max| (f64::from(max) + 1.0) * LEVEL_HEIGHT);

    FlowLayout {
        edges: resolve_edges(&laid_out, edges),
        nodes: laid_out,
        width: canvas_width,
        height,
        node_width: NODE_WIDTH,
        node_height: NODE_HEIGHT,
    }
}

/// Groups node indices by layer, keeping input order inside each layer.
fn group_by_layer(nodes: &[FlowNode]) -> BTreeMap<u32, Vec<usize>> {
    let mut layers: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (index, node) in nodes.iter().enumerate() {
        layers.entry(node.step_order).or_default().push(index);
    }
    layers
}

/// Keeps edges whose endpoints both exist. The first node with a given id wins.
fn resolve_edges(nodes: &[LaidOutNode], edges: &[FlowEdge]) -> Vec<LaidOutEdge> {
    let mut by_id: HashMap<&str, &LaidOutNode> = HashMap::new();
    for node in nodes {
        by_id.entry(node.id.as_str()).or_insert(node);
    }

    edges
        .iter()
        .filter_map(|edge| {
            let from = by_id.get(edge.from.as_str())?;
            let to = by_id.get(edge.to.as_str())?;
            Some(LaidOutEdge {
                from: edge.from.clone(),
                to: edge.to.clone(),
                label: edge.label.clone(),
                start: Point {
                    x: from.x,
                    y: from.y + NODE_HEIGHT / 2.0,
                },
                end: Point {
                    x: to.x,
                    y: to.y - NODE_HEIGHT / 2.0,
                },
            })
        })
        .collect()
}

/// Shortens a label the way the node renderer does.
fn truncate_label(label: &str) -> String {
    if label.chars().count() > MAX_LABEL_CHARS {
        let head: String = label.chars().take(TRUNCATED_LABEL_CHARS).collect();
        format!("{head}...")
    } else {
        label.to_string()
    }
}

impl FlowLayout {
    /// Returns `true` if there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Renders the layout as plain text, one line per occupied layer.
    ///
    /// Nodes appear left to right as placed; resolved edges follow.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut rows: BTreeMap<u32, Vec<&LaidOutNode>> = BTreeMap::new();
        for node in &self.nodes {
            rows.entry(node.step_order).or_default().push(node);
        }

        let mut out = String::new();
        for (step_order, mut row) in rows {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            let labels: Vec<String> = row
                .iter()
                .map(|n| format!("[ {} ]", truncate_label(&n.label)))
                .collect();
            let _ = writeln!(out, "{step_order:>3} | {}", labels.join("  "));
        }

        if !self.edges.is_empty() {
            out.push('\n');
            for edge in &self.edges {
                match &edge.label {
                    Some(label) => {
                        let _ = writeln!(out, "  {} --{label}--> {}", edge.from, edge.to);
                    }
                    None => {
                        let _ = writeln!(out, "  {} --> {}", edge.from, edge.to);
                    }
                }
            }
        }

        out
    }
}

// ============================================================================
// Tests
// ============================================================================
