//! Render-facing projection of the visible part of the forest.

use super::geometry::{NodeShape, Placement, Point, edge_endpoints};
use super::types::{NodeId, NodeKind, TreeNode};

/// Weight of the centre node; no tree node reaches it.
pub const CENTER_WEIGHT: f64 = 5.0;
const DEPTH_WEIGHT_TOP: i64 = 4;

/// Size weight of a tree node: shallower nodes are heavier, floored at 1.
pub fn depth_weight(depth: u32) -> f64 {
	(DEPTH_WEIGHT_TOP - depth as i64).max(1) as f64
}

/// What the renderer draws a node as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisualKind {
	/// The subject-wide centre.
	Center,
	/// A grade grouping node.
	Grade,
	/// A quarter grouping node.
	Quarter,
	/// An authored topic.
	Topic,
}

impl From<NodeKind> for VisualKind {
	fn from(kind: NodeKind) -> Self {
		match kind {
			NodeKind::Grade { .. } => VisualKind::Grade,
			NodeKind::Quarter { .. } => VisualKind::Quarter,
			NodeKind::Topic => VisualKind::Topic,
		}
	}
}

/// Sizes and colours handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	/// Radius of a weightless node.
	pub base_radius: f64,
	/// Extra radius per unit of size weight.
	pub radius_step: f64,
	/// Half height of the centre box.
	pub center_half_height: f64,
	/// Approximate width of one label character in the centre box.
	pub center_char_width: f64,
	/// Horizontal padding around the centre label.
	pub center_padding: f64,
	/// Gap between an edge end and the node outline.
	pub edge_padding: f64,
	/// Fill of the centre box.
	pub center_color: &'static str,
	/// Fill of grade nodes.
	pub grade_color: &'static str,
	/// Fill of quarter nodes.
	pub quarter_color: &'static str,
	/// Topic fills, cycled by depth.
	pub topic_palette: &'static [&'static str],
}

impl Default for NodeStyle {
	fn default() -> Self {
		Self {
			base_radius: 4.0,
			radius_step: 3.0,
			center_half_height: 14.0,
			center_char_width: 7.0,
			center_padding: 12.0,
			edge_padding: 3.0,
			center_color: "#f4d35e",
			grade_color: "#1f77b4",
			quarter_color: "#2ca02c",
			topic_palette: &[
				"#ff7f0e", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf",
			],
		}
	}
}

impl NodeStyle {
	/// Circle radius for a node of `weight`.
	pub fn radius(&self, weight: f64) -> f64 {
		self.base_radius + self.radius_step * weight
	}

	/// Box sized to fit `label`.
	pub fn center_shape(&self, label: &str) -> NodeShape {
		NodeShape::Box {
			half_width: label.chars().count() as f64 * self.center_char_width / 2.0
				+ self.center_padding,
			half_height: self.center_half_height,
		}
	}

	/// Fill for a node of `kind` at `depth`.
	pub fn color(&self, kind: VisualKind, depth: u32) -> &'static str {
		match kind {
			VisualKind::Center => self.center_color,
			VisualKind::Grade => self.grade_color,
			VisualKind::Quarter => self.quarter_color,
			VisualKind::Topic if self.topic_palette.is_empty() => self.grade_color,
			VisualKind::Topic => self.topic_palette[depth as usize % self.topic_palette.len()],
		}
	}
}

/// A visible node plus the layout state the simulation writes into it.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphVisualNode {
	/// Id of the tree node, or the centre id.
	pub id: NodeId,
	/// Ancestor path; unique even when a topic repeats under two parents.
	pub key: String,
	/// Display name.
	pub label: String,
	/// Centre, grade, quarter or topic.
	pub kind: VisualKind,
	/// Relative size; the centre is heaviest.
	pub size_weight: f64,
	/// Outline used for drawing, hit testing and edge ends.
	pub shape: NodeShape,
	/// CSS fill colour.
	pub color: String,
	/// Id of the parent, `None` for the centre.
	pub parent_id: Option<NodeId>,
	/// Index of the parent within [`VisibleGraph::nodes`].
	pub parent: Option<usize>,
	/// The node has children.
	pub is_expandable: bool,
	/// The node's children are shown.
	pub is_expanded: bool,
	/// Current position, `None` until placed.
	pub x: Option<f64>,
	/// See `x`.
	pub y: Option<f64>,
	/// Pinned position; the simulation leaves the node there.
	pub fx: Option<f64>,
	/// See `fx`.
	pub fy: Option<f64>,
}

impl GraphVisualNode {
	pub(crate) fn center(id: NodeId, label: &str, style: &NodeStyle) -> Self {
		Self {
			id,
			key: id.to_string(),
			label: label.to_string(),
			kind: VisualKind::Center,
			size_weight: CENTER_WEIGHT,
			shape: style.center_shape(label),
			color: style.color(VisualKind::Center, 0).to_string(),
			parent_id: None,
			parent: None,
			is_expandable: false,
			is_expanded: true,
			x: None,
			y: None,
			fx: None,
			fy: None,
		}
	}

	pub(crate) fn for_tree_node(
		node: &TreeNode,
		parent: usize,
		parent_id: NodeId,
		key: String,
		is_expanded: bool,
		style: &NodeStyle,
	) -> Self {
		let kind = VisualKind::from(node.kind);
		let size_weight = depth_weight(node.depth);
		Self {
			id: node.id,
			key,
			label: node.label.clone(),
			kind,
			size_weight,
			shape: NodeShape::Circle {
				radius: style.radius(size_weight),
			},
			color: style.color(kind, node.depth).to_string(),
			parent_id: Some(parent_id),
			parent: Some(parent),
			is_expandable: !node.is_leaf(),
			is_expanded,
			x: None,
			y: None,
			fx: None,
			fy: None,
		}
	}

	/// Current position, if placed.
	pub fn position(&self) -> Option<Point> {
		Some(Point::new(self.x?, self.y?))
	}

	/// Position and outline for edge routing.
	pub fn placement(&self) -> Placement {
		Placement {
			center: self.position(),
			shape: self.shape,
		}
	}

	/// Moves the node without pinning it.
	pub fn place(&mut self, at: Point) {
		self.x = Some(at.x);
		self.y = Some(at.y);
	}

	/// Moves the node and holds it there.
	pub fn pin(&mut self, at: Point) {
		self.place(at);
		self.fx = Some(at.x);
		self.fy = Some(at.y);
	}

	/// Releases a pinned node to the simulation.
	pub fn unpin(&mut self) {
		self.fx = None;
		self.fy = None;
	}

	/// True while both pin coordinates are set.
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() && self.fy.is_some()
	}
}

/// Parent → child link, by index into [`VisibleGraph::nodes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisualEdge {
	/// Parent index.
	pub source: usize,
	/// Child index.
	pub target: usize,
}

/// Nodes in pre-order (centre first) and one edge per non-centre node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisibleGraph {
	/// Visible nodes.
	pub nodes: Vec<GraphVisualNode>,
	/// Parent to child links.
	pub edges: Vec<VisualEdge>,
}

impl VisibleGraph {
	/// Index of the node with `key`.
	pub fn index_of_key(&self, key: &str) -> Option<usize> {
		self.nodes.iter().position(|node| node.key == key)
	}

	/// True if any visible node carries `id`.
	pub fn contains_id(&self, id: NodeId) -> bool {
		self.nodes.iter().any(|node| node.id == id)
	}

	/// Perimeter-to-perimeter segment for `edge`, once both ends are placed.
	pub fn edge_endpoints(&self, edge: VisualEdge, padding: f64) -> Option<(Point, Point)> {
		let source = self.nodes.get(edge.source)?;
		let target = self.nodes.get(edge.target)?;
		edge_endpoints(source.placement(), target.placement(), padding)
	}
}
