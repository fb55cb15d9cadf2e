use std::collections::{HashMap, HashSet};

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use crate::topics::{GraphVisualNode, NodeId, NodeStyle, Point, VisibleGraph};

/// Extra world-space margin around a node that still counts as a hit.
pub const HIT_SLOP: f64 = 4.0;
/// Screen pixels a press may travel before it stops being a click.
pub const CLICK_TOLERANCE: f64 = 3.0;
const SPAWN_DISTANCE: f64 = 60.0;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Simulation tuning plus the node look.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphStyle {
	pub nodes: NodeStyle,
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
	pub background: &'static str,
	pub edge_rgb: (u8, u8, u8),
}

impl Default for GraphStyle {
	fn default() -> Self {
		Self {
			nodes: NodeStyle::default(),
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			background: "#1a1a2e",
			edge_rgb: (100, 180, 255),
		}
	}
}

impl GraphStyle {
	fn simulation(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}

/// Index of the simulation node's counterpart in [`VisibleGraph::nodes`].
#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub slot: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub slot: Option<usize>,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	delay_t: f64,
}

pub struct ForceGraphState {
	graph: ForceGraph<NodeInfo, ()>,
	handles: Vec<DefaultNodeIdx>,
	pub visible: VisibleGraph,
	pub style: GraphStyle,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
}

impl ForceGraphState {
	pub fn new(data: &VisibleGraph, width: f64, height: f64, style: GraphStyle) -> Self {
		let mut state = Self {
			graph: ForceGraph::new(style.simulation()),
			handles: Vec::new(),
			visible: VisibleGraph::default(),
			style,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
		};
		state.rebuild(data);
		state
	}

	/// Replace the displayed node set. Nodes that stay visible keep their
	/// position, new ones spawn next to their parent, and every drag pin is
	/// dropped except the centre's.
	pub fn rebuild(&mut self, data: &VisibleGraph) {
		let previous: HashMap<String, Point> = self
			.visible
			.nodes
			.iter()
			.filter_map(|node| Some((node.key.clone(), node.position()?)))
			.collect();

		let mut visible = data.clone();
		for slot in 0..visible.nodes.len() {
			let at = previous
				.get(visible.nodes[slot].key.as_str())
				.copied()
				.unwrap_or_else(|| spawn_point(&visible.nodes, slot));
			let node = &mut visible.nodes[slot];
			node.unpin();
			node.place(at);
		}
		if let Some(center) = visible.nodes.first_mut() {
			center.pin(Point::new(0.0, 0.0));
		}

		let mut graph = ForceGraph::new(self.style.simulation());
		let handles: Vec<DefaultNodeIdx> = visible
			.nodes
			.iter()
			.enumerate()
			.map(|(slot, node)| {
				let at = node.position().unwrap_or_default();
				graph.add_node(NodeData {
					x: at.x as f32,
					y: at.y as f32,
					mass: 5.0 + 5.0 * node.size_weight as f32,
					is_anchor: node.is_pinned(),
					user_data: NodeInfo { slot },
				})
			})
			.collect();
		for edge in &visible.edges {
			if let (Some(&src), Some(&tgt)) = (handles.get(edge.source), handles.get(edge.target)) {
				graph.add_edge(src, tgt, EdgeData::default());
			}
		}

		debug!(
			"Simulation rebuilt: {} nodes ({} carried over)",
			visible.nodes.len(),
			visible
				.nodes
				.iter()
				.filter(|n| previous.contains_key(n.key.as_str()))
				.count()
		);
		self.graph = graph;
		self.handles = handles;
		self.visible = visible;
		self.drag = DragState::default();
		self.hover = HoverState::default();
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node under the screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.visible.nodes.iter().rposition(|node| {
			node.position()
				.is_some_and(|at| node.shape.contains(gx - at.x, gy - at.y, HIT_SLOP))
		})
	}

	pub fn node_id(&self, slot: usize) -> Option<NodeId> {
		self.visible.nodes.get(slot).map(|node| node.id)
	}

	fn move_sim_node(&mut self, slot: usize, at: Point, anchored: bool) {
		let Some(&handle) = self.handles.get(slot) else {
			return;
		};
		self.graph.visit_nodes_mut(|node| {
			if node.index() == handle {
				node.data.x = at.x as f32;
				node.data.y = at.y as f32;
				node.data.is_anchor = anchored;
			}
		});
	}

	/// Press at a screen point: grab the node there or start panning.
	pub fn press(&mut self, sx: f64, sy: f64) {
		match self.node_at_position(sx, sy) {
			Some(slot) => {
				let at = self.visible.nodes[slot].position().unwrap_or_default();
				self.drag = DragState {
					active: true,
					slot: Some(slot),
					moved: false,
					start_x: sx,
					start_y: sy,
					node_start_x: at.x,
					node_start_y: at.y,
				};
			}
			None => {
				self.pan = PanState {
					active: true,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
				};
			}
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(sx, sy);
			self.set_hover(hovered);
		}

		if self.drag.active {
			let Some(slot) = self.drag.slot else {
				return;
			};
			let (dx, dy) = (sx - self.drag.start_x, sy - self.drag.start_y);
			if !self.drag.moved && dx.hypot(dy) < CLICK_TOLERANCE {
				return;
			}
			self.drag.moved = true;
			if slot == 0 {
				// The centre stays at the origin.
				return;
			}
			let at = Point::new(
				self.drag.node_start_x + dx / self.transform.k,
				self.drag.node_start_y + dy / self.transform.k,
			);
			self.visible.nodes[slot].pin(at);
			self.move_sim_node(slot, at, true);
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	/// Release the pointer. Returns the slot that was clicked, if the press
	/// never turned into a drag.
	pub fn release(&mut self) -> Option<usize> {
		let clicked = match (self.drag.active, self.drag.slot) {
			(true, Some(slot)) if !self.drag.moved => Some(slot),
			(true, Some(slot)) if slot != 0 => {
				if let Some(at) = self.visible.nodes[slot].position() {
					self.visible.nodes[slot].unpin();
					self.move_sim_node(slot, at, false);
				}
				None
			}
			_ => None,
		};
		self.drag = DragState::default();
		self.pan.active = false;
		clicked
	}

	pub fn leave(&mut self) {
		self.release();
		self.set_hover(None);
	}

	pub fn zoom_at(&mut self, sx: f64, sy: f64, zoom_in: bool) {
		let factor = if zoom_in { 1.1 } else { 0.9 };
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(slot) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for edge in &self.visible.edges {
				if edge.source == slot {
					self.hover.neighbors.insert(edge.target);
				} else if edge.target == slot {
					self.hover.neighbors.insert(edge.source);
				}
			}
		}
	}

	pub fn is_highlighted(&self, slot: usize) -> bool {
		self.hover.node == Some(slot)
			|| self.hover.neighbors.contains(&slot)
			|| self.hover.prev_node == Some(slot)
			|| self.hover.prev_neighbors.contains(&slot)
	}

	pub fn is_hovered(&self, slot: usize) -> bool {
		self.hover.node == Some(slot) || self.hover.prev_node == Some(slot)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;

		let nodes = &mut self.visible.nodes;
		self.graph.visit_nodes(|node| {
			if let Some(visual) = nodes.get_mut(node.data.user_data.slot) {
				visual.place(Point::new(node.x() as f64, node.y() as f64));
			}
		});

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	/// Keeps the world origin at the same spot relative to the viewport
	/// centre. Repeating a resize to the same size changes nothing.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.transform.x += (width - self.width) / 2.0;
		self.transform.y += (height - self.height) / 2.0;
		self.width = width;
		self.height = height;
	}
}

/// Where a node without a previous position appears: a short hop from its
/// (already placed) parent, fanned out by slot.
fn spawn_point(nodes: &[GraphVisualNode], slot: usize) -> Point {
	let parent = nodes[slot]
		.parent
		.and_then(|parent| nodes.get(parent))
		.and_then(GraphVisualNode::position);
	match parent {
		Some(origin) => {
			let angle = slot as f64 * GOLDEN_ANGLE;
			Point::new(
				origin.x + SPAWN_DISTANCE * angle.cos(),
				origin.y + SPAWN_DISTANCE * angle.sin(),
			)
		}
		None => Point::new(0.0, 0.0),
	}
}
