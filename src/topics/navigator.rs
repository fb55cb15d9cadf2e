//! Expand/collapse state over a topic forest and the events it raises.
//!
//! The forest hangs off a virtual centre node standing for the whole
//! subject. The centre is always shown and always open, so every forest
//! root is visible. Anything deeper is visible only when its parent is.

use std::collections::HashSet;

use log::{debug, info};

use super::builder::build_forest;
use super::error::TopicTreeError;
use super::types::{ContentRecord, NodeId, NodeKind, TreeNode, find_in_forest};
use super::visual::{GraphVisualNode, NodeStyle, VisibleGraph, VisualEdge};

/// Reserved id of the subject-wide centre node.
pub const CENTER_ID: NodeId = NodeId(-1);

/// Which topic filter is active; `None` clears it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionEvent {
	/// Topic to filter by.
	pub topic_id: Option<NodeId>,
}

/// Ask the host to open the topic-creation form under `parent_topic_id`
/// (`None` for a top-level topic).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateRequest {
	/// Parent of the new topic.
	pub parent_topic_id: Option<NodeId>,
}

/// Outcome of a primary click.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeActivation {
	/// The click opened or closed a branch.
	pub toggled: bool,
	/// Filter change to apply, if any.
	pub selection: Option<SelectionEvent>,
}

/// Expand/collapse state for one subject's forest.
///
/// Expansion is keyed by id, so every copy of a repeated topic opens and
/// closes together.
#[derive(Clone, Debug)]
pub struct TopicNavigator {
	subject: String,
	forest: Vec<TreeNode>,
	expanded: HashSet<NodeId>,
}

impl TopicNavigator {
	/// Navigator with only the centre open.
	pub fn new(subject: impl Into<String>, forest: Vec<TreeNode>) -> Self {
		Self {
			subject: subject.into(),
			forest,
			expanded: HashSet::from([CENTER_ID]),
		}
	}

	/// Builds the forest from `records` first.
	pub fn from_records(
		subject: impl Into<String>,
		records: &[ContentRecord],
	) -> Result<Self, TopicTreeError> {
		Ok(Self::new(subject, build_forest(records)?))
	}

	/// Title shown on the centre node.
	pub fn subject(&self) -> &str {
		&self.subject
	}

	/// Current forest.
	pub fn forest(&self) -> &[TreeNode] {
		&self.forest
	}

	/// Open ids, the centre included.
	pub fn expanded_ids(&self) -> &HashSet<NodeId> {
		&self.expanded
	}

	/// True if `id` is open.
	pub fn is_expanded(&self, id: NodeId) -> bool {
		self.expanded.contains(&id)
	}

	/// Switch to another subject; all expansion state starts over.
	pub fn load_subject(&mut self, subject: impl Into<String>, forest: Vec<TreeNode>) {
		self.subject = subject.into();
		self.forest = forest;
		self.collapse_all();
		info!("Loaded subject '{}' ({} roots)", self.subject, self.forest.len());
	}

	/// Swap in a freshly built forest for the same subject. Expanded nodes
	/// that are still present, still have children and are still reachable
	/// stay open.
	pub fn replace_forest(&mut self, forest: Vec<TreeNode>) {
		self.forest = forest;
		let kept = self.reachable_expanded();
		debug!(
			"Forest replaced; kept {} of {} expanded ids",
			kept.len(),
			self.expanded.len()
		);
		self.expanded = kept;
	}

	fn reachable_expanded(&self) -> HashSet<NodeId> {
		let mut kept = HashSet::from([CENTER_ID]);
		let mut stack: Vec<&TreeNode> = self.forest.iter().collect();
		while let Some(node) = stack.pop() {
			if self.expanded.contains(&node.id) && !node.is_leaf() {
				kept.insert(node.id);
				stack.extend(node.children.iter());
			}
		}
		kept
	}

	/// Closes everything except the centre.
	pub fn collapse_all(&mut self) {
		self.expanded.clear();
		self.expanded.insert(CENTER_ID);
	}

	/// Display name of `id`, the subject title for the centre.
	pub fn label_of(&self, id: NodeId) -> Option<&str> {
		if id == CENTER_ID {
			return Some(&self.subject);
		}
		find_in_forest(&self.forest, id).map(|node| node.label.as_str())
	}

	/// Every occurrence of `id`. With `on_screen` the walk only descends
	/// through open nodes, so hidden copies are skipped.
	fn occurrences(&self, id: NodeId, on_screen: bool) -> Vec<&TreeNode> {
		let mut found = Vec::new();
		let mut stack: Vec<&TreeNode> = self.forest.iter().collect();
		while let Some(node) = stack.pop() {
			if node.id == id {
				found.push(node);
			}
			if !on_screen || self.expanded.contains(&node.id) {
				stack.extend(node.children.iter());
			}
		}
		found
	}

	/// `id` plus every open descendant reached through open nodes below
	/// one of its occurrences. A closed node stops the walk, so an id that
	/// is open elsewhere in the forest is left alone.
	fn closing_ids(&self, id: NodeId) -> HashSet<NodeId> {
		let mut closing = HashSet::from([id]);
		let mut stack: Vec<&TreeNode> = self
			.occurrences(id, false)
			.into_iter()
			.flat_map(|node| node.children.iter())
			.collect();
		while let Some(node) = stack.pop() {
			if self.expanded.contains(&node.id) {
				closing.insert(node.id);
				stack.extend(node.children.iter());
			}
		}
		closing
	}

	/// True if some copy of `id` is on screen.
	pub fn is_visible(&self, id: NodeId) -> bool {
		id == CENTER_ID || !self.occurrences(id, true).is_empty()
	}

	/// Open or close `id`. Closing also closes the open branches below it.
	///
	/// Returns `false` without touching state for the centre, for ids that
	/// are gone or hidden, and for leaves.
	pub fn toggle_expand(&mut self, id: NodeId) -> bool {
		if id == CENTER_ID {
			return false;
		}
		let is_branch = self
			.occurrences(id, true)
			.iter()
			.any(|node| !node.is_leaf());
		if !is_branch {
			debug!("Ignoring toggle of {id}: not a visible branch");
			return false;
		}

		if self.expanded.contains(&id) {
			let closing = self.closing_ids(id);
			self.expanded.retain(|open| !closing.contains(open));
			info!("Collapsed {id} ({} ids closed)", closing.len());
		} else {
			self.expanded.insert(id);
			info!("Expanded {id}");
		}
		true
	}

	/// Filter change for a click on `id`: the centre clears the filter,
	/// topics set it, grouping nodes and unknown ids do nothing.
	pub fn select_node(&self, id: NodeId) -> Option<SelectionEvent> {
		if id == CENTER_ID {
			return Some(SelectionEvent { topic_id: None });
		}
		match find_in_forest(&self.forest, id)?.kind {
			NodeKind::Topic => Some(SelectionEvent { topic_id: Some(id) }),
			NodeKind::Grade { .. } | NodeKind::Quarter { .. } => None,
		}
	}

	/// Grouping nodes are not authorable, so they never produce a request.
	pub fn request_create_child(&self, id: NodeId) -> Option<CreateRequest> {
		if id == CENTER_ID {
			return Some(CreateRequest {
				parent_topic_id: None,
			});
		}
		match find_in_forest(&self.forest, id)?.kind {
			NodeKind::Topic => Some(CreateRequest {
				parent_topic_id: Some(id),
			}),
			NodeKind::Grade { .. } | NodeKind::Quarter { .. } => None,
		}
	}

	/// Primary click: branches toggle, the centre and real topics select.
	pub fn activate(&mut self, id: NodeId) -> NodeActivation {
		let toggled = self.toggle_expand(id);
		NodeActivation {
			toggled,
			selection: self.select_node(id),
		}
	}

	/// Nodes and edges to draw, centre first, in pre-order.
	pub fn visible_set(&self, style: &NodeStyle) -> VisibleGraph {
		let mut graph = VisibleGraph::default();
		let center = GraphVisualNode::center(CENTER_ID, &self.subject, style);
		let center_key = center.key.clone();
		graph.nodes.push(center);
		for root in &self.forest {
			self.push_visible(root, 0, CENTER_ID, &center_key, style, &mut graph);
		}
		debug!(
			"Visible set for '{}': {} nodes, {} edges",
			self.subject,
			graph.nodes.len(),
			graph.edges.len()
		);
		graph
	}

	fn push_visible(
		&self,
		node: &TreeNode,
		parent: usize,
		parent_id: NodeId,
		parent_key: &str,
		style: &NodeStyle,
		graph: &mut VisibleGraph,
	) {
		let idx = graph.nodes.len();
		let key = format!("{parent_key}/{}", node.id);
		let open = self.expanded.contains(&node.id);
		graph.nodes.push(GraphVisualNode::for_tree_node(
			node,
			parent,
			parent_id,
			key.clone(),
			open,
			style,
		));
		graph.edges.push(VisualEdge {
			source: parent,
			target: idx,
		});
		if open {
			for child in &node.children {
				self.push_visible(child, idx, node.id, &key, style, graph);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::*;
	use crate::topics::builder::{compute_grade_id, compute_quarter_id};
	use crate::topics::types::TopicRef;
	use crate::topics::visual::{CENTER_WEIGHT, VisualKind};

	fn record(id: i64, grade: Option<u32>, quarter: Option<u32>, topic: Option<TopicRef>) -> ContentRecord {
		ContentRecord {
			id,
			grade,
			quarter,
			topic,
		}
	}

	/// Grade 5 → quarter 1 → Algebra → Equations → Linear, plus a bare
	/// "Intro" topic at the root.
	fn navigator() -> TopicNavigator {
		let algebra = TopicRef::new(10, "Algebra").with_children(vec![
			TopicRef::new(12, "Equations").with_children(vec![TopicRef::new(13, "Linear")]),
		]);
		TopicNavigator::from_records(
			"Mathematics",
			&[
				record(1, Some(5), Some(1), Some(algebra)),
				record(2, Some(5), Some(1), Some(TopicRef::new(11, "Geometry"))),
				record(3, None, None, Some(TopicRef::new(7, "Intro"))),
			],
		)
		.unwrap()
	}

	fn visible_keys(nav: &TopicNavigator) -> BTreeSet<String> {
		nav.visible_set(&NodeStyle::default())
			.nodes
			.into_iter()
			.map(|node| node.key)
			.collect()
	}

	#[test]
	fn starts_with_centre_and_roots() {
		let nav = navigator();
		assert_eq!(nav.expanded_ids(), &HashSet::from([CENTER_ID]));
		let graph = nav.visible_set(&NodeStyle::default());
		let ids: Vec<NodeId> = graph.nodes.iter().map(|n| n.id).collect();
		assert_eq!(ids, vec![CENTER_ID, compute_grade_id(5), NodeId(7)]);
		assert_eq!(
			graph.edges,
			vec![
				VisualEdge { source: 0, target: 1 },
				VisualEdge { source: 0, target: 2 },
			]
		);
		assert_eq!(graph.nodes[0].kind, VisualKind::Center);
		assert_eq!(graph.nodes[1].parent_id, Some(CENTER_ID));
		assert!(graph.nodes[1].is_expandable);
		assert!(!graph.nodes[2].is_expandable);
	}

	#[test]
	fn expanding_reveals_exactly_the_children() {
		let mut nav = navigator();
		let before = visible_keys(&nav);
		assert!(nav.toggle_expand(compute_grade_id(5)));
		let after = visible_keys(&nav);

		let added: Vec<&String> = after.difference(&before).collect();
		assert_eq!(added, vec!["-1/-1005/-2051"]);
		assert!(before.is_subset(&after));
	}

	#[test]
	fn collapse_closes_the_whole_subtree() {
		let mut nav = navigator();
		let (grade, quarter) = (compute_grade_id(5), compute_quarter_id(5, 1));
		assert!(nav.toggle_expand(grade));
		assert!(nav.toggle_expand(quarter));
		assert!(nav.toggle_expand(NodeId(10)));
		assert!(nav.toggle_expand(NodeId(12)));
		assert!(nav.is_visible(NodeId(13)));

		assert!(nav.toggle_expand(grade));
		for id in [quarter, NodeId(10), NodeId(12), NodeId(13)] {
			assert!(!nav.is_visible(id), "{id} still visible");
			assert!(!nav.is_expanded(id), "{id} still expanded");
		}

		// Re-opening the grade shows only the quarter again.
		assert!(nav.toggle_expand(grade));
		assert!(nav.is_visible(quarter));
		assert!(!nav.is_visible(NodeId(10)));
	}

	#[test]
	fn collapse_leaves_shared_ids_open_elsewhere() {
		// Sets → Subsets → Power set → Cardinality under grade 5; the
		// power-set branch also hangs off grade 6 on its own.
		let power_set = || {
			TopicRef::new(3, "Power set").with_children(vec![TopicRef::new(4, "Cardinality")])
		};
		let sets = TopicRef::new(1, "Sets")
			.with_children(vec![TopicRef::new(2, "Subsets").with_children(vec![power_set()])]);
		let mut nav = TopicNavigator::from_records(
			"Maths",
			&[
				record(1, Some(5), Some(1), Some(sets)),
				record(2, Some(6), Some(1), Some(power_set())),
			],
		)
		.unwrap();

		for id in [
			compute_grade_id(6),
			compute_quarter_id(6, 1),
			NodeId(3),
			compute_grade_id(5),
			compute_quarter_id(5, 1),
			NodeId(1),
		] {
			assert!(nav.toggle_expand(id), "{id} did not toggle");
		}
		assert!(!nav.is_expanded(NodeId(2)));
		let before = visible_keys(&nav);

		assert!(nav.toggle_expand(NodeId(1)));
		assert!(nav.is_expanded(NodeId(3)));
		assert!(nav.is_visible(NodeId(4)));

		let after = visible_keys(&nav);
		let removed: Vec<&String> = before.difference(&after).collect();
		assert_eq!(removed, vec!["-1/-1005/-2051/1/2"]);
	}

	#[test]
	fn leaves_hidden_and_stale_ids_do_not_toggle() {
		let mut nav = navigator();
		let snapshot = nav.expanded_ids().clone();
		assert!(!nav.toggle_expand(NodeId(7)));
		assert!(!nav.toggle_expand(NodeId(12)));
		assert!(!nav.toggle_expand(NodeId(4242)));
		assert!(!nav.toggle_expand(CENTER_ID));
		assert_eq!(nav.expanded_ids(), &snapshot);
	}

	#[test]
	fn centre_always_clears_the_filter() {
		let mut nav = navigator();
		let clear = Some(SelectionEvent { topic_id: None });
		assert_eq!(nav.select_node(CENTER_ID), clear);
		nav.toggle_expand(compute_grade_id(5));
		nav.toggle_expand(compute_quarter_id(5, 1));
		assert_eq!(nav.select_node(CENTER_ID), clear);
		assert_eq!(
			nav.activate(CENTER_ID),
			NodeActivation {
				toggled: false,
				selection: clear,
			}
		);
	}

	#[test]
	fn only_real_topics_select() {
		let mut nav = navigator();
		assert_eq!(nav.select_node(compute_grade_id(5)), None);
		assert_eq!(nav.select_node(compute_quarter_id(5, 1)), None);
		assert_eq!(
			nav.select_node(NodeId(7)),
			Some(SelectionEvent {
				topic_id: Some(NodeId(7))
			})
		);
		assert_eq!(nav.select_node(NodeId(999)), None);

		let grade = nav.activate(compute_grade_id(5));
		assert!(grade.toggled);
		assert_eq!(grade.selection, None);

		let leaf = nav.activate(NodeId(7));
		assert!(!leaf.toggled);
		assert_eq!(leaf.selection.and_then(|s| s.topic_id), Some(NodeId(7)));
	}

	#[test]
	fn create_requests_skip_grouping_nodes() {
		let nav = navigator();
		assert_eq!(
			nav.request_create_child(CENTER_ID),
			Some(CreateRequest {
				parent_topic_id: None
			})
		);
		assert_eq!(
			nav.request_create_child(NodeId(12)),
			Some(CreateRequest {
				parent_topic_id: Some(NodeId(12))
			})
		);
		assert_eq!(nav.request_create_child(compute_grade_id(5)), None);
		assert_eq!(nav.request_create_child(compute_quarter_id(5, 1)), None);
	}

	#[test]
	fn centre_outweighs_every_node() {
		let mut nav = navigator();
		nav.toggle_expand(compute_grade_id(5));
		nav.toggle_expand(compute_quarter_id(5, 1));
		nav.toggle_expand(NodeId(10));
		let graph = nav.visible_set(&NodeStyle::default());
		assert_eq!(graph.nodes[0].size_weight, CENTER_WEIGHT);
		for node in &graph.nodes[1..] {
			assert!(node.size_weight < CENTER_WEIGHT);
			let parent = &graph.nodes[node.parent.unwrap()];
			assert!(parent.size_weight >= node.size_weight);
		}
	}

	#[test]
	fn repeated_topic_keeps_distinct_keys() {
		let nav = TopicNavigator::from_records(
			"Maths",
			&[
				record(1, Some(5), Some(1), Some(TopicRef::new(10, "Fractions"))),
				record(2, Some(5), Some(2), Some(TopicRef::new(10, "Fractions"))),
			],
		);
		let mut nav = nav.unwrap();
		nav.toggle_expand(compute_grade_id(5));
		nav.toggle_expand(compute_quarter_id(5, 1));
		nav.toggle_expand(compute_quarter_id(5, 2));
		let graph = nav.visible_set(&NodeStyle::default());
		let copies: Vec<&str> = graph
			.nodes
			.iter()
			.filter(|n| n.id == NodeId(10))
			.map(|n| n.key.as_str())
			.collect();
		assert_eq!(copies, vec!["-1/-1005/-2051/10", "-1/-1005/-2052/10"]);
		assert_eq!(graph.index_of_key("-1/-1005/-2052/10"), Some(5));
	}

	#[test]
	fn replacing_the_forest_keeps_reachable_branches() {
		let mut nav = navigator();
		nav.toggle_expand(compute_grade_id(5));
		nav.toggle_expand(compute_quarter_id(5, 1));
		nav.toggle_expand(NodeId(10));

		// Algebra loses its subtopics in the new data.
		let forest = build_forest(&[record(1, Some(5), Some(1), Some(TopicRef::new(10, "Algebra")))]).unwrap();
		nav.replace_forest(forest);
		assert!(nav.is_expanded(compute_grade_id(5)));
		assert!(nav.is_expanded(compute_quarter_id(5, 1)));
		assert!(!nav.is_expanded(NodeId(10)));
		assert!(nav.is_expanded(CENTER_ID));
	}

	#[test]
	fn loading_a_subject_resets_expansion() {
		let mut nav = navigator();
		nav.toggle_expand(compute_grade_id(5));
		let forest = build_forest(&[record(1, Some(5), None, Some(TopicRef::new(3, "Optics")))]).unwrap();
		nav.load_subject("Physics", forest);
		assert_eq!(nav.subject(), "Physics");
		assert_eq!(nav.expanded_ids(), &HashSet::from([CENTER_ID]));
		assert_eq!(nav.label_of(CENTER_ID), Some("Physics"));
		assert_eq!(nav.label_of(NodeId(3)), Some("Optics"));
	}
}
