use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier shared by real topics and synthetic grouping nodes.
///
/// Real topic ids are non-negative. Every negative value is reserved for
/// nodes the navigator synthesizes itself (grades, quarters, the centre).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl NodeId {
	/// True for ids in the synthetic (negative) range.
	pub fn is_reserved(self) -> bool {
		self.0 < 0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Author-defined topic, possibly carrying nested subtopics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopicRef {
	/// Real, non-negative topic id.
	pub id: NodeId,
	/// Display name; `topic` on the wire.
	#[serde(rename = "topic")]
	pub label: String,
	/// Authored parent, `None` for a top-level topic.
	#[serde(default)]
	pub parent_topic_id: Option<NodeId>,
	/// Nested subtopics, in authored order.
	#[serde(default)]
	pub children: Vec<TopicRef>,
}

impl TopicRef {
	/// A top-level topic with no subtopics.
	pub fn new(id: i64, label: impl Into<String>) -> Self {
		Self {
			id: NodeId(id),
			label: label.into(),
			parent_topic_id: None,
			children: Vec::new(),
		}
	}

	/// Replaces the subtopics.
	pub fn with_children(mut self, children: Vec<TopicRef>) -> Self {
		self.children = children;
		self
	}
}

/// A flat, taggable unit of content (card, lesson plan, test...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
	/// Id of the content item itself, not of a tree node.
	pub id: i64,
	/// School grade; records without one hang their topic off the root.
	#[serde(default)]
	pub grade: Option<u32>,
	/// Quarter within `grade`, 1-based.
	#[serde(default)]
	pub quarter: Option<u32>,
	/// Topic the record is filed under, with its subtopics.
	#[serde(default)]
	pub topic: Option<TopicRef>,
}

/// What a [`TreeNode`] stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
	/// Synthetic grouping node for one grade.
	Grade {
		/// School grade number.
		grade: u32,
	},
	/// Synthetic grouping node for one quarter of a grade.
	Quarter {
		/// Grade the quarter belongs to.
		grade: u32,
		/// Quarter number within the grade.
		quarter: u32,
	},
	/// An authored topic.
	Topic,
}

impl NodeKind {
	/// Grades and quarters, which have no backing entity.
	pub fn is_grouping(self) -> bool {
		!matches!(self, NodeKind::Topic)
	}
}

/// One node of the derived grade → quarter → topic forest.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
	/// Topic id, or a synthetic id for grades and quarters.
	pub id: NodeId,
	/// Display name.
	pub label: String,
	/// `None` for forest roots.
	pub parent_id: Option<NodeId>,
	/// Children in first-appearance order.
	pub children: Vec<TreeNode>,
	/// Grade, quarter or topic.
	pub kind: NodeKind,
	/// 0 for forest roots.
	pub depth: u32,
}

impl TreeNode {
	/// True when the node has no children.
	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// Depth-first search for the first node carrying `id`.
	pub fn find(&self, id: NodeId) -> Option<&TreeNode> {
		if self.id == id {
			return Some(self);
		}
		self.children.iter().find_map(|child| child.find(id))
	}

	/// Ids of every node strictly below this one, pre-order.
	pub fn descendant_ids(&self) -> Vec<NodeId> {
		let mut out = Vec::new();
		let mut stack: Vec<&TreeNode> = self.children.iter().rev().collect();
		while let Some(node) = stack.pop() {
			out.push(node.id);
			stack.extend(node.children.iter().rev());
		}
		out
	}

	/// Number of leaves below this node, itself if it is one.
	pub fn leaf_count(&self) -> usize {
		if self.is_leaf() {
			1
		} else {
			self.children.iter().map(TreeNode::leaf_count).sum()
		}
	}
}

/// Search a whole forest, roots in order.
pub fn find_in_forest(forest: &[TreeNode], id: NodeId) -> Option<&TreeNode> {
	forest.iter().find_map(|root| root.find(id))
}
