//! Flat content records → grade / quarter / topic forest.
//!
//! Grades and quarters have no backing entity, so they get synthetic ids in
//! the negative range. Topics keep their real (non-negative) ids and bring
//! their authored subtopic tree along unchanged.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use super::error::TopicTreeError;
use super::types::{ContentRecord, NodeId, NodeKind, TopicRef, TreeNode};

/// Grade `g` gets the id `GRADE_ID_BASE - g`.
pub const GRADE_ID_BASE: i64 = -1000;
/// Quarter `q` of grade `g` gets the id `QUARTER_ID_BASE - (10g + q)`.
pub const QUARTER_ID_BASE: i64 = -2000;
/// Largest grade that keeps grade ids clear of quarter ids.
pub const MAX_GRADE: u32 = 999;
/// Largest quarter that fits in one decimal digit of the quarter id.
pub const MAX_QUARTER: u32 = 9;

/// Synthetic id of grade `grade`, in [-1999, -1000] for grades up to
/// [`MAX_GRADE`].
pub fn compute_grade_id(grade: u32) -> NodeId {
	NodeId(GRADE_ID_BASE - grade as i64)
}

/// Synthetic id of a quarter, in [-11999, -2000] for grades up to
/// [`MAX_GRADE`] and quarters up to [`MAX_QUARTER`]. Never equal to a grade
/// id.
pub fn compute_quarter_id(grade: u32, quarter: u32) -> NodeId {
	NodeId(QUARTER_ID_BASE - (grade as i64 * 10 + quarter as i64))
}

/// Display name of a grade node.
pub fn grade_label(grade: u32) -> String {
	format!("{grade}-сынып")
}

/// Display name of a quarter node.
pub fn quarter_label(quarter: u32) -> String {
	format!("{quarter}-тоқсан")
}

enum Slot {
	Group(usize),
	Topic(TreeNode),
}

struct Group {
	id: NodeId,
	label: String,
	parent_id: Option<NodeId>,
	kind: NodeKind,
	depth: u32,
	slots: Vec<Slot>,
}

impl Group {
	fn has_topic(&self, id: NodeId) -> bool {
		self.slots
			.iter()
			.any(|slot| matches!(slot, Slot::Topic(node) if node.id == id))
	}
}

#[derive(Default)]
struct ForestDraft {
	groups: Vec<Group>,
	group_keys: HashMap<String, usize>,
	root_topic_keys: HashSet<String>,
	roots: Vec<Slot>,
}

impl ForestDraft {
	/// Returns the group registered under `key`, creating it on first sight.
	fn ensure_group(&mut self, key: String, parent: Option<usize>, make: impl FnOnce() -> Group) -> usize {
		if let Some(&idx) = self.group_keys.get(&key) {
			return idx;
		}
		let idx = self.groups.len();
		self.groups.push(make());
		match parent {
			Some(parent) => self.groups[parent].slots.push(Slot::Group(idx)),
			None => self.roots.push(Slot::Group(idx)),
		}
		self.group_keys.insert(key, idx);
		idx
	}

	fn ensure_grade(&mut self, grade: u32) -> usize {
		self.ensure_group(format!("grade-{grade}"), None, || Group {
			id: compute_grade_id(grade),
			label: grade_label(grade),
			parent_id: None,
			kind: NodeKind::Grade { grade },
			depth: 0,
			slots: Vec::new(),
		})
	}

	fn ensure_quarter(&mut self, grade_idx: usize, grade: u32, quarter: u32) -> usize {
		let parent_id = self.groups[grade_idx].id;
		self.ensure_group(
			format!("grade-{grade}-quarter-{quarter}"),
			Some(grade_idx),
			|| Group {
				id: compute_quarter_id(grade, quarter),
				label: quarter_label(quarter),
				parent_id: Some(parent_id),
				kind: NodeKind::Quarter { grade, quarter },
				depth: 1,
				slots: Vec::new(),
			},
		)
	}

	/// Dedup is per parent: the same topic may sit under two quarters.
	fn attach_topic(&mut self, group_idx: usize, topic: &TopicRef) -> Result<(), TopicTreeError> {
		let group = &mut self.groups[group_idx];
		if group.has_topic(topic.id) {
			return Ok(());
		}
		let node = embed_topic(topic, Some(group.id), group.depth + 1, &mut Vec::new())?;
		group.slots.push(Slot::Topic(node));
		Ok(())
	}

	fn add_root_topic(&mut self, topic: &TopicRef) -> Result<(), TopicTreeError> {
		if !self.root_topic_keys.insert(format!("topic-{}", topic.id)) {
			return Ok(());
		}
		let node = embed_topic(topic, None, 0, &mut Vec::new())?;
		self.roots.push(Slot::Topic(node));
		Ok(())
	}

	fn add_record(&mut self, record: &ContentRecord) -> Result<(), TopicTreeError> {
		match (record.grade, &record.topic) {
			(Some(grade), topic) => {
				if grade > MAX_GRADE {
					return Err(TopicTreeError::GradeOutOfRange {
						record_id: record.id,
						grade,
					});
				}
				let grade_idx = self.ensure_grade(grade);
				match (record.quarter, topic) {
					(Some(quarter), topic) => {
						if quarter > MAX_QUARTER {
							return Err(TopicTreeError::QuarterOutOfRange {
								record_id: record.id,
								quarter,
							});
						}
						let quarter_idx = self.ensure_quarter(grade_idx, grade, quarter);
						if let Some(topic) = topic {
							self.attach_topic(quarter_idx, topic)?;
						}
					}
					(None, Some(topic)) => self.attach_topic(grade_idx, topic)?,
					(None, None) => {}
				}
			}
			(None, Some(topic)) => self.add_root_topic(topic)?,
			(None, None) => {}
		}
		Ok(())
	}

	fn finish(mut self) -> Vec<TreeNode> {
		let roots = std::mem::take(&mut self.roots);
		roots
			.into_iter()
			.map(|slot| self.assemble(slot))
			.collect()
	}

	fn assemble(&mut self, slot: Slot) -> TreeNode {
		match slot {
			Slot::Topic(node) => node,
			Slot::Group(idx) => {
				let slots = std::mem::take(&mut self.groups[idx].slots);
				let children = slots.into_iter().map(|slot| self.assemble(slot)).collect();
				let group = &self.groups[idx];
				TreeNode {
					id: group.id,
					label: group.label.clone(),
					parent_id: group.parent_id,
					children,
					kind: group.kind,
					depth: group.depth,
				}
			}
		}
	}
}

/// Copies a topic and its authored subtree. `path` holds the ids of the
/// topics currently being embedded above this one.
fn embed_topic(
	topic: &TopicRef,
	parent_id: Option<NodeId>,
	depth: u32,
	path: &mut Vec<NodeId>,
) -> Result<TreeNode, TopicTreeError> {
	if topic.id.is_reserved() {
		return Err(TopicTreeError::ReservedTopicId { topic_id: topic.id });
	}
	if path.contains(&topic.id) {
		return Err(TopicTreeError::TopicCycle { topic_id: topic.id });
	}
	path.push(topic.id);
	let children = topic
		.children
		.iter()
		.map(|child| embed_topic(child, Some(topic.id), depth + 1, path))
		.collect::<Result<Vec<_>, _>>()?;
	path.pop();

	Ok(TreeNode {
		id: topic.id,
		label: topic.label.clone(),
		parent_id,
		children,
		kind: NodeKind::Topic,
		depth,
	})
}

/// Builds the forest of root nodes (grades and bare topics) in the order
/// their grouping key first shows up in `records`.
pub fn build_forest(records: &[ContentRecord]) -> Result<Vec<TreeNode>, TopicTreeError> {
	let mut draft = ForestDraft::default();
	for record in records {
		if let Err(err) = draft.add_record(record) {
			warn!("Rejecting topic forest: {err}");
			return Err(err);
		}
	}
	let forest = draft.finish();
	debug!(
		"Built topic forest: {} records, {} roots",
		records.len(),
		forest.len()
	);
	Ok(forest)
}

/// Nests a flat topic list through `parent_topic_id`.
///
/// Input order is kept among siblings. A topic whose parent is missing from
/// the list becomes a root. Topics that can only be reached through a parent
/// loop are reported as a cycle.
pub fn nest_topics(flat: Vec<TopicRef>) -> Result<Vec<TopicRef>, TopicTreeError> {
	let known: HashSet<NodeId> = flat.iter().map(|topic| topic.id).collect();
	let mut children_of: HashMap<NodeId, Vec<usize>> = HashMap::new();
	let mut root_idxs = Vec::new();

	for (idx, topic) in flat.iter().enumerate() {
		match topic.parent_topic_id {
			Some(parent) if parent == topic.id => {
				return Err(TopicTreeError::TopicCycle { topic_id: topic.id });
			}
			Some(parent) if known.contains(&parent) => {
				children_of.entry(parent).or_default().push(idx)
			}
			_ => root_idxs.push(idx),
		}
	}

	let mut slots: Vec<Option<TopicRef>> = flat.into_iter().map(Some).collect();
	let roots: Vec<TopicRef> = root_idxs
		.into_iter()
		.filter_map(|idx| take_nested(idx, &mut slots, &mut children_of))
		.collect();

	if let Some(stranded) = slots.iter().flatten().next() {
		return Err(TopicTreeError::TopicCycle { topic_id: stranded.id });
	}
	Ok(roots)
}

fn take_nested(
	idx: usize,
	slots: &mut [Option<TopicRef>],
	children_of: &mut HashMap<NodeId, Vec<usize>>,
) -> Option<TopicRef> {
	let mut topic = slots[idx].take()?;
	let child_idxs = children_of.remove(&topic.id).unwrap_or_default();
	for child in child_idxs {
		if let Some(nested) = take_nested(child, slots, children_of) {
			topic.children.push(nested);
		}
	}
	Some(topic)
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	fn record(id: i64, grade: Option<u32>, quarter: Option<u32>, topic: Option<TopicRef>) -> ContentRecord {
		ContentRecord {
			id,
			grade,
			quarter,
			topic,
		}
	}

	fn ids(nodes: &[TreeNode]) -> Vec<i64> {
		nodes.iter().map(|node| node.id.0).collect()
	}

	#[test]
	fn fractions_and_decimals_share_one_quarter() {
		let records = vec![
			record(1, Some(5), Some(1), Some(TopicRef::new(10, "Fractions"))),
			record(2, Some(5), Some(1), Some(TopicRef::new(11, "Decimals"))),
			record(3, Some(5), Some(2), None),
		];
		let forest = build_forest(&records).unwrap();

		assert_eq!(forest.len(), 1);
		let grade = &forest[0];
		assert_eq!(grade.id, compute_grade_id(5));
		assert_eq!(grade.label, "5-сынып");
		assert_eq!(grade.kind, NodeKind::Grade { grade: 5 });
		assert_eq!(grade.parent_id, None);
		assert_eq!(ids(&grade.children), vec![-2051, -2052]);

		let q1 = &grade.children[0];
		assert_eq!(q1.label, "1-тоқсан");
		assert_eq!(q1.parent_id, Some(grade.id));
		assert_eq!(q1.depth, 1);
		assert_eq!(ids(&q1.children), vec![10, 11]);
		assert!(q1.children.iter().all(|t| t.parent_id == Some(q1.id) && t.depth == 2));

		assert!(grade.children[1].children.is_empty());
	}

	#[test]
	fn bare_topic_becomes_a_root() {
		let forest = build_forest(&[record(1, None, None, Some(TopicRef::new(7, "Intro")))]).unwrap();
		assert_eq!(forest.len(), 1);
		assert_eq!(forest[0].id, NodeId(7));
		assert_eq!(forest[0].parent_id, None);
		assert!(forest[0].children.is_empty());
		assert_eq!(forest[0].kind, NodeKind::Topic);
	}

	#[test]
	fn bare_topic_root_is_created_once() {
		let intro = TopicRef::new(7, "Intro");
		let forest = build_forest(&[
			record(1, None, None, Some(intro.clone())),
			record(2, None, Some(3), Some(intro)),
		])
		.unwrap();
		assert_eq!(ids(&forest), vec![7]);
	}

	#[test]
	fn records_without_grade_or_topic_are_ignored() {
		let forest = build_forest(&[record(1, None, Some(2), None), record(2, None, None, None)]).unwrap();
		assert!(forest.is_empty());
	}

	#[test]
	fn topic_without_quarter_hangs_off_the_grade() {
		let forest = build_forest(&[
			record(1, Some(7), None, Some(TopicRef::new(3, "Optics"))),
			record(2, Some(7), Some(2), Some(TopicRef::new(4, "Waves"))),
			record(3, Some(7), None, Some(TopicRef::new(3, "Optics"))),
		])
		.unwrap();
		let grade = &forest[0];
		assert_eq!(ids(&grade.children), vec![3, compute_quarter_id(7, 2).0]);
		assert_eq!(grade.children[0].depth, 1);
		assert_eq!(grade.children[1].children[0].depth, 2);
	}

	#[test]
	fn roots_follow_first_appearance() {
		let forest = build_forest(&[
			record(1, Some(9), Some(1), None),
			record(2, None, None, Some(TopicRef::new(40, "Loose"))),
			record(3, Some(5), None, None),
			record(4, Some(9), Some(2), None),
		])
		.unwrap();
		assert_eq!(ids(&forest), vec![-1009, 40, -1005]);
		assert_eq!(forest[0].children.len(), 2);
	}

	#[test]
	fn same_topic_under_two_quarters_is_kept_in_both() {
		let forest = build_forest(&[
			record(1, Some(5), Some(1), Some(TopicRef::new(10, "Fractions"))),
			record(2, Some(5), Some(2), Some(TopicRef::new(10, "Fractions"))),
		])
		.unwrap();
		let quarters = &forest[0].children;
		assert_eq!(ids(&quarters[0].children), vec![10]);
		assert_eq!(ids(&quarters[1].children), vec![10]);
	}

	#[test]
	fn nested_subtopics_are_embedded_in_order() {
		let topic = TopicRef::new(10, "Algebra").with_children(vec![
			TopicRef::new(12, "Equations").with_children(vec![TopicRef::new(13, "Linear")]),
			TopicRef::new(11, "Expressions"),
		]);
		let input = vec![record(1, Some(8), Some(1), Some(topic))];
		let before = input.clone();
		let forest = build_forest(&input).unwrap();
		assert_eq!(input, before);

		let algebra = &forest[0].children[0].children[0];
		assert_eq!(ids(&algebra.children), vec![12, 11]);
		let equations = &algebra.children[0];
		assert_eq!(equations.parent_id, Some(NodeId(10)));
		assert_eq!(equations.depth, 3);
		assert_eq!(equations.children[0].id, NodeId(13));
		assert_eq!(equations.children[0].depth, 4);
		assert_eq!(algebra.descendant_ids(), vec![NodeId(12), NodeId(13), NodeId(11)]);
		assert_eq!(algebra.leaf_count(), 2);
	}

	#[test]
	fn topic_cycle_is_reported() {
		let looped = TopicRef::new(1, "A").with_children(vec![
			TopicRef::new(2, "B").with_children(vec![TopicRef::new(1, "A again")]),
		]);
		let err = build_forest(&[record(1, None, None, Some(looped))]).unwrap_err();
		assert_eq!(err, TopicTreeError::TopicCycle { topic_id: NodeId(1) });
	}

	#[test]
	fn repeated_id_in_sibling_branches_is_not_a_cycle() {
		let topic = TopicRef::new(1, "A").with_children(vec![
			TopicRef::new(2, "B").with_children(vec![TopicRef::new(4, "Shared")]),
			TopicRef::new(3, "C").with_children(vec![TopicRef::new(4, "Shared")]),
		]);
		assert!(build_forest(&[record(1, None, None, Some(topic))]).is_ok());
	}

	#[test]
	fn negative_topic_ids_are_rejected() {
		let err = build_forest(&[record(1, Some(1), Some(1), Some(TopicRef::new(-1001, "Clash")))]).unwrap_err();
		assert_eq!(err, TopicTreeError::ReservedTopicId { topic_id: NodeId(-1001) });
	}

	#[test]
	fn out_of_range_grouping_is_rejected() {
		assert_eq!(
			build_forest(&[record(4, Some(1000), None, None)]).unwrap_err(),
			TopicTreeError::GradeOutOfRange { record_id: 4, grade: 1000 }
		);
		assert_eq!(
			build_forest(&[record(5, Some(3), Some(10), None)]).unwrap_err(),
			TopicTreeError::QuarterOutOfRange { record_id: 5, quarter: 10 }
		);
	}

	#[test]
	fn nest_topics_links_parents() {
		let mut child = TopicRef::new(2, "Child");
		child.parent_topic_id = Some(NodeId(1));
		let mut grandchild = TopicRef::new(3, "Grandchild");
		grandchild.parent_topic_id = Some(NodeId(2));
		let mut orphan = TopicRef::new(4, "Orphan");
		orphan.parent_topic_id = Some(NodeId(99));

		let nested = nest_topics(vec![grandchild, child, TopicRef::new(1, "Root"), orphan]).unwrap();
		let roots: Vec<i64> = nested.iter().map(|t| t.id.0).collect();
		assert_eq!(roots, vec![1, 4]);
		assert_eq!(nested[0].children[0].id, NodeId(2));
		assert_eq!(nested[0].children[0].children[0].id, NodeId(3));
	}

	#[test]
	fn nest_topics_rejects_parent_loops() {
		let mut a = TopicRef::new(1, "A");
		a.parent_topic_id = Some(NodeId(2));
		let mut b = TopicRef::new(2, "B");
		b.parent_topic_id = Some(NodeId(1));
		assert!(matches!(
			nest_topics(vec![a, b]),
			Err(TopicTreeError::TopicCycle { .. })
		));
	}

	proptest! {
		#[test]
		fn synthetic_ids_never_collide(g1 in 0u32..=999, q1 in 0u32..=9, g2 in 0u32..=999, q2 in 0u32..=9) {
			let grade = compute_grade_id(g1);
			let quarter = compute_quarter_id(g1, q1);
			prop_assert!(grade.is_reserved());
			prop_assert!(quarter.is_reserved());
			prop_assert_ne!(grade, compute_quarter_id(g2, q2));
			if (g1, q1) != (g2, q2) {
				prop_assert_ne!(quarter, compute_quarter_id(g2, q2));
			}
			if g1 != g2 {
				prop_assert_ne!(grade, compute_grade_id(g2));
			}
		}

		#[test]
		fn building_twice_gives_the_same_forest(
			rows in prop::collection::vec((prop::option::of(0u32..4), prop::option::of(0u32..4), prop::option::of(0i64..6)), 0..30)
		) {
			let records: Vec<ContentRecord> = rows
				.into_iter()
				.enumerate()
				.map(|(i, (grade, quarter, topic))| {
					record(i as i64, grade, quarter, topic.map(|id| TopicRef::new(id, format!("t{id}"))))
				})
				.collect();
			let first = build_forest(&records).unwrap();
			let second = build_forest(&records).unwrap();
			prop_assert_eq!(first, second);
		}
	}
}
