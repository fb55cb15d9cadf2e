//! Bundled subject table, parsed once when the app mounts.

use std::collections::HashMap;

use log::{info, warn};
use serde::Deserialize;

use super::builder::{build_forest, nest_topics};
use super::error::CatalogError;
use super::types::{ContentRecord, NodeId, TopicRef, TreeNode};

const BUNDLED_SUBJECTS: &str = include_str!("../../assets/subjects.json");

#[derive(Deserialize)]
struct SubjectEntry {
	title: String,
	#[serde(default)]
	topics: Vec<TopicRef>,
	records: Vec<ContentRecord>,
}

/// One subject: its records and the forest built from them.
#[derive(Clone, Debug)]
pub struct Subject {
	/// Display title, also the lookup key.
	pub title: String,
	/// Records with their topics' subtrees filled in.
	pub records: Vec<ContentRecord>,
	/// Grade → quarter → topic forest.
	pub forest: Vec<TreeNode>,
}

/// Every subject the app knows about, in file order.
#[derive(Clone, Debug)]
pub struct SubjectCatalog {
	subjects: Vec<Subject>,
}

impl SubjectCatalog {
	/// Parses the table bundled into the binary.
	pub fn load() -> Result<Self, CatalogError> {
		Self::from_json(BUNDLED_SUBJECTS)
	}

	/// Parses a JSON array of subjects and builds each forest.
	pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
		let entries: Vec<SubjectEntry> = serde_json::from_str(raw)?;
		if entries.is_empty() {
			return Err(CatalogError::Empty);
		}
		let subjects = entries
			.into_iter()
			.map(Subject::from_entry)
			.collect::<Result<Vec<_>, _>>()
			.inspect_err(|err| warn!("Subject catalog rejected: {err}"))?;
		info!("Loaded {} subjects", subjects.len());
		Ok(Self { subjects })
	}

	/// All subjects.
	pub fn subjects(&self) -> &[Subject] {
		&self.subjects
	}

	/// Subject titled `title`.
	pub fn get(&self, title: &str) -> Option<&Subject> {
		self.subjects.iter().find(|subject| subject.title == title)
	}

	/// First subject; catalogs are never empty once loaded.
	pub fn first(&self) -> &Subject {
		&self.subjects[0]
	}
}

impl Subject {
	fn from_entry(entry: SubjectEntry) -> Result<Self, CatalogError> {
		let SubjectEntry {
			title,
			topics,
			mut records,
		} = entry;
		let tree_error = |source| CatalogError::Tree {
			subject: title.clone(),
			source,
		};

		let nested = nest_topics(topics).map_err(tree_error)?;
		let mut by_id = HashMap::new();
		index_topics(&nested, &mut by_id);
		for record in &mut records {
			let bare = record.topic.as_mut().filter(|topic| topic.children.is_empty());
			if let Some(topic) = bare {
				if let Some(full) = by_id.get(&topic.id) {
					topic.children = full.children.clone();
				}
			}
		}

		let forest = build_forest(&records).map_err(tree_error)?;
		Ok(Self {
			title,
			records,
			forest,
		})
	}

	/// Records tagged with `topic_id` itself (not its subtopics).
	pub fn records_for(&self, topic_id: NodeId) -> impl Iterator<Item = &ContentRecord> {
		self.records
			.iter()
			.filter(move |record| record.topic.as_ref().is_some_and(|t| t.id == topic_id))
	}
}

fn index_topics<'a>(topics: &'a [TopicRef], by_id: &mut HashMap<NodeId, &'a TopicRef>) {
	for topic in topics {
		by_id.entry(topic.id).or_insert(topic);
		index_topics(&topic.children, by_id);
	}
}
