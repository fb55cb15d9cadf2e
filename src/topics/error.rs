use super::types::NodeId;

/// Structural problems in the records handed to the tree builder.
///
/// A build that hits any of these returns no forest at all.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TopicTreeError {
	/// A topic appears among its own ancestors.
	#[error("topic {topic_id} is its own ancestor")]
	TopicCycle {
		/// First repeated id.
		topic_id: NodeId,
	},
	/// A topic uses an id from the synthetic range.
	#[error("topic id {topic_id} is negative; negative ids are reserved for grouping nodes")]
	ReservedTopicId {
		/// Offending id.
		topic_id: NodeId,
	},
	/// The grade would produce an ambiguous synthetic id.
	#[error("grade {grade} is outside 0..=999 (record {record_id})")]
	GradeOutOfRange {
		/// Record carrying the grade.
		record_id: i64,
		/// Offending grade.
		grade: u32,
	},
	/// The quarter would produce an ambiguous synthetic id.
	#[error("quarter {quarter} is outside 0..=9 (record {record_id})")]
	QuarterOutOfRange {
		/// Record carrying the quarter.
		record_id: i64,
		/// Offending quarter.
		quarter: u32,
	},
}

/// Why the subject table could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
	/// The JSON does not match the subject shape.
	#[error("failed to parse subject catalog: {0}")]
	Parse(#[from] serde_json::Error),
	/// A subject's topics or records are malformed.
	#[error("subject '{subject}' has a malformed topic tree")]
	Tree {
		/// Title of the subject.
		subject: String,
		/// What the builder rejected.
		#[source]
		source: TopicTreeError,
	},
	/// The table lists no subjects.
	#[error("subject catalog is empty")]
	Empty,
}
