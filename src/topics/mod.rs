//! Topic hierarchy: forest building, expand/collapse navigation and the
//! geometry the canvas needs to draw it.

mod builder;
mod catalog;
mod error;
mod geometry;
mod navigator;
mod types;
mod visual;

pub use builder::{
	GRADE_ID_BASE, MAX_GRADE, MAX_QUARTER, QUARTER_ID_BASE, build_forest, compute_grade_id,
	compute_quarter_id, nest_topics,
};
pub use catalog::{Subject, SubjectCatalog};
pub use error::{CatalogError, TopicTreeError};
pub use geometry::{NodeShape, Placement, Point, boundary_intersection, edge_endpoints};
pub use navigator::{CENTER_ID, CreateRequest, NodeActivation, SelectionEvent, TopicNavigator};
pub use types::{ContentRecord, NodeId, NodeKind, TopicRef, TreeNode, find_in_forest};
pub use visual::{
	CENTER_WEIGHT, GraphVisualNode, NodeStyle, VisibleGraph, VisualEdge, VisualKind, depth_weight,
};
