//! Edge routing between node perimeters.

const EPSILON: f64 = 1e-9;

/// Position in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// Point at (`x`, `y`).
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Point) -> f64 {
		(other.x - self.x).hypot(other.y - self.y)
	}
}

/// Rendered outline of a node, measured from its centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeShape {
	/// Circle of `radius`.
	Circle {
		/// Radius from the centre.
		radius: f64,
	},
	/// Axis-aligned box.
	Box {
		/// Half the box width.
		half_width: f64,
		/// Half the box height.
		half_height: f64,
	},
}

impl NodeShape {
	/// Whether the offset (`dx`, `dy`) from the centre falls inside the
	/// outline grown by `slop`.
	pub fn contains(self, dx: f64, dy: f64, slop: f64) -> bool {
		match self {
			NodeShape::Circle { radius } => dx.hypot(dy) <= radius + slop,
			NodeShape::Box {
				half_width,
				half_height,
			} => dx.abs() <= half_width + slop && dy.abs() <= half_height + slop,
		}
	}
}

/// Point on the outline of the node at `center` along the ray toward
/// `toward`, pushed `padding` further out so the edge clears the stroke.
///
/// Coincident centres have no direction; the centre itself is returned.
pub fn boundary_intersection(center: Point, shape: NodeShape, toward: Point, padding: f64) -> Point {
	let (dx, dy) = (toward.x - center.x, toward.y - center.y);
	let dist = dx.hypot(dy);
	if dist < EPSILON {
		return center;
	}
	let reach = match shape {
		NodeShape::Circle { radius } => radius,
		NodeShape::Box {
			half_width,
			half_height,
		} => {
			// Scale factor at which the ray leaves each pair of half-planes;
			// the smaller one is hit first.
			let tx = if dx.abs() > EPSILON {
				half_width / dx.abs()
			} else {
				f64::INFINITY
			};
			let ty = if dy.abs() > EPSILON {
				half_height / dy.abs()
			} else {
				f64::INFINITY
			};
			tx.min(ty) * dist
		}
	};
	let t = (reach + padding) / dist;
	Point::new(center.x + dx * t, center.y + dy * t)
}

/// A node's placement as seen by the edge router. `center` stays `None`
/// until a layout pass has placed the node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
	/// Node centre, once placed.
	pub center: Option<Point>,
	/// Node outline.
	pub shape: NodeShape,
}

/// Both ends of the edge between `a` and `b`, each on its node's outline.
/// `None` while either node is still unplaced.
pub fn edge_endpoints(a: Placement, b: Placement, padding: f64) -> Option<(Point, Point)> {
	let (ca, cb) = (a.center?, b.center?);
	Some((
		boundary_intersection(ca, a.shape, cb, padding),
		boundary_intersection(cb, b.shape, ca, padding),
	))
}
