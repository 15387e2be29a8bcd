//! Binary Space Partitioning of the unioned brush boundary.
//!
//! The tree is built by recursively splitting the boundary polygons along
//! their own supporting planes. Leaves label space: a leaf carrying
//! boundary polygons is a solid region, an empty leaf is open space. After
//! construction, cell enumeration intersects a world bounding cube with the
//! half-spaces along each root-to-leaf path to recover the convex volume of
//! every solid leaf.
//!
//! # Example
//!
//! ```ignore
//! use map_csg::{generate_cells, BspTree, Polygon};
//!
//! let polygons: Vec<Polygon> = /* unioned brush boundary */;
//! let mut tree = BspTree::build(polygons.clone())?;
//! let cells = generate_cells(polygons, &mut tree)?;
//! assert_eq!(cells.len(), tree.solid_leaf_count());
//! ```
//!
//! # Architecture
//!
//! - [`BspTree`]: container holding the root node and the queries
//! - [`BspNode`] / [`Leaf`]: the tagged node variant
//! - [`PivotSelector`]: strategy for choosing the next splitting polygon
//! - [`BspVisitor`]: read-only traversal over nodes and leaves
//! - [`generate_cells`]: convex cell enumeration over the finished tree

mod cells;
mod node;
mod selector;
mod tree;
mod visitor;

pub use cells::{generate_cells, initial_bounds, BOUNDS_HALF_SIZE};
pub use node::{BspNode, Leaf};
pub use selector::{FirstUnused, PivotSelector};
pub use tree::{BspTree, BuildRecord};
pub use visitor::{walk, BspVisitor, CellCollector, LeafVisitor};
