//! Brush-map geometry kernel.
//!
//! Reads Quake-style brush maps (entities containing convex brushes, each
//! brush the intersection of half-spaces), builds explicit polyhedra,
//! removes interior surface by unioning the brushes, and partitions space
//! with a BSP tree whose solid leaves are enumerated as convex cells.
//!
//! The pipeline is a straight line:
//!
//! ```text
//! map text -> brushes -> union boundary -> polygons -> BSP tree -> cells
//! ```
//!
//! See [`build_pipeline`] for the one-call entry point used by the viewer.

pub mod bsp;
mod brush;
mod error;
mod face;
mod map;
mod pipeline;
mod plane;
mod polygon;

pub use brush::{union, Aabb, Brush};
pub use bsp::{generate_cells, BspNode, BspTree, Leaf};
pub use error::Error;
pub use face::{Face, FaceEdge, FaceVertex};
pub use map::{load_map, parse_map, Entity, MapFile};
pub use pipeline::{build_pipeline, triangulate_colored, ColoredVertex, PipelineOutput};
pub use plane::{
    Classification, MapPlane, Plane, PlaneSide, INTERSECT_EPSILON, RAY_EPSILON, SIDE_EPSILON,
    SPLIT_EPSILON,
};
pub use polygon::Polygon;
