//! BSP tree container and construction.

use std::fs;
use std::path::Path;

use log::debug;
use nalgebra::Point3;
use serde_json::{json, Value};

use crate::error::Error;
use crate::plane::Classification;
use crate::polygon::Polygon;

use super::node::{BspNode, Leaf};
use super::selector::{FirstUnused, PivotSelector};
use super::visitor::{walk, BspVisitor};

/// A boundary polygon being threaded through the build, with a flag marking
/// whether it has already served as a pivot.
///
/// When a spanning record is split, both pieces inherit the flag, so a
/// consumed polygon stays consumed on both sides of the cut.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRecord {
    pub polygon: Polygon,
    pub used: bool,
}

/// A Binary Space Partitioning tree over the unioned brush boundary.
///
/// Construction consumes each polygon once as a splitting pivot. Boundary
/// polygons accumulate on the front (interior) side of their own planes;
/// when a front list consists only of consumed polygons, that list is the
/// complete boundary of a solid region and becomes a solid leaf. A back
/// list with nothing left to pivot on is open space and becomes an empty
/// leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct BspTree {
    root: BspNode,
}

impl BspTree {
    /// Builds a tree with the default pivot order (first unused polygon in
    /// list order).
    pub fn build(polygons: Vec<Polygon>) -> Result<Self, Error> {
        Self::build_with(polygons, &FirstUnused)
    }

    /// Builds a tree using the given pivot selection strategy.
    ///
    /// An empty input produces a single empty leaf.
    pub fn build_with<S: PivotSelector>(
        polygons: Vec<Polygon>,
        selector: &S,
    ) -> Result<Self, Error> {
        if polygons.is_empty() {
            return Ok(Self {
                root: BspNode::Leaf(Leaf::empty()),
            });
        }
        let records = polygons
            .into_iter()
            .map(|polygon| BuildRecord {
                polygon,
                used: false,
            })
            .collect();
        let root = build_node(records, selector)?;
        debug!(
            "bsp tree built: {} nodes, {} leaves ({} solid), depth {}",
            root.node_count(),
            root.leaf_count(),
            root.solid_leaf_count(),
            root.depth()
        );
        Ok(Self { root })
    }

    /// Returns the root node.
    #[inline]
    pub fn root(&self) -> &BspNode {
        &self.root
    }

    /// Returns a mutable root reference for the cell-enumeration pass.
    #[inline]
    pub(crate) fn root_mut(&mut self) -> &mut BspNode {
        &mut self.root
    }

    /// Returns the maximum depth of the tree.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Returns the number of internal nodes.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Returns the number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Returns the number of solid leaves.
    pub fn solid_leaf_count(&self) -> usize {
        self.root.solid_leaf_count()
    }

    /// Returns the number of boundary polygons stored in leaves.
    pub fn polygon_count(&self) -> usize {
        self.root.polygon_count()
    }

    /// Locates `point` in the partition and reports whether it falls in a
    /// solid leaf. Points exactly on a splitting plane are sent to the
    /// front (interior) side.
    pub fn contains_point(&self, point: Point3<f64>) -> bool {
        let mut node = &self.root;
        loop {
            match node {
                BspNode::Leaf(leaf) => return leaf.is_solid(),
                BspNode::Node { plane, back, front } => {
                    node = if plane.signed_distance(point) >= 0.0 {
                        front
                    } else {
                        back
                    };
                }
            }
        }
    }

    /// Walks the whole tree with a visitor, back subtrees before front.
    pub fn traverse<V: BspVisitor>(&self, visitor: &mut V) {
        walk(&self.root, visitor);
    }

    /// Serializes the tree structure for debugging.
    ///
    /// Internal nodes become `{"plane": {"n": [x, y, z], "d": d},
    /// "back": ..., "front": ...}`; leaves become `{"solid": bool,
    /// "faces": [[[x, y, z], ...], ...]}`.
    pub fn to_json(&self) -> Value {
        node_json(&self.root)
    }

    /// Writes the JSON dump to a file (conventionally `./bsptree.json`).
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let text = serde_json::to_string_pretty(&self.to_json())?;
        fs::write(path, text)?;
        Ok(())
    }
}

/// Recursively builds the subtree for a record list.
///
/// The pivot's plane splits the list; every record lands in the front or
/// back sub-list (spanning records are cut, coplanar records follow their
/// facing). The front list always contains at least the pivot itself.
fn build_node<S: PivotSelector>(
    mut records: Vec<BuildRecord>,
    selector: &S,
) -> Result<BspNode, Error> {
    let Some(pivot) = selector.select(&records) else {
        return Err(Error::invariant(
            "bsp build recursed into a list with no unused polygon",
        ));
    };
    records[pivot].used = true;
    let plane = records[pivot].polygon.plane().plane().clone();

    let mut front = Vec::new();
    let mut back = Vec::new();
    for record in records {
        match record.polygon.classify(&plane) {
            Classification::Front | Classification::CoplanarFront => front.push(record),
            Classification::Back | Classification::CoplanarBack => back.push(record),
            Classification::Coplanar => {
                if record.polygon.plane().normal().dot(&plane.normal()) > 0.0 {
                    front.push(record);
                } else {
                    back.push(record);
                }
            }
            Classification::Spanning => {
                let (back_piece, front_piece) = record.polygon.split(&plane)?;
                back.push(BuildRecord {
                    polygon: back_piece,
                    used: record.used,
                });
                front.push(BuildRecord {
                    polygon: front_piece,
                    used: record.used,
                });
            }
        }
    }

    let back_child = if back.is_empty() || back.iter().all(|r| r.used) {
        BspNode::Leaf(Leaf::empty())
    } else {
        build_node(back, selector)?
    };

    let front_child = if front.iter().all(|r| r.used) {
        BspNode::Leaf(Leaf::solid(
            front.into_iter().map(|r| r.polygon).collect(),
        ))
    } else {
        build_node(front, selector)?
    };

    Ok(BspNode::Node {
        plane,
        back: Box::new(back_child),
        front: Box::new(front_child),
    })
}

fn node_json(node: &BspNode) -> Value {
    match node {
        BspNode::Node { plane, back, front } => {
            let n = plane.normal();
            json!({
                "plane": { "n": [n.x, n.y, n.z], "d": plane.distance() },
                "back": node_json(back),
                "front": node_json(front),
            })
        }
        BspNode::Leaf(leaf) => json!({
            "solid": leaf.is_solid(),
            "faces": leaf
                .polygons()
                .iter()
                .map(|polygon| {
                    polygon
                        .points()
                        .iter()
                        .map(|p| vec![p.x, p.y, p.z])
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::Plane;
    use crate::polygon::Polygon;
    use nalgebra::Vector3;

    // The six faces of an axis-aligned cube, supporting planes facing the
    // interior, in a fixed deterministic order.
    fn cube_polygons(half: f64) -> Vec<Polygon> {
        [
            (Vector3::new(-1.0, 0.0, 0.0), half),
            (Vector3::new(1.0, 0.0, 0.0), half),
            (Vector3::new(0.0, -1.0, 0.0), half),
            (Vector3::new(0.0, 1.0, 0.0), half),
            (Vector3::new(0.0, 0.0, -1.0), half),
            (Vector3::new(0.0, 0.0, 1.0), half),
        ]
        .into_iter()
        .map(|(n, d)| Polygon::from_plane(&Plane::new(n, d), half))
        .collect()
    }

    #[test]
    fn empty_input_builds_single_empty_leaf() {
        let tree = BspTree::build(Vec::new()).unwrap();
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.solid_leaf_count(), 0);
        assert!(!tree.contains_point(Point3::origin()));
    }

    #[test]
    fn cube_tree_structure() {
        let tree = BspTree::build(cube_polygons(0.5)).unwrap();

        // One internal node per face plane; the interior collapses into a
        // single solid leaf carrying all six boundary polygons.
        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.leaf_count(), 7);
        assert_eq!(tree.solid_leaf_count(), 1);
        assert_eq!(tree.depth(), 7);

        let mut solid_polygons = 0usize;
        tree.traverse(&mut crate::bsp::LeafVisitor::new(|leaf: &Leaf| {
            if leaf.is_solid() {
                solid_polygons = leaf.polygons().len();
            }
        }));
        assert_eq!(solid_polygons, 6);
    }

    #[test]
    fn cube_tree_classifies_points() {
        let tree = BspTree::build(cube_polygons(0.5)).unwrap();

        for inside in [
            Point3::origin(),
            Point3::new(0.4, -0.4, 0.4),
            Point3::new(0.0, 0.49, 0.0),
        ] {
            assert!(tree.contains_point(inside), "{inside:?} should be solid");
        }
        for outside in [
            Point3::new(0.6, 0.0, 0.0),
            Point3::new(0.0, -2.0, 0.0),
            Point3::new(100.0, 100.0, 100.0),
        ] {
            assert!(!tree.contains_point(outside), "{outside:?} should be open");
        }
    }

    #[test]
    fn build_is_deterministic() {
        let a = BspTree::build(cube_polygons(0.5)).unwrap();
        let b = BspTree::build(cube_polygons(0.5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn spanning_polygons_are_split_during_build() {
        // A floor quad plus a wall quad crossing it.
        let floor = Polygon::from_plane(&Plane::new(Vector3::new(0.0, 1.0, 0.0), 0.0), 1.0);
        let wall = Polygon::from_plane(&Plane::new(Vector3::new(1.0, 0.0, 0.0), 0.0), 1.0);

        let tree = BspTree::build(vec![floor, wall]).unwrap();
        // The wall spans the floor plane and is cut in two.
        assert_eq!(tree.polygon_count(), 3);
    }

    #[test]
    fn two_disjoint_cubes_have_two_solid_leaves() {
        use crate::brush::Brush;
        use crate::plane::MapPlane;

        // The second cube sits at x = 5; its polygons come out of a brush
        // because its face quads are not centered on their plane base points.
        let far_planes = vec![
            (Vector3::new(-1.0, 0.0, 0.0), 5.5),
            (Vector3::new(1.0, 0.0, 0.0), -4.5),
            (Vector3::new(0.0, -1.0, 0.0), 0.5),
            (Vector3::new(0.0, 1.0, 0.0), 0.5),
            (Vector3::new(0.0, 0.0, -1.0), 0.5),
            (Vector3::new(0.0, 0.0, 1.0), 0.5),
        ]
        .into_iter()
        .map(|(n, d)| MapPlane::with_derived_frame(Plane::new(n, d)))
        .collect();
        let far_cube = Brush::from_planes(far_planes).unwrap();

        let mut polygons = cube_polygons(0.5);
        polygons.extend(far_cube.faces().iter().map(|f| f.to_polygon()));

        let tree = BspTree::build(polygons).unwrap();
        assert_eq!(tree.solid_leaf_count(), 2);
        assert!(tree.contains_point(Point3::origin()));
        assert!(tree.contains_point(Point3::new(5.0, 0.0, 0.0)));
        assert!(!tree.contains_point(Point3::new(2.5, 0.0, 0.0)));
    }

    #[test]
    fn json_dump_shape() {
        let tree = BspTree::build(cube_polygons(0.5)).unwrap();
        let value = tree.to_json();

        assert!(value.get("plane").is_some());
        assert!(value.get("back").is_some());
        assert!(value.get("front").is_some());
        let n = &value["plane"]["n"];
        assert_eq!(n.as_array().unwrap().len(), 3);

        // Descend to the deepest front child: the solid leaf.
        let mut cursor = &value;
        while cursor.get("front").is_some() {
            cursor = &cursor["front"];
        }
        assert_eq!(cursor["solid"], Value::Bool(true));
        assert_eq!(cursor["faces"].as_array().unwrap().len(), 6);
    }
}
