//! Visitor pattern for read-only BSP traversal.
//!
//! Visitors decouple walking the tree from what is done at each node. Cell
//! enumeration gathers its results and the viewer draws leaf cells through
//! this seam instead of hand-rolling recursion.

use super::node::{BspNode, Leaf};
use crate::plane::Plane;
use crate::polygon::Polygon;

/// Visitor invoked for every node of a traversal.
///
/// The walk is depth-first: a node's plane is visited before its back
/// subtree, which is visited before its front subtree.
pub trait BspVisitor {
    /// Called for each internal node's splitting plane.
    fn visit_plane(&mut self, _plane: &Plane) {}

    /// Called for each leaf.
    fn visit_leaf(&mut self, leaf: &Leaf);
}

/// Recursively walks a subtree, feeding every node to the visitor.
pub fn walk<V: BspVisitor>(node: &BspNode, visitor: &mut V) {
    match node {
        BspNode::Leaf(leaf) => visitor.visit_leaf(leaf),
        BspNode::Node { plane, back, front } => {
            visitor.visit_plane(plane);
            walk(back, visitor);
            walk(front, visitor);
        }
    }
}

/// A visitor that collects the filler faces of every solid leaf.
///
/// [`generate_cells`](super::generate_cells) uses it to gather the finished
/// cell lists; a solid leaf the enumeration never reached shows up as an
/// empty entry.
#[derive(Debug, Default)]
pub struct CellCollector {
    cells: Vec<Vec<Polygon>>,
}

impl CellCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected cells.
    pub fn into_cells(self) -> Vec<Vec<Polygon>> {
        self.cells
    }

    /// Returns a reference to the collected cells.
    pub fn cells(&self) -> &[Vec<Polygon>] {
        &self.cells
    }
}

impl BspVisitor for CellCollector {
    fn visit_leaf(&mut self, leaf: &Leaf) {
        if leaf.is_solid() {
            self.cells.push(leaf.filler_faces().to_vec());
        }
    }
}

/// A visitor that calls a closure for each leaf.
pub struct LeafVisitor<F>
where
    F: FnMut(&Leaf),
{
    func: F,
}

impl<F> LeafVisitor<F>
where
    F: FnMut(&Leaf),
{
    /// Creates a new visitor from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> BspVisitor for LeafVisitor<F>
where
    F: FnMut(&Leaf),
{
    fn visit_leaf(&mut self, leaf: &Leaf) {
        (self.func)(leaf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::MapPlane;
    use nalgebra::{Point3, Vector3};
    use std::rc::Rc;

    fn make_polygon() -> Polygon {
        let plane = Rc::new(MapPlane::new(
            Plane::new(Vector3::new(0.0, 0.0, 1.0), 0.0),
            Vector3::x(),
            Vector3::y(),
        ));
        Polygon::from_points(
            plane,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        )
    }

    fn make_tree() -> BspNode {
        BspNode::Node {
            plane: Plane::new(Vector3::new(0.0, 1.0, 0.0), 0.0),
            back: Box::new(BspNode::Leaf(Leaf::empty())),
            front: Box::new(BspNode::Leaf(Leaf::solid(vec![make_polygon()]))),
        }
    }

    #[test]
    fn walk_visits_every_node() {
        let tree = make_tree();
        let mut planes = 0usize;
        let mut leaves = 0usize;

        struct Counter<'a> {
            planes: &'a mut usize,
            leaves: &'a mut usize,
        }
        impl BspVisitor for Counter<'_> {
            fn visit_plane(&mut self, _plane: &Plane) {
                *self.planes += 1;
            }
            fn visit_leaf(&mut self, _leaf: &Leaf) {
                *self.leaves += 1;
            }
        }

        walk(
            &tree,
            &mut Counter {
                planes: &mut planes,
                leaves: &mut leaves,
            },
        );
        assert_eq!(planes, 1);
        assert_eq!(leaves, 2);
    }

    #[test]
    fn leaf_visitor_sees_back_before_front() {
        let tree = make_tree();
        let mut solidity = Vec::new();
        let mut visitor = LeafVisitor::new(|leaf: &Leaf| solidity.push(leaf.is_solid()));
        walk(&tree, &mut visitor);
        assert_eq!(solidity, vec![false, true]);
    }

    #[test]
    fn cell_collector_only_reports_solid_leaves() {
        let tree = make_tree();
        let mut collector = CellCollector::new();
        walk(&tree, &mut collector);
        assert_eq!(collector.cells().len(), 1);
    }
}
