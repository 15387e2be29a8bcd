//! Interactive BSP tree navigation for the viewer.

use macroquad::prelude::*;
use map_csg::bsp::{walk, LeafVisitor};
use map_csg::{BspNode, BspTree, Leaf};

use crate::draw_polygon;

/// Direction taken at each node in the navigation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Front,
    Back,
}

/// Keyboard-driven navigator for exploring the tree structure and the
/// convex cells hanging off its solid leaves.
pub struct TreeNavigator {
    path: Vec<Direction>,
}

impl Default for TreeNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeNavigator {
    /// Creates a new navigator starting at the root.
    pub fn new() -> Self {
        Self { path: Vec::new() }
    }

    /// Returns the current navigation path.
    pub fn path(&self) -> &[Direction] {
        &self.path
    }

    /// Returns the current depth in the tree.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Attempts to navigate to the front child. Returns true if successful.
    pub fn go_front(&mut self, tree: &BspTree) -> bool {
        if matches!(self.current_node(tree), BspNode::Node { .. }) {
            self.path.push(Direction::Front);
            return true;
        }
        false
    }

    /// Attempts to navigate to the back child. Returns true if successful.
    pub fn go_back(&mut self, tree: &BspTree) -> bool {
        if matches!(self.current_node(tree), BspNode::Node { .. }) {
            self.path.push(Direction::Back);
            return true;
        }
        false
    }

    /// Navigates to the parent node. Returns true if not already at root.
    pub fn go_parent(&mut self) -> bool {
        self.path.pop().is_some()
    }

    /// Returns to the root node.
    pub fn go_root(&mut self) {
        self.path.clear();
    }

    /// Handles keyboard input for navigation.
    /// Returns true if navigation state changed.
    pub fn update(&mut self, tree: &BspTree) -> bool {
        let mut changed = false;

        if is_key_pressed(KeyCode::F) {
            changed = self.go_front(tree);
        }
        if is_key_pressed(KeyCode::B) {
            changed = self.go_back(tree);
        }
        if is_key_pressed(KeyCode::P) {
            changed = self.go_parent();
        }
        if is_key_pressed(KeyCode::R) && !self.path.is_empty() {
            self.go_root();
            changed = true;
        }

        changed
    }

    /// Returns the node the path currently points at.
    pub fn current_node<'a>(&self, tree: &'a BspTree) -> &'a BspNode {
        let mut current = tree.root();
        for direction in &self.path {
            current = match (current, direction) {
                (BspNode::Node { front, .. }, Direction::Front) => front,
                (BspNode::Node { back, .. }, Direction::Back) => back,
                (leaf, _) => return leaf,
            };
        }
        current
    }

    /// Draws the convex cells of every solid leaf under the current node.
    pub fn render_cells(&self, tree: &BspTree) {
        let mut visitor = LeafVisitor::new(|leaf: &Leaf| {
            for face in leaf.filler_faces() {
                draw_polygon(face);
            }
        });
        walk(self.current_node(tree), &mut visitor);
    }

    /// Draws the navigation UI overlay.
    pub fn draw_ui(&self, tree: &BspTree, y_offset: f32) {
        let node = self.current_node(tree);
        let (polygons, solids, is_leaf, leaf_label) = match node {
            BspNode::Node { .. } => (node.polygon_count(), node.solid_leaf_count(), false, ""),
            BspNode::Leaf(leaf) => (
                leaf.polygons().len(),
                usize::from(leaf.is_solid()),
                true,
                if leaf.is_solid() { "(solid leaf)" } else { "(empty leaf)" },
            ),
        };

        let path_str = if self.path.is_empty() {
            "root".to_string()
        } else {
            self.path
                .iter()
                .map(|d| match d {
                    Direction::Front => "F",
                    Direction::Back => "B",
                })
                .collect::<Vec<_>>()
                .join(" -> ")
        };

        draw_text(
            &format!("Subtree: {polygons} boundary polygons, {solids} solid leaves"),
            10.0,
            y_offset,
            18.0,
            WHITE,
        );
        draw_text(
            &format!("Path: {} (depth {})", path_str, self.path.len()),
            10.0,
            y_offset + 20.0,
            18.0,
            YELLOW,
        );
        draw_text(
            &format!(
                "Children: {} {}",
                if is_leaf { "none" } else { "[F]ront [B]ack" },
                leaf_label
            ),
            10.0,
            y_offset + 40.0,
            18.0,
            if is_leaf { ORANGE } else { GREEN },
        );
        draw_text("[P]arent | [R]oot | [C] cells", 10.0, y_offset + 60.0, 16.0, DARKGRAY);
    }
}
