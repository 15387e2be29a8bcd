//! Convex cell enumeration.
//!
//! Every solid leaf of the tree corresponds to a convex region: the world
//! bounding cube intersected with the half-spaces chosen along the path
//! from the root. This pass walks a boundary polygon down to its leaf while
//! splitting a polygon-soup representation of that region alongside it,
//! leaving each solid leaf with the explicit faces of its cell volume.

use log::warn;

use crate::error::Error;
use crate::plane::{Classification, Plane};
use crate::polygon::Polygon;

use super::node::BspNode;
use super::tree::BspTree;
use super::visitor::CellCollector;

/// Half-size of the axis-aligned world cube that bounds every cell.
pub const BOUNDS_HALF_SIZE: f64 = 1024.0;

/// Builds the six faces of the world bounding cube.
///
/// Like every cell boundary, the faces keep the cube interior on their
/// front side.
pub fn initial_bounds() -> Vec<Polygon> {
    let h = BOUNDS_HALF_SIZE;
    [
        Plane::new(nalgebra::Vector3::new(-1.0, 0.0, 0.0), h),
        Plane::new(nalgebra::Vector3::new(1.0, 0.0, 0.0), h),
        Plane::new(nalgebra::Vector3::new(0.0, -1.0, 0.0), h),
        Plane::new(nalgebra::Vector3::new(0.0, 1.0, 0.0), h),
        Plane::new(nalgebra::Vector3::new(0.0, 0.0, -1.0), h),
        Plane::new(nalgebra::Vector3::new(0.0, 0.0, 1.0), h),
    ]
    .iter()
    .map(|plane| Polygon::from_plane(plane, h))
    .collect()
}

/// Enumerates the convex cell of every solid leaf.
///
/// Repeatedly takes the first remaining boundary polygon, descends the tree
/// with it while splitting the bounding volume, and removes every polygon
/// that settled in the discovered leaf from the work list. The accumulated
/// bounds are stored on each solid leaf as its filler faces; the cell lists
/// are then gathered from the finished tree, one per solid leaf in
/// traversal order (back subtrees before front).
///
/// A descent that discovers nothing (its polygon was consumed by an earlier
/// cell, or split during tree construction) drops that polygon so the loop
/// always makes progress. A solid leaf the descents never reached comes
/// back from the collector with no filler faces; any such leaf is an
/// invariant violation.
pub fn generate_cells(
    polygons: Vec<Polygon>,
    tree: &mut BspTree,
) -> Result<Vec<Vec<Polygon>>, Error> {
    let mut remaining = polygons;

    while let Some(target) = remaining.first().cloned() {
        let mut deleted = Vec::new();
        split_cell_until(&target, initial_bounds(), &mut deleted, tree.root_mut())?;

        let before = remaining.len();
        remaining.retain(|polygon| !deleted.contains(polygon));
        if remaining.len() == before {
            // The leaf held only split pieces of this polygon (or the
            // descent ended in open space); drop it to make progress.
            warn!("cell descent removed no boundary polygons; dropping the target");
            remaining.remove(0);
        }
    }

    let mut collector = CellCollector::new();
    tree.traverse(&mut collector);
    let cells = collector.into_cells();

    let missed = cells.iter().filter(|cell| cell.is_empty()).count();
    if missed > 0 {
        return Err(Error::invariant(format!(
            "{missed} solid leaves were never reached by cell enumeration"
        )));
    }

    Ok(cells)
}

/// Descends toward the leaf containing `target`, splitting `bounds` by each
/// splitting plane along the way.
///
/// At a solid leaf the accumulated bounds are the leaf's convex cell: they
/// are stored as its filler faces (write-once), and the leaf's boundary
/// polygons are recorded for removal from the work list. A spanning target
/// descends into both children so no reachable solid leaf is skipped.
fn split_cell_until(
    target: &Polygon,
    bounds: Vec<Polygon>,
    deleted: &mut Vec<Polygon>,
    node: &mut BspNode,
) -> Result<(), Error> {
    match node {
        BspNode::Leaf(leaf) => {
            if leaf.is_solid() {
                deleted.extend(leaf.polygons().iter().cloned());
                if !leaf.has_filler() {
                    leaf.set_filler(bounds);
                }
            }
            Ok(())
        }
        BspNode::Node { plane, back, front } => {
            let mut front_cell = Vec::new();
            let mut back_cell = Vec::new();
            let mut any_split = false;

            for polygon in &bounds {
                match polygon.classify(plane) {
                    Classification::Front | Classification::CoplanarFront => {
                        front_cell.push(polygon.clone());
                    }
                    Classification::Back | Classification::CoplanarBack => {
                        back_cell.push(polygon.clone());
                    }
                    Classification::Coplanar => {
                        front_cell.push(polygon.clone());
                        back_cell.push(polygon.clone());
                    }
                    Classification::Spanning => {
                        let (back_piece, front_piece) = polygon.split(plane)?;
                        back_cell.push(back_piece);
                        front_cell.push(front_piece);
                        any_split = true;
                    }
                }
            }

            if any_split {
                fix_convex_cell(&mut front_cell, plane)?;
                fix_convex_cell(&mut back_cell, &plane.flipped())?;
            }

            match target.classify(plane) {
                Classification::Front | Classification::CoplanarFront => {
                    split_cell_until(target, front_cell, deleted, front)
                }
                Classification::Back | Classification::CoplanarBack => {
                    split_cell_until(target, back_cell, deleted, back)
                }
                Classification::Coplanar => {
                    if target.plane().normal().dot(&plane.normal()) > 0.0 {
                        split_cell_until(target, front_cell, deleted, front)
                    } else {
                        split_cell_until(target, back_cell, deleted, back)
                    }
                }
                Classification::Spanning => {
                    let (back_piece, front_piece) = target.split(plane)?;
                    split_cell_until(&front_piece, front_cell, deleted, front)?;
                    split_cell_until(&back_piece, back_cell, deleted, back)
                }
            }
        }
    }
}

/// Closes the open side a split leaves in a convex cell.
///
/// A fresh world-sized quad on the splitting plane is clipped against every
/// existing cell face's supporting plane, keeping the front (interior)
/// piece wherever it spans one; the remainder is the cap and joins the
/// cell. The back half-cell receives the cap on the negated plane so its
/// interior also stays on the cap's front side.
fn fix_convex_cell(cell: &mut Vec<Polygon>, plane: &Plane) -> Result<(), Error> {
    let mut cap = Polygon::from_plane(plane, BOUNDS_HALF_SIZE);
    for polygon in cell.iter() {
        if cap.classify(polygon.plane().plane()) == Classification::Spanning {
            let (_, front_piece) = cap.split(polygon.plane().plane())?;
            cap = front_piece;
        }
    }
    cell.push(cap);
    Ok(())
}
