//! Pivot selection strategies for BSP tree construction.
//!
//! The pivot's supporting plane becomes the splitting plane of a node, so
//! the selection order shapes the whole tree. The solid/empty leaf labeling
//! relies on every polygon eventually being consumed as a pivot, which is
//! why a selector may only ever pick records that are not yet used.

use super::tree::BuildRecord;

/// Strategy for choosing the next splitting polygon during construction.
///
/// `select` must return the index of an *unused* record, or `None` when no
/// unused record remains. Picking a used record would consume it twice and
/// break the termination argument of the build.
pub trait PivotSelector {
    /// Selects the record whose plane becomes the next splitting plane.
    fn select(&self, records: &[BuildRecord]) -> Option<usize>;
}

/// Selects the first unused record in list order.
///
/// This is the canonical selector: together with the stable partition order
/// it makes the build deterministic, so the same polygon list always
/// produces the same tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstUnused;

impl PivotSelector for FirstUnused {
    fn select(&self, records: &[BuildRecord]) -> Option<usize> {
        records.iter().position(|record| !record.used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::{MapPlane, Plane};
    use crate::polygon::Polygon;
    use nalgebra::{Point3, Vector3};
    use std::rc::Rc;

    fn make_record(used: bool) -> BuildRecord {
        let plane = Rc::new(MapPlane::new(
            Plane::new(Vector3::new(0.0, 0.0, 1.0), 0.0),
            Vector3::x(),
            Vector3::y(),
        ));
        let polygon = Polygon::from_points(
            plane,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        );
        BuildRecord { polygon, used }
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert!(FirstUnused.select(&[]).is_none());
    }

    #[test]
    fn skips_used_records() {
        let records = vec![make_record(true), make_record(true), make_record(false)];
        assert_eq!(FirstUnused.select(&records), Some(2));
    }

    #[test]
    fn all_used_selects_nothing() {
        let records = vec![make_record(true), make_record(true)];
        assert!(FirstUnused.select(&records).is_none());
    }
}
