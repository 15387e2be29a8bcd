//! Ordered convex polygon on a map plane.

use std::rc::Rc;

use nalgebra::Point3;

use crate::error::Error;
use crate::plane::{Classification, MapPlane, Plane, PlaneSide, SIDE_EPSILON, SPLIT_EPSILON};

/// Bias added to both centroid coordinates before the angular sort, to
/// disambiguate the ordering of points collinear with the true centroid.
const CENTROID_BIAS: f64 = 1e-4;

/// A convex polygon in 3D space: an ordered cycle of points lying on a
/// [`MapPlane`].
///
/// This is the "weak" face representation used once plane-triple vertex
/// identity is no longer needed, i.e. after the brush union and throughout
/// BSP construction and cell enumeration. The supporting plane is carried
/// explicitly and shared between the pieces of a split.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    plane: Rc<MapPlane>,
    points: Vec<Point3<f64>>,
}

impl Polygon {
    /// Creates a polygon by sorting the given points into a convex cycle.
    ///
    /// Each point is projected into the plane's tangent frame and the points
    /// are ordered by angle around the (biased) centroid.
    ///
    /// # Panics (debug builds only)
    /// Panics if fewer than 3 points are provided or a point does not lie on
    /// the plane.
    pub fn from_points(plane: Rc<MapPlane>, points: Vec<Point3<f64>>) -> Self {
        let projected: Vec<(f64, f64)> = points.iter().map(|p| plane.project(*p)).collect();
        let count = projected.len() as f64;
        let center_u =
            projected.iter().map(|uv| uv.0).sum::<f64>() / count + CENTROID_BIAS;
        let center_v =
            projected.iter().map(|uv| uv.1).sum::<f64>() / count + CENTROID_BIAS;

        let mut order: Vec<usize> = (0..points.len()).collect();
        let angle =
            |i: usize| (projected[i].1 - center_v).atan2(projected[i].0 - center_u);
        order.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)));

        let sorted = order.into_iter().map(|i| points[i]).collect();
        Self::from_cycle(plane, sorted)
    }

    /// Creates a polygon from points that are already in cyclic order.
    ///
    /// # Panics (debug builds only)
    /// Panics if fewer than 3 points are provided or a point does not lie on
    /// the plane.
    pub fn from_cycle(plane: Rc<MapPlane>, points: Vec<Point3<f64>>) -> Self {
        debug_assert!(points.len() >= 3, "Polygon must have at least 3 points");
        debug_assert!(
            points
                .iter()
                .all(|p| plane.plane().signed_distance(*p).abs() < SIDE_EPSILON),
            "Polygon points must lie on the supporting plane"
        );
        Self { plane, points }
    }

    /// Creates a finite quad covering the given plane out to `half_size`
    /// along both in-plane axes.
    ///
    /// Used for the cell-enumeration bounding cube and for capping an open
    /// convex cell. The tangent frame is derived from the plane normal.
    pub fn from_plane(plane: &Plane, half_size: f64) -> Self {
        let map_plane = Rc::new(MapPlane::with_derived_frame(plane.clone()));
        let base = plane.base_point();
        let right = map_plane.tangent() * half_size;
        let left = map_plane.bitangent() * half_size;
        let corners = vec![
            base + right + left,
            base + right - left,
            base - right + left,
            base - right - left,
        ];
        Self::from_points(map_plane, corners)
    }

    /// Returns the supporting map plane.
    #[inline]
    pub fn plane(&self) -> &MapPlane {
        &self.plane
    }

    /// Returns the ordered cycle of points.
    #[inline]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Returns the number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the polygon has no points (never the case for a
    /// constructed polygon).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Computes the centroid of the polygon's points.
    pub fn centroid(&self) -> Point3<f64> {
        let sum: nalgebra::Vector3<f64> = self.points.iter().map(|p| p.coords).sum();
        Point3::from(sum / self.points.len() as f64)
    }

    /// Classifies this polygon relative to a plane by tallying the sides of
    /// its points.
    pub fn classify(&self, plane: &Plane) -> Classification {
        plane.classify_points(self.points.iter().copied())
    }

    /// Splits the polygon by a plane, returning `(back, front)` pieces.
    ///
    /// The cyclic walk emits each point into the piece matching its side
    /// (on-plane points go to both), and inserts the edge/plane intersection
    /// into both pieces wherever an edge crosses from one strict side to the
    /// other. The walk preserves the cyclic order, so no re-sorting is
    /// needed, and both pieces share the original map plane.
    ///
    /// Fails with [`Error::DegenerateGeometry`] if either piece would end up
    /// with fewer than 3 points; callers only split polygons classified as
    /// [`Classification::Spanning`], for which this indicates degenerate
    /// input.
    pub fn split(&self, plane: &Plane) -> Result<(Polygon, Polygon), Error> {
        let count = self.points.len();
        let sides: Vec<PlaneSide> = self
            .points
            .iter()
            .map(|p| plane.classify_point_with_epsilon(*p, SPLIT_EPSILON))
            .collect();

        let mut back = Vec::with_capacity(count + 1);
        let mut front = Vec::with_capacity(count + 1);

        for i in 0..count {
            let current = self.points[i];
            let next_index = (i + 1) % count;

            match sides[i] {
                PlaneSide::Front => front.push(current),
                PlaneSide::Back => back.push(current),
                PlaneSide::OnPlane => {
                    front.push(current);
                    back.push(current);
                }
            }

            let crosses = matches!(
                (sides[i], sides[next_index]),
                (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front)
            );
            if crosses {
                let direction = (self.points[next_index] - current).normalize();
                if let Some(intersection) = plane.intersect_ray(current, direction) {
                    front.push(intersection);
                    back.push(intersection);
                }
            }
        }

        if back.len() < 3 || front.len() < 3 {
            return Err(Error::degenerate(format!(
                "polygon split produced {} back and {} front points",
                back.len(),
                front.len()
            )));
        }

        Ok((
            Polygon::from_cycle(self.plane.clone(), back),
            Polygon::from_cycle(self.plane.clone(), front),
        ))
    }

    /// Fan-triangulates the polygon: `(p0, p_i, p_{i+1})` for each
    /// consecutive pair after the first point.
    pub fn triangulate(&self) -> Vec<[Point3<f64>; 3]> {
        (1..self.points.len().saturating_sub(1))
            .map(|i| [self.points[0], self.points[i], self.points[i + 1]])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn z0_plane() -> Rc<MapPlane> {
        Rc::new(MapPlane::new(
            Plane::new(Vector3::new(0.0, 0.0, 1.0), 0.0),
            Vector3::x(),
            Vector3::y(),
        ))
    }

    fn unit_square() -> Polygon {
        Polygon::from_points(
            z0_plane(),
            vec![
                Point3::new(0.5, 0.5, 0.0),
                Point3::new(-0.5, 0.5, 0.0),
                Point3::new(0.5, -0.5, 0.0),
                Point3::new(-0.5, -0.5, 0.0),
            ],
        )
    }

    #[test]
    fn from_points_sorts_into_cycle() {
        let square = unit_square();
        // Angular order: every consecutive pair must be an edge of the
        // square, i.e. differ in exactly one coordinate.
        for i in 0..4 {
            let a = square.points()[i];
            let b = square.points()[(i + 1) % 4];
            let changed = ((a.x - b.x).abs() > 0.5) as u8 + ((a.y - b.y).abs() > 0.5) as u8;
            assert_eq!(changed, 1, "points {a:?} and {b:?} are not adjacent");
        }
    }

    #[test]
    fn points_lie_on_plane() {
        let square = unit_square();
        for p in square.points() {
            assert!(square.plane().plane().signed_distance(*p).abs() < SIDE_EPSILON);
        }
        assert_eq!(
            square.classify(square.plane().plane()),
            Classification::Coplanar
        );
    }

    #[test]
    fn from_plane_covers_requested_extent() {
        let plane = Plane::new(Vector3::new(-1.0, 0.0, 0.0), 2.0);
        let quad = Polygon::from_plane(&plane, 3.0);
        assert_eq!(quad.len(), 4);
        for p in quad.points() {
            assert!((p.x - 2.0).abs() < 1e-9);
            assert!(p.y.abs() > 2.9 && p.y.abs() < 3.1);
            assert!(p.z.abs() > 2.9 && p.z.abs() < 3.1);
        }
        assert_eq!(quad.classify(&plane), Classification::Coplanar);
    }

    #[test]
    fn split_through_center() {
        let square = unit_square();
        let splitter = Plane::new(Vector3::new(1.0, 0.0, 0.0), 0.0);

        let (back, front) = square.split(&splitter).unwrap();

        assert_eq!(back.len(), 4);
        assert_eq!(front.len(), 4);
        assert_eq!(back.classify(&splitter), Classification::CoplanarBack);
        assert_eq!(front.classify(&splitter), Classification::CoplanarFront);

        // Both halves stay on the original plane.
        let surface = square.plane().plane();
        assert_eq!(back.classify(surface), Classification::Coplanar);
        assert_eq!(front.classify(surface), Classification::Coplanar);

        // The cut inserts exactly the two x = 0 crossings into each half.
        for half in [&back, &front] {
            let on_cut = half.points().iter().filter(|p| p.x.abs() < 1e-9).count();
            assert_eq!(on_cut, 2);
        }
    }

    #[test]
    fn split_keeps_cyclic_order() {
        let square = unit_square();
        let splitter = Plane::new(Vector3::new(1.0, 0.0, 0.0), 0.1);
        let (back, front) = square.split(&splitter).unwrap();

        // Convexity check via the turning direction of consecutive edges.
        for half in [&back, &front] {
            let pts = half.points();
            let n = pts.len();
            for i in 0..n {
                let e0 = pts[(i + 1) % n] - pts[i];
                let e1 = pts[(i + 2) % n] - pts[(i + 1) % n];
                let turn = e0.cross(&e1).dot(&half.plane().normal());
                assert!(turn >= -1e-9, "cycle order lost at point {i}");
            }
        }
    }

    #[test]
    fn split_rejects_sliver() {
        let square = unit_square();
        // A plane through a single corner leaves that corner alone on the
        // back side, which is not enough for a polygon.
        let splitter = Plane::new(Vector3::new(1.0, 1.0, 0.0), 1.0);
        assert!(square.split(&splitter).is_err());
    }

    #[test]
    fn triangulate_is_a_fan() {
        let square = unit_square();
        let triangles = square.triangulate();
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[0][0], square.points()[0]);
        assert_eq!(triangles[1][0], square.points()[0]);
        assert_eq!(triangles[0][2], triangles[1][1]);
    }
}
