//! Plane representation and the shared classification primitives.

use nalgebra::{Point3, Vector3};

/// Epsilon for classifying polygon and face vertices against a plane.
/// Points within this distance of the plane are considered "on" the plane.
pub const SIDE_EPSILON: f64 = 1e-3;

/// Tighter epsilon used for the per-vertex side test while splitting.
pub const SPLIT_EPSILON: f64 = 1e-6;

/// Determinant threshold below which three planes have no unique
/// intersection point.
pub const INTERSECT_EPSILON: f64 = 1e-7;

/// Denominator threshold below which a ray is parallel to a plane.
pub const RAY_EPSILON: f64 = 1e-6;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of the normal)
    Front,
    /// Point is behind the plane (negative side of the normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

/// Classification of a vertex set (polygon or face) relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// All vertices are strictly in front of the plane
    Front,
    /// All vertices are strictly behind the plane
    Back,
    /// All vertices lie on the plane
    Coplanar,
    /// Some vertices on the plane, the rest in front, none behind
    CoplanarFront,
    /// Some vertices on the plane, the rest behind, none in front
    CoplanarBack,
    /// Vertices strictly on both sides (on-plane vertices do not suppress this)
    Spanning,
}

/// An oriented plane in 3D space, satisfying `normal · x + distance = 0`.
///
/// "Front" is the side where `normal · x + distance` is positive. Brush
/// supporting planes are oriented with their front toward the brush
/// interior, so a point inside a brush is on or in front of every
/// supporting plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    normal: Vector3<f64>,
    distance: f64,
}

impl Plane {
    /// Creates a new plane from a normal vector and distance term.
    /// The normal will be normalized automatically.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn new(normal: Vector3<f64>, distance: f64) -> Self {
        let norm = normal.norm();
        assert!(norm > f64::EPSILON, "Plane normal cannot be zero");
        Self {
            normal: normal / norm,
            distance: distance / norm,
        }
    }

    /// Creates a plane from three points, with the normal direction given by
    /// `(b - a) × (c - a)` and the distance chosen so all three points lie on
    /// the plane.
    ///
    /// Returns `None` if the points are collinear (or nearly so).
    pub fn from_points(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Option<Self> {
        let cross = (b - a).cross(&(c - a));
        if cross.norm() <= f64::EPSILON {
            return None;
        }
        let normal = cross.normalize();
        Some(Self {
            distance: -normal.dot(&a.coords),
            normal,
        })
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// Returns the distance term of the plane equation.
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Computes the signed distance from a point to the plane.
    /// Positive in front, negative behind, zero on the plane.
    #[inline]
    pub fn signed_distance(&self, point: Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) + self.distance
    }

    /// Classifies which side of the plane a point lies on, using the
    /// default [`SIDE_EPSILON`] tolerance.
    #[inline]
    pub fn classify_point(&self, point: Point3<f64>) -> PlaneSide {
        self.classify_point_with_epsilon(point, SIDE_EPSILON)
    }

    /// Classifies which side of the plane a point lies on, with a custom
    /// epsilon.
    pub fn classify_point_with_epsilon(&self, point: Point3<f64>, epsilon: f64) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > epsilon {
            PlaneSide::Front
        } else if dist < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Classifies a vertex set against the plane by tallying per-vertex
    /// sides at [`SIDE_EPSILON`].
    pub fn classify_points(&self, points: impl IntoIterator<Item = Point3<f64>>) -> Classification {
        let mut front = 0usize;
        let mut back = 0usize;
        let mut on_plane = 0usize;

        for point in points {
            match self.classify_point(point) {
                PlaneSide::Front => front += 1,
                PlaneSide::Back => back += 1,
                PlaneSide::OnPlane => on_plane += 1,
            }
        }

        if front > 0 && back > 0 {
            Classification::Spanning
        } else if on_plane == 0 {
            if front > 0 {
                Classification::Front
            } else if back > 0 {
                Classification::Back
            } else {
                Classification::Coplanar
            }
        } else if front > 0 {
            Classification::CoplanarFront
        } else if back > 0 {
            Classification::CoplanarBack
        } else {
            Classification::Coplanar
        }
    }

    /// Returns a new plane with the normal flipped (facing the opposite
    /// direction).
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Returns the point of the plane closest to the origin.
    #[inline]
    pub fn base_point(&self) -> Point3<f64> {
        Point3::from(-self.normal * self.distance)
    }

    /// Computes the unique point shared by three planes via Cramer's rule.
    ///
    /// Returns `None` when the determinant of the stacked normals falls
    /// below [`INTERSECT_EPSILON`], i.e. two planes are parallel or the
    /// three normals are coplanar.
    pub fn intersect3(&self, other1: &Plane, other2: &Plane) -> Option<Point3<f64>> {
        let n0 = self.normal;
        let n1 = other1.normal;
        let n2 = other2.normal;

        let det = n0.cross(&n1).dot(&n2);
        if det.abs() < INTERSECT_EPSILON {
            return None;
        }

        let numerator = n1.cross(&n2) * -self.distance
            + n2.cross(&n0) * -other1.distance
            + n0.cross(&n1) * -other2.distance;
        Some(Point3::from(numerator / det))
    }

    /// Computes the intersection of the line `origin + t * direction` with
    /// the plane. The direction need not be unit length.
    ///
    /// Returns `None` if the line is parallel to the plane (denominator
    /// below [`RAY_EPSILON`]).
    pub fn intersect_ray(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
    ) -> Option<Point3<f64>> {
        let denom = self.normal.dot(&direction);
        if denom.abs() < RAY_EPSILON {
            return None;
        }
        let t = self.normal.dot(&(self.base_point() - origin)) / denom;
        Some(origin + direction * t)
    }
}

/// A [`Plane`] carrying the tangent frame read from the map file.
///
/// The tangent and bitangent are opaque to the geometry kernel except as a
/// 2D projection basis for ordering polygon vertices. Two `MapPlane`s with
/// an identical underlying plane but different tangent frames are distinct
/// identities for face and vertex tracking, which is why equality is
/// structural over all three fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPlane {
    plane: Plane,
    tangent: Vector3<f64>,
    bitangent: Vector3<f64>,
}

impl MapPlane {
    /// Creates a map plane from a plane and its texture-space axes.
    pub fn new(plane: Plane, tangent: Vector3<f64>, bitangent: Vector3<f64>) -> Self {
        Self {
            plane,
            tangent,
            bitangent,
        }
    }

    /// Creates a map plane whose tangent frame is derived from the plane
    /// normal: the first world axis not parallel to the normal (trying Y,
    /// then X, then Z) is crossed into the normal to produce the frame.
    pub fn with_derived_frame(plane: Plane) -> Self {
        let n = plane.normal();
        let axis = if n.cross(&Vector3::y()).norm() > RAY_EPSILON {
            Vector3::y()
        } else if n.cross(&Vector3::x()).norm() > RAY_EPSILON {
            Vector3::x()
        } else {
            Vector3::z()
        };
        let right = n.cross(&axis).normalize();
        let left = right.cross(&n);
        Self {
            plane,
            tangent: right,
            bitangent: left,
        }
    }

    /// Returns the underlying plane.
    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Returns the unit normal of the underlying plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.plane.normal()
    }

    /// Returns the tangent axis.
    #[inline]
    pub fn tangent(&self) -> Vector3<f64> {
        self.tangent
    }

    /// Returns the bitangent axis.
    #[inline]
    pub fn bitangent(&self) -> Vector3<f64> {
        self.bitangent
    }

    /// Projects a point into the plane's 2D tangent frame.
    #[inline]
    pub fn project(&self, point: Point3<f64>) -> (f64, f64) {
        (
            self.tangent.dot(&point.coords),
            self.bitangent.dot(&point.coords),
        )
    }
}
