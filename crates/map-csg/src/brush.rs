//! Convex brushes and their boolean union.

use std::rc::Rc;

use log::debug;
use nalgebra::Point3;

use crate::error::Error;
use crate::face::{Face, FaceVertex};
use crate::plane::{Classification, MapPlane, SIDE_EPSILON};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    /// Computes the bounding box of a non-empty point set.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Point3<f64>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut aabb = Self {
            min: first,
            max: first,
        };
        for p in points {
            aabb.extend(p);
        }
        Some(aabb)
    }

    /// Grows the box to contain `point`.
    pub fn extend(&mut self, point: Point3<f64>) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }
}

/// A convex polyhedron defined by the intersection of half-spaces.
///
/// Supporting planes face the interior: a point is inside the brush iff it
/// is on or in front of every plane. Each face lies on exactly one
/// supporting plane and every face vertex is inside every half-space.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    planes: Vec<Rc<MapPlane>>,
    faces: Vec<Face>,
    bounds: Aabb,
}

impl Brush {
    /// Builds the explicit polyhedron for a set of supporting planes.
    ///
    /// Every plane triple is intersected; legal intersection points that lie
    /// inside all other half-spaces become face vertices, identified by
    /// their plane triple. The vertices on each supporting plane are then
    /// chained into an ordered face. Triples without a unique intersection
    /// (parallel pairs, collinear normals) contribute nothing.
    pub fn from_planes(planes: Vec<MapPlane>) -> Result<Self, Error> {
        let planes: Vec<Rc<MapPlane>> = planes.into_iter().map(Rc::new).collect();
        let count = planes.len();

        let mut vertices: Vec<FaceVertex> = Vec::new();
        for i in 0..count {
            for j in i + 1..count {
                for k in j + 1..count {
                    let Some(vertex) =
                        FaceVertex::new(planes[i].clone(), planes[j].clone(), planes[k].clone())
                    else {
                        continue;
                    };
                    let inside = planes
                        .iter()
                        .all(|p| p.plane().signed_distance(vertex.point()) >= -SIDE_EPSILON);
                    if inside {
                        vertices.push(vertex);
                    }
                }
            }
        }

        let Some(bounds) = Aabb::from_points(vertices.iter().map(FaceVertex::point)) else {
            return Err(Error::degenerate("brush planes enclose no vertices"));
        };

        let mut faces = Vec::with_capacity(count);
        for plane in &planes {
            let candidates: Vec<FaceVertex> = vertices
                .iter()
                .filter(|v| v.planes().contains(plane))
                .cloned()
                .collect();
            if let Some(face) = Face::from_vertices(plane.clone(), candidates) {
                faces.push(face);
            }
        }
        if faces.is_empty() {
            return Err(Error::degenerate("brush planes produce no faces"));
        }

        Ok(Self {
            planes,
            faces,
            bounds,
        })
    }

    /// Returns the supporting planes.
    #[inline]
    pub fn planes(&self) -> &[Rc<MapPlane>] {
        &self.planes
    }

    /// Returns the faces of the polyhedron.
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Returns the bounding box over all face vertices.
    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Returns true if `point` is on or inside every supporting half-space.
    pub fn contains_point(&self, point: Point3<f64>) -> bool {
        self.planes
            .iter()
            .all(|p| p.plane().signed_distance(point) >= -SIDE_EPSILON)
    }
}

/// Computes the boundary of the union of a brush list.
///
/// Each brush's faces are clipped against the half-space volume of every
/// other brush, removing surface that lies inside the union. The iteration
/// order is significant: while clipping brush `B`, the `keep_shared` flag is
/// false for brushes ordered before `B` and true for brushes after it, so a
/// face coincident between two brushes survives in exactly one of them.
pub fn union(brushes: &[Brush]) -> Result<Vec<Face>, Error> {
    let mut result = Vec::new();
    for (index, brush) in brushes.iter().enumerate() {
        let mut faces = brush.faces.clone();
        let mut keep_shared = false;
        for (other_index, other) in brushes.iter().enumerate() {
            if other_index == index {
                keep_shared = true;
                continue;
            }
            let mut clipped = Vec::new();
            for face in faces {
                clipped.extend(clip_face(face, keep_shared, &other.planes, 0)?);
            }
            faces = clipped;
        }
        debug!(
            "brush {index}: {} of {} faces survive the union",
            faces.len(),
            brush.faces.len()
        );
        result.extend(faces);
    }
    Ok(result)
}

/// Clips one face against the half-space intersection `volume[index..]`,
/// returning the surviving pieces.
///
/// A face behind some volume plane is outside the volume and survives
/// whole. A face in front of every plane is inside and is dropped. A face
/// coplanar with a volume plane and facing the same way is the shared-face
/// tie-break: it survives only while `keep_shared` is false. Spanning faces
/// are split, the inside piece clipped further, and the outside piece
/// prepended to whatever survives; if the inside piece comes back untouched
/// (a coplanar keep deeper in the volume), the unsplit face is returned so
/// no unnecessary cut propagates.
fn clip_face(
    face: Face,
    keep_shared: bool,
    volume: &[Rc<MapPlane>],
    index: usize,
) -> Result<Vec<Face>, Error> {
    let Some(plane) = volume.get(index) else {
        // Inside every half-space: interior surface, dropped.
        return Ok(Vec::new());
    };

    match face.classify(plane.plane()) {
        Classification::Front | Classification::CoplanarFront => {
            clip_face(face, keep_shared, volume, index + 1)
        }
        Classification::Back | Classification::CoplanarBack => Ok(vec![face]),
        Classification::Coplanar => {
            if face.plane().normal().dot(&plane.normal()) > 0.0 && !keep_shared {
                Ok(vec![face])
            } else {
                clip_face(face, keep_shared, volume, index + 1)
            }
        }
        Classification::Spanning => {
            let (outside, inside) = face.split(plane)?;
            if index + 1 >= volume.len() {
                return Ok(vec![outside]);
            }
            let survivors = clip_face(inside.clone(), keep_shared, volume, index + 1)?;
            if survivors.is_empty() {
                Ok(vec![outside])
            } else if survivors.len() == 1 && survivors[0] == inside {
                Ok(vec![face])
            } else {
                let mut pieces = vec![outside];
                pieces.extend(survivors);
                Ok(pieces)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::Plane;
    use nalgebra::Vector3;

    // A cube brush with interior-facing supporting planes.
    fn cube(center: Point3<f64>, half: f64) -> Brush {
        let planes = vec![
            (Vector3::new(-1.0, 0.0, 0.0), center.x + half),
            (Vector3::new(1.0, 0.0, 0.0), half - center.x),
            (Vector3::new(0.0, -1.0, 0.0), center.y + half),
            (Vector3::new(0.0, 1.0, 0.0), half - center.y),
            (Vector3::new(0.0, 0.0, -1.0), center.z + half),
            (Vector3::new(0.0, 0.0, 1.0), half - center.z),
        ]
        .into_iter()
        .map(|(n, d)| MapPlane::with_derived_frame(Plane::new(n, d)))
        .collect();
        Brush::from_planes(planes).unwrap()
    }

    fn unique_points(faces: &[Face]) -> Vec<Point3<f64>> {
        let mut points: Vec<Point3<f64>> = Vec::new();
        for face in faces {
            for vertex in face.vertices() {
                let p = vertex.point();
                if !points.iter().any(|q| (p - q).norm() < 1e-9) {
                    points.push(p);
                }
            }
        }
        points
    }

    #[test]
    fn unit_cube_from_six_planes() {
        let brush = cube(Point3::origin(), 0.5);

        assert_eq!(brush.faces().len(), 6);
        for face in brush.faces() {
            assert_eq!(face.vertices().len(), 4);
        }
        assert_eq!(unique_points(brush.faces()).len(), 8);

        let bounds = brush.bounds();
        assert!((bounds.min - Point3::new(-0.5, -0.5, -0.5)).norm() < 1e-9);
        assert!((bounds.max - Point3::new(0.5, 0.5, 0.5)).norm() < 1e-9);

        let triangles: usize = brush
            .faces()
            .iter()
            .map(|f| f.to_polygon().triangulate().len())
            .sum();
        assert_eq!(triangles, 12);
    }

    #[test]
    fn degenerate_triples_are_skipped() {
        // x = 0, x = 1 and y = 0 share no point; adding three more planes
        // still closes a box, and the parallel pair contributes no vertex.
        let brush = cube(Point3::new(0.5, 0.5, 0.5), 0.5);
        assert_eq!(brush.faces().len(), 6);
        assert_eq!(unique_points(brush.faces()).len(), 8);
    }

    #[test]
    fn open_brush_is_rejected() {
        // Two parallel planes alone bound an infinite slab with no vertices.
        let planes = vec![
            MapPlane::with_derived_frame(Plane::new(Vector3::new(1.0, 0.0, 0.0), 0.0)),
            MapPlane::with_derived_frame(Plane::new(Vector3::new(-1.0, 0.0, 0.0), 1.0)),
        ];
        assert!(Brush::from_planes(planes).is_err());
    }

    #[test]
    fn contains_point_matches_half_spaces() {
        let brush = cube(Point3::origin(), 0.5);
        assert!(brush.contains_point(Point3::origin()));
        assert!(brush.contains_point(Point3::new(0.5, 0.5, 0.5)));
        assert!(!brush.contains_point(Point3::new(0.6, 0.0, 0.0)));
    }

    #[test]
    fn union_of_one_brush_is_identity() {
        let brush = cube(Point3::origin(), 0.5);
        let faces = union(std::slice::from_ref(&brush)).unwrap();
        assert_eq!(faces, brush.faces().to_vec());
    }

    #[test]
    fn union_of_disjoint_brushes_clips_nothing() {
        let a = cube(Point3::origin(), 0.5);
        let b = cube(Point3::new(5.0, 0.0, 0.0), 0.5);
        let faces = union(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(faces.len(), 12);
        let mut expected = a.faces().to_vec();
        expected.extend(b.faces().to_vec());
        assert_eq!(faces, expected);
    }

    #[test]
    fn union_drops_contained_brush() {
        let outer = cube(Point3::origin(), 1.0);
        let inner = cube(Point3::new(0.1, 0.0, 0.0), 0.25);
        let faces = union(&[outer.clone(), inner]).unwrap();
        assert_eq!(faces, outer.faces().to_vec());
    }

    #[test]
    fn union_of_overlapping_cubes() {
        // A spans x in [-0.5, 0.5]; B spans x in [0, 1]. The union boundary
        // is the L-shaped box [-0.5, 1] x [-0.5, 0.5]^2.
        let a = cube(Point3::origin(), 0.5);
        let b = cube(Point3::new(0.5, 0.0, 0.0), 0.5);
        let faces = union(&[a, b]).unwrap();

        // A keeps its x = -0.5 face and the outside strips of its four side
        // faces; its x = 0.5 face is interior to B and vanishes. B survives
        // untouched except for its x = 0 face, which is interior to A.
        assert_eq!(faces.len(), 10);

        // No face may linger strictly inside the union.
        let interior_x_faces = faces
            .iter()
            .filter(|f| {
                f.vertices()
                    .iter()
                    .all(|v| (v.point().x - 0.5).abs() < 1e-9)
                    || f.vertices().iter().all(|v| v.point().x.abs() < 1e-9)
            })
            .count();
        assert_eq!(interior_x_faces, 0);

        // The coincident top faces tile y = 0.5 exactly once: A's piece
        // covers x in [-0.5, 0], B's full face covers x in [0, 1].
        let tops: Vec<&Face> = faces
            .iter()
            .filter(|f| {
                f.vertices()
                    .iter()
                    .all(|v| (v.point().y - 0.5).abs() < 1e-9)
            })
            .collect();
        assert_eq!(tops.len(), 2);
        let mut spans: Vec<(f64, f64)> = tops
            .iter()
            .map(|f| {
                let xs: Vec<f64> = f.vertices().iter().map(|v| v.point().x).collect();
                (
                    xs.iter().cloned().fold(f64::INFINITY, f64::min),
                    xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                )
            })
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert!((spans[0].0 + 0.5).abs() < 1e-9 && spans[0].1.abs() < 1e-9);
        assert!(spans[1].0.abs() < 1e-9 && (spans[1].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn union_faces_keep_structural_invariants() {
        let a = cube(Point3::origin(), 0.5);
        let b = cube(Point3::new(0.5, 0.2, 0.0), 0.5);
        let faces = union(&[a, b]).unwrap();

        for face in &faces {
            let surface = face.plane().plane();
            for vertex in face.vertices() {
                assert!(surface.signed_distance(vertex.point()).abs() < SIDE_EPSILON);
            }
            for edge in face.edges() {
                assert_eq!(edge.common().len(), 2);
                assert!(edge.common().contains(&edge.start().planes()[0])
                    || edge.common().contains(&edge.start().planes()[1])
                    || edge.common().contains(&edge.start().planes()[2]));
            }
        }
    }
}
