//! Identity-tracked brush faces.
//!
//! While brushes are being built and unioned, vertices are identified by the
//! triple of supporting planes whose intersection defines them, and edges by
//! the pair of planes their endpoints share. This keeps coincident geometry
//! exactly coincident across splits: the intersection point is re-derived
//! from the same planes instead of being interpolated repeatedly.

use std::rc::Rc;

use log::warn;
use nalgebra::Point3;

use crate::error::Error;
use crate::plane::{Classification, MapPlane, Plane, PlaneSide, SPLIT_EPSILON};
use crate::polygon::Polygon;

/// A polyhedron vertex identified by the unordered triple of map planes
/// meeting at it.
///
/// Equality is over the plane multiset, not the derived point. The three
/// planes must be linearly independent; construction fails otherwise.
#[derive(Debug, Clone)]
pub struct FaceVertex {
    planes: [Rc<MapPlane>; 3],
    point: Point3<f64>,
}

impl FaceVertex {
    /// Creates a vertex from three planes, solving the 3-plane system for
    /// its position. Returns `None` when the planes have no unique common
    /// point.
    pub fn new(a: Rc<MapPlane>, b: Rc<MapPlane>, c: Rc<MapPlane>) -> Option<Self> {
        let point = a.plane().intersect3(b.plane(), c.plane())?;
        Some(Self {
            planes: [a, b, c],
            point,
        })
    }

    /// Returns the vertex position.
    #[inline]
    pub fn point(&self) -> Point3<f64> {
        self.point
    }

    /// Returns the defining plane triple.
    #[inline]
    pub fn planes(&self) -> &[Rc<MapPlane>; 3] {
        &self.planes
    }

    /// Returns the planes shared by this vertex and another.
    pub fn common_planes(&self, other: &FaceVertex) -> Vec<Rc<MapPlane>> {
        self.planes
            .iter()
            .filter(|p| other.planes.contains(p))
            .cloned()
            .collect()
    }

    /// Two vertices bound a common edge when they share exactly two of
    /// their three planes.
    pub fn shares_edge_with(&self, other: &FaceVertex) -> bool {
        self.common_planes(other).len() == 2
    }
}

impl PartialEq for FaceVertex {
    fn eq(&self, other: &Self) -> bool {
        self.planes.iter().all(|p| other.planes.contains(p))
            && other.planes.iter().all(|p| self.planes.contains(p))
    }
}

/// An ordered face edge: two vertices plus the pair of planes common to
/// both. The common pair is the face's own surface plane and the one
/// neighboring plane the edge runs along.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceEdge {
    start: FaceVertex,
    end: FaceVertex,
    common: [Rc<MapPlane>; 2],
}

impl FaceEdge {
    /// Creates an edge between two vertices. Returns `None` unless the
    /// vertices share exactly two planes.
    pub fn new(start: FaceVertex, end: FaceVertex) -> Option<Self> {
        let common = start.common_planes(&end);
        let [a, b] = common.try_into().ok()?;
        Some(Self {
            start,
            end,
            common: [a, b],
        })
    }

    #[inline]
    pub fn start(&self) -> &FaceVertex {
        &self.start
    }

    #[inline]
    pub fn end(&self) -> &FaceVertex {
        &self.end
    }

    /// The two planes carried by this edge.
    #[inline]
    pub fn common(&self) -> &[Rc<MapPlane>; 2] {
        &self.common
    }
}

/// A planar convex polygon on one of a brush's supporting planes, with
/// vertex identities intact.
///
/// The vertex cycle and the edge cycle run in parallel: edge `i` joins
/// vertex `i` to vertex `i + 1 (mod k)`. The cycle is counter-clockwise
/// when viewed from the front of the surface plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    plane: Rc<MapPlane>,
    vertices: Vec<FaceVertex>,
    edges: Vec<FaceEdge>,
}

impl Face {
    /// Builds a face from an unordered set of candidate vertices lying on
    /// `plane`.
    ///
    /// Vertices are chained by edge adjacency (each step picks an unused
    /// vertex sharing exactly two planes with the current one) and the
    /// resulting cycle is reversed if its winding is not counter-clockwise
    /// from the plane's front. Returns `None` when no closed cycle of at
    /// least 3 vertices exists.
    pub fn from_vertices(plane: Rc<MapPlane>, candidates: Vec<FaceVertex>) -> Option<Self> {
        if candidates.len() < 3 {
            return None;
        }

        let mut remaining = candidates;
        let mut ordered = vec![remaining.remove(0)];
        loop {
            let current = ordered.last()?;
            match remaining.iter().position(|v| current.shares_edge_with(v)) {
                Some(i) => ordered.push(remaining.remove(i)),
                None => break,
            }
        }
        if ordered.len() < 3 {
            return None;
        }

        let v0 = ordered[0].point();
        let v1 = ordered[1].point();
        let v2 = ordered[2].point();
        let winding = (v2 - v1).cross(&(v0 - v1)).dot(&plane.normal());
        if winding < 0.0 {
            ordered.reverse();
        }

        let count = ordered.len();
        let edges: Option<Vec<FaceEdge>> = (0..count)
            .map(|i| FaceEdge::new(ordered[i].clone(), ordered[(i + 1) % count].clone()))
            .collect();

        Some(Self {
            plane,
            vertices: ordered,
            edges: edges?,
        })
    }

    /// Returns the surface map plane.
    #[inline]
    pub fn plane(&self) -> &MapPlane {
        &self.plane
    }

    /// Returns the ordered vertex cycle.
    #[inline]
    pub fn vertices(&self) -> &[FaceVertex] {
        &self.vertices
    }

    /// Returns the edge cycle, parallel to the vertex cycle.
    #[inline]
    pub fn edges(&self) -> &[FaceEdge] {
        &self.edges
    }

    /// Classifies the face's vertex set against a plane.
    pub fn classify(&self, plane: &Plane) -> Classification {
        plane.classify_points(self.vertices.iter().map(FaceVertex::point))
    }

    /// Splits the face by another map plane, returning `(back, front)`
    /// halves that inherit the surface plane.
    ///
    /// The split walks edges rather than points: where an edge crosses the
    /// splitter, the new vertex is identified as the intersection of the
    /// edge's two carrier planes with the splitter, so coincident cuts on
    /// adjacent faces produce identical vertices. Endpoints on the splitter
    /// go to both halves. A carrier pair collinear with the splitter cannot
    /// produce a vertex; it is logged and omitted.
    pub fn split(&self, splitter: &Rc<MapPlane>) -> Result<(Face, Face), Error> {
        let mut back = Vec::with_capacity(self.vertices.len() + 1);
        let mut front = Vec::with_capacity(self.vertices.len() + 1);

        for edge in &self.edges {
            let start_side = splitter
                .plane()
                .classify_point_with_epsilon(edge.start().point(), SPLIT_EPSILON);
            let end_side = splitter
                .plane()
                .classify_point_with_epsilon(edge.end().point(), SPLIT_EPSILON);

            match start_side {
                PlaneSide::Front => front.push(edge.start().clone()),
                PlaneSide::Back => back.push(edge.start().clone()),
                PlaneSide::OnPlane => {
                    front.push(edge.start().clone());
                    back.push(edge.start().clone());
                }
            }

            let crosses = matches!(
                (start_side, end_side),
                (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front)
            );
            if crosses {
                let [carrier_a, carrier_b] = edge.common().clone();
                match FaceVertex::new(carrier_a, carrier_b, splitter.clone()) {
                    Some(vertex) => {
                        front.push(vertex.clone());
                        back.push(vertex);
                    }
                    None => {
                        warn!("edge carrier planes are collinear with the splitter; crossing vertex omitted");
                    }
                }
            }
        }

        let back_face = Face::from_vertices(self.plane.clone(), back);
        let front_face = Face::from_vertices(self.plane.clone(), front);
        match (back_face, front_face) {
            (Some(back), Some(front)) => Ok((back, front)),
            _ => Err(Error::degenerate(
                "face split produced a half with fewer than 3 vertices",
            )),
        }
    }

    /// Forgets vertex identities, keeping only the ordered point cycle.
    pub fn to_polygon(&self) -> Polygon {
        Polygon::from_cycle(
            self.plane.clone(),
            self.vertices.iter().map(FaceVertex::point).collect(),
        )
    }
}
