//! The straight-line build pipeline: map text in, renderable geometry out.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::brush::{union, Brush};
use crate::bsp::{generate_cells, BspTree};
use crate::error::Error;
use crate::face::Face;
use crate::map::parse_map;
use crate::polygon::Polygon;

/// One triangle-list vertex, ready for upload to a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredVertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
}

/// Everything the pipeline produces for the host application.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Fan-triangulated union boundary, three vertices per triangle, with a
    /// per-polygon color.
    pub vertices: Vec<ColoredVertex>,
    /// The spatial partition over the same boundary.
    pub tree: BspTree,
    /// The convex cell volume of each solid leaf, in tree-traversal order
    /// (back subtrees before front).
    pub cells: Vec<Vec<Polygon>>,
}

/// Runs the full pipeline on map text.
///
/// The first entity's brushes are built, unioned, partitioned and
/// enumerated; each stage owns its output and hands it to the next. Any
/// failure aborts the whole computation. Colors are drawn from a generator
/// seeded with `color_seed`, so the output is reproducible.
pub fn build_pipeline(map_text: &str, color_seed: u64) -> Result<PipelineOutput, Error> {
    let map = parse_map(map_text)?;
    let entity = map.entities.first().ok_or(Error::EmptyMap)?;
    if entity.brushes().is_empty() {
        return Err(Error::EmptyMap);
    }

    let brushes = entity
        .brushes()
        .iter()
        .map(|planes| Brush::from_planes(planes.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("built {} brushes", brushes.len());

    let faces = union(&brushes)?;
    let polygons: Vec<Polygon> = faces.iter().map(Face::to_polygon).collect();
    debug!("union boundary has {} polygons", polygons.len());

    let mut tree = BspTree::build(polygons.clone())?;
    let cells = generate_cells(polygons.clone(), &mut tree)?;
    debug!("enumerated {} cells", cells.len());

    Ok(PipelineOutput {
        vertices: triangulate_colored(&polygons, color_seed),
        tree,
        cells,
    })
}

/// Fan-triangulates polygons into a flat vertex list, assigning every
/// polygon a random color from the seeded generator.
pub fn triangulate_colored(polygons: &[Polygon], seed: u64) -> Vec<ColoredVertex> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut vertices = Vec::new();
    for polygon in polygons {
        let color = [rng.random(), rng.random(), rng.random(), 255];
        for triangle in polygon.triangulate() {
            for point in triangle {
                vertices.push(ColoredVertex {
                    position: [point.x as f32, point.y as f32, point.z as f32],
                    color,
                });
            }
        }
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_MAP: &str = r#"
{
"classname" "worldspawn"
{
( 0.5 0 0 ) ( 0.5 0 1 ) ( 0.5 1 0 ) STONE [ 0 1 0 0 ] [ 0 0 1 0 ] 0 1 1
( -0.5 0 0 ) ( -0.5 1 0 ) ( -0.5 0 1 ) STONE [ 0 1 0 0 ] [ 0 0 1 0 ] 0 1 1
( 0 0.5 0 ) ( 1 0.5 0 ) ( 0 0.5 1 ) STONE [ 1 0 0 0 ] [ 0 0 1 0 ] 0 1 1
( 0 -0.5 0 ) ( 0 -0.5 1 ) ( 1 -0.5 0 ) STONE [ 1 0 0 0 ] [ 0 0 1 0 ] 0 1 1
( 0 0 0.5 ) ( 0 1 0.5 ) ( 1 0 0.5 ) STONE [ 1 0 0 0 ] [ 0 1 0 0 ] 0 1 1
( 0 0 -0.5 ) ( 1 0 -0.5 ) ( 0 1 -0.5 ) STONE [ 1 0 0 0 ] [ 0 1 0 0 ] 0 1 1
}
}
"#;

    #[test]
    fn cube_map_produces_twelve_triangles() {
        let output = build_pipeline(CUBE_MAP, 7).unwrap();
        assert_eq!(output.vertices.len(), 36);
        assert_eq!(output.tree.solid_leaf_count(), 1);
        assert_eq!(output.cells.len(), 1);
        assert_eq!(output.cells[0].len(), 6);
        assert!(output.tree.contains_point(nalgebra::Point3::origin()));
    }

    #[test]
    fn colors_are_deterministic_per_seed() {
        let a = build_pipeline(CUBE_MAP, 42).unwrap();
        let b = build_pipeline(CUBE_MAP, 42).unwrap();
        let c = build_pipeline(CUBE_MAP, 43).unwrap();

        assert_eq!(a.vertices, b.vertices);
        let a_colors: Vec<[u8; 4]> = a.vertices.iter().map(|v| v.color).collect();
        let c_colors: Vec<[u8; 4]> = c.vertices.iter().map(|v| v.color).collect();
        assert_ne!(a_colors, c_colors);
    }

    #[test]
    fn triangles_share_their_polygon_color() {
        let output = build_pipeline(CUBE_MAP, 7).unwrap();
        // 6 quads, 2 triangles each: vertices 0..6 belong to the first quad.
        let first = output.vertices[0].color;
        assert!(output.vertices[..6].iter().all(|v| v.color == first));
        assert_ne!(output.vertices[6].color, first);
    }

    #[test]
    fn empty_map_is_rejected() {
        assert!(matches!(build_pipeline("", 0), Err(Error::EmptyMap)));
        assert!(matches!(
            build_pipeline("{\n\"classname\" \"worldspawn\"\n}\n", 0),
            Err(Error::EmptyMap)
        ));
    }
}
