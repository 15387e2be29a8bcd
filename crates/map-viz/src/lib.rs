//! Shared visualization utilities for the map viewer.

use std::hash::{Hash, Hasher};

use macroquad::models::{draw_mesh, Mesh, Vertex};
use macroquad::prelude::*;
use map_csg::{ColoredVertex, Polygon};

pub mod navigator;
pub use navigator::TreeNavigator;

/// Triangles per uploaded mesh, bounded by the u16 index range.
const TRIANGLES_PER_MESH: usize = u16::MAX as usize / 3;

/// Builds renderable meshes from the pipeline's triangle vertices.
///
/// The vertex list is chunked so each mesh stays within macroquad's 16-bit
/// index range.
pub fn build_meshes(vertices: &[ColoredVertex]) -> Vec<Mesh> {
    vertices
        .chunks(TRIANGLES_PER_MESH * 3)
        .map(|chunk| {
            let mesh_vertices: Vec<Vertex> = chunk
                .iter()
                .map(|v| {
                    let [r, g, b, a] = v.color;
                    Vertex::new2(
                        vec3(v.position[0], v.position[1], v.position[2]),
                        vec2(0.0, 0.0),
                        Color::from_rgba(r, g, b, a),
                    )
                })
                .collect();
            let indices: Vec<u16> = (0..chunk.len() as u16).collect();
            Mesh {
                vertices: mesh_vertices,
                indices,
                texture: None,
            }
        })
        .collect()
}

/// Draws a list of prepared meshes.
pub fn draw_meshes(meshes: &[Mesh]) {
    for mesh in meshes {
        draw_mesh(mesh);
    }
}

/// Generates a deterministic color from a polygon's points using hashing,
/// so the same cell face keeps its color across frames.
pub fn polygon_color(polygon: &Polygon) -> Color {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for p in polygon.points() {
        p.x.to_bits().hash(&mut hasher);
        p.y.to_bits().hash(&mut hasher);
        p.z.to_bits().hash(&mut hasher);
    }
    let hash = hasher.finish();

    let r = ((hash >> 16) & 0xFF) as u8;
    let g = ((hash >> 8) & 0xFF) as u8;
    let b = (hash & 0xFF) as u8;

    // Keep a minimum brightness so no face disappears into the background.
    Color::from_rgba(r.max(40), g.max(40), b.max(40), 255)
}

/// Draws a single polygon by fan-triangulating it into a mesh.
pub fn draw_polygon(polygon: &Polygon) {
    let points = polygon.points();
    if points.len() < 3 {
        return;
    }

    let color = polygon_color(polygon);
    let mesh_vertices: Vec<Vertex> = points
        .iter()
        .map(|p| {
            Vertex::new2(
                vec3(p.x as f32, p.y as f32, p.z as f32),
                vec2(0.0, 0.0),
                color,
            )
        })
        .collect();

    let mut indices: Vec<u16> = Vec::with_capacity((points.len() - 2) * 3);
    for i in 1..points.len() - 1 {
        indices.push(0);
        indices.push(i as u16);
        indices.push((i + 1) as u16);
    }

    draw_mesh(&Mesh {
        vertices: mesh_vertices,
        indices,
        texture: None,
    });
}

/// Simple orbit camera for 3D scene navigation.
pub struct OrbitCamera {
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub target: Vec3,
    /// Multiplier for scroll wheel zoom
    pub zoom_speed: f32,
    /// Minimum distance from target
    pub min_distance: f32,
    /// Maximum distance from target
    pub max_distance: f32,
}

impl OrbitCamera {
    /// Creates a new orbit camera with the given configuration.
    pub fn new(distance: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            distance,
            yaw,
            pitch,
            target: vec3(0.0, 0.0, 0.0),
            zoom_speed: 0.25,
            min_distance: 0.5,
            max_distance: 100.0,
        }
    }

    /// Sets the zoom configuration (speed and distance limits).
    pub fn with_zoom(mut self, speed: f32, min: f32, max: f32) -> Self {
        self.zoom_speed = speed;
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    /// Sets the camera target point.
    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Updates camera state from user input (mouse drag, scroll, arrow keys).
    pub fn update(&mut self) {
        if is_mouse_button_down(MouseButton::Left) {
            let delta = mouse_delta_position();
            self.yaw -= delta.x * 2.0;
            self.pitch -= delta.y * 2.0;
        }

        // Clamp pitch to avoid gimbal lock
        self.pitch = self.pitch.clamp(-1.5, 1.5);

        let scroll = mouse_wheel().1;
        self.distance -= scroll * self.zoom_speed;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);

        if is_key_down(KeyCode::Left) {
            self.yaw += 0.02;
        }
        if is_key_down(KeyCode::Right) {
            self.yaw -= 0.02;
        }
        if is_key_down(KeyCode::Up) {
            self.pitch += 0.02;
        }
        if is_key_down(KeyCode::Down) {
            self.pitch -= 0.02;
        }
    }

    /// Returns the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + vec3(x, y, z)
    }

    /// Converts to macroquad's Camera3D for rendering.
    pub fn to_camera3d(&self) -> Camera3D {
        Camera3D {
            position: self.position(),
            up: vec3(0.0, 1.0, 0.0),
            target: self.target,
            ..Default::default()
        }
    }
}
