use std::fs;

use log::{error, info};
use macroquad::prelude::*;
use map_csg::build_pipeline;
use map_viz::{build_meshes, draw_meshes, OrbitCamera, TreeNavigator};

const DEFAULT_MAP_PATH: &str = "unnamed.map";
const BSP_DUMP_PATH: &str = "bsptree.json";
const COLOR_SEED: u64 = 0x6d61_7063;

#[macroquad::main("Map CSG Viewer")]
async fn main() {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_MAP_PATH.to_string());
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            error!("cannot read {path}: {err}");
            return;
        }
    };

    let output = match build_pipeline(&text, COLOR_SEED) {
        Ok(output) => output,
        Err(err) => {
            error!("pipeline failed on {path}: {err}");
            return;
        }
    };
    info!(
        "{path}: {} triangles, tree depth {}, {} cells",
        output.vertices.len() / 3,
        output.tree.depth(),
        output.cells.len()
    );

    if let Err(err) = output.tree.write_json(BSP_DUMP_PATH) {
        error!("cannot write {BSP_DUMP_PATH}: {err}");
    }

    let meshes = build_meshes(&output.vertices);
    let mut camera = OrbitCamera::new(4.0, 0.6, 0.4);
    let mut navigator = TreeNavigator::new();
    let mut show_cells = false;

    loop {
        camera.update();
        navigator.update(&output.tree);
        if is_key_pressed(KeyCode::C) {
            show_cells = !show_cells;
        }

        clear_background(Color::from_rgba(20, 20, 30, 255));
        set_camera(&camera.to_camera3d());

        draw_meshes(&meshes);
        if show_cells {
            navigator.render_cells(&output.tree);
        }

        // Coordinate axes
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), RED);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0), GREEN);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0), BLUE);

        set_default_camera();

        draw_text(
            &format!(
                "{path} - {} triangles, {} cells",
                output.vertices.len() / 3,
                output.cells.len()
            ),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        draw_text(
            &format!(
                "Tree: depth {}, {} nodes, {} solid leaves",
                output.tree.depth(),
                output.tree.node_count(),
                output.tree.solid_leaf_count()
            ),
            10.0,
            45.0,
            18.0,
            GRAY,
        );
        navigator.draw_ui(&output.tree, 70.0);
        draw_text(
            "Drag mouse to rotate, scroll to zoom",
            10.0,
            155.0,
            16.0,
            DARKGRAY,
        );
        draw_text(&format!("FPS: {}", get_fps()), 10.0, 175.0, 16.0, DARKGRAY);

        next_frame().await
    }
}
