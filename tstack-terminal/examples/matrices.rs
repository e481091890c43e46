/// Example: print the final matrix of every draw in a scene
///
/// Usage: cargo run --example matrices -- [cubes|circles|triangles|cone]
use std::env;
use tstack_core::{DemoScene, RecordingBackend, SceneDrawLoop};

fn main() -> anyhow::Result<()> {
    let name = env::args().nth(1).unwrap_or_else(|| "cubes".to_string());
    let demo = DemoScene::from_name(&name)
        .ok_or_else(|| anyhow::anyhow!("unknown scene `{}`", name))?;

    let mut backend = RecordingBackend::new();
    let scene = demo.load(&mut backend)?;
    let mut draw_loop = SceneDrawLoop::new(demo.config());
    draw_loop.surface_changed(800, 600)?;
    let stats = draw_loop.draw_frame(&mut backend, &scene)?;

    println!(
        "{} scene: {} draws, max stack depth {}",
        demo.name(),
        stats.draws,
        stats.max_depth
    );
    for (i, draw) in backend.draws().iter().enumerate() {
        if let Some(matrix) = &draw.matrix {
            println!("draw {}:{}", i, matrix);
        }
    }
    Ok(())
}
