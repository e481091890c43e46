/// tstack terminal viewer
///
/// Usage: tstack-terminal [cubes|circles|triangles|cone] [--once]
///
/// Controls:
///   - WASD / Arrow Keys: Orbit the camera
///   - R: Reset the orbit
///   - N / Tab: Next scene
///   - Q/ESC: Quit
use anyhow::{Context, Result};
use std::env;
use tstack_core::DemoScene;
use tstack_terminal::logging::{init_logging, LoggingConfig};
use tstack_terminal::{render_once, AsciiConfig, TerminalApp};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let args: Vec<String> = env::args().skip(1).collect();
    let once = args.iter().any(|arg| arg == "--once");
    let demo = match args.iter().find(|arg| !arg.starts_with("--")) {
        Some(name) => DemoScene::from_name(name).with_context(|| {
            format!("unknown scene `{}`, expected cubes, circles, triangles or cone", name)
        })?,
        None => DemoScene::Cubes,
    };

    if once {
        for line in render_once(demo, AsciiConfig::default())? {
            println!("{}", line);
        }
        return Ok(());
    }

    let mut app = TerminalApp::new(demo).context("failed to start the terminal viewer")?;
    app.run()
}
