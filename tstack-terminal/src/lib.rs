/// Terminal front end: ASCII backend plus an interactive scene viewer
use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use log::warn;
use nalgebra::{UnitQuaternion, Vector3};
use std::io::{stdout, Write};
use std::time::{Duration, Instant};
use tstack_core::{Camera, DemoScene, FrameStats, Scene, SceneDrawLoop};

pub mod backend;
pub mod logging;
pub mod renderer;
pub mod shader;

pub use backend::{AsciiBackend, AsciiConfig};
pub use renderer::AsciiRenderer;

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: u32 = 2;

/// Pitch limit, short of looking straight down the up axis
const MAX_PITCH: f32 = 1.4;

/// Orbit the camera's eye around its target
pub fn orbit_camera(base: &Camera, yaw: f32, pitch: f32) -> Camera {
    let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
        * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), pitch);
    let offset = rotation * (base.eye - base.target);
    Camera::new(base.target + offset, base.target, base.up)
}

/// Render a single frame of `demo` without touching the terminal
pub fn render_once(demo: DemoScene, config: AsciiConfig) -> Result<Vec<String>> {
    let mut backend = AsciiBackend::new(config);
    let scene = demo
        .load(&mut backend)
        .with_context(|| format!("failed to load the {} scene", demo.name()))?;

    let mut draw_loop = SceneDrawLoop::new(demo.config());
    draw_loop.surface_changed(config.width as u32, config.height as u32 * CELL_ASPECT)?;
    draw_loop.draw_frame(&mut backend, &scene)?;

    Ok(backend.renderer().lines())
}

/// Main application struct for terminal rendering
pub struct TerminalApp {
    demo: DemoScene,
    scene: Scene,
    draw_loop: SceneDrawLoop,
    backend: AsciiBackend,
    yaw: f32,
    pitch: f32,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
    stats: FrameStats,
    last_error: Option<String>,
}

impl TerminalApp {
    pub fn new(demo: DemoScene) -> Result<Self> {
        let (width, height) = terminal::size().context("failed to query terminal size")?;
        let mut backend = AsciiBackend::new(AsciiConfig {
            width: width as usize,
            height: height as usize,
        });
        let scene = demo.load(&mut backend)?;
        let mut draw_loop = SceneDrawLoop::new(demo.config());
        draw_loop.surface_changed(width as u32, height as u32 * CELL_ASPECT)?;

        Ok(Self {
            demo,
            scene,
            draw_loop,
            backend,
            yaw: 0.0,
            pitch: 0.0,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            stats: FrameStats::default(),
            last_error: None,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            if event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?)?;
            }

            self.update();
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Resize(width, height) => {
                self.backend.resize(width as usize, height as usize);
                self.draw_loop
                    .surface_changed(width as u32, height as u32 * CELL_ASPECT)?;
            }
            Event::Key(KeyEvent { code, .. }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.running = false;
                }
                KeyCode::Char('w') | KeyCode::Up => self.pitch -= 0.1,
                KeyCode::Char('s') | KeyCode::Down => self.pitch += 0.1,
                KeyCode::Char('a') | KeyCode::Left => self.yaw -= 0.1,
                KeyCode::Char('d') | KeyCode::Right => self.yaw += 0.1,
                KeyCode::Char('r') => {
                    self.yaw = 0.0;
                    self.pitch = 0.0;
                }
                KeyCode::Char('n') | KeyCode::Tab => self.switch_demo(self.demo.next())?,
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn switch_demo(&mut self, demo: DemoScene) -> Result<()> {
        let (width, height) = (self.backend.renderer().width(), self.backend.renderer().height());
        self.backend.release_programs();
        self.scene = demo.load(&mut self.backend)?;
        self.draw_loop = SceneDrawLoop::new(demo.config());
        self.draw_loop
            .surface_changed(width as u32, height as u32 * CELL_ASPECT)?;
        self.demo = demo;
        self.yaw = 0.0;
        self.pitch = 0.0;
        Ok(())
    }

    fn update(&mut self) {
        // Continuous slow orbit for demo effect
        self.yaw += 0.01;
        self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);

        let camera = orbit_camera(&self.demo.config().camera, self.yaw, self.pitch);
        if let Err(e) = self.draw_loop.set_camera(camera) {
            warn!("keeping previous camera: {}", e);
        }
    }

    fn render(&mut self) -> Result<()> {
        self.backend.begin_frame();
        match self.draw_loop.draw_frame(&mut self.backend, &self.scene) {
            Ok(stats) => {
                self.stats = stats;
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.backend.renderer().draw(&mut stdout)?;

        // Draw UI overlay
        let status = match &self.last_error {
            Some(error) => format!("error: {}", error),
            None => format!("{} draws, depth {}", self.stats.draws, self.stats.max_depth),
        };
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "tstack | {} | FPS: {:.1} | {} | WASD/Arrows=Orbit R=Reset N=Next Q=Quit",
                self.demo.name(),
                self.fps,
                status
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
