/// Built-in demo scenes
use nalgebra::{Point3, Vector3};

use crate::backend::{BackendError, ProgramSource, RendererBackend};
use crate::geometry::{Shape, COLOR_COMPONENTS, COORDS_PER_VERTEX};
use crate::projection::{Camera, ProjectionMode};
use crate::scene::{Instance, Scene, SceneConfig};

pub const POSITION_ATTRIBUTE: &str = "vPosition";
pub const COLOR_ATTRIBUTE: &str = "aColor";
pub const MATRIX_UNIFORM: &str = "vMatrix";

const VERTEX_SHADER: &str = "attribute vec4 vPosition;
attribute vec4 aColor;
uniform mat4 vMatrix;
varying vec4 vColor;
void main() {
    gl_Position = vMatrix * vPosition;
    vColor = aColor;
}";

const FRAGMENT_SHADER: &str = "precision mediump float;
varying vec4 vColor;
void main() {
    gl_FragColor = vColor;
}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoScene {
    Cubes,
    Circles,
    Triangles,
    Cone,
}

impl DemoScene {
    pub const ALL: [DemoScene; 4] = [
        DemoScene::Cubes,
        DemoScene::Circles,
        DemoScene::Triangles,
        DemoScene::Cone,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cubes" => Some(DemoScene::Cubes),
            "circles" => Some(DemoScene::Circles),
            "triangles" => Some(DemoScene::Triangles),
            "cone" => Some(DemoScene::Cone),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DemoScene::Cubes => "cubes",
            DemoScene::Circles => "circles",
            DemoScene::Triangles => "triangles",
            DemoScene::Cone => "cone",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            DemoScene::Cubes => DemoScene::Circles,
            DemoScene::Circles => DemoScene::Triangles,
            DemoScene::Triangles => DemoScene::Cone,
            DemoScene::Cone => DemoScene::Cubes,
        }
    }

    pub fn program_source(&self) -> ProgramSource {
        ProgramSource::new(VERTEX_SHADER, FRAGMENT_SHADER)
    }

    pub fn shape(&self) -> Shape {
        match self {
            DemoScene::Cubes => Shape::cube(2.0),
            DemoScene::Circles => Shape::circle(0.5, 24),
            DemoScene::Triangles => Shape::triangle(),
            DemoScene::Cone => Shape::cone(0.5, 1.0, 64),
        }
    }

    pub fn config(&self) -> SceneConfig {
        match self {
            DemoScene::Cubes => SceneConfig::default(),
            DemoScene::Circles => SceneConfig {
                camera: Camera::new(Point3::new(0.0, 0.0, 3.0), Point3::origin(), Vector3::y()),
                mode: ProjectionMode::Orthographic,
                half_height: 1.0,
                near: 1.0,
                far: 10.0,
            },
            DemoScene::Triangles => SceneConfig {
                camera: Camera::new(Point3::new(0.0, 0.0, 5.0), Point3::origin(), Vector3::y()),
                mode: ProjectionMode::Perspective,
                half_height: 1.0,
                near: 3.0,
                far: 7.0,
            },
            DemoScene::Cone => SceneConfig {
                camera: Camera::new(
                    Point3::new(-5.0, -5.0, -5.0),
                    Point3::origin(),
                    Vector3::y(),
                ),
                mode: ProjectionMode::Perspective,
                half_height: 1.0,
                near: 3.0,
                far: 20.0,
            },
        }
    }

    pub fn instances(&self) -> Vec<Instance> {
        match self {
            DemoScene::Cubes => five_cubes(),
            DemoScene::Circles => vec![
                Instance::new().draw(),
                Instance::new().translate(-0.6, 0.5, 0.0).scale(0.5, 0.5, 1.0).draw(),
                Instance::new().translate(0.6, -0.5, 0.0).scale(0.6, 0.3, 1.0).draw(),
            ],
            DemoScene::Triangles => vec![
                Instance::new().translate(-0.8, 0.0, 0.0).draw(),
                Instance::new()
                    .translate(0.8, 0.0, 0.0)
                    .rotate(180.0, 0.0, 0.0, -1.0)
                    .draw(),
            ],
            DemoScene::Cone => vec![Instance::new().draw()],
        }
    }

    /// Compile the program, upload the shape's positions and colors, and
    /// describe the scene for the draw loop
    pub fn load<B>(&self, backend: &mut B) -> Result<Scene, BackendError>
    where
        B: RendererBackend + ?Sized,
    {
        let shape = self.shape();
        let program = backend.compile_shader_program(&self.program_source())?;
        backend.upload_vertex_data(program, POSITION_ATTRIBUTE, &shape.positions, COORDS_PER_VERTEX)?;
        backend.upload_vertex_data(program, COLOR_ATTRIBUTE, &shape.colors, COLOR_COMPONENTS)?;

        Ok(Scene {
            program,
            matrix_uniform: MATRIX_UNIFORM.to_string(),
            topology: shape.topology,
            vertex_count: shape.vertex_count(),
            instances: self.instances(),
        })
    }
}

/// Five cubes: one at the origin, three offset along the axes, and a fifth
/// posed relative to the third offset's scaled space.
pub fn five_cubes() -> Vec<Instance> {
    vec![
        Instance::new().draw(),
        Instance::new().translate(0.0, 3.0, 0.0).draw(),
        Instance::new()
            .translate(0.0, -3.0, 0.0)
            .rotate(30.0, 1.0, 1.0, 1.0)
            .draw(),
        Instance::new()
            .translate(-3.0, 0.0, 0.0)
            .scale(0.5, 0.5, 0.5)
            .nest(
                Instance::new()
                    .translate(12.0, 0.0, 0.0)
                    .scale(1.0, 2.0, 1.0)
                    .rotate(30.0, 1.0, 2.0, 1.0)
                    .draw(),
            )
            .rotate(30.0, -1.0, -1.0, 1.0)
            .draw(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingBackend;

    #[test]
    fn test_every_demo_uploads_positions_and_colors() {
        for demo in DemoScene::ALL {
            let mut backend = RecordingBackend::new();
            let scene = demo.load(&mut backend).unwrap();
            assert_eq!(backend.buffer_count(), 2, "{} scene", demo.name());
            assert_eq!(scene.vertex_count, demo.shape().vertex_count());
        }
    }

    #[test]
    fn test_names_and_cycle() {
        let mut demo = DemoScene::Cubes;
        for expected in DemoScene::ALL {
            assert_eq!(demo, expected);
            assert_eq!(DemoScene::from_name(demo.name()), Some(demo));
            demo = demo.next();
        }
        assert_eq!(demo, DemoScene::Cubes);
        assert_eq!(DemoScene::from_name("teapot"), None);
    }
}
