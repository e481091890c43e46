/// Per-frame draw loop driving the transform stack
use std::fmt;

use log::{debug, trace, warn};
use nalgebra::Vector3;

use crate::backend::{BackendError, PrimitiveTopology, ProgramHandle, RendererBackend};
use crate::error::TransformError;
use crate::projection::{Camera, ClipVolume, Projection, ProjectionMode};
use crate::transform::TransformStack;

/// One instruction inside an instance, executed in order
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Translate(Vector3<f32>),
    Rotate { angle_degrees: f32, axis: Vector3<f32> },
    Scale(Vector3<f32>),
    /// Submit the geometry with the transform accumulated so far.
    Draw,
    /// Child instance, posed relative to the transform accumulated so far.
    Nested(Instance),
}

/// A pose built from steps inside its own push/pop scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    pub steps: Vec<Step>,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(mut self, x: f32, y: f32, z: f32) -> Self {
        self.steps.push(Step::Translate(Vector3::new(x, y, z)));
        self
    }

    pub fn rotate(mut self, angle_degrees: f32, x: f32, y: f32, z: f32) -> Self {
        self.steps.push(Step::Rotate {
            angle_degrees,
            axis: Vector3::new(x, y, z),
        });
        self
    }

    pub fn scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.steps.push(Step::Scale(Vector3::new(x, y, z)));
        self
    }

    pub fn draw(mut self) -> Self {
        self.steps.push(Step::Draw);
        self
    }

    pub fn nest(mut self, child: Instance) -> Self {
        self.steps.push(Step::Nested(child));
        self
    }
}

/// Geometry already uploaded to a backend plus the instances to draw it at
#[derive(Debug, Clone)]
pub struct Scene {
    pub program: ProgramHandle,
    pub matrix_uniform: String,
    pub topology: PrimitiveTopology,
    pub vertex_count: usize,
    pub instances: Vec<Instance>,
}

/// Camera and projection parameters; the projection width follows the surface aspect ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    pub camera: Camera,
    pub mode: ProjectionMode,
    pub half_height: f32,
    pub near: f32,
    pub far: f32,
}

impl SceneConfig {
    pub fn projection(&self, width: u32, height: u32) -> Projection {
        Projection::from_mode(
            self.mode,
            ClipVolume::from_aspect(width, height, self.half_height, self.near, self.far),
        )
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            mode: ProjectionMode::Orthographic,
            half_height: 6.0,
            near: 3.0,
            far: 20.0,
        }
    }
}

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draws: usize,
    pub max_depth: usize,
    /// Camera or projection changed and was re-applied this frame.
    pub view_applied: bool,
}

/// Error that aborted a frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    Transform(TransformError),
    Backend(BackendError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Transform(e) => write!(f, "transform error: {}", e),
            FrameError::Backend(e) => write!(f, "backend error: {}", e),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Transform(e) => Some(e),
            FrameError::Backend(e) => Some(e),
        }
    }
}

impl From<TransformError> for FrameError {
    fn from(e: TransformError) -> Self {
        FrameError::Transform(e)
    }
}

impl From<BackendError> for FrameError {
    fn from(e: BackendError) -> Self {
        FrameError::Backend(e)
    }
}

/// Drives a [`TransformStack`] for one rendering surface
pub struct SceneDrawLoop {
    stack: TransformStack,
    config: SceneConfig,
    projection: Projection,
    applied: Option<(Camera, Projection)>,
}

impl SceneDrawLoop {
    /// Start with a square surface until the first `surface_changed`
    pub fn new(config: SceneConfig) -> Self {
        Self {
            stack: TransformStack::new(),
            projection: config.projection(1, 1),
            config,
            applied: None,
        }
    }

    pub fn stack(&self) -> &TransformStack {
        &self.stack
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Recompute the projection for a new surface size
    pub fn surface_changed(&mut self, width: u32, height: u32) -> Result<(), TransformError> {
        let projection = self.config.projection(width, height);
        projection.matrix()?;
        debug!("surface changed to {}x{}", width, height);
        self.projection = projection;
        Ok(())
    }

    /// Move the camera; takes effect at the start of the next frame
    pub fn set_camera(&mut self, camera: Camera) -> Result<(), TransformError> {
        camera.view_matrix()?;
        self.config.camera = camera;
        Ok(())
    }

    /// Draw every instance of `scene`, each inside its own push/pop scope.
    ///
    /// The first failure aborts the rest of the frame. The stack is back at its
    /// entry depth whether the frame succeeds or not.
    pub fn draw_frame<B>(&mut self, backend: &mut B, scene: &Scene) -> Result<FrameStats, FrameError>
    where
        B: RendererBackend + ?Sized,
    {
        let mut stats = FrameStats::default();
        let result = self.draw_instances(backend, scene, &mut stats);
        match &result {
            Ok(()) => trace!(
                "frame: {} draws, max depth {}",
                stats.draws,
                stats.max_depth
            ),
            Err(e) => warn!("frame aborted after {} draws: {}", stats.draws, e),
        }
        result.map(|()| stats)
    }

    fn draw_instances<B>(
        &mut self,
        backend: &mut B,
        scene: &Scene,
        stats: &mut FrameStats,
    ) -> Result<(), FrameError>
    where
        B: RendererBackend + ?Sized,
    {
        stats.view_applied = self.apply_view()?;

        for instance in &scene.instances {
            let mut scope = self.stack.scope();
            draw_instance(&mut scope, backend, scene, instance, stats)?;
        }
        Ok(())
    }

    fn apply_view(&mut self) -> Result<bool, TransformError> {
        let wanted = (self.config.camera, self.projection);
        if self.applied == Some(wanted) {
            return Ok(false);
        }

        self.stack.set_projection(&self.projection)?;
        let camera = self.config.camera;
        self.stack.set_camera(camera.eye, camera.target, camera.up)?;
        self.applied = Some(wanted);
        Ok(true)
    }
}

fn draw_instance<B>(
    stack: &mut TransformStack,
    backend: &mut B,
    scene: &Scene,
    instance: &Instance,
    stats: &mut FrameStats,
) -> Result<(), FrameError>
where
    B: RendererBackend + ?Sized,
{
    stats.max_depth = stats.max_depth.max(stack.depth());

    for step in &instance.steps {
        match step {
            Step::Translate(v) => stack.translate(v.x, v.y, v.z),
            Step::Rotate {
                angle_degrees,
                axis,
            } => stack.rotate(*angle_degrees, axis.x, axis.y, axis.z)?,
            Step::Scale(v) => stack.scale(v.x, v.y, v.z),
            Step::Draw => {
                let matrix = stack.final_matrix();
                backend.set_uniform_matrix(scene.program, &scene.matrix_uniform, &matrix)?;
                backend.submit_draw(scene.program, scene.topology, scene.vertex_count)?;
                stats.draws += 1;
            }
            Step::Nested(child) => {
                let mut scope = stack.scope();
                draw_instance(&mut scope, backend, scene, child, stats)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::*;
    use crate::backend::ProgramSource;
    use crate::recording::RecordingBackend;

    fn scene_with(backend: &mut RecordingBackend, instances: Vec<Instance>) -> Scene {
        let program = backend
            .compile_shader_program(&ProgramSource::new("vs", "fs"))
            .unwrap();
        Scene {
            program,
            matrix_uniform: "vMatrix".to_string(),
            topology: PrimitiveTopology::Triangles,
            vertex_count: 3,
            instances,
        }
    }

    #[test]
    fn test_each_instance_is_isolated_from_its_siblings() {
        let mut backend = RecordingBackend::new();
        let scene = scene_with(
            &mut backend,
            vec![
                Instance::new().translate(2.0, 0.0, 0.0).draw(),
                Instance::new().draw(),
            ],
        );
        let mut draw_loop = SceneDrawLoop::new(SceneConfig::default());
        draw_loop.draw_frame(&mut backend, &scene).unwrap();

        let draws = backend.draws();
        assert_eq!(draws.len(), 2);
        // The second instance only sees camera and projection.
        let stack = draw_loop.stack();
        let bare = stack.projection() * stack.view();
        assert_eq!(draws[1].matrix, Some(bare));
        assert_ne!(draws[0].matrix, draws[1].matrix);
    }

    #[test]
    fn test_view_applied_only_when_changed() {
        let mut backend = RecordingBackend::new();
        let scene = scene_with(&mut backend, vec![Instance::new().draw()]);
        let mut draw_loop = SceneDrawLoop::new(SceneConfig::default());

        assert!(draw_loop.draw_frame(&mut backend, &scene).unwrap().view_applied);
        assert!(!draw_loop.draw_frame(&mut backend, &scene).unwrap().view_applied);

        draw_loop.surface_changed(640, 480).unwrap();
        assert!(draw_loop.draw_frame(&mut backend, &scene).unwrap().view_applied);

        draw_loop
            .set_camera(Camera::new(
                Point3::new(0.0, 0.0, 10.0),
                Point3::origin(),
                Vector3::y(),
            ))
            .unwrap();
        assert!(draw_loop.draw_frame(&mut backend, &scene).unwrap().view_applied);
        assert!(!draw_loop.draw_frame(&mut backend, &scene).unwrap().view_applied);
    }

    #[test]
    fn test_failed_frame_restores_stack_balance() {
        let mut backend = RecordingBackend::new();
        let scene = scene_with(
            &mut backend,
            vec![
                Instance::new().draw(),
                Instance::new().translate(1.0, 0.0, 0.0).nest(
                    Instance::new()
                        .scale(2.0, 2.0, 2.0)
                        .draw()
                        .rotate(45.0, 0.0, 0.0, 0.0)
                        .draw(),
                ),
                Instance::new().draw(),
            ],
        );
        let mut draw_loop = SceneDrawLoop::new(SceneConfig::default());

        let err = draw_loop.draw_frame(&mut backend, &scene).unwrap_err();
        assert_eq!(err, FrameError::Transform(TransformError::InvalidAxis));
        assert_eq!(backend.draws().len(), 2);
        assert_eq!(draw_loop.stack().depth(), 0);
        assert_eq!(draw_loop.stack().current(), &nalgebra::Matrix4::identity());
    }

    #[test]
    fn test_backend_error_aborts_frame() {
        let mut backend = RecordingBackend::new();
        let mut scene = scene_with(&mut backend, vec![Instance::new().draw()]);
        scene.program = ProgramHandle(42);
        let mut draw_loop = SceneDrawLoop::new(SceneConfig::default());

        let err = draw_loop.draw_frame(&mut backend, &scene).unwrap_err();
        assert_eq!(
            err,
            FrameError::Backend(BackendError::UnknownProgram(ProgramHandle(42)))
        );
        assert_eq!(draw_loop.stack().depth(), 0);
    }

    #[test]
    fn test_invalid_surface_keeps_previous_projection() {
        let config = SceneConfig {
            mode: ProjectionMode::Perspective,
            near: 0.0,
            ..SceneConfig::default()
        };
        let mut draw_loop = SceneDrawLoop::new(config);
        assert_eq!(
            draw_loop.surface_changed(800, 600),
            Err(TransformError::InvalidFrustum)
        );
    }

    #[test]
    fn test_degenerate_camera_is_rejected_up_front() {
        let mut draw_loop = SceneDrawLoop::new(SceneConfig::default());
        let before = *draw_loop.config();
        assert_eq!(
            draw_loop.set_camera(Camera::new(Point3::origin(), Point3::origin(), Vector3::y())),
            Err(TransformError::DegenerateCamera)
        );
        assert_eq!(draw_loop.config(), &before);
    }

    #[test]
    fn test_max_depth_tracks_nesting() {
        let mut backend = RecordingBackend::new();
        let scene = scene_with(
            &mut backend,
            vec![Instance::new().nest(Instance::new().nest(Instance::new().draw()))],
        );
        let mut draw_loop = SceneDrawLoop::new(SceneConfig::default());
        let stats = draw_loop.draw_frame(&mut backend, &scene).unwrap();
        assert_eq!(stats.max_depth, 3);
        assert_eq!(stats.draws, 1);
    }
}
