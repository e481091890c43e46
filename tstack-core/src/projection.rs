/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::TransformError;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Relative tolerance used to decide that `up` is parallel to the view direction.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Look-at camera: where the observer stands, what it looks at, and which way is up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new(eye: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) -> Self {
        Self { eye, target, up }
    }

    /// Create the view matrix (camera transformation).
    ///
    /// Fails when the eye sits on the target or `up` is parallel to the
    /// viewing direction, since the orientation is undefined in both cases.
    pub fn view_matrix(&self) -> Result<Matrix4<f32>, TransformError> {
        let forward = self.target - self.eye;
        if forward.norm() <= f32::EPSILON {
            return Err(TransformError::DegenerateCamera);
        }

        let side = forward.cross(&self.up);
        if side.norm() <= PARALLEL_EPSILON * forward.norm() * self.up.norm() {
            return Err(TransformError::DegenerateCamera);
        }

        Ok(Matrix4::look_at_rh(&self.eye, &self.target, &self.up))
    }
}

impl Default for Camera {
    /// Isometric view from (10, 10, 10) looking at the origin.
    fn default() -> Self {
        Self {
            eye: Point3::new(10.0, 10.0, 10.0),
            target: Point3::origin(),
            up: Vector3::y(),
        }
    }
}

/// Six planes bounding a viewing volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVolume {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl ClipVolume {
    pub fn new(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
            near,
            far,
        }
    }

    /// Volume `half_height` tall on each side of the axis, widened by the surface aspect ratio
    pub fn from_aspect(width: u32, height: u32, half_height: f32, near: f32, far: f32) -> Self {
        let aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        let half_width = half_height * aspect;
        Self::new(-half_width, half_width, -half_height, half_height, near, far)
    }

    fn is_degenerate(&self) -> bool {
        self.left == self.right || self.bottom == self.top || self.near == self.far
    }
}

/// Projection applied after the camera transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective frustum; `near` and `far` are positive distances with `far > near`.
    Perspective(ClipVolume),
    Orthographic(ClipVolume),
}

impl Projection {
    pub fn from_mode(mode: ProjectionMode, volume: ClipVolume) -> Self {
        match mode {
            ProjectionMode::Perspective => Projection::Perspective(volume),
            ProjectionMode::Orthographic => Projection::Orthographic(volume),
        }
    }

    pub fn volume(&self) -> &ClipVolume {
        match self {
            Projection::Perspective(volume) | Projection::Orthographic(volume) => volume,
        }
    }

    /// Create the projection matrix
    pub fn matrix(&self) -> Result<Matrix4<f32>, TransformError> {
        let v = self.volume();
        if v.is_degenerate() {
            return Err(TransformError::InvalidFrustum);
        }

        match self {
            Projection::Perspective(v) => {
                if v.near <= 0.0 || v.far <= v.near {
                    return Err(TransformError::InvalidFrustum);
                }
                Ok(frustum_matrix(v))
            }
            Projection::Orthographic(v) => Ok(Matrix4::new_orthographic(
                v.left, v.right, v.bottom, v.top, v.near, v.far,
            )),
        }
    }
}

fn frustum_matrix(v: &ClipVolume) -> Matrix4<f32> {
    let width = v.right - v.left;
    let height = v.top - v.bottom;
    let depth = v.far - v.near;

    Matrix4::new(
        2.0 * v.near / width,
        0.0,
        (v.right + v.left) / width,
        0.0,
        0.0,
        2.0 * v.near / height,
        (v.top + v.bottom) / height,
        0.0,
        0.0,
        0.0,
        -(v.far + v.near) / depth,
        -2.0 * v.far * v.near / depth,
        0.0,
        0.0,
        -1.0,
        0.0,
    )
}
