/// tstack core library - transform stack and scene draw loop
///
/// This library composes camera, projection and a stack of model transforms
/// into per-draw matrices, and drives a renderer backend through one frame.

pub mod backend;
pub mod demo;
pub mod error;
pub mod geometry;
pub mod projection;
pub mod recording;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use backend::{
    BackendError, BufferHandle, PrimitiveTopology, ProgramHandle, ProgramSource, RendererBackend,
};
pub use demo::DemoScene;
pub use error::TransformError;
pub use geometry::Shape;
pub use projection::{Camera, ClipVolume, Projection, ProjectionMode};
pub use recording::RecordingBackend;
pub use scene::{FrameError, FrameStats, Instance, Scene, SceneConfig, SceneDrawLoop, Step};
pub use transform::{StackScope, TransformStack};

/// 4x4 `f32` matrix, column-major, applied to column vectors
pub type Matrix4 = nalgebra::Matrix4<f32>;
