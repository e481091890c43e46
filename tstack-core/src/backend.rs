/// Renderer backend interface consumed by the draw loop
use std::fmt;

use nalgebra::Matrix4;

/// Vertex and fragment source for one shader program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSource {
    pub vertex: String,
    pub fragment: String,
}

impl ProgramSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// How consecutive vertices are assembled into triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Every three vertices form a triangle.
    Triangles,
    /// Each vertex after the second forms a triangle with the previous two.
    TriangleStrip,
    /// Each vertex after the second forms a triangle with the first and the previous one.
    TriangleFan,
}

impl PrimitiveTopology {
    /// Vertex index triples for `vertex_count` vertices
    pub fn triangles(&self, vertex_count: usize) -> Vec<[usize; 3]> {
        match self {
            PrimitiveTopology::Triangles => (0..vertex_count / 3)
                .map(|i| [i * 3, i * 3 + 1, i * 3 + 2])
                .collect(),
            PrimitiveTopology::TriangleStrip => (2..vertex_count)
                .map(|i| {
                    // Keep a consistent winding on odd triangles.
                    if i % 2 == 0 {
                        [i - 2, i - 1, i]
                    } else {
                        [i - 1, i - 2, i]
                    }
                })
                .collect(),
            PrimitiveTopology::TriangleFan => (2..vertex_count).map(|i| [0, i - 1, i]).collect(),
        }
    }
}

/// Failure reported by a renderer backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    ShaderCompile(String),
    ShaderLink(String),
    UnknownProgram(ProgramHandle),
    UnknownAttribute(String),
    UnknownUniform(String),
    InvalidVertexData(String),
    /// A draw was submitted before the program's matrix uniform was set.
    MissingMatrix(ProgramHandle),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ShaderCompile(msg) => write!(f, "shader compile error: {}", msg),
            BackendError::ShaderLink(msg) => write!(f, "shader link error: {}", msg),
            BackendError::UnknownProgram(handle) => write!(f, "unknown program {:?}", handle),
            BackendError::UnknownAttribute(name) => write!(f, "unknown attribute `{}`", name),
            BackendError::UnknownUniform(name) => write!(f, "unknown uniform `{}`", name),
            BackendError::InvalidVertexData(msg) => write!(f, "invalid vertex data: {}", msg),
            BackendError::MissingMatrix(handle) => {
                write!(f, "draw on {:?} without a matrix uniform set", handle)
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// Shader compilation, vertex upload, uniform binding and draw submission
pub trait RendererBackend {
    fn compile_shader_program(&mut self, source: &ProgramSource) -> Result<ProgramHandle, BackendError>;

    fn upload_vertex_data(
        &mut self,
        program: ProgramHandle,
        attribute: &str,
        data: &[f32],
        components_per_vertex: usize,
    ) -> Result<BufferHandle, BackendError>;

    fn set_uniform_matrix(
        &mut self,
        program: ProgramHandle,
        uniform: &str,
        matrix: &Matrix4<f32>,
    ) -> Result<(), BackendError>;

    fn submit_draw(
        &mut self,
        program: ProgramHandle,
        topology: PrimitiveTopology,
        vertex_count: usize,
    ) -> Result<(), BackendError>;
}
