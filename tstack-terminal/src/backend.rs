/// Renderer backend that rasterizes draws into an ASCII character grid
use std::collections::HashMap;

use crossterm::style::Color;
use log::debug;
use nalgebra::{Matrix4, Point3, Vector4};
use tstack_core::{
    BackendError, BufferHandle, PrimitiveTopology, ProgramHandle, ProgramSource, RendererBackend,
};

use crate::renderer::AsciiRenderer;
use crate::shader::{parse_shader, Qualifier, ShaderInterface};

/// Clip-space `w` below which a vertex counts as behind the eye
const MIN_CLIP_W: f32 = 1e-6;

/// Character grid size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
        }
    }
}

struct VertexBuffer {
    data: Vec<f32>,
    components: usize,
}

impl VertexBuffer {
    fn vertex_count(&self) -> usize {
        self.data.len() / self.components
    }

    /// Four components of vertex `i`, filling missing ones as GL does
    fn fetch(&self, i: usize) -> Vector4<f32> {
        let mut v = Vector4::new(0.0, 0.0, 0.0, 1.0);
        let start = i * self.components;
        for (c, value) in self.data[start..start + self.components].iter().enumerate() {
            v[c] = *value;
        }
        v
    }
}

struct Program {
    vertex: ShaderInterface,
    buffers: HashMap<String, VertexBuffer>,
    uniforms: HashMap<String, Matrix4<f32>>,
}

/// Software backend: one grid, shared by every program compiled on it
pub struct AsciiBackend {
    renderer: AsciiRenderer,
    programs: Vec<Program>,
    buffer_count: u32,
}

impl AsciiBackend {
    pub fn new(config: AsciiConfig) -> Self {
        Self {
            renderer: AsciiRenderer::new(config.width, config.height),
            programs: Vec::new(),
            buffer_count: 0,
        }
    }

    pub fn renderer(&self) -> &AsciiRenderer {
        &self.renderer
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.renderer.resize(width, height);
    }

    /// Clear the grid before a frame
    pub fn begin_frame(&mut self) {
        self.renderer.clear();
    }

    /// Forget every program and its buffers
    pub fn release_programs(&mut self) {
        self.programs.clear();
    }

    fn program_mut(&mut self, program: ProgramHandle) -> Result<&mut Program, BackendError> {
        self.programs
            .get_mut(program.0 as usize)
            .ok_or(BackendError::UnknownProgram(program))
    }
}

/// Average RGB of a triangle's corners, as a terminal color
fn triangle_color(corners: [Vector4<f32>; 3]) -> Color {
    let mean = (corners[0] + corners[1] + corners[2]) / 3.0;
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb {
        r: channel(mean.x),
        g: channel(mean.y),
        b: channel(mean.z),
    }
}

fn link(vertex: &ShaderInterface, fragment: &ShaderInterface) -> Result<(), BackendError> {
    if vertex.position_attribute().is_none() {
        return Err(BackendError::ShaderLink(
            "vertex shader declares no attribute".to_string(),
        ));
    }
    if vertex.matrix_uniform().is_none() {
        return Err(BackendError::ShaderLink(
            "vertex shader declares no mat4 uniform".to_string(),
        ));
    }
    for varying in fragment.with_qualifier(Qualifier::Varying) {
        match vertex.find(Qualifier::Varying, &varying.name) {
            Some(written) if written.ty == varying.ty => {}
            Some(written) => {
                return Err(BackendError::ShaderLink(format!(
                    "varying `{}` is {} in the vertex shader but {} in the fragment shader",
                    varying.name, written.ty, varying.ty
                )))
            }
            None => {
                return Err(BackendError::ShaderLink(format!(
                    "varying `{}` is not written by the vertex shader",
                    varying.name
                )))
            }
        }
    }
    Ok(())
}

impl RendererBackend for AsciiBackend {
    fn compile_shader_program(&mut self, source: &ProgramSource) -> Result<ProgramHandle, BackendError> {
        let vertex = parse_shader(&source.vertex)
            .map_err(|e| BackendError::ShaderCompile(format!("vertex shader: {}", e)))?;
        let fragment = parse_shader(&source.fragment)
            .map_err(|e| BackendError::ShaderCompile(format!("fragment shader: {}", e)))?;
        if let Some(attribute) = fragment.position_attribute() {
            return Err(BackendError::ShaderCompile(format!(
                "fragment shader: attribute `{}` is not allowed",
                attribute.name
            )));
        }
        link(&vertex, &fragment)?;

        self.programs.push(Program {
            vertex,
            buffers: HashMap::new(),
            uniforms: HashMap::new(),
        });
        let handle = ProgramHandle(self.programs.len() as u32 - 1);
        debug!("linked program {:?}", handle);
        Ok(handle)
    }

    fn upload_vertex_data(
        &mut self,
        program: ProgramHandle,
        attribute: &str,
        data: &[f32],
        components_per_vertex: usize,
    ) -> Result<BufferHandle, BackendError> {
        let program = self.program_mut(program)?;
        if program.vertex.find(Qualifier::Attribute, attribute).is_none() {
            return Err(BackendError::UnknownAttribute(attribute.to_string()));
        }
        if !(1..=4).contains(&components_per_vertex) {
            return Err(BackendError::InvalidVertexData(format!(
                "{} components per vertex, expected 1 to 4",
                components_per_vertex
            )));
        }
        if data.len() % components_per_vertex != 0 {
            return Err(BackendError::InvalidVertexData(format!(
                "{} floats do not split into {}-component vertices",
                data.len(),
                components_per_vertex
            )));
        }

        program.buffers.insert(
            attribute.to_string(),
            VertexBuffer {
                data: data.to_vec(),
                components: components_per_vertex,
            },
        );
        self.buffer_count += 1;
        Ok(BufferHandle(self.buffer_count - 1))
    }

    fn set_uniform_matrix(
        &mut self,
        program: ProgramHandle,
        uniform: &str,
        matrix: &Matrix4<f32>,
    ) -> Result<(), BackendError> {
        let program = self.program_mut(program)?;
        match program.vertex.find(Qualifier::Uniform, uniform) {
            Some(declared) if declared.ty == "mat4" => {
                program.uniforms.insert(uniform.to_string(), *matrix);
                Ok(())
            }
            _ => Err(BackendError::UnknownUniform(uniform.to_string())),
        }
    }

    fn submit_draw(
        &mut self,
        handle: ProgramHandle,
        topology: PrimitiveTopology,
        vertex_count: usize,
    ) -> Result<(), BackendError> {
        let program = self
            .programs
            .get(handle.0 as usize)
            .ok_or(BackendError::UnknownProgram(handle))?;

        // Both exist: `link` refuses programs without them.
        let (Some(position), Some(matrix_uniform)) =
            (program.vertex.position_attribute(), program.vertex.matrix_uniform())
        else {
            return Err(BackendError::ShaderLink("incomplete program".to_string()));
        };

        let buffer = program.buffers.get(&position.name).ok_or_else(|| {
            BackendError::InvalidVertexData(format!("no data uploaded for `{}`", position.name))
        })?;
        if vertex_count > buffer.vertex_count() {
            return Err(BackendError::InvalidVertexData(format!(
                "draw of {} vertices from a buffer of {}",
                vertex_count,
                buffer.vertex_count()
            )));
        }
        let matrix = program
            .uniforms
            .get(&matrix_uniform.name)
            .ok_or(BackendError::MissingMatrix(handle))?;

        // A declared color attribute with nothing uploaded falls back to shading.
        let colors = program
            .vertex
            .color_attribute()
            .and_then(|attribute| program.buffers.get(&attribute.name));
        if let Some(colors) = colors {
            if vertex_count > colors.vertex_count() {
                return Err(BackendError::InvalidVertexData(format!(
                    "draw of {} vertices with colors for {}",
                    vertex_count,
                    colors.vertex_count()
                )));
            }
        }

        let clip: Vec<Vector4<f32>> = (0..vertex_count)
            .map(|i| matrix * buffer.fetch(i))
            .collect();

        for [a, b, c] in topology.triangles(vertex_count) {
            let corners = [clip[a], clip[b], clip[c]];
            // No near-plane clipping: triangles crossing behind the eye are dropped.
            if corners.iter().any(|v| v.w < MIN_CLIP_W) {
                continue;
            }
            let ndc = corners.map(|v| Point3::new(v.x / v.w, v.y / v.w, v.z / v.w));
            let color = colors.map(|colors| {
                triangle_color([colors.fetch(a), colors.fetch(b), colors.fetch(c)])
            });
            self.renderer.render_triangle(&ndc, color);
        }
        Ok(())
    }
}
