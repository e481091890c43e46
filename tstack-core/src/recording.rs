/// Backend that records calls instead of drawing
use std::collections::HashMap;

use nalgebra::Matrix4;

use crate::backend::{
    BackendError, BufferHandle, PrimitiveTopology, ProgramHandle, ProgramSource, RendererBackend,
};

/// One submitted draw, with the most recently set matrix uniform of its program
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub program: ProgramHandle,
    pub topology: PrimitiveTopology,
    pub vertex_count: usize,
    pub matrix: Option<Matrix4<f32>>,
}

/// Headless backend for tests and dry runs.
///
/// Accepts any non-empty program source and remembers every uniform set and
/// draw submitted.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    programs: Vec<ProgramSource>,
    buffers: Vec<(ProgramHandle, String, usize)>,
    uniforms: HashMap<(ProgramHandle, String), Matrix4<f32>>,
    last_matrix: HashMap<ProgramHandle, Matrix4<f32>>,
    draws: Vec<RecordedDraw>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub fn uniform(&self, program: ProgramHandle, name: &str) -> Option<&Matrix4<f32>> {
        self.uniforms.get(&(program, name.to_string()))
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }

    fn check_program(&self, program: ProgramHandle) -> Result<(), BackendError> {
        if (program.0 as usize) < self.programs.len() {
            Ok(())
        } else {
            Err(BackendError::UnknownProgram(program))
        }
    }
}

impl RendererBackend for RecordingBackend {
    fn compile_shader_program(&mut self, source: &ProgramSource) -> Result<ProgramHandle, BackendError> {
        if source.vertex.trim().is_empty() {
            return Err(BackendError::ShaderCompile("empty vertex shader".to_string()));
        }
        if source.fragment.trim().is_empty() {
            return Err(BackendError::ShaderCompile("empty fragment shader".to_string()));
        }
        self.programs.push(source.clone());
        Ok(ProgramHandle(self.programs.len() as u32 - 1))
    }

    fn upload_vertex_data(
        &mut self,
        program: ProgramHandle,
        attribute: &str,
        data: &[f32],
        components_per_vertex: usize,
    ) -> Result<BufferHandle, BackendError> {
        self.check_program(program)?;
        if components_per_vertex == 0 || data.len() % components_per_vertex != 0 {
            return Err(BackendError::InvalidVertexData(format!(
                "{} floats do not split into {}-component vertices",
                data.len(),
                components_per_vertex
            )));
        }
        self.buffers
            .push((program, attribute.to_string(), data.len() / components_per_vertex));
        Ok(BufferHandle(self.buffers.len() as u32 - 1))
    }

    fn set_uniform_matrix(
        &mut self,
        program: ProgramHandle,
        uniform: &str,
        matrix: &Matrix4<f32>,
    ) -> Result<(), BackendError> {
        self.check_program(program)?;
        self.uniforms.insert((program, uniform.to_string()), *matrix);
        self.last_matrix.insert(program, *matrix);
        Ok(())
    }

    fn submit_draw(
        &mut self,
        program: ProgramHandle,
        topology: PrimitiveTopology,
        vertex_count: usize,
    ) -> Result<(), BackendError> {
        self.check_program(program)?;
        let matrix = self.last_matrix.get(&program).copied();
        self.draws.push(RecordedDraw {
            program,
            topology,
            vertex_count,
            matrix,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_draw_with_bound_matrix() {
        let mut backend = RecordingBackend::new();
        let program = backend
            .compile_shader_program(&ProgramSource::new("vs", "fs"))
            .unwrap();
        let matrix = Matrix4::new_scaling(2.0);
        backend.set_uniform_matrix(program, "vMatrix", &matrix).unwrap();
        backend
            .submit_draw(program, PrimitiveTopology::Triangles, 36)
            .unwrap();

        assert_eq!(backend.draws().len(), 1);
        assert_eq!(backend.draws()[0].matrix, Some(matrix));
        assert_eq!(backend.uniform(program, "vMatrix"), Some(&matrix));
    }

    #[test]
    fn test_rejects_unknown_program_and_bad_data() {
        let mut backend = RecordingBackend::new();
        assert_eq!(
            backend.submit_draw(ProgramHandle(3), PrimitiveTopology::Triangles, 3),
            Err(BackendError::UnknownProgram(ProgramHandle(3)))
        );

        let program = backend
            .compile_shader_program(&ProgramSource::new("vs", "fs"))
            .unwrap();
        assert!(matches!(
            backend.upload_vertex_data(program, "vPosition", &[0.0; 5], 3),
            Err(BackendError::InvalidVertexData(_))
        ));
        assert!(backend
            .upload_vertex_data(program, "vPosition", &[0.0; 9], 3)
            .is_ok());
        assert_eq!(backend.buffer_count(), 1);
    }

    #[test]
    fn test_empty_source_fails_to_compile() {
        let mut backend = RecordingBackend::new();
        assert!(matches!(
            backend.compile_shader_program(&ProgramSource::new("  ", "fs")),
            Err(BackendError::ShaderCompile(_))
        ));
    }
}
