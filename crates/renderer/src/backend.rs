use std::fmt;

use crate::contract::UniformKind;
use crate::error::DrawError;
use crate::viewport::PixelSize;

/// Programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// GPU operations the engine needs, in the order it needs them.
///
/// Resource handles are owned by the caller and handed back for deletion;
/// a backend never frees a handle on its own.
pub trait Backend {
    type Shader: fmt::Debug;
    type Program: fmt::Debug;
    type Buffer: fmt::Debug;
    type Location: Copy + fmt::Debug;

    /// Compiles one stage. The error carries the native diagnostic text.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String>;

    fn link_program(
        &mut self,
        vertex: &Self::Shader,
        fragment: &Self::Shader,
    ) -> Result<Self::Program, String>;

    /// Uploads static `vec2` vertex positions.
    fn create_vertex_buffer(&mut self, positions: &[f32]) -> Self::Buffer;

    /// Location of `name` in the linked program, if it exists with `kind`.
    fn uniform_location(
        &self,
        program: &Self::Program,
        name: &str,
        kind: UniformKind,
    ) -> Option<Self::Location>;

    /// Reallocates the backing buffer and sets the viewport to cover it.
    fn resize(&mut self, size: PixelSize);

    /// Stages `value` for the next draw of `program`.
    fn upload(&mut self, program: &mut Self::Program, location: Self::Location, value: &[f32]);

    fn draw(
        &mut self,
        program: &mut Self::Program,
        vertices: &Self::Buffer,
        vertex_count: u32,
    ) -> Result<(), DrawError>;

    fn delete_buffer(&mut self, buffer: Self::Buffer);
    fn delete_shader(&mut self, shader: Self::Shader);
    fn delete_program(&mut self, program: Self::Program);
}
