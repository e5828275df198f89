//! `wgpu` implementation of [`crate::backend::Backend`].
//!
//! - `context` owns instance/device/surface wiring and reconfigures the
//!   swapchain when the backing size changes.
//! - `pipeline` turns a vertex/fragment module pair into a render pipeline
//!   with a single uniform bind group.
//! - `uniforms` reflects the shader's uniform block from naga IR and keeps a
//!   CPU staging copy that is written to the GPU once per draw.
//!
//! Shader stages are parsed and validated by naga before `wgpu` sees them so
//! authoring mistakes surface as diagnostics instead of device errors.

mod context;
mod pipeline;
mod uniforms;

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Result;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::backend::{Backend, ShaderStage};
use crate::compile::{naga_stage, parse_glsl};
use crate::contract::UniformKind;
use crate::error::DrawError;
use crate::viewport::PixelSize;

use context::GpuContext;
pub use pipeline::ShaderPipeline;
use pipeline::PipelineLayouts;
pub use uniforms::UniformSlot;
use uniforms::UniformBlock;

/// Compiled stage plus the uniform block it declares, if any.
pub struct WgpuShader {
    stage: ShaderStage,
    module: wgpu::ShaderModule,
    block: Option<UniformBlock>,
}

impl std::fmt::Debug for WgpuShader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuShader")
            .field("stage", &self.stage)
            .field("block", &self.block)
            .finish_non_exhaustive()
    }
}

pub struct WgpuBackend {
    context: GpuContext,
    layouts: PipelineLayouts,
    viewport: PixelSize,
}

impl WgpuBackend {
    pub fn new(window: Arc<Window>, initial_size: PixelSize) -> Result<Self> {
        let context = GpuContext::new(window, initial_size)?;
        let layouts = PipelineLayouts::new(&context.device);
        tracing::info!(adapter = %context.adapter_name, "GPU context ready");
        Ok(Self {
            context,
            layouts,
            viewport: PixelSize::new(
                initial_size.width.max(1),
                initial_size.height.max(1),
            ),
        })
    }

    /// Runs `f` inside a validation error scope and returns its value or the
    /// captured error text.
    fn scoped<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> Result<T, String> {
        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(device);
        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => Err(error.to_string()),
            None => Ok(value),
        }
    }
}

impl Backend for WgpuBackend {
    type Shader = WgpuShader;
    type Program = ShaderPipeline;
    type Buffer = wgpu::Buffer;
    type Location = UniformSlot;

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<WgpuShader, String> {
        let ir = parse_glsl(stage, source)?;
        let block = UniformBlock::reflect(&ir);
        let module = self.scoped(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match stage {
                    ShaderStage::Vertex => "shaderlab vertex",
                    ShaderStage::Fragment => "shaderlab fragment",
                }),
                source: wgpu::ShaderSource::Glsl {
                    shader: Cow::Owned(source.to_owned()),
                    stage: naga_stage(stage),
                    defines: &[],
                },
            })
        })?;
        tracing::debug!(%stage, uniforms = block.as_ref().map_or(0, |b| b.members.len()), "compiled shader stage");
        Ok(WgpuShader {
            stage,
            module,
            block,
        })
    }

    fn link_program(
        &mut self,
        vertex: &WgpuShader,
        fragment: &WgpuShader,
    ) -> Result<ShaderPipeline, String> {
        let block = fragment
            .block
            .clone()
            .or_else(|| vertex.block.clone())
            .unwrap_or_default();
        let format = self.context.format();
        let layouts = &self.layouts;
        self.scoped(|device| {
            ShaderPipeline::new(device, layouts, &vertex.module, &fragment.module, format, block)
        })
    }

    fn create_vertex_buffer(&mut self, positions: &[f32]) -> wgpu::Buffer {
        self.context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("fullscreen triangle"),
                contents: bytemuck::cast_slice(positions),
                usage: wgpu::BufferUsages::VERTEX,
            })
    }

    fn uniform_location(
        &self,
        program: &ShaderPipeline,
        name: &str,
        kind: UniformKind,
    ) -> Option<UniformSlot> {
        program.block.slot(name, kind)
    }

    fn resize(&mut self, size: PixelSize) {
        self.context.resize(size);
        self.viewport = size;
    }

    fn upload(&mut self, program: &mut ShaderPipeline, location: UniformSlot, value: &[f32]) {
        program.staging.write(location, value);
    }

    fn draw(
        &mut self,
        program: &mut ShaderPipeline,
        vertices: &wgpu::Buffer,
        vertex_count: u32,
    ) -> Result<(), DrawError> {
        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                return Err(DrawError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(DrawError::Timeout),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(DrawError::OutOfMemory),
            Err(other) => return Err(DrawError::Other(other.to_string())),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.context
            .queue
            .write_buffer(&program.uniform_buffer, 0, program.staging.as_bytes());

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_viewport(
                0.0,
                0.0,
                self.viewport.width as f32,
                self.viewport.height as f32,
                0.0,
                1.0,
            );
            render_pass.set_pipeline(&program.pipeline);
            render_pass.set_bind_group(0, &program.bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertices.slice(..));
            render_pass.draw(0..vertex_count, 0..1);
        }

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: wgpu::Buffer) {
        buffer.destroy();
    }

    fn delete_shader(&mut self, shader: WgpuShader) {
        drop(shader);
    }

    fn delete_program(&mut self, program: ShaderPipeline) {
        program.uniform_buffer.destroy();
        drop(program);
    }
}
