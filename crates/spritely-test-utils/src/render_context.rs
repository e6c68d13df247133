//! Trait abstracting GPU resource creation and uploads.

use crate::gpu_types::*;
use wgpu::{
    BindGroupLayoutDescriptor, BufferDescriptor, ColorTargetState, PrimitiveState,
    SamplerDescriptor, ShaderModuleDescriptor, TextureDescriptor, TextureViewDescriptor,
    VertexBufferLayout,
};

/// A resource bound into a bind group slot.
#[derive(Clone, Copy, Debug)]
pub enum GpuBindingResource<'a> {
    /// The whole buffer.
    Buffer(&'a GpuBuffer),
    TextureView(&'a GpuTextureView),
    Sampler(&'a GpuSampler),
}

/// One entry of a bind group built from wrapper types.
#[derive(Clone, Copy, Debug)]
pub struct GpuBindGroupEntry<'a> {
    pub binding: u32,
    pub resource: GpuBindingResource<'a>,
}

/// Render pipeline description that references wrapper types instead of
/// `wgpu` handles, so it can be fulfilled by a mock.
///
/// Depth, stencil and multisampling are left at their defaults.
#[derive(Clone, Debug)]
pub struct RenderPipelineDesc<'a> {
    pub label: Option<&'a str>,
    pub shader: &'a GpuShaderModule,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub bind_group_layouts: &'a [&'a GpuBindGroupLayout],
    pub vertex_buffers: &'a [VertexBufferLayout<'a>],
    pub primitive: PrimitiveState,
    pub targets: &'a [Option<ColorTargetState>],
}

/// Trait abstracting GPU resource creation and operations.
///
/// Methods take `&self` and return owned wrapper types, so a context can be
/// shared behind an `Arc<dyn RenderContext>` and mocks can record calls
/// through interior mutability.
///
/// Resource creation never fails synchronously. Validation errors are
/// collected between [`begin_validation_scope`](Self::begin_validation_scope)
/// and [`end_validation_scope`](Self::end_validation_scope).
pub trait RenderContext: Send + Sync {
    // Buffer operations

    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer;

    /// Write data to a buffer.
    ///
    /// For real buffers this maps to `queue.write_buffer()`.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]);

    // Texture operations

    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture;

    /// Upload tightly packed RGBA8 pixels covering the whole first mip level.
    fn write_texture(&self, texture: &GpuTexture, data: &[u8], width: u32, height: u32);

    fn create_texture_view(
        &self,
        texture: &GpuTexture,
        desc: &TextureViewDescriptor,
    ) -> GpuTextureView;

    fn create_sampler(&self, desc: &SamplerDescriptor) -> GpuSampler;

    // Shader and pipeline operations

    fn create_shader_module(&self, desc: ShaderModuleDescriptor) -> GpuShaderModule;

    fn create_render_pipeline(&self, desc: &RenderPipelineDesc) -> GpuRenderPipeline;

    // Bind group operations

    fn create_bind_group_layout(&self, desc: &BindGroupLayoutDescriptor) -> GpuBindGroupLayout;

    fn create_bind_group(
        &self,
        label: Option<&str>,
        layout: &GpuBindGroupLayout,
        entries: &[GpuBindGroupEntry],
    ) -> GpuBindGroup;

    // Validation

    /// Start capturing validation errors.
    fn begin_validation_scope(&self);

    /// Stop capturing and return the first validation error, if any.
    fn end_validation_scope(&self) -> Option<String>;
}
