//! Trait abstracting draw recording inside a render pass.

use crate::gpu_types::*;
use std::ops::Range;

/// The subset of render pass commands the sprite renderer records.
///
/// Implemented for `wgpu::RenderPass` and, with the `mock` feature, for
/// [`MockRenderPass`](crate::MockRenderPass).
pub trait RenderPassEncoder {
    fn set_pipeline(&mut self, pipeline: &GpuRenderPipeline);

    fn set_bind_group(&mut self, index: u32, bind_group: &GpuBindGroup);

    /// Bind the whole buffer to a vertex slot.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer);

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);

    fn push_debug_group(&mut self, label: &str);

    fn pop_debug_group(&mut self);
}

impl RenderPassEncoder for wgpu::RenderPass<'_> {
    fn set_pipeline(&mut self, pipeline: &GpuRenderPipeline) {
        wgpu::RenderPass::set_pipeline(self, pipeline.as_wgpu());
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &GpuBindGroup) {
        wgpu::RenderPass::set_bind_group(self, index, bind_group.as_wgpu(), &[]);
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer) {
        wgpu::RenderPass::set_vertex_buffer(self, slot, buffer.as_wgpu().slice(..));
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        wgpu::RenderPass::draw(self, vertices, instances);
    }

    fn push_debug_group(&mut self, label: &str) {
        wgpu::RenderPass::push_debug_group(self, label);
    }

    fn pop_debug_group(&mut self) {
        wgpu::RenderPass::pop_debug_group(self);
    }
}
