//! Implementation of RenderContext for GraphicsContext.

use crate::context::GraphicsContext;
use spritely_test_utils::{
    GpuBindGroup, GpuBindGroupEntry, GpuBindGroupLayout, GpuBindingResource, GpuBuffer,
    GpuRenderPipeline, GpuSampler, GpuShaderModule, GpuTexture, GpuTextureView, RenderContext,
    RenderPipelineDesc,
};
use wgpu::{
    BindGroupLayoutDescriptor, BufferDescriptor, SamplerDescriptor, ShaderModuleDescriptor,
    TextureDescriptor, TextureViewDescriptor,
};

impl RenderContext for GraphicsContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer {
        GpuBuffer::from_wgpu(self.device.create_buffer(desc))
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer.as_wgpu(), offset, data);
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture {
        GpuTexture::from_wgpu(self.device.create_texture(desc))
    }

    fn write_texture(&self, texture: &GpuTexture, data: &[u8], width: u32, height: u32) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: texture.as_wgpu(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_texture_view(
        &self,
        texture: &GpuTexture,
        desc: &TextureViewDescriptor,
    ) -> GpuTextureView {
        GpuTextureView::from_wgpu(texture.as_wgpu().create_view(desc))
    }

    fn create_sampler(&self, desc: &SamplerDescriptor) -> GpuSampler {
        GpuSampler::from_wgpu(self.device.create_sampler(desc))
    }

    fn create_shader_module(&self, desc: ShaderModuleDescriptor) -> GpuShaderModule {
        GpuShaderModule::from_wgpu(self.device.create_shader_module(desc))
    }

    fn create_render_pipeline(&self, desc: &RenderPipelineDesc) -> GpuRenderPipeline {
        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = desc
            .bind_group_layouts
            .iter()
            .map(|layout| layout.as_wgpu())
            .collect();

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: desc.label,
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: desc.label,
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: desc.shader.as_wgpu(),
                    entry_point: Some(desc.vertex_entry),
                    buffers: desc.vertex_buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: desc.shader.as_wgpu(),
                    entry_point: Some(desc.fragment_entry),
                    targets: desc.targets,
                    compilation_options: Default::default(),
                }),
                primitive: desc.primitive,
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        GpuRenderPipeline::from_wgpu(pipeline)
    }

    fn create_bind_group_layout(&self, desc: &BindGroupLayoutDescriptor) -> GpuBindGroupLayout {
        GpuBindGroupLayout::from_wgpu(self.device.create_bind_group_layout(desc))
    }

    fn create_bind_group(
        &self,
        label: Option<&str>,
        layout: &GpuBindGroupLayout,
        entries: &[GpuBindGroupEntry],
    ) -> GpuBindGroup {
        let entries: Vec<wgpu::BindGroupEntry> = entries
            .iter()
            .map(|entry| wgpu::BindGroupEntry {
                binding: entry.binding,
                resource: match entry.resource {
                    GpuBindingResource::Buffer(buffer) => buffer.as_wgpu().as_entire_binding(),
                    GpuBindingResource::TextureView(view) => {
                        wgpu::BindingResource::TextureView(view.as_wgpu())
                    }
                    GpuBindingResource::Sampler(sampler) => {
                        wgpu::BindingResource::Sampler(sampler.as_wgpu())
                    }
                },
            })
            .collect();

        GpuBindGroup::from_wgpu(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label,
            layout: layout.as_wgpu(),
            entries: &entries,
        }))
    }

    fn begin_validation_scope(&self) {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
    }

    fn end_validation_scope(&self) -> Option<String> {
        pollster::block_on(self.device.pop_error_scope()).map(|e| e.to_string())
    }
}
