//! Shader pipeline, uniforms and texture bindings for sprite batches.

use crate::batch::SpriteBatchDescriptor;
use crate::texture::{Texture, TextureId, WrapMode};
use crate::vertex::SpriteVertex;
use crate::GraphicsError;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use spritely_core::collections::HashMap;
use spritely_test_utils::{
    GpuBindGroup, GpuBindGroupEntry, GpuBindGroupLayout, GpuBindingResource, GpuBuffer,
    GpuRenderPipeline, GpuSampler, RenderContext, RenderPassEncoder, RenderPipelineDesc,
};
use std::ops::{Deref, DerefMut};
use std::rc::{Rc, Weak};
use std::sync::Arc;

pub const SPRITE_SHADER: &str = include_str!("shaders/sprite.wgsl");

/// Bind group slot of the uniform buffer.
pub const UNIFORM_GROUP: u32 = 0;
/// Bind group slot of the per-run texture and sampler.
pub const TEXTURE_GROUP: u32 = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpriteUniform {
    pub mvp: [[f32; 4]; 4],
}

struct CachedBindGroup {
    texture: Weak<Texture>,
    group: GpuBindGroup,
}

/// Compiled pipeline plus the bindings it draws with.
///
/// Created once per [`reset`](crate::SpriteBatch::reset). Texture bind
/// groups are cached per texture and wrap mode and dropped once their
/// texture dies.
pub struct SpritePipeline {
    context: Arc<dyn RenderContext>,
    pipeline: GpuRenderPipeline,
    uniform_buffer: GpuBuffer,
    uniform_bind_group: GpuBindGroup,
    texture_layout: GpuBindGroupLayout,
    clamp_sampler: GpuSampler,
    repeat_sampler: GpuSampler,
    white: Rc<Texture>,
    bind_groups: HashMap<(TextureId, WrapMode), CachedBindGroup>,
}

impl SpritePipeline {
    pub fn new(
        context: Arc<dyn RenderContext>,
        descriptor: &SpriteBatchDescriptor,
    ) -> Result<Self, GraphicsError> {
        let shader_label = format!("{} Shader", descriptor.label);
        let pipeline_label = format!("{} Pipeline", descriptor.label);

        context.begin_validation_scope();

        let shader = context.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&shader_label),
            source: wgpu::ShaderSource::Wgsl(SPRITE_SHADER.into()),
        });

        let uniform_layout = context.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = context.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline = context.create_render_pipeline(&RenderPipelineDesc {
            label: Some(&pipeline_label),
            shader: &shader,
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            vertex_buffers: &[SpriteVertex::layout()],
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Cw,
                cull_mode: None,
                ..Default::default()
            },
            targets: &[Some(wgpu::ColorTargetState {
                format: descriptor.target_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        });

        if let Some(message) = context.end_validation_scope() {
            tracing::error!("{} failed validation: {}", pipeline_label, message);
            return Err(GraphicsError::ShaderCompilation {
                label: shader_label,
                message,
            });
        }

        let uniform_buffer = context.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sprite Uniform Buffer"),
            size: size_of::<SpriteUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = context.create_bind_group(
            Some("Sprite Uniform Bind Group"),
            &uniform_layout,
            &[GpuBindGroupEntry {
                binding: 0,
                resource: GpuBindingResource::Buffer(&uniform_buffer),
            }],
        );

        let sampler = |label, wrap: WrapMode| {
            let mode = wrap.address_mode();
            context.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: mode,
                address_mode_v: mode,
                address_mode_w: mode,
                mag_filter: descriptor.filter,
                min_filter: descriptor.filter,
                ..Default::default()
            })
        };
        let clamp_sampler = sampler("Sprite Clamp Sampler", WrapMode::ClampToEdge);
        let repeat_sampler = sampler("Sprite Repeat Sampler", WrapMode::Repeat);

        let white = Rc::new(Texture::white(context.as_ref()));

        tracing::info!("Created {}", pipeline_label);

        Ok(Self {
            context,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            clamp_sampler,
            repeat_sampler,
            white,
            bind_groups: HashMap::new(),
        })
    }

    pub fn uniform_buffer(&self) -> &GpuBuffer {
        &self.uniform_buffer
    }

    /// Texture bound for untextured runs.
    pub fn white_texture(&self) -> &Rc<Texture> {
        &self.white
    }

    pub fn write_uniform(&self, mvp: Mat4) {
        let uniform = SpriteUniform {
            mvp: mvp.to_cols_array_2d(),
        };
        self.context
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Bind pipeline, uniforms and the vertex buffer.
    pub fn bind(&self, pass: &mut dyn RenderPassEncoder, vertex_buffer: &GpuBuffer) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(UNIFORM_GROUP, &self.uniform_bind_group);
        pass.set_vertex_buffer(0, vertex_buffer);
    }

    /// Bind group sampling `texture` (white when `None`) with `wrap`.
    pub fn texture_bind_group(
        &mut self,
        texture: Option<&Rc<Texture>>,
        wrap: WrapMode,
    ) -> GpuBindGroup {
        let texture = texture.unwrap_or(&self.white);
        let key = (texture.id(), wrap);

        if let Some(cached) = self.bind_groups.get(&key) {
            return cached.group.clone();
        }

        let sampler = match key.1 {
            WrapMode::ClampToEdge => &self.clamp_sampler,
            WrapMode::Repeat => &self.repeat_sampler,
        };
        let group = self.context.create_bind_group(
            Some("Sprite Texture Bind Group"),
            &self.texture_layout,
            &[
                GpuBindGroupEntry {
                    binding: 0,
                    resource: GpuBindingResource::TextureView(texture.view()),
                },
                GpuBindGroupEntry {
                    binding: 1,
                    resource: GpuBindingResource::Sampler(sampler),
                },
            ],
        );

        tracing::trace!(texture = ?key.0, wrap = ?key.1, "cached texture bind group");
        self.bind_groups.insert(
            key,
            CachedBindGroup {
                texture: Rc::downgrade(texture),
                group: group.clone(),
            },
        );
        group
    }

    /// Drop bind groups whose texture no longer exists. Returns how many.
    pub fn purge_dead_bind_groups(&mut self) -> usize {
        let before = self.bind_groups.len();
        self.bind_groups
            .retain(|_, cached| cached.texture.strong_count() > 0);
        before - self.bind_groups.len()
    }

    pub fn cached_bind_groups(&self) -> usize {
        self.bind_groups.len()
    }
}

/// Debug group held open for the lifetime of the guard.
///
/// Commands recorded through the guard land inside the group. Dropping the
/// guard pops it on every exit path.
pub struct BindingScope<'p> {
    pass: &'p mut dyn RenderPassEncoder,
}

impl<'p> BindingScope<'p> {
    pub fn new(pass: &'p mut dyn RenderPassEncoder, label: &str) -> Self {
        pass.push_debug_group(label);
        Self { pass }
    }
}

impl<'p> Deref for BindingScope<'p> {
    type Target = dyn RenderPassEncoder + 'p;

    fn deref(&self) -> &Self::Target {
        &*self.pass
    }
}

impl<'p> DerefMut for BindingScope<'p> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.pass
    }
}

impl Drop for BindingScope<'_> {
    fn drop(&mut self) {
        self.pass.pop_debug_group();
    }
}
