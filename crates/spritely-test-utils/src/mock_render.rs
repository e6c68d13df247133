//! Mock implementation of RenderContext for testing.
//!
//! Records operations and keeps the last bytes written to each buffer,
//! without touching a GPU.

use crate::{
    gpu_types::*,
    render_context::{GpuBindGroupEntry, RenderContext, RenderPipelineDesc},
};
use parking_lot::Mutex;
use wgpu::*;

/// Records a GPU operation call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    CreateBuffer {
        id: usize,
        size: u64,
        usage: BufferUsages,
    },
    WriteBuffer {
        buffer_id: usize,
        offset: u64,
        size: usize,
    },
    CreateTexture {
        id: usize,
        width: u32,
        height: u32,
        format: TextureFormat,
    },
    WriteTexture {
        texture_id: usize,
        size: usize,
    },
    CreateTextureView {
        texture_id: usize,
    },
    CreateSampler {
        label: Option<String>,
        address_mode: AddressMode,
    },
    CreateShaderModule {
        label: Option<String>,
    },
    CreateRenderPipeline {
        label: Option<String>,
    },
    CreateBindGroupLayout {
        label: Option<String>,
    },
    CreateBindGroup {
        label: Option<String>,
        entries: usize,
    },
}

#[derive(Debug, Clone)]
struct MockBuffer {
    size: u64,
    contents: Vec<u8>,
}

/// Mock implementation of RenderContext for testing.
///
/// Uses `parking_lot::Mutex` for interior mutability so the context stays
/// `Send + Sync` and can sit behind `Arc<dyn RenderContext>`.
///
/// # Example
///
/// ```rust
/// use spritely_test_utils::{MockRenderContext, RenderContext};
/// use wgpu::*;
///
/// let mock = MockRenderContext::new();
/// let buffer = mock.create_buffer(&BufferDescriptor {
///     label: None,
///     size: 8,
///     usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
///     mapped_at_creation: false,
/// });
/// mock.write_buffer(&buffer, 0, &[1, 2, 3, 4]);
///
/// assert_eq!(mock.buffer_contents(&buffer).unwrap()[..4], [1, 2, 3, 4]);
/// ```
pub struct MockRenderContext {
    calls: Mutex<Vec<RenderCall>>,
    buffers: Mutex<Vec<MockBuffer>>,
    next_texture_id: Mutex<usize>,
    next_handle_id: Mutex<usize>,
    validation_error: Mutex<Option<String>>,
    open_scopes: Mutex<usize>,
}

impl MockRenderContext {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            buffers: Mutex::new(Vec::new()),
            next_texture_id: Mutex::new(0),
            next_handle_id: Mutex::new(0),
            validation_error: Mutex::new(None),
            open_scopes: Mutex::new(0),
        }
    }

    /// Make every following validation scope report `message`.
    ///
    /// Pass `None` to make scopes succeed again.
    pub fn set_validation_error(&self, message: Option<&str>) {
        *self.validation_error.lock() = message.map(str::to_string);
    }

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    /// Bytes last written to a buffer, zero-filled where never written.
    pub fn buffer_contents(&self, buffer: &GpuBuffer) -> Option<Vec<u8>> {
        let id = buffer.mock_id()?;
        self.buffers.lock().get(id).map(|b| b.contents.clone())
    }

    fn count(&self, pred: impl Fn(&RenderCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| pred(call)).count()
    }

    pub fn count_buffer_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateBuffer { .. }))
    }

    pub fn count_buffer_writes(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::WriteBuffer { .. }))
    }

    pub fn count_texture_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateTexture { .. }))
    }

    pub fn count_shader_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateShaderModule { .. }))
    }

    pub fn count_render_pipeline_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateRenderPipeline { .. }))
    }

    pub fn count_bind_group_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateBindGroup { .. }))
    }

    /// Buffer writes that targeted `buffer`.
    pub fn writes_to(&self, buffer: &GpuBuffer) -> Vec<RenderCall> {
        let Some(id) = buffer.mock_id() else {
            return Vec::new();
        };
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, RenderCall::WriteBuffer { buffer_id, .. } if *buffer_id == id))
            .cloned()
            .collect()
    }

    /// Number of validation scopes begun but not yet ended.
    pub fn open_validation_scopes(&self) -> usize {
        *self.open_scopes.lock()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn next_handle(&self) -> usize {
        let mut id = self.next_handle_id.lock();
        let handle = *id;
        *id += 1;
        handle
    }
}

impl Default for MockRenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext for MockRenderContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer {
        let mut buffers = self.buffers.lock();
        let id = buffers.len();

        buffers.push(MockBuffer {
            size: desc.size,
            contents: vec![0; desc.size as usize],
        });

        self.calls.lock().push(RenderCall::CreateBuffer {
            id,
            size: desc.size,
            usage: desc.usage,
        });

        GpuBuffer::mock(id, desc.size)
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        let Some(buffer_id) = buffer.mock_id() else {
            return;
        };

        if let Some(mock) = self.buffers.lock().get_mut(buffer_id) {
            let start = offset as usize;
            let end = start + data.len();
            assert!(
                end as u64 <= mock.size,
                "write of {} bytes at offset {} overflows mock buffer {} of size {}",
                data.len(),
                offset,
                buffer_id,
                mock.size
            );
            mock.contents[start..end].copy_from_slice(data);
        }

        self.calls.lock().push(RenderCall::WriteBuffer {
            buffer_id,
            offset,
            size: data.len(),
        });
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture {
        let mut next = self.next_texture_id.lock();
        let id = *next;
        *next += 1;

        self.calls.lock().push(RenderCall::CreateTexture {
            id,
            width: desc.size.width,
            height: desc.size.height,
            format: desc.format,
        });

        GpuTexture::mock(id, desc.size.width, desc.size.height, desc.format)
    }

    fn write_texture(&self, texture: &GpuTexture, data: &[u8], _width: u32, _height: u32) {
        if let Some(texture_id) = texture.mock_id() {
            self.calls.lock().push(RenderCall::WriteTexture {
                texture_id,
                size: data.len(),
            });
        }
    }

    fn create_texture_view(
        &self,
        texture: &GpuTexture,
        _desc: &TextureViewDescriptor,
    ) -> GpuTextureView {
        self.calls.lock().push(RenderCall::CreateTextureView {
            texture_id: texture.mock_id().unwrap_or(usize::MAX),
        });
        GpuTextureView::mock(self.next_handle())
    }

    fn create_sampler(&self, desc: &SamplerDescriptor) -> GpuSampler {
        self.calls.lock().push(RenderCall::CreateSampler {
            label: desc.label.map(|s| s.to_string()),
            address_mode: desc.address_mode_u,
        });
        GpuSampler::mock(self.next_handle())
    }

    fn create_shader_module(&self, desc: ShaderModuleDescriptor) -> GpuShaderModule {
        self.calls.lock().push(RenderCall::CreateShaderModule {
            label: desc.label.map(|s| s.to_string()),
        });
        GpuShaderModule::mock(self.next_handle())
    }

    fn create_render_pipeline(&self, desc: &RenderPipelineDesc) -> GpuRenderPipeline {
        self.calls.lock().push(RenderCall::CreateRenderPipeline {
            label: desc.label.map(|s| s.to_string()),
        });
        GpuRenderPipeline::mock(self.next_handle())
    }

    fn create_bind_group_layout(&self, desc: &BindGroupLayoutDescriptor) -> GpuBindGroupLayout {
        self.calls.lock().push(RenderCall::CreateBindGroupLayout {
            label: desc.label.map(|s| s.to_string()),
        });
        GpuBindGroupLayout::mock(self.next_handle())
    }

    fn create_bind_group(
        &self,
        label: Option<&str>,
        _layout: &GpuBindGroupLayout,
        entries: &[GpuBindGroupEntry],
    ) -> GpuBindGroup {
        self.calls.lock().push(RenderCall::CreateBindGroup {
            label: label.map(|s| s.to_string()),
            entries: entries.len(),
        });
        GpuBindGroup::mock(self.next_handle())
    }

    fn begin_validation_scope(&self) {
        *self.open_scopes.lock() += 1;
    }

    fn end_validation_scope(&self) -> Option<String> {
        let mut open = self.open_scopes.lock();
        *open = open.saturating_sub(1);
        self.validation_error.lock().clone()
    }
}
