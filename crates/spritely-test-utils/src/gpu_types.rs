//! GPU resource wrappers that can be real or mock.
//!
//! The renderer only ever sees these types, so the same code path runs
//! against a real device and against [`MockRenderContext`](crate::MockRenderContext).

/// Wrapper around a GPU buffer that can be real or mock.
///
/// Holds the buffer size alongside the handle so callers can bind the whole
/// buffer without asking the device.
#[derive(Clone, Debug)]
pub struct GpuBuffer {
    inner: GpuBufferInner,
}

#[derive(Clone, Debug)]
enum GpuBufferInner {
    Real(wgpu::Buffer),
    #[cfg(feature = "mock")]
    Mock { id: usize, size: u64 },
}

impl GpuBuffer {
    pub fn from_wgpu(buffer: wgpu::Buffer) -> Self {
        Self {
            inner: GpuBufferInner::Real(buffer),
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(id: usize, size: u64) -> Self {
        Self {
            inner: GpuBufferInner::Mock { id, size },
        }
    }

    /// Size of the buffer in bytes.
    pub fn size(&self) -> u64 {
        match &self.inner {
            GpuBufferInner::Real(buffer) => buffer.size(),
            #[cfg(feature = "mock")]
            GpuBufferInner::Mock { size, .. } => *size,
        }
    }

    /// Get the underlying `wgpu::Buffer`.
    ///
    /// # Panics
    /// Panics if this is a mock buffer.
    pub fn as_wgpu(&self) -> &wgpu::Buffer {
        match &self.inner {
            GpuBufferInner::Real(buffer) => buffer,
            #[cfg(feature = "mock")]
            GpuBufferInner::Mock { .. } => {
                panic!("Attempted to get wgpu::Buffer from mock buffer - this is a test-only buffer")
            }
        }
    }

    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuBufferInner::Mock { .. })
    }

    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        match &self.inner {
            GpuBufferInner::Mock { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Wrapper around a GPU texture that can be real or mock.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    inner: GpuTextureInner,
}

#[derive(Clone, Debug)]
enum GpuTextureInner {
    Real(wgpu::Texture),
    #[cfg(feature = "mock")]
    Mock {
        id: usize,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    },
}

impl GpuTexture {
    pub fn from_wgpu(texture: wgpu::Texture) -> Self {
        Self {
            inner: GpuTextureInner::Real(texture),
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(id: usize, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            inner: GpuTextureInner::Mock {
                id,
                width,
                height,
                format,
            },
        }
    }

    /// Pixel dimensions as `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        match &self.inner {
            GpuTextureInner::Real(texture) => (texture.width(), texture.height()),
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { width, height, .. } => (*width, *height),
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match &self.inner {
            GpuTextureInner::Real(texture) => texture.format(),
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { format, .. } => *format,
        }
    }

    /// Get the underlying `wgpu::Texture`.
    ///
    /// # Panics
    /// Panics if this is a mock texture.
    pub fn as_wgpu(&self) -> &wgpu::Texture {
        match &self.inner {
            GpuTextureInner::Real(texture) => texture,
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { .. } => {
                panic!("Attempted to get wgpu::Texture from mock texture")
            }
        }
    }

    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuTextureInner::Mock { .. })
    }

    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        match &self.inner {
            GpuTextureInner::Mock { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Declares an id-only wrapper for handles that carry no extra metadata.
macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident, $inner:ident, $wgpu:ty) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            inner: $inner,
        }

        #[derive(Clone, Debug)]
        enum $inner {
            Real($wgpu),
            #[cfg(feature = "mock")]
            Mock { id: usize },
        }

        impl $name {
            pub fn from_wgpu(handle: $wgpu) -> Self {
                Self {
                    inner: $inner::Real(handle),
                }
            }

            #[cfg(feature = "mock")]
            pub fn mock(id: usize) -> Self {
                Self {
                    inner: $inner::Mock { id },
                }
            }

            /// # Panics
            /// Panics if this is a mock handle.
            pub fn as_wgpu(&self) -> &$wgpu {
                match &self.inner {
                    $inner::Real(handle) => handle,
                    #[cfg(feature = "mock")]
                    $inner::Mock { .. } => {
                        panic!(concat!("Attempted to get wgpu handle from mock ", stringify!($name)))
                    }
                }
            }

            #[cfg(feature = "mock")]
            pub fn is_mock(&self) -> bool {
                matches!(self.inner, $inner::Mock { .. })
            }

            #[cfg(feature = "mock")]
            pub fn mock_id(&self) -> Option<usize> {
                match &self.inner {
                    $inner::Mock { id } => Some(*id),
                    _ => None,
                }
            }
        }
    };
}

gpu_handle!(
    /// Wrapper around a texture view that can be real or mock.
    GpuTextureView,
    GpuTextureViewInner,
    wgpu::TextureView
);
gpu_handle!(
    /// Wrapper around a shader module that can be real or mock.
    GpuShaderModule,
    GpuShaderModuleInner,
    wgpu::ShaderModule
);
gpu_handle!(
    /// Wrapper around a render pipeline that can be real or mock.
    GpuRenderPipeline,
    GpuRenderPipelineInner,
    wgpu::RenderPipeline
);
gpu_handle!(
    /// Wrapper around a bind group layout that can be real or mock.
    GpuBindGroupLayout,
    GpuBindGroupLayoutInner,
    wgpu::BindGroupLayout
);
gpu_handle!(
    /// Wrapper around a bind group that can be real or mock.
    GpuBindGroup,
    GpuBindGroupInner,
    wgpu::BindGroup
);
gpu_handle!(
    /// Wrapper around a sampler that can be real or mock.
    GpuSampler,
    GpuSamplerInner,
    wgpu::Sampler
);
