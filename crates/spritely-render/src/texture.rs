use crate::GraphicsError;
use spritely_core::geometry::Size;
use spritely_test_utils::{GpuTexture, GpuTextureView, RenderContext};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique texture identity. Runs split wherever this changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TextureId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        TextureId(raw)
    }
}

/// How texture coordinates outside `0..=1` are resolved.
///
/// Chosen per sprite: repeating sprites sample with `Repeat`, the rest with
/// `ClampToEdge`. Runs split where it changes, so one texture can be tiled
/// and clamped in the same frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
}

impl WrapMode {
    pub fn address_mode(self) -> wgpu::AddressMode {
        match self {
            WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
        }
    }
}

/// A sampled texture shared between sprites.
///
/// Sprites hold `Weak<Texture>`; whoever created the texture owns it.
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    gpu: GpuTexture,
    view: GpuTextureView,
    width: u32,
    height: u32,
}

impl Texture {
    /// Upload tightly packed sRGB RGBA8 pixels.
    pub fn from_rgba(
        context: &dyn RenderContext,
        label: Option<&str>,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<Self, GraphicsError> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::ZeroSizedTexture);
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(GraphicsError::InvalidTextureData {
                expected,
                actual: data.len(),
            });
        }

        let gpu = context.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        context.write_texture(&gpu, data, width, height);

        Ok(Self::from_gpu(context, gpu))
    }

    /// 1x1 opaque white, bound for untextured runs.
    pub fn white(context: &dyn RenderContext) -> Self {
        let gpu = context.create_texture(&wgpu::TextureDescriptor {
            label: Some("White Texture"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        context.write_texture(&gpu, &[255; 4], 1, 1);
        Self::from_gpu(context, gpu)
    }

    /// Wrap a texture created elsewhere, e.g. an offscreen render target.
    pub fn from_gpu(context: &dyn RenderContext, gpu: GpuTexture) -> Self {
        let view = context.create_texture_view(&gpu, &wgpu::TextureViewDescriptor::default());
        let (width, height) = gpu.size();
        Self {
            id: TextureId::next(),
            gpu,
            view,
            width,
            height,
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn gpu(&self) -> &GpuTexture {
        &self.gpu
    }

    pub fn view(&self) -> &GpuTextureView {
        &self.view
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size<f32> {
        Size::new(self.width as f32, self.height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spritely_test_utils::MockRenderContext;

    #[test]
    fn test_from_rgba_validates_length() {
        let ctx = MockRenderContext::new();
        let err = Texture::from_rgba(&ctx, None, 2, 2, &[0; 12]).unwrap_err();
        assert_eq!(
            err,
            GraphicsError::InvalidTextureData {
                expected: 16,
                actual: 12
            }
        );
        assert_eq!(ctx.count_texture_creates(), 0);
    }

    #[test]
    fn test_from_rgba_rejects_zero_size() {
        let ctx = MockRenderContext::new();
        let err = Texture::from_rgba(&ctx, None, 0, 4, &[]).unwrap_err();
        assert_eq!(err, GraphicsError::ZeroSizedTexture);
    }

    #[test]
    fn test_ids_are_unique() {
        let ctx = MockRenderContext::new();
        let a = Texture::white(&ctx);
        let b = Texture::white(&ctx);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.size(), Size::new(1.0, 1.0));
    }

    #[test]
    fn test_wrap_mode_address_modes() {
        let ctx = MockRenderContext::new();
        let texture = Texture::from_rgba(&ctx, Some("tiles"), 2, 1, &[0; 8]).unwrap();
        assert_eq!(texture.size(), Size::new(2.0, 1.0));

        assert_eq!(WrapMode::default(), WrapMode::ClampToEdge);
        assert_eq!(WrapMode::Repeat.address_mode(), wgpu::AddressMode::Repeat);
        assert_eq!(
            WrapMode::ClampToEdge.address_mode(),
            wgpu::AddressMode::ClampToEdge
        );
    }
}
