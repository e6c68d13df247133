use crate::GraphicsError;
use std::sync::Arc;

/// A shared graphics context.
///
/// ```rust,no_run
/// use spritely_render::GraphicsContext;
///
/// let ctx = GraphicsContext::new_owned_sync().expect("no GPU");
/// let ctx2 = ctx.clone(); // Cheap clone (Arc)
/// ```
pub struct GraphicsContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GraphicsContext {
    pub async fn new_owned() -> Result<Arc<Self>, GraphicsError> {
        Self::new_owned_with_descriptor(GraphicsContextDescriptor::default()).await
    }

    /// Blocks the current thread until the context is created.
    pub fn new_owned_sync() -> Result<Arc<Self>, GraphicsError> {
        pollster::block_on(Self::new_owned())
    }

    pub async fn new_owned_with_descriptor(
        descriptor: GraphicsContextDescriptor,
    ) -> Result<Arc<Self>, GraphicsError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: descriptor.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: descriptor.power_preference,
                compatible_surface: None,
                force_fallback_adapter: descriptor.force_fallback_adapter,
            })
            .await
            .map_err(|e| {
                tracing::warn!("Adapter request failed: {}", e);
                GraphicsError::NoAdapter
            })?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                label: descriptor.label,
                ..Default::default()
            })
            .await
            .map_err(|e| GraphicsError::DeviceRequest(e.to_string()))?;

        tracing::info!("Created graphics context on {}", adapter.get_info().name);

        Ok(Arc::new(Self {
            instance,
            adapter,
            device,
            queue,
        }))
    }

    pub fn info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }
}

/// Descriptor for configuring graphics context creation.
#[derive(Debug, Clone)]
pub struct GraphicsContextDescriptor {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    /// Use a software adapter, useful for headless CI.
    pub force_fallback_adapter: bool,
    pub label: Option<&'static str>,
}

impl Default for GraphicsContextDescriptor {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            label: None,
        }
    }
}
