use std::fmt;

/// Errors raised while creating GPU state.
///
/// Per-frame operations never fail. Everything here surfaces from
/// construction or [`SpriteBatch::reset`](crate::SpriteBatch::reset).
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsError {
    /// No adapter matched the requested options.
    NoAdapter,
    /// The adapter refused to create a device.
    DeviceRequest(String),
    /// A shader module or pipeline failed validation.
    ShaderCompilation { label: String, message: String },
    /// Pixel data length does not match `width * height * 4`.
    InvalidTextureData { expected: usize, actual: usize },
    /// A texture was requested with a zero dimension.
    ZeroSizedTexture,
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::NoAdapter => write!(f, "No suitable GPU adapter found"),
            GraphicsError::DeviceRequest(msg) => write!(f, "Failed to create device: {}", msg),
            GraphicsError::ShaderCompilation { label, message } => {
                write!(f, "Shader '{}' failed validation: {}", label, message)
            }
            GraphicsError::InvalidTextureData { expected, actual } => write!(
                f,
                "Texture data has {} bytes, expected {}",
                actual, expected
            ),
            GraphicsError::ZeroSizedTexture => write!(f, "Texture dimensions must be non-zero"),
        }
    }
}

impl std::error::Error for GraphicsError {}
