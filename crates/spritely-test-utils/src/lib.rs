//! Test utilities for Spritely.
//!
//! This crate holds the seam between the renderer and the GPU: a
//! [`RenderContext`] trait for resource creation and uploads, a
//! [`RenderPassEncoder`] trait for recording draws, and owned wrapper types
//! that carry either a real `wgpu` handle or a mock id.
//!
//! With the `mock` feature enabled, `MockRenderContext` and `MockRenderPass`
//! record every call so batching behavior can be asserted without a GPU.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use spritely_test_utils::{MockRenderContext, RenderContext};
//! use wgpu::*;
//!
//! let mock = MockRenderContext::new();
//! let buffer = mock.create_buffer(&BufferDescriptor {
//!     label: Some("vertices"),
//!     size: 216,
//!     usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
//!     mapped_at_creation: false,
//! });
//!
//! assert_eq!(mock.count_buffer_creates(), 1);
//! assert!(buffer.is_mock());
//! # }
//! ```
//!
//! All wrapper types are owned and cheap to clone, so nothing in the renderer
//! carries a lifetime tied to the device.

pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_pass;
#[cfg(feature = "mock")]
pub mod mock_render;
pub mod render_context;
pub mod render_pass;

pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_pass::*;
#[cfg(feature = "mock")]
pub use mock_render::*;
pub use render_context::*;
pub use render_pass::*;
