//! Spritely Render
//!
//! Batched 2D sprite rendering on `wgpu`. See [`SpriteBatch`] for the entry
//! point and [`spritely_test_utils`] for running it against a mock device.

mod batch;
mod camera;
mod color;
mod context;
mod context_impl;
mod error;
pub mod geometry;
pub mod pipeline;
pub mod schedule;
mod sprite;
mod texture;
mod vertex;

pub use batch::{BatchRenderStats, SpriteBatch, SpriteBatchDescriptor};
pub use camera::{Camera, OrthographicCamera};
pub use color::Color;
pub use context::{GraphicsContext, GraphicsContextDescriptor};
pub use error::GraphicsError;
pub use schedule::DrawRun;
pub use sprite::{Sprite, SpriteHandle, TransformHandle};
pub use texture::{Texture, TextureId, WrapMode};
pub use vertex::{SpriteVertex, VERTICES_PER_SPRITE};

pub use spritely_test_utils::{RenderContext, RenderPassEncoder};
