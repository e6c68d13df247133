//! Batched sprite rendering through one shared vertex buffer.
//!
//! A [`SpriteBatch`] owns an ordered set of sprites and draws them with as
//! few draw calls as texture changes allow:
//!
//! 1. Sprites are sorted by layer, depth and insertion order.
//! 2. Vertices are rewritten only for sprites that changed since this batch
//!    last built them or whose transform was invalidated.
//! 3. The sorted list is split into runs of consecutive sprites sharing a
//!    texture and wrap mode. Each run is one draw call.
//!
//! ```rust,no_run
//! use spritely_render::*;
//! use spritely_core::geometry::Size;
//!
//! # fn frame(pass: &mut wgpu::RenderPass<'_>) -> Result<(), GraphicsError> {
//! let context = GraphicsContext::new_owned_sync()?;
//! let mut batch = SpriteBatch::new(context.clone(), SpriteBatchDescriptor::default())?;
//!
//! let sprite = Sprite::new(Size::new(32.0, 32.0)).into_handle();
//! batch.add(&sprite);
//!
//! let camera = OrthographicCamera::new(480.0, 400.0);
//! batch.render(pass, &camera);
//! # Ok(())
//! # }
//! ```

use crate::camera::Camera;
use crate::geometry::GeometryBuilder;
use crate::pipeline::{BindingScope, SpritePipeline, TEXTURE_GROUP};
use crate::schedule::{DrawRun, RunKey, SortKey, plan_runs};
use crate::sprite::SpriteHandle;
use crate::texture::Texture;
use crate::vertex::{SpriteVertex, VERTICES_PER_SPRITE};
use crate::GraphicsError;
use spritely_core::Transform2D;
use spritely_core::collections::HashSet;
use spritely_core::profiling::{profile_function, profile_scope};
use spritely_test_utils::{GpuBuffer, RenderContext, RenderPassEncoder};
use std::rc::Rc;
use std::sync::Arc;

/// Configuration for a [`SpriteBatch`].
#[derive(Debug, Clone)]
pub struct SpriteBatchDescriptor {
    /// Prefix for GPU object labels and the debug group.
    pub label: String,
    /// Format of the render target the batch draws into.
    pub target_format: wgpu::TextureFormat,
    pub filter: wgpu::FilterMode,
}

impl Default for SpriteBatchDescriptor {
    fn default() -> Self {
        Self {
            label: "Sprite Batch".to_string(),
            target_format: wgpu::TextureFormat::Rgba8UnormSrgb,
            filter: wgpu::FilterMode::Nearest,
        }
    }
}

/// Statistics for the last rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchRenderStats {
    pub sprite_count: usize,
    /// Sprites whose vertices were rewritten.
    pub rebuilt_sprites: usize,
    pub runs: usize,
    pub draw_calls: usize,
    /// Bytes written to the vertex buffer.
    pub uploaded_bytes: usize,
    /// Vertex buffer reallocations since creation.
    pub buffer_reallocations: u64,
}

struct Member {
    sprite: SpriteHandle,
    seq: u64,
}

fn identity(sprite: &SpriteHandle) -> usize {
    Rc::as_ptr(sprite) as *const () as usize
}

/// An ordered set of sprites rendered through one vertex buffer.
///
/// Not `Send`: sprites and textures are `Rc`-shared with game code on the
/// render thread.
pub struct SpriteBatch {
    context: Arc<dyn RenderContext>,
    descriptor: SpriteBatchDescriptor,
    pipeline: SpritePipeline,
    members: Vec<Member>,
    membership: HashSet<usize>,
    next_seq: u64,
    vertex_buffer: Option<GpuBuffer>,
    builder: GeometryBuilder,
    textures: Vec<Option<Rc<Texture>>>,
    run_keys: Vec<RunKey>,
    runs: Vec<DrawRun>,
    transform: Transform2D,
    stats: BatchRenderStats,
}

impl SpriteBatch {
    /// Create an empty batch and compile its pipeline.
    pub fn new(
        context: Arc<dyn RenderContext>,
        descriptor: SpriteBatchDescriptor,
    ) -> Result<Self, GraphicsError> {
        let pipeline = SpritePipeline::new(context.clone(), &descriptor)?;

        Ok(Self {
            context,
            descriptor,
            pipeline,
            members: Vec::new(),
            membership: HashSet::new(),
            next_seq: 0,
            vertex_buffer: None,
            builder: GeometryBuilder::new(),
            textures: Vec::new(),
            run_keys: Vec::new(),
            runs: Vec::new(),
            transform: Transform2D::IDENTITY,
            stats: BatchRenderStats::default(),
        })
    }

    /// Recompile the pipeline and reallocate the vertex buffer.
    ///
    /// On error the batch keeps its previous pipeline.
    pub fn reset(&mut self) -> Result<(), GraphicsError> {
        self.pipeline = SpritePipeline::new(self.context.clone(), &self.descriptor)?;
        self.reallocate();
        tracing::info!("{} reset with {} sprites", self.descriptor.label, self.len());
        Ok(())
    }

    /// Add a sprite. Returns `false` if it was already a member.
    pub fn add(&mut self, sprite: &SpriteHandle) -> bool {
        if !self.membership.insert(identity(sprite)) {
            return false;
        }

        self.members.push(Member {
            sprite: sprite.clone(),
            seq: self.next_seq,
        });
        self.next_seq += 1;
        self.reallocate();
        true
    }

    /// Remove a sprite. Returns `false` if it was not a member.
    pub fn remove(&mut self, sprite: &SpriteHandle) -> bool {
        if !self.membership.remove(&identity(sprite)) {
            return false;
        }

        self.members.retain(|m| !Rc::ptr_eq(&m.sprite, sprite));
        self.reallocate();
        true
    }

    pub fn contains(&self, sprite: &SpriteHandle) -> bool {
        self.membership.contains(&identity(sprite))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in draw order as of the last render, new members last.
    pub fn sprites(&self) -> impl Iterator<Item = &SpriteHandle> {
        self.members.iter().map(|m| &m.sprite)
    }

    /// The batch's own world transform, applied on top of every sprite.
    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform2D {
        &mut self.transform
    }

    /// CPU copy of the vertex buffer, six vertices per sprite in draw order.
    pub fn vertices(&self) -> &[SpriteVertex] {
        self.builder.vertices()
    }

    pub fn vertex_buffer(&self) -> Option<&GpuBuffer> {
        self.vertex_buffer.as_ref()
    }

    /// Runs drawn by the last render.
    pub fn runs(&self) -> &[DrawRun] {
        &self.runs
    }

    pub fn stats(&self) -> BatchRenderStats {
        self.stats
    }

    pub fn pipeline(&self) -> &SpritePipeline {
        &self.pipeline
    }

    pub fn descriptor(&self) -> &SpriteBatchDescriptor {
        &self.descriptor
    }

    /// Discard the vertex buffer and allocate one sized to the members.
    fn reallocate(&mut self) {
        let count = self.members.len();
        self.builder.resize(count);
        self.stats.buffer_reallocations += 1;

        self.vertex_buffer = (count > 0).then(|| {
            self.context.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{} Vertex Buffer", self.descriptor.label)),
                size: (count * VERTICES_PER_SPRITE) as u64 * SpriteVertex::STRIDE,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        tracing::debug!(
            "{} vertex buffer reallocated for {} sprites",
            self.descriptor.label,
            count
        );
    }

    /// Sort by draw order, invalidating all slots if anything moved.
    fn sort_members(&mut self) {
        profile_scope!("sort_members");

        let key = |m: &Member| SortKey::of(&m.sprite.borrow(), m.seq);
        if !self.members.is_sorted_by_key(key) {
            self.members.sort_by_cached_key(key);
            self.builder.invalidate_all();
        }
    }

    /// Forget dropped textures and transforms, then resolve textures and run
    /// keys in order.
    fn resolve_textures(&mut self) {
        self.textures.clear();
        self.run_keys.clear();
        for member in &self.members {
            let mut sprite = member.sprite.borrow_mut();
            let released = sprite.release_dead_refs();
            if released.any() {
                tracing::debug!(
                    seq = member.seq,
                    texture = released.texture,
                    transform = released.transform,
                    "sprite reference dropped, rendering without it"
                );
            }
            let texture = sprite.texture();
            self.run_keys
                .push(RunKey::new(texture.as_ref().map(|t| t.id()), sprite.repeats()));
            self.textures.push(texture);
        }
    }

    /// Draw every member into `pass` as seen by `camera`.
    pub fn render(&mut self, pass: &mut dyn RenderPassEncoder, camera: &dyn Camera) {
        profile_function!();

        let Some(vertex_buffer) = self.vertex_buffer.clone() else {
            self.runs.clear();
            self.stats = BatchRenderStats {
                buffer_reallocations: self.stats.buffer_reallocations,
                ..Default::default()
            };
            return;
        };

        self.sort_members();
        self.resolve_textures();

        let view = camera.view();
        let rebuilt = self
            .builder
            .build(self.members.iter().map(|m| &m.sprite), &self.textures, view);

        plan_runs(&self.run_keys, &mut self.runs);

        let purged = self.pipeline.purge_dead_bind_groups();
        if purged > 0 {
            tracing::debug!("purged {} texture bind groups", purged);
        }

        // Vertices are already in eye space; undo the view before projecting.
        let mvp = camera.projection() * view * self.transform.world() * view.inverse();
        self.pipeline.write_uniform(mvp);

        let bytes: &[u8] = bytemuck::cast_slice(self.builder.vertices());
        {
            profile_scope!("upload_vertices");
            self.context.write_buffer(&vertex_buffer, 0, bytes);
        }

        let mut scope = BindingScope::new(pass, &self.descriptor.label);
        self.pipeline.bind(&mut *scope, &vertex_buffer);
        for run in &self.runs {
            let texture = self.textures[run.first].as_ref();
            let bind_group = self.pipeline.texture_bind_group(texture, run.wrap);
            scope.set_bind_group(TEXTURE_GROUP, &bind_group);
            scope.draw(run.vertex_range(), 0..1);
        }
        drop(scope);

        self.stats = BatchRenderStats {
            sprite_count: self.members.len(),
            rebuilt_sprites: rebuilt,
            runs: self.runs.len(),
            draw_calls: self.runs.len(),
            uploaded_bytes: bytes.len(),
            buffer_reallocations: self.stats.buffer_reallocations,
        };

        tracing::trace!(
            sprites = self.stats.sprite_count,
            rebuilt,
            draws = self.stats.draw_calls,
            "{} rendered",
            self.descriptor.label
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrthographicCamera, Sprite};
    use spritely_core::geometry::Size;
    use spritely_test_utils::{MockRenderContext, MockRenderPass};

    fn batch() -> (Arc<MockRenderContext>, SpriteBatch) {
        let ctx = Arc::new(MockRenderContext::new());
        let batch = SpriteBatch::new(ctx.clone(), SpriteBatchDescriptor::default()).unwrap();
        (ctx, batch)
    }

    fn quad() -> SpriteHandle {
        Sprite::new(Size::new(8.0, 8.0)).into_handle()
    }

    #[test]
    fn test_empty_batch_has_no_buffer() {
        let (_ctx, batch) = batch();
        assert!(batch.vertex_buffer().is_none());
        assert!(batch.vertices().is_empty());
    }

    #[test]
    fn test_add_is_idempotent() {
        let (ctx, mut batch) = batch();
        let sprite = quad();
        let creates = ctx.count_buffer_creates();

        assert!(batch.add(&sprite));
        assert!(!batch.add(&sprite));

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.vertices().len(), 6);
        assert_eq!(ctx.count_buffer_creates(), creates + 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (_ctx, mut batch) = batch();
        let reallocations = batch.stats().buffer_reallocations;
        assert!(!batch.remove(&quad()));
        assert_eq!(batch.stats().buffer_reallocations, reallocations);
    }

    #[test]
    fn test_remove_last_drops_buffer() {
        let (_ctx, mut batch) = batch();
        let sprite = quad();
        batch.add(&sprite);
        assert!(batch.remove(&sprite));

        assert!(batch.vertex_buffer().is_none());
        assert!(!batch.contains(&sprite));
    }

    #[test]
    fn test_render_empty_batch_draws_nothing() {
        let (_ctx, mut batch) = batch();
        let mut pass = MockRenderPass::new();
        batch.render(&mut pass, &OrthographicCamera::new(100.0, 100.0));

        assert!(pass.calls().is_empty());
        assert_eq!(batch.stats().draw_calls, 0);
    }

    #[test]
    fn test_identity_batch_transform_uniform_is_projection() {
        let (ctx, mut batch) = batch();
        batch.add(&quad());

        let camera = OrthographicCamera::new(200.0, 100.0);
        batch.render(&mut MockRenderPass::new(), &camera);

        let bytes = ctx.buffer_contents(batch.pipeline().uniform_buffer()).unwrap();
        let uniform: SpriteUniformView = bytemuck::pod_read_unaligned(&bytes);
        let expected = camera.projection().to_cols_array();
        for (got, want) in uniform.0.iter().zip(expected) {
            assert!((got - want).abs() < 1e-5);
        }
    }

    #[repr(C)]
    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    struct SpriteUniformView([f32; 16]);
}
