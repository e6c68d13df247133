//! Draw ordering and texture-run partitioning.

use crate::sprite::Sprite;
use crate::texture::{TextureId, WrapMode};
use crate::vertex::VERTICES_PER_SPRITE;
use std::cmp::Ordering;
use std::ops::Range;

/// Total draw order: layer, then depth within the layer, then insertion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortKey {
    pub layer: i32,
    pub depth: f32,
    pub seq: u64,
}

impl SortKey {
    pub fn of(sprite: &Sprite, seq: u64) -> Self {
        Self {
            layer: sprite.layer(),
            depth: sprite.layer_depth(),
            seq,
        }
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.layer
            .cmp(&other.layer)
            .then_with(|| self.depth.total_cmp(&other.depth))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// What a sprite needs bound to draw: its texture and how to sample it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunKey {
    pub texture: Option<TextureId>,
    pub wrap: WrapMode,
}

impl RunKey {
    /// Untextured sprites always clamp so they merge regardless of `repeats`.
    pub fn new(texture: Option<TextureId>, repeats: bool) -> Self {
        let wrap = if texture.is_some() && repeats {
            WrapMode::Repeat
        } else {
            WrapMode::ClampToEdge
        };
        Self { texture, wrap }
    }
}

/// A maximal range of consecutive sprites sharing one texture and wrap mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRun {
    /// `None` for untextured sprites, drawn with the white texture.
    pub texture: Option<TextureId>,
    pub wrap: WrapMode,
    /// Index of the first sprite in sorted order.
    pub first: usize,
    pub count: usize,
}

impl DrawRun {
    pub fn vertex_range(&self) -> Range<u32> {
        let start = (self.first * VERTICES_PER_SPRITE) as u32;
        let end = ((self.first + self.count) * VERTICES_PER_SPRITE) as u32;
        start..end
    }
}

/// Split sorted sprites into runs wherever the texture or wrap mode changes.
///
/// Single greedy pass. Non-adjacent sprites sharing a key stay in separate
/// runs so draw order is preserved.
pub fn plan_runs(keys: &[RunKey], runs: &mut Vec<DrawRun>) {
    runs.clear();

    let mut first = 0;
    for chunk in keys.chunk_by(|a, b| a == b) {
        runs.push(DrawRun {
            texture: chunk[0].texture,
            wrap: chunk[0].wrap,
            first,
            count: chunk.len(),
        });
        first += chunk.len();
    }
}
