//! Sprite quad construction and the positional vertex cache.

use crate::sprite::SpriteHandle;
use crate::texture::Texture;
use crate::vertex::{SpriteVertex, VERTICES_PER_SPRITE};
use crate::Color;
use glam::{Mat4, Vec2, Vec3};
use spritely_core::geometry::{Rect, Size};
use spritely_core::profiling::profile_function;
use std::rc::Rc;

/// Local-space corners of a sprite quad, z = 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadCorners {
    pub top_left: Vec3,
    pub top_right: Vec3,
    pub bottom_left: Vec3,
    pub bottom_right: Vec3,
}

/// Corners of a `bounds` quad centered on the origin, shifted by
/// `-anchor * bounds`.
pub fn quad_corners(bounds: Size<f32>, anchor: Vec2) -> QuadCorners {
    let half = bounds.to_vec2() * 0.5;
    let offset = -anchor * bounds.to_vec2();

    QuadCorners {
        top_left: Vec3::new(offset.x - half.x, offset.y + half.y, 0.0),
        top_right: Vec3::new(offset.x + half.x, offset.y + half.y, 0.0),
        bottom_left: Vec3::new(offset.x - half.x, offset.y - half.y, 0.0),
        bottom_right: Vec3::new(offset.x + half.x, offset.y - half.y, 0.0),
    }
}

/// Texture coordinates for each corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuadUvs {
    pub top_left: Vec2,
    pub top_right: Vec2,
    pub bottom_left: Vec2,
    pub bottom_right: Vec2,
}

/// How many times the frame repeats across the bounds on each axis.
///
/// `(1, 1)` unless `repeats` is set. A zero frame extent yields 1 on that axis.
pub fn uv_scale(bounds: Size<f32>, frame: Rect<f32>, repeats: bool) -> Vec2 {
    if repeats {
        bounds.ratio(frame.size())
    } else {
        Vec2::ONE
    }
}

/// Texture coordinates sampling `frame` of a `texture_size` texture, inset by
/// half a texel on every edge so linear filtering never bleeds into
/// neighboring frames.
pub fn texture_coords(frame: Rect<f32>, texture_size: Size<f32>, scale: Vec2) -> QuadUvs {
    // Work in half-texel units.
    let rect = Rect::new(frame.x, frame.y, frame.width * 2.0, frame.height * 2.0);
    let denom = texture_size.to_vec2() * 2.0;

    let top_left = Vec2::new(
        (2.0 * rect.x + 1.0) / denom.x,
        (2.0 * rect.y + 1.0) / denom.y,
    ) * scale;
    let bottom_right = Vec2::new(
        (2.0 * rect.x + 1.0 + rect.width - 2.0) / denom.x,
        (2.0 * rect.y + 1.0 + rect.height - 2.0) / denom.y,
    ) * scale;

    QuadUvs {
        top_left,
        top_right: Vec2::new(bottom_right.x, top_left.y),
        bottom_left: Vec2::new(top_left.x, bottom_right.y),
        bottom_right,
    }
}

/// Write the two clockwise triangles `(tl, br, bl)` and `(tl, tr, br)`.
pub fn write_quad(
    out: &mut [SpriteVertex],
    model_view: Mat4,
    corners: &QuadCorners,
    uvs: &QuadUvs,
    tint: Color,
) {
    let tint = tint.to_array();
    let vertex = |corner: Vec3, uv: Vec2| SpriteVertex {
        position: model_view.transform_point3(corner).to_array(),
        tint,
        tex_coord: uv.to_array(),
    };

    let tl = vertex(corners.top_left, uvs.top_left);
    let tr = vertex(corners.top_right, uvs.top_right);
    let bl = vertex(corners.bottom_left, uvs.bottom_left);
    let br = vertex(corners.bottom_right, uvs.bottom_right);

    out[..VERTICES_PER_SPRITE].copy_from_slice(&[tl, br, bl, tl, tr, br]);
}

/// Positional vertex cache: sprite `i` in sorted order owns vertices
/// `[6i, 6i + 6)`.
///
/// Each slot remembers the sprite version it was written from. Sprites whose
/// version is unchanged and whose transform is not invalidated keep their
/// slot from the previous frame. Any change that shifts or reinterprets slots
/// (resize, reorder, new view) forces the next build to rewrite all of them.
#[derive(Debug, Default)]
pub struct GeometryBuilder {
    vertices: Vec<SpriteVertex>,
    built_versions: Vec<u64>,
    full_rebuild: bool,
    last_view: Option<Mat4>,
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reallocate for `sprite_count` sprites.
    pub fn resize(&mut self, sprite_count: usize) {
        self.vertices.clear();
        self.vertices
            .resize(sprite_count * VERTICES_PER_SPRITE, SpriteVertex::default());
        self.built_versions.clear();
        self.built_versions.resize(sprite_count, 0);
        self.full_rebuild = true;
    }

    /// Force the next build to rewrite every slot.
    pub fn invalidate_all(&mut self) {
        self.full_rebuild = true;
    }

    pub fn vertices(&self) -> &[SpriteVertex] {
        &self.vertices
    }

    pub fn sprite_capacity(&self) -> usize {
        self.vertices.len() / VERTICES_PER_SPRITE
    }

    /// Rewrite the slots of sprites that changed.
    ///
    /// `sprites` and `textures` are parallel, in sorted order, and their
    /// length must match the last [`resize`](Self::resize). Returns how many
    /// sprites were rewritten.
    pub fn build<'a>(
        &mut self,
        sprites: impl IntoIterator<Item = &'a SpriteHandle>,
        textures: &[Option<Rc<Texture>>],
        view: Mat4,
    ) -> usize {
        profile_function!();

        let full = self.full_rebuild || self.last_view != Some(view);
        let mut rebuilt = 0;

        for ((index, handle), texture) in sprites.into_iter().enumerate().zip(textures) {
            let sprite = handle.borrow();
            let unchanged = self.built_versions[index] == sprite.version();
            if !full && unchanged && !sprite.transform_invalidated() {
                continue;
            }

            let model_view = view * sprite.world();
            let corners = quad_corners(sprite.bounds(), sprite.anchor());
            let uvs = match texture {
                Some(texture) => {
                    let scale = uv_scale(sprite.bounds(), sprite.frame(), sprite.repeats());
                    texture_coords(sprite.frame(), texture.size(), scale)
                }
                None => QuadUvs::default(),
            };

            let start = index * VERTICES_PER_SPRITE;
            write_quad(
                &mut self.vertices[start..start + VERTICES_PER_SPRITE],
                model_view,
                &corners,
                &uvs,
                sprite.tint(),
            );

            self.built_versions[index] = sprite.version();
            rebuilt += 1;
        }

        self.full_rebuild = false;
        self.last_view = Some(view);
        rebuilt
    }
}
