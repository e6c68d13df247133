//! The renderable unit of a [`SpriteBatch`](crate::SpriteBatch).
//!
//! A sprite describes a textured, tinted quad. It does not own its texture
//! or transform; both are held weakly and resolved each frame.

use crate::{Color, Texture};
use glam::{Mat4, Vec2};
use spritely_core::Transform2D;
use spritely_core::geometry::{Rect, Size};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Shared handle to a sprite. Batch membership is by reference identity.
pub type SpriteHandle = Rc<RefCell<Sprite>>;

/// Shared handle to a transform driven by game code.
pub type TransformHandle = Rc<RefCell<Transform2D>>;

/// Geometry and appearance of one quad.
///
/// Every setter bumps the sprite's [`version`](Self::version). Each batch
/// remembers the version it last built, so a sprite shared between batches
/// is rebuilt by all of them.
#[derive(Debug, Clone)]
pub struct Sprite {
    bounds: Size<f32>,
    anchor: Vec2,
    frame: Rect<f32>,
    tint: Color,
    repeats: bool,
    texture: Option<Weak<Texture>>,
    transform: Option<Weak<RefCell<Transform2D>>>,
    layer: i32,
    layer_depth: f32,
    version: u64,
}

impl Sprite {
    /// An untextured white quad of `bounds`, centered on its origin.
    pub fn new(bounds: Size<f32>) -> Self {
        Self {
            bounds: clamp_bounds(bounds),
            anchor: Vec2::ZERO,
            frame: Rect::default(),
            tint: Color::WHITE,
            repeats: false,
            texture: None,
            transform: None,
            layer: 0,
            layer_depth: 0.0,
            version: 0,
        }
    }

    /// A sprite showing all of `texture` at its pixel size.
    pub fn from_texture(texture: &Rc<Texture>) -> Self {
        let mut sprite = Self::new(texture.size());
        sprite.set_texture(Some(texture));
        sprite
    }

    pub fn into_handle(self) -> SpriteHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn with_anchor(mut self, anchor: Vec2) -> Self {
        self.set_anchor(anchor);
        self
    }

    pub fn with_frame(mut self, frame: Rect<f32>) -> Self {
        self.set_frame(frame);
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.set_tint(tint);
        self
    }

    pub fn with_repeats(mut self, repeats: bool) -> Self {
        self.set_repeats(repeats);
        self
    }

    pub fn with_transform(mut self, transform: &TransformHandle) -> Self {
        self.set_transform(Some(transform));
        self
    }

    pub fn with_layer(mut self, layer: i32, depth: f32) -> Self {
        self.set_layer(layer);
        self.set_layer_depth(depth);
        self
    }

    pub fn bounds(&self) -> Size<f32> {
        self.bounds
    }

    /// Negative extents are clamped to zero.
    pub fn set_bounds(&mut self, bounds: Size<f32>) {
        self.bounds = clamp_bounds(bounds);
        self.touch();
    }

    /// Pivot as a fraction of bounds. The quad is offset by `-anchor * bounds`
    /// from its centered position.
    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: Vec2) {
        self.anchor = anchor;
        self.touch();
    }

    /// Source region in texels. `(0, 0, width, height)` covers the texture.
    pub fn frame(&self) -> Rect<f32> {
        self.frame
    }

    pub fn set_frame(&mut self, frame: Rect<f32>) {
        self.frame = frame;
        self.touch();
    }

    pub fn tint(&self) -> Color {
        self.tint
    }

    pub fn set_tint(&mut self, tint: Color) {
        self.tint = tint;
        self.touch();
    }

    /// When set, the frame tiles across the bounds instead of stretching.
    pub fn repeats(&self) -> bool {
        self.repeats
    }

    pub fn set_repeats(&mut self, repeats: bool) {
        self.repeats = repeats;
        self.touch();
    }

    /// The texture, if one is set and still alive.
    pub fn texture(&self) -> Option<Rc<Texture>> {
        self.texture.as_ref().and_then(Weak::upgrade)
    }

    /// Setting a texture resets the frame to cover all of it.
    pub fn set_texture(&mut self, texture: Option<&Rc<Texture>>) {
        self.texture = texture.map(Rc::downgrade);
        if let Some(texture) = texture {
            self.frame = Rect::new(0.0, 0.0, texture.width() as f32, texture.height() as f32);
        }
        self.touch();
    }

    pub fn transform(&self) -> Option<TransformHandle> {
        self.transform.as_ref().and_then(Weak::upgrade)
    }

    pub fn set_transform(&mut self, transform: Option<&TransformHandle>) {
        self.transform = transform.map(Rc::downgrade);
        self.touch();
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
        self.touch();
    }

    /// Order within a layer, ascending.
    pub fn layer_depth(&self) -> f32 {
        self.layer_depth
    }

    pub fn set_layer_depth(&mut self, depth: f32) {
        self.layer_depth = depth;
        self.touch();
    }

    /// Change counter for visual state other than the transform.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Force every batch holding this sprite to rewrite it next frame.
    pub fn mark_dirty(&mut self) {
        self.touch();
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// World matrix of the transform, identity when there is none.
    pub(crate) fn world(&self) -> Mat4 {
        self.transform()
            .map(|t| t.borrow().world())
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Whether the attached transform changed since its owner last cleared it.
    pub(crate) fn transform_invalidated(&self) -> bool {
        self.transform()
            .is_some_and(|t| t.borrow().is_invalidated())
    }

    /// Forget references whose target was dropped.
    ///
    /// Returns which references were released. Releasing one bumps the
    /// version so its slot is rewritten once without it.
    pub(crate) fn release_dead_refs(&mut self) -> ReleasedRefs {
        let texture = self
            .texture
            .as_ref()
            .is_some_and(|weak| weak.strong_count() == 0);
        let transform = self
            .transform
            .as_ref()
            .is_some_and(|weak| weak.strong_count() == 0);

        if texture {
            self.texture = None;
        }
        if transform {
            self.transform = None;
        }
        if texture || transform {
            self.touch();
        }

        ReleasedRefs { texture, transform }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReleasedRefs {
    pub texture: bool,
    pub transform: bool,
}

impl ReleasedRefs {
    pub fn any(self) -> bool {
        self.texture || self.transform
    }
}

fn clamp_bounds(bounds: Size<f32>) -> Size<f32> {
    Size::new(bounds.width.max(0.0), bounds.height.max(0.0))
}
