use glam::{Mat4, Quat, Vec2, Vec3};

/// Position, rotation and scale of an object in the 2D plane.
///
/// Every setter raises the `invalidated` flag. Consumers that cache anything
/// derived from [`world`](Self::world) check the flag, and the owner clears
/// it with [`clear_invalidated`](Self::clear_invalidated) once all consumers
/// have observed the change, typically at the end of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    position: Vec2,
    /// Counter-clockwise, in radians.
    rotation: f32,
    scale: Vec2,
    invalidated: bool,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    /// Identity transform. Starts invalidated so first consumers build from it.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
        invalidated: true,
    };

    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.invalidated = true;
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.set_position(self.position + delta);
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
        self.invalidated = true;
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.invalidated = true;
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    pub fn clear_invalidated(&mut self) {
        self.invalidated = false;
    }

    /// Local-to-world matrix: scale, then rotate about Z, then translate.
    pub fn world(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.extend(1.0),
            Quat::from_rotation_z(self.rotation),
            Vec3::new(self.position.x, self.position.y, 0.0),
        )
    }
}
