use glam::Vec2;
use std::ops::{Div, Mul};

/// Axis-aligned rectangle given by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T: Copy> Rect<T> {
    pub fn new(x: T, y: T, width: T, height: T) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_pos_size(pos: Pos<T>, size: Size<T>) -> Self {
        Rect {
            x: pos.x,
            y: pos.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn pos(&self) -> Pos<T> {
        Pos::new(self.x, self.y)
    }

    pub fn size(&self) -> Size<T> {
        Size::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub fn new(width: T, height: T) -> Self {
        Size { width, height }
    }

    pub fn cast<U: From<T>>(self) -> Size<U> {
        Size {
            width: U::from(self.width),
            height: U::from(self.height),
        }
    }
}

impl Size<f32> {
    pub const ZERO: Self = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Component-wise division, yielding 1 on any axis where `rhs` is zero.
    pub fn ratio(self, rhs: Size<f32>) -> Vec2 {
        let axis = |num: f32, den: f32| if den == 0.0 { 1.0 } else { num / den };
        Vec2::new(axis(self.width, rhs.width), axis(self.height, rhs.height))
    }
}

impl<T: Mul + Copy> Mul<T> for Size<T> {
    type Output = Size<<T as Mul>::Output>;

    fn mul(self, rhs: T) -> Self::Output {
        Size {
            width: self.width * rhs,
            height: self.height * rhs,
        }
    }
}

impl<T: Div + Copy> Div<T> for Size<T> {
    type Output = Size<<T as Div>::Output>;

    fn div(self, rhs: T) -> Self::Output {
        Size {
            width: self.width / rhs,
            height: self.height / rhs,
        }
    }
}

impl From<Size<u32>> for Size<f32> {
    fn from(size: Size<u32>) -> Self {
        Size::new(size.width as f32, size.height as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pos<T> {
    pub x: T,
    pub y: T,
}

impl<T> Pos<T> {
    pub fn new(x: T, y: T) -> Self {
        Pos { x, y }
    }
}

impl From<Pos<f32>> for Vec2 {
    fn from(pos: Pos<f32>) -> Self {
        Vec2::new(pos.x, pos.y)
    }
}
