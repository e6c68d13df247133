//! Math types, re-exported from [`glam`].
//!
//! ```
//! use spritely_core::math::{Mat4, Vec2, Vec3};
//!
//! let offset = Vec2::new(-16.0, 16.0);
//! let world = Mat4::from_translation(Vec3::new(100.0, 50.0, 0.0));
//! let p = world.transform_point3(offset.extend(0.0));
//! assert_eq!(p, Vec3::new(84.0, 66.0, 0.0));
//! ```
//!
//! [`glam`]: https://docs.rs/glam

pub use glam::*;
