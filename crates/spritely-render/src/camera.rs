//! Cameras supply the view and projection matrices a sprite batch renders with.
//!
//! ```
//! use spritely_render::{Camera, OrthographicCamera};
//! use glam::{Vec2, Vec3};
//!
//! let mut camera = OrthographicCamera::new(480.0, 400.0);
//! camera.set_position(Vec2::new(100.0, 0.0));
//!
//! // The point the camera looks at lands at the viewport center.
//! let screen = camera.world_to_screen(Vec3::new(100.0, 0.0, 0.0));
//! assert!((screen - Vec2::new(240.0, 200.0)).length() < 1e-3);
//! ```

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Source of view and projection matrices.
pub trait Camera {
    /// World to eye space.
    fn view(&self) -> Mat4;

    /// Eye space to clip space.
    fn projection(&self) -> Mat4;

    fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

/// 2D camera centered on `position`, with world units equal to pixels at
/// zoom 1 and +Y pointing up.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    viewport: Vec2,
    position: Vec2,
    zoom: f32,
    near: f32,
    far: f32,
    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl OrthographicCamera {
    pub fn new(width: f32, height: f32) -> Self {
        let mut camera = Self {
            viewport: Vec2::new(width, height),
            position: Vec2::ZERO,
            zoom: 1.0,
            near: -1.0,
            far: 1.0,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
        };
        camera.update_matrices();
        camera
    }

    /// Override the depth range. Sprites sit at z = 0.
    pub fn with_depth_range(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self.update_matrices();
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.update_matrices();
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Values above 1 magnify. Non-positive values are ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom > 0.0 {
            self.zoom = zoom;
            self.update_matrices();
        }
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
        self.update_matrices();
    }

    /// Convert a pixel position (origin top-left, +Y down) to a point on the
    /// sprite plane, z = 0.
    pub fn screen_to_world(&self, screen_pos: Vec2) -> Vec3 {
        let view_projection = self.view_projection();
        let ndc_x = (screen_pos.x / self.viewport.x) * 2.0 - 1.0;
        let ndc_y = 1.0 - (screen_pos.y / self.viewport.y) * 2.0;
        // Depth of the z = 0 plane; the view never moves it along z.
        let ndc_z = (view_projection * Vec4::W).z;

        let world = view_projection.inverse() * Vec4::new(ndc_x, ndc_y, ndc_z, 1.0);
        world.truncate() / world.w
    }

    /// Convert a world position to pixels (origin top-left, +Y down).
    pub fn world_to_screen(&self, world_pos: Vec3) -> Vec2 {
        let clip = self.view_projection() * world_pos.extend(1.0);
        let ndc = clip.truncate() / clip.w;

        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        )
    }

    fn update_matrices(&mut self) {
        self.view_matrix = Mat4::from_scale(Vec3::new(self.zoom, self.zoom, 1.0))
            * Mat4::from_translation(-self.position.extend(0.0));

        let half = self.viewport * 0.5;
        self.projection_matrix =
            Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, self.near, self.far);
    }
}

impl Camera for OrthographicCamera {
    fn view(&self) -> Mat4 {
        self.view_matrix
    }

    fn projection(&self) -> Mat4 {
        self.projection_matrix
    }
}
