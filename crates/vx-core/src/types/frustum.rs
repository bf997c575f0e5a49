//! Camera view frustum.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// View and projection of the camera used for one frame.
///
/// `view` is the eye-to-world transform (the camera's placement in the world),
/// not its inverse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewFrustum {
    pub view: Mat4,
    pub projection: Mat4,
    pub near: f32,
    pub far: f32,
}

impl ViewFrustum {
    pub fn new(view: Mat4, fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            view,
            projection: Mat4::perspective_rh(fov_y_radians, aspect, near, far),
            near,
            far,
        }
    }

    /// Eye-to-world transform.
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// World-to-eye transform.
    pub fn view_matrix(&self) -> Mat4 {
        self.view.inverse()
    }

    pub fn position(&self) -> Vec3 {
        self.view.w_axis.truncate()
    }

    /// Updates the aspect ratio, keeping the vertical field of view.
    pub fn set_aspect(&mut self, fov_y_radians: f32, aspect: f32) {
        self.projection = Mat4::perspective_rh(fov_y_radians, aspect.max(1e-3), self.near, self.far);
    }
}

impl Default for ViewFrustum {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, 60f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0)
    }
}
