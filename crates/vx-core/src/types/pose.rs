//! Pose type definition

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Pose (position and orientation)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub xyz: [f32; 3],
    pub rpy: [f32; 3], // roll, pitch, yaw in radians
}

impl Pose {
    pub fn new(xyz: [f32; 3], rpy: [f32; 3]) -> Self {
        Self { xyz, rpy }
    }

    pub fn from_position(xyz: [f32; 3]) -> Self {
        Self { xyz, rpy: [0.0; 3] }
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.to_quat(), self.position())
    }

    /// Convert to quaternion representation
    pub fn to_quat(&self) -> Quat {
        Quat::from_euler(glam::EulerRot::XYZ, self.rpy[0], self.rpy[1], self.rpy[2])
    }

    /// Get position as Vec3
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.xyz)
    }

    /// Offset from a head pose to one eye, separated by `ipd` metres.
    pub fn eye_offset(ipd: f32, eye: crate::Eye) -> Mat4 {
        let half = ipd * 0.5;
        let x = match eye {
            crate::Eye::Left => -half,
            crate::Eye::Right => half,
        };
        Mat4::from_translation(Vec3::new(x, 0.0, 0.0))
    }
}
