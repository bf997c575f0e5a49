//! Per-eye indexing for stereo rendering.

use glam::Mat4;
use serde::{Deserialize, Serialize};

/// One of the two eyes of a stereo display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Eye {
    Left = 0,
    Right = 1,
}

impl Eye {
    /// Both eyes, left first.
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    /// Index into a per-eye array.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Calls `f` once per eye, left first.
pub fn for_each_eye(mut f: impl FnMut(Eye)) {
    for eye in Eye::BOTH {
        f(eye);
    }
}

/// A pair of matrices indexed by [`Eye`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeTransforms(pub [Mat4; 2]);

impl EyeTransforms {
    /// Both eyes set to identity.
    pub const IDENTITY: Self = Self([Mat4::IDENTITY; 2]);

    pub fn new(left: Mat4, right: Mat4) -> Self {
        Self([left, right])
    }

    pub fn get(&self, eye: Eye) -> Mat4 {
        self.0[eye.index()]
    }

    pub fn set(&mut self, eye: Eye, transform: Mat4) {
        self.0[eye.index()] = transform;
    }

    /// Returns the matrices as an array, left first.
    pub fn to_array(&self) -> [Mat4; 2] {
        self.0
    }
}

impl Default for EyeTransforms {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_each_eye_order() {
        let mut seen = Vec::new();
        for_each_eye(|eye| seen.push(eye));
        assert_eq!(seen, vec![Eye::Left, Eye::Right]);
    }

    #[test]
    fn test_eye_transforms_indexing() {
        let mut t = EyeTransforms::default();
        let shifted = Mat4::from_translation(glam::Vec3::X);
        t.set(Eye::Right, shifted);
        assert_eq!(t.get(Eye::Left), Mat4::IDENTITY);
        assert_eq!(t.get(Eye::Right), shifted);
    }
}
