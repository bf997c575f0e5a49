//! VX Core Types
//!
//! Value types shared between the simulation side and the renderer:
//! - Eye: per-eye indexing for stereo rendering
//! - Pose: position and orientation, convertible to a matrix
//! - ViewFrustum: camera view and projection
//! - Bound: axis-aligned bounding boxes for scene items

pub mod types;

pub use types::*;
