//! Latest camera and head-pose snapshot shared between simulation and render.

use glam::Mat4;
use parking_lot::Mutex;
use vx_core::EyeTransforms;

use crate::render_args::RenderArgs;

/// Camera and pose state used consistently throughout one frame.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub render_args: RenderArgs,
    pub head_pose: Mat4,
    pub eye_to_world: Mat4,
    pub sensor_to_world: Mat4,
    pub sensor_to_world_scale: f32,
    pub is_stereo: bool,
    pub eye_offsets: EyeTransforms,
    pub eye_projections: EyeTransforms,
}

impl Default for FrameSnapshot {
    fn default() -> Self {
        Self {
            render_args: RenderArgs::default(),
            head_pose: Mat4::IDENTITY,
            eye_to_world: Mat4::IDENTITY,
            sensor_to_world: Mat4::IDENTITY,
            sensor_to_world_scale: 1.0,
            is_stereo: false,
            eye_offsets: EyeTransforms::IDENTITY,
            eye_projections: EyeTransforms::IDENTITY,
        }
    }
}

/// Last-write-wins holder of the current [`FrameSnapshot`].
///
/// The lock is held only for the copy, so the writer (simulation cadence)
/// and the reader (display cadence) never block each other beyond it.
#[derive(Debug, Default)]
pub struct FrameStateBuffer {
    snapshot: Mutex<FrameSnapshot>,
}

impl FrameStateBuffer {
    pub fn new(initial: FrameSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(initial),
        }
    }

    /// Replaces the stored snapshot.
    pub fn write(&self, snapshot: FrameSnapshot) {
        *self.snapshot.lock() = snapshot;
    }

    /// Returns a full copy of the stored snapshot.
    pub fn read(&self) -> FrameSnapshot {
        self.snapshot.lock().clone()
    }

    /// Edits the stored snapshot in place.
    pub fn edit<R>(&self, editor: impl FnOnce(&mut FrameSnapshot) -> R) -> R {
        editor(&mut self.snapshot.lock())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use glam::Vec3;

    use super::*;

    fn snapshot_for(k: u32) -> FrameSnapshot {
        let v = k as f32;
        let m = Mat4::from_translation(Vec3::splat(v));
        FrameSnapshot {
            head_pose: m,
            eye_to_world: m,
            sensor_to_world: m,
            sensor_to_world_scale: v,
            is_stereo: k % 2 == 1,
            eye_offsets: EyeTransforms::new(m, m),
            eye_projections: EyeTransforms::new(m, m),
            ..Default::default()
        }
    }

    fn is_consistent(s: &FrameSnapshot) -> bool {
        let v = s.sensor_to_world_scale;
        let m = Mat4::from_translation(Vec3::splat(v));
        s.head_pose == m
            && s.eye_to_world == m
            && s.sensor_to_world == m
            && s.is_stereo == ((v as u32) % 2 == 1)
            && s.eye_offsets == EyeTransforms::new(m, m)
            && s.eye_projections == EyeTransforms::new(m, m)
    }

    #[test]
    fn test_read_returns_last_write() {
        let buffer = FrameStateBuffer::default();
        buffer.write(snapshot_for(3));
        buffer.write(snapshot_for(4));
        assert_eq!(buffer.read().sensor_to_world_scale, 4.0);
    }

    #[test]
    fn test_edit_updates_in_place() {
        let buffer = FrameStateBuffer::default();
        buffer.edit(|s| s.is_stereo = true);
        let snapshot = buffer.read();
        assert!(snapshot.is_stereo);
        assert_eq!(snapshot.sensor_to_world_scale, 1.0);
    }

    #[test]
    fn test_concurrent_reads_never_observe_torn_snapshots() {
        let buffer = FrameStateBuffer::new(snapshot_for(0));
        let done = AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                for k in 1..5_000 {
                    buffer.write(snapshot_for(k));
                }
                done.store(true, Ordering::Release);
            });
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let snapshot = buffer.read();
                    assert!(is_consistent(&snapshot));
                }
            });
        });

        assert!(is_consistent(&buffer.read()));
    }
}
