//! World axes indicator.

use glam::{Mat4, Vec3, Vec4};
use vx_core::Bound;

use crate::engine::box_outline;
use crate::gpu::{Batch, LineSegment, Program};
use crate::render_args::RenderArgs;
use crate::scene::{ItemKey, Payload};

const X_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
const Y_COLOR: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);
const Z_COLOR: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);
const BOX_COLOR: Vec4 = Vec4::new(0.5, 0.5, 0.5, 1.0);

/// Coordinate axes at the world origin, with a box outline and unit ticks.
///
/// Drawn only while `DisplayOptions::show_world_axes` is on.
#[derive(Debug, Clone)]
pub struct WorldAxesPayload {
    /// Length of each axis in metres.
    pub scale: f32,
    /// Half-length of each tick marker.
    pub tick_size: f32,
}

impl Default for WorldAxesPayload {
    fn default() -> Self {
        Self {
            scale: 10.0,
            tick_size: 0.05,
        }
    }
}

impl WorldAxesPayload {
    /// Axis line plus one tick per metre along `axis`.
    fn axis_lines(&self, axis: Vec3, across: Vec3) -> Vec<LineSegment> {
        let mut lines = vec![LineSegment::new(Vec3::ZERO, axis * self.scale)];
        let ticks = self.scale.floor() as u32;
        for i in 1..=ticks {
            let at = axis * i as f32;
            lines.push(LineSegment::new(
                at - across * self.tick_size,
                at + across * self.tick_size,
            ));
        }
        lines
    }
}

impl Payload for WorldAxesPayload {
    fn key(&self) -> ItemKey {
        ItemKey::opaque_shape()
    }

    fn bound(&self) -> Bound {
        Bound::EMPTY
    }

    fn render(&self, args: &RenderArgs, batch: &mut Batch) {
        if !args.display_options.show_world_axes {
            return;
        }
        batch.bind_program(Program::Simple);
        batch.set_model_transform(Mat4::IDENTITY);
        batch.draw_lines(self.axis_lines(Vec3::X, Vec3::Y), X_COLOR);
        batch.draw_lines(self.axis_lines(Vec3::Y, Vec3::X), Y_COLOR);
        batch.draw_lines(self.axis_lines(Vec3::Z, Vec3::Y), Z_COLOR);
        batch.draw_lines(
            box_outline(&Bound::new(Vec3::ZERO, Vec3::splat(self.scale))),
            BOX_COLOR,
        );
    }
}
