//! 2D overlay and 3D HUD collaborators of the frame compositor.
//!
//! - [`OverlayRenderer`] renders 2D overlay content into its own texture at
//!   the full output surface size, before the scene pass.
//! - [`HudOverlayRegistry`] renders 3D HUD overlays into the post-composite
//!   batch, after the scene pass.

mod hud;

pub use hud::*;

use glam::{Mat4, UVec2};

use crate::error::GpuResult;
use crate::gpu::{Program, TextureHandle};
use crate::render_args::RenderArgs;

/// Renders the 2D overlay for a frame.
pub trait OverlayRenderer: Send {
    /// Records the pose information overlay placement is derived from.
    fn set_frame_info(&mut self, frame_index: u64, eye_to_world: Mat4, sensor_to_world: Mat4);

    /// Renders overlay content. `args.viewport` covers the full output surface.
    fn render_overlay(&mut self, args: &RenderArgs) -> GpuResult<()>;

    /// Texture holding the most recently rendered overlay.
    fn overlay_texture(&self) -> Option<TextureHandle>;
}

/// Default overlay renderer drawing a full-surface overlay quad.
#[derive(Debug, Default)]
pub struct ApplicationOverlay {
    texture: Option<TextureHandle>,
    next_texture_id: u64,
    frame_index: u64,
    eye_to_world: Mat4,
    sensor_to_world: Mat4,
}

impl ApplicationOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame index passed to the last `set_frame_info` call.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn eye_to_world(&self) -> Mat4 {
        self.eye_to_world
    }

    pub fn sensor_to_world(&self) -> Mat4 {
        self.sensor_to_world
    }

    /// Reuses the overlay texture while the surface size is unchanged.
    fn texture_for(&mut self, size: UVec2) -> TextureHandle {
        match self.texture {
            Some(texture) if texture.size == size => texture,
            _ => {
                self.next_texture_id += 1;
                let texture = TextureHandle {
                    id: self.next_texture_id,
                    size,
                };
                tracing::debug!("Overlay texture resized to {:?}", size);
                self.texture = Some(texture);
                texture
            }
        }
    }
}

impl OverlayRenderer for ApplicationOverlay {
    fn set_frame_info(&mut self, frame_index: u64, eye_to_world: Mat4, sensor_to_world: Mat4) {
        self.frame_index = frame_index;
        self.eye_to_world = eye_to_world;
        self.sensor_to_world = sensor_to_world;
    }

    fn render_overlay(&mut self, args: &RenderArgs) -> GpuResult<()> {
        let size = UVec2::new(args.viewport.z.max(1) as u32, args.viewport.w.max(1) as u32);
        let texture = self.texture_for(size);
        if let Some(context) = &args.context {
            context.do_in_batch("overlay", |batch| {
                batch.set_viewport_transform(args.viewport);
                batch.bind_program(Program::Hud);
                batch.draw(format!("overlay-texture-{}", texture.id), 6);
            })?;
        }
        Ok(())
    }

    fn overlay_texture(&self) -> Option<TextureHandle> {
        self.texture
    }
}
