//! 3D HUD overlays rendered into the post-composite batch.

use glam::{Vec3, Vec4};

use crate::gpu::{Batch, LineSegment, Program};
use crate::render_args::RenderArgs;

/// A HUD overlay composited on top of the resolved scene.
///
/// Overlays are executed in order of their priority (lower values first).
pub trait HudOverlay: Send + Sync {
    /// Returns the unique name of this overlay.
    fn name(&self) -> &str;

    /// Returns the render priority (lower = rendered first).
    fn priority(&self) -> i32;

    /// Returns whether this overlay is currently enabled.
    fn is_enabled(&self) -> bool;

    /// Enables or disables this overlay.
    fn set_enabled(&mut self, enabled: bool);

    /// Records the overlay's commands into the post-composite batch.
    fn render(&self, args: &RenderArgs, batch: &mut Batch);
}

/// Registry of HUD overlays.
pub struct HudOverlayRegistry {
    overlays: Vec<Box<dyn HudOverlay>>,
    sorted: bool,
}

impl HudOverlayRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            overlays: Vec::new(),
            sorted: true,
        }
    }

    /// Registers a new overlay.
    pub fn register<O: HudOverlay + 'static>(&mut self, overlay: O) {
        self.overlays.push(Box::new(overlay));
        self.sorted = false;
    }

    /// Unregisters an overlay by name.
    ///
    /// Returns the removed overlay, or None if not found.
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn HudOverlay>> {
        let pos = self.overlays.iter().position(|o| o.name() == name)?;
        Some(self.overlays.remove(pos))
    }

    /// Gets a mutable reference to an overlay by name.
    pub fn get_mut<'a>(&'a mut self, name: &str) -> Option<&'a mut (dyn HudOverlay + 'a)> {
        for overlay in &mut self.overlays {
            if overlay.name() == name {
                return Some(overlay.as_mut());
            }
        }
        None
    }

    /// Returns true if the registry contains an overlay with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.overlays.iter().any(|o| o.name() == name)
    }

    /// Returns the number of registered overlays.
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Returns an iterator over all overlays in registration or priority order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn HudOverlay> {
        self.overlays.iter().map(|o| o.as_ref())
    }

    fn ensure_sorted(&mut self) {
        if !self.sorted {
            self.overlays.sort_by_key(|o| o.priority());
            self.sorted = true;
        }
    }

    /// Renders all enabled overlays in priority order.
    pub fn render_all(&mut self, args: &RenderArgs, batch: &mut Batch) {
        self.ensure_sorted();
        for overlay in &self.overlays {
            if overlay.is_enabled() {
                overlay.render(args, batch);
            }
        }
    }
}

impl Default for HudOverlayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Render priorities for built-in HUD overlays.
pub mod priorities {
    /// Reticle is drawn above world-anchored HUD elements.
    pub const RETICLE: i32 = 100;
}

/// Crosshair reticle placed in front of the camera.
#[derive(Debug, Clone)]
pub struct ReticleOverlay {
    enabled: bool,
    /// Distance in front of the camera in metres.
    pub depth: f32,
    /// Half-width of the crosshair in metres.
    pub size: f32,
    pub color: Vec4,
}

impl Default for ReticleOverlay {
    fn default() -> Self {
        Self {
            enabled: true,
            depth: 1.0,
            size: 0.02,
            color: Vec4::new(1.0, 1.0, 1.0, 0.8),
        }
    }
}

impl HudOverlay for ReticleOverlay {
    fn name(&self) -> &str {
        "reticle"
    }

    fn priority(&self) -> i32 {
        priorities::RETICLE
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn render(&self, args: &RenderArgs, batch: &mut Batch) {
        let view = args.view_frustum.view();
        let center = view.transform_point3(Vec3::new(0.0, 0.0, -self.depth));
        let right = view.transform_vector3(Vec3::X) * self.size;
        let up = view.transform_vector3(Vec3::Y) * self.size;
        batch.bind_program(Program::Hud);
        batch.draw_lines(
            vec![
                LineSegment::new(center - right, center + right),
                LineSegment::new(center - up, center + up),
            ],
            self.color,
        );
    }
}
