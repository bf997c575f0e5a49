//! Per-pass render arguments.

use std::sync::Arc;

use bitflags::bitflags;
use glam::IVec4;
use vx_core::ViewFrustum;

use crate::display_options::DisplayOptions;
use crate::gpu::{FramebufferPointer, GpuContext};

bitflags! {
    /// Debug visualizations requested for the scene pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DebugFlags: u32 {
        /// Draw physics collision hulls.
        const HULLS = 1 << 0;
        /// Highlight physics objects owned by this client.
        const OWNED = 1 << 1;
        /// Draw item bounding boxes.
        const BOUNDS = 1 << 2;
    }
}

impl DebugFlags {
    /// Builds the flag set requested by the display options.
    pub fn from_options(options: &DisplayOptions) -> Self {
        let mut flags = DebugFlags::empty();
        if options.physics_show_hulls {
            flags |= DebugFlags::HULLS;
        }
        if options.physics_show_owned {
            flags |= DebugFlags::OWNED;
        }
        if options.show_item_bounds {
            flags |= DebugFlags::BOUNDS;
        }
        flags
    }
}

/// Item counters for one render layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCounts {
    pub considered: usize,
    pub culled: usize,
    pub rendered: usize,
}

/// Render statistics collected during the scene pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderDetails {
    pub opaque: ItemCounts,
    pub transparent: ItemCounts,
    pub overlay: ItemCounts,
    pub batches: usize,
}

impl RenderDetails {
    pub fn rendered(&self) -> usize {
        self.opaque.rendered + self.transparent.rendered + self.overlay.rendered
    }

    pub fn considered(&self) -> usize {
        self.opaque.considered + self.transparent.considered + self.overlay.considered
    }
}

/// Arguments threaded through the passes of a frame.
#[derive(Debug, Clone, Default)]
pub struct RenderArgs {
    pub viewport: IVec4,
    pub context: Option<Arc<GpuContext>>,
    pub debug_flags: DebugFlags,
    /// Framebuffer the scene pass resolves into.
    pub blit_framebuffer: Option<FramebufferPointer>,
    pub view_frustum: ViewFrustum,
    pub display_options: DisplayOptions,
    pub details: RenderDetails,
}

impl RenderArgs {
    pub fn view_frustum(&self) -> &ViewFrustum {
        &self.view_frustum
    }

    /// Viewport covering a surface of the given size.
    pub fn full_viewport(width: u32, height: u32) -> IVec4 {
        IVec4::new(0, 0, width as i32, height as i32)
    }
}
