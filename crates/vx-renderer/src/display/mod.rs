//! Display plugins and the gateway that selects the active one.
//!
//! A display plugin is the presentation back end receiving completed frames.
//! The [`DisplayPluginGateway`] owns the statically enumerated plugin list and
//! the single process-wide active selection.

mod desktop;
mod frame;
mod gateway;
mod hmd;

pub use desktop::DesktopDisplayPlugin;
pub use frame::{CompletedFrame, FramebufferRecycler};
pub use gateway::{BeginFrame, DisplayPluginGateway};
pub use hmd::{HmdDisplayPlugin, HmdLink, PresentationStats};

use crate::error::DisplayResult;

/// A presentation back end.
pub trait DisplayPlugin: Send + Sync {
    /// Returns the unique name of this plugin.
    fn name(&self) -> &str;

    /// Returns true if the underlying device is available.
    fn is_supported(&self) -> bool;

    /// Returns true if this plugin renders one view per eye.
    fn is_stereo(&self) -> bool;

    /// Returns true if this plugin drives a head-mounted display.
    fn is_hmd(&self) -> bool {
        false
    }

    /// Called when the plugin becomes the active one.
    fn activate(&self) -> DisplayResult<()>;

    /// Called when the plugin stops being the active one.
    fn deactivate(&self);

    /// Must be called before any per-frame GPU work.
    ///
    /// Returns false if the plugin lost its capability; the frame must be
    /// skipped and the display mode re-evaluated.
    fn begin_frame_render(&self, frame_index: u64) -> bool;

    /// Takes ownership of a completed frame for presentation.
    ///
    /// Presentation may happen after this call returns.
    fn submit_frame(&self, frame: CompletedFrame);
}
