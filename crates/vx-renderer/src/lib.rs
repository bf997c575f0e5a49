//! VX Client Renderer
//!
//! Per-frame render orchestration: snapshot capture, scene transactions,
//! the scene pass and hand-off to a display back end.
//!
//! # Architecture
//!
//! - [`frame_state::FrameStateBuffer`] - Latest camera/pose snapshot written by the simulation
//! - [`scene::Scene`] - Scene items and the transaction queue drained once per tick
//! - [`compositor::FrameCompositor`] - Per-frame state machine
//! - [`display::DisplayPluginGateway`] - Active display back end selection
//! - [`framebuffer_cache::FramebufferCache`] - Pooled render targets
//! - [`gpu::GpuContext`] - Command-recording GPU context
//!
//! # Example
//!
//! ```ignore
//! use vx_renderer::{CompositorParts, FrameCompositor, FrameOutcome};
//!
//! let compositor = FrameCompositor::new(parts);
//! match compositor.render_frame()? {
//!     FrameOutcome::Submitted(report) => println!("frame {}", report.frame_index),
//!     FrameOutcome::Skipped(reason) => println!("skipped: {:?}", reason),
//! }
//! ```

// Frame orchestration
pub mod compositor;
pub mod display;
pub mod frame_state;
pub mod framebuffer_cache;

// Scene and passes
pub mod engine;
pub mod overlay;
pub mod render_args;
pub mod scene;
pub mod world_axes;

// Support
pub mod config;
pub mod display_options;
pub mod error;
pub mod gpu;
pub mod stats;

// Re-exports for convenience
pub use compositor::{
    CompositorParts, FrameCompositor, FrameOutcome, FrameReport, FrameState, SkipReason,
};
pub use config::{DisplayConfig, RendererConfig, TimingConfig};
pub use display::{
    CompletedFrame, DesktopDisplayPlugin, DisplayPlugin, DisplayPluginGateway, HmdDisplayPlugin,
    HmdLink, PresentationStats,
};
pub use display_options::{DebugFlagPolicy, DisplayOptions};
pub use engine::{ItemRenderEngine, RenderEngine};
pub use error::{DisplayError, EngineError, FrameError, GpuError};
pub use frame_state::{FrameSnapshot, FrameStateBuffer};
pub use framebuffer_cache::FramebufferCache;
pub use gpu::GpuContext;
pub use overlay::{ApplicationOverlay, HudOverlay, HudOverlayRegistry, OverlayRenderer};
pub use render_args::{DebugFlags, RenderArgs, RenderDetails};
pub use scene::{ItemId, ItemKey, ItemLayer, Payload, Scene, SingletonItem, Transaction};
pub use stats::{FrameStats, FrameStatsSink, FrameTimings, RateCounter};
pub use world_axes::WorldAxesPayload;
