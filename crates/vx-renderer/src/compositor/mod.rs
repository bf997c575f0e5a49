//! Per-frame state machine driving capture, rendering and submission.
//!
//! One call to [`FrameCompositor::render_frame`] is one tick:
//!
//! ```text
//! Idle -> Capturing -> ContextReset -> OverlayPass -> ScenePass
//!      -> PostCompositePass -> Submitted -> Idle
//! ```
//!
//! A tick either skips before any GPU-visible work or runs to submission.
//! Skips are reported as [`FrameOutcome::Skipped`]; engine and GPU failures
//! surface as [`FrameError`] and are left to the application shell.

mod scene_pass;

pub use scene_pass::ScenePass;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use glam::UVec2;
use parking_lot::{Mutex, RwLock};

use crate::config::RendererConfig;
use crate::display::{BeginFrame, CompletedFrame, DisplayPlugin, DisplayPluginGateway};
use crate::display_options::DisplayOptions;
use crate::engine::RenderEngine;
use crate::error::FrameResult;
use crate::frame_state::FrameStateBuffer;
use crate::framebuffer_cache::FramebufferCache;
use crate::gpu::{Batch, GpuContext};
use crate::overlay::{HudOverlayRegistry, OverlayRenderer};
use crate::render_args::{RenderArgs, RenderDetails};
use crate::scene::Scene;
use crate::stats::FrameStatsSink;

/// Name of the batch carrying HUD content composited after the scene.
pub const POST_COMPOSITE_BATCH: &str = "postComposite";

/// Minimum spacing of display re-binding attempts while no plugin is bound.
const REBIND_INTERVAL: Duration = Duration::from_secs(1);

/// Stage of the tick currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameState {
    Idle = 0,
    Capturing,
    ContextReset,
    OverlayPass,
    ScenePass,
    PostCompositePass,
    Submitted,
}

impl FrameState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => FrameState::Capturing,
            2 => FrameState::ContextReset,
            3 => FrameState::OverlayPass,
            4 => FrameState::ScenePass,
            5 => FrameState::PostCompositePass,
            6 => FrameState::Submitted,
            _ => FrameState::Idle,
        }
    }
}

/// Why a tick was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A tick was already in flight.
    Reentrant,
    Minimized,
    ShuttingDown,
    /// No display plugin is bound.
    NoDisplayPlugin,
    /// The active plugin refused the frame; a display-mode re-evaluation
    /// was requested.
    DisplayNotReady,
}

/// Summary of a submitted tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub framebuffer_size: UVec2,
    pub duration: Duration,
    pub stereo: bool,
    /// False if the plugin was switched out before the frame reached it.
    pub delivered: bool,
    pub details: RenderDetails,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Submitted(FrameReport),
    Skipped(SkipReason),
}

impl FrameOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, FrameOutcome::Submitted(_))
    }

    pub fn report(&self) -> Option<&FrameReport> {
        match self {
            FrameOutcome::Submitted(report) => Some(report),
            FrameOutcome::Skipped(_) => None,
        }
    }
}

/// Collaborators of a [`FrameCompositor`].
pub struct CompositorParts {
    pub gpu: Arc<GpuContext>,
    pub scene: Arc<Scene>,
    pub frame_state: Arc<FrameStateBuffer>,
    pub framebuffers: Arc<FramebufferCache>,
    pub display: Arc<DisplayPluginGateway>,
    pub stats: Arc<dyn FrameStatsSink>,
    pub engine: Box<dyn RenderEngine>,
    pub overlay: Box<dyn OverlayRenderer>,
    pub hud: HudOverlayRegistry,
    pub config: RendererConfig,
}

/// Passes used only by the tick holding the state machine.
struct Passes {
    engine: Box<dyn RenderEngine>,
    overlay: Box<dyn OverlayRenderer>,
    hud: HudOverlayRegistry,
    scene: ScenePass,
}

/// Drives one frame at a time from snapshot capture to display submission.
pub struct FrameCompositor {
    gpu: Arc<GpuContext>,
    scene: Arc<Scene>,
    frame_state: Arc<FrameStateBuffer>,
    framebuffers: Arc<FramebufferCache>,
    display: Arc<DisplayPluginGateway>,
    stats: Arc<dyn FrameStatsSink>,
    passes: Mutex<Passes>,
    options: RwLock<DisplayOptions>,
    device_size: RwLock<UVec2>,
    state: AtomicU8,
    frame_counter: AtomicU64,
    minimized: AtomicBool,
    about_to_quit: AtomicBool,
    last_render: Mutex<Option<Instant>>,
    last_rebind: Mutex<Option<Instant>>,
}

/// Holds the state machine for one tick and returns it to `Idle` on exit.
///
/// If the tick ends early through an error, the open GPU frame is dropped
/// and stereo is switched off so nothing leaks into the next tick.
struct TickGuard<'a> {
    compositor: &'a FrameCompositor,
}

impl<'a> TickGuard<'a> {
    fn enter(compositor: &'a FrameCompositor) -> Option<Self> {
        compositor
            .state
            .compare_exchange(
                FrameState::Idle as u8,
                FrameState::Capturing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| {
                tracing::trace!("Frame state: Capturing");
                Self { compositor }
            })
    }

    fn advance(&self, state: FrameState) {
        self.compositor.state.store(state as u8, Ordering::Release);
        tracing::trace!("Frame state: {:?}", state);
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        let compositor = self.compositor;
        if compositor.gpu.abandon_frame() {
            tracing::warn!("Abandoned GPU frame of a failed tick");
        }
        compositor.gpu.enable_stereo(false);
        compositor.state.store(FrameState::Idle as u8, Ordering::Release);
        tracing::trace!("Frame state: Idle");
    }
}

impl FrameCompositor {
    pub fn new(parts: CompositorParts) -> Self {
        let CompositorParts {
            gpu,
            scene,
            frame_state,
            framebuffers,
            display,
            stats,
            engine,
            overlay,
            hud,
            config,
        } = parts;
        let device_size = framebuffers.frame_buffer_size();
        Self {
            gpu,
            scene,
            frame_state,
            framebuffers,
            display,
            stats,
            passes: Mutex::new(Passes {
                engine,
                overlay,
                hud,
                scene: ScenePass::new(&config.timing),
            }),
            options: RwLock::new(config.options),
            device_size: RwLock::new(device_size),
            state: AtomicU8::new(FrameState::Idle as u8),
            frame_counter: AtomicU64::new(0),
            minimized: AtomicBool::new(false),
            about_to_quit: AtomicBool::new(false),
            last_render: Mutex::new(None),
            last_rebind: Mutex::new(None),
        }
    }

    pub fn state(&self) -> FrameState {
        FrameState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Frame indices handed out so far, skipped ticks included.
    pub fn frame_count(&self) -> u64 {
        self.frame_counter.load(Ordering::Acquire)
    }

    /// Time since the last tick started, or `None` before the first tick.
    pub fn time_since_last_render(&self) -> Option<Duration> {
        self.last_render.lock().map(|at| at.elapsed())
    }

    pub fn set_minimized(&self, minimized: bool) {
        self.minimized.store(minimized, Ordering::Release);
    }

    /// Makes every following tick skip.
    pub fn request_quit(&self) {
        self.about_to_quit.store(true, Ordering::Release);
    }

    pub fn is_quitting(&self) -> bool {
        self.about_to_quit.load(Ordering::Acquire)
    }

    /// Resizes the output surface. The next tick's overlay and framebuffer
    /// use the new size.
    pub fn set_device_size(&self, size: UVec2) {
        *self.device_size.write() = size.max(UVec2::ONE);
        self.framebuffers.set_frame_buffer_size(size);
    }

    pub fn device_size(&self) -> UVec2 {
        *self.device_size.read()
    }

    pub fn display_options(&self) -> DisplayOptions {
        self.options.read().clone()
    }

    pub fn set_display_options(&self, options: DisplayOptions) {
        *self.options.write() = options;
    }

    /// Runs `f` against the HUD overlay registry.
    pub fn with_hud<R>(&self, f: impl FnOnce(&mut HudOverlayRegistry) -> R) -> R {
        f(&mut self.passes.lock().hud)
    }

    pub fn gpu(&self) -> &Arc<GpuContext> {
        &self.gpu
    }

    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    pub fn display(&self) -> &Arc<DisplayPluginGateway> {
        &self.display
    }

    pub fn framebuffers(&self) -> &Arc<FramebufferCache> {
        &self.framebuffers
    }

    /// Asks the gateway to bind a plugin, at most once per [`REBIND_INTERVAL`].
    fn try_rebind_display(&self, now: Instant) {
        {
            let mut last = self.last_rebind.lock();
            let previous = *last;
            if previous.is_some_and(|at| now.saturating_duration_since(at) < REBIND_INTERVAL) {
                return;
            }
            *last = Some(now);
        }
        match self.display.update_display_mode() {
            Ok(plugin) => tracing::info!("Bound display plugin '{}'", plugin.name()),
            Err(e) => tracing::debug!("No display plugin to bind: {}", e),
        }
    }

    /// Runs one tick.
    pub fn render_frame(&self) -> FrameResult<FrameOutcome> {
        if self.about_to_quit.load(Ordering::Acquire) {
            return Ok(FrameOutcome::Skipped(SkipReason::ShuttingDown));
        }
        if self.minimized.load(Ordering::Acquire) {
            return Ok(FrameOutcome::Skipped(SkipReason::Minimized));
        }
        let Some(guard) = TickGuard::enter(self) else {
            tracing::debug!("Tick requested while a frame is in flight");
            return Ok(FrameOutcome::Skipped(SkipReason::Reentrant));
        };

        let start = Instant::now();
        *self.last_render.lock() = Some(start);
        let frame_index = self.frame_counter.fetch_add(1, Ordering::AcqRel) + 1;

        let target = match self.display.begin_frame_render(frame_index) {
            BeginFrame::Ready(plugin) => plugin,
            BeginFrame::NoPlugin => {
                tracing::debug!("Frame {} skipped: no display plugin", frame_index);
                self.try_rebind_display(start);
                return Ok(FrameOutcome::Skipped(SkipReason::NoDisplayPlugin));
            }
            BeginFrame::NotReady => {
                tracing::warn!("Display plugin not ready for frame {}, re-evaluating display mode", frame_index);
                if let Err(e) = self.display.update_display_mode() {
                    tracing::warn!("Display mode re-evaluation failed: {}", e);
                }
                return Ok(FrameOutcome::Skipped(SkipReason::DisplayNotReady));
            }
        };

        let snapshot = self.frame_state.read();
        let options = self.options.read().clone();
        let mut passes = self.passes.lock();

        guard.advance(FrameState::ContextReset);
        self.gpu.begin_frame(snapshot.head_pose)?;
        self.gpu.do_in_batch("resetStages", |batch| batch.reset_stages())?;

        guard.advance(FrameState::OverlayPass);
        passes
            .overlay
            .set_frame_info(frame_index, snapshot.eye_to_world, snapshot.sensor_to_world);
        let device_size = *self.device_size.read();
        let overlay_args = RenderArgs {
            viewport: RenderArgs::full_viewport(device_size.x, device_size.y),
            context: Some(Arc::clone(&self.gpu)),
            display_options: options.clone(),
            ..Default::default()
        };
        passes.overlay.render_overlay(&overlay_args)?;
        let overlay_texture = passes.overlay.overlay_texture();

        let framebuffer = self.framebuffers.get_framebuffer();
        let framebuffer_size = framebuffer.size();

        guard.advance(FrameState::ScenePass);
        let mut args = snapshot.render_args;
        args.viewport = RenderArgs::full_viewport(framebuffer_size.x, framebuffer_size.y);
        args.context = Some(Arc::clone(&self.gpu));
        args.blit_framebuffer = Some(Arc::clone(&framebuffer));
        args.display_options = options;

        if snapshot.is_stereo {
            self.gpu.enable_stereo(true);
            self.gpu.set_stereo_projections(snapshot.eye_projections);
            self.gpu.set_stereo_views(snapshot.eye_offsets);
        }
        let Passes {
            engine, scene: scene_pass, hud, ..
        } = &mut *passes;
        scene_pass.run_render_frame(&self.scene, engine.as_mut(), &mut args)?;
        self.gpu.enable_stereo(false);

        guard.advance(FrameState::PostCompositePass);
        let mut post_composite = Batch::new(POST_COMPOSITE_BATCH);
        post_composite.set_viewport_transform(args.viewport);
        post_composite.set_projection_transform(args.view_frustum.projection);
        post_composite.set_view_transform(args.view_frustum.view());
        hud.render_all(&args, &mut post_composite);
        drop(passes);

        let gpu_frame = self.gpu.end_frame()?;
        let pool = Arc::clone(&self.framebuffers);
        let frame = CompletedFrame::new(
            frame_index,
            gpu_frame,
            framebuffer,
            Box::new(move |fb| pool.release_framebuffer(fb)),
            overlay_texture,
            post_composite,
        );

        guard.advance(FrameState::Submitted);
        let delivered = self.display.submit_frame(&target, frame);

        args.blit_framebuffer = None;
        args.context = None;
        self.gpu.enable_stereo(false);

        let details = args.details;
        self.stats.set_render_details(&details);
        self.stats.frame_submitted(frame_index);
        let duration = start.elapsed();
        self.stats.add_frame_timing(duration);
        tracing::debug!(
            "Frame {} submitted to '{}' in {:?} ({} items rendered)",
            frame_index,
            target.name(),
            duration,
            details.rendered()
        );

        drop(guard);
        Ok(FrameOutcome::Submitted(FrameReport {
            frame_index,
            framebuffer_size,
            duration,
            stereo: snapshot.is_stereo,
            delivered,
            details,
        }))
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};
    use vx_core::{Bound, EyeTransforms};

    use super::*;
    use crate::config::DisplayConfig;
    use crate::engine::ItemRenderEngine;
    use crate::error::{DisplayResult, EngineError, EngineResult, FrameError};
    use crate::frame_state::FrameSnapshot;
    use crate::overlay::{ApplicationOverlay, ReticleOverlay};
    use crate::scene::{ItemId, ItemKey, Payload, Transaction};
    use crate::stats::FrameStats;

    #[derive(Debug, Clone, PartialEq)]
    struct FrameRecord {
        index: u64,
        size: UVec2,
        installs_stereo: bool,
        has_overlay: bool,
        post_composite_len: usize,
    }

    struct RecordingPlugin {
        ready: AtomicBool,
        begins: AtomicU64,
        frames: Mutex<Vec<FrameRecord>>,
    }

    impl RecordingPlugin {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                ready: AtomicBool::new(true),
                begins: AtomicU64::new(0),
                frames: Mutex::new(Vec::new()),
            })
        }

        fn indices(&self) -> Vec<u64> {
            self.frames.lock().iter().map(|f| f.index).collect()
        }
    }

    impl DisplayPlugin for RecordingPlugin {
        fn name(&self) -> &str {
            "Recording"
        }

        fn is_supported(&self) -> bool {
            true
        }

        fn is_stereo(&self) -> bool {
            false
        }

        fn activate(&self) -> DisplayResult<()> {
            Ok(())
        }

        fn deactivate(&self) {}

        fn begin_frame_render(&self, _frame_index: u64) -> bool {
            self.begins.fetch_add(1, Ordering::SeqCst);
            self.ready.load(Ordering::SeqCst)
        }

        fn submit_frame(&self, frame: CompletedFrame) {
            let size = frame.framebuffer().map(|fb| fb.size()).unwrap_or(UVec2::ZERO);
            self.frames.lock().push(FrameRecord {
                index: frame.frame_index,
                size,
                installs_stereo: frame.installs_stereo(),
                has_overlay: frame.overlay.is_some(),
                post_composite_len: frame.post_composite_batch.len(),
            });
        }
    }

    struct Marker;

    impl Payload for Marker {
        fn key(&self) -> ItemKey {
            ItemKey::opaque_shape()
        }

        fn bound(&self) -> Bound {
            Bound::from_center(Vec3::ZERO, 0.5)
        }

        fn render(&self, _args: &RenderArgs, batch: &mut Batch) {
            batch.draw("marker", 3);
        }
    }

    /// Records the scene content at each run and enqueues `inject` from
    /// inside the first run.
    struct ProbeEngine {
        seen: Arc<Mutex<Vec<Vec<ItemId>>>>,
        inject: Option<Transaction>,
        fail: bool,
    }

    impl RenderEngine for ProbeEngine {
        fn run(&mut self, scene: &Scene, _args: &mut RenderArgs) -> EngineResult<()> {
            if self.fail {
                return Err(EngineError::Failed("injected failure".to_string()));
            }
            self.seen.lock().push(scene.item_ids());
            if let Some(transaction) = self.inject.take() {
                scene.enqueue_transaction(transaction);
            }
            Ok(())
        }
    }

    struct Harness {
        compositor: FrameCompositor,
        plugin: Arc<RecordingPlugin>,
        stats: Arc<FrameStats>,
        frame_state: Arc<FrameStateBuffer>,
        framebuffers: Arc<FramebufferCache>,
        scene: Arc<Scene>,
        gpu: Arc<GpuContext>,
    }

    fn harness(engine: Box<dyn RenderEngine>, bind_plugin: bool) -> Harness {
        let gpu = Arc::new(GpuContext::new());
        let scene = Arc::new(Scene::new());
        let frame_state = Arc::new(FrameStateBuffer::default());
        let framebuffers =
            FramebufferCache::shared(UVec2::new(800, 600), wgpu::TextureFormat::Rgba8UnormSrgb);
        let plugin = RecordingPlugin::new();
        let display = Arc::new(DisplayPluginGateway::new(
            vec![Arc::clone(&plugin) as Arc<dyn DisplayPlugin>],
            &DisplayConfig::default(),
        ));
        if bind_plugin {
            display.update_display_mode().unwrap();
        }
        let stats = Arc::new(FrameStats::new(16));
        let mut hud = HudOverlayRegistry::new();
        hud.register(ReticleOverlay::default());

        let compositor = FrameCompositor::new(CompositorParts {
            gpu: Arc::clone(&gpu),
            scene: Arc::clone(&scene),
            frame_state: Arc::clone(&frame_state),
            framebuffers: Arc::clone(&framebuffers),
            display,
            stats: Arc::clone(&stats) as Arc<dyn FrameStatsSink>,
            engine,
            overlay: Box::new(ApplicationOverlay::new()),
            hud,
            config: RendererConfig::default(),
        });
        Harness {
            compositor,
            plugin,
            stats,
            frame_state,
            framebuffers,
            scene,
            gpu,
        }
    }

    fn stereo_snapshot() -> FrameSnapshot {
        FrameSnapshot {
            is_stereo: true,
            eye_offsets: EyeTransforms::new(
                Mat4::from_translation(Vec3::new(-0.032, 0.0, 0.0)),
                Mat4::from_translation(Vec3::new(0.032, 0.0, 0.0)),
            ),
            eye_projections: EyeTransforms::new(
                Mat4::perspective_rh(1.5, 0.9, 0.1, 100.0),
                Mat4::perspective_rh(1.5, 0.9, 0.1, 100.0),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_consecutive_ticks_have_gapless_indices() {
        let h = harness(Box::new(ItemRenderEngine::new()), true);
        for _ in 0..5 {
            assert!(h.compositor.render_frame().unwrap().is_submitted());
        }
        assert_eq!(h.plugin.indices(), vec![1, 2, 3, 4, 5]);
        assert_eq!(h.stats.frames_submitted(), 5);
        assert_eq!(h.stats.last_frame_index(), Some(5));
        assert_eq!(h.compositor.state(), FrameState::Idle);
        assert!(h.compositor.time_since_last_render().is_some());
    }

    #[test]
    fn test_not_ready_plugin_skips_without_acquiring() {
        let h = harness(Box::new(ItemRenderEngine::new()), true);
        h.plugin.ready.store(false, Ordering::SeqCst);

        let outcome = h.compositor.render_frame().unwrap();
        assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::DisplayNotReady));
        assert_eq!(h.framebuffers.allocation_count(), 0);
        assert!(h.plugin.frames.lock().is_empty());
        assert!(!h.gpu.is_frame_in_progress());
        assert_eq!(h.gpu.frames_completed(), 0);
        assert_eq!(h.compositor.state(), FrameState::Idle);

        h.plugin.ready.store(true, Ordering::SeqCst);
        let report = h.compositor.render_frame().unwrap();
        assert_eq!(report.report().map(|r| r.frame_index), Some(2));
    }

    #[test]
    fn test_unbound_display_skips_then_rebinds() {
        let h = harness(Box::new(ItemRenderEngine::new()), false);
        let outcome = h.compositor.render_frame().unwrap();
        assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::NoDisplayPlugin));
        assert_eq!(h.plugin.begins.load(Ordering::SeqCst), 0);
        assert_eq!(h.framebuffers.allocation_count(), 0);
        assert!(h.compositor.display().is_bound());

        let outcome = h.compositor.render_frame().unwrap();
        assert_eq!(outcome.report().map(|r| r.frame_index), Some(2));
    }

    #[test]
    fn test_rebind_attempts_are_rate_limited() {
        let h = harness(Box::new(ItemRenderEngine::new()), false);
        let now = Instant::now();
        *h.compositor.last_rebind.lock() = Some(now);

        h.compositor.try_rebind_display(now + Duration::from_millis(10));
        assert!(!h.compositor.display().is_bound());

        h.compositor.try_rebind_display(now + REBIND_INTERVAL);
        assert!(h.compositor.display().is_bound());
    }

    #[test]
    fn test_minimized_and_quitting_skip_before_capture() {
        let h = harness(Box::new(ItemRenderEngine::new()), true);
        h.compositor.set_minimized(true);
        assert_eq!(
            h.compositor.render_frame().unwrap(),
            FrameOutcome::Skipped(SkipReason::Minimized)
        );
        h.compositor.set_minimized(false);
        h.compositor.request_quit();
        assert_eq!(
            h.compositor.render_frame().unwrap(),
            FrameOutcome::Skipped(SkipReason::ShuttingDown)
        );
        assert_eq!(h.compositor.frame_count(), 0);
        assert_eq!(h.plugin.begins.load(Ordering::SeqCst), 0);
        assert!(h.compositor.time_since_last_render().is_none());
    }

    #[test]
    fn test_reentrant_tick_is_refused() {
        let h = harness(Box::new(ItemRenderEngine::new()), true);
        let guard = TickGuard::enter(&h.compositor).unwrap();
        assert_eq!(
            h.compositor.render_frame().unwrap(),
            FrameOutcome::Skipped(SkipReason::Reentrant)
        );
        drop(guard);
        assert!(h.compositor.render_frame().unwrap().is_submitted());
        assert_eq!(h.plugin.indices(), vec![1]);
    }

    #[test]
    fn test_stereo_is_disabled_after_tick() {
        let h = harness(Box::new(ItemRenderEngine::new()), true);
        h.frame_state.write(stereo_snapshot());

        let outcome = h.compositor.render_frame().unwrap();
        assert!(outcome.report().is_some_and(|r| r.stereo));
        assert!(!h.gpu.is_stereo());
        assert!(h.plugin.frames.lock()[0].installs_stereo);
    }

    #[test]
    fn test_mono_frame_installs_no_stereo_transforms() {
        let h = harness(Box::new(ItemRenderEngine::new()), true);
        h.frame_state.write(FrameSnapshot::default());

        h.compositor.render_frame().unwrap();
        let record = h.plugin.frames.lock()[0].clone();
        assert!(!record.installs_stereo);
        assert!(record.has_overlay);
        assert!(record.post_composite_len > 0);
        assert!(!h.gpu.is_stereo());
    }

    #[test]
    fn test_transactions_enqueued_during_pass_wait_for_next_tick() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let engine = ProbeEngine {
            seen: Arc::clone(&seen),
            inject: None,
            fail: false,
        };
        let h = harness(Box::new(engine), true);

        let before = h.scene.allocate_id();
        let mut t = Transaction::new();
        t.reset_item(before, Marker);
        h.scene.enqueue_transaction(t);

        let during = h.scene.allocate_id();
        let mut t_prime = Transaction::new();
        t_prime.reset_item(during, Marker);
        h.compositor.passes.lock().engine = Box::new(ProbeEngine {
            seen: Arc::clone(&seen),
            inject: Some(t_prime),
            fail: false,
        });

        h.compositor.render_frame().unwrap();
        h.compositor.render_frame().unwrap();

        let seen = seen.lock();
        assert!(seen[0].contains(&before));
        assert!(!seen[0].contains(&during));
        assert!(seen[1].contains(&during));
    }

    #[test]
    fn test_framebuffer_follows_resize() {
        let h = harness(Box::new(ItemRenderEngine::new()), true);

        let first = h.compositor.render_frame().unwrap();
        h.compositor.set_device_size(UVec2::new(1024, 768));
        let second = h.compositor.render_frame().unwrap();

        assert_eq!(
            first.report().map(|r| r.framebuffer_size),
            Some(UVec2::new(800, 600))
        );
        assert_eq!(
            second.report().map(|r| r.framebuffer_size),
            Some(UVec2::new(1024, 768))
        );
        let frames = h.plugin.frames.lock();
        assert_eq!(frames[0].size, UVec2::new(800, 600));
        assert_eq!(frames[1].size, UVec2::new(1024, 768));
    }

    #[test]
    fn test_submitted_frames_return_framebuffers() {
        let h = harness(Box::new(ItemRenderEngine::new()), true);
        for _ in 0..3 {
            h.compositor.render_frame().unwrap();
        }
        // The recording plugin drops each frame, reclaiming it immediately.
        assert_eq!(h.framebuffers.allocation_count(), 1);
        assert_eq!(h.framebuffers.pooled_count(), 1);
    }

    #[test]
    fn test_engine_failure_propagates_and_resets() {
        let engine = ProbeEngine {
            seen: Arc::new(Mutex::new(Vec::new())),
            inject: None,
            fail: true,
        };
        let h = harness(Box::new(engine), true);
        h.frame_state.write(stereo_snapshot());

        let result = h.compositor.render_frame();
        assert!(matches!(result, Err(FrameError::Engine(EngineError::Failed(_)))));
        assert_eq!(h.compositor.state(), FrameState::Idle);
        assert!(!h.gpu.is_frame_in_progress());
        assert!(!h.gpu.is_stereo());
        assert!(h.plugin.frames.lock().is_empty());
    }

    #[test]
    fn test_render_details_reach_stats() {
        let h = harness(Box::new(ItemRenderEngine::new()), true);
        h.compositor.render_frame().unwrap();
        // The world axes item is the only scene item.
        assert_eq!(h.stats.render_details().rendered(), 1);
        assert_eq!(h.stats.timings().len(), 1);
    }
}
