//! Client shell wiring the simulation and the render loop together.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use glam::UVec2;
use thiserror::Error;
use vx_renderer::{
    ApplicationOverlay, CompositorParts, DesktopDisplayPlugin, DisplayError, DisplayPlugin,
    DisplayPluginGateway, FrameCompositor, FrameError, FrameOutcome, FrameStateBuffer, FrameStats,
    FrameStatsSink, FramebufferCache, GpuContext, HmdDisplayPlugin, HmdLink, HudOverlayRegistry,
    ItemRenderEngine, Scene,
};
use vx_renderer::overlay::ReticleOverlay;

use crate::config::{ConfigError, SharedConfig};
use crate::simulation::Simulation;

/// Consecutive fatal frame failures tolerated before the loop gives up.
const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Errors that end the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("Frame failed: {0}")]
    Frame(#[from] FrameError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tick counts of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub submitted: u64,
    pub skipped: u64,
    pub failed: u64,
}

pub struct App {
    config: SharedConfig,
    compositor: FrameCompositor,
    frame_state: Arc<FrameStateBuffer>,
    scene: Arc<Scene>,
    stats: Arc<FrameStats>,
    desktop: Arc<DesktopDisplayPlugin>,
    hmd: Arc<HmdDisplayPlugin>,
    stereo: Arc<AtomicBool>,
}

impl App {
    pub fn new(config: SharedConfig) -> Result<Self, AppError> {
        let app_config = config.read().config().clone();
        let client = &app_config.client;
        let renderer = app_config.renderer.clone();

        let size = UVec2::new(client.window_width, client.window_height);
        let framebuffers = FramebufferCache::shared(size, wgpu::TextureFormat::Rgba8UnormSrgb);

        let desktop = Arc::new(DesktopDisplayPlugin::new());
        let hmd = Arc::new(HmdDisplayPlugin::new(HmdLink::new(client.hmd_connected)));
        let plugins: Vec<Arc<dyn DisplayPlugin>> = vec![
            Arc::clone(&hmd) as Arc<dyn DisplayPlugin>,
            Arc::clone(&desktop) as Arc<dyn DisplayPlugin>,
        ];
        let display = Arc::new(DisplayPluginGateway::new(plugins, &renderer.display));
        let active = display.update_display_mode()?;
        tracing::info!("Display plugin '{}' active", active.name());

        let stats = Arc::new(FrameStats::new(renderer.timing.window));
        let frame_state = Arc::new(FrameStateBuffer::default());
        let scene = Arc::new(Scene::new());

        let mut hud = HudOverlayRegistry::new();
        hud.register(ReticleOverlay::default());

        let compositor = FrameCompositor::new(CompositorParts {
            gpu: Arc::new(GpuContext::new()),
            scene: Arc::clone(&scene),
            frame_state: Arc::clone(&frame_state),
            framebuffers,
            display,
            stats: Arc::clone(&stats) as Arc<dyn FrameStatsSink>,
            engine: Box::new(ItemRenderEngine::new()),
            overlay: Box::new(ApplicationOverlay::new()),
            hud,
            config: renderer,
        });

        Ok(Self {
            config,
            compositor,
            frame_state,
            scene,
            stats,
            desktop,
            hmd,
            stereo: Arc::new(AtomicBool::new(active.is_stereo())),
        })
    }

    pub fn compositor(&self) -> &FrameCompositor {
        &self.compositor
    }

    pub fn stats(&self) -> &Arc<FrameStats> {
        &self.stats
    }

    pub fn desktop(&self) -> &Arc<DesktopDisplayPlugin> {
        &self.desktop
    }

    pub fn hmd(&self) -> &Arc<HmdDisplayPlugin> {
        &self.hmd
    }

    /// Runs the render loop until the frame limit is reached or quit is
    /// requested, then shuts the display down and saves the configuration.
    pub fn run(&mut self) -> Result<RunSummary, AppError> {
        let client = self.config.read().config().client.clone();
        let frame_interval = match client.target_fps {
            0 => Duration::ZERO,
            fps => Duration::from_secs_f64(1.0 / fps as f64),
        };

        let shutdown = Arc::new(AtomicBool::new(false));
        let simulation = Simulation::new(
            Arc::clone(&self.frame_state),
            Arc::clone(&self.scene),
            Arc::clone(&self.stereo),
            &client,
        );
        let simulation = simulation.spawn(Arc::clone(&shutdown))?;

        let result = self.render_loop(client.frame_limit, frame_interval);

        shutdown.store(true, Ordering::Release);
        match simulation.join() {
            Ok(steps) => tracing::debug!("Simulation ran {} steps", steps),
            Err(_) => tracing::error!("Simulation thread panicked"),
        }
        self.compositor.request_quit();
        self.compositor.display().shutdown();
        self.config.write().save()?;

        let summary = result?;
        tracing::info!(
            "Render loop finished: {} submitted, {} skipped, {} failed",
            summary.submitted,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    fn render_loop(
        &self,
        frame_limit: Option<u64>,
        frame_interval: Duration,
    ) -> Result<RunSummary, AppError> {
        let mut summary = RunSummary::default();
        let mut consecutive_failures = 0;
        let mut ticks = 0u64;

        while frame_limit.is_none_or(|limit| ticks < limit) && !self.compositor.is_quitting() {
            let tick_start = Instant::now();
            ticks += 1;

            match self.compositor.render_frame() {
                Ok(FrameOutcome::Submitted(report)) => {
                    summary.submitted += 1;
                    consecutive_failures = 0;
                    self.desktop.present();
                    if report.frame_index % 100 == 0 {
                        self.log_stats();
                    }
                }
                Ok(FrameOutcome::Skipped(reason)) => {
                    summary.skipped += 1;
                    tracing::debug!("Tick skipped: {:?}", reason);
                }
                Err(e) => {
                    summary.failed += 1;
                    consecutive_failures += 1;
                    tracing::error!("Frame failed: {}", e);
                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        return Err(e.into());
                    }
                    self.compositor
                        .display()
                        .set_display_plugin(DesktopDisplayPlugin::NAME)?;
                }
            }

            let stereo = self
                .compositor
                .display()
                .active_plugin()
                .is_some_and(|p| p.is_stereo());
            self.stereo.store(stereo, Ordering::Release);

            if let Some(remaining) = frame_interval.checked_sub(tick_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
        Ok(summary)
    }

    fn log_stats(&self) {
        let timings = self.stats.timings();
        tracing::info!(
            "{:.1} fps, frame time {:.0} us mean / {} us max / {:.0} us sd",
            self.stats.frame_rate(),
            timings.mean_us(),
            timings.max_us(),
            timings.std_dev_us()
        );
    }
}
