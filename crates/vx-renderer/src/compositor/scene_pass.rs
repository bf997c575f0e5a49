//! The scene render pass.

use std::time::{Duration, Instant};

use crate::config::TimingConfig;
use crate::display_options::DebugFlagPolicy;
use crate::engine::RenderEngine;
use crate::error::EngineResult;
use crate::render_args::{DebugFlags, RenderArgs};
use crate::scene::{ItemId, Scene, SingletonItem, Transaction};
use crate::world_axes::WorldAxesPayload;

/// Prepares the scene for a frame and drives the render engine.
#[derive(Debug)]
pub struct ScenePass {
    world_axes: SingletonItem,
    slow_frame_warning: Duration,
}

impl ScenePass {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            world_axes: SingletonItem::new(),
            slow_frame_warning: Duration::from_secs_f32(timing.slow_frame_warning_ms.max(0.0) / 1000.0),
        }
    }

    /// ID of the world-axes item, invalid until the first pass.
    pub fn world_axes_id(&self) -> ItemId {
        self.world_axes.id()
    }

    /// Runs one scene pass.
    ///
    /// Every transaction enqueued before this call is applied before the
    /// engine runs. Transactions enqueued by the engine itself are picked up
    /// by the next pass.
    pub fn run_render_frame(
        &mut self,
        scene: &Scene,
        engine: &mut dyn RenderEngine,
        args: &mut RenderArgs,
    ) -> EngineResult<()> {
        let compose_flags = match args.display_options.debug_flag_policy {
            DebugFlagPolicy::Always => true,
            DebugFlagPolicy::WhenEntitiesRendered => scene.should_render_entities(),
        };
        if compose_flags {
            args.debug_flags = DebugFlags::from_options(&args.display_options);
        }

        let mut transaction = Transaction::new();
        if self
            .world_axes
            .ensure(scene, &mut transaction, WorldAxesPayload::default)
        {
            tracing::debug!("Created world axes item {:?}", self.world_axes.id());
        }
        scene.enqueue_transaction(transaction);
        let applied = scene.process_transaction_queue();
        tracing::trace!("Applied {} scene transactions", applied);

        let start = Instant::now();
        engine.run(scene, args)?;
        let elapsed = start.elapsed();

        if args.display_options.pipeline_warnings && elapsed > self.slow_frame_warning {
            tracing::warn!(
                "Scene pass took {:.2} ms (budget {:.2} ms)",
                elapsed.as_secs_f64() * 1000.0,
                self.slow_frame_warning.as_secs_f64() * 1000.0
            );
        }
        Ok(())
    }
}
