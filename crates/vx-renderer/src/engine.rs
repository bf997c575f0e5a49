//! Scene render engine contract and the default item engine.

use glam::{Vec3, Vec4};
use vx_core::Bound;

use crate::error::{EngineError, EngineResult};
use crate::gpu::{Batch, LineSegment, Program};
use crate::render_args::{DebugFlags, ItemCounts, RenderArgs, RenderDetails};
use crate::scene::{ItemLayer, Scene};

/// Executes the scene pass for one frame.
///
/// The engine owns culling, sorting and draw submission. Failures propagate
/// to the frame compositor as fatal.
pub trait RenderEngine: Send {
    fn run(&mut self, scene: &Scene, args: &mut RenderArgs) -> EngineResult<()>;
}

/// Renders every visible scene item layer by layer into a single batch and
/// resolves it into the render args' blit framebuffer.
#[derive(Debug, Default)]
pub struct ItemRenderEngine {
    runs: u64,
}

impl ItemRenderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed runs.
    pub fn runs(&self) -> u64 {
        self.runs
    }
}

const BOUNDS_COLOR: Vec4 = Vec4::new(1.0, 1.0, 0.0, 1.0);

impl RenderEngine for ItemRenderEngine {
    fn run(&mut self, scene: &Scene, args: &mut RenderArgs) -> EngineResult<()> {
        let context = args.context.clone().ok_or(EngineError::NoContext)?;
        let frame_args: &RenderArgs = args;

        let details = context.do_in_batch("scene", |batch| {
            let mut details = RenderDetails::default();
            batch.set_viewport_transform(frame_args.viewport);
            batch.set_projection_transform(frame_args.view_frustum.projection);
            batch.set_view_transform(frame_args.view_frustum.view());

            for layer in ItemLayer::ORDERED {
                let counts = match layer {
                    ItemLayer::Opaque => &mut details.opaque,
                    ItemLayer::Transparent => &mut details.transparent,
                    ItemLayer::Overlay => &mut details.overlay,
                };
                render_layer(scene, layer, frame_args, batch, counts);
            }

            if let Some(target) = &frame_args.blit_framebuffer {
                batch.blit(target.id(), target.size());
            }
            details.batches = 1;
            details
        })?;

        args.details = details;
        self.runs += 1;
        Ok(())
    }
}

fn render_layer(
    scene: &Scene,
    layer: ItemLayer,
    args: &RenderArgs,
    batch: &mut Batch,
    counts: &mut ItemCounts,
) {
    let draw_bounds = args.debug_flags.contains(DebugFlags::BOUNDS);
    scene.for_each_item(|_, payload| {
        let key = payload.key();
        if key.layer != layer {
            return;
        }
        counts.considered += 1;
        if !key.visible {
            counts.culled += 1;
            return;
        }
        payload.render(args, batch);
        counts.rendered += 1;

        if draw_bounds {
            let bound = payload.bound();
            if !bound.is_empty() {
                batch.bind_program(Program::Simple);
                batch.draw_lines(box_outline(&bound), BOUNDS_COLOR);
            }
        }
    });
}

/// The twelve edges of a box.
pub fn box_outline(bound: &Bound) -> Vec<LineSegment> {
    let (lo, hi) = (bound.min, bound.max);
    let corner = |i: u32| {
        Vec3::new(
            if i & 1 == 0 { lo.x } else { hi.x },
            if i & 2 == 0 { lo.y } else { hi.y },
            if i & 4 == 0 { lo.z } else { hi.z },
        )
    };
    let mut lines = Vec::with_capacity(12);
    for i in 0..8u32 {
        for bit in [1u32, 2, 4] {
            if i & bit == 0 {
                lines.push(LineSegment::new(corner(i), corner(i | bit)));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::{Mat4, UVec2};

    use super::*;
    use crate::gpu::{Command, Framebuffer, FramebufferId, GpuContext};
    use crate::scene::{ItemKey, Payload, Transaction};

    struct Shape {
        key: ItemKey,
        label: &'static str,
    }

    impl Payload for Shape {
        fn key(&self) -> ItemKey {
            self.key
        }

        fn bound(&self) -> Bound {
            Bound::from_center(Vec3::ZERO, 0.5)
        }

        fn render(&self, _args: &RenderArgs, batch: &mut Batch) {
            batch.draw(self.label, 3);
        }
    }

    fn scene_with(shapes: Vec<Shape>) -> Scene {
        let scene = Scene::new();
        let mut txn = Transaction::new();
        for shape in shapes {
            txn.reset_item(scene.allocate_id(), shape);
        }
        scene.enqueue_transaction(txn);
        scene.process_transaction_queue();
        scene
    }

    fn draw_labels(batch: &Batch) -> Vec<String> {
        batch
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Draw { label, .. } => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_layers_render_in_order_and_hidden_items_are_culled() {
        let scene = scene_with(vec![
            Shape { key: ItemKey::overlay(), label: "hud" },
            Shape { key: ItemKey::transparent_shape(), label: "glass" },
            Shape { key: ItemKey::opaque_shape(), label: "wall" },
            Shape { key: ItemKey::opaque_shape().with_visible(false), label: "hidden" },
        ]);
        let context = Arc::new(GpuContext::new());
        context.begin_frame(Mat4::IDENTITY).unwrap();

        let mut args = RenderArgs {
            context: Some(context.clone()),
            ..Default::default()
        };
        let mut engine = ItemRenderEngine::new();
        engine.run(&scene, &mut args).unwrap();

        let frame = context.end_frame().unwrap();
        let batch = frame.batch("scene").unwrap();
        assert_eq!(draw_labels(batch), vec!["wall", "glass", "hud"]);
        assert_eq!(args.details.opaque.considered, 2);
        assert_eq!(args.details.opaque.culled, 1);
        assert_eq!(args.details.rendered(), 3);
        assert_eq!(engine.runs(), 1);
    }

    #[test]
    fn test_blit_into_target_framebuffer() {
        let scene = Scene::new();
        let context = Arc::new(GpuContext::new());
        context.begin_frame(Mat4::IDENTITY).unwrap();
        let target = Arc::new(Framebuffer::new(
            FramebufferId(3),
            UVec2::new(320, 200),
            wgpu::TextureFormat::Rgba8Unorm,
        ));
        let mut args = RenderArgs {
            context: Some(context.clone()),
            blit_framebuffer: Some(target),
            ..Default::default()
        };
        ItemRenderEngine::new().run(&scene, &mut args).unwrap();

        let frame = context.end_frame().unwrap();
        let batch = frame.batch("scene").unwrap();
        assert_eq!(
            batch.commands().last(),
            Some(&Command::Blit {
                target: FramebufferId(3),
                size: UVec2::new(320, 200)
            })
        );
    }

    #[test]
    fn test_bounds_flag_draws_outlines() {
        let scene = scene_with(vec![Shape { key: ItemKey::opaque_shape(), label: "crate" }]);
        let context = Arc::new(GpuContext::new());
        context.begin_frame(Mat4::IDENTITY).unwrap();
        let mut args = RenderArgs {
            context: Some(context.clone()),
            debug_flags: DebugFlags::BOUNDS,
            ..Default::default()
        };
        ItemRenderEngine::new().run(&scene, &mut args).unwrap();

        let frame = context.end_frame().unwrap();
        let batch = frame.batch("scene").unwrap();
        assert!(batch.contains(|c| matches!(c, Command::DrawLines { lines, .. } if lines.len() == 12)));
    }

    #[test]
    fn test_missing_context_is_an_error() {
        let scene = Scene::new();
        let mut args = RenderArgs::default();
        let result = ItemRenderEngine::new().run(&scene, &mut args);
        assert!(matches!(result, Err(EngineError::NoContext)));
    }
}
