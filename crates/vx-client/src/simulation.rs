//! Simulation context writing frame snapshots and scene edits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use glam::{Mat4, Quat, Vec3, Vec4};
use parking_lot::Mutex;
use vx_core::{Bound, Eye, EyeTransforms, Pose, ViewFrustum, for_each_eye};
use vx_renderer::gpu::{Batch, Program};
use vx_renderer::{FrameSnapshot, FrameStateBuffer, ItemId, ItemKey, Payload, RenderArgs, Scene, Transaction};

use crate::config::ClientConfig;

const FOV_Y: f32 = 1.5;
const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;
const HEAD_HEIGHT: f32 = 1.6;
const ORBIT_RADIUS: f32 = 3.0;

/// A cube that drifts around the origin.
#[derive(Debug, Clone)]
pub struct AvatarPayload {
    pub position: Vec3,
    pub color: Vec4,
}

impl Default for AvatarPayload {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.5, 0.0),
            color: Vec4::new(0.2, 0.6, 1.0, 1.0),
        }
    }
}

impl Payload for AvatarPayload {
    fn key(&self) -> ItemKey {
        ItemKey::opaque_shape()
    }

    fn bound(&self) -> Bound {
        Bound::from_center(self.position, 0.25)
    }

    fn render(&self, _args: &RenderArgs, batch: &mut Batch) {
        batch.bind_program(Program::Shaded);
        batch.set_model_transform(Mat4::from_translation(self.position));
        batch.draw("avatar", 36);
    }
}

/// Head pose orbiting the origin at time `t`, looking at the origin.
pub fn orbit_pose(t: f32) -> Mat4 {
    let yaw = t * 0.25;
    let position = Vec3::new(yaw.sin() * ORBIT_RADIUS, HEAD_HEIGHT, yaw.cos() * ORBIT_RADIUS);
    Mat4::from_rotation_translation(Quat::from_rotation_y(yaw), position)
}

/// Clears the queued flag once its update has run or been discarded.
struct QueuedUpdate(Arc<AtomicBool>);

impl Drop for QueuedUpdate {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Writes one snapshot per step and moves the avatar.
///
/// At most one avatar update is pending at a time. Steps taken while one is
/// queued only move the target it will apply.
pub struct Simulation {
    frame_state: Arc<FrameStateBuffer>,
    scene: Arc<Scene>,
    stereo: Arc<AtomicBool>,
    avatar: ItemId,
    avatar_target: Arc<Mutex<Vec3>>,
    update_queued: Arc<AtomicBool>,
    ipd: f32,
    aspect: f32,
    interval: Duration,
    steps: u64,
}

impl Simulation {
    /// Creates the simulation and enqueues the avatar item.
    pub fn new(
        frame_state: Arc<FrameStateBuffer>,
        scene: Arc<Scene>,
        stereo: Arc<AtomicBool>,
        config: &ClientConfig,
    ) -> Self {
        let avatar = scene.allocate_id();
        let mut transaction = Transaction::new();
        transaction.reset_item(avatar, AvatarPayload::default());
        scene.enqueue_transaction(transaction);

        Self {
            frame_state,
            scene,
            stereo,
            avatar,
            avatar_target: Arc::new(Mutex::new(AvatarPayload::default().position)),
            update_queued: Arc::new(AtomicBool::new(false)),
            ipd: config.ipd,
            aspect: config.window_width.max(1) as f32 / config.window_height.max(1) as f32,
            interval: Duration::from_secs_f64(1.0 / config.simulation_hz.max(1) as f64),
            steps: 0,
        }
    }

    pub fn avatar_id(&self) -> ItemId {
        self.avatar
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advances the simulation to time `t` seconds.
    pub fn step(&mut self, t: f32) {
        let head_pose = orbit_pose(t);
        let is_stereo = self.stereo.load(Ordering::Acquire);

        let mut eye_offsets = EyeTransforms::IDENTITY;
        let mut eye_projections = EyeTransforms::IDENTITY;
        for_each_eye(|eye: Eye| {
            eye_offsets.set(eye, Pose::eye_offset(self.ipd, eye));
            eye_projections.set(eye, Mat4::perspective_rh(FOV_Y, self.aspect * 0.5, NEAR, FAR));
        });

        self.frame_state.write(FrameSnapshot {
            render_args: RenderArgs {
                view_frustum: ViewFrustum::new(head_pose, FOV_Y, self.aspect, NEAR, FAR),
                ..Default::default()
            },
            head_pose,
            eye_to_world: head_pose,
            sensor_to_world: Mat4::IDENTITY,
            sensor_to_world_scale: 1.0,
            is_stereo,
            eye_offsets,
            eye_projections,
        });

        *self.avatar_target.lock() = Vec3::new((t * 0.5).cos(), 0.5 + (t * 2.0).sin() * 0.1, (t * 0.5).sin());
        if !self.update_queued.swap(true, Ordering::AcqRel) {
            let target = Arc::clone(&self.avatar_target);
            let queued = QueuedUpdate(Arc::clone(&self.update_queued));
            let mut transaction = Transaction::new();
            transaction.update_item(self.avatar, move |avatar: &mut AvatarPayload| {
                drop(queued);
                avatar.position = *target.lock();
            });
            self.scene.enqueue_transaction(transaction);
        }
        self.steps += 1;
    }

    /// Runs the simulation on its own thread until `shutdown` is set.
    /// The thread returns the number of steps taken.
    pub fn spawn(mut self, shutdown: Arc<AtomicBool>) -> std::io::Result<JoinHandle<u64>> {
        std::thread::Builder::new()
            .name("simulation".to_string())
            .spawn(move || {
                let start = Instant::now();
                while !shutdown.load(Ordering::Acquire) {
                    self.step(start.elapsed().as_secs_f32());
                    std::thread::sleep(self.interval);
                }
                tracing::debug!("Simulation stopped after {} steps", self.steps);
                self.steps
            })
    }
}
