//! Command-recording GPU context.
//!
//! The context records batches into the frame currently in flight and keeps
//! the per-frame stage and stereo state. A completed [`Frame`] is handed to a
//! display plugin, which owns its execution.

mod batch;
mod framebuffer;

pub use batch::*;
pub use framebuffer::*;

use glam::{IVec4, Mat4};
use parking_lot::Mutex;
use vx_core::EyeTransforms;

use crate::error::{GpuError, GpuResult};

/// Stereo configuration of the context.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StereoState {
    pub enabled: bool,
    pub projections: EyeTransforms,
    pub views: EyeTransforms,
}

/// Pipeline stage state as left by the last executed batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageState {
    pub viewport: IVec4,
    pub view: Mat4,
    pub projection: Mat4,
    pub model: Mat4,
    pub program: Option<Program>,
}

impl Default for StageState {
    fn default() -> Self {
        Self {
            viewport: IVec4::ZERO,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            program: None,
        }
    }
}

impl StageState {
    fn apply(&mut self, command: &Command) {
        match command {
            Command::ResetStages => *self = StageState::default(),
            Command::SetViewportTransform(viewport) => self.viewport = *viewport,
            Command::SetViewTransform(view) => self.view = *view,
            Command::SetProjectionTransform(projection) => self.projection = *projection,
            Command::SetModelTransform(model) => self.model = *model,
            Command::BindProgram(program) => self.program = Some(*program),
            Command::Draw { .. } | Command::DrawLines { .. } | Command::Blit { .. } => {}
        }
    }
}

/// Context-level state changes recorded while a frame is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextCommand {
    EnableStereo(bool),
    SetStereoProjections([Mat4; 2]),
    SetStereoViews([Mat4; 2]),
}

/// Everything recorded between `begin_frame` and `end_frame`.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Head pose the frame was started with, used for pose prediction.
    pub pose: Mat4,
    pub batches: Vec<Batch>,
    pub context_commands: Vec<ContextCommand>,
}

impl Frame {
    /// Returns true if the frame installed stereo projection or view transforms.
    pub fn installs_stereo(&self) -> bool {
        self.context_commands.iter().any(|c| {
            matches!(
                c,
                ContextCommand::SetStereoProjections(_) | ContextCommand::SetStereoViews(_)
            )
        })
    }

    /// Finds a recorded batch by name.
    pub fn batch(&self, name: &str) -> Option<&Batch> {
        self.batches.iter().find(|b| b.name() == name)
    }
}

#[derive(Debug, Default)]
struct ContextState {
    frame: Option<Frame>,
    stereo: StereoState,
    stages: StageState,
    frames_completed: u64,
}

impl ContextState {
    fn record(&mut self, command: ContextCommand) {
        if let Some(frame) = self.frame.as_mut() {
            frame.context_commands.push(command);
        }
    }
}

/// GPU command context shared by the passes of a frame.
#[derive(Debug, Default)]
pub struct GpuContext {
    state: Mutex<ContextState>,
}

impl GpuContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts recording a frame tagged with the given head pose.
    pub fn begin_frame(&self, pose: Mat4) -> GpuResult<()> {
        let mut state = self.state.lock();
        if state.frame.is_some() {
            return Err(GpuError::FrameAlreadyInProgress);
        }
        state.frame = Some(Frame {
            pose,
            ..Default::default()
        });
        Ok(())
    }

    /// Finishes the frame in flight and returns its recording.
    pub fn end_frame(&self) -> GpuResult<Frame> {
        let mut state = self.state.lock();
        let frame = state.frame.take().ok_or(GpuError::NoFrameInProgress)?;
        state.frames_completed += 1;
        Ok(frame)
    }

    /// Drops the frame in flight, if any. Returns true if one was dropped.
    pub fn abandon_frame(&self) -> bool {
        self.state.lock().frame.take().is_some()
    }

    pub fn is_frame_in_progress(&self) -> bool {
        self.state.lock().frame.is_some()
    }

    /// Number of frames ended so far.
    pub fn frames_completed(&self) -> u64 {
        self.state.lock().frames_completed
    }

    /// Records a batch through `f` and flushes it into the frame on return.
    pub fn do_in_batch<R>(
        &self,
        name: impl Into<String>,
        f: impl FnOnce(&mut Batch) -> R,
    ) -> GpuResult<R> {
        let mut batch = Batch::new(name);
        let result = f(&mut batch);
        self.submit_batch(batch)?;
        Ok(result)
    }

    /// Executes a batch against the stage state and appends it to the frame.
    pub fn submit_batch(&self, batch: Batch) -> GpuResult<()> {
        let mut state = self.state.lock();
        let ContextState { frame, stages, .. } = &mut *state;
        let frame = frame.as_mut().ok_or(GpuError::NoFrameInProgress)?;
        for command in batch.commands() {
            stages.apply(command);
        }
        frame.batches.push(batch);
        Ok(())
    }

    pub fn stage_state(&self) -> StageState {
        self.state.lock().stages
    }

    pub fn enable_stereo(&self, enabled: bool) {
        let mut state = self.state.lock();
        if state.stereo.enabled != enabled {
            state.stereo.enabled = enabled;
            state.record(ContextCommand::EnableStereo(enabled));
        }
    }

    pub fn is_stereo(&self) -> bool {
        self.state.lock().stereo.enabled
    }

    pub fn stereo_state(&self) -> StereoState {
        self.state.lock().stereo
    }

    pub fn set_stereo_projections(&self, projections: EyeTransforms) {
        let mut state = self.state.lock();
        state.stereo.projections = projections;
        state.record(ContextCommand::SetStereoProjections(projections.to_array()));
    }

    pub fn set_stereo_views(&self, views: EyeTransforms) {
        let mut state = self.state.lock();
        state.stereo.views = views;
        state.record(ContextCommand::SetStereoViews(views.to_array()));
    }
}
