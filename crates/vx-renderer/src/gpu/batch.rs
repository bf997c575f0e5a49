//! Command batches.

use glam::{IVec4, Mat4, UVec2, Vec3, Vec4};

use super::FramebufferId;

/// Shader program a batch binds before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    /// Flat-colored lines and shapes.
    Simple,
    /// Screen-aligned HUD geometry.
    Hud,
    /// Lit scene geometry.
    Shaded,
}

/// A line segment with endpoints in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Vec3,
    pub end: Vec3,
}

impl LineSegment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }
}

/// A single recorded GPU command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Reset pipeline stages (framebuffer, transforms, pipeline) to defaults.
    ResetStages,
    SetViewportTransform(IVec4),
    SetViewTransform(Mat4),
    SetProjectionTransform(Mat4),
    SetModelTransform(Mat4),
    BindProgram(Program),
    Draw { label: String, vertex_count: u32 },
    DrawLines { lines: Vec<LineSegment>, color: Vec4 },
    /// Resolve the batch's output into the target framebuffer.
    Blit { target: FramebufferId, size: UVec2 },
}

/// An ordered list of commands recorded for later execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    name: String,
    commands: Vec<Command>,
}

impl Batch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns true if any command matches the predicate.
    pub fn contains(&self, predicate: impl Fn(&Command) -> bool) -> bool {
        self.commands.iter().any(predicate)
    }

    pub fn reset_stages(&mut self) {
        self.commands.push(Command::ResetStages);
    }

    pub fn set_viewport_transform(&mut self, viewport: IVec4) {
        self.commands.push(Command::SetViewportTransform(viewport));
    }

    pub fn set_view_transform(&mut self, view: Mat4) {
        self.commands.push(Command::SetViewTransform(view));
    }

    pub fn set_projection_transform(&mut self, projection: Mat4) {
        self.commands.push(Command::SetProjectionTransform(projection));
    }

    pub fn set_model_transform(&mut self, model: Mat4) {
        self.commands.push(Command::SetModelTransform(model));
    }

    pub fn bind_program(&mut self, program: Program) {
        self.commands.push(Command::BindProgram(program));
    }

    pub fn draw(&mut self, label: impl Into<String>, vertex_count: u32) {
        self.commands.push(Command::Draw {
            label: label.into(),
            vertex_count,
        });
    }

    pub fn draw_lines(&mut self, lines: Vec<LineSegment>, color: Vec4) {
        if lines.is_empty() {
            return;
        }
        self.commands.push(Command::DrawLines { lines, color });
    }

    pub fn blit(&mut self, target: FramebufferId, size: UVec2) {
        self.commands.push(Command::Blit { target, size });
    }
}
