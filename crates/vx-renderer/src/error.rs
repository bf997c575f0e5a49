//! Error types for the renderer.

use thiserror::Error;

/// Errors raised by the GPU command context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GpuError {
    #[error("A frame is already being recorded")]
    FrameAlreadyInProgress,

    #[error("No frame is being recorded")]
    NoFrameInProgress,
}

/// Result type for GPU context operations
pub type GpuResult<T> = Result<T, GpuError>;

/// Errors raised by a render engine run.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Render args carry no GPU context")]
    NoContext,

    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    #[error("Render engine failed: {0}")]
    Failed(String),
}

/// Result type for render engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Fatal errors surfaced by a frame tick.
///
/// A frame that fails after the GPU context reset cannot be partially
/// recovered; the owning shell decides whether to terminate or fall back
/// to another display mode.
#[derive(Debug, Clone, Error)]
pub enum FrameError {
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    #[error("Scene pass failed: {0}")]
    Engine(#[from] EngineError),
}

/// Result type for frame ticks
pub type FrameResult<T> = Result<T, FrameError>;

/// Errors raised while selecting or activating a display plugin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("Unknown display plugin: {0}")]
    UnknownPlugin(String),

    #[error("No supported display plugin is available")]
    NoSupportedPlugin,

    #[error("Display plugin activation failed: {0}")]
    ActivationFailed(String),
}

/// Result type for display plugin operations
pub type DisplayResult<T> = Result<T, DisplayError>;
