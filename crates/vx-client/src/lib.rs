//! VX Client
//!
//! Application shell around the renderer: configuration, the simulation
//! thread and the render loop.

pub mod app;
pub mod config;
pub mod simulation;

pub use app::{App, AppError, RunSummary};
