//! Desktop monitor display plugin.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use super::{CompletedFrame, DisplayPlugin};
use crate::error::DisplayResult;

/// Mono presentation to a desktop window.
///
/// The most recent frame stays on screen until a newer one replaces it; the
/// replaced frame's framebuffer is reclaimed at that point.
pub struct DesktopDisplayPlugin {
    name: String,
    active: AtomicBool,
    current: Mutex<Option<CompletedFrame>>,
    presented: AtomicU64,
    submitted: AtomicU64,
}

impl DesktopDisplayPlugin {
    pub const NAME: &'static str = "Desktop";

    pub fn new() -> Self {
        Self {
            name: Self::NAME.to_string(),
            active: AtomicBool::new(false),
            current: Mutex::new(None),
            presented: AtomicU64::new(0),
            submitted: AtomicU64::new(0),
        }
    }

    /// Presents the current frame (e.g. on vsync). Returns its index.
    pub fn present(&self) -> Option<u64> {
        let index = self.current.lock().as_ref().map(|f| f.frame_index)?;
        self.presented.fetch_add(1, Ordering::Relaxed);
        Some(index)
    }

    /// Index of the frame currently on screen.
    pub fn displayed_frame_index(&self) -> Option<u64> {
        self.current.lock().as_ref().map(|f| f.frame_index)
    }

    pub fn presented_count(&self) -> u64 {
        self.presented.load(Ordering::Relaxed)
    }

    pub fn submitted_count(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }
}

impl Default for DesktopDisplayPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPlugin for DesktopDisplayPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn is_stereo(&self) -> bool {
        false
    }

    fn activate(&self) -> DisplayResult<()> {
        self.active.store(true, Ordering::Release);
        Ok(())
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
        let displayed = self.current.lock().take();
        drop(displayed);
    }

    fn begin_frame_render(&self, _frame_index: u64) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn submit_frame(&self, frame: CompletedFrame) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        let replaced = self.current.lock().replace(frame);
        if let Some(previous) = replaced {
            previous.reclaim();
        }
    }
}
