//! Completed frames handed to display plugins.

use std::fmt;

use crate::gpu::{Batch, Frame, FramebufferPointer, TextureHandle};

/// Returns a framebuffer to its pool once it is no longer displayed.
pub type FramebufferRecycler = Box<dyn FnOnce(FramebufferPointer) + Send>;

/// A fully rendered frame ready for presentation.
///
/// The framebuffer goes back to its pool only through the recycler, either
/// by an explicit [`CompletedFrame::reclaim`] or when the frame is dropped.
pub struct CompletedFrame {
    pub frame_index: u64,
    /// Commands recorded into the GPU context for this frame.
    pub gpu_frame: Frame,
    /// 2D overlay texture rendered before the scene pass.
    pub overlay: Option<TextureHandle>,
    /// HUD content composited after the scene.
    pub post_composite_batch: Batch,
    framebuffer: Option<FramebufferPointer>,
    recycler: Option<FramebufferRecycler>,
}

impl CompletedFrame {
    pub fn new(
        frame_index: u64,
        gpu_frame: Frame,
        framebuffer: FramebufferPointer,
        recycler: FramebufferRecycler,
        overlay: Option<TextureHandle>,
        post_composite_batch: Batch,
    ) -> Self {
        Self {
            frame_index,
            gpu_frame,
            overlay,
            post_composite_batch,
            framebuffer: Some(framebuffer),
            recycler: Some(recycler),
        }
    }

    /// The framebuffer holding the resolved scene, until reclaimed.
    pub fn framebuffer(&self) -> Option<&FramebufferPointer> {
        self.framebuffer.as_ref()
    }

    /// Returns true if any part of the frame installed stereo transforms.
    pub fn installs_stereo(&self) -> bool {
        self.gpu_frame.installs_stereo()
    }

    /// Hands the framebuffer back to its pool.
    pub fn reclaim(mut self) {
        self.recycle();
    }

    fn recycle(&mut self) {
        if let (Some(framebuffer), Some(recycler)) = (self.framebuffer.take(), self.recycler.take()) {
            recycler(framebuffer);
        }
    }
}

impl Drop for CompletedFrame {
    fn drop(&mut self) {
        self.recycle();
    }
}

impl fmt::Debug for CompletedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletedFrame")
            .field("frame_index", &self.frame_index)
            .field("framebuffer", &self.framebuffer.as_ref().map(|fb| fb.id()))
            .field("overlay", &self.overlay)
            .field("batches", &self.gpu_frame.batches.len())
            .field("post_composite", &self.post_composite_batch.len())
            .finish()
    }
}
