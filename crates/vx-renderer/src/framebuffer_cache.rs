//! Pool of render-target framebuffers sized to the output surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::UVec2;
use parking_lot::{Mutex, RwLock};

use crate::gpu::{Framebuffer, FramebufferId, FramebufferPointer};

/// Maximum number of idle framebuffers kept for reuse.
pub const MAX_POOLED_FRAMEBUFFERS: usize = 4;

/// Supplies and reclaims framebuffers for the frame compositor.
///
/// `get_framebuffer` and `release_framebuffer` may be called concurrently
/// from any thread; display back ends release through the reclaim callback
/// of a submitted frame at an arbitrary later time.
#[derive(Debug)]
pub struct FramebufferCache {
    format: wgpu::TextureFormat,
    size: RwLock<UVec2>,
    pool: Mutex<Vec<FramebufferPointer>>,
    next_id: AtomicU64,
}

impl FramebufferCache {
    pub fn new(size: UVec2, format: wgpu::TextureFormat) -> Self {
        Self {
            format,
            size: RwLock::new(size.max(UVec2::ONE)),
            pool: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a cache wrapped in an `Arc` for sharing with reclaim callbacks.
    pub fn shared(size: UVec2, format: wgpu::TextureFormat) -> Arc<Self> {
        Arc::new(Self::new(size, format))
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Current size of the output surface.
    pub fn frame_buffer_size(&self) -> UVec2 {
        *self.size.read()
    }

    /// Updates the output surface size, discarding pooled framebuffers of the old size.
    pub fn set_frame_buffer_size(&self, size: UVec2) {
        let size = size.max(UVec2::ONE);
        let mut current = self.size.write();
        if *current == size {
            return;
        }
        tracing::debug!("Framebuffer size {:?} -> {:?}", *current, size);
        *current = size;
        self.pool.lock().retain(|fb| fb.size() == size);
    }

    /// Returns a framebuffer of the current size, reusing a pooled one if possible.
    pub fn get_framebuffer(&self) -> FramebufferPointer {
        let size = self.size.read();
        let mut pool = self.pool.lock();
        if let Some(pos) = pool.iter().position(|fb| fb.size() == *size) {
            return pool.swap_remove(pos);
        }
        let id = FramebufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::trace!("Allocating framebuffer {:?} at {:?}", id, *size);
        Arc::new(Framebuffer::new(id, *size, self.format))
    }

    /// Returns a framebuffer to the pool.
    ///
    /// Framebuffers of a stale size, duplicates and overflow beyond
    /// [`MAX_POOLED_FRAMEBUFFERS`] are dropped instead.
    pub fn release_framebuffer(&self, framebuffer: FramebufferPointer) {
        let size = self.size.read();
        if framebuffer.size() != *size {
            return;
        }
        let mut pool = self.pool.lock();
        if pool.iter().any(|fb| fb.id() == framebuffer.id()) {
            tracing::warn!("Framebuffer {:?} released twice", framebuffer.id());
            return;
        }
        if pool.len() < MAX_POOLED_FRAMEBUFFERS {
            pool.push(framebuffer);
        }
    }

    /// Number of idle framebuffers available for reuse.
    pub fn pooled_count(&self) -> usize {
        self.pool.lock().len()
    }

    /// Number of framebuffers allocated since creation.
    pub fn allocation_count(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    #[test]
    fn test_released_framebuffer_is_reused() {
        let cache = FramebufferCache::new(UVec2::new(800, 600), FORMAT);
        let fb = cache.get_framebuffer();
        let id = fb.id();
        cache.release_framebuffer(fb);
        assert_eq!(cache.pooled_count(), 1);

        let again = cache.get_framebuffer();
        assert_eq!(again.id(), id);
        assert_eq!(cache.allocation_count(), 1);
    }

    #[test]
    fn test_resize_purges_stale_framebuffers() {
        let cache = FramebufferCache::new(UVec2::new(800, 600), FORMAT);
        let old = cache.get_framebuffer();
        cache.release_framebuffer(old.clone());
        cache.set_frame_buffer_size(UVec2::new(1024, 768));
        assert_eq!(cache.pooled_count(), 0);

        // A late release of an old-size framebuffer is dropped.
        cache.release_framebuffer(old);
        assert_eq!(cache.pooled_count(), 0);

        let fb = cache.get_framebuffer();
        assert_eq!(fb.size(), UVec2::new(1024, 768));
    }

    #[test]
    fn test_double_release_is_ignored() {
        let cache = FramebufferCache::new(UVec2::new(64, 64), FORMAT);
        let fb = cache.get_framebuffer();
        cache.release_framebuffer(fb.clone());
        cache.release_framebuffer(fb);
        assert_eq!(cache.pooled_count(), 1);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let cache = FramebufferCache::shared(UVec2::new(128, 128), FORMAT);
        std::thread::scope(|s| {
            for _ in 0..4 {
                let cache = Arc::clone(&cache);
                s.spawn(move || {
                    for _ in 0..200 {
                        let fb = cache.get_framebuffer();
                        assert_eq!(fb.size(), UVec2::new(128, 128));
                        cache.release_framebuffer(fb);
                    }
                });
            }
        });
        assert!(cache.pooled_count() <= MAX_POOLED_FRAMEBUFFERS);
        assert!(cache.allocation_count() <= 4 + MAX_POOLED_FRAMEBUFFERS as u64);
    }
}
