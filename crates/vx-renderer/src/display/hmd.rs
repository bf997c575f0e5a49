//! Head-mounted display plugin.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, TrySendError};
use parking_lot::Mutex;

use super::{CompletedFrame, DisplayPlugin};
use crate::error::{DisplayError, DisplayResult};

/// Frames queued for the presentation thread before new ones are dropped.
const PRESENT_QUEUE_DEPTH: usize = 2;

/// Connection state of the headset.
#[derive(Debug)]
pub struct HmdLink {
    connected: AtomicBool,
}

impl HmdLink {
    pub fn new(connected: bool) -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(connected),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}

/// Frame index bookkeeping on the presentation side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentationStats {
    pub presented: u64,
    /// Indices skipped between consecutive presented frames.
    pub dropped: u64,
    /// Frames that arrived with an index not above the last presented.
    pub out_of_order: u64,
    /// Frames discarded because the presentation queue was full.
    pub queue_overflow: u64,
    pub last_index: Option<u64>,
}

impl PresentationStats {
    fn record(&mut self, frame_index: u64) {
        match self.last_index {
            Some(last) if frame_index <= last => {
                self.out_of_order += 1;
                return;
            }
            Some(last) => self.dropped += frame_index - last - 1,
            None => {}
        }
        self.last_index = Some(frame_index);
        self.presented += 1;
    }
}

struct Presenter {
    sender: Sender<CompletedFrame>,
    thread: JoinHandle<()>,
}

/// Stereo presentation to a headset through a dedicated presentation thread.
pub struct HmdDisplayPlugin {
    name: String,
    link: Arc<HmdLink>,
    presenter: Mutex<Option<Presenter>>,
    stats: Arc<Mutex<PresentationStats>>,
}

impl HmdDisplayPlugin {
    pub const NAME: &'static str = "HMD";

    pub fn new(link: Arc<HmdLink>) -> Self {
        Self {
            name: Self::NAME.to_string(),
            link,
            presenter: Mutex::new(None),
            stats: Arc::new(Mutex::new(PresentationStats::default())),
        }
    }

    pub fn link(&self) -> &Arc<HmdLink> {
        &self.link
    }

    pub fn stats(&self) -> PresentationStats {
        *self.stats.lock()
    }

    pub fn is_active(&self) -> bool {
        self.presenter.lock().is_some()
    }
}

impl DisplayPlugin for HmdDisplayPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_supported(&self) -> bool {
        self.link.is_connected()
    }

    fn is_stereo(&self) -> bool {
        true
    }

    fn is_hmd(&self) -> bool {
        true
    }

    fn activate(&self) -> DisplayResult<()> {
        if !self.link.is_connected() {
            return Err(DisplayError::ActivationFailed("headset not connected".to_string()));
        }
        let mut presenter = self.presenter.lock();
        if presenter.is_some() {
            return Ok(());
        }

        let (sender, receiver) = crossbeam_channel::bounded::<CompletedFrame>(PRESENT_QUEUE_DEPTH);
        let stats = Arc::clone(&self.stats);
        let thread = std::thread::Builder::new()
            .name("hmd-present".to_string())
            .spawn(move || {
                for frame in receiver.iter() {
                    stats.lock().record(frame.frame_index);
                    frame.reclaim();
                }
                tracing::debug!("HMD presentation thread exiting");
            })
            .map_err(|e| DisplayError::ActivationFailed(e.to_string()))?;

        *presenter = Some(Presenter { sender, thread });
        Ok(())
    }

    fn deactivate(&self) {
        let Some(Presenter { sender, thread }) = self.presenter.lock().take() else {
            return;
        };
        drop(sender);
        if thread.join().is_err() {
            tracing::error!("HMD presentation thread panicked");
        }
    }

    fn begin_frame_render(&self, _frame_index: u64) -> bool {
        self.link.is_connected() && self.presenter.lock().is_some()
    }

    fn submit_frame(&self, frame: CompletedFrame) {
        let presenter = self.presenter.lock();
        let Some(presenter) = presenter.as_ref() else {
            return;
        };
        match presenter.sender.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(frame)) => {
                tracing::debug!("HMD queue full, dropping frame {}", frame.frame_index);
                self.stats.lock().queue_overflow += 1;
            }
            Err(TrySendError::Disconnected(frame)) => {
                tracing::warn!("HMD presentation thread gone, dropping frame {}", frame.frame_index);
            }
        }
    }
}

impl Drop for HmdDisplayPlugin {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use glam::UVec2;

    use super::*;
    use crate::framebuffer_cache::FramebufferCache;
    use crate::gpu::{Batch, Frame};

    fn frame(cache: &Arc<FramebufferCache>, index: u64) -> CompletedFrame {
        let pool = Arc::clone(cache);
        CompletedFrame::new(
            index,
            Frame::default(),
            cache.get_framebuffer(),
            Box::new(move |fb| pool.release_framebuffer(fb)),
            None,
            Batch::new("postComposite"),
        )
    }

    #[test]
    fn test_activation_requires_headset() {
        let link = HmdLink::new(false);
        let plugin = HmdDisplayPlugin::new(link.clone());
        assert!(!plugin.is_supported());
        assert!(plugin.activate().is_err());

        link.set_connected(true);
        plugin.activate().unwrap();
        assert!(plugin.begin_frame_render(1));

        link.set_connected(false);
        assert!(!plugin.begin_frame_render(2));
    }

    #[test]
    fn test_presentation_thread_reclaims_frames() {
        let cache = FramebufferCache::shared(UVec2::new(16, 16), wgpu::TextureFormat::Rgba8Unorm);
        let plugin = HmdDisplayPlugin::new(HmdLink::new(true));
        plugin.activate().unwrap();

        for index in 1..=3 {
            let f = frame(&cache, index);
            // Blocking send keeps the test deterministic.
            let sender = plugin.presenter.lock().as_ref().unwrap().sender.clone();
            sender.send(f).unwrap();
        }
        plugin.deactivate();

        let stats = plugin.stats();
        assert_eq!(stats.presented, 3);
        assert_eq!(stats.dropped, 0);
        assert_eq!(stats.last_index, Some(3));
        assert!(cache.pooled_count() >= 1);
        assert!(!plugin.is_active());
    }

    #[test]
    fn test_stats_detect_gaps_and_reordering() {
        let mut stats = PresentationStats::default();
        stats.record(1);
        stats.record(4);
        stats.record(3);
        assert_eq!(stats.presented, 2);
        assert_eq!(stats.dropped, 2);
        assert_eq!(stats.out_of_order, 1);
    }
}
