//! Active display plugin selection.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::{CompletedFrame, DisplayPlugin};
use crate::config::DisplayConfig;
use crate::error::{DisplayError, DisplayResult};

/// Result of asking the active plugin to begin a frame.
pub enum BeginFrame {
    /// No plugin is bound.
    NoPlugin,
    /// The active plugin lost its capability.
    NotReady,
    /// The frame may be rendered and submitted to this plugin.
    Ready(Arc<dyn DisplayPlugin>),
}

/// Gateway over the statically enumerated display plugins.
///
/// Switching takes the write lock while frame submission holds the read
/// lock, so a frame is never submitted to a plugin that is mid-switch.
pub struct DisplayPluginGateway {
    plugins: Vec<Arc<dyn DisplayPlugin>>,
    active: RwLock<Option<Arc<dyn DisplayPlugin>>>,
    preferred: RwLock<Option<String>>,
    switches: AtomicU64,
}

fn same_plugin(a: &Arc<dyn DisplayPlugin>, b: &Arc<dyn DisplayPlugin>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl DisplayPluginGateway {
    /// Creates a gateway with no active plugin.
    pub fn new(plugins: Vec<Arc<dyn DisplayPlugin>>, config: &DisplayConfig) -> Self {
        Self {
            plugins,
            active: RwLock::new(None),
            preferred: RwLock::new(config.preferred_plugin.clone()),
            switches: AtomicU64::new(0),
        }
    }

    pub fn plugins(&self) -> &[Arc<dyn DisplayPlugin>] {
        &self.plugins
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn DisplayPlugin>> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    pub fn active_plugin(&self) -> Option<Arc<dyn DisplayPlugin>> {
        self.active.read().clone()
    }

    pub fn is_bound(&self) -> bool {
        self.active.read().is_some()
    }

    /// Number of plugin switches performed.
    pub fn switch_count(&self) -> u64 {
        self.switches.load(Ordering::Relaxed)
    }

    /// Asks the active plugin whether frame `frame_index` may be rendered.
    pub fn begin_frame_render(&self, frame_index: u64) -> BeginFrame {
        let active = self.active.read();
        match active.as_ref() {
            None => BeginFrame::NoPlugin,
            Some(plugin) if plugin.begin_frame_render(frame_index) => {
                BeginFrame::Ready(Arc::clone(plugin))
            }
            Some(_) => BeginFrame::NotReady,
        }
    }

    /// Submits `frame` to `target` if it is still the active plugin.
    ///
    /// Returns false if the plugin was switched out since the frame began;
    /// the frame is dropped and its framebuffer reclaimed.
    pub fn submit_frame(&self, target: &Arc<dyn DisplayPlugin>, frame: CompletedFrame) -> bool {
        let active = self.active.read();
        match active.as_ref() {
            Some(plugin) if same_plugin(plugin, target) => {
                plugin.submit_frame(frame);
                true
            }
            _ => {
                tracing::warn!(
                    "Dropping frame {}: plugin '{}' is no longer active",
                    frame.frame_index,
                    target.name()
                );
                false
            }
        }
    }

    /// Re-evaluates the display mode.
    ///
    /// Keeps the active plugin if it is still supported and preferred;
    /// otherwise activates the preferred plugin if supported, else the first
    /// supported plugin in list order.
    pub fn update_display_mode(&self) -> DisplayResult<Arc<dyn DisplayPlugin>> {
        let mut active = self.active.write();
        let candidates = self.candidates();

        if let Some(current) = active.as_ref()
            && current.is_supported()
            && candidates.first().is_some_and(|c| same_plugin(c, current))
        {
            return Ok(Arc::clone(current));
        }

        if let Some(current) = active.take() {
            tracing::info!("Deactivating display plugin '{}'", current.name());
            current.deactivate();
        }

        for candidate in candidates {
            match candidate.activate() {
                Ok(()) => {
                    tracing::info!("Activated display plugin '{}'", candidate.name());
                    *active = Some(Arc::clone(&candidate));
                    self.switches.fetch_add(1, Ordering::Relaxed);
                    return Ok(candidate);
                }
                Err(e) => tracing::warn!("Display plugin '{}' failed: {}", candidate.name(), e),
            }
        }
        Err(DisplayError::NoSupportedPlugin)
    }

    /// Makes the named plugin active and preferred.
    ///
    /// The current plugin stays bound if the named one fails to activate.
    pub fn set_display_plugin(&self, name: &str) -> DisplayResult<()> {
        let plugin = Arc::clone(
            self.find(name)
                .ok_or_else(|| DisplayError::UnknownPlugin(name.to_string()))?,
        );
        if !plugin.is_supported() {
            return Err(DisplayError::ActivationFailed(format!("'{name}' is not supported")));
        }

        let mut active = self.active.write();
        if let Some(current) = active.as_ref()
            && same_plugin(current, &plugin)
        {
            *self.preferred.write() = Some(name.to_string());
            return Ok(());
        }

        if let Err(e) = plugin.activate() {
            tracing::warn!("Display plugin '{}' failed to activate, keeping current: {}", name, e);
            return Err(e);
        }
        if let Some(previous) = active.replace(plugin) {
            previous.deactivate();
        }
        tracing::info!("Switched display plugin to '{}'", name);
        *self.preferred.write() = Some(name.to_string());
        self.switches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Deactivates and unbinds the active plugin.
    pub fn shutdown(&self) {
        if let Some(current) = self.active.write().take() {
            current.deactivate();
        }
    }

    /// Supported plugins, preferred first, then in list order.
    fn candidates(&self) -> Vec<Arc<dyn DisplayPlugin>> {
        let preferred = self.preferred.read().clone();
        let mut candidates: Vec<Arc<dyn DisplayPlugin>> = Vec::new();
        if let Some(p) = preferred.as_deref().and_then(|name| self.find(name))
            && p.is_supported()
        {
            candidates.push(Arc::clone(p));
        }
        for plugin in &self.plugins {
            if plugin.is_supported() && !candidates.iter().any(|c| same_plugin(c, plugin)) {
                candidates.push(Arc::clone(plugin));
            }
        }
        candidates
    }
}
