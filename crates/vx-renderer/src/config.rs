//! Renderer configuration.

use serde::{Deserialize, Serialize};

use crate::display_options::DisplayOptions;

/// Display plugin selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Name of the plugin to activate when it is supported.
    pub preferred_plugin: Option<String>,
}

/// Frame timing statistics and warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Number of recent ticks kept for timing statistics.
    pub window: usize,
    /// Scene passes slower than this are reported when pipeline warnings are on.
    pub slow_frame_warning_ms: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            window: 120,
            slow_frame_warning_ms: 11.0,
        }
    }
}

/// Complete renderer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub display: DisplayConfig,
    pub options: DisplayOptions,
    pub timing: TimingConfig,
}
