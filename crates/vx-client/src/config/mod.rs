//! Application configuration module
//!
//! This module handles application-wide configuration: renderer settings and
//! the client shell's loop and window settings.

mod manager;

pub use manager::{ConfigError, ConfigManager, SharedConfig, create_shared_config};

use serde::{Deserialize, Serialize};
use vx_renderer::config::RendererConfig;

/// Current configuration format version
pub const CONFIG_VERSION: u32 = 1;

/// Render loop and window settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Target display rate of the render loop
    pub target_fps: u32,
    /// Stop after this many ticks; runs until interrupted when `None`
    pub frame_limit: Option<u64>,
    /// Rate at which the simulation writes frame snapshots
    pub simulation_hz: u32,
    /// Whether a headset is attached at startup
    pub hmd_connected: bool,
    /// Interpupillary distance in metres
    pub ipd: f32,
    /// Initial window width
    pub window_width: u32,
    /// Initial window height
    pub window_height: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target_fps: 90,
            frame_limit: Some(900),
            simulation_hz: 60,
            hmd_connected: false,
            ipd: 0.064,
            window_width: 1280,
            window_height: 720,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Configuration format version
    #[serde(default)]
    pub version: u32,
    /// Renderer settings
    #[serde(default)]
    pub renderer: RendererConfig,
    /// Client shell settings
    #[serde(default)]
    pub client: ClientConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    /// Create a new configuration with the current version
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            renderer: RendererConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let mut config = AppConfig::new();
        config.client.hmd_connected = true;
        config.renderer.display.preferred_plugin = Some("HMD".to_string());

        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let parsed: AppConfig = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let parsed: AppConfig = ron::from_str("(version: 1)").unwrap();
        assert_eq!(parsed.client, ClientConfig::default());
        assert_eq!(parsed.renderer, RendererConfig::default());
    }
}
