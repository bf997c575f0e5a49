//! Display options for controlling what the scene pass draws.

use serde::{Deserialize, Serialize};

/// When render debug flags are composed from the display options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DebugFlagPolicy {
    /// Compose debug flags every frame.
    Always,
    /// Compose debug flags only while the scene renders entities; otherwise
    /// the flags carried by the snapshot are left untouched.
    #[default]
    WhenEntitiesRendered,
}

/// Display options for controlling visibility of rendering elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Whether the world axes indicator is drawn.
    pub show_world_axes: bool,
    /// Whether physics collision hulls are visualized.
    pub physics_show_hulls: bool,
    /// Whether locally owned physics objects are highlighted.
    pub physics_show_owned: bool,
    /// Whether item bounding boxes are drawn.
    pub show_item_bounds: bool,
    /// Whether slow scene passes are reported.
    pub pipeline_warnings: bool,
    /// When debug flags are applied.
    pub debug_flag_policy: DebugFlagPolicy,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_world_axes: true,
            physics_show_hulls: false,
            physics_show_owned: false,
            show_item_bounds: false,
            pipeline_warnings: false,
            debug_flag_policy: DebugFlagPolicy::default(),
        }
    }
}

impl DisplayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get whether the world axes are visible.
    pub fn show_world_axes(&self) -> bool {
        self.show_world_axes
    }

    /// Set whether the world axes are visible.
    pub fn set_show_world_axes(&mut self, show: bool) {
        self.show_world_axes = show;
    }

    /// Get whether collision hulls are visualized.
    pub fn physics_show_hulls(&self) -> bool {
        self.physics_show_hulls
    }

    /// Set whether collision hulls are visualized.
    pub fn set_physics_show_hulls(&mut self, show: bool) {
        self.physics_show_hulls = show;
    }

    /// Get whether pipeline warnings are enabled.
    pub fn pipeline_warnings(&self) -> bool {
        self.pipeline_warnings
    }

    /// Set whether pipeline warnings are enabled.
    pub fn set_pipeline_warnings(&mut self, enabled: bool) {
        self.pipeline_warnings = enabled;
    }
}
