use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Panel chrome geometry and backing-surface resolution.
    pub style: PanelStyle,
    /// Gesture thresholds and depth limits.
    pub interact: InteractConfig,
    /// Spawn placement relative to the viewer.
    pub spawn: SpawnConfig,
    /// Browser-automation task endpoint.
    pub tasks: TaskConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelStyle {
    /// Backing-surface resolution for rendered content, in pixels.
    pub content_resolution: (u32, u32),
    /// Content area size in world meters (title bar sits above this).
    #[serde(with = "vec2_serde")]
    pub panel_size: Vec2,
    /// Title bar height in world meters.
    pub title_bar_height: f32,
    /// Minimum panel size floor; resize can never go below this.
    #[serde(with = "vec2_serde")]
    pub min_panel_size: Vec2,
    /// Width of the close sub-rectangle as a fraction of the title bar,
    /// measured from the right edge. Single source of truth for the
    /// close-button hit region.
    pub close_button_fraction: f32,
    /// Side length of the corner resize handle as a fraction of panel width.
    pub resize_handle_fraction: f32,
    /// Width of the depth-scroll strip along the left edge as a fraction of
    /// panel width.
    pub scroll_strip_fraction: f32,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self {
            content_resolution: (512, 256),
            panel_size: Vec2::new(2.0, 1.0),
            title_bar_height: 0.25,
            min_panel_size: Vec2::new(0.3, 0.2),
            close_button_fraction: 0.15,
            resize_handle_fraction: 0.12,
            scroll_strip_fraction: 0.08,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractConfig {
    /// Closest a panel may be depth-scrolled to the viewer (meters).
    pub min_depth: f32,
    /// Farthest a panel may be depth-scrolled from the viewer (meters).
    pub max_depth: f32,
    /// Depth change per unit of vertical pointer-ray movement.
    pub scroll_speed: f32,
    /// A press longer than this is never a content click.
    pub click_max_ms: u64,
    /// Cumulative pointer-ray drift above which a press is not a click.
    pub click_max_drift: f32,
    /// Whether panels turn to face the viewer each frame.
    pub billboard: bool,
    /// Whether the panel currently being dragged keeps billboarding.
    /// Off by default so rotation does not fight the drag.
    pub billboard_while_dragging: bool,
}

impl Default for InteractConfig {
    fn default() -> Self {
        Self {
            min_depth: 1.0,
            max_depth: 8.0,
            scroll_speed: 2.0,
            click_max_ms: 300,
            click_max_drift: 0.02,
            billboard: true,
            billboard_while_dragging: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Distance from the viewer at which new panels appear (meters).
    pub distance: f32,
    /// Angular step between spawn slots (degrees); slots alternate
    /// left/right in increasing tiers.
    pub angle_step_deg: f32,
    /// Maximum fan tier; further spawns reuse the outermost slots.
    pub max_tier: u32,
    /// Fixed drop below eye height (meters).
    pub vertical_drop: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            distance: 3.0,
            angle_step_deg: 25.0,
            max_tier: 3,
            vertical_drop: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Base URL of the browser-automation service.
    pub endpoint: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000".to_string(),
        }
    }
}

// Serde helper for glam Vec2: a cleaner TOML representation as an array.

mod vec2_serde {
    use glam::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vec2, s: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec2, D::Error> {
        let [x, y] = <[f32; 2]>::deserialize(d)?;
        Ok(Vec2::new(x, y))
    }
}
