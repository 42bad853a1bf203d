pub mod router;

pub use router::{Gesture, InteractionRouter};

use arwm_scene::PanelId;
use glam::{Vec2, Vec3};

/// A change requested by the interaction router.
///
/// Commands are collected while hit-testing the registry and applied by the
/// caller afterwards, so the registry is never mutated mid-iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Move a panel to a new world position (drag).
    Move { panel: PanelId, position: Vec3 },
    /// Resize a panel (clamping happens at the panel).
    Resize { panel: PanelId, size: Vec2 },
    /// Change a panel's distance from the viewer by a signed delta.
    DepthScroll { panel: PanelId, delta: f32 },
    /// Close and deregister a panel.
    Close { panel: PanelId },
    /// Forward an activation at a content pixel into a panel.
    ContentClick { panel: PanelId, x: u32, y: u32 },
}
