use crate::content::{ContentRenderer, ContentSource, EmbeddedHost};
use crate::panel::{AffordanceHit, Panel, PanelOptions};
use crate::viewer::ViewerPose;
use crate::PanelId;
use arwm_config::{AppConfig, SpawnConfig};
use arwm_geometry::Ray;
use glam::{Quat, Vec3};
use tracing::info;

/// Insertion-ordered collection of live panels; the sole owner of panel
/// lifetime. Spawn and destroy are the only mutations, and the interaction
/// router never mutates it mid-iteration: hits are collected first and
/// applied afterwards.
#[derive(Default)]
pub struct PanelRegistry {
    panels: Vec<Panel>,
    next_id: u64,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Panel> {
        self.panels.iter_mut()
    }

    pub fn find(&self, id: PanelId) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id() == id)
    }

    pub fn find_mut(&mut self, id: PanelId) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|p| p.id() == id)
    }

    /// Spawn a panel in front of the viewer and begin populating it.
    /// The panel is registered before this returns.
    pub fn spawn(
        &mut self,
        source: ContentSource,
        options: PanelOptions,
        viewer: &ViewerPose,
        config: &AppConfig,
        renderer: &dyn ContentRenderer,
        host: &dyn EmbeddedHost,
    ) -> PanelId {
        let (position, rotation) = self.spawn_transform(viewer, &config.spawn);
        self.spawn_at(source, options, position, rotation, config, renderer, host)
    }

    /// Spawn at an explicit transform (host shells that place panels
    /// themselves, and tests).
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_at(
        &mut self,
        source: ContentSource,
        options: PanelOptions,
        position: Vec3,
        rotation: Quat,
        config: &AppConfig,
        renderer: &dyn ContentRenderer,
        host: &dyn EmbeddedHost,
    ) -> PanelId {
        let id = PanelId::new(self.next_id);
        self.next_id += 1;

        let mut panel = Panel::new(id, position, rotation, options, &config.style);
        panel.set_content(source, renderer, host, &config.style);
        info!(%id, title = %panel.title, "panel spawned");
        self.panels.push(panel);
        id
    }

    /// Placement for the Nth concurrently-open panel: a fixed distance along
    /// the viewer's gaze flattened to the horizon, fanned out left/right in
    /// alternating angular steps so consecutive panels do not overlap, and
    /// dropped slightly below eye height.
    fn spawn_transform(&self, viewer: &ViewerPose, spawn: &SpawnConfig) -> (Vec3, Quat) {
        let mut forward = viewer.forward();
        forward.y = 0.0;
        let forward = if forward.length_squared() < 1e-6 {
            // Viewer looking straight up or down; fall back to world -Z.
            Vec3::NEG_Z
        } else {
            forward.normalize()
        };

        let angle = fan_angle(self.panels.len() as u32, spawn);
        let dir = Quat::from_rotation_y(angle) * forward;
        let position =
            viewer.position + dir * spawn.distance - Vec3::Y * spawn.vertical_drop;
        let rotation = Quat::from_rotation_arc(Vec3::Z, (viewer.position - position).normalize());
        (position, rotation)
    }

    /// Destroy and deregister a panel. Returns false if the id is unknown.
    pub fn remove(&mut self, id: PanelId, renderer: &dyn ContentRenderer) -> bool {
        let Some(index) = self.panels.iter().position(|p| p.id() == id) else {
            return false;
        };
        self.panels[index].destroy(renderer);
        self.panels.remove(index);
        true
    }

    /// Destroy every panel and clear the registry (host-scene teardown).
    pub fn destroy_all(&mut self, renderer: &dyn ContentRenderer) {
        for panel in &mut self.panels {
            panel.destroy(renderer);
        }
        info!(count = self.panels.len(), "all panels destroyed");
        self.panels.clear();
    }

    /// Closest affordance hit across all panels.
    pub fn hit_test(
        &self,
        ray: &Ray,
        style: &arwm_config::PanelStyle,
    ) -> Option<(PanelId, AffordanceHit)> {
        let mut closest: Option<(PanelId, AffordanceHit)> = None;
        for panel in &self.panels {
            if let Some(hit) = panel.hit_test(ray, style) {
                let nearer = closest
                    .as_ref()
                    .map_or(true, |(_, best)| hit.distance < best.distance);
                if nearer {
                    closest = Some((panel.id(), hit));
                }
            }
        }
        closest
    }
}

/// Angular offset for the Nth spawn slot: 0, +step, -step, +2*step, ...
/// capped at `max_tier` steps to either side.
fn fan_angle(n: u32, spawn: &SpawnConfig) -> f32 {
    if n == 0 {
        return 0.0;
    }
    let tier = n.div_ceil(2).min(spawn.max_tier);
    let sign = if n % 2 == 1 { 1.0 } else { -1.0 };
    sign * tier as f32 * spawn.angle_step_deg.to_radians()
}
