use crate::content::{
    looks_like_document, wrap_fragment, ContentRenderer, ContentSource, EmbeddedHost,
    EmbeddedView, PendingRender, RasterFrame,
};
use crate::PanelId;
use arwm_config::{InteractConfig, PanelStyle};
use arwm_geometry::{intersect_ray_plane, Plane, Ray};
use glam::{Quat, Vec2, Vec3};
use tracing::{debug, warn};

/// Interactive sub-regions of a panel, in hit-test priority order.
///
/// Regions may geometrically overlap near panel edges; the priority order
/// is the deliberate tie-break, not an accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffordanceKind {
    ScrollStrip,
    ResizeHandle,
    CloseButton,
    TitleBar,
    Content,
}

/// Result of testing a pointer ray against a panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffordanceHit {
    pub kind: AffordanceKind,
    /// UV within the hit region (V bottom-up, texture convention).
    pub uv: Vec2,
    /// World-space intersection point.
    pub point: Vec3,
    /// Distance from the ray origin to the hit.
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct PanelOptions {
    pub title: String,
    pub draggable: bool,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            title: "AR Window".to_string(),
            draggable: true,
        }
    }
}

enum Surface {
    Empty,
    Raster(RasterFrame),
    /// Fixed error raster after a renderer failure; panel stays alive.
    Error(RasterFrame),
    Embedded(Box<dyn EmbeddedView>),
}

struct PendingContent {
    generation: u64,
    render: PendingRender,
}

/// A floating content window in the 3D scene.
///
/// The panel owns only interaction state: transform, chrome layout, and the
/// content surface. The scene-graph engine reads transform and surface each
/// frame through the registry; rendering itself happens outside.
pub struct Panel {
    id: PanelId,
    pub title: String,
    /// World-space center of the content area (meters).
    pub position: Vec3,
    pub rotation: Quat,
    /// Content area size in world meters. The title bar sits above this.
    pub size: Vec2,
    pub draggable: bool,
    /// Normalized position of the depth indicator along the scroll strip:
    /// 0 at min_depth, 1 at max_depth.
    pub depth_indicator: f32,
    surface: Surface,
    source: Option<ContentSource>,
    pending: Option<PendingContent>,
    /// Bumped on every (re)population request; a stale completion whose
    /// generation no longer matches is dropped instead of overwriting
    /// newer content.
    generation: u64,
    /// Set when the surface changed and the engine should re-upload it.
    pub surface_dirty: bool,
    needs_refresh: bool,
    destroyed: bool,
}

impl Panel {
    pub(crate) fn new(
        id: PanelId,
        position: Vec3,
        rotation: Quat,
        options: PanelOptions,
        style: &PanelStyle,
    ) -> Self {
        Self {
            id,
            title: options.title,
            position,
            rotation,
            size: style.panel_size,
            draggable: options.draggable,
            depth_indicator: 0.0,
            surface: Surface::Empty,
            source: None,
            pending: None,
            generation: 0,
            surface_dirty: false,
            needs_refresh: false,
            destroyed: false,
        }
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn has_pending_content(&self) -> bool {
        self.pending.is_some()
    }

    /// The current raster surface, if the panel is in raster mode.
    pub fn raster(&self) -> Option<&RasterFrame> {
        match &self.surface {
            Surface::Raster(frame) | Surface::Error(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn shows_error(&self) -> bool {
        matches!(self.surface, Surface::Error(_))
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.surface, Surface::Embedded(_))
    }

    /// Replace the content surface. Markup is rendered asynchronously by the
    /// collaborator; URLs open a live embedded surface. When two calls race,
    /// the newer one wins regardless of completion order.
    pub fn set_content(
        &mut self,
        source: ContentSource,
        renderer: &dyn ContentRenderer,
        host: &dyn EmbeddedHost,
        style: &PanelStyle,
    ) {
        if self.destroyed {
            return;
        }

        self.generation += 1;

        match &source {
            ContentSource::Markup(markup) => {
                // Switching away from an embedded surface tears it down;
                // an existing raster keeps showing until the new one lands.
                if let Surface::Embedded(view) = &mut self.surface {
                    view.close();
                    self.surface = Surface::Empty;
                    self.surface_dirty = true;
                }

                let document = if looks_like_document(markup) {
                    markup.clone()
                } else {
                    wrap_fragment(markup)
                };

                self.pending = Some(PendingContent {
                    generation: self.generation,
                    render: renderer.render(self.id, &document, style.content_resolution),
                });
            }
            ContentSource::Url(url) => {
                self.pending = None;
                if let Surface::Embedded(view) = &mut self.surface {
                    view.close();
                }
                renderer.release(self.id);

                match host.open(self.id, url) {
                    Ok(mut view) => {
                        let (w, h) = style.content_resolution;
                        view.resize(w, h);
                        self.surface = Surface::Embedded(view);
                    }
                    Err(e) => {
                        warn!(id = %self.id, %e, "failed to open embedded surface");
                        let (w, h) = style.content_resolution;
                        self.surface = Surface::Error(RasterFrame::error_surface(w, h));
                    }
                }
                self.surface_dirty = true;
            }
        }

        self.source = Some(source);
    }

    /// Re-render the current source in place. No-op without a source or for
    /// live embedded surfaces.
    pub fn refresh_content(&mut self, renderer: &dyn ContentRenderer, style: &PanelStyle) {
        if self.destroyed {
            return;
        }
        let Some(ContentSource::Markup(markup)) = &self.source else {
            return;
        };

        let document = if looks_like_document(markup) {
            markup.clone()
        } else {
            wrap_fragment(markup)
        };

        self.generation += 1;
        self.pending = Some(PendingContent {
            generation: self.generation,
            render: renderer.render(self.id, &document, style.content_resolution),
        });
    }

    /// Per-tick pump of the pending render. Never blocks; the panel keeps
    /// showing its previous surface until the result lands.
    pub fn poll_content(&mut self, style: &PanelStyle) {
        let Some(pending) = &mut self.pending else {
            return;
        };
        let Some(result) = pending.render.try_resolve() else {
            return;
        };
        let generation = pending.generation;
        self.pending = None;

        if generation != self.generation {
            // Superseded by a newer set_content; drop the stale result.
            debug!(id = %self.id, "dropping stale content render");
            return;
        }

        match result {
            Ok(frame) => {
                self.surface = Surface::Raster(frame);
            }
            Err(e) => {
                warn!(id = %self.id, %e, "content render failed");
                let (w, h) = style.content_resolution;
                self.surface = Surface::Error(RasterFrame::error_surface(w, h));
            }
        }
        self.surface_dirty = true;
    }

    /// Test a pointer ray against this panel's affordances.
    pub fn hit_test(&self, ray: &Ray, style: &PanelStyle) -> Option<AffordanceHit> {
        if self.destroyed {
            return None;
        }

        let normal = self.rotation * Vec3::Z;
        let plane = Plane::new(normal, self.position);
        let point = intersect_ray_plane(ray, &plane)?;
        let local = self.rotation.inverse() * (point - self.position);

        let half_w = self.size.x / 2.0;
        let half_h = self.size.y / 2.0;
        let title_h = style.title_bar_height;

        if local.x < -half_w || local.x > half_w {
            return None;
        }
        if local.y < -half_h || local.y > half_h + title_h {
            return None;
        }

        let distance = (point - ray.origin).length();
        let content_uv = Vec2::new(
            (local.x + half_w) / self.size.x,
            (local.y + half_h) / self.size.y,
        );

        let in_content = local.y <= half_h;
        let kind = if in_content && local.x <= -half_w + style.scroll_strip_fraction * self.size.x
        {
            AffordanceKind::ScrollStrip
        } else if in_content
            && local.x >= half_w - style.resize_handle_fraction * self.size.x
            && local.y <= -half_h + style.resize_handle_fraction * self.size.x
        {
            AffordanceKind::ResizeHandle
        } else if !in_content {
            let title_uv = Vec2::new(content_uv.x, (local.y - half_h) / title_h);
            let kind = if title_uv.x >= 1.0 - style.close_button_fraction {
                AffordanceKind::CloseButton
            } else {
                AffordanceKind::TitleBar
            };
            return Some(AffordanceHit {
                kind,
                uv: title_uv,
                point,
                distance,
            });
        } else {
            AffordanceKind::Content
        };

        Some(AffordanceHit {
            kind,
            uv: content_uv,
            point,
            distance,
        })
    }

    /// Drag is position-only; rotation and scale never change here.
    pub fn apply_drag(&mut self, new_world_position: Vec3) {
        if self.destroyed {
            return;
        }
        self.position = new_world_position;
    }

    /// Resize with a hard floor so panels can never collapse to zero size.
    pub fn apply_resize(&mut self, new_size: Vec2, style: &PanelStyle) {
        if self.destroyed {
            return;
        }
        self.size = new_size.max(style.min_panel_size);

        match &mut self.surface {
            Surface::Embedded(view) => {
                let (rw, rh) = style.content_resolution;
                let w = ((rw as f32 * self.size.x / style.panel_size.x).round() as u32).max(1);
                let h = ((rh as f32 * self.size.y / style.panel_size.y).round() as u32).max(1);
                view.resize(w, h);
            }
            Surface::Raster(_) | Surface::Error(_) => {
                // Backing pixels are fixed; ask for a fresh snapshot.
                self.needs_refresh = true;
            }
            Surface::Empty => {}
        }
    }

    /// Move the panel along the viewer-to-panel vector, clamped to the
    /// configured depth range.
    pub fn apply_depth_scroll(&mut self, delta: f32, viewer_position: Vec3, interact: &InteractConfig) {
        if self.destroyed {
            return;
        }
        let offset = self.position - viewer_position;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            // Degenerate: panel at the viewer's eye. Skip this tick.
            return;
        }
        let dir = offset / distance;
        let clamped = (distance + delta).clamp(interact.min_depth, interact.max_depth);
        self.position = viewer_position + dir * clamped;
        self.depth_indicator =
            (clamped - interact.min_depth) / (interact.max_depth - interact.min_depth);
    }

    /// Forward a synthetic activation at a content pixel into the active
    /// surface, then schedule a refresh since the content may have changed.
    pub fn dispatch_content_click(&mut self, x: u32, y: u32, renderer: &dyn ContentRenderer) {
        if self.destroyed {
            return;
        }
        match &mut self.surface {
            Surface::Embedded(view) => view.click(x, y),
            _ => renderer.click(self.id, x, y),
        }
        self.needs_refresh = true;
    }

    /// True once after an interaction that requires re-rendering.
    pub fn take_needs_refresh(&mut self) -> bool {
        std::mem::take(&mut self.needs_refresh)
    }

    /// Turn the panel to face the viewer.
    pub fn face_towards(&mut self, viewer_position: Vec3) {
        if self.destroyed {
            return;
        }
        let to_viewer = viewer_position - self.position;
        if to_viewer.length_squared() < 1e-9 {
            return;
        }
        self.rotation = Quat::from_rotation_arc(Vec3::Z, to_viewer.normalize());
    }

    /// Release the surface and any off-scene content owned by the renderer.
    /// Idempotent: destroying twice is a no-op.
    pub fn destroy(&mut self, renderer: &dyn ContentRenderer) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.pending = None;
        if let Surface::Embedded(view) = &mut self.surface {
            view.close();
        }
        self.surface = Surface::Empty;
        renderer.release(self.id);
        debug!(id = %self.id, "panel destroyed");
    }
}
