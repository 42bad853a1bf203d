use crate::Command;
use arwm_config::AppConfig;
use arwm_geometry::{intersect_ray_plane, uv_to_pixel, Plane, Ray};
use arwm_scene::{AffordanceKind, PanelId, PanelRegistry, ViewerPose};
use glam::{Vec2, Vec3};
use tracing::debug;

/// Snapshot of the router's mode, for callers and tests. Exactly one
/// variant is ever active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Idle,
    Dragging(PanelId),
    Resizing(PanelId),
    ScrollingDepth(PanelId),
}

struct DragState {
    target: PanelId,
    /// Panel position minus initial hit point; keeps the grab point under
    /// the pointer instead of snapping the panel center to it.
    offset: Vec3,
    /// Distance along the viewer's forward axis at capture. The drag plane
    /// is rebuilt from the current viewer pose every update so depth stays
    /// constant while lateral position tracks the ray.
    depth: f32,
}

struct ResizeState {
    target: PanelId,
    /// Projection plane captured at press; fixed for the whole gesture.
    plane: Plane,
}

struct ScrollState {
    target: PanelId,
    /// Vertical pointer-ray reference, reset every update to avoid
    /// runaway acceleration.
    last_y: f32,
}

enum GestureState {
    Idle,
    Dragging(DragState),
    Resizing(ResizeState),
    ScrollingDepth(ScrollState),
}

struct PressInfo {
    target: PanelId,
    uv: Vec2,
    /// World-space hit point at press; anchors a promoted drag.
    point: Vec3,
    time_ms: u64,
    last_dir: Vec3,
    drift: f32,
}

/// Per-event and per-tick dispatch of pointer input onto panel affordances.
///
/// At most one gesture is active at a time; ending it clears both the mode
/// and the target together. The router never touches the registry mutably:
/// it emits [`Command`]s the session glue applies after iteration.
pub struct InteractionRouter {
    state: GestureState,
    pointer: Option<Ray>,
    press: Option<PressInfo>,
}

impl InteractionRouter {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
            pointer: None,
            press: None,
        }
    }

    pub fn gesture(&self) -> Gesture {
        match &self.state {
            GestureState::Idle => Gesture::Idle,
            GestureState::Dragging(d) => Gesture::Dragging(d.target),
            GestureState::Resizing(r) => Gesture::Resizing(r.target),
            GestureState::ScrollingDepth(s) => Gesture::ScrollingDepth(s.target),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    /// Select/press start. Hit-tests the ray against all panels and either
    /// starts a gesture, emits an immediate command (close), or records a
    /// candidate content click.
    pub fn on_press(
        &mut self,
        ray: Ray,
        time_ms: u64,
        viewer: &ViewerPose,
        registry: &PanelRegistry,
        config: &AppConfig,
    ) -> Vec<Command> {
        self.pointer = Some(ray);
        if !self.is_idle() {
            return Vec::new();
        }

        let Some((id, hit)) = registry.hit_test(&ray, &config.style) else {
            return Vec::new();
        };
        let Some(panel) = registry.find(id) else {
            return Vec::new();
        };

        match hit.kind {
            AffordanceKind::ScrollStrip => {
                self.state = GestureState::ScrollingDepth(ScrollState {
                    target: id,
                    last_y: ray.dir.y,
                });
            }
            AffordanceKind::ResizeHandle => {
                self.state = GestureState::Resizing(ResizeState {
                    target: id,
                    plane: Plane::new(panel.rotation * Vec3::Z, panel.position),
                });
            }
            AffordanceKind::CloseButton => {
                // Immediate action, not a gesture.
                return vec![Command::Close { panel: id }];
            }
            AffordanceKind::TitleBar => {
                if panel.draggable {
                    let depth =
                        (panel.position - viewer.position).dot(viewer.forward());
                    self.state = GestureState::Dragging(DragState {
                        target: id,
                        offset: panel.position - hit.point,
                        depth,
                    });
                }
            }
            AffordanceKind::Content => {
                self.press = Some(PressInfo {
                    target: id,
                    uv: hit.uv,
                    point: hit.point,
                    time_ms,
                    last_dir: ray.dir,
                    drift: 0.0,
                });
            }
        }
        Vec::new()
    }

    /// Pointer moved. Gesture math runs in [`Self::update`]; this only
    /// records the latest ray and accumulates click drift.
    pub fn on_move(&mut self, ray: Ray) {
        if let Some(press) = &mut self.press {
            press.drift += (ray.dir - press.last_dir).length();
            press.last_dir = ray.dir;
        }
        self.pointer = Some(ray);
    }

    /// Select/press end. Ends any active gesture; a short, steady press on
    /// a content surface becomes a click, anything longer is a no-op.
    pub fn on_release(&mut self, time_ms: u64, config: &AppConfig) -> Vec<Command> {
        if !self.is_idle() {
            self.state = GestureState::Idle;
            self.press = None;
            return Vec::new();
        }

        let Some(press) = self.press.take() else {
            return Vec::new();
        };

        let held = time_ms.saturating_sub(press.time_ms);
        if held > config.interact.click_max_ms || press.drift > config.interact.click_max_drift {
            return Vec::new();
        }

        let (w, h) = config.style.content_resolution;
        let pixel = uv_to_pixel(press.uv, w, h);
        vec![Command::ContentClick {
            panel: press.target,
            x: (pixel.x.clamp(0.0, (w - 1) as f32)) as u32,
            y: (pixel.y.clamp(0.0, (h - 1) as f32)) as u32,
        }]
    }

    /// Per-tick gesture advance. Runs at most once per tick, before the
    /// frame is rendered. Cancels the gesture when the target vanished from
    /// the registry or the ray no longer intersects the captured plane
    /// (implicit release, not an error).
    pub fn update(
        &mut self,
        viewer: &ViewerPose,
        registry: &PanelRegistry,
        config: &AppConfig,
    ) -> Vec<Command> {
        let Some(ray) = self.pointer else {
            return Vec::new();
        };

        // A content press that drifted past the click threshold is promoted
        // to a drag of the whole panel.
        if self.is_idle()
            && self
                .press
                .as_ref()
                .is_some_and(|p| p.drift > config.interact.click_max_drift)
        {
            if let Some(press) = self.press.take() {
                self.promote_press_to_drag(press, viewer, registry);
            }
        }

        match &mut self.state {
            GestureState::Idle => Vec::new(),

            GestureState::Dragging(drag) => {
                if registry.find(drag.target).is_none() {
                    return self.cancel("drag target gone");
                }
                // The plane tracks the viewer so depth stays constant while
                // only lateral position moves.
                let anchor = viewer.position + viewer.forward() * drag.depth;
                let plane = Plane::new(-viewer.forward(), anchor);
                match intersect_ray_plane(&ray, &plane) {
                    Some(hit) => vec![Command::Move {
                        panel: drag.target,
                        position: hit + drag.offset,
                    }],
                    None => self.cancel("pointer left drag plane"),
                }
            }

            GestureState::Resizing(resize) => {
                let Some(panel) = registry.find(resize.target) else {
                    return self.cancel("resize target gone");
                };
                match intersect_ray_plane(&ray, &resize.plane) {
                    Some(hit) => {
                        let local = panel.rotation.inverse() * (hit - panel.position);
                        // Handle sits at (+w/2, -h/2); local offset from the
                        // panel center doubles into the new size.
                        let size = Vec2::new(2.0 * local.x, -2.0 * local.y);
                        vec![Command::Resize {
                            panel: resize.target,
                            size,
                        }]
                    }
                    None => self.cancel("pointer left resize plane"),
                }
            }

            GestureState::ScrollingDepth(scroll) => {
                if registry.find(scroll.target).is_none() {
                    return self.cancel("scroll target gone");
                }
                // Raising the pointer pushes the panel away.
                let y = ray.dir.y;
                let delta = (y - scroll.last_y) * config.interact.scroll_speed;
                scroll.last_y = y;
                if delta == 0.0 {
                    return Vec::new();
                }
                vec![Command::DepthScroll {
                    panel: scroll.target,
                    delta,
                }]
            }
        }
    }

    fn promote_press_to_drag(
        &mut self,
        press: PressInfo,
        viewer: &ViewerPose,
        registry: &PanelRegistry,
    ) {
        let Some(panel) = registry.find(press.target) else {
            return;
        };
        if !panel.draggable {
            return;
        }
        debug!(target = %press.target, "content press promoted to drag");
        self.state = GestureState::Dragging(DragState {
            target: press.target,
            offset: panel.position - press.point,
            depth: (panel.position - viewer.position).dot(viewer.forward()),
        });
    }

    fn cancel(&mut self, reason: &str) -> Vec<Command> {
        debug!(reason, "gesture cancelled");
        self.state = GestureState::Idle;
        Vec::new()
    }
}

impl Default for InteractionRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arwm_scene::{
        ContentRenderer, ContentSource, EmbeddedHost, EmbeddedView, PanelOptions, PendingRender,
        RasterFrame, RenderError,
    };
    use glam::Quat;
    use std::cell::RefCell;

    #[derive(Default)]
    struct StubRenderer {
        senders: RefCell<Vec<tokio::sync::oneshot::Sender<Result<RasterFrame, RenderError>>>>,
        clicks: RefCell<Vec<(PanelId, u32, u32)>>,
        released: RefCell<Vec<PanelId>>,
    }

    impl ContentRenderer for StubRenderer {
        fn render(&self, _panel: PanelId, _markup: &str, _size: (u32, u32)) -> PendingRender {
            let (tx, pending) = PendingRender::channel();
            self.senders.borrow_mut().push(tx);
            pending
        }
        fn click(&self, panel: PanelId, x: u32, y: u32) {
            self.clicks.borrow_mut().push((panel, x, y));
        }
        fn release(&self, panel: PanelId) {
            self.released.borrow_mut().push(panel);
        }
    }

    struct StubHost;
    struct StubView;
    impl EmbeddedView for StubView {
        fn click(&mut self, _x: u32, _y: u32) {}
        fn resize(&mut self, _width: u32, _height: u32) {}
        fn close(&mut self) {}
    }
    impl EmbeddedHost for StubHost {
        fn open(&self, _panel: PanelId, _url: &str) -> Result<Box<dyn EmbeddedView>, RenderError> {
            Ok(Box::new(StubView))
        }
    }

    struct Fixture {
        config: AppConfig,
        registry: PanelRegistry,
        renderer: StubRenderer,
        router: InteractionRouter,
        viewer: ViewerPose,
        id: PanelId,
    }

    /// One panel with identity rotation at (0, 0, -3), viewer at origin.
    fn fixture() -> Fixture {
        let config = AppConfig::default();
        let renderer = StubRenderer::default();
        let mut registry = PanelRegistry::new();
        let id = registry.spawn_at(
            ContentSource::Markup("<div>hi</div>".into()),
            PanelOptions::default(),
            Vec3::new(0.0, 0.0, -3.0),
            Quat::IDENTITY,
            &config,
            &renderer,
            &StubHost,
        );
        Fixture {
            config,
            registry,
            renderer,
            router: InteractionRouter::new(),
            viewer: ViewerPose::default(),
            id,
        }
    }

    fn ray_to(x: f32, y: f32, z: f32) -> Ray {
        Ray::through(Vec3::ZERO, Vec3::new(x, y, z))
    }

    fn apply(fx: &mut Fixture, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Move { panel, position } => {
                    if let Some(p) = fx.registry.find_mut(panel) {
                        p.apply_drag(position);
                    }
                }
                Command::Resize { panel, size } => {
                    if let Some(p) = fx.registry.find_mut(panel) {
                        p.apply_resize(size, &fx.config.style);
                    }
                }
                Command::DepthScroll { panel, delta } => {
                    if let Some(p) = fx.registry.find_mut(panel) {
                        p.apply_depth_scroll(delta, fx.viewer.position, &fx.config.interact);
                    }
                }
                Command::Close { panel } => {
                    fx.registry.remove(panel, &fx.renderer);
                }
                Command::ContentClick { panel, x, y } => {
                    if let Some(p) = fx.registry.find_mut(panel) {
                        p.dispatch_content_click(x, y, &fx.renderer);
                    }
                }
            }
        }
    }

    #[test]
    fn drag_moves_laterally_and_preserves_depth() {
        let mut fx = fixture();

        let cmds = fx.router.on_press(
            ray_to(0.0, 0.6, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        assert!(cmds.is_empty());
        assert_eq!(fx.router.gesture(), Gesture::Dragging(fx.id));

        fx.router.on_move(ray_to(0.5, 0.6, -3.0));
        let cmds = fx.router.update(&fx.viewer, &fx.registry, &fx.config);
        apply(&mut fx, cmds);

        let panel = fx.registry.find(fx.id).unwrap();
        assert!((panel.position.x - 0.5).abs() < 1e-4, "lateral offset");
        assert!((panel.position.y - 0.0).abs() < 1e-4, "grab offset kept");
        assert!((-panel.position.z - 3.0).abs() < 1e-4, "depth preserved");

        let cmds = fx.router.on_release(100, &fx.config);
        assert!(cmds.is_empty());
        assert!(fx.router.is_idle());
    }

    #[test]
    fn close_button_press_is_immediate() {
        let mut fx = fixture();

        let cmds = fx.router.on_press(
            ray_to(0.8, 0.6, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        assert_eq!(cmds, vec![Command::Close { panel: fx.id }]);
        assert!(fx.router.is_idle());

        apply(&mut fx, cmds);
        assert!(fx.registry.is_empty());
        assert_eq!(fx.renderer.released.borrow().as_slice(), &[fx.id]);
    }

    #[test]
    fn markup_panel_lifecycle_populate_then_close() {
        let mut fx = fixture();

        // Populate.
        fx.renderer
            .senders
            .borrow_mut()
            .pop()
            .unwrap()
            .send(Ok(RasterFrame::solid(4, 4, [1, 2, 3, 255])))
            .unwrap();
        fx.registry
            .find_mut(fx.id)
            .unwrap()
            .poll_content(&fx.config.style);
        assert!(!fx.registry.find(fx.id).unwrap().shows_error());

        // Click the close sub-rectangle of the title bar.
        let cmds = fx.router.on_press(
            ray_to(0.85, 0.6, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        apply(&mut fx, cmds);
        assert!(fx.registry.is_empty());
    }

    #[test]
    fn short_steady_press_on_content_clicks_through() {
        let mut fx = fixture();

        fx.router.on_press(
            ray_to(0.0, 0.0, -3.0),
            1000,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        assert!(fx.router.is_idle(), "content press is not a gesture");

        let cmds = fx.router.on_release(1100, &fx.config);
        let (w, h) = fx.config.style.content_resolution;
        assert_eq!(
            cmds,
            vec![Command::ContentClick {
                panel: fx.id,
                x: w / 2,
                y: h / 2,
            }]
        );

        apply(&mut fx, cmds);
        assert_eq!(fx.renderer.clicks.borrow().len(), 1);
        assert!(fx.registry.find_mut(fx.id).unwrap().take_needs_refresh());
    }

    #[test]
    fn long_press_on_content_is_noop() {
        let mut fx = fixture();

        fx.router.on_press(
            ray_to(0.0, 0.0, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        let cmds = fx.router.on_release(5000, &fx.config);
        assert!(cmds.is_empty());
    }

    #[test]
    fn drifting_press_on_content_is_noop() {
        let mut fx = fixture();

        fx.router.on_press(
            ray_to(0.0, 0.0, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        fx.router.on_move(ray_to(0.8, 0.3, -3.0));
        let cmds = fx.router.on_release(100, &fx.config);
        assert!(cmds.is_empty());
    }

    #[test]
    fn exactly_one_gesture_at_a_time() {
        let mut fx = fixture();

        fx.router.on_press(
            ray_to(-0.9, 0.0, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        assert_eq!(fx.router.gesture(), Gesture::ScrollingDepth(fx.id));

        // A second press while scrolling does not stack another gesture.
        fx.router.on_press(
            ray_to(0.0, 0.6, -3.0),
            10,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        assert_eq!(fx.router.gesture(), Gesture::ScrollingDepth(fx.id));

        fx.router.on_release(20, &fx.config);
        assert_eq!(fx.router.gesture(), Gesture::Idle);
    }

    #[test]
    fn depth_scroll_respects_range_and_resets_reference() {
        let mut fx = fixture();

        fx.router.on_press(
            ray_to(-0.9, 0.0, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );

        // Sweep the pointer up hard several times; depth must stay clamped.
        for step in 1..6 {
            fx.router.on_move(ray_to(-0.9, step as f32 * 2.0, -3.0));
            let cmds = fx.router.update(&fx.viewer, &fx.registry, &fx.config);
            apply(&mut fx, cmds);
        }
        let d = (fx.registry.find(fx.id).unwrap().position - fx.viewer.position).length();
        assert!(d <= fx.config.interact.max_depth + 1e-4);
        assert!(d >= fx.config.interact.min_depth - 1e-4);

        // No pointer movement means no further depth change.
        let cmds = fx.router.update(&fx.viewer, &fx.registry, &fx.config);
        assert!(cmds.is_empty());
    }

    #[test]
    fn resize_follows_pointer_and_clamps() {
        let mut fx = fixture();

        fx.router.on_press(
            ray_to(0.9, -0.4, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        assert_eq!(fx.router.gesture(), Gesture::Resizing(fx.id));

        fx.router.on_move(ray_to(1.5, -0.75, -3.0));
        let cmds = fx.router.update(&fx.viewer, &fx.registry, &fx.config);
        apply(&mut fx, cmds);
        let size = fx.registry.find(fx.id).unwrap().size;
        assert!((size - Vec2::new(3.0, 1.5)).length() < 1e-3);

        // Dragging far past the opposite corner hits the floor, never zero.
        fx.router.on_move(ray_to(-2.0, 1.0, -3.0));
        let cmds = fx.router.update(&fx.viewer, &fx.registry, &fx.config);
        apply(&mut fx, cmds);
        let size = fx.registry.find(fx.id).unwrap().size;
        assert_eq!(size, fx.config.style.min_panel_size);
    }

    #[test]
    fn destroying_target_mid_gesture_returns_to_idle() {
        let mut fx = fixture();

        fx.router.on_press(
            ray_to(0.0, 0.6, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        assert_eq!(fx.router.gesture(), Gesture::Dragging(fx.id));

        fx.registry.remove(fx.id, &fx.renderer);

        fx.router.on_move(ray_to(0.5, 0.6, -3.0));
        let cmds = fx.router.update(&fx.viewer, &fx.registry, &fx.config);
        assert!(cmds.is_empty());
        assert!(fx.router.is_idle());
    }

    #[test]
    fn pointer_leaving_drag_plane_cancels() {
        let mut fx = fixture();

        fx.router.on_press(
            ray_to(0.0, 0.6, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        // Ray parallel to the drag plane can no longer intersect it.
        fx.router.on_move(Ray::new(Vec3::ZERO, Vec3::X));
        let cmds = fx.router.update(&fx.viewer, &fx.registry, &fx.config);
        assert!(cmds.is_empty());
        assert!(fx.router.is_idle());
    }

    #[test]
    fn drifting_content_press_promotes_to_drag() {
        let mut fx = fixture();

        fx.router.on_press(
            ray_to(0.0, 0.0, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        assert!(fx.router.is_idle());

        fx.router.on_move(ray_to(0.6, 0.0, -3.0));
        let cmds = fx.router.update(&fx.viewer, &fx.registry, &fx.config);
        assert_eq!(fx.router.gesture(), Gesture::Dragging(fx.id));
        apply(&mut fx, cmds);
        let panel = fx.registry.find(fx.id).unwrap();
        assert!((panel.position.x - 0.6).abs() < 1e-4);

        // The promoted press never also counts as a click.
        let cmds = fx.router.on_release(50, &fx.config);
        assert!(cmds.is_empty());
    }

    #[test]
    fn non_draggable_title_press_starts_nothing() {
        let mut fx = fixture();
        fx.registry.find_mut(fx.id).unwrap().draggable = false;

        fx.router.on_press(
            ray_to(0.0, 0.6, -3.0),
            0,
            &fx.viewer,
            &fx.registry,
            &fx.config,
        );
        assert!(fx.router.is_idle());
    }
}
