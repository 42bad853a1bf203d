use arwm_scene::{ContentRenderer, EmbeddedHost, EmbeddedView, PanelId, PendingRender, RenderError};
use tracing::info;

/// Offscreen markup rasterizer.
///
/// This is the desktop stand-in for a real HTML rasterization engine.
///
/// TODO: Wire up a headless webview once the embedding story is settled.
/// The implementation will:
/// 1. Keep one hidden browsing context per panel, keyed by id
/// 2. Load the document and wait for layout
/// 3. Snapshot the viewport into an RGBA buffer
/// 4. Resolve the pending render with the buffer
/// 5. Replay synthetic clicks into the live context on `click`
pub struct OffscreenRenderer;

impl OffscreenRenderer {
    pub fn new() -> Self {
        info!("offscreen renderer initialized (stub)");
        Self
    }
}

impl Default for OffscreenRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRenderer for OffscreenRenderer {
    fn render(&self, panel: PanelId, markup: &str, size: (u32, u32)) -> PendingRender {
        // Stub: resolve immediately with a deterministic test pattern so
        // panels are visibly distinguishable without a real rasterizer.
        let colors: [(u8, u8, u8); 4] = [
            (40, 80, 160),  // Blue
            (160, 60, 40),  // Red
            (40, 140, 60),  // Green
            (140, 100, 40), // Orange
        ];
        let (r, g, b) = colors[markup.len() % colors.len()];

        let (width, height) = size;
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        let checker_size = 32u32;
        for y in 0..height {
            for x in 0..width {
                let is_light = ((x / checker_size) + (y / checker_size)) % 2 == 0;
                let factor = if is_light { 1.0_f32 } else { 0.7 };
                data.push((r as f32 * factor) as u8);
                data.push((g as f32 * factor) as u8);
                data.push((b as f32 * factor) as u8);
                data.push(255);
            }
        }

        info!(%panel, bytes = markup.len(), width, height, "rendered markup (stub)");
        PendingRender::ready(Ok(arwm_scene::RasterFrame {
            data,
            width,
            height,
        }))
    }

    fn click(&self, panel: PanelId, x: u32, y: u32) {
        info!(%panel, x, y, "content click (stub)");
    }

    fn release(&self, panel: PanelId) {
        info!(%panel, "renderer resources released (stub)");
    }
}

/// Embedded-surface host that only logs lifecycle events. A real host would
/// hand out live webview surfaces composited into the scene.
pub struct LoggingEmbeddedHost;

struct LoggingEmbeddedView {
    panel: PanelId,
    url: String,
}

impl EmbeddedView for LoggingEmbeddedView {
    fn click(&mut self, x: u32, y: u32) {
        info!(panel = %self.panel, x, y, "embedded click (stub)");
    }

    fn resize(&mut self, width: u32, height: u32) {
        info!(panel = %self.panel, width, height, "embedded resize (stub)");
    }

    fn close(&mut self) {
        info!(panel = %self.panel, url = %self.url, "embedded surface closed (stub)");
    }
}

impl EmbeddedHost for LoggingEmbeddedHost {
    fn open(&self, panel: PanelId, url: &str) -> Result<Box<dyn EmbeddedView>, RenderError> {
        info!(%panel, %url, "embedded surface opened (stub)");
        Ok(Box::new(LoggingEmbeddedView {
            panel,
            url: url.to_string(),
        }))
    }
}
