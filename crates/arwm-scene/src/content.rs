use crate::PanelId;
use thiserror::Error;
use tokio::sync::oneshot;

/// What a panel displays: markup rendered to a raster snapshot, or a URL
/// opened as a live embedded surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Markup(String),
    Url(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("content renderer failed: {0}")]
    Renderer(String),
    #[error("content renderer dropped the request")]
    Cancelled,
    #[error("embedded host failed: {0}")]
    Embedded(String),
}

/// A rasterized content snapshot (RGBA8, tightly packed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RasterFrame {
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&rgba);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Fixed surface shown when content rendering fails. The panel stays
    /// alive and a later `set_content`/`refresh_content` can replace it.
    pub fn error_surface(width: u32, height: u32) -> Self {
        Self::solid(width, height, [200, 40, 40, 255])
    }
}

/// Handle to an in-flight content render. The renderer collaborator resolves
/// it whenever its work completes; panels pump it once per tick without
/// blocking the frame loop.
pub struct PendingRender {
    rx: oneshot::Receiver<Result<RasterFrame, RenderError>>,
}

impl PendingRender {
    /// Channel pair for asynchronous renderers: resolve by sending on the
    /// returned sender.
    pub fn channel() -> (
        oneshot::Sender<Result<RasterFrame, RenderError>>,
        PendingRender,
    ) {
        let (tx, rx) = oneshot::channel();
        (tx, PendingRender { rx })
    }

    /// An already-resolved render, for synchronous renderers.
    pub fn ready(result: Result<RasterFrame, RenderError>) -> Self {
        let (tx, pending) = Self::channel();
        // Receiver is held by `pending`, the send cannot fail.
        let _ = tx.send(result);
        pending
    }

    /// Non-blocking poll. `None` while the renderer is still working.
    pub fn try_resolve(&mut self) -> Option<Result<RasterFrame, RenderError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(RenderError::Cancelled)),
        }
    }
}

/// External collaborator that turns markup into raster snapshots and
/// forwards synthetic activations into the off-scene document backing a
/// panel. Keyed by `PanelId` so one renderer can serve many panels.
pub trait ContentRenderer: Send {
    /// Begin rendering `markup` into a raster of the given pixel size.
    fn render(&self, panel: PanelId, markup: &str, size: (u32, u32)) -> PendingRender;

    /// Forward a click at a content pixel into the document backing `panel`.
    fn click(&self, panel: PanelId, x: u32, y: u32);

    /// Release any off-scene document owned for `panel`.
    fn release(&self, panel: PanelId);
}

/// External collaborator that opens URLs as live embedded surfaces,
/// composited into the scene outside this subsystem.
pub trait EmbeddedHost: Send {
    fn open(&self, panel: PanelId, url: &str) -> Result<Box<dyn EmbeddedView>, RenderError>;
}

/// A live embedded surface owned by a panel.
pub trait EmbeddedView: Send {
    fn click(&mut self, x: u32, y: u32);
    fn resize(&mut self, width: u32, height: u32);
    fn close(&mut self);
}

/// A string is a full document when it starts with a root markup tag;
/// anything else is a fragment and gets wrapped in a minimal shell.
pub fn looks_like_document(content: &str) -> bool {
    let trimmed = content.trim_start();
    let Some(rest) = trimmed.strip_prefix('<') else {
        return false;
    };
    let rest = rest.trim_start().to_ascii_lowercase();
    rest.starts_with("html") || rest.starts_with("!doctype")
}

/// Wrap a markup fragment in a minimal document shell.
pub fn wrap_fragment(fragment: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>{fragment}</body></html>"
    )
}
