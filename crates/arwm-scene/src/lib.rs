pub mod content;
pub mod panel;
pub mod registry;
pub mod viewer;

pub use content::{
    looks_like_document, wrap_fragment, ContentRenderer, ContentSource, EmbeddedHost,
    EmbeddedView, PendingRender, RasterFrame, RenderError,
};
pub use panel::{AffordanceHit, AffordanceKind, Panel, PanelOptions};
pub use registry::PanelRegistry;
pub use viewer::{Camera, ViewerPose};

use std::fmt;

/// Opaque panel identifier, generated by the registry at spawn time.
/// Hit-test results and router commands refer to panels through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(u64);

impl PanelId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel-{}", self.0)
    }
}
