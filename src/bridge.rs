use arwm_config::AppConfig;
use arwm_scene::{
    ContentRenderer, ContentSource, EmbeddedHost, PanelId, PanelOptions, PanelRegistry, ViewerPose,
};
use arwm_tasks::{TaskExecutor, TaskOutcome};
use tracing::info;

/// Something an AI assistant asked the workspace to do.
#[derive(Debug, Clone)]
pub enum AiEvent {
    /// Open a new panel showing the given content.
    RenderContent {
        content: String,
        title: Option<String>,
    },
    /// Hand a task to the external automation backend.
    ExecuteTask {
        task: Option<String>,
        structured_task: Option<serde_json::Value>,
    },
}

/// Entry point for AI-driven workspace actions. Owned by the host shell and
/// handed to whatever transport delivers assistant output; nothing here is
/// reachable through process-global state. Cheap to clone for spawned
/// tasks; clones share the executor's connection pool.
#[derive(Clone)]
pub struct AiBridge {
    executor: TaskExecutor,
}

impl AiBridge {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            executor: TaskExecutor::new(config.tasks.endpoint.clone()),
        }
    }

    /// Spawn a panel for assistant-provided content. URLs open embedded
    /// surfaces; anything else is treated as markup.
    #[allow(clippy::too_many_arguments)]
    pub fn open_content(
        &self,
        content: &str,
        title: Option<&str>,
        registry: &mut PanelRegistry,
        viewer: &ViewerPose,
        config: &AppConfig,
        renderer: &dyn ContentRenderer,
        host: &dyn EmbeddedHost,
    ) -> PanelId {
        let source = classify_content(content);
        let options = PanelOptions {
            title: title.unwrap_or("AR Window").to_string(),
            ..PanelOptions::default()
        };
        let id = registry.spawn(source, options, viewer, config, renderer, host);
        info!(%id, "assistant content opened");
        id
    }

    pub async fn execute_task(
        &self,
        task: Option<String>,
        structured_task: Option<serde_json::Value>,
    ) -> TaskOutcome {
        self.executor.execute(task, structured_task).await
    }
}

/// URLs become live embedded surfaces; everything else is markup (fragment
/// wrapping happens at the panel).
fn classify_content(content: &str) -> ContentSource {
    let trimmed = content.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        ContentSource::Url(trimmed.to_string())
    } else {
        ContentSource::Markup(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_open_embedded_everything_else_is_markup() {
        assert_eq!(
            classify_content("  https://example.com/page "),
            ContentSource::Url("https://example.com/page".to_string())
        );
        assert_eq!(
            classify_content("http://localhost:3000"),
            ContentSource::Url("http://localhost:3000".to_string())
        );
        assert!(matches!(
            classify_content("<div>hello</div>"),
            ContentSource::Markup(_)
        ));
        assert!(matches!(
            classify_content("see https://example.com for details"),
            ContentSource::Markup(_)
        ));
    }

    #[tokio::test]
    async fn execute_task_failure_is_a_result_not_a_panic() {
        let mut config = AppConfig::default();
        // Port 9 is discard; nothing is listening in the test environment.
        config.tasks.endpoint = "http://127.0.0.1:9".to_string();

        let bridge = AiBridge::new(&config);
        let outcome = bridge.execute_task(Some("noop".into()), None).await;
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn open_content_spawns_titled_panel() {
        use crate::offscreen::{LoggingEmbeddedHost, OffscreenRenderer};

        let config = AppConfig::default();
        let bridge = AiBridge::new(&config);
        let mut registry = PanelRegistry::new();
        let renderer = OffscreenRenderer::new();
        let host = LoggingEmbeddedHost;

        let id = bridge.open_content(
            "<div>forecast</div>",
            Some("Weather"),
            &mut registry,
            &ViewerPose::default(),
            &config,
            &renderer,
            &host,
        );
        let panel = registry.find(id).unwrap();
        assert_eq!(panel.title, "Weather");
        assert!(panel.has_pending_content() || panel.raster().is_some());
    }
}
