//! HTTP boundary for handing tasks to an external automation backend.
//!
//! The backend exposes a single `POST /execute-task` endpoint taking a JSON
//! task description and returning a JSON outcome. Failures at any layer
//! (transport, HTTP status, body decode) are folded into a failed
//! [`TaskOutcome`] so callers never have to distinguish them.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Request body for `POST /execute-task`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_task: Option<serde_json::Value>,
    pub use_llm_cleaning: bool,
}

/// Result of a task execution, successful or not. Failed outcomes carry a
/// human-readable error instead of being an `Err`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskOutcome {
    pub success: bool,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskOutcome {
    pub fn ok(result: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            result,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Client for the task-execution backend. Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Clone)]
pub struct TaskExecutor {
    client: reqwest::Client,
    base_url: String,
}

impl TaskExecutor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/execute-task", self.base_url.trim_end_matches('/'))
    }

    /// Submit a task and wait for the outcome. Infallible by contract:
    /// every error surfaces as a failed outcome.
    pub async fn execute(
        &self,
        task: Option<String>,
        structured_task: Option<serde_json::Value>,
    ) -> TaskOutcome {
        let request = TaskRequest {
            task,
            structured_task,
            use_llm_cleaning: true,
        };
        let endpoint = self.endpoint();
        debug!(%endpoint, "submitting task");

        let response = match self.client.post(&endpoint).json(&request).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%endpoint, error = %err, "task backend unreachable");
                return TaskOutcome::failed(format!("task backend unreachable: {err}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%endpoint, %status, "task backend returned error status");
            return TaskOutcome::failed(format!("task backend returned {status}"));
        }

        match response.json::<TaskOutcome>().await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%endpoint, error = %err, "malformed task backend response");
                TaskOutcome::failed(format!("malformed task backend response: {err}"))
            }
        }
    }
}
