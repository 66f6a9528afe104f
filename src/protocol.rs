//! Wire types for the conversion service's JSON protocol.
//!
//! | Operation      | Method & path                | Body / response            |
//! |----------------|------------------------------|----------------------------|
//! | Submit (async) | POST `/convert/source/async` | [`ConvertRequest`] → [`TaskHandle`] |
//! | Submit (sync)  | POST `/convert/source`       | [`ConvertRequest`] → result envelope |
//! | Get status     | GET `/tasks/{task_id}`       | [`TaskStatus`]             |
//! | Get result     | GET `/tasks/{task_id}/result`| result envelope (opaque)   |
//!
//! The result envelope is deliberately kept as raw [`serde_json::Value`]: its
//! shape varies with the requested output format and server version, and
//! [`crate::content::resolve_content`] picks a representation out of it
//! without committing the protocol layer to one schema.

use crate::source::SourceSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for both conversion endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvertRequest {
    pub sources: Vec<SourceSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ConvertOptions>,
}

impl ConvertRequest {
    /// Request for a single source, with an optional output format.
    pub fn single(source: SourceSpec, output_format: Option<String>) -> Self {
        Self {
            sources: vec![source],
            options: output_format.map(|f| ConvertOptions {
                output_format: Some(f),
            }),
        }
    }
}

/// Conversion options. An absent field means the server default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvertOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

/// Handle returned by the asynchronous submission endpoint.
///
/// Issued once per job; the id is opaque to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskHandle {
    pub task_id: String,
}

/// Lifecycle state of a server-side conversion task.
///
/// Terminal states are `Completed` and `Failed`; everything else means the
/// task is still moving. Status strings this client does not recognise
/// deserialize to [`TaskState::Unknown`] and are treated as non-terminal —
/// the full status vocabulary is not a confirmed contract of the service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// Whether this state ends polling.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    /// The wire string for this state.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status payload from GET `/tasks/{task_id}`.
///
/// Fields beyond the two the client interprets are preserved in `extra` so a
/// failed task's error detail survives into [`crate::error::ClientError::JobFailed`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    pub task_id: String,
    pub task_status: TaskState,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl TaskStatus {
    /// The full payload as JSON, for error reporting.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            Value::String(format!("{} {}", self.task_id, self.task_status))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_absent_options() {
        let req = ConvertRequest::single(SourceSpec::http("https://example.com/a.pdf"), None);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({"sources": [{"kind": "http", "url": "https://example.com/a.pdf"}]})
        );
    }

    #[test]
    fn request_carries_output_format() {
        let req = ConvertRequest::single(
            SourceSpec::remote_path("/app/input/report.pdf"),
            Some("markdown".into()),
        );
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "sources": [{"kind": "file", "path": "/app/input/report.pdf"}],
                "options": {"output_format": "markdown"}
            })
        );
    }

    #[test]
    fn task_state_parses_known_vocabulary() {
        for (s, expected) in [
            ("pending", TaskState::Pending),
            ("running", TaskState::Running),
            ("completed", TaskState::Completed),
            ("failed", TaskState::Failed),
        ] {
            let state: TaskState = serde_json::from_value(json!(s)).unwrap();
            assert_eq!(state, expected);
        }
    }

    #[test]
    fn unrecognised_state_is_unknown_and_non_terminal() {
        let state: TaskState = serde_json::from_value(json!("queued-for-gpu")).unwrap();
        assert_eq!(state, TaskState::Unknown);
        assert!(!state.is_terminal());
    }

    #[test]
    fn status_preserves_extra_fields() {
        let status: TaskStatus = serde_json::from_value(json!({
            "task_id": "t-9",
            "task_status": "failed",
            "error": "unsupported input",
            "position": 0
        }))
        .unwrap();
        assert_eq!(status.task_status, TaskState::Failed);
        let v = status.to_value();
        assert_eq!(v["error"], json!("unsupported input"));
        assert_eq!(v["task_id"], json!("t-9"));
    }
}
