//! Error types for the docserve-client library.
//!
//! Every network operation returns an explicit [`ClientError`] kind instead of
//! unwinding, so failure paths are visible at each call site:
//!
//! * [`ClientError::Transport`] — the request never produced an HTTP response
//!   (connection refused, DNS, network-level timeout).
//! * [`ClientError::HttpStatus`] — the server answered with a non-success
//!   status; the code and body are carried so callers can log or inspect them.
//! * [`ClientError::JobFailed`] / [`ClientError::JobTimeout`] — the job-level
//!   outcomes of polling, distinct from transport problems.
//!
//! None of these are retried by the library. A transport blip on poll three
//! surfaces as `Transport`, not as a silent extra query.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// All errors returned by the docserve-client library.
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Transport & HTTP errors ───────────────────────────────────────────
    /// The request could not be completed at the network layer.
    #[error("request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status} from '{url}': {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
        body: String,
    },

    /// The response body was not the JSON shape the endpoint promises.
    #[error("unexpected response from '{url}': {reason}")]
    UnexpectedResponse { url: String, reason: String },

    // ── Job errors ────────────────────────────────────────────────────────
    /// The server reported the task as terminally failed.
    ///
    /// `status` is the full status payload as returned by the server, not
    /// just the status string, so callers can surface server-side detail.
    #[error("task '{task_id}' failed on the server: {status}")]
    JobFailed {
        task_id: String,
        status: serde_json::Value,
    },

    /// No terminal status was observed within the polling budget.
    #[error(
        "task '{task_id}' did not finish within {}s (waited {:.1}s)",
        .timeout.as_secs(),
        .waited.as_secs_f64()
    )]
    JobTimeout {
        task_id: String,
        timeout: Duration,
        waited: Duration,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// A local file was required but does not exist.
    ///
    /// The lenient resolver ([`crate::source::resolve_source`]) never returns
    /// this; it passes unknown paths through as remote-side paths. Only the
    /// strict [`crate::source::read_upload`] does.
    #[error("no local file at '{path}'")]
    LocalFileNotFound { path: PathBuf },

    /// A local file exists but could not be read.
    #[error("failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Client construction was given an unusable base URL.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// True for the job-level timeout outcome of polling.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::JobTimeout { .. })
    }

    /// True when the server reported the task as terminally failed.
    pub fn is_job_failed(&self) -> bool {
        matches!(self, ClientError::JobFailed { .. })
    }

    /// Short stable name of the error kind, used in logs and by tests that
    /// compare failure behaviour across the blocking and async clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Transport { .. } => "transport",
            ClientError::HttpStatus { .. } => "http-status",
            ClientError::UnexpectedResponse { .. } => "unexpected-response",
            ClientError::JobFailed { .. } => "job-failed",
            ClientError::JobTimeout { .. } => "job-timeout",
            ClientError::LocalFileNotFound { .. } => "local-file-not-found",
            ClientError::FileRead { .. } => "file-read",
            ClientError::InvalidBaseUrl { .. } => "invalid-base-url",
            ClientError::InvalidConfig(_) => "invalid-config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_timeout_display_names_elapsed() {
        let e = ClientError::JobTimeout {
            task_id: "t-1".into(),
            timeout: Duration::from_secs(5),
            waited: Duration::from_millis(6200),
        };
        let msg = e.to_string();
        assert!(msg.contains("5s"), "got: {msg}");
        assert!(msg.contains("6.2s"), "got: {msg}");
    }

    #[test]
    fn job_failed_display_carries_payload() {
        let e = ClientError::JobFailed {
            task_id: "t-2".into(),
            status: json!({"task_id": "t-2", "task_status": "failed", "error": "bad input"}),
        };
        assert!(e.to_string().contains("bad input"));
    }

    #[test]
    fn kind_is_stable_per_variant() {
        let e = ClientError::LocalFileNotFound {
            path: PathBuf::from("/tmp/missing.pdf"),
        };
        assert_eq!(e.kind(), "local-file-not-found");
        assert!(!e.is_timeout());
        assert!(!e.is_job_failed());
    }
}
