//! Asynchronous conversion client.
//!
//! [`ConvertClient`] wraps one `reqwest::Client` and the service base URL.
//! The HTTP client is shared across everything the instance does — including
//! a whole [`ConvertClient::convert_all`] batch — purely for connection
//! reuse; it holds no per-job state.
//!
//! Waiting on a task drives the [`crate::poll`] machine with
//! `tokio::time::sleep` as the suspension primitive, so many jobs' polling
//! loops interleave on one runtime when fanned out. The blocking counterpart
//! in [`crate::blocking`] drives the same machine with a thread sleep.

use crate::config::ClientConfig;
use crate::content::{resolve_content, ResolvedContent};
use crate::error::ClientError;
use crate::poll::{PollMachine, PollOptions, PollStep};
use crate::protocol::{ConvertOptions, ConvertRequest, TaskHandle, TaskStatus};
use crate::source::SourceSpec;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Async client for the conversion service.
#[derive(Debug, Clone)]
pub struct ConvertClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ConvertClient {
    /// Build a client from an explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Client against the default local service URL.
    pub fn with_defaults() -> Result<Self, ClientError> {
        Self::new(ClientConfig::default())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ── Submission ───────────────────────────────────────────────────────

    /// Submit a conversion job to the asynchronous endpoint.
    ///
    /// Returns as soon as the server has queued the job; the returned
    /// [`TaskHandle`] feeds [`ConvertClient::wait_for`].
    pub async fn submit(&self, request: &ConvertRequest) -> Result<TaskHandle, ClientError> {
        let v = self
            .post_json("/convert/source/async", request, self.config.request_timeout)
            .await?;
        let handle: TaskHandle =
            serde_json::from_value(v).map_err(|e| ClientError::UnexpectedResponse {
                url: self.config.endpoint("/convert/source/async"),
                reason: format!("missing task_id: {e}"),
            })?;
        info!("submitted conversion task {}", handle.task_id);
        Ok(handle)
    }

    /// Submit to the synchronous endpoint and return the result envelope.
    ///
    /// "Synchronous" is server-side: the connection stays open until the
    /// server finishes converting, bounded by
    /// [`ClientConfig::convert_timeout`]. No task id is involved.
    pub async fn submit_sync(&self, request: &ConvertRequest) -> Result<Value, ClientError> {
        self.post_json("/convert/source", request, self.config.convert_timeout)
            .await
    }

    // ── Task queries ─────────────────────────────────────────────────────

    /// Fetch the current status of a task.
    pub async fn task_status(&self, task_id: &str) -> Result<TaskStatus, ClientError> {
        let path = format!("/tasks/{task_id}");
        let v = self.get_json(&path).await?;
        serde_json::from_value(v).map_err(|e| ClientError::UnexpectedResponse {
            url: self.config.endpoint(&path),
            reason: e.to_string(),
        })
    }

    /// Fetch the result envelope of a completed task.
    pub async fn task_result(&self, task_id: &str) -> Result<Value, ClientError> {
        self.get_json(&format!("/tasks/{task_id}/result")).await
    }

    // ── Polling ──────────────────────────────────────────────────────────

    /// Poll a task at a fixed interval until it completes, fails, or the
    /// timeout budget runs out; on completion, fetch and return the result
    /// envelope.
    ///
    /// Status queries are strictly sequential: the next query is only issued
    /// after the previous response arrived and the interval elapsed.
    ///
    /// # Errors
    /// - [`ClientError::JobFailed`] when the server reports `failed`, with
    ///   the full status payload; no further queries are issued.
    /// - [`ClientError::JobTimeout`] when the budget elapses with no
    ///   terminal status observed.
    /// - Transport and HTTP-status failures from any single query, verbatim.
    pub async fn wait_for(
        &self,
        task_id: &str,
        options: &PollOptions,
    ) -> Result<Value, ClientError> {
        let mut machine = PollMachine::new(options);
        let started = Instant::now();

        loop {
            if !machine.query_allowed(started.elapsed()) {
                let waited = started.elapsed();
                warn!(
                    "task {task_id} still not terminal after {:.1}s, giving up",
                    waited.as_secs_f64()
                );
                return Err(ClientError::JobTimeout {
                    task_id: task_id.to_string(),
                    timeout: options.timeout,
                    waited,
                });
            }

            let status = self.task_status(task_id).await?;
            let elapsed = started.elapsed();
            debug!(
                "task {task_id}: {} at {:.1}s",
                status.task_status,
                elapsed.as_secs_f64()
            );
            if let Some(observer) = &options.observer {
                observer.on_status(task_id, status.task_status, elapsed);
            }

            match machine.observe(status.task_status) {
                PollStep::FetchResult => return self.task_result(task_id).await,
                PollStep::Fail => {
                    return Err(ClientError::JobFailed {
                        task_id: task_id.to_string(),
                        status: status.to_value(),
                    })
                }
                PollStep::Wait(interval) => tokio::time::sleep(interval).await,
            }
        }
    }

    /// Submit to the async endpoint and wait for the result envelope.
    pub async fn convert_and_wait(
        &self,
        request: &ConvertRequest,
        options: &PollOptions,
    ) -> Result<Value, ClientError> {
        let handle = self.submit(request).await?;
        self.wait_for(&handle.task_id, options).await
    }

    // ── Fan-out ──────────────────────────────────────────────────────────

    /// Convert a batch of sources concurrently, resolving each result.
    ///
    /// Each source becomes its own job with its own polling loop; at most
    /// `concurrency` jobs are in flight at once, sharing this client's HTTP
    /// connection pool. Results come back in input order once every job has
    /// reached a terminal state — one job failing or timing out does not
    /// disturb the others.
    pub async fn convert_all(
        &self,
        sources: Vec<SourceSpec>,
        options: Option<ConvertOptions>,
        poll: &PollOptions,
        concurrency: usize,
    ) -> Vec<Result<ResolvedContent, ClientError>> {
        let total = sources.len();
        info!("converting {total} sources with concurrency {concurrency}");

        let mut indexed: Vec<(usize, Result<ResolvedContent, ClientError>)> =
            stream::iter(sources.into_iter().enumerate().map(|(i, source)| {
                let options = options.clone();
                async move {
                    let label = source.describe().to_string();
                    let request = ConvertRequest {
                        sources: vec![source],
                        options,
                    };
                    let outcome = self
                        .convert_and_wait(&request, poll)
                        .await
                        .map(|envelope| resolve_content(&envelope));
                    match &outcome {
                        Ok(content) => debug!("'{label}' resolved as {}", content.kind()),
                        Err(e) => warn!("'{label}' failed: {e}"),
                    }
                    (i, outcome)
                }
            }))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }

    // ── HTTP plumbing ────────────────────────────────────────────────────

    async fn post_json(
        &self,
        path: &str,
        body: &impl serde::Serialize,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        let url = self.config.endpoint(path);
        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        decode_json(url, response).await
    }

    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let url = self.config.endpoint(path);
        let response = self
            .http
            .get(&url)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        decode_json(url, response).await
    }
}

/// Map a non-success status to [`ClientError::HttpStatus`] with the body
/// attached, otherwise decode the body as JSON.
async fn decode_json(url: String, response: reqwest::Response) -> Result<Value, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ClientError::HttpStatus { status, url, body });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| ClientError::UnexpectedResponse {
            url,
            reason: e.to_string(),
        })
}
