//! Blocking conversion client.
//!
//! Same protocol, same [`crate::poll`] machine, different suspension
//! primitive: every network call and every interval wait occupies the
//! calling thread (`reqwest::blocking` + `std::thread::sleep`). One job
//! advances at a time per thread.
//!
//! Use this from plain synchronous code — build scripts, test harnesses,
//! programs with no async runtime. Inside a tokio runtime use
//! [`crate::client::ConvertClient`] instead; `reqwest::blocking` panics
//! there by design.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::poll::{PollMachine, PollOptions, PollStep};
use crate::protocol::{ConvertRequest, TaskHandle, TaskStatus};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Thread-blocking client for the conversion service.
///
/// Method-for-method equivalent to [`crate::client::ConvertClient`]; given
/// the same backend responses the two produce identical results and error
/// kinds.
#[derive(Debug)]
pub struct BlockingClient {
    http: reqwest::blocking::Client,
    config: ClientConfig,
}

impl BlockingClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn with_defaults() -> Result<Self, ClientError> {
        Self::new(ClientConfig::default())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit a conversion job to the asynchronous endpoint.
    pub fn submit(&self, request: &ConvertRequest) -> Result<TaskHandle, ClientError> {
        let v = self.post_json("/convert/source/async", request, self.config.request_timeout)?;
        let handle: TaskHandle =
            serde_json::from_value(v).map_err(|e| ClientError::UnexpectedResponse {
                url: self.config.endpoint("/convert/source/async"),
                reason: format!("missing task_id: {e}"),
            })?;
        info!("submitted conversion task {}", handle.task_id);
        Ok(handle)
    }

    /// Submit to the synchronous endpoint and return the result envelope.
    pub fn submit_sync(&self, request: &ConvertRequest) -> Result<Value, ClientError> {
        self.post_json("/convert/source", request, self.config.convert_timeout)
    }

    /// Fetch the current status of a task.
    pub fn task_status(&self, task_id: &str) -> Result<TaskStatus, ClientError> {
        let path = format!("/tasks/{task_id}");
        let v = self.get_json(&path)?;
        serde_json::from_value(v).map_err(|e| ClientError::UnexpectedResponse {
            url: self.config.endpoint(&path),
            reason: e.to_string(),
        })
    }

    /// Fetch the result envelope of a completed task.
    pub fn task_result(&self, task_id: &str) -> Result<Value, ClientError> {
        self.get_json(&format!("/tasks/{task_id}/result"))
    }

    /// Poll a task to a terminal state; see
    /// [`ConvertClient::wait_for`](crate::client::ConvertClient::wait_for)
    /// for the contract. The loop body is the same machine, step for step;
    /// only the sleep differs.
    pub fn wait_for(&self, task_id: &str, options: &PollOptions) -> Result<Value, ClientError> {
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

            let status = self.task_status(task_id)?;
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
                PollStep::FetchResult => return self.task_result(task_id),
                PollStep::Fail => {
                    return Err(ClientError::JobFailed {
                        task_id: task_id.to_string(),
                        status: status.to_value(),
                    })
                }
                PollStep::Wait(interval) => std::thread::sleep(interval),
            }
        }
    }

    /// Submit to the async endpoint and wait for the result envelope.
    pub fn convert_and_wait(
        &self,
        request: &ConvertRequest,
        options: &PollOptions,
    ) -> Result<Value, ClientError> {
        let handle = self.submit(request)?;
        self.wait_for(&handle.task_id, options)
    }

    // ── HTTP plumbing ────────────────────────────────────────────────────

    fn post_json(
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
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        decode_json(url, response)
    }

    fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let url = self.config.endpoint(path);
        let response = self
            .http
            .get(&url)
            .timeout(self.config.request_timeout)
            .send()
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        decode_json(url, response)
    }
}

fn decode_json(url: String, response: reqwest::blocking::Response) -> Result<Value, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ClientError::HttpStatus { status, url, body });
    }
    response
        .json::<Value>()
        .map_err(|e| ClientError::UnexpectedResponse {
            url,
            reason: e.to_string(),
        })
}
