//! # docserve-client
//!
//! Client for remote document-conversion services: submit a conversion job,
//! poll its status, and retrieve the best available rendering of the result.
//!
//! The server owns the conversion algorithm; this crate owns everything a
//! well-behaved client needs around it — source classification, the two
//! submission modes, the fixed-interval polling state machine with a timeout
//! budget, and resolution of the heterogeneous result envelope.
//!
//! ## Job lifecycle
//!
//! ```text
//! input string
//!  │
//!  ├─ 1. Resolve   URL / local file (inline base64) / server-side path
//!  ├─ 2. Submit    POST /convert/source/async  →  task_id
//!  ├─ 3. Poll      GET /tasks/{id} every interval, within a timeout budget
//!  ├─ 4. Fetch     GET /tasks/{id}/result once the task completes
//!  └─ 5. Resolve   md_content > text_content > html_content > raw envelope
//! ```
//!
//! The synchronous endpoint (`POST /convert/source`) skips steps 2–4: the
//! server holds the connection until conversion finishes.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use docserve_client::{
//!     resolve_content, resolve_source, ClientConfig, ConvertClient, ConvertRequest,
//!     PollOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ConvertClient::new(
//!         ClientConfig::builder()
//!             .base_url("http://localhost:5001/v1")
//!             .build()?,
//!     )?;
//!
//!     let source = resolve_source("https://arxiv.org/pdf/2501.17887")?;
//!     let request = ConvertRequest::single(source, Some("markdown".into()));
//!
//!     let envelope = client.convert_and_wait(&request, &PollOptions::default()).await?;
//!     println!("{}", resolve_content(&envelope).render());
//!     Ok(())
//! }
//! ```
//!
//! ## Execution modes
//!
//! One polling state machine ([`poll::PollMachine`]) serves two clients:
//! [`client::ConvertClient`] suspends cooperatively on a tokio runtime
//! (many jobs interleave on one thread; see
//! [`ConvertClient::convert_all`](client::ConvertClient::convert_all) for
//! fan-out), while [`blocking::BlockingClient`] occupies its thread for one
//! job at a time. Against the same backend responses both produce identical
//! content and error kinds.
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docserve` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docserve-client = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod blocking;
pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod poll;
pub mod protocol;
pub mod source;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use blocking::BlockingClient;
pub use client::ConvertClient;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL};
pub use content::{resolve_content, ResolvedContent};
pub use error::ClientError;
pub use poll::{NoopObserver, PollMachine, PollObserver, PollOptions, PollState, PollStep};
pub use protocol::{ConvertOptions, ConvertRequest, TaskHandle, TaskState, TaskStatus};
pub use source::{is_url, read_upload, resolve_source, FileSource, SourceSpec};
