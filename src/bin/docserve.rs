//! CLI binary for docserve-client.
//!
//! A thin shim over the library crate that maps subcommands and flags to
//! client calls and prints results. Exit codes: 0 on success, 1 on any
//! handled error, 130 when interrupted.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docserve_client::{
    resolve_content, resolve_source, ClientConfig, ConvertClient, ConvertRequest, PollObserver,
    PollOptions, TaskState,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── Polling spinner ──────────────────────────────────────────────────────────

/// Terminal observer for `--wait`: one spinner line showing the latest
/// server-reported status and the elapsed time.
struct WaitSpinner {
    bar: ProgressBar,
}

impl WaitSpinner {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Waiting");
        bar.set_message("submitting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PollObserver for WaitSpinner {
    fn on_status(&self, task_id: &str, state: TaskState, elapsed: Duration) {
        self.bar.set_message(format!(
            "task {task_id}: {state}  ({:.0}s)",
            elapsed.as_secs_f64()
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Submit a URL, print the task id
  docserve convert-url https://arxiv.org/pdf/2501.17887

  # Submit and wait for the converted markdown
  docserve convert-url https://arxiv.org/pdf/2501.17887 --wait

  # Ask for a specific output format, save to a file
  docserve convert-url https://arxiv.org/pdf/2501.17887 --wait --format markdown -o paper.md

  # One-shot conversion over the synchronous endpoint
  docserve convert-url-sync https://arxiv.org/pdf/2501.17887

  # Convert a local file (uploaded inline) or a path inside the server
  docserve convert-file ./input/report.pdf
  docserve convert-file /app/input/report.pdf

  # Async file conversion with polling
  docserve convert-file-async ./input/report.pdf --wait --timeout 600

  # Inspect a running task
  docserve status 6fa2…
  docserve result 6fa2…
  docserve wait 6fa2… --poll-interval 5

ENVIRONMENT VARIABLES:
  DOCSERVE_BASE_URL   Base URL of the conversion service (default: http://localhost:5001/v1)

EXIT CODES:
  0   success
  1   any handled error (transport, HTTP status, job failure, timeout)
  130 interrupted
"#;

/// Submit document-conversion jobs and track them.
#[derive(Parser, Debug)]
#[command(
    name = "docserve",
    version,
    about = "Client for remote document-conversion services",
    long_about = "Submit documents (URLs, local files, or server-side paths) to a remote \
conversion service, poll job status, and retrieve the converted output.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Base URL of the conversion service API.
    #[arg(
        long,
        global = true,
        env = "DOCSERVE_BASE_URL",
        default_value = docserve_client::DEFAULT_BASE_URL
    )]
    base_url: String,

    /// Print raw JSON payloads instead of resolved content.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress progress output; errors only.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a URL to the async endpoint; optionally wait for the result.
    ConvertUrl {
        /// Document URL the server downloads itself.
        url: String,
        /// Requested output format (e.g. markdown); server default if absent.
        #[arg(long)]
        format: Option<String>,
        /// Poll until the job finishes and print the result.
        #[arg(long)]
        wait: bool,
        /// Polling budget in seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
        /// Seconds between status queries.
        #[arg(long, default_value_t = 2)]
        poll_interval: u64,
        /// Write the result to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a URL over the synchronous endpoint (blocks until done).
    ConvertUrlSync {
        url: String,
        #[arg(long)]
        format: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a file over the synchronous endpoint. A local file is
    /// uploaded inline; anything else is treated as a server-side path.
    ConvertFile {
        file: String,
        #[arg(long)]
        format: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Submit a file to the async endpoint; optionally wait for the result.
    ConvertFileAsync {
        file: String,
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        wait: bool,
        #[arg(long, default_value_t = 300)]
        timeout: u64,
        #[arg(long, default_value_t = 2)]
        poll_interval: u64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the current status of a task.
    Status { task_id: String },
    /// Fetch and print the result of a completed task.
    Result { task_id: String },
    /// Poll an existing task until it reaches a terminal state.
    Wait {
        task_id: String,
        #[arg(long, default_value_t = 300)]
        timeout: u64,
        #[arg(long, default_value_t = 2)]
        poll_interval: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // Ctrl-C races the command; the interrupted path must not be reported
    // as an ordinary failure.
    let outcome = tokio::select! {
        res = run(&cli) => res,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("interrupted");
            std::process::exit(130);
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = ClientConfig::builder()
        .base_url(&cli.base_url)
        .build()
        .context("invalid --base-url")?;
    let client = ConvertClient::new(config).context("failed to build HTTP client")?;

    match &cli.command {
        Command::ConvertUrl {
            url,
            format,
            wait,
            timeout,
            poll_interval,
            output,
        } => {
            let request = ConvertRequest::single(resolve_source(url)?, format.clone());
            submit_and_maybe_wait(
                cli,
                &client,
                &request,
                *wait,
                *timeout,
                *poll_interval,
                output.as_deref(),
            )
            .await
        }
        Command::ConvertUrlSync { url, format, output } => {
            let request = ConvertRequest::single(resolve_source(url)?, format.clone());
            let envelope = client
                .submit_sync(&request)
                .await
                .context("synchronous conversion failed")?;
            emit(cli, &envelope, output.as_deref()).await
        }
        Command::ConvertFile { file, format, output } => {
            let request = ConvertRequest::single(resolve_source(file)?, format.clone());
            let envelope = client
                .submit_sync(&request)
                .await
                .context("synchronous conversion failed")?;
            emit(cli, &envelope, output.as_deref()).await
        }
        Command::ConvertFileAsync {
            file,
            format,
            wait,
            timeout,
            poll_interval,
            output,
        } => {
            let request = ConvertRequest::single(resolve_source(file)?, format.clone());
            submit_and_maybe_wait(
                cli,
                &client,
                &request,
                *wait,
                *timeout,
                *poll_interval,
                output.as_deref(),
            )
            .await
        }
        Command::Status { task_id } => {
            let status = client
                .task_status(task_id)
                .await
                .context("status query failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status.to_value())?);
            } else {
                println!("Status:  {}", status.task_status);
                println!("Task ID: {}", status.task_id);
            }
            Ok(())
        }
        Command::Result { task_id } => {
            let envelope = client
                .task_result(task_id)
                .await
                .context("result fetch failed")?;
            emit(cli, &envelope, None).await
        }
        Command::Wait {
            task_id,
            timeout,
            poll_interval,
        } => {
            let envelope = wait_with_spinner(cli, &client, task_id, *timeout, *poll_interval)
                .await
                .context("wait failed")?;
            emit(cli, &envelope, None).await
        }
    }
}

/// Shared tail of the two async-submission commands: print the task id,
/// then poll and emit the result when `--wait` was given.
async fn submit_and_maybe_wait(
    cli: &Cli,
    client: &ConvertClient,
    request: &ConvertRequest,
    wait: bool,
    timeout: u64,
    poll_interval: u64,
    output: Option<&Path>,
) -> Result<()> {
    let handle = client.submit(request).await.context("submission failed")?;

    if !wait {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&handle)?);
        } else {
            println!("Task ID: {}", handle.task_id);
        }
        return Ok(());
    }

    // Waiting: the task id goes to stderr so stdout carries only the result.
    if !cli.quiet {
        eprintln!("Task ID: {}", handle.task_id);
    }
    let envelope = wait_with_spinner(cli, client, &handle.task_id, timeout, poll_interval)
        .await
        .context("waiting for conversion failed")?;
    emit(cli, &envelope, output).await
}

/// Poll a task with a spinner on stderr (unless quiet or JSON output).
async fn wait_with_spinner(
    cli: &Cli,
    client: &ConvertClient,
    task_id: &str,
    timeout: u64,
    poll_interval: u64,
) -> Result<Value> {
    let mut options = PollOptions::from_secs(timeout, poll_interval);

    let spinner = if !cli.quiet && !cli.json {
        let s = WaitSpinner::new();
        options = options.with_observer(Arc::clone(&s) as Arc<dyn PollObserver>);
        Some(s)
    } else {
        None
    };

    let outcome = client.wait_for(task_id, &options).await;
    if let Some(s) = spinner {
        s.finish();
    }
    Ok(outcome?)
}

/// Print or save a result envelope: resolved content by default, the raw
/// payload with `--json`. File writes are atomic (temp file + rename).
async fn emit(cli: &Cli, envelope: &Value, output: Option<&Path>) -> Result<()> {
    let text = if cli.json {
        serde_json::to_string_pretty(envelope)?
    } else {
        resolve_content(envelope).render()
    };

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &text)
            .await
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .with_context(|| format!("failed to rename into {}", path.display()))?;
        if !cli.quiet {
            eprintln!("saved result to {}", path.display());
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}
