//! Chat Client - send one message and print the streamed answer
//!
//! Usage: `chat_client <message...>`. The session and mode come from
//! `CHAT_SESSION_ID` (default: a fresh id) and `CHAT_MODE` (default: agent).

use std::io::Write;

use anyhow::{bail, Context};
use futures::StreamExt;
use serde_json::{Map, Value};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_client_core::models::ChatRequest;
use chat_client_core::stream::StreamEvent;
use chat_client_core::{AppContext, Config};

/// Main entry point for the chat client.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the client context (cache, sweep task, analytics, readers)
/// 4. Stream the answer to stdout until done, error or Ctrl+C
/// 5. Shut the context down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_client_core=info,chat_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let message = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let session_id = std::env::var("CHAT_SESSION_ID")
        .unwrap_or_else(|_| format!("cli-{}", chrono::Utc::now().timestamp_millis()));
    let mode = std::env::var("CHAT_MODE").unwrap_or_else(|_| "agent".to_string());

    let request = ChatRequest::new(message, session_id, mode);
    if let Some(problem) = request.validate() {
        bail!("{problem}");
    }

    let config = Config::from_env();
    info!(endpoint = %config.chat_stream_url(), "Starting chat client");

    let ctx = AppContext::from_config(&config);
    let outcome = run(&ctx, &request).await;

    let tracked = ctx.analytics.lock().map(|a| a.len()).unwrap_or_default();
    info!(events = tracked, "Recorded analytics events");
    ctx.shutdown().await;

    outcome
}

/// Streams one answer, printing text deltas as they arrive.
async fn run(ctx: &AppContext, request: &ChatRequest) -> anyhow::Result<()> {
    track(ctx, "message_sent", &request.mode);

    let mut stream = ctx.streams.open(request);
    let cancel = stream.cancel_handle();
    let mut stdout = std::io::stdout();
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = stream.next() => match event {
                Some(StreamEvent::Chunk(chunk)) => {
                    if let Some(tool) = &chunk.tool {
                        info!(tool = %tool, "Tool running");
                    }
                    if let Some(err) = &chunk.error {
                        warn!(error = %err, "Backend reported an error");
                    }
                    write!(stdout, "{}", chunk.chunk).context("writing to stdout")?;
                    stdout.flush().context("flushing stdout")?;
                    if let Some(tools) = &chunk.tools_used {
                        info!(tools = ?tools, "Tools used");
                    }
                }
                Some(StreamEvent::Done) => {
                    writeln!(stdout).context("writing to stdout")?;
                    track(ctx, "message_completed", &request.mode);
                    return Ok(());
                }
                Some(StreamEvent::Error(err)) => {
                    track(ctx, "message_failed", &request.mode);
                    return Err(err).context("chat stream failed");
                }
                None => return Ok(()),
            },
            _ = &mut ctrl_c => {
                cancel.cancel();
                warn!("Received Ctrl+C, stream cancelled");
                return Ok(());
            }
        }
    }
}

fn track(ctx: &AppContext, name: &str, mode: &str) {
    let mut properties = Map::new();
    properties.insert("mode".to_string(), Value::from(mode));
    if let Ok(mut recorder) = ctx.analytics.lock() {
        recorder.track(name, Some(properties));
    }
}
