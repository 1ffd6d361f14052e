//! Stream Reader Module
//!
//! Posts a chat request and exposes the response body as an ordered async
//! [`Stream`] of [`StreamEvent`]s. Every stream ends with exactly one
//! terminal event (`Done` or `Error`) unless it is cancelled first, in which
//! case it ends with neither.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{ChatRequest, StreamChunk};
use crate::stream::decoder::{parse_line, Frame, LineDecoder};

/// Chunks buffered between the network task and a slow consumer
const CHANNEL_CAPACITY: usize = 64;

// == Stream Event ==
/// One item of a [`ChatStream`].
#[derive(Debug)]
pub enum StreamEvent {
    /// A parsed chunk, in arrival order
    Chunk(StreamChunk),
    /// Transport or parse failure; nothing follows it
    Error(ClientError),
    /// The body ended normally after all chunks were delivered
    Done,
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Chunk(_))
    }
}

// == Cancel Handle ==
/// Cancels a running stream.
///
/// Cloneable; cancelling is idempotent and a no-op once the stream has
/// already finished.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    task: AbortHandle,
}

impl CancelHandle {
    /// Aborts the underlying request and suppresses any further event.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.task.abort();
            debug!("Chat stream cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// == Chat Stream ==
/// Receiving side of a streaming chat response.
#[derive(Debug)]
pub struct ChatStream {
    rx: mpsc::Receiver<StreamEvent>,
    cancel: CancelHandle,
    finished: bool,
}

impl ChatStream {
    /// Returns a handle that can cancel this stream from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Stream for ChatStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamEvent>> {
        if self.finished || self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }

        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                // A chunk received after cancel() is dropped, not delivered.
                if self.cancel.is_cancelled() {
                    self.finished = true;
                    return Poll::Ready(None);
                }
                if event.is_terminal() {
                    self.finished = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                self.finished = true;
                if self.cancel.is_cancelled() {
                    Poll::Ready(None)
                } else {
                    // The pump task died without reporting an outcome.
                    Poll::Ready(Some(StreamEvent::Error(ClientError::Network(
                        "stream task ended unexpectedly".to_string(),
                    ))))
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        // Nobody is listening any more; stop reading from the network.
        self.cancel.task.abort();
    }
}

// == Stream Reader ==
/// Opens streaming chat requests against one endpoint.
#[derive(Debug, Clone)]
pub struct StreamReader {
    http: reqwest::Client,
    url: String,
    api_token: Option<String>,
    idle_timeout: Option<Duration>,
}

impl StreamReader {
    /// Creates a reader posting to `url` with no auth and no idle timeout.
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            api_token: None,
            idle_timeout: None,
        }
    }

    /// Creates a reader for the configured chat endpoint.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            url: config.chat_stream_url(),
            api_token: config.api_token.clone(),
            idle_timeout: config.idle_timeout(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Fails a stream that receives no bytes for `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    // == Open ==
    /// Sends `request` and starts pumping the response body.
    ///
    /// Must be called from within a tokio runtime. The request is sent on a
    /// background task; failures to connect arrive as the stream's
    /// `Error` event.
    pub fn open(&self, request: &ChatRequest) -> ChatStream {
        let mut builder = self.http.post(&self.url).json(request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        debug!(
            url = %self.url,
            session_id = %request.session_id,
            mode = %request.mode,
            "Opening chat stream"
        );

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let idle_timeout = self.idle_timeout;
        let task = tokio::spawn(async move {
            let terminal = match pump(builder, &tx, idle_timeout).await {
                Ok(()) => StreamEvent::Done,
                Err(err) => {
                    warn!(error = %err, "Chat stream failed");
                    StreamEvent::Error(err)
                }
            };
            let _ = tx.send(terminal).await;
        });

        ChatStream {
            rx,
            cancel: CancelHandle {
                cancelled: Arc::new(AtomicBool::new(false)),
                task: task.abort_handle(),
            },
            finished: false,
        }
    }
}

/// Reads the body line by line, forwarding chunks until the body ends, a
/// `[DONE]` sentinel arrives or the consumer goes away.
async fn pump(
    request: reqwest::RequestBuilder,
    tx: &mpsc::Sender<StreamEvent>,
    idle_timeout: Option<Duration>,
) -> Result<()> {
    let mut resp = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, request.send())
            .await
            .map_err(|_| ClientError::Timeout(limit))??,
        None => request.send().await?,
    };

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let mut decoder = LineDecoder::new();
    let mut delivered = 0usize;

    loop {
        let read = match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, resp.chunk())
                .await
                .map_err(|_| ClientError::Timeout(limit))?,
            None => resp.chunk().await,
        };
        let Some(bytes) = read? else {
            break;
        };

        for line in decoder.push(&bytes) {
            match parse_line(&line)? {
                Frame::Chunk(chunk) => {
                    if tx.send(StreamEvent::Chunk(chunk)).await.is_err() {
                        return Ok(());
                    }
                    delivered += 1;
                }
                Frame::Skip => {}
                Frame::End => {
                    info!(chunks = delivered, "Chat stream finished with sentinel");
                    return Ok(());
                }
            }
        }
    }

    if let Some(rest) = decoder.finish() {
        if let Frame::Chunk(chunk) = parse_line(&rest)? {
            if tx.send(StreamEvent::Chunk(chunk)).await.is_err() {
                return Ok(());
            }
            delivered += 1;
        }
    }

    info!(chunks = delivered, "Chat stream finished");
    Ok(())
}

/// Concatenates the text of a sequence of chunks.
pub fn collect_text<'a>(chunks: impl IntoIterator<Item = &'a StreamChunk>) -> String {
    chunks.into_iter().map(|c| c.chunk.as_str()).collect()
}
