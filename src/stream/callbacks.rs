//! Callback adapter over [`ChatStream`] for callers that prefer
//! `on_chunk` / `on_error` / `on_done` hooks to polling a stream.

use futures::StreamExt;
use tracing::debug;

use crate::error::ClientError;
use crate::models::{ChatRequest, StreamChunk};
use crate::stream::{CancelHandle, StreamEvent, StreamReader};

/// Opens a stream and dispatches its events to the given callbacks.
///
/// `on_chunk` runs once per chunk in arrival order. Then exactly one of
/// `on_error` or `on_done` runs, unless the returned handle is cancelled
/// first, in which case neither does. Must be called from within a tokio
/// runtime.
pub fn create_stream_reader<C, E, D>(
    reader: &StreamReader,
    request: &ChatRequest,
    mut on_chunk: C,
    on_error: E,
    on_done: D,
) -> CancelHandle
where
    C: FnMut(StreamChunk) + Send + 'static,
    E: FnOnce(ClientError) + Send + 'static,
    D: FnOnce() + Send + 'static,
{
    let mut stream = reader.open(request);
    let handle = stream.cancel_handle();
    let guard = handle.clone();

    tokio::spawn(async move {
        while let Some(event) = stream.next().await {
            if guard.is_cancelled() {
                break;
            }
            match event {
                StreamEvent::Chunk(chunk) => on_chunk(chunk),
                StreamEvent::Error(err) => {
                    on_error(err);
                    return;
                }
                StreamEvent::Done => {
                    on_done();
                    return;
                }
            }
        }
        debug!("Stream callbacks stopped by cancellation");
    });

    handle
}
