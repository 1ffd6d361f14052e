//! Stream Module
//!
//! Incremental ingestion of the chat backend's streamed answer.
//!
//! The body is newline-delimited JSON (optionally SSE-framed). Partial lines
//! are held across network reads, chunks are delivered strictly in order, and
//! each stream reports exactly one of done, error or (when cancelled) nothing.

mod callbacks;
mod decoder;
mod reader;

pub use callbacks::create_stream_reader;
pub use decoder::{parse_line, Frame, LineDecoder};
pub use reader::{collect_text, CancelHandle, ChatStream, StreamEvent, StreamReader};
