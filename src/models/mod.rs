//! Models Module
//!
//! Wire shapes exchanged with the chat backend.

mod requests;
mod responses;

pub use requests::ChatRequest;
pub use responses::StreamChunk;
