//! API Module
//!
//! Fetch-style calls to the chat backend that sit beside the stream reader:
//! cached, retried, JSON in and out.

mod client;

pub use client::ApiClient;
