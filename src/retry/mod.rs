//! Retry Module
//!
//! Bounded retries with linear or exponential backoff for one-shot network
//! calls. Only transient failures (network errors, 5xx) are retried by default.

mod executor;
mod policy;

pub use executor::retry;
pub use policy::{
    default_should_retry, Backoff, ParseBackoffError, RetryOptions, RetryableError,
    DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS,
};
