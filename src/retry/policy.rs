//! Retry Policy Module
//!
//! Backoff strategies, per-call retry options and the default decision of
//! which failures are transient.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::config::Config;
use crate::error::ClientError;

// == Public Constants ==
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

// == Backoff ==
/// Strategy for growing the wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Wait `delay * attempt`
    Linear,
    /// Wait `delay * 2^(attempt - 1)`
    #[default]
    Exponential,
}

impl Backoff {
    /// Returns the wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(self, base: Duration, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self {
            Backoff::Linear => base.saturating_mul(attempt),
            Backoff::Exponential => {
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                base.saturating_mul(factor)
            }
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown backoff strategy '{0}', expected 'linear' or 'exponential'")]
pub struct ParseBackoffError(String);

impl FromStr for Backoff {
    type Err = ParseBackoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Backoff::Linear),
            "exponential" => Ok(Backoff::Exponential),
            other => Err(ParseBackoffError(other.to_string())),
        }
    }
}

// == Retryable Error ==
/// Error shape the default retry predicate inspects.
///
/// Implementors only need `Display`; override the methods when the error
/// type knows its status code or transport class more precisely than its
/// message does.
pub trait RetryableError: fmt::Display {
    /// HTTP status associated with the failure, if any.
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// Whether the failure happened below the application protocol.
    fn is_network_failure(&self) -> bool {
        message_indicates_network(&self.to_string())
    }
}

fn message_indicates_network(message: &str) -> bool {
    message.contains("Network") || message.contains("Failed to fetch")
}

impl RetryableError for ClientError {
    fn status_code(&self) -> Option<u16> {
        self.status()
    }

    fn is_network_failure(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout(_))
            || message_indicates_network(&self.to_string())
    }
}

impl RetryableError for reqwest::Error {
    fn status_code(&self) -> Option<u16> {
        self.status().map(|status| status.as_u16())
    }

    fn is_network_failure(&self) -> bool {
        self.is_connect() || self.is_timeout() || self.is_request() || self.is_body()
    }
}

/// Default predicate: retry network failures and 5xx responses only.
///
/// Client-caused errors (4xx, validation, parse failures) are never retried.
pub fn default_should_retry<E: RetryableError + ?Sized>(error: &E) -> bool {
    error.is_network_failure() || error.status_code().is_some_and(|status| status >= 500)
}

type OnRetry<E> = Box<dyn FnMut(u32, &E) + Send>;
type ShouldRetry<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

// == Retry Options ==
/// Configuration for a single [`retry`](crate::retry::retry) call.
pub struct RetryOptions<E> {
    /// Upper bound on calls to the operation, counting the first
    pub max_attempts: u32,
    /// Base delay fed into the backoff strategy
    pub delay: Duration,
    pub backoff: Backoff,
    pub(crate) on_retry: Option<OnRetry<E>>,
    pub(crate) should_retry: Option<ShouldRetry<E>>,
}

impl<E> Default for RetryOptions<E> {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
            backoff: Backoff::Exponential,
            on_retry: None,
            should_retry: None,
        }
    }
}

impl<E> RetryOptions<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options seeded from the client configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            delay: config.retry_delay(),
            backoff: config.retry_backoff,
            ..Self::default()
        }
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Registers a callback run before each wait, with the failed attempt
    /// number and its error.
    pub fn on_retry(mut self, callback: impl FnMut(u32, &E) + Send + 'static) -> Self {
        self.on_retry = Some(Box::new(callback));
        self
    }

    /// Replaces the default retryability predicate.
    pub fn should_retry(mut self, predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.should_retry = Some(Box::new(predicate));
        self
    }
}

impl<E: RetryableError> RetryOptions<E> {
    /// Applies the custom predicate if one is set, the default one otherwise.
    pub(crate) fn allows_retry(&self, error: &E) -> bool {
        match &self.should_retry {
            Some(predicate) => predicate(error),
            None => default_should_retry(error),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .field("backoff", &self.backoff)
            .field("on_retry", &self.on_retry.is_some())
            .field("should_retry", &self.should_retry.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_delays_double() {
        let base = Duration::from_millis(100);
        assert_eq!(Backoff::Exponential.delay_for(base, 1), Duration::from_millis(100));
        assert_eq!(Backoff::Exponential.delay_for(base, 2), Duration::from_millis(200));
        assert_eq!(Backoff::Exponential.delay_for(base, 3), Duration::from_millis(400));
    }

    #[test]
    fn test_linear_delays_grow_by_base() {
        let base = Duration::from_millis(100);
        assert_eq!(Backoff::Linear.delay_for(base, 1), Duration::from_millis(100));
        assert_eq!(Backoff::Linear.delay_for(base, 2), Duration::from_millis(200));
        assert_eq!(Backoff::Linear.delay_for(base, 3), Duration::from_millis(300));
    }

    #[test]
    fn test_exponential_saturates_instead_of_overflowing() {
        let delay = Backoff::Exponential.delay_for(Duration::from_secs(1), 200);
        assert!(delay >= Duration::from_secs(u32::MAX as u64));
    }

    #[test]
    fn test_parse_backoff() {
        assert_eq!("linear".parse::<Backoff>(), Ok(Backoff::Linear));
        assert_eq!(" Exponential ".parse::<Backoff>(), Ok(Backoff::Exponential));
        assert!("fibonacci".parse::<Backoff>().is_err());
    }

    #[test]
    fn test_default_predicate_retries_network_and_5xx() {
        assert!(default_should_retry(&ClientError::Network("connection reset".into())));
        assert!(default_should_retry(&ClientError::Http {
            status: 502,
            body: "bad gateway".into(),
        }));
        assert!(default_should_retry(&ClientError::Http {
            status: 500,
            body: String::new(),
        }));
    }

    #[test]
    fn test_default_predicate_rejects_client_errors() {
        assert!(!default_should_retry(&ClientError::Http {
            status: 404,
            body: "not found".into(),
        }));
        assert!(!default_should_retry(&ClientError::Http {
            status: 422,
            body: "invalid".into(),
        }));
        assert!(!default_should_retry(&ClientError::Parse {
            line: "{".into(),
            reason: "EOF".into(),
        }));
    }

    struct Plain(&'static str);

    impl fmt::Display for Plain {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl RetryableError for Plain {}

    #[test]
    fn test_default_predicate_matches_message() {
        assert!(default_should_retry(&Plain("TypeError: Failed to fetch")));
        assert!(default_should_retry(&Plain("Network request failed")));
        assert!(!default_should_retry(&Plain("validation failed")));
    }

    #[test]
    fn test_options_from_config() {
        let config = Config {
            retry_max_attempts: 5,
            retry_delay_ms: 250,
            retry_backoff: Backoff::Linear,
            ..Config::default()
        };
        let options: RetryOptions<ClientError> = RetryOptions::from_config(&config);
        assert_eq!(options.max_attempts, 5);
        assert_eq!(options.delay, Duration::from_millis(250));
        assert_eq!(options.backoff, Backoff::Linear);
    }
}
