use std::future::Future;
use std::time::Duration;

use crate::config::{Config, DEFAULT_FETCH_RETRIES, DEFAULT_RETRY_DELAY};
use crate::error::GatewayError;

/// Bounded retry with a fixed pause between attempts. No jitter, no growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never below 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_FETCH_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.fetch_retries, config.retry_delay)
    }

    /// Run `attempt` until it succeeds, fails permanently, or the budget is
    /// spent. Only [`GatewayError::is_transient`] failures are retried.
    pub async fn run<T, F, Fut>(&self, what: &str, mut attempt: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut remaining = self.max_attempts.max(1);
        loop {
            remaining -= 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && remaining > 0 => {
                    log::warn!(
                        "{} failed ({}), retrying in {:?} ({} attempt(s) left)",
                        what,
                        e,
                        self.delay,
                        remaining
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
