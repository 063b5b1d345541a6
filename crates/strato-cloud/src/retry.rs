//! Predicate polling with exponential backoff
//!
//! Control-plane operations are asynchronous on the provider side (a
//! firewall insert returns before the rule is live), so callers poll a
//! predicate until it reports readiness.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry configuration for provider operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts
    pub max_attempts: u32,

    /// Initial delay between attempts (milliseconds)
    pub initial_delay_ms: u64,

    /// Maximum delay between attempts (milliseconds)
    pub max_delay_ms: u64,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before the attempt after `attempt` (milliseconds)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        (delay as u64).min(self.max_delay_ms)
    }
}

/// Poll `predicate` until it returns `Ok(true)` or attempts run out.
///
/// The predicate is an async closure returning `Ok(true)` when the
/// awaited condition holds, `Ok(false)` to keep polling. Errors from the
/// predicate abort the poll immediately.
pub async fn poll_until<F, Fut>(
    config: &RetryConfig,
    description: &str,
    mut predicate: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    for attempt in 0..config.max_attempts {
        if predicate().await? {
            tracing::debug!("{} satisfied after {} attempt(s)", description, attempt + 1);
            return Ok(());
        }

        // no sleep after the final attempt
        if attempt + 1 < config.max_attempts {
            let delay_ms = config.delay_for_attempt(attempt);
            tracing::debug!("{} not ready, retrying in {}ms", description, delay_ms);
            sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    Err(CloudError::Timeout(format!(
        "{} not satisfied after {} attempts",
        description, config.max_attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
            backoff_multiplier: 2.0,
        };

        assert_eq!(config.delay_for_attempt(0), 1000);
        assert_eq!(config.delay_for_attempt(1), 2000);
        assert_eq!(config.delay_for_attempt(2), 4000);
        assert_eq!(config.delay_for_attempt(3), 8000);
        assert_eq!(config.delay_for_attempt(4), 10000); // capped at max
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_succeeds() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 10,
            max_delay_ms: 100,
            backoff_multiplier: 2.0,
        };

        let result = poll_until(&config, "firewall ready", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(n >= 2) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_times_out() {
        let config = RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 10,
            max_delay_ms: 100,
            backoff_multiplier: 2.0,
        };

        let result = poll_until(&config, "firewall ready", || async { Ok(false) }).await;

        assert!(matches!(result, Err(CloudError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_poll_until_propagates_errors() {
        let config = RetryConfig::default();

        let result = poll_until(&config, "firewall ready", || async {
            Err(CloudError::ApiError("boom".to_string()))
        })
        .await;

        assert!(matches!(result, Err(CloudError::ApiError(_))));
    }
}
