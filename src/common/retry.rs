use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: usize = 3;
/// Default delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// How long to wait before the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay every time
    Fixed(Duration),
    /// base * attempt
    Linear(Duration),
    /// base * 2^(attempt-1), optionally capped
    Exponential { base: Duration, max: Option<Duration> },
}

/// Retry limits and delay strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 means try once
    pub max_retries: usize,
    pub backoff: Backoff,
    /// Add up to 25% random extra delay
    #[serde(default)]
    pub jitter: bool,
}

impl RetryPolicy {
    /// Retry `max_retries` times with a fixed delay
    pub fn fixed(max_retries: usize, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed(delay),
            jitter: false,
        }
    }

    pub fn linear(max_retries: usize, base: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Linear(base),
            jitter: false,
        }
    }

    pub fn exponential(max_retries: usize, base: Duration, max: Option<Duration>) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Exponential { base, max },
            jitter: false,
        }
    }

    /// Never retry
    pub fn no_retry() -> Self {
        Self::fixed(0, Duration::ZERO)
    }

    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    /// Total number of calls the policy allows
    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }

    /// Delay after the given failed attempt (1-based), before jitter
    pub fn base_delay(&self, attempt: usize) -> Duration {
        let attempt = attempt.max(1);
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Linear(base) => base.saturating_mul(attempt as u32),
            Backoff::Exponential { base, max } => {
                let factor = 2u32.saturating_pow((attempt - 1) as u32);
                let delay = base.saturating_mul(factor);
                match max {
                    Some(max) => delay.min(max),
                    None => delay,
                }
            }
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let delay = self.base_delay(attempt);
        if !self.jitter {
            return delay;
        }

        // Up to 25% extra to avoid synchronized retries
        let jitter_factor = fastrand::f64() * 0.25;
        delay + delay.mul_f64(jitter_factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

/// Run `operation`, retrying failures according to `policy`.
///
/// Once the retries are used up the last error is returned.
pub async fn retry<T, E, F, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
    log_context: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded after {} attempts", log_context, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt >= max_attempts => {
                error!("{} failed after {} attempts: {}", log_context, attempt, e);
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    log_context, attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
