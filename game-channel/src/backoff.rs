use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::RetryAttempt;

/// Decides how long to wait before reopening a dropped connection.
pub trait Backoff {
    fn delay(&mut self, attempt: RetryAttempt) -> Duration;
}

impl<F> Backoff for F
where
    F: FnMut(RetryAttempt) -> Duration,
{
    fn delay(&mut self, attempt: RetryAttempt) -> Duration {
        self(attempt)
    }
}

/// Doubles the wait for each consecutive failure, up to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            max: Duration::from_secs(10),
        }
    }
}

impl Backoff for ExponentialBackoff {
    fn delay(&mut self, attempt: RetryAttempt) -> Duration {
        let exponent = attempt.failures.saturating_sub(1);
        self.base
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max)
    }
}

/// Waits `base / remaining`, so retries get faster as the budget shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InverseBudgetBackoff {
    pub base: Duration,
}

impl Default for InverseBudgetBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(2000),
        }
    }
}

impl Backoff for InverseBudgetBackoff {
    fn delay(&mut self, attempt: RetryAttempt) -> Duration {
        self.base / attempt.remaining.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BackoffConfig {
    Exponential { base_ms: u64, max_ms: u64 },
    InverseBudget { base_ms: u64 },
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig::from(ExponentialBackoff::default())
    }
}

impl From<ExponentialBackoff> for BackoffConfig {
    fn from(value: ExponentialBackoff) -> Self {
        BackoffConfig::Exponential {
            base_ms: millis(value.base),
            max_ms: millis(value.max),
        }
    }
}

impl From<InverseBudgetBackoff> for BackoffConfig {
    fn from(value: InverseBudgetBackoff) -> Self {
        BackoffConfig::InverseBudget {
            base_ms: millis(value.base),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Backoff for BackoffConfig {
    fn delay(&mut self, attempt: RetryAttempt) -> Duration {
        match *self {
            BackoffConfig::Exponential { base_ms, max_ms } => ExponentialBackoff {
                base: Duration::from_millis(base_ms),
                max: Duration::from_millis(max_ms),
            }
            .delay(attempt),
            BackoffConfig::InverseBudget { base_ms } => InverseBudgetBackoff {
                base: Duration::from_millis(base_ms),
            }
            .delay(attempt),
        }
    }
}
