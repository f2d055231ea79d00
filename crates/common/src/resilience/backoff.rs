//! Exponential backoff with jitter
//!
//! Delays grow as `initial_delay * base^retry` and are capped at
//! `max_delay`. Jitter randomizes each delay, and a [`BackoffSchedule`]
//! never yields a delay shorter than the one before it.

use std::time::Duration;

use rand::Rng;

/// Jitter type for adding randomness to retry delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// No jitter
    None,
    /// Equal jitter: calculated_delay/2 to calculated_delay
    Equal,
}

impl Jitter {
    /// Apply jitter to the calculated delay
    #[must_use]
    pub fn apply(self, delay: Duration) -> Duration {
        match self {
            Self::None => delay,
            Self::Equal => {
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                let half = delay_ms / 2;
                let jitter_ms = if half == 0 { 0 } else { rand::thread_rng().gen_range(0..=half) };
                Duration::from_millis(delay_ms - half + jitter_ms)
            }
        }
    }
}

/// Exponential backoff configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    pub initial_delay: Duration,
    pub base: f64,
    pub max_delay: Duration,
    pub jitter: Jitter,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            base: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: Jitter::Equal,
        }
    }
}

impl ExponentialBackoff {
    /// Zero delays, for tests and callers that handle pacing themselves.
    #[must_use]
    pub fn none() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            base: 1.0,
            max_delay: Duration::ZERO,
            jitter: Jitter::None,
        }
    }

    /// Un-jittered delay before retry number `retry` (0-based).
    #[must_use]
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay.as_millis() as f64 * self.base.max(1.0).powi(exponent);
        let max_ms = self.max_delay.as_millis() as f64;
        Duration::from_millis(delay_ms.min(max_ms) as u64)
    }

    /// Start a fresh schedule for one retry sequence.
    #[must_use]
    pub fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule { config: self.clone(), retry: 0, last: Duration::ZERO }
    }
}

/// Stateful sequence of delays for one retry loop.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    config: ExponentialBackoff,
    retry: u32,
    last: Duration,
}

impl BackoffSchedule {
    /// Number of delays handed out so far.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retry
    }
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let jittered = self.config.jitter.apply(self.config.calculate_delay(self.retry));
        let delay = jittered.max(self.last).min(self.config.max_delay);
        self.retry = self.retry.saturating_add(1);
        self.last = delay;
        Some(delay)
    }
}
