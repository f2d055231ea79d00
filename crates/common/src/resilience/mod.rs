//! Resilience patterns for transient failures
//!
//! - **Backoff**: exponential delay growth between retry attempts, capped
//!   at a maximum and randomized with jitter
//!
//! The retry loop itself lives next to the transport in `aura-infra`; this
//! module only decides how long to wait.

pub mod backoff;

pub use backoff::{BackoffSchedule, ExponentialBackoff, Jitter};
