//! Common utilities shared across Aura client crates.
//!
//! Currently this is the resilience toolkit used by the HTTP layer: an
//! exponential backoff schedule with jitter.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod resilience;

pub use resilience::{BackoffSchedule, ExponentialBackoff, Jitter};
