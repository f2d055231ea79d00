//! # Aura Core
//!
//! Port interfaces of the Aura client - no HTTP code.
//!
//! This crate contains:
//! - [`InstanceApi`]: the four provisioning operations
//! - [`AccessTokenProvider`]: source of bearer tokens
//! - [`CallContext`]: per-call cancellation and deadline
//!
//! ## Architecture Principles
//! - Only depends on `aura-domain`
//! - Adapters live in `aura-infra`

pub mod context;
pub mod ports;

pub use context::CallContext;
pub use ports::{AccessTokenProvider, InstanceApi};
