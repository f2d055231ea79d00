//! # Aura Domain
//!
//! Domain types for the Aura provisioning client.
//!
//! This crate contains:
//! - Credentials and access tokens
//! - Instance descriptors and request payloads
//! - The client error taxonomy and Result definition
//! - Client settings and wire constants
//!
//! ## Architecture
//! - No dependencies on other Aura crates
//! - No I/O; pure data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::ClientSettings;
pub use errors::*;
pub use types::*;
