//! # Aura Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The reqwest-based [`AuraClient`] implementing [`aura_core::InstanceApi`]
//! - OAuth client-credentials authentication with token caching
//! - A retrying HTTP transport
//! - Settings loading from the environment and config files
//!
//! ## Architecture
//! - Implements traits defined in `aura-core`
//! - Depends on `aura-common` and `aura-domain`
//! - Contains all I/O

pub mod api;
pub mod config;
pub mod errors;
pub mod http;

pub use api::{AuraClient, AuraClientBuilder, ClientConfig, ClientCredentialsAuth, TokenCache};
pub use errors::InfraError;
pub use http::HttpClient;
