//! Aura provisioning API client
//!
//! - [`auth`]: client-credentials token exchange and token cache
//! - [`decoder`]: response classification and `data` envelope decoding
//! - [`client`]: the [`AuraClient`] facade implementing
//!   [`aura_core::InstanceApi`]

pub mod auth;
pub mod client;
pub mod decoder;

pub use auth::{ClientCredentialsAuth, TokenCache};
pub use client::{AuraClient, AuraClientBuilder, ClientConfig};
pub use decoder::{decode_data, ApiResponse};
