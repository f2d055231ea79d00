//! Domain types and models

pub mod auth;
pub mod instance;

pub use auth::{AccessToken, Credentials};
pub use instance::{CreateInstanceRequest, CreatedInstance, DataShape, InstanceDetails};
