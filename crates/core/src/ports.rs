//! Port interfaces for the provisioning API

use async_trait::async_trait;
use aura_domain::{AccessToken, CreateInstanceRequest, CreatedInstance, InstanceDetails, Result};

use crate::context::CallContext;

/// Operations offered by the Aura provisioning API.
///
/// Possible values for the request parameters are listed in the Aura API
/// documentation.
#[async_trait]
pub trait InstanceApi: Send + Sync {
    /// Create a new instance, returning its connection details and the
    /// initial admin credentials.
    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
        ctx: &CallContext,
    ) -> Result<CreatedInstance>;

    /// Get information about an instance identified by its Aura id.
    async fn get_instance(&self, id: &str, ctx: &CallContext) -> Result<InstanceDetails>;

    /// Put an instance on pause. Aura resumes paused instances automatically
    /// after a while.
    async fn pause_instance(&self, id: &str, ctx: &CallContext) -> Result<()>;

    /// Tear down an instance. An instance that no longer exists counts as
    /// destroyed.
    async fn destroy_instance(&self, id: &str, ctx: &CallContext) -> Result<()>;
}

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a valid access token, fetching a new one if none is cached or the
    /// cached one expired.
    async fn access_token(&self) -> Result<AccessToken>;

    /// Drop `rejected` from the cache so the next [`Self::access_token`] call
    /// re-authenticates. A token cached since `rejected` was issued is kept.
    async fn invalidate(&self, rejected: &AccessToken);
}
