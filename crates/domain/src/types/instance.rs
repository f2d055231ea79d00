//! Aura instance payloads
//!
//! Field names follow the Aura API specification
//! (<https://neo4j.com/docs/aura/platform/api/specification/>).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Schema of a typed value carried inside the `{"data": ...}` envelope.
///
/// The response decoder checks every key in [`DataShape::REQUIRED_FIELDS`]
/// is present and holds a JSON string before handing `data` to serde.
pub trait DataShape: DeserializeOwned {
    const REQUIRED_FIELDS: &'static [&'static str];
}

/// Parameters for creating an instance. The tenant id is added by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateInstanceRequest {
    pub name: String,
    pub cloud_provider: String,
    pub memory: String,
    pub version: String,
    pub region: String,
    #[serde(rename = "type")]
    pub instance_type: String,
}

impl CreateInstanceRequest {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        cloud_provider: impl Into<String>,
        memory: impl Into<String>,
        version: impl Into<String>,
        region: impl Into<String>,
        instance_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cloud_provider: cloud_provider.into(),
            memory: memory.into(),
            version: version.into(),
            region: region.into(),
            instance_type: instance_type.into(),
        }
    }
}

/// Instance returned by `POST /instances`, including the initial admin login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedInstance {
    pub id: String,
    pub connection_url: String,
    /// Name of the initial admin user
    pub username: String,
    /// Password of the initial admin user
    pub password: String,
    pub name: String,
    pub tenant_id: String,
    /// gcp, aws, ...
    pub cloud_provider: String,
    /// us-east1, eu-central2, ...
    pub region: String,
    /// enterprise-db, professional-db, ...
    #[serde(rename = "type")]
    pub instance_type: String,
}

impl DataShape for CreatedInstance {
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "id",
        "connection_url",
        "username",
        "password",
        "name",
        "tenant_id",
        "cloud_provider",
        "region",
        "type",
    ];
}

/// Instance returned by `GET /instances/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDetails {
    pub id: String,
    pub name: String,
    /// running, creating, paused, ...
    pub status: String,
    pub tenant_id: String,
    pub cloud_provider: String,
    pub connection_url: String,
    pub region: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    /// Allocated memory, e.g. "8GB"
    pub memory: String,
    /// Allocated storage, e.g. "16GB"
    pub storage: String,
}

impl DataShape for InstanceDetails {
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "id",
        "connection_url",
        "name",
        "tenant_id",
        "cloud_provider",
        "region",
        "type",
        "status",
        "memory",
        "storage",
    ];
}
