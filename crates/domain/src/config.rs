//! Client settings loaded from the environment or a config file

use serde::Deserialize;

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS,
};

/// Serializable client configuration.
///
/// Only the credential triple is required; everything else falls back to the
/// public Aura defaults.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ClientSettings {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub retries: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ClientSettings {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
            endpoint: default_endpoint(),
            version: default_version(),
            retries: DEFAULT_MAX_RETRIES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("endpoint", &self.endpoint)
            .field("version", &self.version)
            .field("retries", &self.retries)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_when_fields_missing() {
        let settings: ClientSettings = serde_json::from_str(
            r#"{"client_id": "foo", "client_secret": "bar", "tenant_id": "mox"}"#,
        )
        .unwrap();

        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.version, "v1");
        assert_eq!(settings.retries, 0);
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings, ClientSettings::new("foo", "bar", "mox"));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let result: Result<ClientSettings, _> =
            serde_json::from_str(r#"{"client_id": "foo", "tenant_id": "mox"}"#);
        assert!(result.is_err());
    }
}
