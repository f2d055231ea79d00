//! Conversions from external infrastructure errors into domain errors.

use aura_domain::AuraError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AuraError);

impl From<InfraError> for AuraError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AuraError> for InfraError {
    fn from(value: AuraError) -> Self {
        InfraError(value)
    }
}

trait IntoAuraError {
    fn into_aura(self) -> AuraError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AuraError */
/* -------------------------------------------------------------------------- */

impl IntoAuraError for HttpError {
    fn into_aura(self) -> AuraError {
        if self.is_builder() {
            return AuraError::Config(format!("invalid HTTP request: {self}"));
        }

        if self.is_timeout() {
            return AuraError::Transport(format!("HTTP request timed out: {self}"));
        }

        if self.is_connect() {
            return AuraError::Transport(format!("HTTP connection failed: {self}"));
        }

        if self.is_body() || self.is_decode() {
            return AuraError::Transport(format!("HTTP body could not be read: {self}"));
        }

        AuraError::Transport(format!("HTTP request failed: {self}"))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_aura())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → AuraError */
/* -------------------------------------------------------------------------- */

impl IntoAuraError for serde_json::Error {
    fn into_aura(self) -> AuraError {
        AuraError::Config(format!("request body could not be serialized: {self}"))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(value.into_aura())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → AuraError */
/* -------------------------------------------------------------------------- */

impl IntoAuraError for url::ParseError {
    fn into_aura(self) -> AuraError {
        AuraError::Config(format!("invalid endpoint URL: {self}"))
    }
}

impl From<url::ParseError> for InfraError {
    fn from(value: url::ParseError) -> Self {
        InfraError(value.into_aura())
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn connection_refused_maps_to_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = reqwest::Client::new().get(format!("http://{addr}")).send().await.unwrap_err();
        let mapped: AuraError = InfraError::from(err).into();

        match mapped {
            AuraError::Transport(msg) => assert!(msg.contains("HTTP")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_url_maps_to_config() {
        let err = url::Url::parse("not a url").unwrap_err();
        let mapped: AuraError = InfraError::from(err).into();
        assert!(matches!(mapped, AuraError::Config(msg) if msg.contains("endpoint")));
    }

    #[test]
    fn serialization_failure_maps_to_config() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let mapped: AuraError = InfraError::from(err).into();
        assert!(matches!(mapped, AuraError::Config(_)));
    }

    #[test]
    fn infra_error_round_trips_domain_error() {
        let infra = InfraError::from(AuraError::Cancelled);
        assert!(matches!(AuraError::from(infra), AuraError::Cancelled));
    }
}
