//! Response classification and envelope decoding
//!
//! Every Aura response is read into an [`ApiResponse`] exactly once, which
//! releases the connection. Successful bodies are expected to look like
//! `{"data": {...}}`; the keys a [`DataShape`] requires are checked before
//! serde sees the payload so errors can name the offending field.

use aura_domain::constants::DEPRECATION_HEADER;
use aura_domain::{AuraError, DataShape, DecodeError, Result};
use reqwest::{Response, StatusCode};
use serde_json::Value;

use crate::errors::InfraError;
use crate::http::{correlation_id, header_str};

/// Fully buffered response from the provisioning API.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    url: String,
    request_id: String,
    deprecation: Option<String>,
    body: String,
}

impl ApiResponse {
    /// Consume `response`, reading its body.
    ///
    /// # Errors
    /// Returns [`AuraError::Transport`] if the body cannot be read.
    pub async fn read(response: Response) -> Result<Self> {
        let status = response.status();
        let url = response.url().to_string();
        let request_id = correlation_id(response.headers());
        let deprecation = header_str(response.headers(), DEPRECATION_HEADER);
        let body = response.text().await.map_err(InfraError::from)?;

        Ok(Self { status, url, request_id, deprecation, body })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Value of the `X-Tyk-Api-Expires` header, if the API version in use is
    /// scheduled for removal.
    pub fn deprecation(&self) -> Option<&str> {
        self.deprecation.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Turn a non-2xx response into an [`AuraError::Api`].
    pub fn into_error(self) -> AuraError {
        AuraError::Api { status: self.status.as_u16(), body: self.body, request_id: self.request_id }
    }

    /// Decode the `data` envelope of a successful response.
    ///
    /// # Errors
    /// - [`AuraError::Api`] for a status outside `200..300`
    /// - [`AuraError::Decode`] when the envelope or a required field is
    ///   missing or has the wrong type
    pub fn decode<T: DataShape>(self) -> Result<T> {
        if !self.is_success() {
            return Err(self.into_error());
        }

        match decode_data::<T>(&self.body) {
            Ok(value) => Ok(value),
            Err(source) => {
                Err(AuraError::Decode { source, body: self.body, request_id: self.request_id })
            }
        }
    }
}

/// Project the `data` member of `body` into `T`.
///
/// # Errors
/// Returns the first [`DecodeError`] encountered.
pub fn decode_data<T: DataShape>(body: &str) -> std::result::Result<T, DecodeError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| DecodeError::Malformed(err.to_string()))?;

    let Value::Object(mut envelope) = value else {
        return Err(DecodeError::Malformed("expected response to be a JSON object".into()));
    };

    let data = envelope.remove("data").ok_or(DecodeError::MissingEnvelope)?;

    let Value::Object(fields) = &data else {
        return Err(DecodeError::Malformed(r#"expected "data" to be a JSON object"#.into()));
    };

    for &field in T::REQUIRED_FIELDS {
        match fields.get(field) {
            None => return Err(DecodeError::MissingField(field.to_string())),
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(DecodeError::MismatchedField {
                    field: field.to_string(),
                    expected: "string",
                });
            }
        }
    }

    serde_json::from_value(data).map_err(|err| DecodeError::Malformed(err.to_string()))
}
