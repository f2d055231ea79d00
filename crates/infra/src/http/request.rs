//! Request construction for the provisioning API
//!
//! Builds unsigned `reqwest::Request` values rooted at
//! `{endpoint}/{version}`. Signing is a separate step so the retry loop and
//! the re-authentication path can attach a token to the same request.

use aura_domain::constants::INSTANCES_PATH;
use aura_domain::{AccessToken, AuraError, Result};
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, Request};
use serde::Serialize;

use crate::errors::InfraError;

const JSON: &str = "application/json";

/// Builds requests against the versioned API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequestBuilder {
    client: ReqwestClient,
    base_url: String,
}

impl ApiRequestBuilder {
    pub fn new(client: ReqwestClient, endpoint: &str, version: &str) -> Self {
        let base_url =
            format!("{}/{}", endpoint.trim_end_matches('/'), version.trim_matches('/'));
        Self { client, base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build a request without a body.
    ///
    /// # Errors
    /// Returns [`AuraError::Config`] if the URL cannot be parsed.
    pub fn build(&self, method: Method, path: &str) -> Result<Request> {
        self.client
            .request(method, self.url(path))
            .header(ACCEPT, JSON)
            .build()
            .map_err(|err| InfraError::from(err).into())
    }

    /// Build a request carrying `body` serialized as JSON.
    ///
    /// # Errors
    /// Returns [`AuraError::Config`] if the body cannot be serialized or the
    /// URL cannot be parsed.
    pub fn build_json<B>(&self, method: Method, path: &str, body: &B) -> Result<Request>
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body).map_err(InfraError::from)?;

        self.client
            .request(method, self.url(path))
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .body(payload)
            .build()
            .map_err(|err| InfraError::from(err).into())
    }
}

/// Path of a single instance, with `id` encoded as one path segment.
pub fn instance_path(id: &str) -> String {
    format!("{INSTANCES_PATH}/{}", urlencoding::encode(id))
}

/// Attach `token` as a bearer credential.
///
/// # Errors
/// Returns [`AuraError::Config`] if the token contains bytes that are not
/// valid in a header.
pub fn sign(mut request: Request, token: &AccessToken) -> Result<Request> {
    let mut value = HeaderValue::from_str(&token.bearer()).map_err(|_| {
        AuraError::Config("access token contains characters not valid in a header".into())
    })?;
    value.set_sensitive(true);
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(request)
}
