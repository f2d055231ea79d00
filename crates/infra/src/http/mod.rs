//! HTTP plumbing shared by the authenticator and the operation facade

pub mod client;
pub mod request;

use reqwest::header::HeaderMap;

pub use client::{HttpClient, HttpClientBuilder};
pub use request::{instance_path, sign, ApiRequestBuilder};

/// Read a header as UTF-8, ignoring values that are not valid strings.
pub(crate) fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

/// The `X-Request-Id` correlation header, or an empty string when absent.
pub(crate) fn correlation_id(headers: &HeaderMap) -> String {
    header_str(headers, aura_domain::constants::REQUEST_ID_HEADER).unwrap_or_default()
}
