//! OAuth client-credentials authentication with an in-memory token cache
//!
//! Tokens are fetched from `{endpoint}/oauth/token` using HTTP Basic auth and
//! reused until they expire. The cache lock is held across the exchange, so
//! concurrent callers wait for a single exchange and then share its token.

use std::future::Future;

use async_trait::async_trait;
use aura_core::AccessTokenProvider;
use aura_domain::constants::TOKEN_PATH;
use aura_domain::{AccessToken, AuraError, Credentials, Result};
use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::errors::InfraError;

/// Longest token lifetime accepted from the server, in seconds.
const MAX_EXPIRES_IN_SECS: i64 = 365 * 24 * 60 * 60;

/// Body of a successful token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Holds at most one bearer token.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-populated with a known token.
    pub fn seeded(token: AccessToken) -> Self {
        Self { slot: Mutex::new(Some(token)) }
    }

    /// The cached token if it has not expired yet.
    pub async fn current(&self) -> Option<AccessToken> {
        let now = Utc::now();
        self.slot.lock().await.as_ref().filter(|token| !token.is_expired_at(now)).cloned()
    }

    /// Return the cached token, or store and return the one produced by
    /// `refresh` when the cache is empty or stale.
    ///
    /// The cache is left untouched when `refresh` fails or the returned
    /// future is dropped before completing.
    ///
    /// # Errors
    /// Propagates the error returned by `refresh`.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<AccessToken>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(token) = slot.as_ref().filter(|token| !token.is_expired_at(Utc::now())) {
            return Ok(token.clone());
        }

        let fresh = refresh().await?;
        *slot = Some(fresh.clone());
        Ok(fresh)
    }

    pub async fn clear(&self) {
        self.slot.lock().await.take();
    }

    /// Clear the cache only while it still holds `rejected`.
    ///
    /// Returns `true` if the token was removed.
    pub async fn clear_if(&self, rejected: &AccessToken) -> bool {
        let mut slot = self.slot.lock().await;
        if slot.as_ref() == Some(rejected) {
            slot.take();
            return true;
        }
        false
    }
}

/// Token provider for the Aura OAuth client-credentials grant.
pub struct ClientCredentialsAuth {
    client: ReqwestClient,
    token_url: String,
    credentials: Credentials,
    cache: TokenCache,
}

impl ClientCredentialsAuth {
    pub fn new(client: ReqwestClient, endpoint: &str, credentials: Credentials) -> Self {
        Self {
            client,
            token_url: format!("{}{TOKEN_PATH}", endpoint.trim_end_matches('/')),
            credentials,
            cache: TokenCache::new(),
        }
    }

    /// Start with `token` already cached, skipping the first exchange while it
    /// is valid.
    #[must_use]
    pub fn with_token(mut self, token: AccessToken) -> Self {
        self.cache = TokenCache::seeded(token);
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Return a valid token, exchanging credentials when none is cached.
    ///
    /// # Errors
    /// - [`AuraError::Auth`] if the token endpoint rejects the credentials or
    ///   returns an unreadable body
    /// - [`AuraError::Transport`] if the token endpoint cannot be reached
    pub async fn ensure_valid(&self) -> Result<AccessToken> {
        self.cache.get_or_refresh(|| self.exchange()).await
    }

    #[instrument(skip(self), fields(url = %self.token_url))]
    async fn exchange(&self) -> Result<AccessToken> {
        debug!(client_id = %self.credentials.client_id(), "requesting access token");

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(self.credentials.client_id(), Some(self.credentials.client_secret()))
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(InfraError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(InfraError::from)?;

        if !status.is_success() {
            return Err(AuraError::Auth { status: status.as_u16(), message: body });
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|err| AuraError::Auth {
            status: status.as_u16(),
            message: format!("invalid token response: {err}"),
        })?;

        let lifetime = parsed.expires_in.clamp(0, MAX_EXPIRES_IN_SECS);
        let token = AccessToken::expiring_in(parsed.access_token, lifetime, Utc::now());
        info!(expires_at = %token.expires_at(), "acquired Aura access token");

        Ok(token)
    }
}

impl std::fmt::Debug for ClientCredentialsAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsAuth")
            .field("token_url", &self.token_url)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AccessTokenProvider for ClientCredentialsAuth {
    async fn access_token(&self) -> Result<AccessToken> {
        self.ensure_valid().await
    }

    async fn invalidate(&self, rejected: &AccessToken) {
        if self.cache.clear_if(rejected).await {
            debug!("dropped rejected access token");
        } else {
            debug!("rejected access token already replaced");
        }
    }
}
