//! Aura provisioning API client
//!
//! Every operation follows the same pipeline: build the request, sign it with
//! the cached bearer token, send it through the retrying [`HttpClient`],
//! re-authenticate once on 403, then classify and decode the response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aura_common::ExponentialBackoff;
use aura_core::{AccessTokenProvider, CallContext, InstanceApi};
use aura_domain::constants::{
    DEFAULT_API_VERSION, DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS,
    INSTANCES_PATH,
};
use aura_domain::{
    AccessToken, AuraError, ClientSettings, CreateInstanceRequest, CreatedInstance, Credentials,
    InstanceDetails, Result,
};
use chrono::{DateTime, Utc};
use reqwest::{Client as ReqwestClient, Method, Request, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info, instrument, warn, Dispatch};
use url::Url;

use super::auth::ClientCredentialsAuth;
use super::decoder::ApiResponse;
use crate::errors::InfraError;
use crate::http::{instance_path, sign, ApiRequestBuilder, HttpClient};

/// Configuration for [`AuraClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Aura API, without the version segment
    pub endpoint: String,
    /// API version path segment (e.g. `v1`)
    pub version: String,
    /// Retries after the first attempt for 5xx and transport failures
    pub max_retries: u32,
    /// Delay schedule between retry attempts
    pub backoff: ExponentialBackoff,
    /// Timeout applied to the default transport
    pub request_timeout: Duration,
    /// Caller-supplied transport replacing the default one
    pub transport: Option<ReqwestClient>,
    /// Destination for client log events. Defaults to the global subscriber.
    pub logger: Option<Dispatch>,
    /// Token to use until it expires instead of authenticating first.
    /// Cannot be combined with a custom token provider.
    pub token: Option<AccessToken>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: ExponentialBackoff::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            transport: None,
            logger: None,
            token: None,
        }
    }
}

/// Wire body of `POST /instances`.
#[derive(Debug, Serialize)]
struct CreateInstanceBody<'a> {
    name: &'a str,
    tenant_id: &'a str,
    cloud_provider: &'a str,
    #[serde(rename = "type")]
    instance_type: &'a str,
    memory: &'a str,
    version: &'a str,
    region: &'a str,
}

impl<'a> CreateInstanceBody<'a> {
    fn new(request: &'a CreateInstanceRequest, tenant_id: &'a str) -> Self {
        Self {
            name: &request.name,
            tenant_id,
            cloud_provider: &request.cloud_provider,
            instance_type: &request.instance_type,
            memory: &request.memory,
            version: &request.version,
            region: &request.region,
        }
    }
}

/// Client for the Neo4j Aura provisioning API.
///
/// Cheap to share behind an [`Arc`]; all state is internally synchronized.
pub struct AuraClient {
    credentials: Credentials,
    endpoint: String,
    version: String,
    http: HttpClient,
    requests: ApiRequestBuilder,
    auth: Arc<dyn AccessTokenProvider>,
    logger: Option<Dispatch>,
}

impl AuraClient {
    /// Start configuring a client for the given OAuth client and tenant.
    pub fn builder(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> AuraClientBuilder {
        AuraClientBuilder::new(Credentials::new(client_id, client_secret, tenant_id))
    }

    /// Client with default settings.
    ///
    /// # Errors
    /// Returns [`AuraError::Config`] if the default transport cannot be built.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Result<Self> {
        Self::builder(client_id, client_secret, tenant_id).build()
    }

    /// Client configured from loaded [`ClientSettings`].
    ///
    /// # Errors
    /// Returns [`AuraError::Config`] if the settings are invalid.
    pub fn from_settings(settings: ClientSettings) -> Result<Self> {
        Self::builder(settings.client_id, settings.client_secret, settings.tenant_id)
            .endpoint(settings.endpoint)
            .version(settings.version)
            .max_retries(settings.retries)
            .request_timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
    }

    #[must_use]
    pub fn tenant_id(&self) -> &str {
        self.credentials.tenant_id()
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Versioned base URL, `{endpoint}/{version}`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.requests.base_url()
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.http.max_retries()
    }

    /// Sign and send `request`, re-authenticating once if the token is
    /// rejected with 403.
    async fn execute(&self, request: Request) -> Result<ApiResponse> {
        let (token, mut response) = self.send_signed(&request).await?;

        if response.status() == StatusCode::FORBIDDEN {
            warn!(url = %request.url(), "access token rejected, re-authenticating");
            drop(response);
            self.auth.invalidate(&token).await;
            (_, response) = self.send_signed(&request).await?;
        }

        let response = ApiResponse::read(response).await?;
        debug!(status = %response.status(), request_id = %response.request_id(), "Aura API response");

        if let Some(expires) = response.deprecation() {
            self.report_deprecation(expires, response.url());
        }

        Ok(response)
    }

    /// Send `request` signed with the current token, returning that token
    /// alongside the response.
    async fn send_signed(&self, request: &Request) -> Result<(AccessToken, Response)> {
        let token = self.auth.access_token().await?;
        let attempt = request.try_clone().ok_or_else(|| {
            AuraError::Config("request body cannot be cloned for re-authentication".into())
        })?;

        let response = self.http.send(sign(attempt, &token)?).await?;
        Ok((token, response))
    }

    fn report_deprecation(&self, expires: &str, url: &str) {
        let emit = || {
            warn!(
                version = %self.version,
                expires = %expires,
                url = %url,
                "{} of the Neo4j Aura API expires on {}",
                self.version,
                expires
            );
        };

        match &self.logger {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, emit),
            None => emit(),
        }
    }
}

/// Instance ids must name exactly one path segment below `/instances`.
fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(AuraError::Config("instance id must not be empty".into()));
    }
    if matches!(id, "." | "..") {
        return Err(AuraError::Config(format!("instance id must not be {id:?}")));
    }
    Ok(())
}

#[async_trait]
impl InstanceApi for AuraClient {
    #[instrument(skip(self, request, ctx), fields(name = %request.name))]
    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
        ctx: &CallContext,
    ) -> Result<CreatedInstance> {
        ctx.run(async {
            let body = CreateInstanceBody::new(request, self.credentials.tenant_id());
            let http_request = self.requests.build_json(Method::POST, INSTANCES_PATH, &body)?;

            let created: CreatedInstance = self.execute(http_request).await?.decode()?;
            info!(id = %created.id, "created Aura instance");
            Ok(created)
        })
        .await
    }

    #[instrument(skip(self, ctx))]
    async fn get_instance(&self, id: &str, ctx: &CallContext) -> Result<InstanceDetails> {
        ctx.run(async {
            require_id(id)?;
            let http_request = self.requests.build(Method::GET, &instance_path(id))?;
            self.execute(http_request).await?.decode()
        })
        .await
    }

    #[instrument(skip(self, ctx))]
    async fn pause_instance(&self, id: &str, ctx: &CallContext) -> Result<()> {
        ctx.run(async {
            require_id(id)?;
            let path = format!("{}/pause", instance_path(id));
            let http_request = self.requests.build(Method::POST, &path)?;

            let response = self.execute(http_request).await?;
            if !response.is_success() {
                return Err(response.into_error());
            }
            info!("paused Aura instance");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, ctx))]
    async fn destroy_instance(&self, id: &str, ctx: &CallContext) -> Result<()> {
        ctx.run(async {
            require_id(id)?;
            let http_request = self.requests.build(Method::DELETE, &instance_path(id))?;

            let response = self.execute(http_request).await?;
            if response.status() == StatusCode::NOT_FOUND {
                debug!("instance already gone");
                return Ok(());
            }
            if !response.is_success() {
                return Err(response.into_error());
            }
            info!("destroyed Aura instance");
            Ok(())
        })
        .await
    }
}

impl std::fmt::Debug for AuraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuraClient")
            .field("credentials", &self.credentials)
            .field("base_url", &self.requests.base_url())
            .field("max_retries", &self.http.max_retries())
            .finish_non_exhaustive()
    }
}

/// Builder for [`AuraClient`]
#[must_use]
pub struct AuraClientBuilder {
    credentials: Credentials,
    config: ClientConfig,
    auth: Option<Arc<dyn AccessTokenProvider>>,
}

impl AuraClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials, config: ClientConfig::default(), auth: None }
    }

    /// Replace the whole configuration at once.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.config.backoff = backoff;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn transport(mut self, client: ReqwestClient) -> Self {
        self.config.transport = Some(client);
        self
    }

    pub fn logger(mut self, dispatch: Dispatch) -> Self {
        self.config.logger = Some(dispatch);
        self
    }

    /// Use an already issued token until `expires_at`.
    ///
    /// Only applies to the built-in authenticator; [`Self::build`] fails if
    /// [`Self::auth_provider`] is also set.
    pub fn token(mut self, token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        self.config.token = Some(AccessToken::new(token, expires_at));
        self
    }

    /// Replace the client-credentials authenticator. Cannot be combined with
    /// [`Self::token`].
    pub fn auth_provider(mut self, provider: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(provider);
        self
    }

    /// # Errors
    /// Returns [`AuraError::Config`] if the endpoint is not an absolute HTTP
    /// URL, the version is empty, both a token seed and a custom token
    /// provider are set, or the transport cannot be built.
    pub fn build(self) -> Result<AuraClient> {
        let ClientConfig {
            endpoint,
            version,
            max_retries,
            backoff,
            request_timeout,
            transport,
            logger,
            token,
        } = self.config;

        let parsed = Url::parse(&endpoint).map_err(InfraError::from)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AuraError::Config(format!(
                "endpoint must use http or https, got {}",
                parsed.scheme()
            )));
        }
        let endpoint = endpoint.trim_end_matches('/').to_string();

        let version = version.trim_matches('/').to_string();
        if version.is_empty() {
            return Err(AuraError::Config("API version must not be empty".into()));
        }

        let mut http = HttpClient::builder()
            .max_retries(max_retries)
            .backoff(backoff)
            .timeout(request_timeout);
        if let Some(client) = transport {
            http = http.client(client);
        }
        let http = http.build()?;

        let auth = match self.auth {
            Some(_) if token.is_some() => {
                return Err(AuraError::Config(
                    "a seeded token cannot be combined with a custom token provider".into(),
                ));
            }
            Some(provider) => provider,
            None => {
                let auth = ClientCredentialsAuth::new(
                    http.inner().clone(),
                    &endpoint,
                    self.credentials.clone(),
                );
                Arc::new(match token {
                    Some(token) => auth.with_token(token),
                    None => auth,
                })
            }
        };

        let requests = ApiRequestBuilder::new(http.inner().clone(), &endpoint, &version);

        Ok(AuraClient {
            credentials: self.credentials,
            endpoint,
            version,
            http,
            requests,
            auth,
            logger,
        })
    }
}
