use std::time::Duration;

use aura_common::ExponentialBackoff;
use aura_domain::constants::{is_retryable_status, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS};
use aura_domain::{AuraError, Result};
use reqwest::{Client as ReqwestClient, Request, Response};
use tracing::{debug, warn};

use super::correlation_id;
use crate::errors::InfraError;

/// HTTP client that re-sends requests failing with a transient error.
///
/// Statuses 500, 502, 503 and 504 and transport failures are retried up to
/// `max_retries` times. Every other response is returned to the caller as-is.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_retries: u32,
    backoff: ExponentialBackoff,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// The underlying transport, shared with the token exchange.
    #[must_use]
    pub fn inner(&self) -> &ReqwestClient {
        &self.client
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Execute `request` with retry semantics.
    ///
    /// The request is cloned for every attempt, so it must carry a buffered
    /// body. With `max_retries == 0` a retryable status is handed back like
    /// any other response.
    ///
    /// # Errors
    /// - [`AuraError::RetryExhausted`] when every attempt got a retryable status
    /// - [`AuraError::Transport`] when the last attempt failed before a response
    pub async fn send(&self, request: Request) -> Result<Response> {
        let attempts = self.max_retries.saturating_add(1);
        let mut delays = self.backoff.schedule();
        let method = request.method().clone();
        let url = request.url().clone();

        let mut attempt = 0;
        loop {
            attempt += 1;
            let cloned = request.try_clone().ok_or_else(|| {
                AuraError::Config(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            debug!(attempt, %method, %url, "sending HTTP request");

            match self.client.execute(cloned).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, %url, %status, "received HTTP response");

                    if !is_retryable_status(status.as_u16()) || self.max_retries == 0 {
                        return Ok(response);
                    }

                    if attempt < attempts {
                        let delay = delays.next().unwrap_or_default();
                        warn!(attempt, %status, ?delay, %url, "retryable status, backing off");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    warn!(attempts, %status, %url, "giving up after retries");
                    return Err(give_up(response, attempts).await);
                }
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "HTTP request failed");

                    if attempt < attempts && should_retry_error(&err) {
                        let delay = delays.next().unwrap_or_default();
                        warn!(attempt, ?delay, %url, "transport failure, backing off");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(InfraError::from(err).into());
                }
            }
        }
    }
}

async fn give_up(response: Response, attempts: u32) -> AuraError {
    let status = response.status().as_u16();
    let request_id = correlation_id(response.headers());
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            debug!(error = %err, status, "failed to read response body");
            format!("<unreadable body: {err}>")
        }
    };

    AuraError::RetryExhausted { attempts, status, body, request_id }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_request() || err.is_connect()
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    client: Option<ReqwestClient>,
    timeout: Duration,
    max_retries: u32,
    backoff: ExponentialBackoff,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: ExponentialBackoff::default(),
        }
    }
}

impl HttpClientBuilder {
    /// Use a caller-supplied transport. Its own timeout settings apply and
    /// [`Self::timeout`] is ignored.
    pub fn client(mut self, client: ReqwestClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of retries after the first attempt.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let client = match self.client {
            Some(client) => client,
            None => ReqwestClient::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|err| AuraError::from(InfraError::from(err)))?,
        };

        Ok(HttpClient { client, max_retries: self.max_retries, backoff: self.backoff })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reqwest::{Method, StatusCode};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_retries(retries: u32) -> HttpClient {
        HttpClient::builder()
            .backoff(ExponentialBackoff::none())
            .max_retries(retries)
            .build()
            .expect("http client")
    }

    fn get(client: &HttpClient, url: &str) -> Request {
        client.inner().request(Method::GET, url).build().expect("request")
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_retries(3);
        let response = client.send(get(&client, &server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(503)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let client = client_with_retries(2);
        let response = client.send(get(&client, &server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_report_last_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500)
                    .insert_header("X-Request-Id", "track-me-123")
                    .set_body_string("500 not working"),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = client_with_retries(1);
        let err = client.send(get(&client, &server.uri())).await.unwrap_err();

        match err {
            AuraError::RetryExhausted { attempts, status, body, request_id } => {
                assert_eq!(attempts, 2);
                assert_eq!(status, 500);
                assert_eq!(body, "500 not working");
                assert_eq!(request_id, "track-me-123");
            }
            other => panic!("expected retry exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn every_retryable_status_is_retried() {
        for code in [500, 502, 503, 504] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(code))
                .expect(3)
                .mount(&server)
                .await;

            let client = client_with_retries(2);
            let err = client.send(get(&client, &server.uri())).await.unwrap_err();
            assert_eq!(err.status(), Some(code));
        }
    }

    #[tokio::test]
    async fn does_not_retry_terminal_statuses() {
        for code in [501, 400, 404, 410] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(code))
                .expect(1)
                .mount(&server)
                .await;

            let client = client_with_retries(3);
            let response = client.send(get(&client, &server.uri())).await.expect("response");
            assert_eq!(response.status().as_u16(), code);
        }
    }

    #[tokio::test]
    async fn zero_budget_returns_retryable_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_retries(0);
        let response = client.send(get(&client, &server.uri())).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn retries_on_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = accepted.clone();
        let server = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(stream);
            }
        });

        let client = client_with_retries(2);
        let result = client.send(get(&client, &url)).await;
        server.abort();

        match result {
            Err(AuraError::Transport(msg)) => assert!(msg.contains("HTTP")),
            other => panic!("expected transport error, got {other:?}"),
        }
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }

    const TRUNCATED_503: &[u8] =
        b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 100\r\n\r\npartial";

    #[tokio::test]
    async fn truncated_body_is_marked_when_giving_up() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(TRUNCATED_503).await;
            }
        });

        let client = client_with_retries(1);
        let err = client.send(get(&client, &url)).await.unwrap_err();
        server.abort();

        match err {
            AuraError::RetryExhausted { attempts, status, body, .. } => {
                assert_eq!(attempts, 2);
                assert_eq!(status, 503);
                assert!(body.starts_with("<unreadable body"), "{body}");
            }
            other => panic!("expected retry exhaustion, got {other:?}"),
        }
    }
}
