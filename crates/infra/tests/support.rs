#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aura_common::ExponentialBackoff;
use aura_infra::{AuraClient, AuraClientBuilder};
use serde_json::{json, Value};
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/oauth/token";
pub const REQUEST_ID: &str = "track-me-123";

/// Mock Aura API with a working token endpoint.
pub struct MockAura {
    pub server: MockServer,
}

impl MockAura {
    /// Start a server whose token endpoint issues `token-1`, `token-2`, ...
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let issued = Arc::new(AtomicUsize::new(0));

        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let n = issued.fetch_add(1, Ordering::SeqCst) + 1;
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": format!("token-{n}"), "expires_in": 3600}))
            })
            .mount(&server)
            .await;

        Self { server }
    }

    /// Start a server without any mocks mounted.
    pub async fn bare() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Builder pointed at this server with zero backoff.
    pub fn client(&self) -> AuraClientBuilder {
        AuraClient::builder("foo", "bar", "mox")
            .endpoint(self.server.uri())
            .backoff(ExponentialBackoff::none())
    }

    /// Number of received requests matching `verb` and `route`.
    pub async fn calls(&self, verb: &str, route: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.method.as_str() == verb && request.url.path() == route)
            .count()
    }

    pub async fn token_calls(&self) -> usize {
        self.calls("POST", TOKEN_PATH).await
    }
}

pub fn instance_details(id: &str) -> Value {
    json!({
        "id": id,
        "name": "foo",
        "status": "running",
        "tenant_id": "mox",
        "cloud_provider": "gcp",
        "connection_url": format!("neo4j+s://{id}.databases.neo4j.io"),
        "region": "us-east1",
        "type": "enterprise-db",
        "memory": "2GB",
        "storage": "4GB"
    })
}

pub fn created_instance(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "connection_url": format!("neo4j+s://{id}.databases.neo4j.io"),
        "username": "neo4j",
        "password": "letmein",
        "name": name,
        "tenant_id": "mox",
        "cloud_provider": "gcp",
        "region": "us-east1",
        "type": "enterprise-db"
    })
}

/// Envelope a payload the way the API does.
pub fn enveloped(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("X-Request-Id", REQUEST_ID)
        .set_body_json(json!({ "data": data }))
}

/// Error response carrying the shared request id.
pub fn failure(status: u16) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("X-Request-Id", REQUEST_ID)
        .set_body_string(format!("{status} not working"))
}

/// Shared buffer receiving formatted log output.
#[derive(Clone, Default)]
pub struct LogBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    pub fn contents(&self) -> String {
        let guard = self.inner.lock().expect("log mutex poisoned");
        String::from_utf8_lossy(&guard).into_owned()
    }
}

pub struct LogWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().expect("log mutex poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter { inner: self.inner.clone() }
    }
}

/// Dispatcher writing plain-text events to the returned buffer.
pub fn capture_logs() -> (LogBuffer, Dispatch) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    (buffer, Dispatch::new(subscriber))
}
