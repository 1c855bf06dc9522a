//! InfluxDB v2 sink over the HTTP write API.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::reading::Reading;
use crate::sink::{BatchSink, SinkError};

/// Default request timeout (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for an InfluxDB v2 server.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base URL, e.g. `http://localhost:8087`.
    pub url: String,
    /// API token sent as `Authorization: Token <token>`.
    pub token: String,
    pub org: String,
    pub bucket: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl InfluxConfig {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        org: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            org: org.into(),
            bucket: bucket.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Sink writing batches as line protocol to `/api/v2/write`.
pub struct InfluxSink {
    config: InfluxConfig,
    client: Client,
    connected: bool,
    write_errors: u64,
}

impl std::fmt::Debug for InfluxSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxSink")
            .field("url", &self.config.url)
            .field("org", &self.config.org)
            .field("bucket", &self.config.bucket)
            .field("connected", &self.connected)
            .field("write_errors", &self.write_errors)
            .finish_non_exhaustive()
    }
}

impl InfluxSink {
    /// Create a sink. No network traffic happens until [`BatchSink::connect`].
    pub fn new(config: InfluxConfig) -> Result<Self, SinkError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            client,
            connected: false,
            write_errors: 0,
        })
    }

    pub fn config(&self) -> &InfluxConfig {
        &self.config
    }

    fn fail(&mut self, err: SinkError) -> SinkError {
        self.write_errors += 1;
        tracing::error!(error = %err, write_errors = self.write_errors, "Batch write failed");
        err
    }

    async fn post_lines(&self, body: String) -> Result<(), SinkError> {
        let url = format!("{}/api/v2/write", self.config.base_url());
        let response = self
            .client
            .post(url)
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(AUTHORIZATION, format!("Token {}", self.config.token))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl BatchSink for InfluxSink {
    async fn connect(&mut self) -> Result<(), SinkError> {
        let url = format!("{}/health", self.config.base_url());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                self.connected = false;
                SinkError::Connection(e.to_string())
            })?;

        if !response.status().is_success() {
            self.connected = false;
            return Err(SinkError::Connection(format!(
                "health check returned {}",
                response.status()
            )));
        }

        self.connected = true;
        tracing::info!(url = %self.config.url, bucket = %self.config.bucket, "Connected to InfluxDB");
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.connected {
            tracing::info!(url = %self.config.url, "InfluxDB connection closed");
        }
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn write_batch(&mut self, readings: Vec<Reading>) -> Result<(), SinkError> {
        if readings.is_empty() {
            return Ok(());
        }
        if !self.connected {
            return Err(self.fail(SinkError::NotConnected));
        }

        let count = readings.len();
        let body = readings
            .iter()
            .map(|r| r.to_point().to_line_protocol())
            .collect::<Vec<_>>()
            .join("\n");

        match self.post_lines(body).await {
            Ok(()) => {
                tracing::debug!(points = count, "Batch written");
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn write_errors(&self) -> u64 {
        self.write_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{SensorFields, SensorReading};
    use axum::Router;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use std::collections::HashMap;
    use std::io::ErrorKind;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    #[derive(Debug, Clone, Default)]
    struct Captured {
        query: HashMap<String, String>,
        auth: Option<String>,
        body: String,
    }

    #[derive(Clone)]
    struct FakeInflux {
        writes: Arc<Mutex<Vec<Captured>>>,
        write_status: StatusCode,
    }

    async fn health() -> StatusCode {
        StatusCode::OK
    }

    async fn write(
        State(state): State<FakeInflux>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, &'static str) {
        state.writes.lock().unwrap().push(Captured {
            query,
            auth: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            body,
        });
        if state.write_status.is_success() {
            (state.write_status, "")
        } else {
            (state.write_status, "partial write: field type conflict")
        }
    }

    /// Start a fake InfluxDB; `None` if the sandbox forbids binding.
    async fn start_fake(write_status: StatusCode) -> Option<(String, FakeInflux)> {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => return None,
            Err(e) => panic!("Failed to bind test listener: {e}"),
        };
        let addr = listener.local_addr().unwrap();
        let state = FakeInflux {
            writes: Arc::new(Mutex::new(Vec::new())),
            write_status,
        };
        let app = Router::new()
            .route("/health", get(health))
            .route("/api/v2/write", post(write))
            .with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Some((format!("http://{addr}/"), state))
    }

    fn reading(id: &str, value: f64) -> Reading {
        SensorReading::new(SensorFields::new(id, "temperature", "inlet", value, "C")).into()
    }

    fn config(url: &str) -> InfluxConfig {
        InfluxConfig::new(url, "secret", "myorg", "mybucket")
            .with_timeout(Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_empty_batch_skips_transport() {
        // Nothing listens on the discard port; an empty batch must not care.
        let mut sink = InfluxSink::new(config("http://127.0.0.1:9")).unwrap();
        assert!(sink.write_batch(Vec::new()).await.is_ok());
        assert_eq!(sink.write_errors(), 0);
    }

    #[tokio::test]
    async fn test_write_without_connection_counts_error() {
        let mut sink = InfluxSink::new(config("http://127.0.0.1:9")).unwrap();
        let err = sink.write_batch(vec![reading("t1", 1.0)]).await.unwrap_err();
        assert!(matches!(err, SinkError::NotConnected));
        assert_eq!(sink.write_errors(), 1);
    }

    #[tokio::test]
    async fn test_connect_and_write_batch() {
        let Some((url, fake)) = start_fake(StatusCode::NO_CONTENT).await else {
            return;
        };
        let mut sink = InfluxSink::new(config(&url)).unwrap();

        sink.connect().await.unwrap();
        assert!(sink.is_connected());

        sink.write_batch(vec![reading("t1", 21.5), reading("t2", 22.5)])
            .await
            .unwrap();

        let writes = fake.writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 1, "one request per batch");
        let captured = &writes[0];
        assert_eq!(captured.query["org"], "myorg");
        assert_eq!(captured.query["bucket"], "mybucket");
        assert_eq!(captured.query["precision"], "ns");
        assert_eq!(captured.auth.as_deref(), Some("Token secret"));

        let lines: Vec<&str> = captured.body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("sensor_id=t1"));
        assert!(lines[1].contains("value=22.5"));
        assert_eq!(sink.write_errors(), 0);

        sink.disconnect().await;
        assert!(!sink.is_connected());
    }

    #[tokio::test]
    async fn test_rejected_batch_is_single_failure() {
        let Some((url, _fake)) = start_fake(StatusCode::BAD_REQUEST).await else {
            return;
        };
        let mut sink = InfluxSink::new(config(&url)).unwrap();
        sink.connect().await.unwrap();

        let err = sink
            .write_batch(vec![reading("t1", 1.0), reading("t2", 2.0), reading("t3", 3.0)])
            .await
            .unwrap_err();

        match err {
            SinkError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("partial write"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        assert_eq!(sink.write_errors(), 1);
    }

    #[tokio::test]
    async fn test_failed_reconnect_clears_connected() {
        let Some((url, _fake)) = start_fake(StatusCode::NO_CONTENT).await else {
            return;
        };
        let mut sink = InfluxSink::new(config(&url)).unwrap();
        sink.connect().await.unwrap();
        assert!(sink.is_connected());

        sink.config.url = "http://127.0.0.1:9".to_string();
        let err = sink.connect().await.unwrap_err();

        assert!(matches!(err, SinkError::Connection(_)));
        assert!(!sink.is_connected());
    }

    #[tokio::test]
    async fn test_wait_for_unreachable_server_gives_up() {
        let mut sink = InfluxSink::new(config("http://127.0.0.1:9")).unwrap();
        assert!(!sink.wait_for_connection(3, Duration::ZERO).await);
        assert!(!sink.is_connected());
    }
}
