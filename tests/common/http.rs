/// HTTP testing utilities
use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot` and `ready`
use upsapp::http::server::router;
use upsapp::http::state::HttpServerState;
use upsapp::telemetry::{MetricView, TelemetryCache};

/// HTTP test client for making requests to our app
pub struct TestApp {
    app: axum::Router,
}

impl TestApp {
    /// Create a new test app around an optional telemetry cache and its views
    pub fn new(telemetry: Option<Arc<TelemetryCache>>, metrics: Vec<Arc<MetricView>>) -> Self {
        let state = HttpServerState {
            name: Arc::new("UpsApp Test".to_string()),
            telemetry,
            metrics: Arc::new(metrics),
        };

        Self {
            app: router(state),
        }
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }
}

/// Test response wrapper for easier assertions
pub struct TestResponse {
    status: StatusCode,
    body: String,
}

impl TestResponse {
    async fn new(response: axum::response::Response) -> Self {
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default()
            .to_vec();
        let body = String::from_utf8_lossy(&body_bytes).to_string();

        Self { status, body }
    }

    /// Get response status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Parse response body as JSON
    pub fn json<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_str(&self.body).map_err(Into::into)
    }

    /// Assert status code
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}. Body: {}",
            expected, self.status, self.body
        );
        self
    }
}
