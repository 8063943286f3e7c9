use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde_json::json;
use tracing::debug;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    ServiceUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::ServiceUnavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
        };
        debug!("Request failed with {}: {}", status, message);
        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
