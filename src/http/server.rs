use super::health::{__path_liveness, __path_readiness, liveness, readiness};
use super::state::HttpServerState;
use super::ups::{
    __path_get_metric, __path_get_snapshot, __path_list_metrics, get_metric, get_snapshot,
    list_metrics,
};
use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace;
use tower_http::{ServiceBuilderExt, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "UpsApp", description = "UPS telemetry API"),
        (name = "Health", description = "Liveness and readiness probes"),
    ),
    paths(frontpage, liveness, readiness, get_snapshot, list_metrics, get_metric),
)]
struct ApiDoc;

/// Routes without middleware, also used by the tests.
pub fn router(state: HttpServerState) -> Router {
    Router::new()
        .route("/", get(frontpage))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .route("/api/v1/snapshot", get(get_snapshot))
        .route("/api/v1/metrics", get(list_metrics))
        .route("/api/v1/metrics/{key}", get(get_metric))
        .with_state(state)
}

pub async fn run_http_server(
    state: HttpServerState,
    address: SocketAddr,
    timeout_seconds: u64,
) -> Result<()> {
    // List of headers that shouldn't be logged
    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION, header::COOKIE].into();

    // Middleware creation
    let middleware = ServiceBuilder::new()
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .sensitive_response_headers(sensitive_headers)
        .layer(TimeoutLayer::new(Duration::from_secs(timeout_seconds)))
        .compression()
        .into_inner();

    let app = router(state).layer(middleware);

    // Run our application
    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // Wait for the CTRL+C signal
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install the CTRL+C signal handler: {}", err);
        std::future::pending::<()>().await;
    }
}

/// Name of the service.
#[utoipa::path(
    get,
    path = "/",
    tag = "UpsApp",
    responses(
        (status = 200, description = "Service name", body = String)
    )
)]
async fn frontpage(State(state): State<HttpServerState>) -> Json<String> {
    Json((*state.name).clone())
}
