#![allow(dead_code)]

pub mod http;
pub mod upsd;

use std::sync::Arc;
use upsapp::datamodel::MetricRegistry;
use upsapp::telemetry::cache::DEFAULT_MIN_INTERVAL;
use upsapp::telemetry::setup::{register_metric_views, setup_telemetry};
use upsapp::telemetry::{MetricView, TelemetryCache};
use upsapp::test_utils::MockUpsClient;

/// Variables of a typical small line-interactive UPS
pub const SAMPLE_VARIABLES: [(&str, &str); 6] = [
    ("battery.charge", "100"),
    ("battery.runtime", "1380"),
    ("battery.runtime.low", "120"),
    ("input.voltage", "230.0"),
    ("ups.load", "23"),
    ("ups.status", "OL"),
];

/// Set up the telemetry stack on a mock daemon and register `resources`.
pub async fn telemetry_with(
    mock: &Arc<MockUpsClient>,
    resources: &[&str],
) -> (Arc<TelemetryCache>, Vec<Arc<MetricView>>) {
    let cache = setup_telemetry(mock.clone(), None, DEFAULT_MIN_INTERVAL)
        .await
        .expect("telemetry setup failed");
    let mut registry = MetricRegistry::default();
    let resources = resources
        .iter()
        .map(|resource| resource.to_string())
        .collect::<Vec<_>>();
    let views = register_metric_views(&cache, &mut registry, &resources).await;
    (cache, views)
}
