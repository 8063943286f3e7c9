use super::cache::TelemetryCache;
use super::error::TelemetryError;
use super::metric_view::MetricView;
use crate::datamodel::metric_descriptor::MetricRegistry;
use crate::nut::UpsClient;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Build the process-wide cache and check that the UPS can be read.
///
/// An error means the UPS integration is unavailable. The caller is
/// expected to log it and carry on without the metrics.
pub async fn setup_telemetry(
    client: Arc<dyn UpsClient>,
    unit: Option<String>,
    min_interval: Duration,
) -> Result<Arc<TelemetryCache>, TelemetryError> {
    let cache = match TelemetryCache::connect(client, unit, min_interval).await {
        Ok(cache) => cache,
        Err(err) => {
            error!("Failure while looking for the UPS to monitor: {}", err);
            return Err(err);
        }
    };

    match cache.force_refresh().await {
        Ok(snapshot) => {
            info!(
                "UPS {} is reachable, {} values available",
                cache.target_unit().unwrap_or_default(),
                snapshot.len()
            );
            Ok(Arc::new(cache))
        }
        Err(err) => {
            error!("Failure while testing UPS status retrieval: {}", err);
            Err(err)
        }
    }
}

/// Create one view per requested metric key.
///
/// Keys are case-insensitive; asking twice for the same key yields one view.
pub async fn register_metric_views(
    cache: &Arc<TelemetryCache>,
    registry: &mut MetricRegistry,
    resources: &[String],
) -> Vec<Arc<MetricView>> {
    let snapshot = cache.get_snapshot().await;
    let mut seen = HashSet::new();
    let mut views = Vec::with_capacity(resources.len());

    for resource in resources {
        let key = resource.to_lowercase();
        if !seen.insert(key.clone()) {
            debug!("UPS metric \"{}\" requested more than once", key);
            continue;
        }

        if !snapshot.contains_key(&key) {
            warn!("UPS metric \"{}\" does not appear in the NUT status output", key);
        }

        views.push(Arc::new(MetricView::new(cache.clone(), registry, &key).await));
    }

    views
}
