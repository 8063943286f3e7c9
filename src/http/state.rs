use crate::telemetry::{MetricView, TelemetryCache};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct HttpServerState {
    pub name: Arc<String>,
    /// `None` when the UPS integration could not be set up.
    pub telemetry: Option<Arc<TelemetryCache>>,
    pub metrics: Arc<Vec<Arc<MetricView>>>,
}

impl HttpServerState {
    pub fn find_metric(&self, key: &str) -> Option<&Arc<MetricView>> {
        let key = key.to_lowercase();
        self.metrics.iter().find(|view| view.key() == key)
    }
}
