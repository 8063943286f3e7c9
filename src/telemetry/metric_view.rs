use super::cache::TelemetryCache;
use crate::datamodel::metric_descriptor::{MetricDescriptor, MetricRegistry};
use crate::datamodel::snapshot::SnapshotValue;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

pub const UNKNOWN_VALUE: &str = "unknown";

/// Value reported by a metric view.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Known(SnapshotValue),
    Unknown,
}

impl MetricValue {
    pub fn is_known(&self) -> bool {
        matches!(self, MetricValue::Known(_))
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Known(value) => write!(f, "{}", value),
            MetricValue::Unknown => write!(f, "{}", UNKNOWN_VALUE),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Known(value) => value.serialize(serializer),
            MetricValue::Unknown => serializer.serialize_str(UNKNOWN_VALUE),
        }
    }
}

/// One field of the shared snapshot, with its presentation metadata.
#[derive(Debug)]
pub struct MetricView {
    cache: Arc<TelemetryCache>,
    descriptor: MetricDescriptor,
    value: RwLock<MetricValue>,
}

impl MetricView {
    /// Build the view of `key` and read its first value.
    ///
    /// Keys missing from the registry are registered with a generic
    /// descriptor rather than rejected.
    pub async fn new(
        cache: Arc<TelemetryCache>,
        registry: &mut MetricRegistry,
        key: &str,
    ) -> Self {
        let (descriptor, created) = registry.get_or_register(key);
        if created {
            warn!(
                "UPS metric \"{}\" has no known description, using a generic one",
                descriptor.key
            );
        }

        let view = Self {
            cache,
            descriptor,
            value: RwLock::new(MetricValue::Unknown),
        };
        view.refresh().await;
        view
    }

    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    pub fn name(&self) -> String {
        self.descriptor.display_name()
    }

    pub fn icon(&self) -> &str {
        &self.descriptor.icon
    }

    pub fn unit_of_measurement(&self) -> &str {
        &self.descriptor.unit
    }

    pub fn descriptor(&self) -> &MetricDescriptor {
        &self.descriptor
    }

    pub async fn value(&self) -> MetricValue {
        self.value.read().await.clone()
    }

    /// Read the field again from the shared cache.
    pub async fn refresh(&self) -> MetricValue {
        let snapshot = self.cache.get_snapshot().await;
        let value = match snapshot.get(&self.descriptor.key) {
            Some(value) => MetricValue::Known(value.clone()),
            None => MetricValue::Unknown,
        };
        *self.value.write().await = value.clone();
        value
    }
}
