pub mod metric_descriptor;
pub mod snapshot;

pub use metric_descriptor::{MetricDescriptor, MetricRegistry};
pub use snapshot::{Snapshot, SnapshotValue};
