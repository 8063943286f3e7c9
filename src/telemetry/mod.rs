pub mod cache;
pub mod error;
pub mod metric_view;
pub mod scheduler;
pub mod setup;

pub use cache::TelemetryCache;
pub use error::TelemetryError;
pub use metric_view::{MetricValue, MetricView};
