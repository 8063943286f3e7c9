use super::metric_view::MetricView;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);
const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(1);

/// Refresh every view periodically, one task per view.
///
/// Abort the returned handles to stop refreshing.
pub fn spawn_refresh_tasks(
    views: &[Arc<MetricView>],
    scan_interval: Duration,
) -> Vec<JoinHandle<()>> {
    let scan_interval = scan_interval.max(MIN_SCAN_INTERVAL);
    views
        .iter()
        .cloned()
        .map(|view| tokio::spawn(refresh_loop(view, scan_interval)))
        .collect()
}

async fn refresh_loop(view: Arc<MetricView>, scan_interval: Duration) {
    // Views already hold a fresh value when they are created
    let mut ticker = tokio::time::interval_at(Instant::now() + scan_interval, scan_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let value = view.refresh().await;
        debug!(metric = view.key(), %value, "Refreshed UPS metric");
    }
}
