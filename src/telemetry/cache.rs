use super::error::TelemetryError;
use crate::datamodel::snapshot::Snapshot;
use crate::nut::UpsClient;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct RefreshState {
    snapshot: Arc<Snapshot>,
    last_refresh: Option<Instant>,
    last_error: Option<String>,
}

/// Point in time view of the cache, for health reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatus {
    pub target_unit: Option<String>,
    pub last_refresh_age: Option<Duration>,
    pub last_error: Option<String>,
    pub snapshot_len: usize,
}

impl CacheStatus {
    /// At least one refresh succeeded and the latest attempt did not fail.
    pub fn is_healthy(&self) -> bool {
        self.last_refresh_age.is_some() && self.last_error.is_none()
    }
}

/// The single, throttled source of UPS telemetry of the process.
///
/// Every reader shares the same instance. The daemon is asked for fresh
/// variables at most once per `min_interval`; in between, readers get the
/// cached snapshot. The throttle check, the fetch and the snapshot
/// replacement all happen while holding one lock, so concurrent readers
/// arriving on an expired window wait for a single fetch and then share
/// its result, whether it succeeded or not.
#[derive(Debug)]
pub struct TelemetryCache {
    client: Arc<dyn UpsClient>,
    target_unit: Option<String>,
    min_interval: Duration,
    state: Mutex<RefreshState>,
    /// Fetches attempted so far, successful or not.
    attempts: AtomicU64,
}

/// Pick the only unit served by the daemon, if there is exactly one.
pub async fn resolve_target_unit(client: &dyn UpsClient) -> Result<Option<String>, TelemetryError> {
    let units = client.list_units().await?;
    if units.len() == 1 {
        let unit = units.into_keys().next();
        if let Some(unit) = &unit {
            info!("Discovered UPS unit: {}", unit);
        }
        Ok(unit)
    } else {
        warn!(
            "Cannot pick a UPS unit automatically, upsd serves {} units: {:?}",
            units.len(),
            units.keys().collect::<Vec<_>>()
        );
        Ok(None)
    }
}

impl TelemetryCache {
    /// Build the cache, discovering the target unit when none is given.
    ///
    /// This only talks to the daemon when `unit` is `None`.
    pub async fn connect(
        client: Arc<dyn UpsClient>,
        unit: Option<String>,
        min_interval: Duration,
    ) -> Result<Self, TelemetryError> {
        let target_unit = match unit {
            Some(unit) => Some(unit),
            None => resolve_target_unit(client.as_ref()).await?,
        };
        Ok(Self::with_target(client, target_unit, min_interval))
    }

    pub fn with_target(
        client: Arc<dyn UpsClient>,
        target_unit: Option<String>,
        min_interval: Duration,
    ) -> Self {
        Self {
            client,
            target_unit,
            min_interval,
            state: Mutex::new(RefreshState {
                snapshot: Arc::new(Snapshot::empty()),
                last_refresh: None,
                last_error: None,
            }),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn target_unit(&self) -> Option<&str> {
        self.target_unit.as_deref()
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Latest snapshot, refreshed first if the throttle window expired.
    ///
    /// Never fails: when the refresh does not succeed, the previous
    /// snapshot (possibly empty) is returned.
    pub async fn get_snapshot(&self) -> Arc<Snapshot> {
        let attempts_on_arrival = self.attempts.load(Ordering::SeqCst);
        let mut state = self.state.lock().await;

        // Someone else attempted a fetch while we waited for the lock
        if self.attempts.load(Ordering::SeqCst) != attempts_on_arrival {
            return state.snapshot.clone();
        }

        if let Some(last_refresh) = state.last_refresh {
            if last_refresh.elapsed() < self.min_interval {
                return state.snapshot.clone();
            }
        }

        match self.refresh_locked(&mut state).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!("Failed to refresh UPS telemetry, keeping previous values: {}", error);
                sentry::capture_error(&error);
                state.snapshot.clone()
            }
        }
    }

    /// Refresh regardless of the throttle window and report failures.
    pub async fn force_refresh(&self) -> Result<Arc<Snapshot>, TelemetryError> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }

    /// Latest snapshot, without ever contacting the daemon.
    pub async fn current_snapshot(&self) -> Arc<Snapshot> {
        self.state.lock().await.snapshot.clone()
    }

    pub async fn status(&self) -> CacheStatus {
        let state = self.state.lock().await;
        CacheStatus {
            target_unit: self.target_unit.clone(),
            last_refresh_age: state.last_refresh.map(|instant| instant.elapsed()),
            last_error: state.last_error.clone(),
            snapshot_len: state.snapshot.len(),
        }
    }

    async fn refresh_locked(
        &self,
        state: &mut RefreshState,
    ) -> Result<Arc<Snapshot>, TelemetryError> {
        let result = self.fetch().await;
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                state.snapshot = snapshot.clone();
                state.last_refresh = Some(Instant::now());
                state.last_error = None;
                Ok(snapshot)
            }
            Err(error) => {
                state.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    async fn fetch(&self) -> Result<Snapshot, TelemetryError> {
        let unit = self
            .target_unit
            .as_deref()
            .ok_or(TelemetryError::UnresolvedTarget)?;
        let variables = self.client.list_variables(unit).await?;
        debug!("Fetched {} variables from UPS {}", variables.len(), unit);
        Ok(Snapshot::from_raw(variables))
    }
}
