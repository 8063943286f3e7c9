use crate::nut::NutError;
use thiserror::Error;

/// Why a telemetry refresh did not produce a new snapshot.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The daemon could not be reached or answered nonsense
    #[error("UPS daemon unavailable: {0}")]
    Connectivity(#[source] NutError),

    /// The daemon does not know the target unit
    #[error("Unknown UPS unit: {0}")]
    UnknownUnit(String),

    /// No unit configured, and discovery did not find exactly one
    #[error("No target UPS unit: configure one explicitly or make sure upsd serves exactly one")]
    UnresolvedTarget,
}

impl From<NutError> for TelemetryError {
    fn from(error: NutError) -> Self {
        match error {
            NutError::UnknownUnit(unit) => TelemetryError::UnknownUnit(unit),
            other => TelemetryError::Connectivity(other),
        }
    }
}
