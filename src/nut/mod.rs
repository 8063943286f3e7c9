use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Debug;

pub mod client;
pub mod error;
pub mod protocol;

pub use client::NutClient;
pub use error::NutError;

/// What the telemetry core needs from a UPS daemon.
#[async_trait]
pub trait UpsClient: Send + Sync + Debug {
    /// Units known to the daemon, mapped to their description.
    async fn list_units(&self) -> Result<BTreeMap<String, String>, NutError>;

    /// Raw variables of one unit, e.g. `battery.charge` -> `"100"`.
    async fn list_variables(&self, unit: &str) -> Result<BTreeMap<String, String>, NutError>;
}
