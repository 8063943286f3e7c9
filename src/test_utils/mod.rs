use crate::nut::{NutError, UpsClient};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory stand-in for a `upsd` daemon, counting every call it receives.
#[derive(Debug, Default)]
pub struct MockUpsClient {
    units: Mutex<BTreeMap<String, String>>,
    variables: Mutex<BTreeMap<String, String>>,
    delay: Mutex<Duration>,
    failing: AtomicBool,
    list_units_calls: AtomicUsize,
    list_variables_calls: AtomicUsize,
    requested_units: Mutex<Vec<String>>,
}

impl MockUpsClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock serving a single unit named `ups`.
    pub fn single_unit<I, K, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mock = Self::new().with_units(&["ups"]);
        mock.set_variables(variables);
        mock
    }

    pub fn with_units(self, units: &[&str]) -> Self {
        {
            let mut guard = self.units.lock().unwrap();
            for unit in units {
                guard.insert(unit.to_string(), format!("Mock UPS {}", unit));
            }
        }
        self
    }

    /// Make `list_variables` take some time, to widen race windows.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = delay;
        self
    }

    pub fn set_variables<I, K, V>(&self, variables: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        *self.variables.lock().unwrap() = variables
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
    }

    /// While failing, every call returns a connection error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn list_units_calls(&self) -> usize {
        self.list_units_calls.load(Ordering::SeqCst)
    }

    pub fn list_variables_calls(&self) -> usize {
        self.list_variables_calls.load(Ordering::SeqCst)
    }

    pub fn requested_units(&self) -> Vec<String> {
        self.requested_units.lock().unwrap().clone()
    }

    fn connection_error() -> NutError {
        NutError::Connect {
            address: "mock:3493".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "mock is down"),
        }
    }
}

#[async_trait]
impl UpsClient for MockUpsClient {
    async fn list_units(&self) -> Result<BTreeMap<String, String>, NutError> {
        self.list_units_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Self::connection_error());
        }
        Ok(self.units.lock().unwrap().clone())
    }

    async fn list_variables(&self, unit: &str) -> Result<BTreeMap<String, String>, NutError> {
        self.list_variables_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_units.lock().unwrap().push(unit.to_string());

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(Self::connection_error());
        }
        if !self.units.lock().unwrap().contains_key(unit) {
            return Err(NutError::UnknownUnit(unit.to_string()));
        }
        Ok(self.variables.lock().unwrap().clone())
    }
}
