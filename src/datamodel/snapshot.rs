use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Raw keys reported in seconds that are exposed in minutes.
pub const CONVERT_TO_MINUTES: [&str; 2] = ["battery.runtime", "battery.runtime.low"];

/// A single normalized value of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    Text(String),
    Number(f64),
}

impl SnapshotValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SnapshotValue::Number(value) => Some(*value),
            SnapshotValue::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl fmt::Display for SnapshotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotValue::Text(text) => write!(f, "{}", text),
            SnapshotValue::Number(value) => write!(f, "{:.1}", value),
        }
    }
}

/// Turn `battery.charge` into `battery_charge`.
pub fn normalize_key(raw_key: &str) -> String {
    raw_key.replace('.', "_")
}

fn seconds_to_minutes(seconds: f64) -> f64 {
    (seconds / 60.0 * 10.0).round() / 10.0
}

/// Normalize one raw pair reported by the daemon.
pub fn normalize_value(raw_key: &str, raw_value: &str) -> SnapshotValue {
    if !CONVERT_TO_MINUTES.contains(&raw_key) {
        return SnapshotValue::Text(raw_value.to_string());
    }

    match raw_value.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() => SnapshotValue::Number(seconds_to_minutes(seconds)),
        _ => {
            warn!(
                "Value {:?} of {} is not a number of seconds, keeping it as is",
                raw_value, raw_key
            );
            SnapshotValue::Text(raw_value.to_string())
        }
    }
}

/// Every normalized value produced by one successful fetch.
///
/// A snapshot is never modified once built; a refresh builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    values: BTreeMap<String, SnapshotValue>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_raw<I, K, V>(raw: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let values = raw
            .into_iter()
            .map(|(key, value)| {
                let key = key.as_ref();
                (normalize_key(key), normalize_value(key, value.as_ref()))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&SnapshotValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SnapshotValue)> {
        self.values.iter()
    }
}
