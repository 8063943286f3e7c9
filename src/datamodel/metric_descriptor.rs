use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

pub const NAME_PREFIX: &str = "UPS ";
pub const GENERIC_ICON: &str = "mdi:information-outline";

/// Presentation metadata of one metric kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetricDescriptor {
    pub key: String,
    pub label: String,
    pub unit: String,
    pub icon: String,
}

impl MetricDescriptor {
    pub fn new(key: &str, label: &str, unit: &str, icon: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            unit: unit.to_string(),
            icon: icon.to_string(),
        }
    }

    /// Descriptor used for keys nobody described in advance.
    pub fn generic(key: &str) -> Self {
        Self::new(key, &title_case(key), "", GENERIC_ICON)
    }

    /// Name shown to users, e.g. `UPS Battery`.
    pub fn display_name(&self) -> String {
        format!("{}{}", NAME_PREFIX, self.label)
    }
}

/// Capitalize the first letter of every alphabetic run, lowercase the rest.
///
/// `battery_mfr_date` becomes `Battery_Mfr_Date`.
pub fn title_case(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut previous_is_letter = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                output.extend(c.to_lowercase());
            } else {
                output.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            output.push(c);
            previous_is_letter = false;
        }
    }
    output
}

const DEFAULT_DESCRIPTORS: [(&str, &str, &str, &str); 12] = [
    ("battery_charge", "Battery", "%", "mdi:battery"),
    ("battery_charge_low", "Battery Critical", "%", "mdi:battery"),
    ("battery_charge_warning", "Battery Warning", "%", "mdi:battery"),
    ("battery_runtime", "Runtime", "min", "mdi:calendar-clock"),
    ("battery_runtime_low", "Runtime Critical", "min", "mdi:calendar-clock"),
    ("battery_temperature", "Battery Temperature", "°C", "mdi:thermometer"),
    ("battery_voltage", "Battery Voltage", "V", "mdi:flash"),
    ("battery_voltage_nominal", "Battery Nominal Voltage", "V", "mdi:flash"),
    ("input_voltage", "Input Voltage", "V", "mdi:flash"),
    ("output_voltage", "Output Voltage", "V", "mdi:flash"),
    ("output_voltage_nominal", "Nominal Output Voltage", "V", "mdi:flash"),
    ("ups_load", "Load", "%", "mdi:gauge"),
];

/// Known metric kinds, indexed by lower case normalized key.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    descriptors: HashMap<String, MetricDescriptor>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        let descriptors = DEFAULT_DESCRIPTORS
            .iter()
            .map(|(key, label, unit, icon)| {
                (key.to_string(), MetricDescriptor::new(key, label, unit, icon))
            })
            .collect();
        Self { descriptors }
    }
}

impl MetricRegistry {
    pub fn empty() -> Self {
        Self {
            descriptors: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetricDescriptor> {
        self.descriptors.get(&key.to_lowercase())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.descriptors.contains_key(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Return the descriptor of `key`, registering a generic one first if needed.
    ///
    /// The boolean is true when the descriptor had to be created.
    pub fn get_or_register(&mut self, key: &str) -> (MetricDescriptor, bool) {
        let key = key.to_lowercase();
        let mut created = false;
        let descriptor = self
            .descriptors
            .entry(key)
            .or_insert_with_key(|key| {
                created = true;
                MetricDescriptor::generic(key)
            })
            .clone();
        (descriptor, created)
    }
}
