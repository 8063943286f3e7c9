use anyhow::Error;
use confique::Config;
use std::{
    net::IpAddr,
    path::Path,
    sync::{Arc, OnceLock},
    time::Duration,
};

pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Config)]
pub struct UpsAppConfig {
    #[config(env = "UPSAPP_NUT_HOST", default = "localhost")]
    pub nut_host: String,

    #[config(env = "UPSAPP_NUT_PORT", default = 3493)]
    pub nut_port: u16,

    /// Unit to monitor. Discovered when upsd serves exactly one.
    #[config(env = "UPSAPP_UPS_NAME")]
    pub ups_name: Option<String>,

    /// Metric keys to expose, e.g. `battery_charge,ups_load`.
    #[config(
        env = "UPSAPP_RESOURCES",
        parse_env = confique::env::parse::list_by_comma,
        default = []
    )]
    pub resources: Vec<String>,

    #[config(env = "UPSAPP_MIN_REFRESH_INTERVAL_SECONDS", default = 60)]
    pub min_refresh_interval_seconds: u64,

    #[config(env = "UPSAPP_SCAN_INTERVAL_SECONDS", default = 30)]
    pub scan_interval_seconds: u64,

    #[config(env = "UPSAPP_NUT_TIMEOUT_SECONDS", default = 10)]
    pub nut_timeout_seconds: u64,

    #[config(env = "UPSAPP_PORT", default = 3000)]
    pub port: u16,
    #[config(env = "UPSAPP_ENDPOINT", default = "127.0.0.1")]
    pub endpoint: IpAddr,

    #[config(env = "UPSAPP_HTTP_SERVER_TIMEOUT_SECONDS", default = 30)]
    pub http_server_timeout_seconds: u64,

    #[config(env = "UPSAPP_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

impl UpsAppConfig {
    pub fn load() -> Result<UpsAppConfig, Error> {
        Self::load_from(DEFAULT_SETTINGS_FILE)
    }

    pub fn load_from(settings_file: impl AsRef<Path>) -> Result<UpsAppConfig, Error> {
        let c = UpsAppConfig::builder()
            .env()
            .file(settings_file.as_ref())
            .load()?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.scan_interval_seconds == 0 {
            anyhow::bail!("The scan interval must be at least one second");
        }
        if self.nut_timeout_seconds == 0 {
            anyhow::bail!("The NUT timeout must be at least one second");
        }
        Ok(())
    }

    /// Configured unit name, with blank values treated as absent.
    pub fn ups_name(&self) -> Option<String> {
        self.ups_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }

    /// Requested metric keys, trimmed and lower-cased.
    pub fn resources(&self) -> Vec<String> {
        self.resources
            .iter()
            .map(|resource| resource.trim().to_lowercase())
            .filter(|resource| !resource.is_empty())
            .collect()
    }

    pub fn min_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.min_refresh_interval_seconds)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_seconds)
    }

    pub fn nut_timeout(&self) -> Duration {
        Duration::from_secs(self.nut_timeout_seconds)
    }
}

pub static UPSAPP_CONFIG: OnceLock<Arc<UpsAppConfig>> = OnceLock::new();

pub fn get() -> Result<Arc<UpsAppConfig>, Error> {
    UPSAPP_CONFIG.get().cloned().ok_or_else(|| {
        Error::msg(
            "Configuration not loaded. Please call load_configuration() before using the configuration",
        )
    })
}

pub fn load_configuration() -> Result<(), Error> {
    load_configuration_from(DEFAULT_SETTINGS_FILE)
}

pub fn load_configuration_from(settings_file: impl AsRef<Path>) -> Result<(), Error> {
    // Check if the configuration has already been loaded
    if UPSAPP_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = UpsAppConfig::load_from(settings_file)?;
    UPSAPP_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}
