use crate::application::log_sink::DEFAULT_CONSOLE_MAX_LINES;
use crate::application::poller::PollSchedule;
use crate::domain::dashboard::UNKNOWN;
use crate::domain::time_series::DEFAULT_HISTORY_CAPACITY;
use crate::domain::vehicle::{is_valid_date_format, VehicleDescriptor};
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

const CONFIG_FILE: &str = "config/dashboard";
const ENV_PREFIX: &str = "DASHBOARD";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub chart: ChartSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub vehicles: Vec<VehicleDescriptor>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Refresh periods in milliseconds.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshSettings {
    pub power_ms: u64,
    pub mode_ms: u64,
    pub wallbox_ms: u64,
    pub vehicle_ms: u64,
    pub history_ms: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            power_ms: 2000,
            mode_ms: 2000,
            wallbox_ms: 3000,
            vehicle_ms: 5000,
            history_ms: 5000,
        }
    }
}

impl RefreshSettings {
    pub fn schedule(&self) -> PollSchedule {
        PollSchedule {
            power: Duration::from_millis(self.power_ms),
            mode: Duration::from_millis(self.mode_ms),
            wallbox: Duration::from_millis(self.wallbox_ms),
            vehicles: Duration::from_millis(self.vehicle_ms),
            history: Duration::from_millis(self.history_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub history_capacity: usize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplaySettings {
    pub unknown_label: String,
    pub not_connected_label: String,
    /// chrono format string for the vehicle "last update" field
    pub date_format: String,
    pub console_max_lines: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            unknown_label: UNKNOWN.to_string(),
            not_connected_label: "not connected".to_string(),
            date_format: "%d.%m.%Y %H:%M".to_string(),
            console_max_lines: DEFAULT_CONSOLE_MAX_LINES,
        }
    }
}

/// Host running the flow API that can restart the device.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeviceSettings {
    pub flow_api_host: String,
    pub flow_api_port: u16,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            flow_api_host: "localhost".to_string(),
            flow_api_port: 1880,
        }
    }
}

impl DeviceSettings {
    pub fn restart_url(&self) -> String {
        format!(
            "http://{}:{}/dev/restart",
            self.flow_api_host, self.flow_api_port
        )
    }
}

impl AppConfig {
    /// Rejects values the services cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let refresh = &self.refresh;
        for (name, period) in [
            ("power_ms", refresh.power_ms),
            ("mode_ms", refresh.mode_ms),
            ("wallbox_ms", refresh.wallbox_ms),
            ("vehicle_ms", refresh.vehicle_ms),
            ("history_ms", refresh.history_ms),
        ] {
            if period == 0 {
                anyhow::bail!("refresh.{} must be greater than zero", name);
            }
        }
        if self.backend.base_url.trim().is_empty() {
            anyhow::bail!("backend.base_url must not be empty");
        }
        if !is_valid_date_format(&self.display.date_format) {
            anyhow::bail!(
                "display.date_format '{}' is not a valid chrono format",
                self.display.date_format
            );
        }
        Ok(())
    }
}

/// Loads `config/dashboard.{toml,yaml,json}` if present, overridden by
/// `DASHBOARD__SECTION__KEY` environment variables.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .context("Failed to read dashboard configuration")?;

    let app_config: AppConfig = settings
        .try_deserialize()
        .context("Invalid dashboard configuration")?;
    app_config.validate()?;
    Ok(app_config)
}

/// Same layering as [`load_config`] without the environment, from TOML text.
pub fn parse_config(toml: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}
