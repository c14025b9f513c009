// Backend manager API trait
use crate::domain::power::MeterReading;
use crate::domain::time_series::TimeSeriesPoint;
use crate::domain::vehicle::VehicleState;
use crate::domain::wallbox::{ChargeMode, ChargingSession};
use crate::error::DashboardResult;
use async_trait::async_trait;

/// Every backend endpoint the dashboard reads or writes.
#[async_trait]
pub trait ManagerApi: Send + Sync {
    /// Battery state of energy in percent
    async fn powerwall_soe(&self) -> DashboardResult<f64>;

    /// Instantaneous meter values in watts
    async fn meters(&self) -> DashboardResult<MeterReading>;

    /// Meter history, optionally only points strictly newer than `cursor`
    async fn meter_history(&self, cursor: Option<f64>) -> DashboardResult<Vec<TimeSeriesPoint>>;

    async fn mode(&self) -> DashboardResult<ChargeMode>;

    async fn set_mode(&self, mode: ChargeMode) -> DashboardResult<()>;

    /// Manual charging power limit in watts
    async fn set_power_limit(&self, watts: f64) -> DashboardResult<()>;

    async fn session(&self) -> DashboardResult<ChargingSession>;

    /// Momentary wallbox power in watts
    async fn wallbox_power(&self) -> DashboardResult<f64>;

    async fn bmw_state(&self, alias: &str, allow_cache: bool) -> DashboardResult<VehicleState>;

    /// Epoch seconds of the provider's last vehicle contact
    async fn bmw_last_update(&self, alias: &str) -> DashboardResult<f64>;

    /// Asks the device hosting the backend to reboot; returns its acknowledgement
    async fn restart_device(&self) -> DashboardResult<String>;
}
