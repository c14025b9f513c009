// Dashboard view model
use serde::Serialize;

use super::power::PowerGauges;
use super::time_series::RenderableSeries;
use super::vehicle::VehicleCard;
use super::wallbox::{ModeToggle, WallboxCard};

/// Shown in place of any field whose last refresh failed.
pub const UNKNOWN: &str = "unknown";

/// Everything the dashboard page displays, field for field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Bumped on every change so listeners can tell snapshots apart.
    pub revision: u64,
    pub power: PowerGauges,
    pub wallbox: WallboxCard,
    pub mode: ModeToggle,
    pub vehicles: Vec<VehicleCard>,
    pub chart: Vec<RenderableSeries>,
    pub settings_visible: bool,
}

impl DashboardView {
    pub fn new(unknown: &str, vehicles: Vec<VehicleCard>) -> Self {
        Self {
            revision: 0,
            power: PowerGauges::unknown(unknown),
            wallbox: WallboxCard::unknown(unknown),
            mode: ModeToggle::default(),
            vehicles,
            chart: Vec::new(),
            settings_visible: false,
        }
    }

    pub fn vehicle_mut(&mut self, alias: &str) -> Option<&mut VehicleCard> {
        self.vehicles.iter_mut().find(|v| v.alias == alias)
    }
}
