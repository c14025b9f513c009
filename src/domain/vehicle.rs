// Vehicle card domain models
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::str::FromStr;

use crate::error::DashboardError;

/// Manufacturer tag attached to a configured vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Manufacturer {
    Bmw,
    Audi,
}

impl FromStr for Manufacturer {
    type Err = DashboardError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "bmw" => Ok(Manufacturer::Bmw),
            "audi" => Ok(Manufacturer::Audi),
            _ => Err(DashboardError::UnsupportedManufacturer(tag.to_string())),
        }
    }
}

/// A vehicle as listed in the configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VehicleDescriptor {
    pub alias: String,
    pub name: String,
    pub manufacturer: String,
}

/// Raw charging state as reported by the telemetry provider.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub charging_status: String,
    pub state_of_charge: f64,
    pub remaining_range_km: f64,
}

pub fn charging_status_label(status: &str) -> String {
    match status {
        "INVALID" => "Not connected",
        "NOT_CHARGING" => "Connected",
        "FINISHED_NOT_FULL" => "Charging finished",
        "FINISHED_FULLY_CHARGED" => "Fully charged",
        "ERROR" => "Error",
        "CHARGING" => "Charging",
        "WAITING_FOR_CHARGING" => "Waiting for wallbox",
        other => other,
    }
    .to_string()
}

/// Display fields of one vehicle card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleCard {
    pub alias: String,
    pub name: String,
    pub manufacturer: Manufacturer,
    pub thumbnail_url: String,
    pub charging_status: String,
    pub state_of_charge: String,
    pub range: String,
    pub last_update: String,
}

impl VehicleCard {
    pub fn new(
        descriptor: &VehicleDescriptor,
        manufacturer: Manufacturer,
        thumbnail_url: String,
        unknown: &str,
    ) -> Self {
        Self {
            alias: descriptor.alias.clone(),
            name: descriptor.name.clone(),
            manufacturer,
            thumbnail_url,
            charging_status: unknown.to_string(),
            state_of_charge: unknown.to_string(),
            range: unknown.to_string(),
            last_update: unknown.to_string(),
        }
    }

    pub fn apply_state(&mut self, state: &VehicleState) {
        self.charging_status = charging_status_label(&state.charging_status);
        self.state_of_charge = format_number(state.state_of_charge);
        self.range = format_number(state.remaining_range_km);
    }

    pub fn clear_state(&mut self, unknown: &str) {
        self.charging_status = unknown.to_string();
        self.state_of_charge = unknown.to_string();
        self.range = unknown.to_string();
    }
}

/// Integral values print without a fractional part, like the provider sends them.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Renders an epoch-seconds timestamp in local time using a chrono format
/// string. `None` for an out-of-range timestamp or an unusable format.
pub fn format_last_update(epoch_seconds: f64, date_format: &str) -> Option<String> {
    let secs = epoch_seconds.floor() as i64;
    let utc = DateTime::<Utc>::from_timestamp(secs, 0)?;
    let mut rendered = String::new();
    write!(rendered, "{}", utc.with_timezone(&Local).format(date_format)).ok()?;
    Some(rendered)
}

/// Whether chrono understands every specifier in `date_format`.
pub fn is_valid_date_format(date_format: &str) -> bool {
    StrftimeItems::new(date_format).all(|item| !matches!(item, Item::Error))
}
