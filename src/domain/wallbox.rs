// Wallbox card and charge mode domain models
use serde::Serialize;

use super::power::format_kw;

/// Charging session as reported by the manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargingSession {
    /// Keba "reason" code; 0 means a vehicle is plugged in.
    pub reason: i64,
    pub vehicle_name: String,
    /// Keba "E pres", in units of 0.1 Wh.
    pub energy_present: f64,
}

impl ChargingSession {
    pub fn energy_kwh(&self) -> f64 {
        self.energy_present / 10000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeMode {
    Automatic,
    Manual,
}

impl ChargeMode {
    /// Anything other than "manual" counts as automatic.
    pub fn from_wire(mode: &str) -> Self {
        if mode == "manual" {
            ChargeMode::Manual
        } else {
            ChargeMode::Automatic
        }
    }

    pub fn as_query(&self) -> &'static str {
        match self {
            ChargeMode::Automatic => "automatic",
            ChargeMode::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallboxCard {
    pub vehicle_name: String,
    pub session_energy: String,
    pub momentary_power: String,
}

impl WallboxCard {
    pub fn unknown(label: &str) -> Self {
        Self {
            vehicle_name: label.to_string(),
            session_energy: label.to_string(),
            momentary_power: label.to_string(),
        }
    }

    pub fn apply_session(&mut self, session: &ChargingSession, not_connected: &str) {
        self.vehicle_name = if session.reason == 0 {
            session.vehicle_name.clone()
        } else {
            not_connected.to_string()
        };
        self.session_energy = format!("{}", session.energy_kwh());
    }

    pub fn clear_session(&mut self, label: &str) {
        self.vehicle_name = label.to_string();
        self.session_energy = label.to_string();
    }

    pub fn apply_power(&mut self, watts: f64) {
        self.momentary_power = format_kw(watts);
    }

    pub fn clear_power(&mut self, label: &str) {
        self.momentary_power = label.to_string();
    }
}

/// Charge mode toggle. `None` until the first successful mode poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeToggle {
    pub mode: Option<ChargeMode>,
    pub manual_menu_visible: bool,
}

impl ModeToggle {
    pub fn set(&mut self, mode: ChargeMode) {
        self.mode = Some(mode);
        self.manual_menu_visible = mode == ChargeMode::Manual;
    }

    pub fn clear(&mut self) {
        self.mode = None;
        self.manual_menu_visible = false;
    }
}

impl Default for ModeToggle {
    fn default() -> Self {
        Self {
            mode: None,
            manual_menu_visible: false,
        }
    }
}
