// Power service - Meter gauges and battery level
use crate::application::log_sink::LogSink;
use crate::application::manager_api::ManagerApi;
use crate::application::request_guard::LatestRequestGuard;
use crate::application::view_store::ViewStore;
use crate::domain::power::format_percentage;
use std::sync::Arc;

pub struct PowerService {
    api: Arc<dyn ManagerApi>,
    view: Arc<ViewStore>,
    sink: LogSink,
    unknown: String,
    meters_guard: LatestRequestGuard,
    soe_guard: LatestRequestGuard,
}

impl PowerService {
    pub fn new(api: Arc<dyn ManagerApi>, view: Arc<ViewStore>, sink: LogSink, unknown: String) -> Self {
        Self {
            api,
            view,
            sink,
            unknown,
            meters_guard: LatestRequestGuard::new(),
            soe_guard: LatestRequestGuard::new(),
        }
    }

    /// Polls meters and battery level independently of each other.
    pub async fn refresh(&self) {
        tokio::join!(self.refresh_meters(), self.refresh_battery_level());
    }

    pub async fn refresh_meters(&self) {
        let ticket = self.meters_guard.issue();
        let result = self.api.meters().await;
        if !self.meters_guard.admit(ticket, &self.sink, "meter") {
            return;
        }

        match result {
            Ok(reading) => {
                self.view.update(|view| view.power.apply_reading(&reading));
                self.sink.info("Received power info from manager");
            }
            Err(e) => {
                self.view.update(|view| view.power.clear_reading(&self.unknown));
                self.sink.error(format!("Could not get new power readings: {}", e));
            }
        }
    }

    pub async fn refresh_battery_level(&self) {
        let ticket = self.soe_guard.issue();
        let result = self.api.powerwall_soe().await;
        if !self.soe_guard.admit(ticket, &self.sink, "battery level") {
            return;
        }

        match result {
            Ok(percentage) => {
                self.view
                    .update(|view| view.power.battery_level = format_percentage(percentage));
            }
            Err(e) => {
                self.view
                    .update(|view| view.power.battery_level = self.unknown.clone());
                self.sink.error(format!("Could not get battery level: {}", e));
            }
        }
    }
}
