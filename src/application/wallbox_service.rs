// Wallbox service - Charging session, wallbox power and charge mode
use crate::application::log_sink::LogSink;
use crate::application::manager_api::ManagerApi;
use crate::application::request_guard::LatestRequestGuard;
use crate::application::view_store::ViewStore;
use crate::domain::wallbox::ChargeMode;
use crate::error::{DashboardError, DashboardResult};
use std::sync::Arc;

pub struct WallboxService {
    api: Arc<dyn ManagerApi>,
    view: Arc<ViewStore>,
    sink: LogSink,
    unknown: String,
    not_connected: String,
    session_guard: LatestRequestGuard,
    power_guard: LatestRequestGuard,
    mode_guard: LatestRequestGuard,
}

impl WallboxService {
    pub fn new(
        api: Arc<dyn ManagerApi>,
        view: Arc<ViewStore>,
        sink: LogSink,
        unknown: String,
        not_connected: String,
    ) -> Self {
        Self {
            api,
            view,
            sink,
            unknown,
            not_connected,
            session_guard: LatestRequestGuard::new(),
            power_guard: LatestRequestGuard::new(),
            mode_guard: LatestRequestGuard::new(),
        }
    }

    /// Refreshes the wallbox card: session and momentary power.
    pub async fn refresh(&self) {
        tokio::join!(self.refresh_session(), self.refresh_power());
    }

    pub async fn refresh_session(&self) {
        let ticket = self.session_guard.issue();
        let result = self.api.session().await;
        if !self.session_guard.admit(ticket, &self.sink, "charging session") {
            return;
        }

        match result {
            Ok(session) => {
                self.view
                    .update(|view| view.wallbox.apply_session(&session, &self.not_connected));
                self.sink.info("Received charging session info from wallbox");
            }
            Err(e) => {
                self.view
                    .update(|view| view.wallbox.clear_session(&self.unknown));
                self.sink.error(format!("Could not update wallbox info: {}", e));
            }
        }
    }

    pub async fn refresh_power(&self) {
        let ticket = self.power_guard.issue();
        let result = self.api.wallbox_power().await;
        if !self.power_guard.admit(ticket, &self.sink, "wallbox power") {
            return;
        }

        match result {
            Ok(watts) => {
                self.view.update(|view| view.wallbox.apply_power(watts));
                self.sink.info("Received power info from wallbox");
            }
            Err(e) => {
                self.view.update(|view| view.wallbox.clear_power(&self.unknown));
                self.sink.error(format!("Could not update wallbox power: {}", e));
            }
        }
    }

    pub async fn refresh_mode(&self) {
        let ticket = self.mode_guard.issue();
        let result = self.api.mode().await;
        if !self.mode_guard.admit(ticket, &self.sink, "mode") {
            return;
        }

        match result {
            Ok(mode) => {
                self.view.update(|view| view.mode.set(mode));
                self.sink.info("Received mode info from manager");
            }
            Err(e) => {
                self.view.update(|view| view.mode.clear());
                self.sink.error(format!("Could not get new manager mode info: {}", e));
            }
        }
    }

    /// Switches the manager mode. The toggle follows immediately; a poll that
    /// was already in flight is invalidated so it cannot flip it back.
    pub async fn set_mode(&self, mode: ChargeMode) -> DashboardResult<()> {
        self.mode_guard.issue();
        self.view.update(|view| view.mode.set(mode));

        match self.api.set_mode(mode).await {
            Ok(()) => {
                self.sink.info("Changed manager mode");
                Ok(())
            }
            Err(e) => {
                self.sink.error(format!("Could not change manager mode: {}", e));
                Err(e)
            }
        }
    }

    pub async fn set_power_limit(&self, watts: f64) -> DashboardResult<()> {
        if !watts.is_finite() || watts < 0.0 {
            return Err(DashboardError::InvalidInput(format!(
                "power limit must be a non-negative number of watts, got {}",
                watts
            )));
        }

        match self.api.set_power_limit(watts).await {
            Ok(()) => {
                self.sink.info("Changed manager manual power limit");
                Ok(())
            }
            Err(e) => {
                self.sink.error(format!("Could not set new manual power limit: {}", e));
                Err(e)
            }
        }
    }
}
