// Application state for HTTP handlers
use crate::application::device_service::DeviceService;
use crate::application::history_service::HistoryService;
use crate::application::log_sink::ConsolePanel;
use crate::application::vehicle_service::VehicleService;
use crate::application::view_store::ViewStore;
use crate::application::wallbox_service::WallboxService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub view: Arc<ViewStore>,
    pub console: Arc<ConsolePanel>,
    pub history: Arc<HistoryService>,
    pub wallbox: Arc<WallboxService>,
    pub vehicles: Arc<VehicleService>,
    pub device: DeviceService,
}
