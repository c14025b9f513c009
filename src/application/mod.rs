// Application layer - Polling use cases and the shared view model
pub mod device_service;
pub mod history_service;
pub mod log_sink;
pub mod manager_api;
pub mod poller;
pub mod power_service;
pub mod request_guard;
pub mod vehicle_service;
pub mod view_store;
pub mod wallbox_service;

#[cfg(test)]
pub mod testing;
