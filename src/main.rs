// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::device_service::DeviceService;
use crate::application::history_service::HistoryService;
use crate::application::log_sink::{ConsolePanel, LogListener, LogSink, TracingListener};
use crate::application::manager_api::ManagerApi;
use crate::application::poller::Pollers;
use crate::application::power_service::PowerService;
use crate::application::vehicle_service::VehicleService;
use crate::application::view_store::ViewStore;
use crate::application::wallbox_service::WallboxService;
use crate::domain::dashboard::DashboardView;
use crate::infrastructure::config::load_config;
use crate::infrastructure::manager_client::HttpManagerClient;
use crate::presentation::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_config()?;
    let display = &config.display;

    // Create the backend client (infrastructure layer)
    let api: Arc<dyn ManagerApi> = Arc::new(
        HttpManagerClient::new(
            &config.backend.base_url,
            config.device.restart_url(),
            config.backend.timeout(),
        )
        .context("Failed to build HTTP client")?,
    );

    // Log events go to the process log and the on-page console
    let console = Arc::new(ConsolePanel::new(display.console_max_lines));
    let sink = LogSink::new(vec![
        Arc::new(TracingListener) as Arc<dyn LogListener>,
        console.clone() as Arc<dyn LogListener>,
    ]);

    // Create services (application layer)
    let view = Arc::new(ViewStore::new(DashboardView::new(
        &display.unknown_label,
        Vec::new(),
    )));
    let vehicles = Arc::new(
        VehicleService::new(
            &config.vehicles,
            api.clone(),
            view.clone(),
            sink.clone(),
            display.unknown_label.clone(),
            display.date_format.clone(),
        )
        .context("Invalid vehicle configuration")?,
    );
    let power = Arc::new(PowerService::new(
        api.clone(),
        view.clone(),
        sink.clone(),
        display.unknown_label.clone(),
    ));
    let wallbox = Arc::new(WallboxService::new(
        api.clone(),
        view.clone(),
        sink.clone(),
        display.unknown_label.clone(),
        display.not_connected_label.clone(),
    ));
    let history = Arc::new(HistoryService::new(
        api.clone(),
        view.clone(),
        sink.clone(),
        config.chart.history_capacity,
    ));
    let device = DeviceService::new(api, sink);

    let pollers = Pollers::start(
        config.refresh.schedule(),
        power,
        wallbox.clone(),
        vehicles.clone(),
        history.clone(),
    );

    // Create application state
    let state = Arc::new(AppState {
        view,
        console,
        history,
        wallbox,
        vehicles,
        device,
    });

    // Build router (presentation layer)
    let router = presentation::router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.server.bind_addr))?;
    tracing::info!(
        "Starting energy-dashboard on {} (backend {})",
        addr,
        config.backend.base_url
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    pollers.shutdown();
    Ok(())
}
