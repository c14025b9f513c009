// Vehicle service - Per-manufacturer vehicle cards
use crate::application::log_sink::LogSink;
use crate::application::manager_api::ManagerApi;
use crate::application::request_guard::LatestRequestGuard;
use crate::application::view_store::ViewStore;
use crate::domain::vehicle::{
    format_last_update, Manufacturer, VehicleCard, VehicleDescriptor, VehicleState,
};
use crate::error::{DashboardError, DashboardResult};
use async_trait::async_trait;
use std::sync::Arc;

/// What the dashboard can learn about a vehicle from its manufacturer's
/// telemetry provider. `Ok(None)` means the provider does not offer it.
#[async_trait]
pub trait VehicleSource: Send + Sync {
    fn manufacturer(&self) -> Manufacturer;

    fn thumbnail_url(&self, alias: &str) -> String;

    async fn state(&self, alias: &str, allow_cache: bool) -> DashboardResult<Option<VehicleState>>;

    async fn last_update(&self, alias: &str) -> DashboardResult<Option<f64>>;
}

pub struct BmwSource {
    api: Arc<dyn ManagerApi>,
}

impl BmwSource {
    pub fn new(api: Arc<dyn ManagerApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl VehicleSource for BmwSource {
    fn manufacturer(&self) -> Manufacturer {
        Manufacturer::Bmw
    }

    fn thumbnail_url(&self, alias: &str) -> String {
        format!("/bmw/thumbnail?vehicle={}", urlencoding::encode(alias))
    }

    async fn state(&self, alias: &str, allow_cache: bool) -> DashboardResult<Option<VehicleState>> {
        self.api.bmw_state(alias, allow_cache).await.map(Some)
    }

    async fn last_update(&self, alias: &str) -> DashboardResult<Option<f64>> {
        self.api.bmw_last_update(alias).await.map(Some)
    }
}

/// The Audi provider only serves a thumbnail.
#[derive(Debug, Default)]
pub struct AudiSource;

#[async_trait]
impl VehicleSource for AudiSource {
    fn manufacturer(&self) -> Manufacturer {
        Manufacturer::Audi
    }

    fn thumbnail_url(&self, alias: &str) -> String {
        format!("/audi/thumbnail?vehicle={}", urlencoding::encode(alias))
    }

    async fn state(&self, _alias: &str, _allow_cache: bool) -> DashboardResult<Option<VehicleState>> {
        Ok(None)
    }

    async fn last_update(&self, _alias: &str) -> DashboardResult<Option<f64>> {
        Ok(None)
    }
}

/// Picks the source for a manufacturer tag from the configuration.
pub fn source_for(tag: &str, api: Arc<dyn ManagerApi>) -> DashboardResult<Arc<dyn VehicleSource>> {
    match tag.parse::<Manufacturer>()? {
        Manufacturer::Bmw => Ok(Arc::new(BmwSource::new(api))),
        Manufacturer::Audi => Ok(Arc::new(AudiSource)),
    }
}

struct TrackedVehicle {
    alias: String,
    name: String,
    source: Arc<dyn VehicleSource>,
    state_guard: LatestRequestGuard,
    update_guard: LatestRequestGuard,
}

pub struct VehicleService {
    vehicles: Vec<TrackedVehicle>,
    view: Arc<ViewStore>,
    sink: LogSink,
    unknown: String,
    date_format: String,
}

impl VehicleService {
    /// Builds one tracked vehicle per descriptor and puts its card, every
    /// field unknown, on the dashboard. Fails on the first manufacturer tag
    /// without a source.
    pub fn new(
        descriptors: &[VehicleDescriptor],
        api: Arc<dyn ManagerApi>,
        view: Arc<ViewStore>,
        sink: LogSink,
        unknown: String,
        date_format: String,
    ) -> DashboardResult<Self> {
        let mut cards = Vec::with_capacity(descriptors.len());
        let mut vehicles = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let source = source_for(&descriptor.manufacturer, api.clone())?;
            cards.push(VehicleCard::new(
                descriptor,
                source.manufacturer(),
                source.thumbnail_url(&descriptor.alias),
                &unknown,
            ));
            vehicles.push(TrackedVehicle {
                alias: descriptor.alias.clone(),
                name: descriptor.name.clone(),
                source,
                state_guard: LatestRequestGuard::new(),
                update_guard: LatestRequestGuard::new(),
            });
        }
        view.update(|v| v.vehicles = cards);

        Ok(Self {
            vehicles,
            view,
            sink,
            unknown,
            date_format,
        })
    }

    pub fn aliases(&self) -> Vec<String> {
        self.vehicles.iter().map(|v| v.alias.clone()).collect()
    }

    pub async fn refresh_all(&self) {
        let refreshes = self.vehicles.iter().map(|v| self.refresh(v, true));
        futures::future::join_all(refreshes).await;
    }

    /// Manual refresh from the card: bypasses the provider cache.
    pub async fn refresh_vehicle(&self, alias: &str) -> DashboardResult<()> {
        let vehicle = self
            .vehicles
            .iter()
            .find(|v| v.alias == alias)
            .ok_or_else(|| DashboardError::InvalidInput(format!("unknown vehicle '{}'", alias)))?;
        self.refresh(vehicle, false).await;
        Ok(())
    }

    async fn refresh(&self, vehicle: &TrackedVehicle, allow_cache: bool) {
        tokio::join!(
            self.refresh_state(vehicle, allow_cache),
            self.refresh_last_update(vehicle)
        );
    }

    async fn refresh_state(&self, vehicle: &TrackedVehicle, allow_cache: bool) {
        let ticket = vehicle.state_guard.issue();
        let result = vehicle.source.state(&vehicle.alias, allow_cache).await;
        if !vehicle.state_guard.admit(ticket, &self.sink, "vehicle state") {
            return;
        }

        match result {
            Ok(Some(state)) => {
                self.update_card(&vehicle.alias, |card| card.apply_state(&state));
                self.sink
                    .info(format!("Received updated vehicle state for {}...", vehicle.name));
            }
            Ok(None) => {}
            Err(e) => {
                self.update_card(&vehicle.alias, |card| card.clear_state(&self.unknown));
                self.sink.error(format!(
                    "Could not get vehicle state for {}: {}",
                    vehicle.name, e
                ));
            }
        }
    }

    async fn refresh_last_update(&self, vehicle: &TrackedVehicle) {
        let ticket = vehicle.update_guard.issue();
        let result = vehicle.source.last_update(&vehicle.alias).await;
        if !vehicle.update_guard.admit(ticket, &self.sink, "last update") {
            return;
        }

        match result {
            Ok(Some(epoch_seconds)) => {
                let formatted = format_last_update(epoch_seconds, &self.date_format)
                    .unwrap_or_else(|| self.unknown.clone());
                self.update_card(&vehicle.alias, |card| card.last_update = formatted);
                self.sink.info(format!(
                    "Received updated recent_data timestamp for {}...",
                    vehicle.name
                ));
            }
            Ok(None) => {}
            Err(e) => {
                self.update_card(&vehicle.alias, |card| card.last_update = self.unknown.clone());
                self.sink.error(format!(
                    "Could not get last update for {}: {}",
                    vehicle.name, e
                ));
            }
        }
    }

    fn update_card(&self, alias: &str, f: impl FnOnce(&mut VehicleCard)) {
        self.view.update(|view| {
            if let Some(card) = view.vehicle_mut(alias) {
                f(card);
            }
        });
    }
}
