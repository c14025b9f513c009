// Poller - Fixed-period timers driving each dashboard unit
use crate::application::history_service::HistoryService;
use crate::application::power_service::PowerService;
use crate::application::vehicle_service::VehicleService;
use crate::application::wallbox_service::WallboxService;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Refresh period of every unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub power: Duration,
    pub mode: Duration,
    pub wallbox: Duration,
    pub vehicles: Duration,
    pub history: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            power: Duration::from_millis(2000),
            mode: Duration::from_millis(2000),
            wallbox: Duration::from_millis(3000),
            vehicles: Duration::from_millis(5000),
            history: Duration::from_millis(5000),
        }
    }
}

/// Runs `job` right away and then once per `period`, each run on its own task.
/// A slow run never holds back the next tick, so runs of the same job may
/// overlap. `period` must be non-zero.
pub fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!("Polling {} every {:?}", name, period);

        loop {
            interval.tick().await;
            tracing::debug!("Tick: {}", name);
            tokio::spawn(job());
        }
    })
}

/// Handles of the running timers. Dropping it leaves them running.
pub struct Pollers {
    handles: Vec<JoinHandle<()>>,
}

impl Pollers {
    pub fn start(
        schedule: PollSchedule,
        power: Arc<PowerService>,
        wallbox: Arc<WallboxService>,
        vehicles: Arc<VehicleService>,
        history: Arc<HistoryService>,
    ) -> Self {
        let mut handles = Vec::with_capacity(5);

        handles.push(spawn_periodic("power", schedule.power, {
            let power = power.clone();
            move || {
                let power = power.clone();
                async move { power.refresh().await }
            }
        }));

        handles.push(spawn_periodic("mode", schedule.mode, {
            let wallbox = wallbox.clone();
            move || {
                let wallbox = wallbox.clone();
                async move { wallbox.refresh_mode().await }
            }
        }));

        handles.push(spawn_periodic("wallbox", schedule.wallbox, move || {
            let wallbox = wallbox.clone();
            async move { wallbox.refresh().await }
        }));

        handles.push(spawn_periodic("vehicles", schedule.vehicles, move || {
            let vehicles = vehicles.clone();
            async move { vehicles.refresh_all().await }
        }));

        handles.push(spawn_periodic("history", schedule.history, move || {
            let history = history.clone();
            async move {
                history.refresh().await;
            }
        }));

        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}
