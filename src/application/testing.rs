// In-memory test doubles for the services
use crate::application::log_sink::{LogEvent, LogLevel, LogListener, LogSink};
use crate::application::manager_api::ManagerApi;
use crate::domain::power::MeterReading;
use crate::domain::time_series::TimeSeriesPoint;
use crate::domain::vehicle::VehicleState;
use crate::domain::wallbox::{ChargeMode, ChargingSession};
use crate::error::{DashboardError, DashboardResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<LogEvent>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.events().iter().filter(|e| e.level == level).count()
    }
}

impl LogListener for RecordingListener {
    fn on_event(&self, event: &LogEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn recording_sink() -> (LogSink, Arc<RecordingListener>) {
    let recorder = Arc::new(RecordingListener::default());
    let sink = LogSink::new(vec![recorder.clone() as Arc<dyn LogListener>]);
    (sink, recorder)
}

/// One scripted reply: `Err(status)` becomes a status error. A gate holds the
/// reply back until it is notified.
#[derive(Clone)]
pub struct Step<T> {
    pub result: Result<T, u16>,
    pub gate: Option<Arc<Notify>>,
}

impl<T> Step<T> {
    pub fn ok(value: T) -> Self {
        Self {
            result: Ok(value),
            gate: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            result: Err(status),
            gate: None,
        }
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

/// Replies in order; the last reply repeats forever. No replies means 404.
pub struct Scripted<T> {
    steps: Mutex<VecDeque<Step<T>>>,
    calls: AtomicUsize,
}

impl<T: Clone> Scripted<T> {
    pub fn new(steps: Vec<Step<T>>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn push(&self, step: Step<T>) {
        self.steps.lock().unwrap().push_back(step);
    }

    async fn call(&self, endpoint: &str) -> DashboardResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut steps = self.steps.lock().unwrap();
            if steps.len() > 1 {
                steps.pop_front()
            } else {
                steps.front().cloned()
            }
        };
        let Some(step) = step else {
            return Err(DashboardError::Status {
                endpoint: endpoint.to_string(),
                status: 404,
            });
        };
        if let Some(gate) = step.gate {
            gate.notified().await;
        }
        step.result.map_err(|status| DashboardError::Status {
            endpoint: endpoint.to_string(),
            status,
        })
    }
}

impl<T: Clone> Default for Scripted<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[derive(Default)]
pub struct FakeManagerApi {
    pub soe: Scripted<f64>,
    pub meters: Scripted<MeterReading>,
    pub history: Scripted<Vec<TimeSeriesPoint>>,
    pub history_cursors: Mutex<Vec<Option<f64>>>,
    pub mode: Scripted<ChargeMode>,
    pub set_modes: Mutex<Vec<ChargeMode>>,
    pub power_limits: Mutex<Vec<f64>>,
    pub session: Scripted<ChargingSession>,
    pub wallbox_power: Scripted<f64>,
    pub bmw_state: Scripted<VehicleState>,
    pub bmw_state_requests: Mutex<Vec<(String, bool)>>,
    pub bmw_last_update: Scripted<f64>,
    pub restart: Scripted<String>,
}

impl FakeManagerApi {
    pub fn history_cursors(&self) -> Vec<Option<f64>> {
        self.history_cursors.lock().unwrap().clone()
    }
}

#[async_trait]
impl ManagerApi for FakeManagerApi {
    async fn powerwall_soe(&self) -> DashboardResult<f64> {
        self.soe.call("/manager/powerwall/soe").await
    }

    async fn meters(&self) -> DashboardResult<MeterReading> {
        self.meters.call("/manager/meters").await
    }

    async fn meter_history(&self, cursor: Option<f64>) -> DashboardResult<Vec<TimeSeriesPoint>> {
        self.history_cursors.lock().unwrap().push(cursor);
        self.history.call("/manager/meters/history").await
    }

    async fn mode(&self) -> DashboardResult<ChargeMode> {
        self.mode.call("/manager/mode").await
    }

    async fn set_mode(&self, mode: ChargeMode) -> DashboardResult<()> {
        self.set_modes.lock().unwrap().push(mode);
        Ok(())
    }

    async fn set_power_limit(&self, watts: f64) -> DashboardResult<()> {
        self.power_limits.lock().unwrap().push(watts);
        Ok(())
    }

    async fn session(&self) -> DashboardResult<ChargingSession> {
        self.session.call("/manager/session").await
    }

    async fn wallbox_power(&self) -> DashboardResult<f64> {
        self.wallbox_power.call("/keba/power").await
    }

    async fn bmw_state(&self, alias: &str, allow_cache: bool) -> DashboardResult<VehicleState> {
        self.bmw_state_requests
            .lock()
            .unwrap()
            .push((alias.to_string(), allow_cache));
        self.bmw_state.call("/bmw/state").await
    }

    async fn bmw_last_update(&self, _alias: &str) -> DashboardResult<f64> {
        self.bmw_last_update.call("/bmw/last_update").await
    }

    async fn restart_device(&self) -> DashboardResult<String> {
        self.restart.call("/dev/restart").await
    }
}
