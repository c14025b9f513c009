// History service - Incremental refresh of the power history chart
use crate::application::log_sink::LogSink;
use crate::application::manager_api::ManagerApi;
use crate::application::request_guard::LatestRequestGuard;
use crate::application::view_store::ViewStore;
use crate::domain::time_series::{BoundedTimeSeries, RefreshCursor, RenderableSeries};
use std::sync::{Arc, Mutex, MutexGuard};

/// What a single refresh cycle did to the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Merged { appended: usize, evicted: usize },
    NoNewData,
    Stale,
    Failed,
}

#[derive(Debug)]
struct HistoryChart {
    series: BoundedTimeSeries,
    cursor: RefreshCursor,
}

pub struct HistoryService {
    api: Arc<dyn ManagerApi>,
    view: Arc<ViewStore>,
    sink: LogSink,
    chart: Mutex<HistoryChart>,
    guard: LatestRequestGuard,
}

impl HistoryService {
    pub fn new(
        api: Arc<dyn ManagerApi>,
        view: Arc<ViewStore>,
        sink: LogSink,
        capacity: usize,
    ) -> Self {
        Self {
            api,
            view,
            sink,
            chart: Mutex::new(HistoryChart {
                series: BoundedTimeSeries::new(capacity),
                cursor: RefreshCursor::default(),
            }),
            guard: LatestRequestGuard::new(),
        }
    }

    /// Cursor for the next request: none while the chart is empty, so the
    /// backend sends its full history.
    pub fn next_cursor(&self) -> Option<f64> {
        let chart = self.chart();
        if chart.series.is_empty() {
            None
        } else {
            chart.cursor.get()
        }
    }

    pub fn len(&self) -> usize {
        self.chart().series.len()
    }

    pub fn cursor(&self) -> Option<f64> {
        self.chart().cursor.get()
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.chart().series.iter().map(|p| p.timestamp).collect()
    }

    pub fn renderable(&self) -> Vec<RenderableSeries> {
        self.chart().series.to_renderable()
    }

    /// Fetches what is newer than the cursor and merges it into the chart.
    /// A failed fetch leaves chart and cursor untouched.
    pub async fn refresh(&self) -> RefreshOutcome {
        let cursor = self.next_cursor();
        let ticket = self.guard.issue();

        let points = match self.api.meter_history(cursor).await {
            Ok(points) => points,
            Err(e) => {
                self.sink.error(format!("Could not update power history: {}", e));
                return RefreshOutcome::Failed;
            }
        };

        let rendered = {
            let mut chart = self.chart();
            if !self.guard.admit(ticket, &self.sink, "history") {
                return RefreshOutcome::Stale;
            }
            let Some(last) = points.last().map(|p| p.timestamp) else {
                return RefreshOutcome::NoNewData;
            };

            let appended = points.len();
            let evicted = chart.series.append(points);
            chart.cursor.advance(last);
            (chart.series.to_renderable(), appended, evicted)
        };

        let (series, appended, evicted) = rendered;
        self.view.update(|view| view.chart = series);
        self.sink.info("Received history update from manager");
        RefreshOutcome::Merged { appended, evicted }
    }

    fn chart(&self) -> MutexGuard<'_, HistoryChart> {
        self.chart
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
