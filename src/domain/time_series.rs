// Power history domain models
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Default number of points kept by the power history chart.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// One named power measurement stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    House,
    Grid,
    Wallbox,
    Solar,
    Battery,
}

impl Channel {
    /// Chart dataset order.
    pub const ALL: [Channel; 5] = [
        Channel::House,
        Channel::Grid,
        Channel::Wallbox,
        Channel::Solar,
        Channel::Battery,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Channel::House => "house",
            Channel::Grid => "grid",
            Channel::Wallbox => "wallbox",
            Channel::Solar => "solar",
            Channel::Battery => "battery",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Channel::House => "House",
            Channel::Grid => "Grid",
            Channel::Wallbox => "Wallbox",
            Channel::Solar => "PV",
            Channel::Battery => "Powerwall",
        }
    }
}

/// A single history sample: backend timestamp in seconds plus watts per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub timestamp: f64,
    pub values: BTreeMap<Channel, f64>,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, channel: Channel, watts: f64) -> Self {
        self.values.insert(channel, watts);
        self
    }

    pub fn value(&self, channel: Channel) -> Option<f64> {
        self.values.get(&channel).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time_ms: i64,
    pub value_kw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderableSeries {
    pub channel: Channel,
    pub label: &'static str,
    pub points: Vec<ChartPoint>,
}

/// Fixed-capacity, insertion-ordered sequence of history points with FIFO eviction.
///
/// Points are trusted to arrive in ascending timestamp order. Duplicate
/// timestamps are kept as separate points.
#[derive(Debug, Clone)]
pub struct BoundedTimeSeries {
    points: VecDeque<TimeSeriesPoint>,
    capacity: usize,
}

impl BoundedTimeSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.points.back().map(|p| p.timestamp)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSeriesPoint> {
        self.points.iter()
    }

    /// Appends `points` in order, then drops the oldest points until the
    /// length fits the capacity again. Returns the number of evicted points.
    pub fn append<I>(&mut self, points: I) -> usize
    where
        I: IntoIterator<Item = TimeSeriesPoint>,
    {
        self.points.extend(points);
        let mut evicted = 0;
        while self.points.len() > self.capacity {
            self.remove_oldest();
            evicted += 1;
        }
        evicted
    }

    fn remove_oldest(&mut self) -> Option<TimeSeriesPoint> {
        self.points.pop_front()
    }

    /// One series per channel, in chart order. A channel missing from a point
    /// is skipped for that point rather than plotted as zero.
    pub fn to_renderable(&self) -> Vec<RenderableSeries> {
        Channel::ALL
            .iter()
            .map(|&channel| RenderableSeries {
                channel,
                label: channel.label(),
                points: self
                    .points
                    .iter()
                    .filter_map(|p| {
                        p.value(channel).map(|watts| ChartPoint {
                            time_ms: seconds_to_millis(p.timestamp),
                            value_kw: watts / 1000.0,
                        })
                    })
                    .collect(),
            })
            .collect()
    }
}

impl Default for BoundedTimeSeries {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// Chart time axes work in milliseconds, the backend delivers seconds.
pub fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).floor() as i64
}

/// Timestamp of the newest known history point. Never moves backward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RefreshCursor(Option<f64>);

impl RefreshCursor {
    pub fn get(&self) -> Option<f64> {
        self.0
    }

    pub fn advance(&mut self, timestamp: f64) {
        match self.0 {
            Some(current) if current >= timestamp => {}
            _ => self.0 = Some(timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(ts: f64) -> TimeSeriesPoint {
        TimeSeriesPoint::new(ts).with(Channel::Solar, ts * 100.0)
    }

    fn timestamps(series: &BoundedTimeSeries) -> Vec<f64> {
        series.iter().map(|p| p.timestamp).collect()
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut series = BoundedTimeSeries::new(4);
        let mut ts = 0.0;
        for batch in [0usize, 1, 3, 2, 7, 0, 5] {
            let points: Vec<_> = (0..batch)
                .map(|_| {
                    ts += 1.0;
                    point(ts)
                })
                .collect();
            series.append(points);
            assert!(series.len() <= series.capacity());
        }
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn test_append_below_capacity_keeps_everything() {
        let mut series = BoundedTimeSeries::new(10);
        series.append((1..=7).map(|t| point(t as f64)));
        assert_eq!(series.len(), 7);
    }

    #[test]
    fn test_full_buffer_evicts_one_per_point() {
        let mut series = BoundedTimeSeries::new(3);
        series.append([point(1.0), point(2.0), point(3.0)]);
        assert_eq!(timestamps(&series), vec![1.0, 2.0, 3.0]);

        let evicted = series.append([point(4.0)]);
        assert_eq!(evicted, 1);
        assert_eq!(timestamps(&series), vec![2.0, 3.0, 4.0]);

        let evicted = series.append([point(5.0), point(6.0)]);
        assert_eq!(evicted, 2);
        assert_eq!(series.len(), 3);
        assert_eq!(timestamps(&series), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_empty_append_is_noop() {
        let mut series = BoundedTimeSeries::new(3);
        series.append([point(1.0), point(2.0)]);
        let before = timestamps(&series);
        assert_eq!(series.append(Vec::new()), 0);
        assert_eq!(timestamps(&series), before);
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut series = BoundedTimeSeries::new(0);
        series.append([point(1.0), point(2.0)]);
        assert!(series.is_empty());
        assert_eq!(series.last_timestamp(), None);
        assert!(series.to_renderable().iter().all(|s| s.points.is_empty()));
    }

    #[test]
    fn test_duplicate_timestamps_are_kept() {
        let mut series = BoundedTimeSeries::new(5);
        series.append([point(1.0), point(1.0)]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_renderable_skips_missing_channels() {
        let mut series = BoundedTimeSeries::new(5);
        series.append([
            TimeSeriesPoint::new(1.5)
                .with(Channel::Grid, -500.0)
                .with(Channel::House, 1200.0),
            TimeSeriesPoint::new(2.0).with(Channel::House, 800.0),
        ]);

        let rendered = series.to_renderable();
        assert_eq!(rendered.len(), Channel::ALL.len());

        let house = rendered.iter().find(|s| s.channel == Channel::House).unwrap();
        assert_eq!(
            house.points,
            vec![
                ChartPoint { time_ms: 1500, value_kw: 1.2 },
                ChartPoint { time_ms: 2000, value_kw: 0.8 },
            ]
        );

        let grid = rendered.iter().find(|s| s.channel == Channel::Grid).unwrap();
        assert_eq!(grid.points, vec![ChartPoint { time_ms: 1500, value_kw: -0.5 }]);

        let solar = rendered.iter().find(|s| s.channel == Channel::Solar).unwrap();
        assert!(solar.points.is_empty());
    }

    #[test]
    fn test_cursor_never_rolls_backward() {
        let mut cursor = RefreshCursor::default();
        assert_eq!(cursor.get(), None);
        cursor.advance(10.0);
        cursor.advance(5.0);
        assert_eq!(cursor.get(), Some(10.0));
        cursor.advance(12.5);
        assert_eq!(cursor.get(), Some(12.5));
    }
}
