use crate::conf::SERIES_WINDOW;
use crate::delivery::{DeliveryRecord, Status};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub date: String,
    pub completion_rate: f64,
    pub delivery_point_count: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub pending: usize,
}

impl DailyMetric {
    fn new(date: &str) -> Self {
        DailyMetric {
            date: date.into(),
            completion_rate: 0.0,
            delivery_point_count: 0,
            completed: 0,
            incomplete: 0,
            pending: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.completed + self.incomplete + self.pending
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallStatusSummary {
    pub completed: usize,
    pub incomplete: usize,
    pub pending: usize,
}

impl OverallStatusSummary {
    pub fn total(&self) -> usize {
        self.completed + self.incomplete + self.pending
    }

    fn count(&mut self, status: Status) {
        match status {
            Status::Complete => self.completed += 1,
            Status::Incomplete => self.incomplete += 1,
            Status::Pending | Status::InProgress => self.pending += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry<T> {
    pub date: String,
    pub value: T,
}

/// Everything the dashboard shows, derived from one snapshot or filtered view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub completion_rate: Vec<ChartEntry<f64>>,
    pub delivery_points: Vec<ChartEntry<usize>>,
    pub daily_deliveries: Vec<DailyMetric>,
    pub overall_status: OverallStatusSummary,
}

/// `completed / total`, zero when there is nothing to complete.
pub fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64).clamp(0.0, 1.0)
}

/// One metric per distinct date, in the order dates first appear. Pending and
/// in progress records both count as pending. Stop counts include both
/// origin stops of every route.
pub fn daily_metrics<'a>(records: impl IntoIterator<Item = &'a DeliveryRecord>) -> Vec<DailyMetric> {
    let mut res: Vec<DailyMetric> = vec![];
    for record in records {
        let index = match res.iter().position(|it| it.date == record.date) {
            Some(index) => index,
            None => {
                res.push(DailyMetric::new(&record.date));
                res.len() - 1
            }
        };
        let metric = &mut res[index];
        match record.status {
            Status::Complete => metric.completed += 1,
            Status::Incomplete => metric.incomplete += 1,
            Status::Pending | Status::InProgress => metric.pending += 1,
        }
        metric.delivery_point_count += record.route_sequence.len();
    }
    for metric in &mut res {
        metric.completion_rate = completion_rate(metric.completed, metric.total());
    }
    res
}

pub fn overall_status<'a>(
    records: impl IntoIterator<Item = &'a DeliveryRecord>,
) -> OverallStatusSummary {
    let mut res = OverallStatusSummary::default();
    for record in records {
        res.count(record.status);
    }
    res
}

/// The `n` most recent entries, assuming chronological order.
pub fn window<T>(series: &[T], n: usize) -> &[T] {
    &series[series.len().saturating_sub(n)..]
}

pub fn completion_rate_series(metrics: &[DailyMetric]) -> Vec<ChartEntry<f64>> {
    window(metrics, SERIES_WINDOW)
        .iter()
        .map(|it| ChartEntry {
            date: it.date.clone(),
            value: it.completion_rate,
        })
        .collect()
}

pub fn delivery_points_series(metrics: &[DailyMetric]) -> Vec<ChartEntry<usize>> {
    window(metrics, SERIES_WINDOW)
        .iter()
        .map(|it| ChartEntry {
            date: it.date.clone(),
            value: it.delivery_point_count,
        })
        .collect()
}

/// `date` narrows the daily breakdown to a single day (backend date form),
/// the other categories always cover the full input.
pub fn dashboard<'a>(
    records: impl IntoIterator<Item = &'a DeliveryRecord>,
    date: Option<&str>,
) -> Dashboard {
    let records: Vec<&DeliveryRecord> = records.into_iter().collect();
    let metrics = daily_metrics(records.iter().copied());
    let daily_deliveries = match date {
        Some(date) => metrics.iter().filter(|it| it.date == date).cloned().collect(),
        None => window(&metrics, SERIES_WINDOW).to_vec(),
    };
    Dashboard {
        completion_rate: completion_rate_series(&metrics),
        delivery_points: delivery_points_series(&metrics),
        daily_deliveries,
        overall_status: overall_status(records),
    }
}
