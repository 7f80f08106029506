use super::aggregation::{completion_rate, window, ChartEntry, DailyMetric, OverallStatusSummary};
use crate::backend::model::{CompletionRateEntry, DailyDeliveriesEntry, DeliveryPointsEntry};
use crate::conf::SERIES_WINDOW;
use crate::Result;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum Slot<T> {
    Waiting,
    Ready(T),
    Failed(String),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Waiting
    }
}

impl<T> Slot<T> {
    fn from_result(category: &str, res: Result<T>) -> Self {
        match res {
            Ok(data) => Slot::Ready(data),
            Err(e) => {
                warn!(category, error = e.to_string(), "Dashboard metric is unavailable");
                Slot::Failed(e.to_string())
            }
        }
    }
}

/// Dashboard assembled from the backend's metric endpoints. Each category is
/// filled on its own as its request resolves, in any order.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DashboardFeed {
    pub completion_rate: Slot<Vec<ChartEntry<f64>>>,
    pub delivery_points: Slot<Vec<ChartEntry<usize>>>,
    pub daily_deliveries: Slot<Vec<DailyMetric>>,
    pub overall_status: Slot<OverallStatusSummary>,
}

impl DashboardFeed {
    /// The backend reports percentages, the feed keeps rates in `[0, 1]`.
    pub fn apply_completion_rate(&mut self, res: Result<Vec<CompletionRateEntry>>) {
        let res = res.map(|entries| {
            window(&entries, SERIES_WINDOW)
                .iter()
                .map(|it| ChartEntry {
                    date: it.date.clone(),
                    value: normalize_percentage(it.completion_rate),
                })
                .collect()
        });
        self.completion_rate = Slot::from_result("completion_rate", res);
    }

    pub fn apply_delivery_points(&mut self, res: Result<Vec<DeliveryPointsEntry>>) {
        let res = res.map(|entries| {
            window(&entries, SERIES_WINDOW)
                .iter()
                .map(|it| ChartEntry {
                    date: it.date.clone(),
                    value: it.delivery_points.max(0) as usize,
                })
                .collect()
        });
        self.delivery_points = Slot::from_result("delivery_points", res);
    }

    pub fn apply_daily_deliveries(&mut self, res: Result<Vec<DailyDeliveriesEntry>>) {
        let res = res.map(|entries| entries.iter().map(daily_metric).collect());
        self.daily_deliveries = Slot::from_result("daily_deliveries", res);
    }

    /// Takes the unfiltered daily breakdown and sums it up.
    pub fn apply_overall_status(&mut self, res: Result<Vec<DailyDeliveriesEntry>>) {
        let res = res.map(|entries| {
            entries
                .iter()
                .fold(OverallStatusSummary::default(), |acc, it| OverallStatusSummary {
                    completed: acc.completed + count(it.completed_deliveries),
                    incomplete: acc.incomplete + count(it.incomplete_deliveries),
                    pending: acc.pending + count(it.pending_deliveries),
                })
        });
        self.overall_status = Slot::from_result("overall_status", res);
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self.completion_rate, Slot::Waiting)
            && !matches!(self.delivery_points, Slot::Waiting)
            && !matches!(self.daily_deliveries, Slot::Waiting)
            && !matches!(self.overall_status, Slot::Waiting)
    }
}

fn normalize_percentage(percentage: f64) -> f64 {
    if !percentage.is_finite() {
        return 0.0;
    }
    (percentage / 100.0).clamp(0.0, 1.0)
}

fn count(value: i64) -> usize {
    value.max(0) as usize
}

fn daily_metric(entry: &DailyDeliveriesEntry) -> DailyMetric {
    let completed = count(entry.completed_deliveries);
    let incomplete = count(entry.incomplete_deliveries);
    let pending = count(entry.pending_deliveries);
    DailyMetric {
        date: entry.date.clone(),
        completion_rate: completion_rate(completed, completed + incomplete + pending),
        // Not part of this endpoint's payload
        delivery_point_count: 0,
        completed,
        incomplete,
        pending,
    }
}
