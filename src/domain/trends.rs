// Trend aggregators - pure transforms from fetched series to chart-ready data
use super::dashboard::{HourlyTrendPoint, StatusTrendPoint};
use super::machine::{Machine, MachineStatus};

/// How status trends are bucketed along the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendView {
    Monthly,
    Weekly,
}

/// One named series of a chart.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TrendDataset {
    pub name: String,
    pub values: Vec<f64>,
}

/// Chart-ready aggregation output. Empty input produces empty labels and
/// empty datasets, which consumers must read as "no data for period".
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TrendChart {
    pub labels: Vec<String>,
    pub datasets: Vec<TrendDataset>,
}

impl TrendChart {
    pub fn empty() -> Self {
        Self {
            labels: Vec::new(),
            datasets: Vec::new(),
        }
    }
}

fn day_label(point: &StatusTrendPoint) -> String {
    point.date.format("%b %d").to_string()
}

/// Bucket key for the weekly view, derived from the day's own label.
/// "Jan 09" maps to "Jan W2". This merges days by month-relative seven-day
/// blocks, an approximation rather than true ISO week grouping.
fn week_label(point: &StatusTrendPoint) -> String {
    use chrono::Datelike;
    let week = (point.date.day() - 1) / 7 + 1;
    format!("{} W{}", point.date.format("%b"), week)
}

/// Aggregate daily status counts into labeled buckets. Input is expected
/// sorted ascending by date; monthly view is 1:1, weekly view sums counts
/// across consecutive days sharing a bucket key.
pub fn status_trend_chart(points: &[StatusTrendPoint], view: TrendView) -> TrendChart {
    if points.is_empty() {
        return TrendChart::empty();
    }

    let mut labels: Vec<String> = Vec::new();
    let mut buckets: Vec<[u64; 4]> = Vec::new();

    for point in points {
        let label = match view {
            TrendView::Monthly => day_label(point),
            TrendView::Weekly => week_label(point),
        };
        if labels.last() != Some(&label) {
            labels.push(label);
            buckets.push([0; 4]);
        }
        if let Some(bucket) = buckets.last_mut() {
            for (slot, status) in bucket.iter_mut().zip(MachineStatus::ALL) {
                *slot += point.status_counts.get(status);
            }
        }
    }

    let datasets = MachineStatus::ALL
        .iter()
        .enumerate()
        .map(|(i, status)| TrendDataset {
            name: status.as_str().to_string(),
            values: buckets.iter().map(|b| b[i] as f64).collect(),
        })
        .collect();

    TrendChart { labels, datasets }
}

/// Derive one series per distinct customer from the shared (unpartitioned)
/// status trend series. The upstream data carries no customer dimension, so
/// each date's total is split evenly across the N known customers and
/// weighted by the customer's ordinal index. Illustrative, not ground truth.
pub fn customer_trend_chart(machines: &[Machine], points: &[StatusTrendPoint]) -> TrendChart {
    if machines.is_empty() || points.is_empty() {
        return TrendChart::empty();
    }

    let mut customers: Vec<&str> = Vec::new();
    for machine in machines {
        if !customers.contains(&machine.customer.as_str()) {
            customers.push(&machine.customer);
        }
    }

    let labels: Vec<String> = points.iter().map(day_label).collect();
    let n = customers.len() as f64;

    let datasets = customers
        .iter()
        .enumerate()
        .map(|(index, customer)| TrendDataset {
            name: (*customer).to_string(),
            values: points
                .iter()
                .map(|p| p.status_counts.total() as f64 / n * (index as f64 + 1.0) / n)
                .collect(),
        })
        .collect();

    TrendChart { labels, datasets }
}

/// Order hourly reading volumes by hour of day with zero-padded labels.
/// The only aggregator that is a faithful pass-through of its input.
pub fn hourly_trend_chart(points: &[HourlyTrendPoint]) -> TrendChart {
    if points.is_empty() {
        return TrendChart::empty();
    }

    let mut sorted: Vec<HourlyTrendPoint> = points.to_vec();
    sorted.sort_by_key(|p| p.hour);

    TrendChart {
        labels: sorted.iter().map(|p| format!("{:02}:00", p.hour)).collect(),
        datasets: vec![TrendDataset {
            name: "Readings".to_string(),
            values: sorted.iter().map(|p| p.count as f64).collect(),
        }],
    }
}
