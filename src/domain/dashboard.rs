// Dashboard domain model: date ranges, KPI stats, trend points, snapshot
use super::machine::{FilterCriteria, Machine, MachineStatus};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// A month-aligned calendar window derived from a single selected date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The first through last calendar day of `date`'s month.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
        let next_month = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
        };
        let end = next_month
            .and_then(|d| d.checked_sub_days(Days::new(1)))
            .unwrap_or(date);
        Self { start, end }
    }

    /// Wire format for the backend's `start_date` query parameter.
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// Wire format for the backend's `end_date` query parameter.
    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Per-status reading counts, keyed by the backend's capitalized names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(rename = "Normal", default)]
    pub normal: u64,
    #[serde(rename = "Satisfactory", default)]
    pub satisfactory: u64,
    #[serde(rename = "Alert", default)]
    pub alert: u64,
    #[serde(rename = "Unacceptable", default)]
    pub unacceptable: u64,
}

impl StatusCounts {
    pub fn get(&self, status: MachineStatus) -> u64 {
        match status {
            MachineStatus::Normal => self.normal,
            MachineStatus::Satisfactory => self.satisfactory,
            MachineStatus::Alert => self.alert,
            MachineStatus::Unacceptable => self.unacceptable,
        }
    }

    pub fn total(&self) -> u64 {
        self.normal + self.satisfactory + self.alert + self.unacceptable
    }
}

/// Headline KPI figures for the selected range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiStats {
    pub total_readings: u64,
    pub status_counts: StatusCounts,
}

/// One calendar day's status breakdown within the selected range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTrendPoint {
    pub date: NaiveDate,
    pub status_counts: StatusCounts,
}

/// Reading volume for one hour of day, hour in 0..=23.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyTrendPoint {
    pub hour: u32,
    pub count: u64,
}

/// The engine's single source of truth. Constructed once at startup and
/// only ever written through the engine's discrete transitions.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub machines: Vec<Machine>,
    pub filtered_machines: Vec<Machine>,
    pub kpis: KpiStats,
    pub status_trends: Vec<StatusTrendPoint>,
    pub hourly_trends: Vec<HourlyTrendPoint>,
    pub loading: bool,
    pub error: Option<String>,
    pub filters: FilterCriteria,
    pub selected_date: NaiveDate,
}

impl DashboardSnapshot {
    pub fn new(selected_date: NaiveDate) -> Self {
        Self {
            machines: Vec::new(),
            filtered_machines: Vec::new(),
            kpis: KpiStats::default(),
            status_trends: Vec::new(),
            hourly_trends: Vec::new(),
            loading: false,
            error: None,
            filters: FilterCriteria::default(),
            selected_date,
        }
    }
}
