// Gateway trait for the monitoring backend's read operations
use crate::domain::dashboard::{DateRange, HourlyTrendPoint, KpiStats, StatusTrendPoint};
use crate::domain::machine::{FilterCriteria, Machine};
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single backend round-trip. One attempt per call, no retries;
/// a request timeout surfaces here like any other transport failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

#[async_trait]
pub trait DashboardGateway: Send + Sync {
    /// List machines with data in the given range.
    async fn list_machines(&self, range: &DateRange) -> Result<Vec<Machine>, TransportError>;

    /// Server-side machine search; the server's matching rules are
    /// authoritative and need not mirror the client fallback exactly.
    async fn search_machines(
        &self,
        criteria: &FilterCriteria,
        range: &DateRange,
    ) -> Result<Vec<Machine>, TransportError>;

    /// KPI statistics for the range.
    async fn get_kpis(&self, range: &DateRange) -> Result<KpiStats, TransportError>;

    /// Daily status breakdowns for the range, sorted ascending by date.
    async fn get_status_trends(
        &self,
        range: &DateRange,
    ) -> Result<Vec<StatusTrendPoint>, TransportError>;

    /// Reading volume per hour of day across the range.
    async fn get_hourly_trends(
        &self,
        range: &DateRange,
    ) -> Result<Vec<HourlyTrendPoint>, TransportError>;
}
