// REST gateway to the factory monitoring backend
use crate::application::dashboard_gateway::{DashboardGateway, TransportError};
use crate::domain::dashboard::{DateRange, HourlyTrendPoint, KpiStats, StatusTrendPoint};
use crate::domain::machine::{FilterCriteria, Machine};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RestGateway {
    base_url: String,
    client: reqwest::Client,
}

impl RestGateway {
    /// One shared client with a fixed per-request timeout; a timed-out call
    /// fails like any other transport error.
    pub fn new(base_url: String, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn range_query(range: &DateRange) -> String {
        format!(
            "start_date={}&end_date={}",
            range.start_param(),
            range.end_param()
        )
    }

    fn search_query(criteria: &FilterCriteria, range: &DateRange) -> String {
        let mut query = Self::range_query(range);
        let fields = [
            ("customer", &criteria.customer),
            ("area", &criteria.area),
            ("subarea", &criteria.subarea),
            ("machine_name", &criteria.machine_name),
            ("status", &criteria.status),
        ];
        for (name, value) in fields {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                query.push_str(&format!("&{}={}", name, urlencoding::encode(value)));
            }
        }
        query
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: String,
    ) -> Result<T, TransportError> {
        let url = format!("{}{}?{}", self.base_url, endpoint, query);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| TransportError::Request { endpoint, source })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                endpoint,
                status,
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| TransportError::Decode { endpoint, source })
    }
}

#[async_trait]
impl DashboardGateway for RestGateway {
    async fn list_machines(&self, range: &DateRange) -> Result<Vec<Machine>, TransportError> {
        self.get_json("/api/machines", Self::range_query(range)).await
    }

    async fn search_machines(
        &self,
        criteria: &FilterCriteria,
        range: &DateRange,
    ) -> Result<Vec<Machine>, TransportError> {
        self.get_json("/api/machines/search", Self::search_query(criteria, range))
            .await
    }

    async fn get_kpis(&self, range: &DateRange) -> Result<KpiStats, TransportError> {
        self.get_json("/api/dashboard/kpis", Self::range_query(range))
            .await
    }

    async fn get_status_trends(
        &self,
        range: &DateRange,
    ) -> Result<Vec<StatusTrendPoint>, TransportError> {
        self.get_json("/api/dashboard/trends/status", Self::range_query(range))
            .await
    }

    async fn get_hourly_trends(
        &self,
        range: &DateRange,
    ) -> Result<Vec<HourlyTrendPoint>, TransportError> {
        self.get_json("/api/dashboard/trends/hourly", Self::range_query(range))
            .await
    }
}
