// Dashboard engine - owns the snapshot and drives load/search transitions
use crate::application::dashboard_gateway::DashboardGateway;
use crate::domain::dashboard::{DashboardSnapshot, DateRange};
use crate::domain::machine::{FilterCriteria, FilterUpdate};
use crate::domain::trends::{self, TrendChart, TrendView};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Quiet period before a filter edit becomes a search call.
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Single source of truth for the dashboard. All state transitions go
/// through this engine; consumers only ever read snapshot clones.
///
/// Overlapping async work is resolved with generation counters rather than
/// cancellation: every load and every filter edit takes a fresh sequence
/// number, and a completion whose number is no longer the latest issued is
/// discarded without touching the snapshot.
pub struct DashboardEngine {
    gateway: Arc<dyn DashboardGateway>,
    snapshot: Arc<RwLock<DashboardSnapshot>>,
    load_seq: AtomicU64,
    search_seq: AtomicU64,
}

impl DashboardEngine {
    pub fn new(
        gateway: Arc<dyn DashboardGateway>,
        snapshot: Arc<RwLock<DashboardSnapshot>>,
    ) -> Self {
        Self {
            gateway,
            snapshot,
            load_seq: AtomicU64::new(0),
            search_seq: AtomicU64::new(0),
        }
    }

    /// Clone of the current snapshot.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Date changes are wired straight to a full reload of the month range.
    pub async fn set_selected_date(&self, date: NaiveDate) {
        self.load_dashboard_data(date).await;
    }

    /// Full date-range load: the four backend reads run in parallel and the
    /// snapshot is replaced atomically once all of them succeed. The first
    /// failure observed short-circuits the group and is reported; the
    /// previous data stays on screen, stale but valid.
    ///
    /// A successful load also resets the filter criteria: filters scope to
    /// a date-range session, so `filtered_machines` and `filters` never
    /// disagree after a reload.
    pub async fn load_dashboard_data(&self, date: NaiveDate) {
        let seq = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let range = DateRange::month_of(date);

        {
            let mut snap = self.snapshot.write().await;
            snap.selected_date = date;
            snap.loading = true;
            snap.error = None;
        }

        tracing::debug!(
            "load cycle {}: fetching dashboard data for {}..{}",
            seq,
            range.start_param(),
            range.end_param()
        );

        let result = tokio::try_join!(
            self.gateway.list_machines(&range),
            self.gateway.get_kpis(&range),
            self.gateway.get_status_trends(&range),
            self.gateway.get_hourly_trends(&range),
        );

        let mut snap = self.snapshot.write().await;
        if self.load_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!("load cycle {} superseded, discarding result", seq);
            return;
        }

        match result {
            Ok((machines, kpis, status_trends, hourly_trends)) => {
                snap.filters = FilterCriteria::default();
                snap.filtered_machines = machines.clone();
                snap.machines = machines;
                snap.kpis = kpis;
                snap.status_trends = status_trends;
                snap.hourly_trends = hourly_trends;
                snap.loading = false;
                snap.error = None;
            }
            Err(e) => {
                tracing::error!("load cycle {} failed: {}", seq, e);
                snap.loading = false;
                snap.error = Some(format!("Failed to load dashboard data: {e}"));
            }
        }
    }

    /// Merge a filter edit and schedule the debounced search. Edits landing
    /// within the quiet period reset it; only the last edit's generation
    /// survives to issue a search, using the criteria as merged so far.
    ///
    /// The server-side search is authoritative; if it fails, the local
    /// filter over the last full fetch takes over and the failure never
    /// surfaces as an error.
    pub async fn search_machines(&self, update: FilterUpdate) {
        let (criteria, selected_date) = {
            let mut snap = self.snapshot.write().await;
            snap.filters.merge(update);
            (snap.filters.clone(), snap.selected_date)
        };

        let seq = self.search_seq.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(SEARCH_DEBOUNCE).await;
        if self.search_seq.load(Ordering::SeqCst) != seq {
            return;
        }

        if criteria.is_empty() {
            let mut snap = self.snapshot.write().await;
            let machines = snap.machines.clone();
            snap.filtered_machines = machines;
            return;
        }

        {
            let mut snap = self.snapshot.write().await;
            snap.loading = true;
        }

        let range = DateRange::month_of(selected_date);
        let result = self.gateway.search_machines(&criteria, &range).await;

        let mut snap = self.snapshot.write().await;
        match result {
            Ok(machines) => {
                snap.filtered_machines = machines;
            }
            Err(e) => {
                tracing::warn!("server-side search failed, falling back to local filter: {}", e);
                let fallback = criteria.apply(&snap.machines);
                snap.filtered_machines = fallback;
            }
        }
        snap.loading = false;
    }

    /// Reset the criteria and restore the unfiltered machine set. Purely
    /// local; also drops any search still waiting out its quiet period.
    pub async fn clear_filters(&self) {
        self.search_seq.fetch_add(1, Ordering::SeqCst);

        let mut snap = self.snapshot.write().await;
        snap.filters = FilterCriteria::default();
        let machines = snap.machines.clone();
        snap.filtered_machines = machines;
    }

    pub async fn status_trend_chart(&self, view: TrendView) -> TrendChart {
        let snap = self.snapshot.read().await;
        trends::status_trend_chart(&snap.status_trends, view)
    }

    pub async fn customer_trend_chart(&self) -> TrendChart {
        let snap = self.snapshot.read().await;
        trends::customer_trend_chart(&snap.machines, &snap.status_trends)
    }

    pub async fn hourly_trend_chart(&self) -> TrendChart {
        let snap = self.snapshot.read().await;
        trends::hourly_trend_chart(&snap.hourly_trends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_gateway::TransportError;
    use crate::domain::dashboard::{HourlyTrendPoint, KpiStats, StatusCounts, StatusTrendPoint};
    use crate::domain::machine::{Machine, MachineStatus};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    fn machine(id: &str, name: &str, customer: &str) -> Machine {
        Machine {
            id: id.to_string(),
            machine_name: name.to_string(),
            customer: customer.to_string(),
            area: "Line 1".to_string(),
            subarea: "Press".to_string(),
            machine_type: None,
            status: MachineStatus::Normal,
            ingested_date: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn transport_error() -> TransportError {
        TransportError::Status {
            endpoint: "/api/machines",
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "backend down".to_string(),
        }
    }

    /// Canned gateway. Machines are keyed by the range's start date so a
    /// test can tell one load cycle's result from another; per-range delays
    /// simulate slow responses under paused tokio time.
    #[derive(Default)]
    struct MockGateway {
        machines_by_start: Mutex<HashMap<String, Vec<Machine>>>,
        delays_ms: Mutex<HashMap<String, u64>>,
        search_result: Mutex<Vec<Machine>>,
        search_calls: Mutex<Vec<FilterCriteria>>,
        fail_list: AtomicBool,
        fail_search: AtomicBool,
    }

    impl MockGateway {
        fn with_machines(start: &str, machines: Vec<Machine>) -> Self {
            let mock = Self::default();
            mock.machines_by_start
                .lock()
                .unwrap()
                .insert(start.to_string(), machines);
            mock
        }

        async fn delay_for(&self, start: &str) {
            let ms = self.delays_ms.lock().unwrap().get(start).copied();
            if let Some(ms) = ms {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
        }
    }

    #[async_trait]
    impl DashboardGateway for MockGateway {
        async fn list_machines(&self, range: &DateRange) -> Result<Vec<Machine>, TransportError> {
            self.delay_for(&range.start_param()).await;
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(transport_error());
            }
            Ok(self
                .machines_by_start
                .lock()
                .unwrap()
                .get(&range.start_param())
                .cloned()
                .unwrap_or_default())
        }

        async fn search_machines(
            &self,
            criteria: &FilterCriteria,
            _range: &DateRange,
        ) -> Result<Vec<Machine>, TransportError> {
            self.search_calls.lock().unwrap().push(criteria.clone());
            if self.fail_search.load(Ordering::SeqCst) {
                return Err(transport_error());
            }
            Ok(self.search_result.lock().unwrap().clone())
        }

        async fn get_kpis(&self, _range: &DateRange) -> Result<KpiStats, TransportError> {
            Ok(KpiStats {
                total_readings: 42,
                status_counts: StatusCounts {
                    normal: 40,
                    alert: 2,
                    ..Default::default()
                },
            })
        }

        async fn get_status_trends(
            &self,
            range: &DateRange,
        ) -> Result<Vec<StatusTrendPoint>, TransportError> {
            Ok(vec![StatusTrendPoint {
                date: range.start,
                status_counts: StatusCounts {
                    normal: 2,
                    alert: 1,
                    ..Default::default()
                },
            }])
        }

        async fn get_hourly_trends(
            &self,
            _range: &DateRange,
        ) -> Result<Vec<HourlyTrendPoint>, TransportError> {
            Ok(vec![HourlyTrendPoint { hour: 8, count: 7 }])
        }
    }

    fn engine_with(gateway: MockGateway, selected: NaiveDate) -> (DashboardEngine, Arc<MockGateway>) {
        let gateway = Arc::new(gateway);
        let snapshot = Arc::new(RwLock::new(DashboardSnapshot::new(selected)));
        (
            DashboardEngine::new(gateway.clone(), snapshot),
            gateway,
        )
    }

    fn january_machines() -> Vec<Machine> {
        vec![
            machine("m1", "PUMP-01", "Acme"),
            machine("m2", "FAN-02", "Zeta"),
            machine("m3", "PUMP-03", "Acme"),
        ]
    }

    #[tokio::test]
    async fn test_load_replaces_snapshot_and_resets_filters() {
        let (engine, _) = engine_with(
            MockGateway::with_machines("2025-01-01", january_machines()),
            date(2025, 1, 15),
        );

        engine
            .search_machines(FilterUpdate {
                customer: Some("Acme".to_string()),
                ..Default::default()
            })
            .await;
        engine.load_dashboard_data(date(2025, 1, 15)).await;

        let snap = engine.snapshot().await;
        assert_eq!(snap.machines.len(), 3);
        assert_eq!(snap.filtered_machines, snap.machines);
        assert!(snap.filters.is_empty());
        assert_eq!(snap.kpis.total_readings, 42);
        assert_eq!(snap.status_trends.len(), 1);
        assert_eq!(snap.hourly_trends.len(), 1);
        assert!(!snap.loading);
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_data_and_reports_error() {
        let (engine, gateway) = engine_with(
            MockGateway::with_machines("2025-01-01", january_machines()),
            date(2025, 1, 15),
        );
        engine.load_dashboard_data(date(2025, 1, 15)).await;

        gateway.fail_list.store(true, Ordering::SeqCst);
        engine.load_dashboard_data(date(2025, 2, 10)).await;

        let snap = engine.snapshot().await;
        assert_eq!(snap.machines.len(), 3);
        assert_eq!(snap.status_trends.len(), 1);
        assert!(snap.error.as_deref().unwrap().contains("Failed to load"));
        assert!(!snap.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_load_completion_is_discarded() {
        let gateway = MockGateway::with_machines("2025-01-01", january_machines());
        gateway
            .machines_by_start
            .lock()
            .unwrap()
            .insert("2025-02-01".to_string(), vec![machine("f1", "MILL-01", "Acme")]);
        gateway
            .delays_ms
            .lock()
            .unwrap()
            .insert("2025-01-01".to_string(), 500);
        let (engine, _) = engine_with(gateway, date(2025, 1, 15));

        tokio::join!(engine.load_dashboard_data(date(2025, 1, 15)), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            engine.load_dashboard_data(date(2025, 2, 10)).await;
        });

        // The slow January load finished last but must not win.
        let snap = engine.snapshot().await;
        assert_eq!(snap.machines.len(), 1);
        assert_eq!(snap.machines[0].machine_name, "MILL-01");
        assert_eq!(snap.selected_date, date(2025, 2, 10));
        assert!(!snap.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_rapid_edits_into_one_search() {
        let (engine, gateway) = engine_with(
            MockGateway::with_machines("2025-01-01", january_machines()),
            date(2025, 1, 15),
        );
        engine.load_dashboard_data(date(2025, 1, 15)).await;

        tokio::join!(
            engine.search_machines(FilterUpdate {
                customer: Some("Acme".to_string()),
                ..Default::default()
            }),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                engine
                    .search_machines(FilterUpdate {
                        area: Some("Line 1".to_string()),
                        ..Default::default()
                    })
                    .await;
            },
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                engine
                    .search_machines(FilterUpdate {
                        machine_name: Some("pump".to_string()),
                        ..Default::default()
                    })
                    .await;
            },
        );

        let calls = gateway.search_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].customer.as_deref(), Some("Acme"));
        assert_eq!(calls[0].area.as_deref(), Some("Line 1"));
        assert_eq!(calls[0].machine_name.as_deref(), Some("pump"));
    }

    #[tokio::test]
    async fn test_server_search_result_is_authoritative() {
        let (engine, gateway) = engine_with(
            MockGateway::with_machines("2025-01-01", january_machines()),
            date(2025, 1, 15),
        );
        engine.load_dashboard_data(date(2025, 1, 15)).await;
        *gateway.search_result.lock().unwrap() = vec![machine("m2", "FAN-02", "Zeta")];

        engine
            .search_machines(FilterUpdate {
                customer: Some("Zeta".to_string()),
                ..Default::default()
            })
            .await;

        let snap = engine.snapshot().await;
        assert_eq!(snap.filtered_machines.len(), 1);
        assert_eq!(snap.filtered_machines[0].id, "m2");
        assert!(!snap.loading);
    }

    #[tokio::test]
    async fn test_failed_search_falls_back_to_local_filter() {
        let (engine, gateway) = engine_with(
            MockGateway::with_machines("2025-01-01", january_machines()),
            date(2025, 1, 15),
        );
        engine.load_dashboard_data(date(2025, 1, 15)).await;
        gateway.fail_search.store(true, Ordering::SeqCst);

        engine
            .search_machines(FilterUpdate {
                customer: Some("Acme".to_string()),
                ..Default::default()
            })
            .await;

        let snap = engine.snapshot().await;
        let ids: Vec<&str> = snap.filtered_machines.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
        // Search failures degrade silently.
        assert!(snap.error.is_none());
        assert!(!snap.loading);
    }

    #[tokio::test]
    async fn test_all_empty_criteria_skip_the_server_entirely() {
        let (engine, gateway) = engine_with(
            MockGateway::with_machines("2025-01-01", january_machines()),
            date(2025, 1, 15),
        );
        engine.load_dashboard_data(date(2025, 1, 15)).await;

        engine
            .search_machines(FilterUpdate {
                customer: Some(String::new()),
                ..Default::default()
            })
            .await;

        let snap = engine.snapshot().await;
        assert_eq!(snap.filtered_machines, snap.machines);
        assert!(gateway.search_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_filters_restores_unfiltered_set() {
        let (engine, gateway) = engine_with(
            MockGateway::with_machines("2025-01-01", january_machines()),
            date(2025, 1, 15),
        );
        engine.load_dashboard_data(date(2025, 1, 15)).await;
        *gateway.search_result.lock().unwrap() = vec![machine("m1", "PUMP-01", "Acme")];
        engine
            .search_machines(FilterUpdate {
                customer: Some("Acme".to_string()),
                ..Default::default()
            })
            .await;

        engine.clear_filters().await;

        let snap = engine.snapshot().await;
        assert!(snap.filters.is_empty());
        assert_eq!(snap.filtered_machines, snap.machines);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_filters_drops_pending_debounced_search() {
        let (engine, gateway) = engine_with(
            MockGateway::with_machines("2025-01-01", january_machines()),
            date(2025, 1, 15),
        );
        engine.load_dashboard_data(date(2025, 1, 15)).await;

        tokio::join!(
            engine.search_machines(FilterUpdate {
                customer: Some("Acme".to_string()),
                ..Default::default()
            }),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                engine.clear_filters().await;
            },
        );

        let snap = engine.snapshot().await;
        assert!(gateway.search_calls.lock().unwrap().is_empty());
        assert_eq!(snap.filtered_machines, snap.machines);
    }

    #[tokio::test]
    async fn test_trend_charts_derive_from_current_snapshot() {
        let (engine, _) = engine_with(
            MockGateway::with_machines("2025-01-01", january_machines()),
            date(2025, 1, 15),
        );
        engine.load_dashboard_data(date(2025, 1, 15)).await;

        let status = engine.status_trend_chart(TrendView::Monthly).await;
        assert_eq!(status.labels, vec!["Jan 01"]);

        let hourly = engine.hourly_trend_chart().await;
        assert_eq!(hourly.labels, vec!["08:00"]);

        let customers = engine.customer_trend_chart().await;
        let names: Vec<&str> = customers.datasets.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Zeta"]);
    }
}
