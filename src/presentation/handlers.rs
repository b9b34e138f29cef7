// HTTP request handlers - the presentation layer's view of the engine
use crate::domain::dashboard::DashboardSnapshot;
use crate::domain::machine::FilterUpdate;
use crate::domain::trends::{TrendChart, TrendView};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct DateRequest {
    pub date: NaiveDate,
}

#[derive(Deserialize)]
pub struct TrendQuery {
    pub view: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current snapshot, unmodified.
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.engine.snapshot().await)
}

/// Full date-range load for the month containing the given date.
/// Responds with the post-transition snapshot.
pub async fn load_dashboard(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DateRequest>,
) -> Json<DashboardSnapshot> {
    state.engine.load_dashboard_data(request.date).await;
    Json(state.engine.snapshot().await)
}

/// Change the selected date; wired to a full reload.
pub async fn set_selected_date(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DateRequest>,
) -> Json<DashboardSnapshot> {
    state.engine.set_selected_date(request.date).await;
    Json(state.engine.snapshot().await)
}

/// Merge a partial filter edit and run the debounced search.
pub async fn search_machines(
    State(state): State<Arc<AppState>>,
    Json(update): Json<FilterUpdate>,
) -> Json<DashboardSnapshot> {
    state.engine.search_machines(update).await;
    Json(state.engine.snapshot().await)
}

/// Drop all filter criteria and restore the unfiltered machine set.
pub async fn clear_filters(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    state.engine.clear_filters().await;
    Json(state.engine.snapshot().await)
}

/// Status-over-time chart; `?view=weekly` switches to the merged buckets.
pub async fn status_trends(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendQuery>,
) -> Json<TrendChart> {
    let view = match query.view.as_deref() {
        Some("weekly") => TrendView::Weekly,
        _ => TrendView::Monthly,
    };
    Json(state.engine.status_trend_chart(view).await)
}

/// Approximate per-customer share chart.
pub async fn customer_trends(State(state): State<Arc<AppState>>) -> Json<TrendChart> {
    Json(state.engine.customer_trend_chart().await)
}

/// Reading volume by hour of day.
pub async fn hourly_trends(State(state): State<Arc<AppState>>) -> Json<TrendChart> {
    Json(state.engine.hourly_trend_chart().await)
}
