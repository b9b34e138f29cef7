// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::Local;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::application::dashboard_engine::DashboardEngine;
use crate::domain::dashboard::DashboardSnapshot;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::rest_gateway::RestGateway;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    clear_filters, customer_trends, get_snapshot, health_check, hourly_trends, load_dashboard,
    search_machines, set_selected_date, status_trends,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Create gateway (infrastructure layer)
    let gateway = Arc::new(RestGateway::new(
        config.backend.base_url.clone(),
        Duration::from_secs(config.backend.request_timeout_secs),
    )?);

    // The snapshot is built here and injected; nothing else owns state.
    let snapshot = Arc::new(RwLock::new(DashboardSnapshot::new(
        Local::now().date_naive(),
    )));
    let engine = DashboardEngine::new(gateway, snapshot);

    // Create application state
    let state = Arc::new(AppState { engine });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/dashboard/load", post(load_dashboard))
        .route("/api/dashboard/date", post(set_selected_date))
        .route("/api/machines/search", post(search_machines))
        .route("/api/filters/clear", post(clear_filters))
        .route("/api/trends/status", get(status_trends))
        .route("/api/trends/customers", get(customer_trends))
        .route("/api/trends/hourly", get(hourly_trends))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .context("Invalid server bind address")?;
    println!("Starting factory-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
