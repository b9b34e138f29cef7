// Application state for HTTP handlers
use crate::application::dashboard_engine::DashboardEngine;

pub struct AppState {
    pub engine: DashboardEngine,
}
