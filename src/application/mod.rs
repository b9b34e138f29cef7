// Application layer - orchestration and gateway contracts
pub mod dashboard_engine;
pub mod dashboard_gateway;
