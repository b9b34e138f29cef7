// Presentation layer - HTTP surface over the engine
pub mod app_state;
pub mod handlers;
