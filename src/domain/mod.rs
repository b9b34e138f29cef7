// Domain layer - core models and pure aggregation logic
pub mod dashboard;
pub mod machine;
pub mod trends;
