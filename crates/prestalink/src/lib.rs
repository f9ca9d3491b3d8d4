//! Marketplace ranking, recommendation, and stats core for the PrestaLink
//! platform: typed domain entities, the badge and ranking batch, the
//! personalized recommendation engine, activity tracking, and the axum
//! router exposing them.

pub mod analytics;
pub mod config;
pub mod domain;
pub mod error;
pub mod store;
pub mod telemetry;

pub use analytics::{analytics_router, AnalyticsState};
pub use config::{AppConfig, AppEnvironment, ConfigError};
pub use error::AppError;
