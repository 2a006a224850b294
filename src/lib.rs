//! `lifecost` - what moving between two cities costs in money and in years of life
//!
//! The library normalizes air-quality readings to the EPA AQI, keeps a local
//! store of city reference data fed by an ETL pipeline, and compares cities by
//! cost of living and health-adjusted life expectancy.

pub mod api;
pub mod aqi;
pub mod cache;
pub mod config;
pub mod error;
pub mod etl;
pub mod globe;
pub mod ingest;
pub mod life_cost;
pub mod models;
pub mod selection;
pub mod store;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use aqi::{AqiCategory, AqiNormalizer};
pub use cache::ResponseCache;
pub use config::LifeCostConfig;
pub use error::LifeCostError;
pub use etl::{EtlPipeline, EtlReport};
pub use life_cost::LifeCostCalculator;
pub use models::{CityKey, CityRecord, ComparisonResult, Pollutant, PollutantSample};
pub use store::CityStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, LifeCostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
