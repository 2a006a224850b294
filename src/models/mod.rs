//! Data models for the lifecost application
//!
//! This module contains the core domain models organized by concern:
//! - Location: City identity and geographic coordinates
//! - Pollutant: Pollutant readings and per-city samples
//! - City: Per-source records, the joined analysis view and complete records
//! - Comparison: Life-cost comparison results

pub mod city;
pub mod comparison;
pub mod location;
pub mod pollutant;

// Re-export all public types for convenient access
pub use city::{
    AirQualityRecord, City, CityAnalysis, CityRecord, CostOfLivingRecord, DataSummary,
    LifeExpectancyRecord,
};
pub use comparison::{
    AnalysisDetails, ComparisonResult, Confidence, UncertaintyBand, ValueAssessment,
};
pub use location::{CityKey, Coordinates};
pub use pollutant::{Pollutant, PollutantReading, PollutantSample};
