//! Upstream data providers
//!
//! Each source sits behind an async trait so the ETL pipeline can be driven by
//! the HTTP implementations in production and by fixed data in tests.

pub mod air_quality;
pub mod cost_of_living;
pub mod countries;
pub mod life_expectancy;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::models::{CityKey, CostOfLivingRecord, LifeExpectancyRecord, PollutantSample};

pub use air_quality::RapidApiAirQuality;
pub use cost_of_living::RapidApiCostOfLiving;
pub use life_expectancy::WorldBankLifeExpectancy;

/// Current air pollution as reported by a provider, before standardization
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AirQualityObservation {
    pub sample: PollutantSample,
    /// Provider's own index, on its own scale
    pub raw_aqi: Option<f64>,
    pub measured_at: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CostOfLivingObservation {
    pub record: CostOfLivingRecord,
    pub population: Option<u64>,
}

#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    /// `Ok(None)` when the provider has no data for the city
    async fn current(&self, city: &CityKey) -> Result<Option<AirQualityObservation>>;
}

#[async_trait]
pub trait CostOfLivingProvider: Send + Sync {
    async fn cost_of_living(&self, city: &CityKey) -> Result<Option<CostOfLivingObservation>>;
}

#[async_trait]
pub trait LifeExpectancyProvider: Send + Sync {
    /// Most recent life expectancy at birth for a country
    async fn life_expectancy(&self, country: &str) -> Result<Option<LifeExpectancyRecord>>;
}

/// Shared HTTP client with timeout and exponential-backoff retries
pub fn http_client(config: &ApiConfig) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(u64::from(config.timeout_seconds)))
        .user_agent(concat!("lifecost/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}
