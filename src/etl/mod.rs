//! ETL pipeline: pulls provider data for the tracked cities into the store
//!
//! A full run seeds the city list, then collects air quality, cost of living
//! and life expectancy in turn, pausing between provider calls. Failures for
//! one city are logged and counted; they never abort the run.

pub mod cities;
pub mod demo;

use chrono::Utc;
use opentelemetry::KeyValue;
use opentelemetry::metrics::Counter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::aqi::AqiNormalizer;
use crate::cache::ResponseCache;
use crate::config::{EtlConfig, LifeCostConfig};
use crate::ingest::{
    self, AirQualityProvider, CostOfLivingProvider, LifeExpectancyProvider, RapidApiAirQuality,
    RapidApiCostOfLiving, WorldBankLifeExpectancy, life_expectancy::estimated_record,
};
use crate::models::{AirQualityRecord, CityKey};
use crate::store::CityStore;
use crate::{LifeCostError, Result};

pub use demo::seed_demo;

/// Counts from one pipeline run
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct EtlReport {
    pub cities_seeded: usize,
    pub air_quality_updated: usize,
    pub air_quality_missing: usize,
    pub cost_of_living_updated: usize,
    pub cost_of_living_missing: usize,
    pub life_expectancy_updated: usize,
    pub life_expectancy_estimated: usize,
    /// "City, Country: reason" for every failed provider call
    pub failures: Vec<String>,
}

/// Pauses between consecutive provider calls
#[derive(Debug, Clone, Copy)]
pub struct EtlDelays {
    pub air_quality: Duration,
    pub cost_of_living: Duration,
    pub life_expectancy: Duration,
}

impl EtlDelays {
    #[must_use]
    pub fn none() -> Self {
        Self {
            air_quality: Duration::ZERO,
            cost_of_living: Duration::ZERO,
            life_expectancy: Duration::ZERO,
        }
    }
}

impl From<&EtlConfig> for EtlDelays {
    fn from(config: &EtlConfig) -> Self {
        Self {
            air_quality: Duration::from_millis(config.air_quality_delay_ms),
            cost_of_living: Duration::from_millis(config.cost_of_living_delay_ms),
            life_expectancy: Duration::from_millis(config.life_expectancy_delay_ms),
        }
    }
}

struct EtlMetrics {
    records: Counter<u64>,
    failures: Counter<u64>,
}

impl EtlMetrics {
    fn new() -> Self {
        let meter = opentelemetry::global::meter("lifecost");
        Self {
            records: meter
                .u64_counter("lifecost.etl.records")
                .with_description("Records written by the ETL pipeline")
                .build(),
            failures: meter
                .u64_counter("lifecost.etl.failures")
                .with_description("Provider calls that failed during ETL")
                .build(),
        }
    }

    fn written(&self, dataset: &'static str) {
        self.records.add(1, &[KeyValue::new("dataset", dataset)]);
    }

    fn failed(&self, dataset: &'static str) {
        self.failures.add(1, &[KeyValue::new("dataset", dataset)]);
    }
}

enum Outcome {
    Updated,
    Missing,
}

pub struct EtlPipeline {
    store: CityStore,
    air_quality: Arc<dyn AirQualityProvider>,
    cost_of_living: Arc<dyn CostOfLivingProvider>,
    life_expectancy: Arc<dyn LifeExpectancyProvider>,
    delays: EtlDelays,
    metrics: EtlMetrics,
}

impl EtlPipeline {
    #[must_use]
    pub fn new(
        store: CityStore,
        air_quality: Arc<dyn AirQualityProvider>,
        cost_of_living: Arc<dyn CostOfLivingProvider>,
        life_expectancy: Arc<dyn LifeExpectancyProvider>,
        delays: EtlDelays,
    ) -> Self {
        Self {
            store,
            air_quality,
            cost_of_living,
            life_expectancy,
            delays,
            metrics: EtlMetrics::new(),
        }
    }

    /// Pipeline with the HTTP providers described by the configuration
    pub fn from_config(
        config: &LifeCostConfig,
        store: CityStore,
        cache: Option<ResponseCache>,
    ) -> anyhow::Result<Self> {
        let client = ingest::http_client(&config.api)?;
        let key = config.api.rapidapi_key.clone();

        Ok(Self::new(
            store,
            Arc::new(RapidApiAirQuality::new(
                client.clone(),
                &config.api.air_quality_host,
                key.clone(),
                cache.clone(),
            )),
            Arc::new(RapidApiCostOfLiving::new(
                client.clone(),
                &config.api.cost_of_living_host,
                key,
                cache.clone(),
            )),
            Arc::new(WorldBankLifeExpectancy::new(
                client,
                &config.api.world_bank_base_url,
                cache,
            )),
            EtlDelays::from(&config.etl),
        ))
    }

    async fn pause(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn collect_air_quality(&self, key: &CityKey) -> Result<Outcome> {
        let observation = self
            .air_quality
            .current(key)
            .await
            .map_err(|e| LifeCostError::api(format!("{e:#}")))?;
        let Some(observation) = observation else {
            return Ok(Outcome::Missing);
        };

        let Some(standardized_aqi) = AqiNormalizer::standardized_aqi(&observation.sample) else {
            warn!(city = %key, "No recognized pollutant in air quality data");
            return Ok(Outcome::Missing);
        };

        self.store
            .put_air_quality(
                key,
                AirQualityRecord {
                    sample: observation.sample,
                    raw_aqi: observation.raw_aqi,
                    standardized_aqi: Some(standardized_aqi),
                    source: observation.source,
                    measured_at: observation.measured_at,
                },
            )
            .await?;
        self.metrics.written("air_quality");
        Ok(Outcome::Updated)
    }

    async fn collect_cost_of_living(&self, key: &CityKey) -> Result<Outcome> {
        let observation = self
            .cost_of_living
            .cost_of_living(key)
            .await
            .map_err(|e| LifeCostError::api(format!("{e:#}")))?;
        let Some(observation) = observation else {
            return Ok(Outcome::Missing);
        };

        if let Some(population) = observation.population
            && let Some(mut city) = self.store.city(key).await?
        {
            city.population = Some(population);
            city.updated_at = Utc::now();
            self.store.upsert_city(city).await?;
        }
        self.store
            .put_cost_of_living(key, observation.record)
            .await?;
        self.metrics.written("cost_of_living");
        Ok(Outcome::Updated)
    }

    /// Store the provider's figure, or a static estimate when it has none
    async fn collect_life_expectancy(&self, country: &str, report: &mut EtlReport) -> Result<()> {
        let record = match self.life_expectancy.life_expectancy(country).await {
            Ok(Some(record)) => {
                report.life_expectancy_updated += 1;
                record
            }
            Ok(None) => {
                report.life_expectancy_estimated += 1;
                estimated_record(country)
            }
            Err(err) => {
                warn!(country, error = %err, "Life expectancy lookup failed, using estimate");
                self.metrics.failed("life_expectancy");
                report.failures.push(format!("{country}: {err:#}"));
                report.life_expectancy_estimated += 1;
                estimated_record(country)
            }
        };
        self.store.put_life_expectancy(record).await?;
        self.metrics.written("life_expectancy");
        Ok(())
    }

    fn tally(
        &self,
        dataset: &'static str,
        key: &CityKey,
        outcome: Result<Outcome>,
        updated: &mut usize,
        missing: &mut usize,
        failures: &mut Vec<String>,
    ) {
        match outcome {
            Ok(Outcome::Updated) => *updated += 1,
            Ok(Outcome::Missing) => {
                info!(city = %key, dataset, "No data available");
                *missing += 1;
            }
            Err(err) => {
                warn!(city = %key, dataset, error = %err, "Collection failed");
                self.metrics.failed(dataset);
                failures.push(format!("{key}: {err}"));
            }
        }
    }

    /// Seed the major cities and refresh every dataset for them
    #[instrument(skip(self))]
    pub async fn run_full(&self) -> Result<EtlReport> {
        let mut report = EtlReport::default();
        info!("Starting ETL pipeline");

        for seed in &cities::MAJOR_CITIES {
            self.store.upsert_city(seed.to_city()).await?;
            report.cities_seeded += 1;
        }
        info!(count = report.cities_seeded, "Cities seeded");

        for seed in &cities::MAJOR_CITIES {
            let key = seed.key();
            let outcome = self.collect_air_quality(&key).await;
            self.tally(
                "air_quality",
                &key,
                outcome,
                &mut report.air_quality_updated,
                &mut report.air_quality_missing,
                &mut report.failures,
            );
            Self::pause(self.delays.air_quality).await;
        }
        info!(updated = report.air_quality_updated, "Air quality collected");

        for seed in &cities::MAJOR_CITIES {
            let key = seed.key();
            let outcome = self.collect_cost_of_living(&key).await;
            self.tally(
                "cost_of_living",
                &key,
                outcome,
                &mut report.cost_of_living_updated,
                &mut report.cost_of_living_missing,
                &mut report.failures,
            );
            Self::pause(self.delays.cost_of_living).await;
        }
        info!(updated = report.cost_of_living_updated, "Cost of living collected");

        for country in cities::distinct_countries(cities::MAJOR_CITIES.iter().map(|c| c.country)) {
            self.collect_life_expectancy(country, &mut report).await?;
            Self::pause(self.delays.life_expectancy).await;
        }
        info!(
            updated = report.life_expectancy_updated,
            estimated = report.life_expectancy_estimated,
            "Life expectancy collected"
        );

        self.store.mark_refreshed(Utc::now()).await?;
        info!(failures = report.failures.len(), "ETL pipeline completed");
        Ok(report)
    }

    /// Refresh one stored city; its life expectancy is only replaced when
    /// the provider has a figure
    #[instrument(skip(self))]
    pub async fn update_city(&self, name: &str, country: &str) -> Result<EtlReport> {
        let key = CityKey::new(name, country);
        let Some(city) = self.store.city(&key).await? else {
            return Err(LifeCostError::not_found(format!("City not found: {key}")));
        };
        let key = city.key;
        let mut report = EtlReport::default();

        let outcome = self.collect_air_quality(&key).await;
        self.tally(
            "air_quality",
            &key,
            outcome,
            &mut report.air_quality_updated,
            &mut report.air_quality_missing,
            &mut report.failures,
        );

        let outcome = self.collect_cost_of_living(&key).await;
        self.tally(
            "cost_of_living",
            &key,
            outcome,
            &mut report.cost_of_living_updated,
            &mut report.cost_of_living_missing,
            &mut report.failures,
        );

        match self.life_expectancy.life_expectancy(&key.country).await {
            Ok(Some(record)) => {
                self.store.put_life_expectancy(record).await?;
                self.metrics.written("life_expectancy");
                report.life_expectancy_updated += 1;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "Life expectancy lookup failed");
                self.metrics.failed("life_expectancy");
                report.failures.push(format!("{}: {err:#}", key.country));
            }
        }

        Ok(report)
    }
}
