//! City reference data: raw per-source records and the joined analysis view

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::location::{CityKey, Coordinates};
use super::pollutant::PollutantSample;

/// A city known to the store, before any measurements are attached
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct City {
    pub key: CityKey,
    pub coordinates: Coordinates,
    pub population: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

/// Latest air-quality measurement for a city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AirQualityRecord {
    /// Raw concentrations in µg/m³
    pub sample: PollutantSample,
    /// AQI as reported by the provider, on the provider's own scale
    pub raw_aqi: Option<f64>,
    /// EPA AQI in [0, 500]; `None` when no recognized pollutant was present
    pub standardized_aqi: Option<f64>,
    pub source: String,
    pub measured_at: DateTime<Utc>,
}

/// Latest cost-of-living figures for a city (100 = baseline)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CostOfLivingRecord {
    pub cost_of_living_index: f64,
    pub rent_index: Option<f64>,
    pub cost_of_living_plus_rent_index: Option<f64>,
    pub median_home_value: Option<f64>,
    pub median_rent: Option<f64>,
    pub median_household_income: Option<f64>,
    pub source: String,
    pub data_date: NaiveDate,
}

/// Life expectancy at birth for one country and year
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LifeExpectancyRecord {
    pub country: String,
    pub country_code: Option<String>,
    pub life_expectancy: f64,
    pub year: i32,
    pub source: String,
}

/// Joined view of a city with its latest measurements; any part may be missing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CityAnalysis {
    pub key: CityKey,
    pub coordinates: Coordinates,
    pub population: Option<u64>,
    pub pm25_concentration: Option<f64>,
    pub standardized_aqi: Option<f64>,
    pub cost_of_living_index: Option<f64>,
    pub rent_index: Option<f64>,
    pub life_expectancy: Option<f64>,
    pub air_quality_date: Option<DateTime<Utc>>,
    pub cost_data_date: Option<NaiveDate>,
}

impl CityAnalysis {
    /// Complete record, or `None` when AQI, cost or life expectancy is missing
    #[must_use]
    pub fn to_record(&self) -> Option<CityRecord> {
        Some(CityRecord {
            key: self.key.clone(),
            coordinates: self.coordinates,
            cost_of_living_index: finite(self.cost_of_living_index)?,
            standardized_aqi: finite(self.standardized_aqi)?,
            life_expectancy: finite(self.life_expectancy)?,
            pm25_concentration: finite(self.pm25_concentration),
        })
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// A city with every field the life-cost comparison needs
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CityRecord {
    pub key: CityKey,
    pub coordinates: Coordinates,
    pub cost_of_living_index: f64,
    pub standardized_aqi: f64,
    /// Country-level life expectancy baseline in years
    pub life_expectancy: f64,
    /// Measured PM2.5 in µg/m³, when the provider reported one
    pub pm25_concentration: Option<f64>,
}

/// Aggregate figures over the complete cities
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataSummary {
    pub total_cities: usize,
    pub average_aqi: Option<f64>,
    pub average_cost_index: Option<f64>,
    pub average_life_expectancy: Option<f64>,
}

impl DataSummary {
    #[must_use]
    pub fn from_records(records: &[CityRecord]) -> Self {
        let mean = |f: fn(&CityRecord) -> f64| {
            if records.is_empty() {
                None
            } else {
                Some(records.iter().map(f).sum::<f64>() / records.len() as f64)
            }
        };

        Self {
            total_cities: records.len(),
            average_aqi: mean(|r| r.standardized_aqi),
            average_cost_index: mean(|r| r.cost_of_living_index),
            average_life_expectancy: mean(|r| r.life_expectancy),
        }
    }
}
