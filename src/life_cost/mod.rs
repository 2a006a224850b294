//! Life-cost comparison between an origin and a destination city
//!
//! Combines the cost-of-living difference, the AQI difference and the
//! country-level life expectancy difference with an estimate of how many
//! years the change in PM2.5 exposure adds or removes.

pub mod health;
pub mod scoring;

use serde::Serialize;
use tracing::debug;

use crate::models::{CityRecord, ComparisonResult, UncertaintyBand};
use health::Pm25Pair;

/// Stateless comparison engine
pub struct LifeCostCalculator;

impl LifeCostCalculator {
    /// Compare two complete city records. Pure and deterministic.
    #[must_use]
    pub fn compare(origin: &CityRecord, destination: &CityRecord) -> ComparisonResult {
        let cost_delta = destination.cost_of_living_index - origin.cost_of_living_index;
        let aqi_delta = destination.standardized_aqi - origin.standardized_aqi;
        let life_expectancy_delta = destination.life_expectancy - origin.life_expectancy;

        let pm25 = Pm25Pair::resolve(origin, destination);
        let air_impact = health::air_quality_life_impact(pm25.origin, pm25.destination);
        let hale_delta = life_expectancy_delta + air_impact;

        debug!(
            origin = %origin.key,
            destination = %destination.key,
            cost_delta,
            aqi_delta,
            air_impact,
            hale_delta,
            pm25_estimated = pm25.estimated,
            "compared cities"
        );

        let cost_per_life_year = scoring::cost_per_life_year(cost_delta, hale_delta);
        let recommendation_score = scoring::recommendation_score(cost_delta, hale_delta, aqi_delta);

        ComparisonResult {
            origin: origin.clone(),
            destination: destination.clone(),
            cost_delta: UncertaintyBand::new(cost_delta, scoring::COST_UNCERTAINTY),
            aqi_delta: UncertaintyBand::new(aqi_delta, scoring::AQI_UNCERTAINTY),
            life_expectancy_delta,
            air_quality_life_impact: UncertaintyBand::new(
                air_impact,
                scoring::LIFE_IMPACT_UNCERTAINTY,
            ),
            health_adjusted_life_expectancy_delta: UncertaintyBand::new(
                hale_delta,
                scoring::LIFE_IMPACT_UNCERTAINTY,
            ),
            origin_pm25: pm25.origin,
            destination_pm25: pm25.destination,
            cost_per_life_year,
            value_assessment: scoring::value_assessment(cost_delta, hale_delta, cost_per_life_year),
            recommendation_score,
            confidence: scoring::confidence(
                origin.standardized_aqi,
                destination.standardized_aqi,
                air_impact,
                &pm25,
            ),
            distance_km: origin.coordinates.distance_km(&destination.coordinates),
            details: scoring::analysis_details(
                cost_delta,
                aqi_delta,
                hale_delta,
                recommendation_score,
            ),
        }
    }
}

/// Parameters and sources behind the comparison, as shown to users
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Methodology {
    pub pm25_coefficient_years_per_ugm3: f64,
    pub taper_threshold_ugm3: f64,
    pub cost_uncertainty: f64,
    pub aqi_uncertainty: f64,
    pub life_impact_uncertainty: f64,
    pub usd_per_index_point: f64,
    pub sections: Vec<MethodologySection>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MethodologySection {
    pub title: &'static str,
    pub body: &'static str,
}

const SECTIONS: [(&str, &str); 5] = [
    (
        "Air quality index",
        "Raw pollutant concentrations are converted to the US EPA AQI with the published \
         piecewise-linear breakpoint tables for PM2.5, PM10, NO2, SO2, CO and O3. A city's \
         index is the worst sub-index among the pollutants measured there.",
    ),
    (
        "Life expectancy impact",
        "Following the Air Quality Life Index, each µg/m³ of sustained PM2.5 exposure \
         costs about 0.1 years of life. Above 55.4 µg/m³ the marginal harm tapers \
         logarithmically. When a city has no measured PM2.5 it is estimated from the AQI.",
    ),
    (
        "Health-adjusted change",
        "The baseline is the difference in national life expectancy at birth (World Bank \
         indicator SP.DYN.LE00.IN); the air quality impact is added on top.",
    ),
    (
        "Cost of living",
        "Indices are relative to a baseline of 100. One index point is valued at roughly \
         USD 1 000 per year for an average household when pricing a life year.",
    ),
    (
        "Limitations",
        "Life expectancy is national, not city-level. Pollution exposure varies within \
         a city and over time. Results are estimates for exploration, not medical or \
         financial advice.",
    ),
];

#[must_use]
pub fn methodology() -> Methodology {
    Methodology {
        pm25_coefficient_years_per_ugm3: health::BETA,
        taper_threshold_ugm3: health::TAPER_THRESHOLD,
        cost_uncertainty: scoring::COST_UNCERTAINTY,
        aqi_uncertainty: scoring::AQI_UNCERTAINTY,
        life_impact_uncertainty: scoring::LIFE_IMPACT_UNCERTAINTY,
        usd_per_index_point: scoring::USD_PER_INDEX_POINT,
        sections: SECTIONS
            .iter()
            .map(|&(title, body)| MethodologySection { title, body })
            .collect(),
    }
}
