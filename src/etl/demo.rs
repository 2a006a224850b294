//! Built-in demo dataset for running without API keys

use chrono::{Datelike, Utc};
use tracing::info;

use super::EtlReport;
use super::cities::distinct_countries;
use crate::Result;
use crate::aqi::AqiNormalizer;
use crate::models::{
    AirQualityRecord, City, CityKey, Coordinates, CostOfLivingRecord, LifeExpectancyRecord,
    Pollutant, PollutantSample,
};
use crate::store::CityStore;

const SOURCE: &str = "demo";

struct DemoCity {
    name: &'static str,
    country: &'static str,
    latitude: f64,
    longitude: f64,
    aqi: f64,
    cost: f64,
    life_expectancy: f64,
}

const fn demo(
    name: &'static str,
    country: &'static str,
    latitude: f64,
    longitude: f64,
    aqi: f64,
    cost: f64,
    life_expectancy: f64,
) -> DemoCity {
    DemoCity {
        name,
        country,
        latitude,
        longitude,
        aqi,
        cost,
        life_expectancy,
    }
}

const DEMO_CITIES: [DemoCity; 25] = [
    demo("New York", "United States", 40.7128, -74.0060, 85.0, 130.0, 78.9),
    demo("Vancouver", "Canada", 49.2827, -123.1207, 42.0, 115.0, 82.0),
    demo("London", "United Kingdom", 51.5074, -0.1278, 68.0, 120.0, 81.2),
    demo("Tokyo", "Japan", 35.6762, 139.6503, 75.0, 125.0, 84.6),
    demo("Singapore", "Singapore", 1.3521, 103.8198, 58.0, 140.0, 83.1),
    demo("Sydney", "Australia", -33.8688, 151.2093, 45.0, 125.0, 83.4),
    demo("Toronto", "Canada", 43.6532, -79.3832, 55.0, 110.0, 82.0),
    demo("Paris", "France", 48.8566, 2.3522, 72.0, 118.0, 82.7),
    demo("Berlin", "Germany", 52.5200, 13.4050, 65.0, 108.0, 81.3),
    demo("Zurich", "Switzerland", 47.3769, 8.5417, 35.0, 180.0, 83.8),
    demo("Stockholm", "Sweden", 59.3293, 18.0686, 40.0, 112.0, 82.8),
    demo("Copenhagen", "Denmark", 55.6761, 12.5683, 48.0, 115.0, 80.9),
    demo("Amsterdam", "Netherlands", 52.3676, 4.9041, 52.0, 113.0, 82.3),
    demo("Seoul", "South Korea", 37.5665, 126.9780, 95.0, 95.0, 83.0),
    demo("Hong Kong", "Hong Kong", 22.3193, 114.1694, 88.0, 135.0, 85.3),
    demo("Beijing", "China", 39.9042, 116.4074, 155.0, 75.0, 76.9),
    demo("Shanghai", "China", 31.2304, 121.4737, 135.0, 85.0, 76.9),
    demo("Delhi", "India", 28.7041, 77.1025, 185.0, 45.0, 69.7),
    demo("Mumbai", "India", 19.0760, 72.8777, 165.0, 55.0, 69.7),
    demo("Kelowna", "Canada", 49.8880, -119.4960, 28.0, 95.0, 82.0),
    demo("Bangkok", "Thailand", 13.7563, 100.5018, 125.0, 60.0, 77.0),
    demo("Mexico City", "Mexico", 19.4326, -99.1332, 145.0, 65.0, 75.1),
    demo("São Paulo", "Brazil", -23.5505, -46.6333, 115.0, 70.0, 75.9),
    demo("Los Angeles", "United States", 34.0522, -118.2437, 95.0, 135.0, 78.9),
    demo("Dubai", "United Arab Emirates", 25.2048, 55.2708, 78.0, 105.0, 78.0),
];

/// Write the demo dataset, replacing any data stored for those cities
pub async fn seed_demo(store: &CityStore) -> Result<EtlReport> {
    let mut report = EtlReport::default();
    let now = Utc::now();

    for city in &DEMO_CITIES {
        let key = CityKey::new(city.name, city.country);
        store
            .upsert_city(City {
                key: key.clone(),
                coordinates: Coordinates::new(city.latitude, city.longitude),
                population: None,
                updated_at: now,
            })
            .await?;
        report.cities_seeded += 1;

        let pm25 = AqiNormalizer::estimate_pm25(city.aqi);
        store
            .put_air_quality(
                &key,
                AirQualityRecord {
                    sample: PollutantSample::new()
                        .with(Pollutant::Pm25, Some(pm25))
                        .with(Pollutant::Pm10, Some(pm25 * 1.5)),
                    raw_aqi: None,
                    standardized_aqi: Some(city.aqi),
                    source: SOURCE.to_string(),
                    measured_at: now,
                },
            )
            .await?;
        report.air_quality_updated += 1;

        store
            .put_cost_of_living(
                &key,
                CostOfLivingRecord {
                    cost_of_living_index: city.cost,
                    rent_index: Some(city.cost * 1.2),
                    cost_of_living_plus_rent_index: Some(city.cost * 1.1),
                    median_home_value: None,
                    median_rent: None,
                    median_household_income: None,
                    source: SOURCE.to_string(),
                    data_date: now.date_naive(),
                },
            )
            .await?;
        report.cost_of_living_updated += 1;
    }

    for country in distinct_countries(DEMO_CITIES.iter().map(|c| c.country)) {
        let Some(city) = DEMO_CITIES.iter().find(|c| c.country == country) else {
            continue;
        };
        store
            .put_life_expectancy(LifeExpectancyRecord {
                country: country.to_string(),
                country_code: None,
                life_expectancy: city.life_expectancy,
                year: now.year(),
                source: SOURCE.to_string(),
            })
            .await?;
        report.life_expectancy_updated += 1;
    }

    store.mark_refreshed(now).await?;
    info!(cities = report.cities_seeded, "Demo data ready");
    Ok(report)
}
