use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{AirQualityObservation, AirQualityProvider, countries};
use crate::cache::ResponseCache;
use crate::models::{CityKey, Pollutant, PollutantReading, PollutantSample};

const SOURCE: &str = "rapidapi_weather";

/// Current air pollution from the RapidAPI weather service
pub struct RapidApiAirQuality {
    client: ClientWithMiddleware,
    host: String,
    api_key: Option<String>,
    cache: Option<ResponseCache>,
}

impl RapidApiAirQuality {
    #[must_use]
    pub fn new(
        client: ClientWithMiddleware,
        host: impl Into<String>,
        api_key: Option<String>,
        cache: Option<ResponseCache>,
    ) -> Self {
        Self {
            client,
            host: host.into(),
            api_key,
            cache,
        }
    }

    async fn fetch(&self, api_key: &str, city: &CityKey) -> Result<Option<AirQualityObservation>> {
        let place = format!("{},{}", city.name, countries::iso2(&city.country));
        let url = format!(
            "https://{}/api/weather/air_pollution?place={}&type=current",
            self.host,
            urlencoding::encode(&place)
        );
        debug!(%url, "Calling the API");

        let response = self
            .client
            .get(url)
            .header("x-rapidapi-key", api_key)
            .header("x-rapidapi-host", &self.host)
            .header("Accept", "application/json")
            .send()
            .await?
            .error_for_status()?;
        let body: AirPollutionResponse = response
            .json()
            .await
            .context("Unexpected air pollution response")?;

        Ok(parse_air_pollution(body, city))
    }
}

#[async_trait]
impl AirQualityProvider for RapidApiAirQuality {
    #[instrument(skip(self), fields(city = %city))]
    async fn current(&self, city: &CityKey) -> Result<Option<AirQualityObservation>> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("No RapidAPI key configured, skipping air quality");
            return Ok(None);
        };

        let key = format!("air_quality:{}", city.storage_key());
        if let Some(cache) = &self.cache
            && let Some(cached) = cache.get::<AirQualityObservation>(&key).await?
        {
            return Ok(Some(cached));
        }

        let observation = self.fetch(api_key, city).await?;
        if let (Some(cache), Some(observation)) = (&self.cache, &observation) {
            // Pollution changes hourly; cache for at most an hour
            let ttl = cache.default_ttl().min(std::time::Duration::from_secs(3600));
            cache
                .put(&key, observation.clone(), crate::cache::jittered(ttl))
                .await?;
        }
        Ok(observation)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AirPollutionResponse {
    #[serde(default)]
    list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct AirPollutionEntry {
    #[serde(default)]
    components: Components,
    #[serde(default)]
    main: MainIndex,
    dt: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct Components {
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    no2: Option<f64>,
    so2: Option<f64>,
    co: Option<f64>,
    o3: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct MainIndex {
    air_quality_index: Option<f64>,
}

/// First entry of the response; absent components stay absent
pub(crate) fn parse_air_pollution(
    body: AirPollutionResponse,
    city: &CityKey,
) -> Option<AirQualityObservation> {
    let entry = body.list.into_iter().next()?;
    let measured_at = entry
        .dt
        .and_then(|dt| DateTime::from_timestamp(dt, 0))
        .unwrap_or_else(Utc::now);
    let c = entry.components;

    let readings: Vec<PollutantReading> = [
        (Pollutant::Pm25, c.pm2_5),
        (Pollutant::Pm10, c.pm10),
        (Pollutant::No2, c.no2),
        (Pollutant::So2, c.so2),
        (Pollutant::Co, c.co),
        (Pollutant::O3, c.o3),
    ]
    .into_iter()
    .filter_map(|(pollutant, value)| {
        Some(PollutantReading {
            pollutant,
            concentration: value?,
            city: city.label(),
            timestamp: measured_at,
        })
    })
    .collect();
    debug!(readings = readings.len(), "parsed air pollution");

    Some(AirQualityObservation {
        sample: PollutantSample::from_readings(&readings),
        raw_aqi: entry.main.air_quality_index,
        measured_at,
        source: SOURCE.to_string(),
    })
}
