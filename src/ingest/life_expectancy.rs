use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use super::{LifeExpectancyProvider, countries};
use crate::cache::ResponseCache;
use crate::models::LifeExpectancyRecord;

/// Life expectancy at birth, total (years)
const INDICATOR: &str = "SP.DYN.LE00.IN";
const SOURCE: &str = "world_bank";

/// Life expectancy from the World Bank open data API
pub struct WorldBankLifeExpectancy {
    client: ClientWithMiddleware,
    base_url: String,
    cache: Option<ResponseCache>,
    country_list: OnceCell<Vec<WorldBankCountry>>,
}

#[derive(Debug, Deserialize, Clone)]
pub(crate) struct WorldBankCountry {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct IndicatorRecord {
    country: NamedValue,
    #[serde(default)]
    countryiso3code: String,
    date: String,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NamedValue {
    value: String,
}

/// World Bank responses are `[paging, data]`; errors come back as `[message]`
fn data_page<T: serde::de::DeserializeOwned>(body: Value) -> Result<Vec<T>> {
    match body.get(1) {
        Some(Value::Array(_)) => {
            let mut body = body;
            let data = body[1].take();
            serde_json::from_value(data).context("Unexpected World Bank data page")
        }
        _ => Ok(Vec::new()),
    }
}

/// ISO3 code for a country name: exact match first, then substring
pub(crate) fn match_country(list: &[WorldBankCountry], country: &str) -> Option<String> {
    let wanted = country.trim().to_lowercase();
    list.iter()
        .find(|c| c.name.to_lowercase() == wanted)
        .or_else(|| list.iter().find(|c| c.name.to_lowercase().contains(&wanted)))
        .map(|c| c.id.clone())
}

/// Most recent non-null value, recorded under the caller's country name
fn latest_value(records: Vec<IndicatorRecord>, country: &str) -> Option<LifeExpectancyRecord> {
    records
        .into_iter()
        .filter_map(|r| {
            let value = r.value?;
            let year = r.date.parse::<i32>().ok()?;
            Some((year, value, r))
        })
        .max_by_key(|(year, _, _)| *year)
        .map(|(year, value, r)| {
            debug!(reported_as = %r.country.value, year, value, "latest life expectancy");
            LifeExpectancyRecord {
                country: country.to_string(),
                country_code: Some(r.countryiso3code).filter(|c| !c.is_empty()),
                life_expectancy: value,
                year,
                source: SOURCE.to_string(),
            }
        })
}

/// Static estimate for when the API has nothing
#[must_use]
pub fn estimated_record(country: &str) -> LifeExpectancyRecord {
    LifeExpectancyRecord {
        country: country.to_string(),
        country_code: countries::iso3(country).map(str::to_string),
        life_expectancy: countries::estimated_life_expectancy(country),
        year: Utc::now().year(),
        source: "estimated".to_string(),
    }
}

impl WorldBankLifeExpectancy {
    #[must_use]
    pub fn new(
        client: ClientWithMiddleware,
        base_url: impl Into<String>,
        cache: Option<ResponseCache>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache,
            country_list: OnceCell::new(),
        }
    }

    async fn get_json(&self, url: String) -> Result<Value> {
        debug!(%url, "Calling the API");
        let response = self.client.get(url).send().await?.error_for_status()?;
        response
            .json::<Value>()
            .await
            .context("World Bank response is not JSON")
    }

    async fn countries(&self) -> Result<&[WorldBankCountry]> {
        let list = self
            .country_list
            .get_or_try_init(|| async {
                let url = format!("{}/country?format=json&per_page=300", self.base_url);
                data_page::<WorldBankCountry>(self.get_json(url).await?)
            })
            .await?;
        Ok(list.as_slice())
    }

    async fn iso3(&self, country: &str) -> Option<String> {
        let found = match self.countries().await {
            Ok(list) => match_country(list, country),
            Err(err) => {
                warn!(error = %err, "Country list lookup failed");
                None
            }
        };
        found.or_else(|| countries::iso3(country).map(str::to_string))
    }
}

#[async_trait]
impl LifeExpectancyProvider for WorldBankLifeExpectancy {
    #[instrument(skip(self))]
    async fn life_expectancy(&self, country: &str) -> Result<Option<LifeExpectancyRecord>> {
        let key = format!("life_expectancy:{}", country.trim().to_lowercase());
        if let Some(cache) = &self.cache
            && let Some(cached) = cache.get::<LifeExpectancyRecord>(&key).await?
        {
            return Ok(Some(cached));
        }

        let Some(code) = self.iso3(country).await else {
            warn!("No ISO3 code known for country");
            return Ok(None);
        };

        let year = Utc::now().year() - 1;
        let url = format!(
            "{}/country/{code}/indicator/{INDICATOR}?format=json&date={}:{year}&per_page=100",
            self.base_url,
            year - 5
        );
        let records = data_page::<IndicatorRecord>(self.get_json(url).await?)?;
        let record = latest_value(records, country);

        if let (Some(cache), Some(record)) = (&self.cache, &record) {
            cache.put_default(&key, record.clone()).await?;
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn countries_fixture() -> Vec<WorldBankCountry> {
        data_page(json!([
            {"page": 1, "pages": 1, "per_page": "300", "total": 3},
            [
                {"id": "IOT", "name": "British Indian Ocean Territory"},
                {"id": "IND", "name": "India"},
                {"id": "KOR", "name": "Korea, Rep."}
            ]
        ]))
        .unwrap()
    }

    #[test]
    fn test_exact_match_wins_over_substring() {
        let list = countries_fixture();
        assert_eq!(match_country(&list, "india"), Some("IND".to_string()));
        assert_eq!(match_country(&list, "Korea"), Some("KOR".to_string()));
        assert_eq!(match_country(&list, "Atlantis"), None);
    }

    #[test]
    fn test_latest_non_null_value() {
        let records: Vec<IndicatorRecord> = data_page(json!([
            {"page": 1},
            [
                {"country": {"id": "JP", "value": "Japan"}, "countryiso3code": "JPN", "date": "2025", "value": null},
                {"country": {"id": "JP", "value": "Japan"}, "countryiso3code": "JPN", "date": "2023", "value": 84.7},
                {"country": {"id": "JP", "value": "Japan"}, "countryiso3code": "JPN", "date": "2022", "value": 84.5}
            ]
        ]))
        .unwrap();

        let record = latest_value(records, "Japan").unwrap();
        assert_eq!(record.year, 2023);
        assert_eq!(record.life_expectancy, 84.7);
        assert_eq!(record.country_code.as_deref(), Some("JPN"));
        assert_eq!(record.source, "world_bank");
    }

    #[test]
    fn test_error_payload_is_empty() {
        let records: Vec<IndicatorRecord> = data_page(json!([
            {"message": [{"id": "120", "key": "Invalid value"}]}
        ]))
        .unwrap();
        assert!(records.is_empty());
        assert!(latest_value(records, "Nowhere").is_none());
    }

    #[test]
    fn test_estimated_record() {
        let record = estimated_record("Germany");
        assert_eq!(record.life_expectancy, 81.3);
        assert_eq!(record.country_code.as_deref(), Some("DEU"));
        assert_eq!(record.source, "estimated");

        assert_eq!(estimated_record("Atlantis").life_expectancy, 72.0);
    }
}
