use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{CostOfLivingObservation, CostOfLivingProvider};
use crate::cache::ResponseCache;
use crate::models::{CityKey, CostOfLivingRecord};

const SOURCE: &str = "rapidapi_places_to_live";

/// Grade assumed when the report card has no cost-of-living grade
const DEFAULT_GRADE: f64 = 3.0;

/// Cost-of-living figures from the RapidAPI find-places-to-live service
pub struct RapidApiCostOfLiving {
    client: ClientWithMiddleware,
    host: String,
    api_key: Option<String>,
    cache: Option<ResponseCache>,
}

/// Place slugs to try, most specific first
#[must_use]
pub fn place_slugs(city: &CityKey) -> Vec<String> {
    let name = city.name.to_lowercase();
    let country = city.country.to_lowercase();
    let mut slugs = vec![
        format!("{}-{}", name.replace(' ', "-"), country.replace(' ', "-")),
        format!("{name}-{country}"),
        name.replace(' ', "-"),
    ];
    slugs.dedup();
    slugs
}

impl RapidApiCostOfLiving {
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

    /// `Ok(None)` when the service doesn't know the slug
    async fn fetch_place(&self, api_key: &str, slug: &str) -> Result<Option<Value>> {
        let url = format!(
            "https://{}/placesToLive?place={}&type=City",
            self.host,
            urlencoding::encode(slug)
        );
        debug!(%url, "Calling the API");

        let response = self
            .client
            .get(url)
            .header("x-rapidapi-key", api_key)
            .header("x-rapidapi-host", &self.host)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response
            .error_for_status()?
            .json::<Value>()
            .await
            .context("Unexpected places-to-live response")?;
        Ok(Some(body))
    }
}

#[async_trait]
impl CostOfLivingProvider for RapidApiCostOfLiving {
    #[instrument(skip(self), fields(city = %city))]
    async fn cost_of_living(&self, city: &CityKey) -> Result<Option<CostOfLivingObservation>> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("No RapidAPI key configured, skipping cost of living");
            return Ok(None);
        };

        let key = format!("cost_of_living:{}", city.storage_key());
        if let Some(cache) = &self.cache
            && let Some(cached) = cache.get::<CostOfLivingObservation>(&key).await?
        {
            return Ok(Some(cached));
        }

        for slug in place_slugs(city) {
            match self.fetch_place(api_key, &slug).await {
                Ok(Some(body)) => {
                    let observation = parse_places_to_live(&body, Utc::now().date_naive());
                    if let Some(cache) = &self.cache {
                        cache.put_default(&key, observation.clone()).await?;
                    }
                    return Ok(Some(observation));
                }
                Ok(None) => debug!(slug, "Place not known"),
                Err(err) => warn!(slug, error = %err, "Place lookup failed"),
            }
        }
        Ok(None)
    }
}

/// Number from a JSON value; strings like "$1,250" are accepted
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect::<String>()
            .parse()
            .ok(),
        _ => None,
    }
}

/// Report-card grade on a 1–5 scale; letters map A+ = 5 down to F = 1
fn grade_points(value: &Value) -> Option<f64> {
    if let Some(letter) = value.as_str() {
        let points = match letter.trim().to_uppercase().as_str() {
            "A+" => 5.0,
            "A" => 4.67,
            "A-" => 4.33,
            "B+" => 4.0,
            "B" => 3.67,
            "B-" => 3.33,
            "C+" => 3.0,
            "C" => 2.67,
            "C-" => 2.33,
            "D+" => 2.0,
            "D" => 1.67,
            "D-" => 1.33,
            "F" => 1.0,
            _ => return numeric(value),
        };
        return Some(points);
    }
    numeric(value)
}

/// `data[section][entry][field]`
fn field<'a>(data: &'a Value, section: &str, entry: &str, name: &str) -> Option<&'a Value> {
    data.get(section)?.get(entry)?.get(name)
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

#[must_use]
pub fn parse_places_to_live(data: &Value, today: NaiveDate) -> CostOfLivingObservation {
    let number = |section: &str, entry: &str, name: &str| {
        field(data, section, entry, name).and_then(numeric)
    };

    let home = positive(number("real-estate", "Median Home Value", "value"));
    let home_national = positive(number("real-estate", "Median Home Value", "national"));
    let rent = positive(number("real-estate", "Median Rent", "value"));
    let rent_national = positive(number("real-estate", "Median Rent", "national"));
    let income = positive(number("working-in", "Median Household Income", "value"));
    let population = number("about", "Population", "value")
        .filter(|p| *p > 0.0)
        .map(|p| p.round() as u64);

    let rent_index = rent.map(|r| r / rent_national.unwrap_or(1.0).max(1.0) * 100.0);

    let cost_of_living_index = match (home, home_national) {
        (Some(home), Some(national)) => {
            let home_ratio = home / national;
            let rent_ratio = rent.unwrap_or(0.0) / rent_national.unwrap_or(1.0).max(1.0);
            (home_ratio + rent_ratio) / 2.0 * 100.0
        }
        _ => {
            let grade = field(data, "report-card", "Cost of Living", "value")
                .and_then(grade_points)
                .unwrap_or(DEFAULT_GRADE);
            ((5.0 - grade) * 40.0 + 60.0).clamp(20.0, 200.0)
        }
    };

    CostOfLivingObservation {
        record: CostOfLivingRecord {
            cost_of_living_index,
            rent_index,
            cost_of_living_plus_rent_index: None,
            median_home_value: home,
            median_rent: rent,
            median_household_income: income,
            source: SOURCE.to_string(),
            data_date: today,
        },
        population,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
    }

    #[test]
    fn test_slug_formats() {
        let slugs = place_slugs(&CityKey::new("New York", "United States"));
        assert_eq!(
            slugs,
            vec!["new-york-united-states", "new york-united states", "new-york"]
        );

        // Single-word names collapse the duplicate format
        let slugs = place_slugs(&CityKey::new("Berlin", "Germany"));
        assert_eq!(slugs, vec!["berlin-germany", "berlin"]);
    }

    #[test]
    fn test_index_from_real_estate() {
        let data = json!({
            "real-estate": {
                "Median Home Value": {"value": "$500,000", "national": "$250,000"},
                "Median Rent": {"value": 1500, "national": 1000}
            },
            "working-in": {"Median Household Income": {"value": "$80,000"}},
            "about": {"Population": {"value": "1,234,567"}}
        });
        let observation = parse_places_to_live(&data, today());
        let record = &observation.record;

        assert_abs_diff_eq!(record.cost_of_living_index, 175.0, epsilon = 1e-9);
        assert_abs_diff_eq!(record.rent_index.unwrap(), 150.0, epsilon = 1e-9);
        assert_eq!(record.median_household_income, Some(80_000.0));
        assert_eq!(observation.population, Some(1_234_567));
        assert_eq!(record.data_date, today());
    }

    #[test]
    fn test_grade_fallback() {
        let data = json!({"report-card": {"Cost of Living": {"value": "A+"}}});
        let record = parse_places_to_live(&data, today()).record;
        assert_abs_diff_eq!(record.cost_of_living_index, 60.0, epsilon = 1e-9);

        let data = json!({"report-card": {"Cost of Living": {"value": 1}}});
        let record = parse_places_to_live(&data, today()).record;
        assert_abs_diff_eq!(record.cost_of_living_index, 200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_response_uses_default_grade() {
        let record = parse_places_to_live(&json!({}), today()).record;
        assert_abs_diff_eq!(record.cost_of_living_index, 140.0, epsilon = 1e-9);
        assert!(record.rent_index.is_none());
        assert!(record.median_home_value.is_none());
    }

    #[test]
    fn test_numeric_parsing() {
        assert_eq!(numeric(&json!("$1,250")), Some(1250.0));
        assert_eq!(numeric(&json!(3.5)), Some(3.5));
        assert_eq!(numeric(&json!("n/a")), None);
        assert_eq!(grade_points(&json!("b-")), Some(3.33));
    }
}
