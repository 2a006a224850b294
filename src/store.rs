//! Reference-data store for cities and their latest measurements
//!
//! One fjall database with a keyspace per source. Values are postcard-encoded
//! and all fjall calls run on the blocking pool.

use chrono::{DateTime, Utc};
use fjall::Keyspace;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task;
use tracing::{debug, instrument};

use crate::models::{
    AirQualityRecord, City, CityAnalysis, CityKey, CityRecord, CostOfLivingRecord,
    LifeExpectancyRecord,
};
use crate::{LifeCostError, Result};

const CITY_INDEX: &str = "city_index";
const LAST_REFRESH: &str = "last_refresh";

/// Life expectancy by year for one country
type YearSeries = BTreeMap<i32, LifeExpectancyRecord>;

#[derive(Clone)]
pub struct CityStore {
    cities: Keyspace,
    air_quality: Keyspace,
    cost_of_living: Keyspace,
    life_expectancy: Keyspace,
    meta: Keyspace,
    write_lock: Arc<Mutex<()>>,
}

fn read<T: DeserializeOwned>(keyspace: &Keyspace, key: &str) -> Result<Option<T>> {
    match keyspace.get(key.as_bytes())? {
        Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

fn write<T: Serialize>(keyspace: &Keyspace, key: &str, value: &T) -> Result<()> {
    let bytes = postcard::to_stdvec(value)?;
    keyspace.insert(key.as_bytes().to_vec(), bytes)?;
    Ok(())
}

fn country_key(country: &str) -> String {
    country.trim().to_lowercase()
}

impl CityStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let keyspace = |name: &str| db.keyspace(name, fjall::KeyspaceCreateOptions::default);
        Ok(CityStore {
            cities: keyspace("cities")?,
            air_quality: keyspace("air_quality")?,
            cost_of_living: keyspace("cost_of_living")?,
            life_expectancy: keyspace("life_expectancy")?,
            meta: keyspace("meta")?,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Run a closure against a clone of the store on the blocking pool
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(CityStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        task::spawn_blocking(move || f(store)).await?
    }

    /// Insert a city or update its coordinates and population
    #[instrument(level = "debug", skip(self, city), fields(city = %city.key))]
    pub async fn upsert_city(&self, city: City) -> Result<()> {
        self.blocking(move |store| {
            let _guard = store.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            let key = city.key.storage_key();
            write(&store.cities, &key, &city)?;

            let mut index: Vec<String> = read(&store.meta, CITY_INDEX)?.unwrap_or_default();
            if !index.contains(&key) {
                index.push(key);
                write(&store.meta, CITY_INDEX, &index)?;
            }
            Ok(())
        })
        .await
    }

    /// Replace the air-quality record of a stored city
    pub async fn put_air_quality(&self, key: &CityKey, record: AirQualityRecord) -> Result<()> {
        self.put_for_city(key, record, |store| &store.air_quality).await
    }

    /// Replace the cost-of-living record of a stored city
    pub async fn put_cost_of_living(
        &self,
        key: &CityKey,
        record: CostOfLivingRecord,
    ) -> Result<()> {
        self.put_for_city(key, record, |store| &store.cost_of_living).await
    }

    async fn put_for_city<T>(
        &self,
        key: &CityKey,
        record: T,
        keyspace: fn(&CityStore) -> &Keyspace,
    ) -> Result<()>
    where
        T: Serialize + Send + 'static,
    {
        let key = key.clone();
        self.blocking(move |store| {
            let storage_key = key.storage_key();
            if read::<City>(&store.cities, &storage_key)?.is_none() {
                return Err(LifeCostError::not_found(format!("City not found: {key}")));
            }
            write(keyspace(&store), &storage_key, &record)
        })
        .await
    }

    /// Insert or replace the life expectancy for a (country, year)
    #[instrument(
        level = "debug",
        skip(self, record),
        fields(country = %record.country, year = record.year)
    )]
    pub async fn put_life_expectancy(&self, record: LifeExpectancyRecord) -> Result<()> {
        self.blocking(move |store| {
            let _guard = store.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            let key = country_key(&record.country);
            let mut series: YearSeries = read(&store.life_expectancy, &key)?.unwrap_or_default();
            series.insert(record.year, record);
            write(&store.life_expectancy, &key, &series)
        })
        .await
    }

    pub async fn latest_life_expectancy(
        &self,
        country: &str,
    ) -> Result<Option<LifeExpectancyRecord>> {
        let key = country_key(country);
        self.blocking(move |store| store.latest_life_expectancy_blocking(&key)).await
    }

    fn latest_life_expectancy_blocking(
        &self,
        country_key: &str,
    ) -> Result<Option<LifeExpectancyRecord>> {
        let series: Option<YearSeries> = read(&self.life_expectancy, country_key)?;
        Ok(series.and_then(|s| s.into_values().next_back()))
    }

    pub async fn city(&self, key: &CityKey) -> Result<Option<City>> {
        let key = key.storage_key();
        self.blocking(move |store| read(&store.cities, &key)).await
    }

    pub async fn air_quality(&self, key: &CityKey) -> Result<Option<AirQualityRecord>> {
        let key = key.storage_key();
        self.blocking(move |store| read(&store.air_quality, &key)).await
    }

    pub async fn cost_of_living(&self, key: &CityKey) -> Result<Option<CostOfLivingRecord>> {
        let key = key.storage_key();
        self.blocking(move |store| read(&store.cost_of_living, &key)).await
    }

    /// All stored cities, sorted by name
    pub async fn cities(&self) -> Result<Vec<City>> {
        self.blocking(|store| store.cities_blocking()).await
    }

    fn cities_blocking(&self) -> Result<Vec<City>> {
        let index: Vec<String> = read(&self.meta, CITY_INDEX)?.unwrap_or_default();
        let mut cities = Vec::with_capacity(index.len());
        for key in &index {
            if let Some(city) = read::<City>(&self.cities, key)? {
                cities.push(city);
            }
        }
        cities.sort_by(|a, b| {
            a.key
                .name
                .to_lowercase()
                .cmp(&b.key.name.to_lowercase())
                .then_with(|| a.key.country.cmp(&b.key.country))
        });
        Ok(cities)
    }

    fn analysis_for(&self, city: City) -> Result<CityAnalysis> {
        let key = city.key.storage_key();
        let air: Option<AirQualityRecord> = read(&self.air_quality, &key)?;
        let cost: Option<CostOfLivingRecord> = read(&self.cost_of_living, &key)?;
        let life = self.latest_life_expectancy_blocking(&country_key(&city.key.country))?;

        Ok(CityAnalysis {
            key: city.key,
            coordinates: city.coordinates,
            population: city.population,
            pm25_concentration: air
                .as_ref()
                .and_then(|a| a.sample.get(crate::models::Pollutant::Pm25)),
            standardized_aqi: air.as_ref().and_then(|a| a.standardized_aqi),
            cost_of_living_index: cost.as_ref().map(|c| c.cost_of_living_index),
            rent_index: cost.as_ref().and_then(|c| c.rent_index),
            life_expectancy: life.map(|l| l.life_expectancy),
            air_quality_date: air.map(|a| a.measured_at),
            cost_data_date: cost.map(|c| c.data_date),
        })
    }

    /// Joined view of every city with its latest data, sorted by name
    #[instrument(level = "debug", skip(self))]
    pub async fn analysis(&self) -> Result<Vec<CityAnalysis>> {
        self.blocking(|store| {
            let rows = store
                .cities_blocking()?
                .into_iter()
                .map(|city| store.analysis_for(city))
                .collect::<Result<Vec<_>>>()?;
            debug!(rows = rows.len(), "loaded city analysis");
            Ok(rows)
        })
        .await
    }

    /// Cities with AQI, cost and life expectancy all present
    pub async fn records(&self) -> Result<Vec<CityRecord>> {
        Ok(self
            .analysis()
            .await?
            .iter()
            .filter_map(CityAnalysis::to_record)
            .collect())
    }

    /// Look up a city by "City, Country" or just "City", ignoring case
    pub async fn find(&self, query: &str) -> Result<CityAnalysis> {
        let (name, country) = CityKey::parse(query);
        if name.is_empty() {
            return Err(LifeCostError::validation("City name must not be empty"));
        }
        let query = query.to_string();

        self.blocking(move |store| {
            let city = match country {
                Some(country) => {
                    read::<City>(&store.cities, &CityKey::new(&name, country).storage_key())?
                }
                None => {
                    let name = name.to_lowercase();
                    store
                        .cities_blocking()?
                        .into_iter()
                        .find(|c| c.key.name.to_lowercase() == name)
                }
            };
            match city {
                Some(city) => store.analysis_for(city),
                None => Err(LifeCostError::not_found(format!("City not found: {query}"))),
            }
        })
        .await
    }

    /// Complete record for a city, or an error explaining why it can't be compared
    pub async fn find_record(&self, query: &str) -> Result<CityRecord> {
        let analysis = self.find(query).await?;
        analysis.to_record().ok_or_else(|| {
            LifeCostError::validation(format!(
                "{} is missing air quality, cost of living or life expectancy data",
                analysis.key
            ))
        })
    }

    pub async fn mark_refreshed(&self, at: DateTime<Utc>) -> Result<()> {
        self.blocking(move |store| write(&store.meta, LAST_REFRESH, &at)).await
    }

    pub async fn last_refresh(&self) -> Result<Option<DateTime<Utc>>> {
        self.blocking(|store| read(&store.meta, LAST_REFRESH)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, Pollutant, PollutantSample};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> CityStore {
        CityStore::open(dir.path().join("store")).unwrap()
    }

    fn city(name: &str, country: &str, lat: f64, lon: f64) -> City {
        City {
            key: CityKey::new(name, country),
            coordinates: Coordinates::new(lat, lon),
            population: None,
            updated_at: Utc::now(),
        }
    }

    fn air(aqi: f64, pm25: f64) -> AirQualityRecord {
        AirQualityRecord {
            sample: PollutantSample::new().with(Pollutant::Pm25, Some(pm25)),
            raw_aqi: None,
            standardized_aqi: Some(aqi),
            source: "test".into(),
            measured_at: Utc::now(),
        }
    }

    fn cost(index: f64) -> CostOfLivingRecord {
        CostOfLivingRecord {
            cost_of_living_index: index,
            rent_index: Some(index * 1.2),
            cost_of_living_plus_rent_index: None,
            median_home_value: None,
            median_rent: None,
            median_household_income: None,
            source: "test".into(),
            data_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        }
    }

    fn life(country: &str, years: f64, year: i32) -> LifeExpectancyRecord {
        LifeExpectancyRecord {
            country: country.into(),
            country_code: None,
            life_expectancy: years,
            year,
            source: "test".into(),
        }
    }

    #[tokio::test]
    async fn test_upsert_city_updates_in_place() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        store.upsert_city(city("Berlin", "Germany", 0.0, 0.0)).await.unwrap();
        store
            .upsert_city(city("berlin", "GERMANY", 52.52, 13.405))
            .await
            .unwrap();

        let cities = store.cities().await.unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].coordinates.latitude, 52.52);
    }

    #[tokio::test]
    async fn test_measurements_need_a_city() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        let err = store
            .put_air_quality(&CityKey::new("Atlantis", "Nowhere"), air(40.0, 9.0))
            .await
            .unwrap_err();
        assert!(matches!(err, LifeCostError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_analysis_joins_latest_data() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let key = CityKey::new("Delhi", "India");

        store.upsert_city(city("Delhi", "India", 28.61, 77.21)).await.unwrap();
        store.upsert_city(city("Agra", "India", 27.18, 78.01)).await.unwrap();
        store.put_air_quality(&key, air(100.0, 20.0)).await.unwrap();
        store.put_air_quality(&key, air(168.0, 89.0)).await.unwrap();
        store.put_cost_of_living(&key, cost(25.0)).await.unwrap();
        store.put_life_expectancy(life("India", 69.0, 2020)).await.unwrap();
        store.put_life_expectancy(life("india", 69.7, 2022)).await.unwrap();
        store.put_life_expectancy(life("India", 69.4, 2021)).await.unwrap();

        let rows = store.analysis().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key.name, "Agra");
        assert_eq!(rows[0].standardized_aqi, None);

        let delhi = &rows[1];
        assert_eq!(delhi.standardized_aqi, Some(168.0));
        assert_eq!(delhi.pm25_concentration, Some(89.0));
        assert_eq!(delhi.life_expectancy, Some(69.7));

        let records = store.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, key);
    }

    #[tokio::test]
    async fn test_find_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store
            .upsert_city(city("São Paulo", "Brazil", -23.55, -46.63))
            .await
            .unwrap();

        assert_eq!(
            store.find("são paulo, brazil").await.unwrap().key.name,
            "São Paulo"
        );
        assert_eq!(store.find("SÃO PAULO").await.unwrap().key.country, "Brazil");

        let err = store.find("Atlantis, Nowhere").await.unwrap_err();
        assert!(matches!(err, LifeCostError::NotFound { .. }));

        let incomplete = store.find_record("São Paulo, Brazil").await.unwrap_err();
        assert!(matches!(incomplete, LifeCostError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_last_refresh_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        assert!(store.last_refresh().await.unwrap().is_none());

        let now = Utc::now();
        store.mark_refreshed(now).await.unwrap();
        assert_eq!(store.last_refresh().await.unwrap(), Some(now));
    }
}
