//! Cities collected by a full ETL run

use chrono::Utc;

use crate::models::{City, CityKey, Coordinates};

pub struct CitySeed {
    pub name: &'static str,
    pub country: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl CitySeed {
    #[must_use]
    pub fn key(&self) -> CityKey {
        CityKey::new(self.name, self.country)
    }

    #[must_use]
    pub fn to_city(&self) -> City {
        City {
            key: self.key(),
            coordinates: Coordinates::new(self.latitude, self.longitude),
            population: None,
            updated_at: Utc::now(),
        }
    }
}

const fn seed(name: &'static str, country: &'static str, latitude: f64, longitude: f64) -> CitySeed {
    CitySeed {
        name,
        country,
        latitude,
        longitude,
    }
}

pub const MAJOR_CITIES: [CitySeed; 35] = [
    seed("New York", "United States", 40.7128, -74.0060),
    seed("Los Angeles", "United States", 34.0522, -118.2437),
    seed("London", "United Kingdom", 51.5074, -0.1278),
    seed("Paris", "France", 48.8566, 2.3522),
    seed("Tokyo", "Japan", 35.6762, 139.6503),
    seed("Singapore", "Singapore", 1.3521, 103.8198),
    seed("Sydney", "Australia", -33.8688, 151.2093),
    seed("Toronto", "Canada", 43.6532, -79.3832),
    seed("Vancouver", "Canada", 49.2827, -123.1207),
    seed("Berlin", "Germany", 52.5200, 13.4050),
    seed("Amsterdam", "Netherlands", 52.3676, 4.9041),
    seed("Stockholm", "Sweden", 59.3293, 18.0686),
    seed("Copenhagen", "Denmark", 55.6761, 12.5683),
    seed("Zurich", "Switzerland", 47.3769, 8.5417),
    seed("Vienna", "Austria", 48.2082, 16.3738),
    seed("Madrid", "Spain", 40.4168, -3.7038),
    seed("Rome", "Italy", 41.9028, 12.4964),
    seed("Seoul", "South Korea", 37.5665, 126.9780),
    seed("Hong Kong", "Hong Kong", 22.3193, 114.1694),
    seed("Shanghai", "China", 31.2304, 121.4737),
    seed("Beijing", "China", 39.9042, 116.4074),
    seed("Mumbai", "India", 19.0760, 72.8777),
    seed("Delhi", "India", 28.7041, 77.1025),
    seed("São Paulo", "Brazil", -23.5505, -46.6333),
    seed("Mexico City", "Mexico", 19.4326, -99.1332),
    seed("Dubai", "United Arab Emirates", 25.2048, 55.2708),
    seed("Tel Aviv", "Israel", 32.0853, 34.7818),
    seed("Bangkok", "Thailand", 13.7563, 100.5018),
    seed("Kuala Lumpur", "Malaysia", 3.1390, 101.6869),
    seed("Jakarta", "Indonesia", -6.2088, 106.8456),
    seed("Manila", "Philippines", 14.5995, 120.9842),
    seed("Kelowna", "Canada", 49.8880, -119.4960),
    seed("Calgary", "Canada", 51.0447, -114.0719),
    seed("Montreal", "Canada", 45.5017, -73.5673),
    seed("Ottawa", "Canada", 45.4215, -75.6972),
];

/// Distinct countries in first-seen order
#[must_use]
pub fn distinct_countries<'a>(countries: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for country in countries {
        if !seen.iter().any(|c| c.eq_ignore_ascii_case(country)) {
            seen.push(country);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_cities_are_unique() {
        for (i, a) in MAJOR_CITIES.iter().enumerate() {
            for b in &MAJOR_CITIES[i + 1..] {
                assert_ne!(a.key(), b.key());
            }
        }
    }

    #[test]
    fn test_distinct_countries() {
        let countries = distinct_countries(MAJOR_CITIES.iter().map(|c| c.country));
        assert_eq!(countries[0], "United States");
        assert_eq!(countries.iter().filter(|c| **c == "Canada").count(), 1);
        assert_eq!(countries.len(), 27);
    }
}
