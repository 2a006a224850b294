//! City identity and geographic coordinates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic coordinates in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another point in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            haversine::Location {
                latitude: other.latitude,
                longitude: other.longitude,
            },
            haversine::Units::Kilometers,
        )
    }

    /// Longitude/latitude pair in the order globe layers expect
    #[must_use]
    pub fn position(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Identity of a city: unique by (name, country), compared case-insensitively
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CityKey {
    /// City name as displayed, e.g. "São Paulo"
    pub name: String,
    /// Country name, e.g. "Brazil"
    pub country: String,
}

impl CityKey {
    #[must_use]
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }

    /// Parse a "City, Country" label; the country part is optional
    #[must_use]
    pub fn parse(label: &str) -> (String, Option<String>) {
        match label.split_once(", ") {
            Some((name, country)) => (name.trim().to_string(), Some(country.trim().to_string())),
            None => (label.trim().to_string(), None),
        }
    }

    /// Storage key, lowercased so lookups ignore case
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!(
            "{}|{}",
            self.name.trim().to_lowercase(),
            self.country.trim().to_lowercase()
        )
    }

    /// Display label "City, Country"
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

impl PartialEq for CityKey {
    fn eq(&self, other: &Self) -> bool {
        self.storage_key() == other.storage_key()
    }
}

impl Eq for CityKey {}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.name, self.country)
    }
}
