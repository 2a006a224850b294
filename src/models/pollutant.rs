//! Pollutant readings as delivered by air-quality providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::LifeCostError;

/// Pollutants with a published EPA breakpoint table
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    So2,
    Co,
    O3,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Co,
        Pollutant::O3,
    ];

    /// Short lowercase name used in provider payloads
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::No2 => "no2",
            Pollutant::So2 => "so2",
            Pollutant::Co => "co",
            Pollutant::O3 => "o3",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pollutant {
    type Err = LifeCostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['.', '_'], "").as_str() {
            "pm25" => Ok(Pollutant::Pm25),
            "pm10" => Ok(Pollutant::Pm10),
            "no2" => Ok(Pollutant::No2),
            "so2" => Ok(Pollutant::So2),
            "co" => Ok(Pollutant::Co),
            "o3" => Ok(Pollutant::O3),
            other => Err(LifeCostError::validation(format!(
                "Unrecognized pollutant '{other}'"
            ))),
        }
    }
}

/// A single measurement for one city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PollutantReading {
    pub pollutant: Pollutant,
    /// Concentration in µg/m³
    pub concentration: f64,
    /// "City, Country" label of the measuring city
    pub city: String,
    pub timestamp: DateTime<Utc>,
}

/// Concentrations (µg/m³) of every pollutant measured for one city.
///
/// Pollutants that the provider did not report are simply absent.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PollutantSample {
    concentrations: BTreeMap<Pollutant, f64>,
}

impl PollutantSample {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; `None` values are ignored
    #[must_use]
    pub fn with(mut self, pollutant: Pollutant, concentration: Option<f64>) -> Self {
        if let Some(value) = concentration {
            self.concentrations.insert(pollutant, value);
        }
        self
    }

    pub fn insert(&mut self, pollutant: Pollutant, concentration: f64) {
        self.concentrations.insert(pollutant, concentration);
    }

    #[must_use]
    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        self.concentrations.get(&pollutant).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, f64)> + '_ {
        self.concentrations.iter().map(|(p, c)| (*p, *c))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.concentrations.is_empty()
    }

    /// Collect readings into a sample, keeping the most recent value per pollutant.
    /// Readings with equal timestamps resolve to the later one in the slice.
    #[must_use]
    pub fn from_readings(readings: &[PollutantReading]) -> Self {
        let mut latest: BTreeMap<Pollutant, &PollutantReading> = BTreeMap::new();
        for reading in readings {
            match latest.get(&reading.pollutant) {
                Some(seen) if seen.timestamp > reading.timestamp => {}
                _ => {
                    latest.insert(reading.pollutant, reading);
                }
            }
        }
        Self {
            concentrations: latest
                .into_iter()
                .map(|(pollutant, reading)| (pollutant, reading.concentration))
                .collect(),
        }
    }
}
