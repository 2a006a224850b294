//! Conversion of AQI values reported under national scales to the EPA scale
//!
//! These are coarse piecewise approximations; they are only used when a provider
//! hands us an index without the underlying concentrations.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::breakpoints::MAX_AQI;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AqiStandard {
    Epa,
    China,
    India,
    Eu,
}

impl FromStr for AqiStandard {
    type Err = std::convert::Infallible;

    /// Unknown names are treated as EPA-like
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "china" | "cn" => AqiStandard::China,
            "india" | "in" => AqiStandard::India,
            "eu" | "european" => AqiStandard::Eu,
            _ => AqiStandard::Epa,
        })
    }
}

impl AqiStandard {
    /// Convert an index on this scale to the EPA scale
    #[must_use]
    pub fn to_epa(self, aqi: f64) -> f64 {
        match self {
            AqiStandard::Epa => aqi,
            AqiStandard::China => {
                // China is more lenient in the moderate band
                if aqi <= 50.0 {
                    aqi
                } else if aqi <= 100.0 {
                    50.0 + (aqi - 50.0) * 1.4
                } else if aqi <= 200.0 {
                    100.0 + (aqi - 100.0)
                } else {
                    (200.0 + (aqi - 200.0) * 0.8).min(MAX_AQI)
                }
            }
            AqiStandard::India => {
                if aqi <= 100.0 {
                    aqi
                } else if aqi <= 200.0 {
                    100.0 + (aqi - 100.0) * 0.9
                } else {
                    (180.0 + (aqi - 200.0) * 0.7).min(MAX_AQI)
                }
            }
            AqiStandard::Eu => {
                if aqi <= 50.0 {
                    aqi * 1.2
                } else if aqi <= 100.0 {
                    50.0 + (aqi - 50.0) * 1.5
                } else {
                    (125.0 + (aqi - 100.0)).min(MAX_AQI)
                }
            }
        }
    }
}

/// Normalize an AQI reported under `standard` (e.g. "cn", "india", "eu") to EPA
#[must_use]
pub fn normalize_existing_aqi(aqi: f64, standard: &str) -> f64 {
    // FromStr for AqiStandard is infallible
    let standard = standard.parse::<AqiStandard>().unwrap_or(AqiStandard::Epa);
    standard.to_epa(aqi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standards() {
        assert_eq!("CN".parse::<AqiStandard>().unwrap(), AqiStandard::China);
        assert_eq!("european".parse::<AqiStandard>().unwrap(), AqiStandard::Eu);
        assert_eq!("mars".parse::<AqiStandard>().unwrap(), AqiStandard::Epa);
    }

    #[test]
    fn test_epa_passthrough() {
        assert_eq!(normalize_existing_aqi(87.0, "us"), 87.0);
        assert_eq!(normalize_existing_aqi(87.0, "unknown"), 87.0);
    }

    #[test]
    fn test_china_conversion() {
        assert_eq!(normalize_existing_aqi(100.0, "china"), 120.0);
        assert_eq!(normalize_existing_aqi(150.0, "cn"), 150.0);
        assert_eq!(normalize_existing_aqi(700.0, "cn"), 500.0);
    }

    #[test]
    fn test_eu_and_india_conversion() {
        assert_eq!(normalize_existing_aqi(50.0, "eu"), 60.0);
        assert_eq!(normalize_existing_aqi(100.0, "eu"), 125.0);
        assert_eq!(normalize_existing_aqi(200.0, "india"), 190.0);
    }
}
