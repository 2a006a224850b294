//! AQI categories, colours and health messages

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPA AQI category
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    #[must_use]
    pub fn from_aqi(aqi: f64) -> Self {
        match aqi {
            a if a <= 50.0 => AqiCategory::Good,
            a if a <= 100.0 => AqiCategory::Moderate,
            a if a <= 150.0 => AqiCategory::UnhealthyForSensitiveGroups,
            a if a <= 200.0 => AqiCategory::Unhealthy,
            a if a <= 300.0 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    #[must_use]
    pub fn health_message(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Air quality is satisfactory for most people",
            AqiCategory::Moderate => {
                "Acceptable for most, but sensitive people may experience minor issues"
            }
            AqiCategory::UnhealthyForSensitiveGroups => {
                "Sensitive people should reduce outdoor activities"
            }
            AqiCategory::Unhealthy => "Everyone may experience health effects",
            AqiCategory::VeryUnhealthy => {
                "Health alert: everyone may experience serious health effects"
            }
            AqiCategory::Hazardous => {
                "Emergency conditions: entire population likely to be affected"
            }
        }
    }

    /// RGBA fill colour for globe columns
    #[must_use]
    pub fn color(&self) -> [u8; 4] {
        match self {
            AqiCategory::Good => [0, 255, 0, 160],
            AqiCategory::Moderate => [255, 255, 0, 160],
            AqiCategory::UnhealthyForSensitiveGroups => [255, 165, 0, 160],
            AqiCategory::Unhealthy => [255, 0, 0, 160],
            AqiCategory::VeryUnhealthy => [128, 0, 128, 160],
            AqiCategory::Hazardous => [128, 0, 0, 160],
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Health impact score on a 10–100 scale
#[must_use]
pub fn health_impact_score(aqi: f64) -> f64 {
    if aqi <= 50.0 {
        10.0
    } else if aqi <= 100.0 {
        10.0 + (aqi - 50.0) * 0.6
    } else if aqi <= 150.0 {
        40.0 + (aqi - 100.0) * 0.8
    } else if aqi <= 200.0 {
        80.0 + (aqi - 150.0) * 0.4
    } else {
        100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_boundaries() {
        assert_eq!(AqiCategory::from_aqi(0.0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(50.0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(50.1), AqiCategory::Moderate);
        assert_eq!(
            AqiCategory::from_aqi(150.0),
            AqiCategory::UnhealthyForSensitiveGroups
        );
        assert_eq!(AqiCategory::from_aqi(300.0), AqiCategory::VeryUnhealthy);
        assert_eq!(AqiCategory::from_aqi(301.0), AqiCategory::Hazardous);
    }

    #[test]
    fn test_health_impact_score_is_continuous() {
        assert_eq!(health_impact_score(50.0), 10.0);
        assert_eq!(health_impact_score(100.0), 40.0);
        assert_eq!(health_impact_score(150.0), 80.0);
        assert_eq!(health_impact_score(200.0), 100.0);
        assert_eq!(health_impact_score(450.0), 100.0);
    }

    #[test]
    fn test_colors() {
        assert_eq!(AqiCategory::Good.color(), [0, 255, 0, 160]);
        assert_eq!(AqiCategory::from_aqi(180.0).color(), [255, 0, 0, 160]);
    }
}
