//! PM2.5 exposure and its effect on life expectancy

use crate::aqi::AqiNormalizer;
use crate::models::CityRecord;

/// Years of life expectancy lost per µg/m³ of long-term PM2.5 exposure (AQLI)
pub const BETA: f64 = 0.1;

/// Concentration above which additional exposure has diminishing marginal harm
pub const TAPER_THRESHOLD: f64 = 55.4;

/// Exposure transform: identity up to the threshold, logarithmic taper above
#[must_use]
pub fn effective_exposure(pm25: f64) -> f64 {
    let k = TAPER_THRESHOLD;
    if pm25 <= k {
        pm25
    } else {
        k + k * (1.0 + (pm25 - k) / k).ln()
    }
}

/// Years gained (+) or lost (−) moving from `origin_pm25` to `destination_pm25`
#[must_use]
pub fn air_quality_life_impact(origin_pm25: f64, destination_pm25: f64) -> f64 {
    -BETA * (effective_exposure(destination_pm25) - effective_exposure(origin_pm25))
}

/// PM2.5 concentrations used for a comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pm25Pair {
    pub origin: f64,
    pub destination: f64,
    /// True when the values were derived from AQI rather than measured
    pub estimated: bool,
}

impl Pm25Pair {
    /// Measured values are only used when both cities have one, so that both
    /// sides of the difference come from the same kind of source.
    #[must_use]
    pub fn resolve(origin: &CityRecord, destination: &CityRecord) -> Self {
        let measured = |r: &CityRecord| r.pm25_concentration.filter(|c| *c > 0.0);
        match (measured(origin), measured(destination)) {
            (Some(o), Some(d)) => Self {
                origin: o,
                destination: d,
                estimated: false,
            },
            _ => Self {
                origin: AqiNormalizer::estimate_pm25(origin.standardized_aqi),
                destination: AqiNormalizer::estimate_pm25(destination.standardized_aqi),
                estimated: true,
            },
        }
    }

    #[must_use]
    pub fn reaches_taper(&self) -> bool {
        self.origin > TAPER_THRESHOLD || self.destination > TAPER_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CityKey, Coordinates};
    use approx::assert_abs_diff_eq;

    fn record(aqi: f64, pm25: Option<f64>) -> CityRecord {
        CityRecord {
            key: CityKey::new("Test", "Land"),
            coordinates: Coordinates::new(0.0, 0.0),
            cost_of_living_index: 100.0,
            standardized_aqi: aqi,
            life_expectancy: 75.0,
            pm25_concentration: pm25,
        }
    }

    #[test]
    fn test_exposure_is_linear_below_threshold() {
        assert_eq!(effective_exposure(0.0), 0.0);
        assert_eq!(effective_exposure(30.0), 30.0);
        assert_eq!(effective_exposure(TAPER_THRESHOLD), TAPER_THRESHOLD);
    }

    #[test]
    fn test_exposure_tapers_above_threshold() {
        let at_100 = effective_exposure(100.0);
        let at_150 = effective_exposure(150.0);
        let at_200 = effective_exposure(200.0);
        assert!(at_100 < 100.0 && at_100 > TAPER_THRESHOLD);
        // Equal 50 µg/m³ steps: still rising, each by less than the last
        assert!(at_200 > at_150 && at_150 > at_100);
        assert!(at_200 - at_150 < at_150 - at_100);
        assert!(at_150 - at_100 < 50.0);
    }

    #[test]
    fn test_impact_is_antisymmetric() {
        let forward = air_quality_life_impact(12.0, 80.0);
        let backward = air_quality_life_impact(80.0, 12.0);
        assert_abs_diff_eq!(forward, -backward, epsilon = 1e-12);
        assert!(forward < 0.0);
    }

    #[test]
    fn test_linear_region_uses_beta() {
        assert_abs_diff_eq!(air_quality_life_impact(12.0, 22.0), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_measured_values_need_both_cities() {
        let both = Pm25Pair::resolve(&record(50.0, Some(10.0)), &record(80.0, Some(25.0)));
        assert!(!both.estimated);
        assert_eq!(both.origin, 10.0);
        assert_eq!(both.destination, 25.0);

        let one = Pm25Pair::resolve(&record(50.0, Some(10.0)), &record(150.0, None));
        assert!(one.estimated);
        assert_abs_diff_eq!(one.origin, 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(one.destination, 55.4, epsilon = 1e-9);

        let zero = Pm25Pair::resolve(&record(50.0, Some(0.0)), &record(50.0, Some(9.0)));
        assert!(zero.estimated);
    }
}
