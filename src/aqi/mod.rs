//! AQI normalization
//!
//! Converts raw pollutant concentrations into the EPA Air Quality Index using
//! the published piecewise-linear breakpoint tables. A city's standardized AQI
//! is the worst sub-index across the pollutants that were measured.

pub mod breakpoints;
pub mod category;
pub mod standards;

pub use breakpoints::{Breakpoint, MAX_AQI};
pub use category::{AqiCategory, health_impact_score};
pub use standards::{AqiStandard, normalize_existing_aqi};

use tracing::trace;

use crate::models::{Pollutant, PollutantSample};

/// Stateless EPA AQI normalizer
pub struct AqiNormalizer;

impl AqiNormalizer {
    /// Sub-index for a concentration in µg/m³
    #[must_use]
    pub fn sub_index(pollutant: Pollutant, concentration_ugm3: f64) -> Option<f64> {
        let native = concentration_ugm3 * breakpoints::unit_factor(pollutant);
        Self::sub_index_native(pollutant, native)
    }

    /// Sub-index for a concentration already in the table's unit (ppb/ppm for gases)
    #[must_use]
    pub fn sub_index_native(pollutant: Pollutant, concentration: f64) -> Option<f64> {
        breakpoints::interpolate(breakpoints::table(pollutant), concentration)
    }

    /// Standardized AQI: the maximum sub-index over the pollutants present.
    ///
    /// Returns `None` when no pollutant produced a sub-index; such a city has no
    /// AQI and must be left out of comparisons and the globe.
    #[must_use]
    pub fn standardized_aqi(sample: &PollutantSample) -> Option<f64> {
        sample
            .iter()
            .filter_map(|(pollutant, concentration)| {
                let index = Self::sub_index(pollutant, concentration);
                trace!(%pollutant, concentration, ?index, "sub-index");
                index
            })
            .fold(None, |worst: Option<f64>, index| {
                Some(worst.map_or(index, |w| w.max(index)))
            })
    }

    /// The pollutant that determines the standardized AQI
    #[must_use]
    pub fn dominant_pollutant(sample: &PollutantSample) -> Option<Pollutant> {
        sample
            .iter()
            .filter_map(|(p, c)| Self::sub_index(p, c).map(|i| (p, i)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
    }

    /// Concentration in µg/m³ that corresponds to an AQI for the pollutant
    #[must_use]
    pub fn concentration_for_aqi(pollutant: Pollutant, aqi: f64) -> Option<f64> {
        breakpoints::inverse(breakpoints::table(pollutant), aqi)
            .map(|native| native / breakpoints::unit_factor(pollutant))
    }

    /// PM2.5 estimate (µg/m³) for a city known only by its AQI
    #[must_use]
    pub fn estimate_pm25(aqi: f64) -> f64 {
        Self::concentration_for_aqi(Pollutant::Pm25, aqi).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_standardized_aqi_takes_worst_pollutant() {
        let sample = PollutantSample::new()
            .with(Pollutant::Pm25, Some(35.4)) // 100
            .with(Pollutant::Pm10, Some(54.0)) // 50
            .with(Pollutant::O3, Some(60.0)); // ~0.0307 ppm → ~28
        assert_eq!(AqiNormalizer::standardized_aqi(&sample), Some(100.0));
        assert_eq!(
            AqiNormalizer::dominant_pollutant(&sample),
            Some(Pollutant::Pm25)
        );
    }

    #[test]
    fn test_no_data_is_undefined() {
        assert_eq!(AqiNormalizer::standardized_aqi(&PollutantSample::new()), None);

        let only_invalid = PollutantSample::new().with(Pollutant::Pm25, Some(-3.0));
        assert_eq!(AqiNormalizer::standardized_aqi(&only_invalid), None);
    }

    #[test]
    fn test_invalid_pollutant_is_skipped() {
        let sample = PollutantSample::new()
            .with(Pollutant::Pm25, Some(f64::NAN))
            .with(Pollutant::Pm10, Some(154.0));
        assert_eq!(AqiNormalizer::standardized_aqi(&sample), Some(100.0));
    }

    #[test]
    fn test_gas_unit_conversion() {
        // 100 µg/m³ NO2 ≈ 53.2 ppb, just past the "Good" segment
        let aqi = AqiNormalizer::sub_index(Pollutant::No2, 100.0).unwrap();
        assert_eq!(aqi, 51.0);

        let native = AqiNormalizer::sub_index_native(Pollutant::No2, 53.0).unwrap();
        assert_eq!(native, 50.0);
    }

    #[test]
    fn test_estimate_pm25_round_trips_breakpoints() {
        assert_abs_diff_eq!(AqiNormalizer::estimate_pm25(50.0), 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(AqiNormalizer::estimate_pm25(150.0), 55.4, epsilon = 1e-9);
        let aqi = AqiNormalizer::sub_index(Pollutant::Pm25, AqiNormalizer::estimate_pm25(87.0));
        assert_abs_diff_eq!(aqi.unwrap(), 87.0, epsilon = 0.05);
    }
}
