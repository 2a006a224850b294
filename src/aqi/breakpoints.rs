//! EPA breakpoint tables and piecewise-linear interpolation

use crate::models::Pollutant;

/// One segment of a breakpoint table, in the pollutant's table unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub conc_lo: f64,
    pub conc_hi: f64,
    pub aqi_lo: f64,
    pub aqi_hi: f64,
}

const fn bp(conc_lo: f64, conc_hi: f64, aqi_lo: f64, aqi_hi: f64) -> Breakpoint {
    Breakpoint {
        conc_lo,
        conc_hi,
        aqi_lo,
        aqi_hi,
    }
}

impl Breakpoint {
    /// EPA formula: I = (I_hi − I_lo) / (C_hi − C_lo) · (C − C_lo) + I_lo
    #[must_use]
    pub fn index_for(&self, concentration: f64) -> f64 {
        (self.aqi_hi - self.aqi_lo) / (self.conc_hi - self.conc_lo) * (concentration - self.conc_lo)
            + self.aqi_lo
    }

    /// Inverse of [`Breakpoint::index_for`]
    #[must_use]
    pub fn concentration_for(&self, aqi: f64) -> f64 {
        (aqi - self.aqi_lo) * (self.conc_hi - self.conc_lo) / (self.aqi_hi - self.aqi_lo)
            + self.conc_lo
    }
}

/// PM2.5, 24-hour, µg/m³
pub const PM25: [Breakpoint; 7] = [
    bp(0.0, 12.0, 0.0, 50.0),
    bp(12.1, 35.4, 51.0, 100.0),
    bp(35.5, 55.4, 101.0, 150.0),
    bp(55.5, 150.4, 151.0, 200.0),
    bp(150.5, 250.4, 201.0, 300.0),
    bp(250.5, 350.4, 301.0, 400.0),
    bp(350.5, 500.4, 401.0, 500.0),
];

/// PM10, 24-hour, µg/m³
pub const PM10: [Breakpoint; 7] = [
    bp(0.0, 54.0, 0.0, 50.0),
    bp(55.0, 154.0, 51.0, 100.0),
    bp(155.0, 254.0, 101.0, 150.0),
    bp(255.0, 354.0, 151.0, 200.0),
    bp(355.0, 424.0, 201.0, 300.0),
    bp(425.0, 504.0, 301.0, 400.0),
    bp(505.0, 604.0, 401.0, 500.0),
];

/// NO2, 1-hour, ppb
pub const NO2: [Breakpoint; 7] = [
    bp(0.0, 53.0, 0.0, 50.0),
    bp(54.0, 100.0, 51.0, 100.0),
    bp(101.0, 360.0, 101.0, 150.0),
    bp(361.0, 649.0, 151.0, 200.0),
    bp(650.0, 1249.0, 201.0, 300.0),
    bp(1250.0, 1649.0, 301.0, 400.0),
    bp(1650.0, 2049.0, 401.0, 500.0),
];

/// SO2, 1-hour, ppb
pub const SO2: [Breakpoint; 7] = [
    bp(0.0, 35.0, 0.0, 50.0),
    bp(36.0, 75.0, 51.0, 100.0),
    bp(76.0, 185.0, 101.0, 150.0),
    bp(186.0, 304.0, 151.0, 200.0),
    bp(305.0, 604.0, 201.0, 300.0),
    bp(605.0, 804.0, 301.0, 400.0),
    bp(805.0, 1004.0, 401.0, 500.0),
];

/// CO, 8-hour, ppm
pub const CO: [Breakpoint; 7] = [
    bp(0.0, 4.4, 0.0, 50.0),
    bp(4.5, 9.4, 51.0, 100.0),
    bp(9.5, 12.4, 101.0, 150.0),
    bp(12.5, 15.4, 151.0, 200.0),
    bp(15.5, 30.4, 201.0, 300.0),
    bp(30.5, 40.4, 301.0, 400.0),
    bp(40.5, 50.4, 401.0, 500.0),
];

/// O3, 8-hour, ppm. The 8-hour table stops at 300.
pub const O3: [Breakpoint; 5] = [
    bp(0.000, 0.054, 0.0, 50.0),
    bp(0.055, 0.070, 51.0, 100.0),
    bp(0.071, 0.085, 101.0, 150.0),
    bp(0.086, 0.105, 151.0, 200.0),
    bp(0.106, 0.200, 201.0, 300.0),
];

pub const MAX_AQI: f64 = 500.0;

/// Slack for concentrations that went through a unit conversion
const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Breakpoint table for a pollutant
#[must_use]
pub fn table(pollutant: Pollutant) -> &'static [Breakpoint] {
    match pollutant {
        Pollutant::Pm25 => &PM25,
        Pollutant::Pm10 => &PM10,
        Pollutant::No2 => &NO2,
        Pollutant::So2 => &SO2,
        Pollutant::Co => &CO,
        Pollutant::O3 => &O3,
    }
}

/// Factor converting µg/m³ into the table unit (approximate, 25 °C)
#[must_use]
pub fn unit_factor(pollutant: Pollutant) -> f64 {
    match pollutant {
        Pollutant::Pm25 | Pollutant::Pm10 => 1.0,
        Pollutant::No2 => 0.532,
        Pollutant::So2 => 0.382,
        Pollutant::Co => 0.000_873,
        Pollutant::O3 => 0.000_512,
    }
}

/// Round to one decimal, as reported AQI values are
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Sub-index for a concentration given in the table's own unit.
///
/// Concentrations falling between two published segments take the lower AQI
/// of the next segment; concentrations above the table are extrapolated from
/// the top segment and capped at [`MAX_AQI`].
#[must_use]
pub fn interpolate(table: &[Breakpoint], concentration: f64) -> Option<f64> {
    if !concentration.is_finite() || concentration < 0.0 {
        return None;
    }

    for segment in table {
        if concentration <= segment.conc_hi + BOUNDARY_TOLERANCE {
            if concentration < segment.conc_lo {
                return Some(segment.aqi_lo);
            }
            return Some(round1(segment.index_for(concentration)));
        }
    }

    let top = table.last()?;
    Some(round1(top.index_for(concentration)).min(MAX_AQI))
}

/// Concentration (table unit) that yields the given AQI; inverse of [`interpolate`]
#[must_use]
pub fn inverse(table: &[Breakpoint], aqi: f64) -> Option<f64> {
    if !aqi.is_finite() {
        return None;
    }
    let aqi = aqi.max(0.0);

    for segment in table {
        if aqi <= segment.aqi_hi {
            if aqi < segment.aqi_lo {
                return Some(segment.conc_lo);
            }
            return Some(segment.concentration_for(aqi));
        }
    }

    let top = table.last()?;
    Some(top.concentration_for(aqi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::AqiNormalizer;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn test_tables_are_ordered() {
        for pollutant in Pollutant::ALL {
            let segments = table(pollutant);
            for pair in segments.windows(2) {
                assert!(pair[0].conc_hi < pair[1].conc_lo, "{pollutant} overlaps");
                assert!(pair[0].aqi_hi < pair[1].aqi_lo, "{pollutant} AQI overlaps");
            }
        }
    }

    #[rstest]
    fn test_published_boundaries_map_exactly(
        #[values(
            Pollutant::Pm25,
            Pollutant::Pm10,
            Pollutant::No2,
            Pollutant::So2,
            Pollutant::Co,
            Pollutant::O3
        )]
        pollutant: Pollutant,
    ) {
        let factor = unit_factor(pollutant);
        for segment in table(pollutant) {
            for (conc, aqi) in [
                (segment.conc_lo, segment.aqi_lo),
                (segment.conc_hi, segment.aqi_hi),
            ] {
                assert_eq!(
                    AqiNormalizer::sub_index_native(pollutant, conc),
                    Some(aqi),
                    "{pollutant} at {conc}"
                );
                assert_eq!(
                    AqiNormalizer::sub_index(pollutant, conc / factor),
                    Some(aqi),
                    "{pollutant} at {conc} converted from µg/m³"
                );
            }
        }
    }

    #[test]
    fn test_interpolate_midpoint() {
        // Halfway through the PM2.5 "Moderate" segment
        let mid = (12.1 + 35.4) / 2.0;
        assert_abs_diff_eq!(interpolate(&PM25, mid).unwrap(), 75.5, epsilon = 0.05);
    }

    #[test]
    fn test_gap_takes_next_segment_floor() {
        assert_eq!(interpolate(&PM25, 12.05), Some(51.0));
        assert_eq!(interpolate(&PM10, 54.5), Some(51.0));
    }

    #[test]
    fn test_above_table_is_capped() {
        assert_eq!(interpolate(&PM25, 900.0), Some(500.0));
        let beyond_o3 = interpolate(&O3, 0.25).unwrap();
        assert!(beyond_o3 > 300.0 && beyond_o3 <= 500.0);
    }

    #[test]
    fn test_negative_and_nan_are_undefined() {
        assert_eq!(interpolate(&PM25, -1.0), None);
        assert_eq!(interpolate(&PM25, f64::NAN), None);
    }

    #[test]
    fn test_inverse_at_boundaries() {
        assert_abs_diff_eq!(inverse(&PM25, 50.0).unwrap(), 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(inverse(&PM25, 150.0).unwrap(), 55.4, epsilon = 1e-9);
        assert_abs_diff_eq!(inverse(&PM25, 0.0).unwrap(), 0.0, epsilon = 1e-9);
        // Between 50 and 51 there is no published concentration
        assert_abs_diff_eq!(inverse(&PM25, 50.5).unwrap(), 12.1, epsilon = 1e-9);
    }
}
