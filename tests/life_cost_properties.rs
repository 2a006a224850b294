//! Properties of the public comparison API

use approx::assert_abs_diff_eq;
use lifecost::models::{Confidence, Coordinates};
use lifecost::{AqiNormalizer, CityKey, CityRecord, LifeCostCalculator, Pollutant};
use rstest::rstest;

fn city(name: &str, aqi: f64, cost: f64, life_expectancy: f64) -> CityRecord {
    CityRecord {
        key: CityKey::new(name, "Testland"),
        coordinates: Coordinates::new(0.0, 0.0),
        cost_of_living_index: cost,
        standardized_aqi: aqi,
        life_expectancy,
        pm25_concentration: None,
    }
}

#[rstest]
#[case(25.0, 75.0)]
#[case(50.0, 150.0)]
#[case(120.0, 280.0)]
#[case(180.0, 40.0)]
fn test_comparison_is_antisymmetric(#[case] a: f64, #[case] b: f64) {
    let first = city("A", a, 80.0, 78.0);
    let second = city("B", b, 120.0, 81.0);

    let there = LifeCostCalculator::compare(&first, &second);
    let back = LifeCostCalculator::compare(&second, &first);

    assert_abs_diff_eq!(
        there.air_quality_life_impact.estimate,
        -back.air_quality_life_impact.estimate,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(there.cost_delta.estimate, -back.cost_delta.estimate, epsilon = 1e-9);
    assert_abs_diff_eq!(
        there.health_adjusted_life_expectancy_delta.estimate,
        -back.health_adjusted_life_expectancy_delta.estimate,
        epsilon = 1e-9
    );
}

#[rstest]
#[case(150.0, 50.0)]
#[case(300.0, 100.0)]
#[case(75.0, 20.0)]
fn test_cleaner_air_gains_years(#[case] dirty: f64, #[case] clean: f64) {
    let origin = city("Dirty", dirty, 100.0, 80.0);
    let destination = city("Clean", clean, 100.0, 80.0);
    let result = LifeCostCalculator::compare(&origin, &destination);

    assert!(result.air_quality_life_impact.estimate > 0.0);
    assert!(result.health_adjusted_life_expectancy_delta.estimate > 0.0);
    assert!(result.aqi_delta.estimate < 0.0);
    assert!(result.recommendation_score >= 0.0 && result.recommendation_score <= 100.0);
}

#[test]
fn test_same_city_has_no_effect() {
    let berlin = city("Berlin", 65.0, 108.0, 81.3);
    let result = LifeCostCalculator::compare(&berlin, &berlin);

    assert_eq!(result.air_quality_life_impact.estimate, 0.0);
    assert_eq!(result.cost_per_life_year, None);
    assert_eq!(result.confidence, Confidence::Low);
}

#[rstest]
#[case(Pollutant::Pm25)]
#[case(Pollutant::Pm10)]
#[case(Pollutant::No2)]
#[case(Pollutant::So2)]
#[case(Pollutant::Co)]
#[case(Pollutant::O3)]
fn test_sub_index_is_monotonic(#[case] pollutant: Pollutant) {
    let mut previous = 0.0;
    for step in 0..200 {
        let concentration = f64::from(step) * 2.5;
        let Some(index) = AqiNormalizer::sub_index(pollutant, concentration) else {
            continue;
        };
        assert!(
            index >= previous,
            "{pollutant} AQI fell from {previous} to {index} at {concentration}"
        );
        assert!(index <= 500.0);
        previous = index;
    }
}
