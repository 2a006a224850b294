//! Derived figures: uncertainty, confidence, value for money and the
//! narrative breakdown of a comparison

use crate::models::{AnalysisDetails, Confidence, ValueAssessment};

use super::health::Pm25Pair;

/// Relative half-width of the cost-delta band
pub const COST_UNCERTAINTY: f64 = 0.10;
/// Relative half-width of the AQI-delta band
pub const AQI_UNCERTAINTY: f64 = 0.15;
/// Relative half-width of the life-impact bands
pub const LIFE_IMPACT_UNCERTAINTY: f64 = 0.35;

/// Annual household cost of one cost-of-living index point, in USD
pub const USD_PER_INDEX_POINT: f64 = 1000.0;

/// Health changes smaller than this (years) are not priced
const NEGLIGIBLE_YEARS: f64 = 0.01;

const HAZARDOUS_AQI: f64 = 300.0;
const MIN_MEANINGFUL_IMPACT: f64 = 0.1;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[must_use]
pub fn confidence(
    origin_aqi: f64,
    destination_aqi: f64,
    air_impact: f64,
    pm25: &Pm25Pair,
) -> Confidence {
    if origin_aqi > HAZARDOUS_AQI
        || destination_aqi > HAZARDOUS_AQI
        || air_impact.abs() < MIN_MEANINGFUL_IMPACT
    {
        Confidence::Low
    } else if pm25.estimated || pm25.reaches_taper() {
        Confidence::Medium
    } else {
        Confidence::High
    }
}

/// Annual USD cost per life year gained (or saved per year lost)
#[must_use]
pub fn cost_per_life_year(cost_delta: f64, hale_delta: f64) -> Option<f64> {
    if hale_delta.abs() < NEGLIGIBLE_YEARS {
        return None;
    }
    Some(round_to(cost_delta * USD_PER_INDEX_POINT / hale_delta, 2))
}

#[must_use]
pub fn value_assessment(
    cost_delta: f64,
    hale_delta: f64,
    cost_per_life_year: Option<f64>,
) -> ValueAssessment {
    let Some(per_year) = cost_per_life_year else {
        return ValueAssessment::Negligible;
    };

    match (cost_delta > 0.0, hale_delta > 0.0) {
        (false, true) => ValueAssessment::Dominant,
        (true, false) => ValueAssessment::Dominated,
        (false, false) => ValueAssessment::TradeOff,
        (true, true) => match per_year {
            p if p < 10_000.0 => ValueAssessment::Excellent,
            p if p < 50_000.0 => ValueAssessment::Good,
            p if p < 100_000.0 => ValueAssessment::Fair,
            _ => ValueAssessment::Poor,
        },
    }
}

/// 0 = not recommended, 100 = highly recommended
#[must_use]
pub fn recommendation_score(cost_delta: f64, life_delta: f64, aqi_delta: f64) -> f64 {
    let mut score = 50.0;

    score += (life_delta * 10.0).clamp(-30.0, 30.0);

    if cost_delta < 0.0 {
        score += (cost_delta.abs() * 0.3).min(20.0);
    } else {
        score -= (cost_delta * 0.2).min(25.0);
    }

    if aqi_delta < 0.0 {
        score += (aqi_delta.abs() * 0.15).min(25.0);
    } else {
        score -= (aqi_delta * 0.15).min(20.0);
    }

    round_to(score, 1).clamp(0.0, 100.0)
}

#[must_use]
pub fn analysis_details(
    cost_delta: f64,
    aqi_delta: f64,
    life_delta: f64,
    recommendation_score: f64,
) -> AnalysisDetails {
    let mut details = AnalysisDetails::default();

    if life_delta.abs() > 1.0 {
        details.primary_factors.push(if life_delta > 0.0 {
            format!("Significant health benefit: +{life_delta:.2} years life expectancy")
        } else {
            format!("Health concern: {life_delta:.2} years life expectancy reduction")
        });
    }
    if cost_delta.abs() > 20.0 {
        details.primary_factors.push(if cost_delta > 0.0 {
            format!("High cost increase: +{cost_delta:.1}% cost of living")
        } else {
            format!("Significant savings: {cost_delta:.1}% cost of living reduction")
        });
    }
    if aqi_delta.abs() > 25.0 {
        details.primary_factors.push(if aqi_delta > 0.0 {
            format!("Air quality concern: +{aqi_delta:.1} AQI increase")
        } else {
            format!("Better air quality: {aqi_delta:.1} AQI improvement")
        });
    }

    let trade_off = match (cost_delta, life_delta) {
        (c, l) if c > 0.0 && l > 0.0 => Some("Higher living costs but better health outcomes"),
        (c, l) if c < 0.0 && l < 0.0 => Some("Lower costs but potential health risks"),
        (c, l) if c > 0.0 && l < 0.0 => Some("Higher costs and worse health outcomes"),
        (c, l) if c < 0.0 && l > 0.0 => Some("Lower costs and better health outcomes"),
        _ => None,
    };
    details.trade_offs.extend(trade_off.map(String::from));

    let recommendation = match recommendation_score {
        s if s >= 75.0 => "Highly recommended move: strong benefits outweigh costs",
        s if s >= 60.0 => "Generally positive move: benefits likely outweigh drawbacks",
        s if s >= 40.0 => "Mixed outcomes: carefully consider personal priorities",
        s if s >= 25.0 => "Consider alternatives: significant trade-offs involved",
        _ => "Not recommended: costs and risks outweigh benefits",
    };
    details.recommendations.push(recommendation.to_string());

    if aqi_delta > 50.0 {
        details
            .risk_factors
            .push("Significant air quality deterioration".to_string());
    }
    if cost_delta > 50.0 {
        details
            .risk_factors
            .push("Very high cost of living increase".to_string());
    }
    if life_delta < -1.0 {
        details
            .risk_factors
            .push("Substantial health impact concerns".to_string());
    }

    details
}
