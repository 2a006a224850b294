//! Result of comparing an origin city with a destination city

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use super::city::CityRecord;

/// Qualitative confidence in a comparison
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        f.write_str(label)
    }
}

/// A point estimate with a symmetric percentage band around it
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct UncertaintyBand {
    pub estimate: f64,
    pub low: f64,
    pub high: f64,
    /// Half-width of the band as a fraction of |estimate|
    pub relative: f64,
}

impl UncertaintyBand {
    #[must_use]
    pub fn new(estimate: f64, relative: f64) -> Self {
        let spread = estimate.abs() * relative;
        Self {
            estimate,
            low: estimate - spread,
            high: estimate + spread,
            relative,
        }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// How the cost of a move relates to its health effect
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueAssessment {
    /// Cheaper and healthier
    Dominant,
    /// Under USD 10 000 per life year gained
    Excellent,
    /// USD 10 000 – 50 000 per life year gained
    Good,
    /// USD 50 000 – 100 000 per life year gained
    Fair,
    /// Over USD 100 000 per life year gained
    Poor,
    /// More expensive and less healthy
    Dominated,
    /// Cheaper but less healthy
    TradeOff,
    /// Health effect too small to price
    Negligible,
}

/// Narrative breakdown of a comparison
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AnalysisDetails {
    pub primary_factors: Vec<String>,
    pub trade_offs: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Life-cost comparison between two cities
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ComparisonResult {
    pub origin: CityRecord,
    pub destination: CityRecord,
    /// destination.cost − origin.cost, in index points
    pub cost_delta: UncertaintyBand,
    /// destination.aqi − origin.aqi
    pub aqi_delta: UncertaintyBand,
    /// Difference of country-level life expectancy baselines, in years
    pub life_expectancy_delta: f64,
    /// Estimated years gained (+) or lost (−) from the PM2.5 difference alone
    pub air_quality_life_impact: UncertaintyBand,
    /// Baseline difference plus the air-quality impact, in years
    pub health_adjusted_life_expectancy_delta: UncertaintyBand,
    pub origin_pm25: f64,
    pub destination_pm25: f64,
    /// USD per life year; `None` when the health effect is negligible
    pub cost_per_life_year: Option<f64>,
    pub value_assessment: ValueAssessment,
    /// 0 (not recommended) to 100 (highly recommended)
    pub recommendation_score: f64,
    pub confidence: Confidence,
    pub distance_km: f64,
    pub details: AnalysisDetails,
}

impl ComparisonResult {
    /// One-line interpretation of the cost/health quadrant
    #[must_use]
    pub fn summary(&self) -> &'static str {
        let cost = self.cost_delta.estimate;
        let life = self.health_adjusted_life_expectancy_delta.estimate;
        if cost > 0.0 && life > 0.0 {
            "Higher cost, but better health outcomes: an investment in your wellbeing"
        } else if cost <= 0.0 && life > 0.0 {
            "Best of both worlds: lower cost and better health outcomes"
        } else if cost > 0.0 {
            "Higher cost with worse health outcomes: consider whether other factors justify this move"
        } else {
            "Lower cost but potentially worse health outcomes: weigh your priorities carefully"
        }
    }
}

impl Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "📍 {} → 🎯 {} ({:.0} km)",
            self.origin.key, self.destination.key, self.distance_km
        )?;
        writeln!(
            f,
            "   AQI:             {:>7.1} → {:>7.1}  ({:+.1})",
            self.origin.standardized_aqi, self.destination.standardized_aqi, self.aqi_delta.estimate
        )?;
        writeln!(
            f,
            "   Cost index:      {:>7.1} → {:>7.1}  ({:+.1})",
            self.origin.cost_of_living_index,
            self.destination.cost_of_living_index,
            self.cost_delta.estimate
        )?;
        writeln!(
            f,
            "   Life expectancy: {:>7.1} → {:>7.1}  ({:+.2} years)",
            self.origin.life_expectancy, self.destination.life_expectancy, self.life_expectancy_delta
        )?;
        writeln!(
            f,
            "   Air quality impact: {:+.2} years [{:+.2}, {:+.2}]",
            self.air_quality_life_impact.estimate,
            self.air_quality_life_impact.low,
            self.air_quality_life_impact.high
        )?;
        writeln!(
            f,
            "   Health-adjusted change: {:+.2} years (confidence: {})",
            self.health_adjusted_life_expectancy_delta.estimate, self.confidence
        )?;
        if let Some(cost) = self.cost_per_life_year {
            writeln!(f, "   Cost per life year: ${cost:.0} ({:?})", self.value_assessment)?;
        }
        writeln!(f, "   Recommendation score: {:.1}/100", self.recommendation_score)?;
        writeln!(f, "   💡 {}", self.summary())?;
        for line in self
            .details
            .primary_factors
            .iter()
            .chain(&self.details.recommendations)
        {
            writeln!(f, "   • {line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_is_symmetric_for_negative_estimates() {
        let band = UncertaintyBand::new(-4.0, 0.25);
        assert_eq!(band.low, -5.0);
        assert_eq!(band.high, -3.0);
        assert!(band.contains(-4.5));
        assert!(!band.contains(-2.0));
    }

    #[test]
    fn test_zero_band_collapses() {
        let band = UncertaintyBand::new(0.0, 0.1);
        assert_eq!(band.low, 0.0);
        assert_eq!(band.high, 0.0);
    }
}
