//! Column-layer data for the 3D globe front end

use serde::Serialize;

use crate::aqi::AqiCategory;
use crate::models::CityRecord;

const ELEVATION_PER_AQI: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            longitude: 0.0,
            latitude: 20.0,
            zoom: 1.0,
            min_zoom: 1.0,
            max_zoom: 15.0,
            pitch: 60.0,
            bearing: 0.0,
        }
    }
}

/// One city's column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobeColumn {
    pub city_name: String,
    pub country: String,
    /// `[longitude, latitude]`
    pub position: [f64; 2],
    pub elevation: f64,
    pub color: [u8; 4],
    pub standardized_aqi: f64,
    pub category: AqiCategory,
    pub cost_of_living_index: f64,
    pub life_expectancy: f64,
}

impl From<&CityRecord> for GlobeColumn {
    fn from(record: &CityRecord) -> Self {
        let category = AqiCategory::from_aqi(record.standardized_aqi);
        Self {
            city_name: record.key.name.clone(),
            country: record.key.country.clone(),
            position: record.coordinates.position(),
            elevation: record.standardized_aqi * ELEVATION_PER_AQI,
            color: category.color(),
            standardized_aqi: record.standardized_aqi,
            category,
            cost_of_living_index: record.cost_of_living_index,
            life_expectancy: record.life_expectancy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobeLayer {
    pub columns: Vec<GlobeColumn>,
    pub elevation_scale: f64,
    /// Column radius in metres
    pub radius: f64,
    pub pickable: bool,
    pub auto_highlight: bool,
    pub view_state: ViewState,
}

impl GlobeLayer {
    /// Layer for cities with complete data; incomplete cities never reach here
    #[must_use]
    pub fn from_records(records: &[CityRecord]) -> Self {
        Self {
            columns: records.iter().map(GlobeColumn::from).collect(),
            elevation_scale: 50.0,
            radius: 50_000.0,
            pickable: true,
            auto_highlight: true,
            view_state: ViewState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CityKey, Coordinates};

    fn record(name: &str, aqi: f64) -> CityRecord {
        CityRecord {
            key: CityKey::new(name, "Testland"),
            coordinates: Coordinates::new(49.888, -119.496),
            cost_of_living_index: 95.0,
            standardized_aqi: aqi,
            life_expectancy: 82.0,
            pm25_concentration: None,
        }
    }

    #[test]
    fn test_columns_follow_aqi() {
        let layer = GlobeLayer::from_records(&[record("Clean", 28.0), record("Smoggy", 185.0)]);
        assert_eq!(layer.columns.len(), 2);

        let clean = &layer.columns[0];
        assert_eq!(clean.position, [-119.496, 49.888]);
        assert_eq!(clean.elevation, 28_000.0);
        assert_eq!(clean.color, [0, 255, 0, 160]);

        let smoggy = &layer.columns[1];
        assert_eq!(smoggy.category, AqiCategory::Unhealthy);
        assert_eq!(smoggy.color, [255, 0, 0, 160]);
    }

    #[test]
    fn test_default_view() {
        let layer = GlobeLayer::from_records(&[]);
        assert!(layer.columns.is_empty());
        assert_eq!(layer.view_state.latitude, 20.0);
        assert_eq!(layer.view_state.pitch, 60.0);
        assert_eq!(layer.elevation_scale, 50.0);
        assert_eq!(layer.radius, 50_000.0);
    }
}
