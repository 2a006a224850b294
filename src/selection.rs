//! Two-click origin/destination selection

use serde::Serialize;

use crate::models::CityKey;

/// What a click did to the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionEvent {
    OriginSelected,
    /// Both cities are chosen; a comparison can be run
    DestinationSelected,
    /// Same city as the origin, or both slots already taken
    Ignored,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    pub origin: Option<CityKey>,
    pub destination: Option<CityKey>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First click picks the origin, a second distinct click the destination.
    /// Further clicks are ignored until [`Selection::reset`].
    pub fn click(&mut self, city: CityKey) -> SelectionEvent {
        match (&self.origin, &self.destination) {
            (None, _) => {
                self.origin = Some(city);
                SelectionEvent::OriginSelected
            }
            (Some(origin), None) if *origin != city => {
                self.destination = Some(city);
                SelectionEvent::DestinationSelected
            }
            _ => SelectionEvent::Ignored,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.origin.is_some() && self.destination.is_some()
    }

    /// Origin and destination, once both are chosen
    #[must_use]
    pub fn pair(&self) -> Option<(&CityKey, &CityKey)> {
        self.origin.as_ref().zip(self.destination.as_ref())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
