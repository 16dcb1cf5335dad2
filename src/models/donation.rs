// src/models/donation.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::geo::parse_coordinate;

/// A newly listed free item, as read from the creation event.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DonationEvent {
    pub title: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl DonationEvent {
    pub fn new(title: impl Into<String>, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self {
            title: title.into(),
            latitude,
            longitude,
        }
    }

    /// Builds the event from the raw document fields. Unknown fields are ignored.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let title = record
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            title,
            latitude: record.get("latitude").and_then(parse_coordinate),
            longitude: record.get("longitude").and_then(parse_coordinate),
        }
    }

    /// `(latitude, longitude)` when both are present and finite.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn is_geolocatable(&self) -> bool {
        self.coordinates().is_some()
    }
}

/// Change-data-capture envelope for a donation document creation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DonationCreated {
    pub donation_id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl DonationCreated {
    pub fn event(&self) -> DonationEvent {
        DonationEvent::from_record(&self.data)
    }
}
