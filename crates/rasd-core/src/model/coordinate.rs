// ── Geographic coordinates ──
//
// Every ingestion boundary normalizes to `LatLng`. The wire format
// tolerates both `{lat, lng}` objects and `[lat, lng]` pairs, but the
// ambiguity stops at deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCoordinate")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

/// Either accepted wire shape of a coordinate.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Named { lat: f64, lng: f64 },
    Positional([f64; 2]),
}

impl From<RawCoordinate> for LatLng {
    fn from(raw: RawCoordinate) -> Self {
        match raw {
            RawCoordinate::Named { lat, lng } => Self { lat, lng },
            RawCoordinate::Positional(pair) => Self::from(pair),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_named_form() {
        let p: LatLng = serde_json::from_str(r#"{"lat": 24.5, "lng": 46.6}"#).unwrap();
        assert_eq!(p, LatLng::new(24.5, 46.6));
    }

    #[test]
    fn deserializes_positional_form() {
        let p: LatLng = serde_json::from_str("[24.5, 46.6]").unwrap();
        assert_eq!(p, LatLng::new(24.5, 46.6));
    }

    #[test]
    fn mixed_forms_in_one_ring() {
        let ring: Vec<LatLng> =
            serde_json::from_str(r#"[[1.0, 2.0], {"lat": 3.0, "lng": 4.0}]"#).unwrap();
        assert_eq!(ring, vec![LatLng::new(1.0, 2.0), LatLng::new(3.0, 4.0)]);
    }

    #[test]
    fn always_serializes_named_form() {
        let json = serde_json::to_value(LatLng::new(1.5, 2.5)).unwrap();
        assert_eq!(json, serde_json::json!({ "lat": 1.5, "lng": 2.5 }));
    }
}
