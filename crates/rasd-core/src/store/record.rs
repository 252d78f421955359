// ── Persisted and exported facility shapes ──
//
// `FacilityRecord` is the storage format: one JSON object per facility in
// a single array. Derived fields are written for readers that want them
// but are recomputed on restore, so a hand-edited or older record with
// missing measurements still loads.

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingDimensions;
use crate::model::{Facility, FacilityId, FacilityKind, LatLng};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    pub id: FacilityId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FacilityKind,
    #[serde(default)]
    pub center: LatLng,
    #[serde(default)]
    pub dimensions: BoundingDimensions,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub perimeter: f64,
    /// Always `null`; kept so the document shape stays stable.
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub coordinates: Vec<LatLng>,
}

impl From<&Facility> for FacilityRecord {
    fn from(f: &Facility) -> Self {
        Self {
            id: f.id,
            name: f.name.clone(),
            kind: f.kind,
            center: f.geometry.center,
            dimensions: f.geometry.dimensions,
            area: f.geometry.area,
            perimeter: f.geometry.perimeter,
            radius: None,
            coordinates: f.coordinates.clone(),
        }
    }
}

/// Shareable export of a facility: no id, no storage-only fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityExport {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FacilityKind,
    pub center: LatLng,
    pub dimensions: BoundingDimensions,
    pub area: f64,
    pub perimeter: f64,
    pub coordinates: Vec<LatLng>,
}

impl From<&Facility> for FacilityExport {
    fn from(f: &Facility) -> Self {
        Self {
            name: f.name.clone(),
            kind: f.kind,
            center: f.geometry.center,
            dimensions: f.geometry.dimensions,
            area: f.geometry.area,
            perimeter: f.geometry.perimeter,
            coordinates: f.coordinates.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_positional_coordinates_and_missing_measurements() {
        let json = r#"{
            "id": 1700000000000,
            "name": "Depot",
            "type": "polygon",
            "coordinates": [[24.71, 46.67], {"lat": 24.72, "lng": 46.68}, [24.70, 46.69]]
        }"#;
        let record: FacilityRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, FacilityKind::Polygon);
        assert_eq!(record.coordinates.len(), 3);
        assert_eq!(record.coordinates[1], LatLng::new(24.72, 46.68));
        assert!(record.radius.is_none());
        assert!(record.area.abs() < f64::EPSILON);
    }

    #[test]
    fn record_writes_null_radius_and_camel_case_bounds() {
        let record = FacilityRecord {
            id: FacilityId::new(7),
            name: "Gate".into(),
            kind: FacilityKind::Rectangle,
            center: LatLng::new(1.0, 2.0),
            dimensions: BoundingDimensions::default(),
            area: 0.0,
            perimeter: 0.0,
            radius: None,
            coordinates: vec![LatLng::new(1.0, 2.0)],
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["radius"], serde_json::Value::Null);
        assert_eq!(value["type"], "rectangle");
        assert!(value["dimensions"].get("minLat").is_some());
        assert_eq!(value["coordinates"][0], serde_json::json!({ "lat": 1.0, "lng": 2.0 }));
    }
}
