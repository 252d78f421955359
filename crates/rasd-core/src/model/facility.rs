// ── Facility domain type ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::coordinate::LatLng;
use super::ids::FacilityId;
use crate::geometry::{self, BoundingDimensions};
use crate::surface::LayerHandle;

/// Shape a facility was drawn as. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FacilityKind {
    Rectangle,
    Polygon,
}

/// Derived measurements of a ring, computed once at creation or restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityGeometry {
    pub center: LatLng,
    pub dimensions: BoundingDimensions,
    pub area: f64,
    pub perimeter: f64,
}

impl FacilityGeometry {
    /// Measure `ring`. An empty ring yields all-zero geometry.
    pub fn measure(ring: &[LatLng]) -> Self {
        Self {
            center: geometry::centroid(ring).unwrap_or_default(),
            dimensions: geometry::bounding_dimensions(ring).unwrap_or_default(),
            area: geometry::area(ring),
            perimeter: geometry::perimeter(ring),
        }
    }
}

/// A user-drawn geographic region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FacilityKind,
    pub coordinates: Vec<LatLng>,
    #[serde(flatten)]
    pub geometry: FacilityGeometry,
    /// Rendering object owned by the map surface. Never persisted.
    #[serde(skip)]
    pub layer: Option<LayerHandle>,
}

impl Facility {
    pub fn center(&self) -> LatLng {
        self.geometry.center
    }

    pub fn dimensions(&self) -> &BoundingDimensions {
        &self.geometry.dimensions
    }

    pub fn area(&self) -> f64 {
        self.geometry.area
    }

    pub fn perimeter(&self) -> f64 {
        self.geometry.perimeter
    }

    /// Hover text bound to the facility's layer.
    pub fn tooltip(&self) -> String {
        format!(
            "{}\n{:.1} m × {:.1} m",
            self.name, self.geometry.dimensions.width, self.geometry.dimensions.height
        )
    }
}

/// Human-readable area: hectares from 10 000 m² upward, square meters below.
pub fn format_area(square_meters: f64) -> String {
    if square_meters >= 10_000.0 {
        format!("{:.2} ha", square_meters / 10_000.0)
    } else {
        format!("{square_meters:.1} m²")
    }
}
