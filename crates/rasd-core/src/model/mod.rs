// ── Domain model ──

mod coordinate;
mod facility;
mod ids;

pub use coordinate::{LatLng, RawCoordinate};
pub use facility::{Facility, FacilityGeometry, FacilityKind, format_area};
pub use ids::{CameraId, FacilityId};
