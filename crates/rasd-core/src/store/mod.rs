// ── Facility persistence and collection ──

mod facility_store;
mod record;

pub use facility_store::{FacilitySnapshot, FacilityStore, MIN_VERTICES};
pub use record::{FacilityExport, FacilityRecord};
