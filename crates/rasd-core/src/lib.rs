// rasd-core: Facility geometry, interactive drawing and stream connection
// management for the RASD operations dashboard.
//
// Area and perimeter use a flat local-meters approximation and the
// centroid is the vertex mean; both are accurate for sub-kilometer
// facilities only.

pub mod drawing;
pub mod error;
pub mod geometry;
pub mod manager;
pub mod model;
pub mod notify;
pub mod storage;
pub mod store;
pub mod stream;
pub mod surface;

// ── Primary re-exports ──────────────────────────────────────────────
pub use drawing::{DrawingEvent, DrawingMode, DrawingModeController, DrawingOutcome};
pub use error::{CoreError, StorageError, StreamError};
pub use manager::{FacilityManager, MapEvent, MapOutcome};
pub use notify::{Notifier, Severity, TracingNotifier};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage};
pub use store::{FacilityRecord, FacilitySnapshot, FacilityStore};
pub use stream::{
    MediaBackend, Player, ReconnectPolicy, StreamConfig, StreamManager, StreamSource,
    StreamStatus, Transport, TransportHint,
};
pub use surface::{FacilityStyles, HeadlessSurface, LayerHandle, MapSurface, ShapeStyle};

// Re-export model types at the crate root for ergonomics.
pub use model::{CameraId, Facility, FacilityId, FacilityKind, LatLng};
