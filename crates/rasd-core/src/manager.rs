// ── Facility manager ──
//
// Session-level facade tying the facility store, the drawing controller
// and the notifier together. The UI feeds it `MapEvent`s and calls the
// confirmed-action methods; everything user-facing goes out as toasts.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::drawing::{DrawingEvent, DrawingModeController, DrawingOutcome};
use crate::model::{Facility, FacilityId, LatLng, format_area};
use crate::notify::{DEFAULT_TOAST_DURATION, Notifier, Severity};
use crate::storage::KeyValueStore;
use crate::store::FacilityStore;
use crate::surface::{LayerHandle, MapSurface};

/// Pointer and toolbar input from the map UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    ActivateRectangle,
    ActivatePolygon,
    Click(LatLng),
    DoubleClick(LatLng),
    Finish,
    Cancel,
    /// A facility shape was clicked.
    LayerClicked(LayerHandle),
}

/// Result of handling a [`MapEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum MapOutcome {
    Drawing(DrawingOutcome),
    Selected(FacilityId),
    Ignored,
}

pub struct FacilityManager {
    store: FacilityStore,
    drawing: DrawingModeController,
    notifier: Arc<dyn Notifier>,
}

impl FacilityManager {
    pub fn new(
        surface: Arc<dyn MapSurface>,
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store: FacilityStore::new(Arc::clone(&surface), storage),
            drawing: DrawingModeController::new(surface),
            notifier,
        }
    }

    /// Assemble from pre-configured parts (custom styles and so on).
    pub fn from_parts(
        store: FacilityStore,
        drawing: DrawingModeController,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            drawing,
            notifier,
        }
    }

    pub fn store(&self) -> &FacilityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut FacilityStore {
        &mut self.store
    }

    pub fn drawing(&self) -> &DrawingModeController {
        &self.drawing
    }

    pub fn drawing_mut(&mut self) -> &mut DrawingModeController {
        &mut self.drawing
    }

    /// Restore persisted facilities. Returns how many were loaded.
    pub fn load(&mut self) -> usize {
        self.store.load().len()
    }

    pub fn handle(&mut self, event: MapEvent) -> MapOutcome {
        let drawing_event = match event {
            MapEvent::LayerClicked(layer) => return self.layer_clicked(layer),
            MapEvent::ActivateRectangle => DrawingEvent::ActivateRectangle,
            MapEvent::ActivatePolygon => DrawingEvent::ActivatePolygon,
            MapEvent::Click(point) => DrawingEvent::Click(point),
            MapEvent::DoubleClick(point) => DrawingEvent::DoubleClick(point),
            MapEvent::Finish => DrawingEvent::Finish,
            MapEvent::Cancel => DrawingEvent::Cancel,
        };

        match self.drawing.on_event(drawing_event, &mut self.store) {
            Ok(outcome) => {
                if let DrawingOutcome::Completed(ref facility) = outcome {
                    self.toast(
                        &format!(
                            "Facility \"{}\" created ({})",
                            facility.name,
                            format_area(facility.area())
                        ),
                        Severity::Success,
                    );
                }
                MapOutcome::Drawing(outcome)
            }
            Err(e) => {
                warn!(error = %e, "drawing rejected");
                self.toast(&e.to_string(), Severity::Warning);
                MapOutcome::Ignored
            }
        }
    }

    /// Delete after confirmation. Declining or an unknown id changes nothing.
    pub fn request_delete(&mut self, id: FacilityId) -> Option<Facility> {
        let name = self.store.get(id)?.name.clone();
        if !self
            .notifier
            .confirm(&format!("Delete facility \"{name}\"? This cannot be undone."))
        {
            debug!(facility_id = %id, "delete declined");
            return None;
        }
        let removed = self.store.delete(id)?;
        self.toast("Facility deleted", Severity::Success);
        Some(removed)
    }

    /// Clear all facilities after confirmation. Returns how many were removed.
    pub fn request_clear(&mut self) -> usize {
        if self.store.is_empty() {
            self.toast("There are no facilities to clear", Severity::Info);
            return 0;
        }
        if !self.notifier.confirm("Delete all facilities? This cannot be undone.") {
            debug!("clear declined");
            return 0;
        }
        let count = self.store.clear();
        self.toast(&format!("{count} facilities deleted"), Severity::Success);
        count
    }

    pub fn rename(&mut self, id: FacilityId, new_name: &str) -> bool {
        let renamed = self.store.rename(id, new_name);
        if renamed {
            self.toast(
                &format!("Renamed to: {}", new_name.trim()),
                Severity::Success,
            );
        }
        renamed
    }

    fn layer_clicked(&mut self, layer: LayerHandle) -> MapOutcome {
        if self.drawing.is_drawing() {
            return MapOutcome::Ignored;
        }
        let Some(id) = self.store.find_by_layer(layer) else {
            return MapOutcome::Ignored;
        };
        self.store.select(id);
        MapOutcome::Selected(id)
    }

    fn toast(&self, message: &str, severity: Severity) {
        self.notifier.toast(message, severity, DEFAULT_TOAST_DURATION);
    }
}
