// ── Facility store ──
//
// Ordered, owned collection of facilities. Insertion order is display
// order. Every create/rename/delete/clear is applied in memory first and
// then the whole collection is re-serialized to storage; storage failures
// are logged and never undo the in-memory change.

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::record::{FacilityExport, FacilityRecord};
use crate::error::{CoreError, StorageError};
use crate::model::{Facility, FacilityGeometry, FacilityId, FacilityKind, LatLng};
use crate::storage::{FACILITIES_KEY, KeyValueStore};
use crate::surface::{FacilityStyles, LayerHandle, MapSurface};

/// Smallest ring a facility may be created from.
pub const MIN_VERTICES: usize = 3;

/// Point-in-time view of the store, pushed to subscribers on every change.
#[derive(Debug, Clone, Default)]
pub struct FacilitySnapshot {
    pub facilities: Arc<Vec<Facility>>,
    pub selected: Option<FacilityId>,
}

pub struct FacilityStore {
    facilities: IndexMap<FacilityId, Facility>,
    selected: Option<FacilityId>,
    /// Largest id handed out or restored; new ids are always above it.
    id_high_water: u64,
    /// Drives the "Facility N" default names.
    name_counter: usize,
    surface: Arc<dyn MapSurface>,
    storage: Arc<dyn KeyValueStore>,
    styles: FacilityStyles,
    snapshot: watch::Sender<FacilitySnapshot>,
}

impl FacilityStore {
    pub fn new(surface: Arc<dyn MapSurface>, storage: Arc<dyn KeyValueStore>) -> Self {
        let (snapshot, _) = watch::channel(FacilitySnapshot::default());
        Self {
            facilities: IndexMap::new(),
            selected: None,
            id_high_water: 0,
            name_counter: 0,
            surface,
            storage,
            styles: FacilityStyles::default(),
            snapshot,
        }
    }

    pub fn with_styles(mut self, styles: FacilityStyles) -> Self {
        self.styles = styles;
        self
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Create a facility from a finished ring, draw it, select it and persist.
    pub fn create(
        &mut self,
        name: &str,
        coordinates: Vec<LatLng>,
        kind: FacilityKind,
    ) -> Result<Facility, CoreError> {
        if coordinates.len() < MIN_VERTICES {
            return Err(CoreError::validation(format!(
                "a facility needs at least {MIN_VERTICES} vertices, got {}",
                coordinates.len()
            )));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("facility name must not be empty"));
        }

        let id = self.next_id();
        let facility = self.materialize(id, name.to_owned(), kind, coordinates);
        info!(
            facility_id = %id,
            %kind,
            area_m2 = facility.area(),
            perimeter_m = facility.perimeter(),
            "facility created"
        );
        self.facilities.insert(id, facility.clone());

        self.select(id);
        self.persist();
        Ok(facility)
    }

    /// Rename a facility. Unknown ids and blank names are ignored.
    ///
    /// Returns whether the name changed.
    pub fn rename(&mut self, id: FacilityId, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            debug!(facility_id = %id, "ignoring blank rename");
            return false;
        }
        let Some(facility) = self.facilities.get_mut(&id) else {
            debug!(facility_id = %id, "rename of unknown facility ignored");
            return false;
        };

        new_name.clone_into(&mut facility.name);
        if let Some(layer) = facility.layer {
            self.surface.bind_tooltip(layer, &facility.tooltip());
        }
        info!(facility_id = %id, name = new_name, "facility renamed");

        self.publish();
        self.persist();
        true
    }

    /// Remove a facility and its layer. Unknown ids are a no-op and do not
    /// touch storage.
    pub fn delete(&mut self, id: FacilityId) -> Option<Facility> {
        let removed = self.facilities.shift_remove(&id)?;
        if let Some(layer) = removed.layer {
            self.surface.remove_layer(layer);
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        info!(facility_id = %id, "facility deleted");

        self.publish();
        self.persist();
        Some(removed)
    }

    /// Remove every facility. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.facilities.len();
        for facility in self.facilities.values() {
            if let Some(layer) = facility.layer {
                self.surface.remove_layer(layer);
            }
        }
        self.facilities.clear();
        self.selected = None;
        self.name_counter = 0;
        info!(count, "all facilities cleared");

        self.publish();
        self.persist();
        count
    }

    // ── Selection (UI state, never persisted) ────────────────────────

    /// Select a facility and restyle every layer accordingly.
    pub fn select(&mut self, id: FacilityId) -> Option<&Facility> {
        if !self.facilities.contains_key(&id) {
            return None;
        }
        self.selected = Some(id);
        self.restyle();
        self.publish();
        self.facilities.get(&id)
    }

    pub fn deselect(&mut self) {
        if self.selected.take().is_some() {
            self.restyle();
            self.publish();
        }
    }

    /// Fit the view to a facility and select it.
    pub fn focus(&mut self, id: FacilityId) -> Option<&Facility> {
        let layer = self.facilities.get(&id)?.layer?;
        self.surface.fit_bounds(layer);
        self.select(id)
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn get(&self, id: FacilityId) -> Option<&Facility> {
        self.facilities.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Facility> {
        self.facilities.values()
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    pub fn selected(&self) -> Option<&Facility> {
        self.selected.and_then(|id| self.facilities.get(&id))
    }

    pub fn selected_id(&self) -> Option<FacilityId> {
        self.selected
    }

    /// Facility whose shape is `layer`, if any.
    pub fn find_by_layer(&self, layer: LayerHandle) -> Option<FacilityId> {
        self.facilities
            .values()
            .find(|f| f.layer == Some(layer))
            .map(|f| f.id)
    }

    pub fn snapshot(&self) -> FacilitySnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to list/selection changes for re-rendering.
    pub fn subscribe(&self) -> watch::Receiver<FacilitySnapshot> {
        self.snapshot.subscribe()
    }

    /// Next "Facility N" name for a freshly drawn shape.
    pub fn next_default_name(&mut self) -> String {
        self.name_counter += 1;
        format!("Facility {}", self.name_counter)
    }

    // ── Persistence ──────────────────────────────────────────────────

    pub fn serialize(&self) -> Vec<FacilityRecord> {
        self.facilities.values().map(FacilityRecord::from).collect()
    }

    /// Rebuild facilities from persisted records, drawing each one.
    ///
    /// Records without coordinates or with an id already present are
    /// skipped. Geometry is recomputed from the coordinates. The id
    /// high-water mark advances past every restored id.
    pub fn restore(&mut self, records: Vec<FacilityRecord>) -> Vec<Facility> {
        let mut restored = Vec::new();

        for record in records {
            if record.coordinates.is_empty() {
                debug!(facility_id = %record.id, "skipping record without coordinates");
                continue;
            }
            if self.facilities.contains_key(&record.id) {
                warn!(facility_id = %record.id, "skipping record with duplicate id");
                continue;
            }
            if record.coordinates.len() < MIN_VERTICES {
                warn!(
                    facility_id = %record.id,
                    vertices = record.coordinates.len(),
                    "restoring degenerate facility"
                );
            }

            let id = record.id;
            let facility = self.materialize(id, record.name, record.kind, record.coordinates);
            self.id_high_water = self.id_high_water.max(id.get());
            self.facilities.insert(id, facility.clone());
            restored.push(facility);
        }

        self.name_counter = self.name_counter.max(self.facilities.len());
        self.publish();
        restored
    }

    /// Restore from storage. Missing or unreadable data restores nothing.
    pub fn load(&mut self) -> Vec<Facility> {
        let raw = match self.storage.get(FACILITIES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!(error = %e, "failed to read stored facilities");
                return Vec::new();
            }
        };

        let records: Vec<FacilityRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "stored facilities are corrupt, starting empty");
                return Vec::new();
            }
        };

        let restored = self.restore(records);
        info!(count = restored.len(), "facilities loaded from storage");
        restored
    }

    /// Pretty JSON export of every facility, without ids.
    pub fn export_json(&self) -> serde_json::Result<String> {
        let export: Vec<FacilityExport> =
            self.facilities.values().map(FacilityExport::from).collect();
        serde_json::to_string_pretty(&export)
    }

    /// Add the three demo rectangles and leave nothing selected.
    pub fn seed_samples(&mut self) -> Vec<Facility> {
        const SAMPLES: [(&str, [(f64, f64); 4]); 3] = [
            (
                "Main Building",
                [(24.7140, 46.6780), (24.7150, 46.6780), (24.7150, 46.6800), (24.7140, 46.6800)],
            ),
            (
                "Administration Building",
                [(24.7170, 46.6720), (24.7180, 46.6720), (24.7180, 46.6735), (24.7170, 46.6735)],
            ),
            (
                "Warehouse",
                [(24.7100, 46.6750), (24.7115, 46.6750), (24.7115, 46.6770), (24.7100, 46.6770)],
            ),
        ];

        self.name_counter = 0;
        let mut created = Vec::with_capacity(SAMPLES.len());
        for (name, ring) in SAMPLES {
            let ring = ring.iter().copied().map(LatLng::from).collect();
            match self.create(name, ring, FacilityKind::Rectangle) {
                Ok(facility) => created.push(facility),
                Err(e) => warn!(error = %e, name, "sample facility rejected"),
            }
        }
        self.deselect();
        created
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Measure, draw and wrap a ring as a facility (not yet inserted).
    fn materialize(
        &self,
        id: FacilityId,
        name: String,
        kind: FacilityKind,
        coordinates: Vec<LatLng>,
    ) -> Facility {
        let geometry = FacilityGeometry::measure(&coordinates);
        let layer = self.surface.add_shape(&coordinates, &self.styles.normal);
        let facility = Facility {
            id,
            name,
            kind,
            coordinates,
            geometry,
            layer: Some(layer),
        };
        self.surface.bind_tooltip(layer, &facility.tooltip());
        facility
    }

    /// Creation time in milliseconds, bumped past the high-water mark.
    fn next_id(&mut self) -> FacilityId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let id = now.max(self.id_high_water.saturating_add(1));
        self.id_high_water = id;
        FacilityId::new(id)
    }

    fn restyle(&self) {
        for facility in self.facilities.values() {
            let Some(layer) = facility.layer else { continue };
            let style = if self.selected == Some(facility.id) {
                &self.styles.selected
            } else {
                &self.styles.normal
            };
            self.surface.set_style(layer, style);
        }
    }

    fn publish(&self) {
        let snapshot = FacilitySnapshot {
            facilities: Arc::new(self.facilities.values().cloned().collect()),
            selected: self.selected,
        };
        // `send_replace` updates even with zero receivers.
        self.snapshot.send_replace(snapshot);
    }

    fn persist(&self) {
        let records = self.serialize();
        let result = serde_json::to_string(&records)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set(FACILITIES_KEY, &json));
        match result {
            Ok(()) => debug!(count = records.len(), "facilities saved"),
            Err(e) => error!(error = %e, "failed to save facilities, keeping in-memory state"),
        }
    }
}
