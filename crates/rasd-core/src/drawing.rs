//! Interactive shape drawing.
//!
//! [`DrawingModeController`] turns a stream of discrete map gestures into
//! finished coordinate rings. It is a plain synchronous state machine:
//! every [`DrawingEvent`] is handled to completion before the next one,
//! and any gesture that does not apply to the current mode is ignored.
//!
//! ```text
//! Idle ──ActivateRectangle──▶ Rectangle ──2nd Click──▶ create ──▶ Idle
//! Idle ──ActivatePolygon────▶ Polygon ──DoubleClick/Finish (≥3)──▶ create ──▶ Idle
//! any  ──Cancel─────────────▶ Idle
//! ```

use std::sync::Arc;

use strum::Display;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{Facility, FacilityKind, LatLng};
use crate::store::{FacilityStore, MIN_VERTICES};
use crate::surface::{DrawingStyles, LayerHandle, MapSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DrawingMode {
    #[default]
    Idle,
    Rectangle,
    Polygon,
}

/// A discrete gesture delivered by the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawingEvent {
    ActivateRectangle,
    ActivatePolygon,
    Click(LatLng),
    /// Completes a polygon. Does not add a point of its own.
    DoubleClick(LatLng),
    Finish,
    Cancel,
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingOutcome {
    /// The event does not apply in the current mode.
    Ignored,
    Activated(DrawingMode),
    PointAdded { count: usize },
    Completed(Facility),
    Cancelled,
}

pub struct DrawingModeController {
    mode: DrawingMode,
    points: Vec<LatLng>,
    /// Click markers and guide segments drawn for the in-progress shape.
    artifacts: Vec<LayerHandle>,
    surface: Arc<dyn MapSurface>,
    styles: DrawingStyles,
    /// Name for the shape being drawn, instead of the next default name.
    pending_name: Option<String>,
}

impl DrawingModeController {
    pub fn new(surface: Arc<dyn MapSurface>) -> Self {
        Self {
            mode: DrawingMode::Idle,
            points: Vec::new(),
            artifacts: Vec::new(),
            surface,
            styles: DrawingStyles::default(),
            pending_name: None,
        }
    }

    pub fn with_styles(mut self, styles: DrawingStyles) -> Self {
        self.styles = styles;
        self
    }

    pub fn mode(&self) -> DrawingMode {
        self.mode
    }

    /// Points accumulated for the shape being drawn.
    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn is_drawing(&self) -> bool {
        self.mode != DrawingMode::Idle
    }

    /// Name the shape currently being drawn. Cleared by cancel, tool
    /// switch, and completion.
    pub fn name_pending(&mut self, name: &str) -> Result<(), CoreError> {
        if !self.is_drawing() {
            return Err(CoreError::validation("no shape is being drawn"));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("facility name must not be empty"));
        }
        self.pending_name = Some(name.to_owned());
        Ok(())
    }

    /// Apply one gesture. Completed shapes are created in `store`.
    pub fn on_event(
        &mut self,
        event: DrawingEvent,
        store: &mut FacilityStore,
    ) -> Result<DrawingOutcome, CoreError> {
        match (self.mode, event) {
            (_, DrawingEvent::ActivateRectangle) => Ok(self.activate(DrawingMode::Rectangle)),
            (_, DrawingEvent::ActivatePolygon) => Ok(self.activate(DrawingMode::Polygon)),

            (DrawingMode::Idle, DrawingEvent::Cancel) => Ok(DrawingOutcome::Ignored),
            (_, DrawingEvent::Cancel) => {
                self.reset();
                info!("drawing cancelled");
                Ok(DrawingOutcome::Cancelled)
            }

            (DrawingMode::Rectangle, DrawingEvent::Click(point)) => {
                self.push_point(point);
                if self.points.len() < 2 {
                    return Ok(DrawingOutcome::PointAdded { count: self.points.len() });
                }
                let ring = rectangle_corners(self.points[0], self.points[1]).to_vec();
                self.complete(ring, FacilityKind::Rectangle, store)
            }

            (DrawingMode::Polygon, DrawingEvent::Click(point)) => {
                self.push_point(point);
                Ok(DrawingOutcome::PointAdded { count: self.points.len() })
            }

            (DrawingMode::Polygon, DrawingEvent::DoubleClick(_) | DrawingEvent::Finish) => {
                if self.points.len() < MIN_VERTICES {
                    debug!(points = self.points.len(), "polygon not finished, too few points");
                    return Ok(DrawingOutcome::Ignored);
                }
                let ring = std::mem::take(&mut self.points);
                self.complete(ring, FacilityKind::Polygon, store)
            }

            (
                DrawingMode::Idle,
                DrawingEvent::Click(_) | DrawingEvent::DoubleClick(_) | DrawingEvent::Finish,
            )
            | (DrawingMode::Rectangle, DrawingEvent::DoubleClick(_) | DrawingEvent::Finish) => {
                Ok(DrawingOutcome::Ignored)
            }
        }
    }

    /// Discard the in-progress shape and its artifacts, returning to idle.
    pub fn reset(&mut self) {
        for layer in self.artifacts.drain(..) {
            self.surface.remove_layer(layer);
        }
        self.points.clear();
        self.pending_name = None;
        self.mode = DrawingMode::Idle;
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn activate(&mut self, mode: DrawingMode) -> DrawingOutcome {
        if self.is_drawing() {
            debug!(previous = %self.mode, "switching tool, discarding in-progress drawing");
        }
        self.reset();
        self.mode = mode;
        info!(%mode, "drawing tool activated");
        DrawingOutcome::Activated(mode)
    }

    fn push_point(&mut self, point: LatLng) {
        let marker = self
            .surface
            .add_marker(point, self.styles.marker_radius, &self.styles.marker);
        self.artifacts.push(marker);

        if self.mode == DrawingMode::Polygon {
            if let Some(&previous) = self.points.last() {
                let guide = self.surface.add_guide_line(previous, point, &self.styles.guide);
                self.artifacts.push(guide);
            }
        }

        self.points.push(point);
        debug!(mode = %self.mode, count = self.points.len(), %point, "point added");
    }

    fn complete(
        &mut self,
        ring: Vec<LatLng>,
        kind: FacilityKind,
        store: &mut FacilityStore,
    ) -> Result<DrawingOutcome, CoreError> {
        let name = self.pending_name.take();
        self.reset();
        let name = name.unwrap_or_else(|| store.next_default_name());
        let facility = store.create(&name, ring, kind)?;
        Ok(DrawingOutcome::Completed(facility))
    }
}

/// Axis-aligned rectangle through two opposite corners, ordered NW, NE,
/// SE, SW.
pub fn rectangle_corners(a: LatLng, b: LatLng) -> [LatLng; 4] {
    let north = a.lat.max(b.lat);
    let south = a.lat.min(b.lat);
    let west = a.lng.min(b.lng);
    let east = a.lng.max(b.lng);
    [
        LatLng::new(north, west),
        LatLng::new(north, east),
        LatLng::new(south, east),
        LatLng::new(south, west),
    ]
}
