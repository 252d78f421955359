//! Map rendering surface contract.
//!
//! The core never renders anything itself. It asks a [`MapSurface`] to add,
//! restyle and remove shapes, and keeps the returned [`LayerHandle`]s so it
//! can address them later. Pointer input flows the other way as
//! [`MapEvent`](crate::MapEvent) values that the UI hands to the core.
//!
//! [`HeadlessSurface`] keeps every layer in memory. The CLI runs on it, and
//! tests use it to observe what would have been drawn.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::model::LatLng;

// ── LayerHandle ──────────────────────────────────────────────────────

/// Opaque reference to a rendering object owned by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerHandle(u64);

impl LayerHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

// ── Styles ───────────────────────────────────────────────────────────

/// Stroke and fill styling for a shape or guide line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub weight: f64,
    /// Dash pattern such as `"5, 5"`; solid when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

impl ShapeStyle {
    pub fn solid(color: &str, fill_opacity: f64, weight: f64) -> Self {
        Self {
            color: color.into(),
            fill_color: color.into(),
            fill_opacity,
            weight,
            dash_array: None,
        }
    }
}

/// The two looks a facility layer can have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityStyles {
    pub normal: ShapeStyle,
    pub selected: ShapeStyle,
}

impl Default for FacilityStyles {
    fn default() -> Self {
        Self {
            normal: ShapeStyle::solid("#10b981", 0.2, 2.0),
            selected: ShapeStyle::solid("#3b82f6", 0.3, 3.0),
        }
    }
}

/// Styling for the temporary artifacts shown while drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingStyles {
    pub marker: ShapeStyle,
    pub marker_radius: f64,
    pub guide: ShapeStyle,
}

impl Default for DrawingStyles {
    fn default() -> Self {
        Self {
            marker: ShapeStyle {
                color: "#ffffff".into(),
                fill_color: "#3b82f6".into(),
                fill_opacity: 1.0,
                weight: 2.0,
                dash_array: None,
            },
            marker_radius: 6.0,
            guide: ShapeStyle {
                color: "#3b82f6".into(),
                fill_color: "#3b82f6".into(),
                fill_opacity: 0.0,
                weight: 2.0,
                dash_array: Some("5, 5".into()),
            },
        }
    }
}

// ── MapSurface ───────────────────────────────────────────────────────

/// Rendering collaborator for facility shapes and drawing artifacts.
///
/// Methods take `&self`; implementations own whatever interior
/// mutability their rendering backend needs.
pub trait MapSurface: Send + Sync {
    /// Add a closed shape through `ring` and return its handle.
    fn add_shape(&self, ring: &[LatLng], style: &ShapeStyle) -> LayerHandle;

    /// Remove a layer. Unknown handles are ignored.
    fn remove_layer(&self, layer: LayerHandle);

    fn set_style(&self, layer: LayerHandle, style: &ShapeStyle);

    /// Attach (or replace) the hover tooltip of a layer.
    fn bind_tooltip(&self, layer: LayerHandle, text: &str);

    /// Move the view so the layer's bounds are visible.
    fn fit_bounds(&self, layer: LayerHandle);

    /// Add a click marker at `point`.
    fn add_marker(&self, point: LatLng, radius: f64, style: &ShapeStyle) -> LayerHandle;

    /// Add a straight guide segment between two clicks.
    fn add_guide_line(&self, from: LatLng, to: LatLng, style: &ShapeStyle) -> LayerHandle;
}

// ── HeadlessSurface ──────────────────────────────────────────────────

/// What a [`HeadlessSurface`] layer represents.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerShape {
    Shape(Vec<LatLng>),
    Marker { point: LatLng, radius: f64 },
    GuideLine { from: LatLng, to: LatLng },
}

/// A layer recorded by [`HeadlessSurface`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessLayer {
    pub shape: LayerShape,
    pub style: ShapeStyle,
    pub tooltip: Option<String>,
}

/// In-memory surface: records layers instead of drawing them.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    layers: DashMap<LayerHandle, HeadlessLayer>,
    next_handle: AtomicU64,
    last_fit: Mutex<Option<LayerHandle>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, handle: LayerHandle) -> Option<HeadlessLayer> {
        self.layers.get(&handle).map(|r| r.value().clone())
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Number of filled shapes, excluding markers and guide lines.
    pub fn shape_count(&self) -> usize {
        self.layers
            .iter()
            .filter(|r| matches!(r.value().shape, LayerShape::Shape(_)))
            .count()
    }

    /// The layer most recently passed to `fit_bounds`.
    pub fn last_fit(&self) -> Option<LayerHandle> {
        *self.last_fit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, shape: LayerShape, style: &ShapeStyle) -> LayerHandle {
        let handle = LayerHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        self.layers.insert(
            handle,
            HeadlessLayer {
                shape,
                style: style.clone(),
                tooltip: None,
            },
        );
        handle
    }
}

impl MapSurface for HeadlessSurface {
    fn add_shape(&self, ring: &[LatLng], style: &ShapeStyle) -> LayerHandle {
        self.insert(LayerShape::Shape(ring.to_vec()), style)
    }

    fn remove_layer(&self, layer: LayerHandle) {
        self.layers.remove(&layer);
    }

    fn set_style(&self, layer: LayerHandle, style: &ShapeStyle) {
        if let Some(mut entry) = self.layers.get_mut(&layer) {
            entry.style = style.clone();
        }
    }

    fn bind_tooltip(&self, layer: LayerHandle, text: &str) {
        if let Some(mut entry) = self.layers.get_mut(&layer) {
            entry.tooltip = Some(text.to_owned());
        }
    }

    fn fit_bounds(&self, layer: LayerHandle) {
        *self.last_fit.lock().unwrap_or_else(PoisonError::into_inner) = Some(layer);
    }

    fn add_marker(&self, point: LatLng, radius: f64, style: &ShapeStyle) -> LayerHandle {
        self.insert(LayerShape::Marker { point, radius }, style)
    }

    fn add_guide_line(&self, from: LatLng, to: LatLng, style: &ShapeStyle) -> LayerHandle {
        self.insert(LayerShape::GuideLine { from, to }, style)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_removable() {
        let surface = HeadlessSurface::new();
        let style = ShapeStyle::solid("#000000", 0.5, 1.0);
        let a = surface.add_marker(LatLng::new(1.0, 1.0), 6.0, &style);
        let b = surface.add_shape(&[LatLng::new(0.0, 0.0)], &style);
        assert_ne!(a, b);
        assert_eq!(surface.layer_count(), 2);
        assert_eq!(surface.shape_count(), 1);

        surface.remove_layer(a);
        surface.remove_layer(a);
        assert_eq!(surface.layer_count(), 1);
    }

    #[test]
    fn restyle_and_tooltip_update_in_place() {
        let surface = HeadlessSurface::new();
        let styles = FacilityStyles::default();
        let layer = surface.add_shape(&[LatLng::new(0.0, 0.0)], &styles.normal);

        surface.set_style(layer, &styles.selected);
        surface.bind_tooltip(layer, "North gate");
        surface.fit_bounds(layer);

        let recorded = surface.layer(layer).expect("layer exists");
        assert_eq!(recorded.style, styles.selected);
        assert_eq!(recorded.tooltip.as_deref(), Some("North gate"));
        assert_eq!(surface.last_fit(), Some(layer));
    }
}
