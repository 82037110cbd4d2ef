//! Area measurement: bridges finished drawings to area computation and
//! on-map annotation, and tracks every annotated shape so it can be
//! deleted, relabeled, or cleared.

use serde::Serialize;

use crate::config::MeasureConfig;
use crate::draw::{DrawKind, DrawTools, Language, ShapeCreated};
use crate::geo;
use crate::map::surface::{LayerId, MapSurface, Marker, MarkerKind};
use crate::map::{LatLng, Shape};

/// Stacking order for measurement decorations: labels sit above the shape,
/// delete controls above the labels.
const LABEL_Z_OFFSET: i32 = 900;
const DELETE_Z_OFFSET: i32 = 1000;

/// Display unit for areas. The set is fixed; switching is a wrap-around
/// rotation over these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Kilometers,
    Miles,
    NauticalMiles,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Kilometers, Unit::Miles, Unit::NauticalMiles];

    /// Square meters per one of this unit.
    pub fn factor(self) -> f64 {
        match self {
            Unit::Kilometers => 1e6,
            Unit::Miles => 2_589_988.11,
            Unit::NauticalMiles => 3_429_904.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Kilometers => "km²",
            Unit::Miles => "mi²",
            Unit::NauticalMiles => "nmi²",
        }
    }

    pub fn display_name(self, language: Language) -> &'static str {
        match (language, self) {
            (Language::En, Unit::Kilometers) => "kilometers",
            (Language::En, Unit::Miles) => "miles",
            (Language::En, Unit::NauticalMiles) => "nautical miles",
            (Language::Zh, Unit::Kilometers) => "千米",
            (Language::Zh, Unit::Miles) => "英里",
            (Language::Zh, Unit::NauticalMiles) => "海里",
        }
    }

    pub fn next(self) -> Unit {
        match self {
            Unit::Kilometers => Unit::Miles,
            Unit::Miles => Unit::NauticalMiles,
            Unit::NauticalMiles => Unit::Kilometers,
        }
    }
}

/// A registered shape and its decorations. Geometry stays owned by the
/// surface; the controller only holds layer handles.
#[derive(Debug)]
struct ShapeEntry {
    shape_layer: LayerId,
    delete_marker: LayerId,
    area_marker: LayerId,
}

/// Geometry summary in a measurement export.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometrySummary {
    Circle { center: LatLng, radius: f64 },
    Rings { rings: Vec<Vec<LatLng>> },
    Points { points: Vec<LatLng> },
}

#[derive(Debug, Clone, Serialize)]
pub struct Measurement {
    /// The shape's layer id on the surface.
    pub layer: u64,
    /// Area text under the current unit, e.g. "1.23 km²".
    pub area: String,
    pub geometry: GeometrySummary,
}

/// The measurement controller.
pub struct AreaMeasure {
    config: MeasureConfig,
    unit: Unit,
    entries: Vec<ShapeEntry>,
    created: Option<ShapeCreated>,
}

impl AreaMeasure {
    pub fn new(config: MeasureConfig) -> Self {
        Self {
            config,
            unit: Unit::Kilometers,
            entries: Vec::new(),
            created: None,
        }
    }

    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    /// Wire this controller to the drawing subsystem: applies the
    /// configured language and subscribes to finished shapes. The
    /// subscription lives until `detach` (or drop).
    pub fn attach(&mut self, tools: &mut DrawTools) {
        tools.set_language(Language::from_code(&self.config.language));
        self.created = Some(tools.subscribe());
    }

    /// Drop the shape-created subscription. Shapes finished after this are
    /// discarded by the drawing side.
    pub fn detach(&mut self) {
        self.created = None;
    }

    /// Drain pending finished shapes and annotate each one.
    pub fn poll_created(&mut self, surface: &mut MapSurface) {
        let mut shapes = Vec::new();
        if let Some(created) = &mut self.created {
            while let Ok(shape) = created.try_recv() {
                shapes.push(shape);
            }
        }
        for shape in shapes {
            self.register_shape(surface, shape);
        }
    }

    /// Annotate a finished shape: area label, delete control, registry
    /// entry.
    pub fn register_shape(&mut self, surface: &mut MapSurface, shape: Shape) {
        let area_text = self.area_text(&shape);
        // Label anchors at the circle center or the bounding-box center,
        // the delete control at the circle center or the first vertex.
        // Shapes with no geometry fall back to the world origin.
        let label_anchor = shape.label_anchor().unwrap_or(LatLng::new(0.0, 0.0));
        let delete_anchor = shape.anchor().unwrap_or(LatLng::new(0.0, 0.0));

        let shape_layer = surface.add_shape(shape);
        let area_marker = Self::create_area_marker(surface, label_anchor, area_text);
        let delete_marker = Self::create_delete_marker(surface, delete_anchor);

        tracing::info!(layer = shape_layer.0, "registered shape");
        self.entries.push(ShapeEntry {
            shape_layer,
            delete_marker,
            area_marker,
        });
    }

    /// Raw area of a shape in square meters. Kinds that cannot enclose a
    /// surface measure zero rather than failing.
    pub fn raw_area(shape: &Shape) -> f64 {
        match shape {
            Shape::Circle { radius, .. } => std::f64::consts::PI * radius * radius,
            Shape::Polygon { .. } => match shape.primary_ring() {
                Some(ring) if ring.len() >= 2 => geo::geodesic_area(ring),
                _ => 0.0,
            },
            Shape::Polyline { .. } => 0.0,
        }
    }

    /// Area text under the current unit, e.g. "3.14 km²".
    pub fn area_text(&self, shape: &Shape) -> String {
        let area = Self::raw_area(shape);
        format!("{:.2} {}", area / self.unit.factor(), self.unit.symbol())
    }

    fn create_area_marker(surface: &mut MapSurface, position: LatLng, text: String) -> LayerId {
        surface.add_marker(Marker {
            position,
            kind: MarkerKind::Label(text),
            z_offset: LABEL_Z_OFFSET,
            interactive: false,
            bubbling: true,
        })
    }

    fn create_delete_marker(surface: &mut MapSurface, position: LatLng) -> LayerId {
        surface.add_marker(Marker {
            position,
            kind: MarkerKind::Delete,
            z_offset: DELETE_Z_OFFSET,
            interactive: true,
            bubbling: false,
        })
    }

    /// Route a pointer click. Returns true when the click hit a delete
    /// control and was consumed (it must not reach the map below).
    pub fn handle_click(
        &mut self,
        surface: &mut MapSurface,
        position: LatLng,
        tolerance: (f64, f64),
    ) -> bool {
        let Some(marker_id) = surface.marker_at(position, tolerance) else {
            return false;
        };
        let Some(marker) = surface.marker(marker_id) else {
            return false;
        };
        if marker.kind != MarkerKind::Delete {
            return false;
        }
        let consumed = !marker.bubbling;

        match self.entries.iter().position(|e| e.delete_marker == marker_id) {
            Some(index) => {
                let entry = self.entries.remove(index);
                surface.remove_layer(entry.shape_layer);
                surface.remove_layer(entry.delete_marker);
                surface.remove_layer(entry.area_marker);
                tracing::info!(layer = entry.shape_layer.0, "removed shape");
            }
            // Control without a registry entry: drop the orphan marker.
            None => {
                surface.remove_layer(marker_id);
            }
        }
        consumed
    }

    /// Update the hover affordance for interactive controls under the
    /// pointer.
    pub fn handle_hover(
        &mut self,
        surface: &mut MapSurface,
        position: LatLng,
        tolerance: (f64, f64),
    ) {
        let hovered = surface
            .marker_at(position, tolerance)
            .filter(|id| surface.marker(*id).map(|m| m.kind == MarkerKind::Delete) == Some(true));
        surface.set_hovered(hovered);
    }

    /// Recompute every area label under the current unit.
    pub fn refresh_labels(&mut self, surface: &mut MapSurface) {
        let unit = self.unit;
        for entry in &mut self.entries {
            let Some(shape) = surface.shape(entry.shape_layer).cloned() else {
                continue;
            };
            let text = format!(
                "{:.2} {}",
                Self::raw_area(&shape) / unit.factor(),
                unit.symbol()
            );
            let position = shape.label_anchor().unwrap_or(LatLng::new(0.0, 0.0));
            surface.remove_layer(entry.area_marker);
            entry.area_marker = Self::create_area_marker(surface, position, text);
        }
    }

    /// Rotate to the next display unit and relabel everything.
    pub fn switch_unit(&mut self, surface: &mut MapSurface) -> Unit {
        self.unit = self.unit.next();
        self.refresh_labels(surface);
        self.unit
    }

    pub fn current_unit(&self) -> Unit {
        self.unit
    }

    /// Start interactive drawing for a shape kind (polygon by default),
    /// using the configured drawing style options.
    pub fn start_draw(&self, tools: &mut DrawTools, kind: Option<DrawKind>) {
        tools.enable_draw(
            kind.unwrap_or(DrawKind::Polygon),
            self.config.polygon_options.clone(),
        );
    }

    pub fn stop_draw(&self, tools: &mut DrawTools) {
        tools.disable_draw();
    }

    /// Remove every registered shape and its decorations.
    pub fn clear_all(&mut self, surface: &mut MapSurface) {
        for entry in self.entries.drain(..) {
            surface.remove_layer(entry.shape_layer);
            surface.remove_layer(entry.delete_marker);
            surface.remove_layer(entry.area_marker);
        }
        tracing::info!("cleared all measurements");
    }

    pub fn shape_count(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of all registered measurements under the current unit.
    pub fn measurements(&self, surface: &MapSurface) -> Vec<Measurement> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let shape = surface.shape(entry.shape_layer)?;
                let geometry = match shape {
                    Shape::Circle { center, radius } => GeometrySummary::Circle {
                        center: *center,
                        radius: *radius,
                    },
                    Shape::Polygon { rings } => GeometrySummary::Rings {
                        rings: rings.clone(),
                    },
                    Shape::Polyline { points } => GeometrySummary::Points {
                        points: points.clone(),
                    },
                };
                Some(Measurement {
                    layer: entry.shape_layer.0,
                    area: self.area_text(shape),
                    geometry,
                })
            })
            .collect()
    }
}
