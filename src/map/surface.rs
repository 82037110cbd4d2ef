use ratatui::style::Color;

use super::{LatLng, Shape};

/// Handle to a layer owned by the surface. The measurement controller only
/// ever holds these, never the geometry itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// What an interactive marker renders as.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    /// Delete affordance, rendered as an "X".
    Delete,
    /// Non-interactive text label.
    Label(String),
}

/// A point decoration placed on the surface.
#[derive(Debug, Clone)]
pub struct Marker {
    pub position: LatLng,
    pub kind: MarkerKind,
    /// Stacking order; higher renders on top.
    pub z_offset: i32,
    pub interactive: bool,
    /// Whether pointer events on this marker continue to the map below.
    pub bubbling: bool,
}

#[derive(Debug, Clone)]
pub enum Layer {
    Shape(Shape),
    Marker(Marker),
}

/// Visual styles for measurement decorations. Registered once on the
/// surface; rendering falls back to dim defaults when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyles {
    pub delete_fg: Color,
    pub delete_hover: Color,
    pub label_fg: Color,
    pub shape_outline: Color,
}

/// The host mapping surface: owns all visual layers and markers, resolves
/// pointer hits, and carries the registered decoration styles.
#[derive(Debug, Default)]
pub struct MapSurface {
    layers: Vec<(LayerId, Layer)>,
    next_id: u64,
    styles: Option<MarkerStyles>,
    hovered: Option<LayerId>,
}

impl MapSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_id(&mut self) -> LayerId {
        self.next_id += 1;
        LayerId(self.next_id)
    }

    pub fn add_shape(&mut self, shape: Shape) -> LayerId {
        let id = self.issue_id();
        self.layers.push((id, Layer::Shape(shape)));
        id
    }

    pub fn add_marker(&mut self, marker: Marker) -> LayerId {
        let id = self.issue_id();
        self.layers.push((id, Layer::Marker(marker)));
        id
    }

    /// Remove a layer. Removing an id that is already gone is a no-op.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        let before = self.layers.len();
        self.layers.retain(|(layer_id, _)| *layer_id != id);
        self.layers.len() != before
    }

    pub fn shape(&self, id: LayerId) -> Option<&Shape> {
        self.layers.iter().find_map(|(layer_id, layer)| match layer {
            Layer::Shape(shape) if *layer_id == id => Some(shape),
            _ => None,
        })
    }

    pub fn marker(&self, id: LayerId) -> Option<&Marker> {
        self.layers.iter().find_map(|(layer_id, layer)| match layer {
            Layer::Marker(marker) if *layer_id == id => Some(marker),
            _ => None,
        })
    }

    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &Layer)> {
        self.layers.iter().map(|(id, layer)| (*id, layer))
    }

    /// Markers in stacking order, lowest first.
    pub fn markers_by_z(&self) -> Vec<(LayerId, &Marker)> {
        let mut markers: Vec<_> = self
            .layers
            .iter()
            .filter_map(|(id, layer)| match layer {
                Layer::Marker(marker) => Some((*id, marker)),
                _ => None,
            })
            .collect();
        markers.sort_by_key(|(_, marker)| marker.z_offset);
        markers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Topmost interactive marker within `(tol_lng, tol_lat)` degrees of a
    /// pointer position.
    pub fn marker_at(&self, position: LatLng, tolerance: (f64, f64)) -> Option<LayerId> {
        self.markers_by_z()
            .into_iter()
            .rev()
            .find(|(_, marker)| {
                marker.interactive
                    && (marker.position.lng - position.lng).abs() <= tolerance.0
                    && (marker.position.lat - position.lat).abs() <= tolerance.1
            })
            .map(|(id, _)| id)
    }

    pub fn set_hovered(&mut self, id: Option<LayerId>) {
        self.hovered = id;
    }

    pub fn hovered(&self) -> Option<LayerId> {
        self.hovered
    }

    /// Register decoration styles. Idempotent: once registered the call is
    /// a no-op, and `enable = false` skips registration entirely.
    pub fn ensure_styles(&mut self, styles: MarkerStyles, enable: bool) -> bool {
        if !enable || self.styles.is_some() {
            return false;
        }
        self.styles = Some(styles);
        true
    }

    pub fn styles(&self) -> Option<&MarkerStyles> {
        self.styles.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delete_marker(position: LatLng, z_offset: i32) -> Marker {
        Marker {
            position,
            kind: MarkerKind::Delete,
            z_offset,
            interactive: true,
            bubbling: false,
        }
    }

    fn test_styles() -> MarkerStyles {
        MarkerStyles {
            delete_fg: Color::Red,
            delete_hover: Color::LightRed,
            label_fg: Color::Blue,
            shape_outline: Color::Blue,
        }
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut surface = MapSurface::new();
        let id = surface.add_marker(delete_marker(LatLng::new(0.0, 0.0), 1000));
        assert!(surface.remove_layer(id));
        assert!(!surface.remove_layer(id));
        assert!(surface.is_empty());
    }

    #[test]
    fn test_remove_clears_hover() {
        let mut surface = MapSurface::new();
        let id = surface.add_marker(delete_marker(LatLng::new(0.0, 0.0), 1000));
        surface.set_hovered(Some(id));
        surface.remove_layer(id);
        assert_eq!(surface.hovered(), None);
    }

    #[test]
    fn test_marker_hit_respects_z_order_and_interactivity() {
        let mut surface = MapSurface::new();
        let label = surface.add_marker(Marker {
            position: LatLng::new(0.0, 0.0),
            kind: MarkerKind::Label("1.00 km²".into()),
            z_offset: 900,
            interactive: false,
            bubbling: true,
        });
        let below = surface.add_marker(delete_marker(LatLng::new(0.0, 0.0), 500));
        let top = surface.add_marker(delete_marker(LatLng::new(0.0, 0.001), 1000));

        let hit = surface.marker_at(LatLng::new(0.0, 0.0), (0.01, 0.01));
        assert_eq!(hit, Some(top));
        assert_ne!(hit, Some(label));
        assert_ne!(hit, Some(below));

        // Out of tolerance: nothing.
        assert_eq!(surface.marker_at(LatLng::new(5.0, 5.0), (0.01, 0.01)), None);
    }

    #[test]
    fn test_style_registration_is_idempotent() {
        let mut surface = MapSurface::new();
        assert!(!surface.ensure_styles(test_styles(), false));
        assert!(surface.styles().is_none());

        assert!(surface.ensure_styles(test_styles(), true));
        let mut other = test_styles();
        other.delete_fg = Color::Green;
        assert!(!surface.ensure_styles(other, true));
        assert_eq!(surface.styles().unwrap().delete_fg, Color::Red);
    }
}
