pub mod surface;
pub mod viewport;

use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Bounds of a point sequence. Returns None for an empty sequence.
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lng: first.lng,
            max_lng: first.lng,
        };
        for p in &points[1..] {
            bounds.min_lat = bounds.min_lat.min(p.lat);
            bounds.max_lat = bounds.max_lat.max(p.lat);
            bounds.min_lng = bounds.min_lng.min(p.lng);
            bounds.max_lng = bounds.max_lng.max(p.lng);
        }
        Some(bounds)
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// A drawn geometric object. The discriminant is explicit so dispatch is a
/// plain match instead of downcasting whatever the drawing layer produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Circle {
        center: LatLng,
        /// Radius in meters.
        radius: f64,
    },
    Polygon {
        /// First ring is the outer boundary. Rectangles close into a
        /// 4-vertex primary ring.
        rings: Vec<Vec<LatLng>>,
    },
    Polyline {
        points: Vec<LatLng>,
    },
}

impl Shape {
    /// The outer boundary ring, if this shape has one.
    pub fn primary_ring(&self) -> Option<&[LatLng]> {
        match self {
            Shape::Polygon { rings } => rings.first().map(|r| r.as_slice()),
            _ => None,
        }
    }

    /// Anchor point for interactive decorations: circle center, or the
    /// first vertex of the primary ring / point list.
    pub fn anchor(&self) -> Option<LatLng> {
        match self {
            Shape::Circle { center, .. } => Some(*center),
            Shape::Polygon { .. } => self.primary_ring().and_then(|r| r.first().copied()),
            Shape::Polyline { points } => points.first().copied(),
        }
    }

    /// Center point for labels: circle center, or bounding-box center.
    pub fn label_anchor(&self) -> Option<LatLng> {
        match self {
            Shape::Circle { center, .. } => Some(*center),
            Shape::Polygon { .. } => {
                Bounds::from_points(self.primary_ring()?).map(|b| b.center())
            }
            Shape::Polyline { points } => Bounds::from_points(points).map(|b| b.center()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_center() {
        let ring = vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 2.0),
            LatLng::new(4.0, 2.0),
            LatLng::new(4.0, 0.0),
        ];
        let bounds = Bounds::from_points(&ring).unwrap();
        assert_eq!(bounds.center(), LatLng::new(2.0, 1.0));
    }

    #[test]
    fn test_bounds_empty() {
        assert!(Bounds::from_points(&[]).is_none());
    }

    #[test]
    fn test_shape_anchors() {
        let circle = Shape::Circle {
            center: LatLng::new(10.0, 20.0),
            radius: 500.0,
        };
        assert_eq!(circle.anchor(), Some(LatLng::new(10.0, 20.0)));
        assert_eq!(circle.label_anchor(), Some(LatLng::new(10.0, 20.0)));

        let polygon = Shape::Polygon {
            rings: vec![vec![
                LatLng::new(0.0, 0.0),
                LatLng::new(0.0, 2.0),
                LatLng::new(2.0, 2.0),
                LatLng::new(2.0, 0.0),
            ]],
        };
        // Delete control anchors at the first vertex, label at the center.
        assert_eq!(polygon.anchor(), Some(LatLng::new(0.0, 0.0)));
        assert_eq!(polygon.label_anchor(), Some(LatLng::new(1.0, 1.0)));

        let empty = Shape::Polygon { rings: vec![] };
        assert_eq!(empty.anchor(), None);
        assert_eq!(empty.label_anchor(), None);
    }
}
