//! Interactive drawing: vertex placement, shape completion events, and
//! localized prompts.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::config::PolygonOptions;
use crate::geo;
use crate::map::{LatLng, Shape};

/// Receiver half of the shape-created signal. Dropping it detaches the
/// subscriber; completed shapes are then discarded.
pub type ShapeCreated = UnboundedReceiver<Shape>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Polygon,
    Rectangle,
    Circle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Zh,
}

impl Language {
    pub fn from_code(code: &str) -> Self {
        match code {
            "zh" => Language::Zh,
            _ => Language::En,
        }
    }
}

#[derive(Debug)]
enum DrawState {
    Idle,
    Active {
        kind: DrawKind,
        options: PolygonOptions,
        vertices: Vec<LatLng>,
    },
}

/// The drawing subsystem: owns the in-progress geometry and emits finished
/// shapes on the shape-created channel.
pub struct DrawTools {
    state: DrawState,
    language: Language,
    created_tx: Option<UnboundedSender<Shape>>,
}

impl Default for DrawTools {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawTools {
    pub fn new() -> Self {
        Self {
            state: DrawState::Idle,
            language: Language::En,
            created_tx: None,
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Subscribe to finished shapes. A new subscription replaces any
    /// previous one.
    pub fn subscribe(&mut self) -> ShapeCreated {
        let (tx, rx) = unbounded_channel();
        self.created_tx = Some(tx);
        rx
    }

    /// Enter interactive drawing mode for a shape kind. Any in-progress
    /// geometry is discarded.
    pub fn enable_draw(&mut self, kind: DrawKind, options: PolygonOptions) {
        tracing::debug!(?kind, "enable draw");
        self.state = DrawState::Active {
            kind,
            options,
            vertices: Vec::new(),
        };
    }

    /// Leave drawing mode, discarding any in-progress geometry.
    pub fn disable_draw(&mut self) {
        self.state = DrawState::Idle;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, DrawState::Active { .. })
    }

    pub fn active_kind(&self) -> Option<DrawKind> {
        match &self.state {
            DrawState::Active { kind, .. } => Some(*kind),
            DrawState::Idle => None,
        }
    }

    /// Vertices placed so far, for guide-line rendering.
    pub fn vertices(&self) -> &[LatLng] {
        match &self.state {
            DrawState::Active { vertices, .. } => vertices,
            DrawState::Idle => &[],
        }
    }

    pub fn templine_color(&self) -> Option<&str> {
        match &self.state {
            DrawState::Active { options, .. } => Some(options.templine_color.as_str()),
            DrawState::Idle => None,
        }
    }

    /// Place a vertex at a pointer position. `snap_tolerance` is the
    /// per-axis snap radius in degrees for closing a polygon onto its
    /// first vertex.
    pub fn place_vertex(&mut self, point: LatLng, snap_tolerance: (f64, f64)) {
        let DrawState::Active {
            kind,
            options,
            vertices,
        } = &mut self.state
        else {
            return;
        };

        match kind {
            DrawKind::Polygon => {
                if options.snappable && vertices.len() >= 3 {
                    let first = vertices[0];
                    if (first.lng - point.lng).abs() <= snap_tolerance.0
                        && (first.lat - point.lat).abs() <= snap_tolerance.1
                    {
                        self.finish();
                        return;
                    }
                }
                vertices.push(point);
            }
            DrawKind::Rectangle => {
                if vertices.is_empty() {
                    vertices.push(point);
                } else {
                    let a = vertices[0];
                    let ring = vec![
                        a,
                        LatLng::new(a.lat, point.lng),
                        point,
                        LatLng::new(point.lat, a.lng),
                    ];
                    self.state = DrawState::Idle;
                    self.emit(Shape::Polygon { rings: vec![ring] });
                }
            }
            DrawKind::Circle => {
                if vertices.is_empty() {
                    vertices.push(point);
                } else {
                    let center = vertices[0];
                    let radius = geo::haversine_distance(center, point);
                    self.state = DrawState::Idle;
                    self.emit(Shape::Circle { center, radius });
                }
            }
        }
    }

    /// Finish the in-progress polygon. A ring needs at least 3 vertices;
    /// anything less keeps drawing mode active.
    pub fn finish(&mut self) {
        let DrawState::Active {
            kind: DrawKind::Polygon,
            vertices,
            ..
        } = &mut self.state
        else {
            return;
        };

        if vertices.len() < 3 {
            tracing::debug!("polygon needs 3 vertices to finish");
            return;
        }

        let ring = std::mem::take(vertices);
        self.state = DrawState::Idle;
        self.emit(Shape::Polygon { rings: vec![ring] });
    }

    fn emit(&mut self, shape: Shape) {
        match &self.created_tx {
            Some(tx) => {
                if tx.send(shape).is_err() {
                    tracing::debug!("shape-created subscriber detached; discarding shape");
                    self.created_tx = None;
                }
            }
            None => tracing::debug!("no shape-created subscriber; discarding shape"),
        }
    }

    /// Localized prompt for the current drawing step.
    pub fn prompt(&self) -> Option<&'static str> {
        let DrawState::Active { kind, vertices, .. } = &self.state else {
            return None;
        };
        let prompt = match (self.language, kind, vertices.len()) {
            (Language::En, DrawKind::Polygon, _) => {
                "click to place vertices, Enter to finish, Esc to cancel"
            }
            (Language::En, DrawKind::Rectangle, 0) => "click the first corner",
            (Language::En, DrawKind::Rectangle, _) => "click the opposite corner",
            (Language::En, DrawKind::Circle, 0) => "click the center",
            (Language::En, DrawKind::Circle, _) => "click to set the radius",
            (Language::Zh, DrawKind::Polygon, _) => "单击放置顶点，回车完成，Esc取消",
            (Language::Zh, DrawKind::Rectangle, 0) => "单击第一个角",
            (Language::Zh, DrawKind::Rectangle, _) => "单击对角",
            (Language::Zh, DrawKind::Circle, 0) => "单击圆心",
            (Language::Zh, DrawKind::Circle, _) => "单击确定半径",
        };
        Some(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_SNAP: (f64, f64) = (0.0, 0.0);

    fn tools_with_events() -> (DrawTools, ShapeCreated) {
        let mut tools = DrawTools::new();
        let events = tools.subscribe();
        (tools, events)
    }

    #[test]
    fn test_polygon_draw_and_finish() {
        let (mut tools, mut events) = tools_with_events();
        tools.enable_draw(DrawKind::Polygon, PolygonOptions::default());

        tools.place_vertex(LatLng::new(0.0, 0.0), NO_SNAP);
        tools.place_vertex(LatLng::new(0.0, 1.0), NO_SNAP);
        // Too few vertices: finish is refused, mode stays active.
        tools.finish();
        assert!(tools.is_active());

        tools.place_vertex(LatLng::new(1.0, 1.0), NO_SNAP);
        tools.finish();
        assert!(!tools.is_active());

        let shape = events.try_recv().unwrap();
        assert_eq!(shape.primary_ring().unwrap().len(), 3);
    }

    #[test]
    fn test_polygon_snap_closes_ring() {
        let (mut tools, mut events) = tools_with_events();
        tools.enable_draw(DrawKind::Polygon, PolygonOptions::default());

        tools.place_vertex(LatLng::new(0.0, 0.0), NO_SNAP);
        tools.place_vertex(LatLng::new(0.0, 1.0), NO_SNAP);
        tools.place_vertex(LatLng::new(1.0, 1.0), NO_SNAP);
        // Within snap radius of the first vertex: closes instead of adding.
        tools.place_vertex(LatLng::new(0.01, 0.01), (0.05, 0.05));

        assert!(!tools.is_active());
        let shape = events.try_recv().unwrap();
        assert_eq!(shape.primary_ring().unwrap().len(), 3);
    }

    #[test]
    fn test_snap_disabled_adds_vertex() {
        let (mut tools, _events) = tools_with_events();
        let options = PolygonOptions {
            snappable: false,
            ..Default::default()
        };
        tools.enable_draw(DrawKind::Polygon, options);

        tools.place_vertex(LatLng::new(0.0, 0.0), NO_SNAP);
        tools.place_vertex(LatLng::new(0.0, 1.0), NO_SNAP);
        tools.place_vertex(LatLng::new(1.0, 1.0), NO_SNAP);
        tools.place_vertex(LatLng::new(0.01, 0.01), (0.05, 0.05));

        assert!(tools.is_active());
        assert_eq!(tools.vertices().len(), 4);
    }

    #[test]
    fn test_rectangle_two_corners() {
        let (mut tools, mut events) = tools_with_events();
        tools.enable_draw(DrawKind::Rectangle, PolygonOptions::default());

        tools.place_vertex(LatLng::new(0.0, 0.0), NO_SNAP);
        tools.place_vertex(LatLng::new(2.0, 3.0), NO_SNAP);

        assert!(!tools.is_active());
        let shape = events.try_recv().unwrap();
        let ring = shape.primary_ring().unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], LatLng::new(0.0, 0.0));
        assert_eq!(ring[2], LatLng::new(2.0, 3.0));
    }

    #[test]
    fn test_circle_center_then_radius() {
        let (mut tools, mut events) = tools_with_events();
        tools.enable_draw(DrawKind::Circle, PolygonOptions::default());

        tools.place_vertex(LatLng::new(0.0, 0.0), NO_SNAP);
        tools.place_vertex(LatLng::new(0.0, 1.0), NO_SNAP);

        let Shape::Circle { center, radius } = events.try_recv().unwrap() else {
            panic!("expected a circle");
        };
        assert_eq!(center, LatLng::new(0.0, 0.0));
        assert!((radius - 111_319.0).abs() < 100.0);
    }

    #[test]
    fn test_disable_discards_progress() {
        let (mut tools, mut events) = tools_with_events();
        tools.enable_draw(DrawKind::Polygon, PolygonOptions::default());
        tools.place_vertex(LatLng::new(0.0, 0.0), NO_SNAP);
        tools.disable_draw();

        assert!(!tools.is_active());
        assert!(tools.vertices().is_empty());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_emit_without_subscriber_is_silent() {
        let mut tools = DrawTools::new();
        tools.enable_draw(DrawKind::Rectangle, PolygonOptions::default());
        tools.place_vertex(LatLng::new(0.0, 0.0), NO_SNAP);
        // No subscriber: completion is discarded, not a panic.
        tools.place_vertex(LatLng::new(1.0, 1.0), NO_SNAP);
        assert!(!tools.is_active());
    }

    #[test]
    fn test_prompts_localized() {
        let mut tools = DrawTools::new();
        tools.enable_draw(DrawKind::Circle, PolygonOptions::default());
        assert_eq!(tools.prompt(), Some("click the center"));
        tools.set_language(Language::from_code("zh"));
        assert_eq!(tools.prompt(), Some("单击圆心"));
        tools.disable_draw();
        assert_eq!(tools.prompt(), None);
    }
}
