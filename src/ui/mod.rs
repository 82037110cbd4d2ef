use std::sync::OnceLock;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine, Map as CanvasMap, MapResolution},
        Block, Borders, Clear, Paragraph, Row, Table,
    },
    Frame,
};

use crate::app::{App, Popup};
use crate::draw::DrawKind;
use crate::map::surface::{Layer, MarkerKind, MarkerStyles};
use crate::map::{LatLng, Shape};
use crate::measure::GeometrySummary;
use crate::theme::{self, Theme};

// Load theme colors once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn danger() -> Color { theme().danger }
fn water() -> Color { theme().water }

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(4),    // Map
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_map(f, app, chunks[1]);
    draw_footer(f, app, chunks[2]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Help => draw_help_popup(f),
        Popup::Confirm => draw_confirm_popup(f, app),
        Popup::Measurements => draw_measurements_popup(f, app),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let unit = app.measure.current_unit();
    let mut spans = vec![
        Span::styled(" 面積 ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("{} ({})", unit.display_name(app.language()), unit.symbol()),
            Style::default().fg(text()),
        ),
        Span::styled(
            format!(" │ {} shapes", app.measure.shape_count()),
            Style::default().fg(text_dim()),
        ),
    ];

    // Transient status wins over the drawing prompt
    if let Some(msg) = &app.status_message {
        spans.push(Span::styled(" │ ", Style::default().fg(inactive())));
        spans.push(Span::styled(msg.clone(), Style::default().fg(accent())));
    } else if let Some(prompt) = app.tools.prompt() {
        spans.push(Span::styled(" │ ", Style::default().fg(inactive())));
        spans.push(Span::styled(prompt, Style::default().fg(text())));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_map(f: &mut Frame, app: &mut App, area: Rect) {
    let border_color = if app.tools.is_active() { accent() } else { inactive() };
    let title = match app.tools.active_kind() {
        Some(DrawKind::Polygon) => " Map: drawing polygon ",
        Some(DrawKind::Rectangle) => " Map: drawing rectangle ",
        Some(DrawKind::Circle) => " Map: drawing circle ",
        None => " Map ",
    };
    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(text())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(area);
    f.render_widget(block, area);

    // Remember where the map landed so pointer events can be projected
    // back to geographic coordinates
    app.map_px = Some((inner.x, inner.y, inner.width, inner.height));

    let styles = app.surface.styles().cloned().unwrap_or(MarkerStyles {
        delete_fg: text_dim(),
        delete_hover: text_dim(),
        label_fg: text_dim(),
        shape_outline: text_dim(),
    });
    let templine = app
        .tools
        .templine_color()
        .and_then(theme::parse_color)
        .unwrap_or(danger());

    let surface = &app.surface;
    let tools = &app.tools;
    let canvas = Canvas::default()
        .x_bounds(app.viewport.x_bounds())
        .y_bounds(app.viewport.y_bounds())
        .paint(|ctx| {
            ctx.draw(&CanvasMap {
                resolution: MapResolution::High,
                color: water(),
            });

            // Shapes above the base map
            ctx.layer();
            for (_, layer) in surface.layers() {
                if let Layer::Shape(shape) = layer {
                    paint_shape(ctx, shape, styles.shape_outline);
                }
            }

            // In-progress guide line
            if tools.is_active() {
                paint_ring(ctx, tools.vertices(), templine, false);
            }

            // Markers on top, in stacking order
            ctx.layer();
            for (id, marker) in surface.markers_by_z() {
                let span = match &marker.kind {
                    MarkerKind::Label(label) => Span::styled(
                        label.clone(),
                        Style::default().fg(styles.label_fg).add_modifier(Modifier::BOLD),
                    ),
                    MarkerKind::Delete => {
                        let hovered = surface.hovered() == Some(id);
                        let color = if hovered { styles.delete_hover } else { styles.delete_fg };
                        let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
                        Span::styled("X", style)
                    }
                };
                ctx.print(marker.position.lng, marker.position.lat, span);
            }
        });
    f.render_widget(canvas, inner);
}

fn paint_shape(ctx: &mut Context<'_>, shape: &Shape, color: Color) {
    match shape {
        Shape::Circle { center, radius } => {
            paint_ring(ctx, &circle_outline(*center, *radius), color, true);
        }
        Shape::Polygon { rings } => {
            for ring in rings {
                paint_ring(ctx, ring, color, true);
            }
        }
        Shape::Polyline { points } => paint_ring(ctx, points, color, false),
    }
}

fn paint_ring(ctx: &mut Context<'_>, points: &[LatLng], color: Color, closed: bool) {
    if points.len() < 2 {
        return;
    }
    let last = if closed { points.len() } else { points.len() - 1 };
    for i in 0..last {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        ctx.draw(&CanvasLine {
            x1: a.lng,
            y1: a.lat,
            x2: b.lng,
            y2: b.lat,
            color,
        });
    }
}

/// Approximate a geographic circle with a 64-gon. Radius is in meters;
/// one degree of latitude is ~111.32 km, longitude shrinks by cos(lat).
fn circle_outline(center: LatLng, radius: f64) -> Vec<LatLng> {
    const SEGMENTS: usize = 64;
    const METERS_PER_DEGREE: f64 = 111_320.0;

    let dlat = radius / METERS_PER_DEGREE;
    let cos_lat = center.lat.to_radians().cos().max(1e-6);
    let dlng = dlat / cos_lat;

    (0..SEGMENTS)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * (i as f64) / (SEGMENTS as f64);
            LatLng::new(
                center.lat + dlat * angle.sin(),
                center.lng + dlng * angle.cos(),
            )
        })
        .collect()
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let config = app.measure.config();

    // Per-kind hints follow the config toggles; with none enabled the
    // tool is still fully drivable, so fall back to showing all three
    let all = !config.any_draw_hint();
    let mut hints: Vec<(&str, &str)> = Vec::new();
    if all || config.draw_polygon {
        hints.push(("p", "polygon"));
    }
    if all || config.draw_rectangle {
        hints.push(("r", "rect"));
    }
    if all || config.draw_circle {
        hints.push(("o", "circle"));
    }
    hints.push(("u", "units"));
    hints.push(("C", "clear"));
    hints.push(("m", "list"));
    hints.push(("←↑↓→", "pan"));
    hints.push(("+/-", "zoom"));
    hints.push(("?", "help"));
    hints.push(("q", "quit"));

    let mut spans = Vec::new();
    for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(inactive())));
        }
        spans.push(Span::styled(*key, Style::default().fg(accent())));
        spans.push(Span::styled(format!(" {}", label), Style::default().fg(text_dim())));
    }

    let alignment = if config.position.contains("right") {
        Alignment::Right
    } else {
        Alignment::Left
    };
    f.render_widget(Paragraph::new(Line::from(spans)).alignment(alignment), area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(46, 14, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(" Help ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let rows = [
        ("p / r / o", "draw polygon / rectangle / circle"),
        ("click", "place a vertex"),
        ("Enter", "finish the polygon"),
        ("Esc", "cancel drawing"),
        ("X marker", "delete that shape"),
        ("u", "cycle km² → mi² → nmi²"),
        ("C", "clear all shapes"),
        ("m", "list measurements"),
        ("arrows, +/-", "pan and zoom"),
        ("q", "quit"),
    ];
    let lines: Vec<Line> = rows
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!(" {:<12}", key), Style::default().fg(accent())),
                Span::styled(*desc, Style::default().fg(text())),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_confirm_popup(f: &mut Frame, app: &App) {
    let area = centered_rect(40, 5, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(" Confirm ", Style::default().fg(danger()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(danger()));

    let lines = vec![
        Line::from(Span::styled(
            format!(" Remove all {} shapes?", app.measure.shape_count()),
            Style::default().fg(text()),
        )),
        Line::from(vec![
            Span::styled(" y", Style::default().fg(accent())),
            Span::styled(" confirm  ", Style::default().fg(text_dim())),
            Span::styled("n", Style::default().fg(accent())),
            Span::styled(" cancel", Style::default().fg(text_dim())),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_measurements_popup(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 14, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(" Measurements ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let measurements = app.measure.measurements(&app.surface);
    if measurements.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            " No shapes drawn yet",
            Style::default().fg(text_dim()),
        )))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = measurements
        .iter()
        .map(|m| {
            let summary = match &m.geometry {
                GeometrySummary::Circle { center, radius } => format!(
                    "circle @ {:.2},{:.2} r={:.0}m",
                    center.lat, center.lng, radius
                ),
                GeometrySummary::Rings { rings } => format!(
                    "polygon, {} vertices",
                    rings.first().map(|r| r.len()).unwrap_or(0)
                ),
                GeometrySummary::Points { points } => {
                    format!("line, {} points", points.len())
                }
            };
            Row::new(vec![
                format!("#{}", m.layer),
                m.area.clone(),
                summary,
            ])
            .style(Style::default().fg(text()))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(14),
            Constraint::Min(20),
        ],
    )
    .header(
        Row::new(vec!["id", "area", "geometry"])
            .style(Style::default().fg(text_dim()).add_modifier(Modifier::BOLD)),
    )
    .block(block);

    f.render_widget(table, area);
}

/// Centered rect of fixed size, clamped to the frame
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_outline_stays_near_center() {
        let center = LatLng::new(45.0, 10.0);
        let outline = circle_outline(center, 10_000.0);
        assert_eq!(outline.len(), 64);
        for p in &outline {
            // 10 km is well under a quarter degree of latitude.
            assert!((p.lat - center.lat).abs() < 0.25);
            // Longitude offsets widen by 1/cos(45°).
            assert!((p.lng - center.lng).abs() < 0.25 / 45f64.to_radians().cos() + 1e-9);
        }
    }

    #[test]
    fn test_centered_rect_clamps() {
        let area = Rect { x: 0, y: 0, width: 20, height: 10 };
        let rect = centered_rect(100, 100, area);
        assert_eq!(rect.width, 20);
        assert_eq!(rect.height, 10);
        let small = centered_rect(10, 4, area);
        assert_eq!(small.x, 5);
        assert_eq!(small.y, 3);
    }
}
