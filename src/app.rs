use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use std::time::Instant;

use crate::config::MeasureConfig;
use crate::draw::{DrawKind, DrawTools, Language};
use crate::map::surface::MapSurface;
use crate::map::viewport::Viewport;
use crate::measure::AreaMeasure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
    Confirm, // Clear-all confirmation
    Measurements,
}

pub struct App {
    pub popup: Popup,

    // Map state
    pub surface: MapSurface,
    pub viewport: Viewport,

    // Drawing and measurement
    pub tools: DrawTools,
    pub measure: AreaMeasure,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    // Inner rect of the map widget, recorded at render time so pointer
    // events can be mapped back to geographic coordinates
    pub map_px: Option<(u16, u16, u16, u16)>,

    pub export_on_exit: bool,
}

impl App {
    pub fn new(config: MeasureConfig, export_on_exit: bool) -> Self {
        let mut tools = DrawTools::new();
        let mut measure = AreaMeasure::new(config);
        measure.attach(&mut tools);

        let mut surface = MapSurface::new();
        surface.ensure_styles(crate::ui::theme().marker_styles(), true);

        Self {
            popup: Popup::None,
            surface,
            viewport: Viewport::default(),
            tools,
            measure,
            status_message: None,
            status_message_time: None,
            map_px: None,
            export_on_exit,
        }
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn language(&self) -> Language {
        self.tools.language()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle popups first
        if self.popup != Popup::None {
            return self.handle_popup_key(key);
        }

        self.handle_normal_key(key)
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        // Escape cancels an in-progress drawing
        if key.code == KeyCode::Esc && self.tools.is_active() {
            self.measure.stop_draw(&mut self.tools);
            self.set_status("Drawing cancelled");
            return Ok(());
        }

        match key.code {
            // Start drawing (polygon is the default kind)
            KeyCode::Char('p') => self.start_draw(Some(DrawKind::Polygon)),
            KeyCode::Char('r') => self.start_draw(Some(DrawKind::Rectangle)),
            KeyCode::Char('o') => self.start_draw(Some(DrawKind::Circle)),

            // Finish an in-progress polygon
            KeyCode::Enter => self.tools.finish(),

            // Cycle display units
            KeyCode::Char('u') => {
                let unit = self.measure.switch_unit(&mut self.surface);
                let name = unit.display_name(self.language());
                self.set_status(format!("Units: {} ({})", name, unit.symbol()));
            }

            // Clear all shapes (confirm first)
            KeyCode::Char('C') => {
                if self.measure.shape_count() > 0 {
                    self.set_status("Clear all shapes? (y/n)");
                    self.popup = Popup::Confirm;
                }
            }

            // Measurement list
            KeyCode::Char('m') => self.popup = Popup::Measurements,

            // Pan / zoom
            KeyCode::Left => self.viewport.pan(-1, 0),
            KeyCode::Right => self.viewport.pan(1, 0),
            KeyCode::Up => self.viewport.pan(0, 1),
            KeyCode::Down => self.viewport.pan(0, -1),
            KeyCode::Char('+') | KeyCode::Char('=') => self.viewport.zoom_in(),
            KeyCode::Char('-') => self.viewport.zoom_out(),

            // Help (? or h)
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Help | Popup::Measurements => {
                if matches!(
                    key.code,
                    KeyCode::Esc
                        | KeyCode::Enter
                        | KeyCode::Char('q')
                        | KeyCode::Char('?')
                        | KeyCode::Char('h')
                        | KeyCode::Char('m')
                ) {
                    self.popup = Popup::None;
                }
                Ok(())
            }
            Popup::Confirm => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => {
                        let cleared = self.measure.shape_count();
                        self.measure.clear_all(&mut self.surface);
                        self.set_status(format!("Cleared {} shapes", cleared));
                        self.popup = Popup::None;
                    }
                    KeyCode::Char('n') | KeyCode::Esc => {
                        self.popup = Popup::None;
                    }
                    _ => {}
                }
                Ok(())
            }
            Popup::None => Ok(()),
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.popup != Popup::None {
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(position) = self.pointer_latlng(mouse.column, mouse.row) else {
                    return;
                };
                if self.tools.is_active() {
                    let snap = self.pointer_tolerance();
                    self.tools.place_vertex(position, snap);
                } else {
                    // Delete controls consume the click before it reaches
                    // the map itself.
                    let tolerance = self.pointer_tolerance();
                    self.measure.handle_click(&mut self.surface, position, tolerance);
                }
            }
            MouseEventKind::Moved => {
                if let Some(position) = self.pointer_latlng(mouse.column, mouse.row) {
                    let tolerance = self.pointer_tolerance();
                    self.measure.handle_hover(&mut self.surface, position, tolerance);
                }
            }
            MouseEventKind::ScrollUp => self.viewport.zoom_in(),
            MouseEventKind::ScrollDown => self.viewport.zoom_out(),
            _ => {}
        }
    }

    fn start_draw(&mut self, kind: Option<DrawKind>) {
        self.measure.start_draw(&mut self.tools, kind);
        if let Some(prompt) = self.tools.prompt() {
            self.set_status(prompt);
        }
    }

    fn pointer_latlng(&self, col: u16, row: u16) -> Option<crate::map::LatLng> {
        self.viewport.cell_to_latlng(self.map_px?, col, row)
    }

    /// Pointer hit radius: about one and a half terminal cells.
    fn pointer_tolerance(&self) -> (f64, f64) {
        let (_, _, width, height) = self.map_px.unwrap_or((0, 0, 1, 1));
        let (dlng, dlat) = self.viewport.cell_size(width, height);
        (dlng * 1.5, dlat * 1.5)
    }

    pub fn tick(&mut self) {
        // Register any shapes finished since the last frame
        self.measure.poll_created(&mut self.surface);

        // Clear status message after 3 seconds
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyModifiers, KeyEventState, KeyEventKind};
    use crate::measure::Unit;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app() -> App {
        App::new(MeasureConfig::default(), false)
    }

    #[test]
    fn test_unit_key_cycles_and_reports() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('u'))).unwrap();
        assert_eq!(app.measure.current_unit(), Unit::Miles);
        assert!(app.status_message.as_deref().unwrap().contains("mi²"));
    }

    #[test]
    fn test_draw_keys_enter_draw_mode() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('o'))).unwrap();
        assert_eq!(app.tools.active_kind(), Some(DrawKind::Circle));
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert!(!app.tools.is_active());
    }

    #[test]
    fn test_clear_all_requires_shapes_and_confirmation() {
        let mut app = app();
        // Nothing drawn: no confirm popup.
        app.handle_key(key(KeyCode::Char('C'))).unwrap();
        assert_eq!(app.popup, Popup::None);

        app.measure.register_shape(
            &mut app.surface,
            crate::map::Shape::Circle {
                center: crate::map::LatLng::new(0.0, 0.0),
                radius: 100.0,
            },
        );
        app.handle_key(key(KeyCode::Char('C'))).unwrap();
        assert_eq!(app.popup, Popup::Confirm);

        // 'n' keeps the shapes.
        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.popup, Popup::None);
        assert_eq!(app.measure.shape_count(), 1);

        app.handle_key(key(KeyCode::Char('C'))).unwrap();
        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert_eq!(app.measure.shape_count(), 0);
        assert!(app.surface.is_empty());
    }

    #[test]
    fn test_popup_swallows_normal_keys() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('?'))).unwrap();
        assert_eq!(app.popup, Popup::Help);
        app.handle_key(key(KeyCode::Char('o'))).unwrap();
        assert!(!app.tools.is_active());
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.popup, Popup::None);
    }
}
