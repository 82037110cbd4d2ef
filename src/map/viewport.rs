use super::LatLng;

const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 4096.0;
const ZOOM_STEP: f64 = 1.5;

/// Visible window onto the map, in geographic coordinates.
///
/// The projection is equirectangular: the canvas x axis is longitude and
/// the y axis is latitude, so at zoom 1 the whole world (360°x180°) is in
/// view and every zoom step narrows both spans by the same factor.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub center: LatLng,
    zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: LatLng::new(0.0, 0.0),
            zoom: MIN_ZOOM,
        }
    }
}

impl Viewport {
    pub fn lng_span(&self) -> f64 {
        360.0 / self.zoom
    }

    pub fn lat_span(&self) -> f64 {
        180.0 / self.zoom
    }

    /// Canvas x bounds (longitude) for the current view.
    pub fn x_bounds(&self) -> [f64; 2] {
        let half = self.lng_span() / 2.0;
        [self.center.lng - half, self.center.lng + half]
    }

    /// Canvas y bounds (latitude) for the current view.
    pub fn y_bounds(&self) -> [f64; 2] {
        let half = self.lat_span() / 2.0;
        [self.center.lat - half, self.center.lat + half]
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
        self.clamp_center();
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
        self.clamp_center();
    }

    /// Pan by a fraction of the visible span. dx/dy are in steps of 1
    /// (right/up positive).
    pub fn pan(&mut self, dx: i8, dy: i8) {
        self.center.lng += f64::from(dx) * self.lng_span() / 8.0;
        self.center.lat += f64::from(dy) * self.lat_span() / 8.0;
        self.clamp_center();
    }

    fn clamp_center(&mut self) {
        let half_lng = self.lng_span() / 2.0;
        let half_lat = self.lat_span() / 2.0;
        self.center.lng = self.center.lng.clamp(-180.0 + half_lng, 180.0 - half_lng);
        self.center.lat = self.center.lat.clamp(-90.0 + half_lat, 90.0 - half_lat);
    }

    /// Convert a terminal cell inside the map widget to geographic
    /// coordinates. `(col, row)` are absolute; `(x, y, width, height)` is
    /// the widget's inner rect. Returns None outside the rect.
    pub fn cell_to_latlng(
        &self,
        (x, y, width, height): (u16, u16, u16, u16),
        col: u16,
        row: u16,
    ) -> Option<LatLng> {
        if width == 0 || height == 0 {
            return None;
        }
        if col < x || col >= x + width || row < y || row >= y + height {
            return None;
        }
        let xb = self.x_bounds();
        let yb = self.y_bounds();
        // Cell centers, with the y axis flipped (row 0 is the top).
        let rel_x = (f64::from(col - x) + 0.5) / f64::from(width);
        let rel_y = (f64::from(row - y) + 0.5) / f64::from(height);
        Some(LatLng::new(
            yb[1] - rel_y * (yb[1] - yb[0]),
            xb[0] + rel_x * (xb[1] - xb[0]),
        ))
    }

    /// Geographic size of one terminal cell: `(lng, lat)` degrees.
    pub fn cell_size(&self, width: u16, height: u16) -> (f64, f64) {
        (
            self.lng_span() / f64::from(width.max(1)),
            self.lat_span() / f64::from(height.max(1)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_view_bounds() {
        let vp = Viewport::default();
        assert_eq!(vp.x_bounds(), [-180.0, 180.0]);
        assert_eq!(vp.y_bounds(), [-90.0, 90.0]);
    }

    #[test]
    fn test_zoom_clamps() {
        let mut vp = Viewport::default();
        vp.zoom_out();
        assert_eq!(vp.x_bounds(), [-180.0, 180.0]);
        for _ in 0..100 {
            vp.zoom_in();
        }
        assert!(vp.lng_span() >= 360.0 / 4096.0 - 1e-9);
    }

    #[test]
    fn test_pan_clamps_to_world() {
        let mut vp = Viewport::default();
        vp.zoom_in();
        for _ in 0..100 {
            vp.pan(1, 1);
        }
        let xb = vp.x_bounds();
        let yb = vp.y_bounds();
        assert!(xb[1] <= 180.0 + 1e-9);
        assert!(yb[1] <= 90.0 + 1e-9);
    }

    #[test]
    fn test_cell_to_latlng_roundtrip() {
        let vp = Viewport::default();
        let rect = (2, 1, 100, 50);
        // Top-left cell maps near the north-west corner.
        let p = vp.cell_to_latlng(rect, 2, 1).unwrap();
        assert!(p.lat > 85.0 && p.lng < -175.0);
        // Center cell maps near the view center.
        let c = vp.cell_to_latlng(rect, 52, 26).unwrap();
        assert!(c.lat.abs() < 5.0 && c.lng.abs() < 5.0);
        // Outside the rect.
        assert!(vp.cell_to_latlng(rect, 1, 1).is_none());
        assert!(vp.cell_to_latlng(rect, 102, 1).is_none());
    }
}
