use crate::data::Bounds;
use std::f64::consts::PI;

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 50_000.0;
const ZOOM_STEP: f64 = 1.5;

/// Visible map window: geographic center, zoom and canvas size in Braille
/// pixels. Zoom 1.0 spans the full longitude range across the canvas; a
/// city-sized dataset sits in the thousands.
#[derive(Clone)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-90 to 90)
    pub center_lat: f64,
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Whole-world view shown before any dataset is attached
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    /// Center on a dataset bounding box and zoom until it fills most of the
    /// canvas
    pub fn fit(&mut self, bounds: Bounds) {
        if bounds.is_empty() || self.width == 0 || self.height == 0 {
            return;
        }

        self.center_lon = (bounds.min_lon + bounds.max_lon) / 2.0;
        self.center_lat = ((bounds.min_lat + bounds.max_lat) / 2.0).clamp(-85.0, 85.0);

        // Mercator y grows downward, so min_lat maps to the larger y
        let (min_x, max_y) = mercator(bounds.min_lon, bounds.min_lat);
        let (max_x, min_y) = mercator(bounds.max_lon, bounds.max_lat);
        let span_x = (max_x - min_x).max(1e-9);
        let span_y = (max_y - min_y).max(1e-9);

        // Projected size is span * zoom * width; leave a 10% margin
        let zoom_x = 0.9 / span_x;
        let zoom_y = 0.9 * self.height as f64 / (span_y * self.width as f64);
        self.zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Pan the viewport by pixel delta. Done in Mercator space so a pixel
    /// of pan moves the map exactly a pixel at any latitude, which keeps
    /// zoom-at-cursor anchoring and hit-testing honest.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.zoom * self.width as f64;
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let x = cx + dx as f64 / scale;
        let y = (cy + dy as f64 / scale).clamp(0.0, 1.0);

        let mut lon = x * 360.0 - 180.0;
        if lon > 180.0 {
            lon -= 360.0;
        } else if lon < -180.0 {
            lon += 360.0;
        }
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

        self.center_lon = lon;
        self.center_lat = lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom by factor while keeping the point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);

        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        // Pan so the anchor point projects back to where it was
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Project a geographic coordinate to canvas pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = mercator(lon, lat);
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let scale = self.zoom * self.width as f64;

        let px = ((x - cx) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - cy) * scale + self.height as f64 / 2.0) as i32;
        (px, py)
    }

    /// Invert `project`: canvas pixel back to (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let scale = self.zoom * self.width as f64;

        let x = (px as f64 - self.width as f64 / 2.0) / scale + cx;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + cy;

        let lon = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
        (lon, lat)
    }

    /// Rough bounding-box visibility check for a projected segment
    pub fn segment_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

/// Web Mercator normalized coordinates: (0,0) top-left, (1,1) bottom-right
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}
