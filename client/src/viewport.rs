use quakemap_shared::mercator;

/// Viewport manages the pan/zoom transformation from Mercator world
/// coordinates (zoom-0 pixel space) to screen coordinates.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

/// Fixed initial view: `(lat, lon)` center at slippy zoom 5.
pub const INITIAL_CENTER: (f64, f64) = (40.014206, -109.321311);
pub const INITIAL_ZOOM: u32 = 5;

const MIN_TILE_ZOOM: u32 = 2;
const MAX_TILE_ZOOM: u32 = 19;
const ZOOM_SENSITIVITY: f64 = 0.001;

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: mercator::scale_for_zoom(INITIAL_ZOOM),
        }
    }
}

impl Viewport {
    /// Convert world coordinates to screen coordinates.
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.offset_x,
            wy * self.scale + self.offset_y,
        )
    }

    /// Convert screen coordinates to world coordinates.
    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    /// Zoom toward a focus point (screen coordinates) by a wheel delta.
    pub fn zoom_at(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        self.zoom_by_ratio((-delta * ZOOM_SENSITIVITY).exp(), screen_x, screen_y);
    }

    /// Zoom toward a focus point by a raw scale ratio (pinch gestures).
    pub fn zoom_by_ratio(&mut self, factor: f64, screen_x: f64, screen_y: f64) {
        let new_scale = (self.scale * factor).clamp(
            mercator::scale_for_zoom(MIN_TILE_ZOOM),
            mercator::scale_for_zoom(MAX_TILE_ZOOM),
        );
        let ratio = new_scale / self.scale;

        // Adjust offset so the point under the cursor stays fixed
        self.offset_x = screen_x - (screen_x - self.offset_x) * ratio;
        self.offset_y = screen_y - (screen_y - self.offset_y) * ratio;
        self.scale = new_scale;
    }

    /// Pan by screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Place a world coordinate at the canvas center at the current scale.
    pub fn center_on(&mut self, wx: f64, wy: f64, canvas_w: f64, canvas_h: f64) {
        self.offset_x = canvas_w / 2.0 - wx * self.scale;
        self.offset_y = canvas_h / 2.0 - wy * self.scale;
    }

    /// Reset to the fixed initial view.
    pub fn reset(&mut self, canvas_w: f64, canvas_h: f64) {
        let (lat, lon) = INITIAL_CENTER;
        let (wx, wy) = mercator::project(lon, lat);
        self.scale = mercator::scale_for_zoom(INITIAL_ZOOM);
        self.center_on(wx, wy, canvas_w, canvas_h);
    }

    /// Integer tile zoom whose native resolution best matches the scale.
    pub fn tile_zoom(&self) -> u32 {
        (self.scale.log2().round() as i64).clamp(MIN_TILE_ZOOM as i64, MAX_TILE_ZOOM as i64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scale_matches_initial_zoom() {
        assert_eq!(Viewport::default().scale, 32.0);
    }

    #[test]
    fn world_screen_roundtrip() {
        let vp = Viewport {
            offset_x: 40.0,
            offset_y: -12.5,
            scale: 32.0,
        };
        let (sx, sy) = vp.world_to_screen(48.2, 99.1);
        let (wx, wy) = vp.screen_to_world(sx, sy);
        assert!((wx - 48.2).abs() < 1e-9);
        assert!((wy - 99.1).abs() < 1e-9);
    }

    #[test]
    fn zoom_keeps_focus_point_fixed() {
        let mut vp = Viewport::default();
        vp.reset(1200.0, 800.0);
        let (wx, wy) = vp.screen_to_world(300.0, 200.0);
        vp.zoom_at(-250.0, 300.0, 200.0);
        let (wx2, wy2) = vp.screen_to_world(300.0, 200.0);
        assert!((wx - wx2).abs() < 1e-9);
        assert!((wy - wy2).abs() < 1e-9);
    }

    #[test]
    fn reset_centers_initial_coordinate() {
        let mut vp = Viewport::default();
        vp.reset(1200.0, 800.0);
        let (lat, lon) = INITIAL_CENTER;
        let (wx, wy) = quakemap_shared::mercator::project(lon, lat);
        let (sx, sy) = vp.world_to_screen(wx, wy);
        assert!((sx - 600.0).abs() < 1e-9);
        assert!((sy - 400.0).abs() < 1e-9);
    }

    #[test]
    fn tile_zoom_tracks_scale() {
        let mut vp = Viewport::default();
        assert_eq!(vp.tile_zoom(), 5);
        vp.scale = 48.0; // log2 = 5.58 -> 6
        assert_eq!(vp.tile_zoom(), 6);
        vp.scale = 4.0;
        assert_eq!(vp.tile_zoom(), 2);
    }

    #[test]
    fn zoom_is_clamped_to_tile_range() {
        let mut vp = Viewport::default();
        vp.zoom_at(1e9, 0.0, 0.0);
        assert_eq!(vp.scale, 4.0);
        vp.zoom_at(-1e9, 0.0, 0.0);
        assert_eq!(vp.scale, 524_288.0);
    }

    #[test]
    fn pan_moves_offsets() {
        let mut vp = Viewport::default();
        vp.pan(15.0, -7.0);
        assert_eq!(vp.offset_x, 15.0);
        assert_eq!(vp.offset_y, -7.0);
    }
}
