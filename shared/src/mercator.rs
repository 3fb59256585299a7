//! Web Mercator projection in zoom-0 pixel space: the whole world is a
//! `WORLD_SIZE`-pixel square at zoom 0, and each zoom level doubles it
//! (the slippy-map convention).

use std::f64::consts::PI;

/// Square tile edge in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// World edge at zoom 0 (one tile).
pub const WORLD_SIZE: f64 = TILE_SIZE;

/// Latitude limit beyond which the projection diverges.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Project lon/lat degrees to zoom-0 pixel coordinates. Latitude is
/// clamped to [`MAX_LATITUDE`].
pub fn project(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let lat_rad = lat.to_radians();
    let x = (lon + 180.0) / 360.0 * WORLD_SIZE;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * WORLD_SIZE;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64) -> (f64, f64) {
    let lon = x / WORLD_SIZE * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * y / WORLD_SIZE);
    let lat = n.sinh().atan().to_degrees();
    (lon, lat)
}

/// Viewport scale for an integer slippy zoom level (`2^zoom`).
pub fn scale_for_zoom(zoom: u32) -> f64 {
    (1u64 << zoom) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < tolerance,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    #[test]
    fn origin_projects_to_world_center() {
        let (x, y) = project(0.0, 0.0);
        assert_close(x, WORLD_SIZE / 2.0, 1e-9);
        assert_close(y, WORLD_SIZE / 2.0, 1e-9);
    }

    #[test]
    fn roundtrip_is_identity() {
        let samples = [
            (0.0, 0.0),
            (-109.321311, 40.014206),
            (139.69, 35.68),
            (-180.0, -60.0),
            (179.9, 84.9),
        ];
        for (lon, lat) in samples {
            let (x, y) = project(lon, lat);
            let (lon2, lat2) = unproject(x, y);
            assert_close(lon2, lon, 1e-9);
            assert_close(lat2, lat, 1e-9);
        }
    }

    #[test]
    fn latitude_is_clamped_to_mercator_limit() {
        assert_eq!(project(0.0, 89.0), project(0.0, MAX_LATITUDE));
        assert_eq!(project(0.0, -89.0), project(0.0, -MAX_LATITUDE));
    }

    #[test]
    fn north_is_up() {
        let (_, y_north) = project(0.0, 45.0);
        let (_, y_south) = project(0.0, -45.0);
        assert!(y_north < y_south);
    }

    #[test]
    fn scale_doubles_per_zoom_level() {
        assert_eq!(scale_for_zoom(0), 1.0);
        assert_eq!(scale_for_zoom(5), 32.0);
        assert_eq!(scale_for_zoom(19), 524_288.0);
    }
}
