use quakemap_shared::{EventRecord, depth_color, marker_radius, mercator, popup_lines};

use crate::colors::{brighten, rgba_css};

/// Fixed marker styling, shared by every event.
pub const STROKE_CSS: &str = "rgba(0,0,0,1)";
pub const STROKE_WIDTH: f64 = 0.5;
pub const FILL_OPACITY: f64 = 0.7;

const HOVER_BRIGHTEN: f64 = 1.35;

/// Pre-formatted CSS colors for the fixed set of alpha values used in
/// rendering. Avoids per-frame `format!()` allocations.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedColors {
    /// Fill (0.7)
    pub fill: String,
    /// Fill, hovered or pinned (0.7, brightened)
    pub fill_active: String,
}

impl CachedColors {
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let (hr, hg, hb) = brighten(r, g, b, HOVER_BRIGHTEN);
        Self {
            fill: rgba_css(r, g, b, FILL_OPACITY),
            fill_active: rgba_css(hr, hg, hb, FILL_OPACITY),
        }
    }
}

/// One earthquake rendered as a circle marker. Position is projected
/// once at construction; the radius is in screen pixels and does not
/// scale with zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct QuakeMarker {
    pub record: EventRecord,
    pub world_x: f64,
    pub world_y: f64,
    /// `magnitude * 4.0`, unclamped (the feed carries negative magnitudes).
    pub radius: f64,
    pub fill_rgb: (u8, u8, u8),
    pub cached: CachedColors,
    pub popup: [String; 4],
}

impl QuakeMarker {
    pub fn from_record(record: EventRecord) -> Self {
        let (world_x, world_y) = mercator::project(record.lon, record.lat);
        let fill_rgb = depth_color(record.depth_km);
        let cached = CachedColors::from_rgb(fill_rgb.0, fill_rgb.1, fill_rgb.2);
        let popup = popup_lines(&record);
        Self {
            radius: marker_radius(record.magnitude),
            record,
            world_x,
            world_y,
            fill_rgb,
            cached,
            popup,
        }
    }
}

/// Build the overlay marker list from fetched records. The list is the
/// overlay: it is threaded through signals, never held in module state.
pub fn from_records(records: Vec<EventRecord>) -> Vec<QuakeMarker> {
    records.into_iter().map(QuakeMarker::from_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quakemap_shared::depth::LIME;

    fn record(mag: f64, depth_km: f64) -> EventRecord {
        EventRecord {
            lat: 40.0,
            lon: -109.3,
            depth_km,
            magnitude: mag,
            place: "Test Quake".to_string(),
            time_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn marker_matches_reference_event() {
        let marker = QuakeMarker::from_record(record(3.5, 12.0));
        assert_eq!(marker.radius, 14.0);
        assert_eq!(marker.fill_rgb, LIME);
        assert_eq!(marker.cached.fill, "rgba(173,255,47,0.7)");
        assert_eq!(marker.popup[0], "Test Quake");
        assert_eq!(marker.popup[1], "M 3.50");
    }

    #[test]
    fn radius_is_not_clamped() {
        assert_eq!(QuakeMarker::from_record(record(0.0, 5.0)).radius, 0.0);
        assert_eq!(QuakeMarker::from_record(record(-0.5, 5.0)).radius, -2.0);
    }

    #[test]
    fn one_marker_per_record() {
        let records: Vec<EventRecord> = (0..23).map(|i| record(i as f64 / 4.0, 8.0)).collect();
        assert_eq!(from_records(records).len(), 23);
    }

    #[test]
    fn position_is_projected_once() {
        let marker = QuakeMarker::from_record(record(1.0, 0.0));
        let (x, y) = mercator::project(-109.3, 40.0);
        assert_eq!((marker.world_x, marker.world_y), (x, y));
    }
}
