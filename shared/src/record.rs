use crate::feed::EventRecord;

/// Screen radius in CSS pixels per unit of magnitude. Unclamped: zero
/// and negative magnitudes pass straight through.
pub const RADIUS_PER_MAGNITUDE: f64 = 4.0;

pub fn marker_radius(magnitude: f64) -> f64 {
    magnitude * RADIUS_PER_MAGNITUDE
}

/// Popup body for one event: place, magnitude to two decimals, depth,
/// and the event time in UTC.
pub fn popup_lines(record: &EventRecord) -> [String; 4] {
    [
        record.place.clone(),
        format!("M {:.2}", record.magnitude),
        format!("Depth {} km", record.depth_km),
        format_event_time(record.time_ms),
    ]
}

/// Render an epoch-millisecond event time as a UTC timestamp.
pub fn format_event_time(time_ms: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(time_ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("{time_ms} ms"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EventRecord {
        EventRecord {
            lat: 40.0,
            lon: -109.3,
            depth_km: 12.0,
            magnitude: 3.5,
            place: "Test Quake".to_string(),
            time_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn radius_scales_linearly_with_magnitude() {
        assert_eq!(marker_radius(3.5), 14.0);
        assert_eq!(marker_radius(0.0), 0.0);
        assert_eq!(marker_radius(-1.2), -4.8);
        assert_eq!(marker_radius(7.25), 29.0);
    }

    #[test]
    fn popup_carries_place_and_two_decimal_magnitude() {
        let lines = popup_lines(&record());
        assert_eq!(lines[0], "Test Quake");
        assert_eq!(lines[1], "M 3.50");
        assert_eq!(lines[2], "Depth 12 km");
    }

    #[test]
    fn magnitude_is_always_two_decimals() {
        let mut r = record();
        r.magnitude = 6.0;
        assert_eq!(popup_lines(&r)[1], "M 6.00");
        r.magnitude = 2.125;
        assert_eq!(popup_lines(&r)[1], "M 2.12");
    }

    #[test]
    fn event_time_renders_in_utc() {
        assert_eq!(
            format_event_time(1_700_000_000_000),
            "2023-11-14 22:13:20 UTC"
        );
    }

    #[test]
    fn out_of_range_time_falls_back_to_raw_millis() {
        assert_eq!(format_event_time(i64::MAX), format!("{} ms", i64::MAX));
    }
}
