//! Depth buckets. Marker fill colors and the legend derive from the same
//! six ranges, so the cut points here double as the legend labels.

pub const GREEN: (u8, u8, u8) = (0, 255, 0);
pub const LIME: (u8, u8, u8) = (173, 255, 47);
pub const YELLOW: (u8, u8, u8) = (255, 244, 0);
pub const ORANGE: (u8, u8, u8) = (255, 165, 0);
pub const DARK_ORANGE: (u8, u8, u8) = (255, 69, 0);
pub const RED: (u8, u8, u8) = (255, 0, 0);

/// Legend rows, shallowest first. Exactly six; never recomputed.
pub const LEGEND: [(&str, (u8, u8, u8)); 6] = [
    ("-10 to 10", GREEN),
    ("10 to 30", LIME),
    ("30 to 50", YELLOW),
    ("50 to 70", ORANGE),
    ("70 to 90", DARK_ORANGE),
    ("90+", RED),
];

/// Fill color for an event depth in km. Total over all inputs; the top
/// bucket is strict (`> 90`), every other lower bound is inclusive.
pub fn depth_color(depth_km: f64) -> (u8, u8, u8) {
    if depth_km > 90.0 {
        RED
    } else if depth_km >= 70.0 {
        DARK_ORANGE
    } else if depth_km >= 50.0 {
        ORANGE
    } else if depth_km >= 30.0 {
        YELLOW
    } else if depth_km >= 10.0 {
        LIME
    } else {
        GREEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_boundary_depths() {
        let cases = [
            (-5.0, GREEN),
            (9.9, GREEN),
            (10.0, LIME),
            (29.9, LIME),
            (50.0, ORANGE),
            (69.9, ORANGE),
            (70.0, DARK_ORANGE),
            (90.0, DARK_ORANGE),
            (90.1, RED),
        ];
        for (depth, expected) in cases {
            assert_eq!(depth_color(depth), expected, "depth {depth}");
        }
    }

    #[test]
    fn legend_has_six_rows_in_ascending_order() {
        assert_eq!(LEGEND.len(), 6);
        let labels: Vec<&str> = LEGEND.iter().map(|&(label, _)| label).collect();
        assert_eq!(
            labels,
            [
                "-10 to 10",
                "10 to 30",
                "30 to 50",
                "50 to 70",
                "70 to 90",
                "90+"
            ]
        );
    }

    #[test]
    fn legend_colors_match_classifier_mid_bucket() {
        let mids = [0.0, 20.0, 40.0, 60.0, 80.0, 120.0];
        for (&(_, color), depth) in LEGEND.iter().zip(mids) {
            assert_eq!(depth_color(depth), color, "depth {depth}");
        }
    }
}
