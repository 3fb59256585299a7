/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// Brighten a color by a factor (1.0 = no change, >1.0 = brighter).
pub fn brighten(r: u8, g: u8, b: u8, factor: f64) -> (u8, u8, u8) {
    (
        ((r as f64 * factor).min(255.0)) as u8,
        ((g as f64 * factor).min(255.0)) as u8,
        ((b as f64 * factor).min(255.0)) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_string_shape() {
        assert_eq!(rgba_css(173, 255, 47, 0.7), "rgba(173,255,47,0.7)");
    }

    #[test]
    fn brighten_saturates_at_white() {
        assert_eq!(brighten(200, 200, 200, 2.0), (255, 255, 255));
        assert_eq!(brighten(100, 50, 0, 1.5), (150, 75, 0));
    }
}
