//! HSL-based shading of group base colors.

use plotters::style::RGBColor;

/// Returns a lightness-adjusted variant of a base color. The lightness is
/// multiplied by `factor` and clamped to 0.2..=0.9 so shades stay legible
/// on a white background.
pub(crate) fn shade(base: (u8, u8, u8), factor: f64) -> RGBColor {
    let (h, l, s) = rgb_to_hls(base);
    let l = (l * factor).clamp(0.2, 0.9);
    let (r, g, b) = hls_to_rgb(h, l, s);
    RGBColor(r, g, b)
}

fn rgb_to_hls((r, g, b): (u8, u8, u8)) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return (0.0, l, 0.0);
    }

    let delta = max - min;
    let s = if l <= 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };

    let h = if max == r {
        (g - b) / delta
    } else if max == g {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };
    let h = (h / 6.0).rem_euclid(1.0);

    (h, l, s)
}

fn hls_to_rgb(h: f64, l: f64, s: f64) -> (u8, u8, u8) {
    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;

    let channel = |hue: f64| {
        let hue = hue.rem_euclid(1.0);
        let v = if hue < 1.0 / 6.0 {
            m1 + (m2 - m1) * hue * 6.0
        } else if hue < 0.5 {
            m2
        } else if hue < 2.0 / 3.0 {
            m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
        } else {
            m1
        };
        (v * 255.0).round() as u8
    };

    (channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_factor_roundtrips() {
        // Factor 1.0 keeps a mid-lightness color unchanged (modulo rounding).
        let RGBColor(r, g, b) = shade((0xFF, 0x63, 0x47), 1.0);
        assert!((r as i32 - 0xFF).abs() <= 2);
        assert!((g as i32 - 0x63).abs() <= 2);
        assert!((b as i32 - 0x47).abs() <= 2);
    }

    #[test]
    fn test_higher_factor_is_lighter() {
        let RGBColor(r1, g1, b1) = shade((0x8A, 0x2B, 0xE2), 0.8);
        let RGBColor(r2, g2, b2) = shade((0x8A, 0x2B, 0xE2), 1.2);
        let sum1 = r1 as u32 + g1 as u32 + b1 as u32;
        let sum2 = r2 as u32 + g2 as u32 + b2 as u32;
        assert!(sum2 > sum1);
    }

    #[test]
    fn test_lightness_clamped() {
        // An extreme factor cannot push the shade to pure white or black.
        let RGBColor(r, g, b) = shade((0xF0, 0x80, 0x80), 10.0);
        assert!(r < 255 || g < 255 || b < 255);
        let RGBColor(r, g, b) = shade((0xF0, 0x80, 0x80), 0.0);
        assert!(r > 0 || g > 0 || b > 0);
    }

    #[test]
    fn test_grayscale_input() {
        let RGBColor(r, g, b) = shade((0x80, 0x80, 0x80), 1.0);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }
}
