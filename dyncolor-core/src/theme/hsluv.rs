//! HSLuv color type and conversions
//!
//! HSLuv is a perceptually uniform color space where equal changes in hue
//! produce equal perceived color differences across the entire gamut. Its
//! lightness axis doubles as the "tone" of a tonal palette.

use super::Rgb;

/// A color in HSLuv color space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsluvColor {
    /// Hue in degrees (0-360)
    pub hue: f32,
    /// Saturation as percentage (0-100)
    pub saturation: f32,
    /// Lightness as percentage (0-100)
    pub lightness: f32,
}

impl HsluvColor {
    /// Create a new HSLuv color
    pub fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
            saturation: saturation.clamp(0.0, 100.0),
            lightness: lightness.clamp(0.0, 100.0),
        }
    }

    /// Convert to 8-bit sRGB (using hsluv crate)
    pub fn to_rgb(&self) -> Rgb {
        let (r, g, b) = hsluv::hsluv_to_rgb(
            self.hue as f64,
            self.saturation as f64,
            self.lightness as f64,
        );
        // Clamp to handle floating point precision issues from hsluv conversion
        Rgb::from_unit(r as f32, g as f32, b as f32)
    }

    /// Create from 8-bit sRGB
    pub fn from_rgb(color: Rgb) -> Self {
        let [r, g, b] = color.to_unit();
        let (h, s, l) = hsluv::rgb_to_hsluv(r as f64, g as f64, b as f64);
        Self {
            hue: h as f32,
            saturation: s as f32,
            lightness: l as f32,
        }
    }
}

/// A hue/saturation pair sampled at different lightness tones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TonalPalette {
    pub hue: f32,
    pub saturation: f32,
}

impl TonalPalette {
    pub fn new(hue: f32, saturation: f32) -> Self {
        let key = HsluvColor::new(hue, saturation, 50.0);
        Self {
            hue: key.hue,
            saturation: key.saturation,
        }
    }

    /// Color at `tone` (0 = black, 100 = white)
    pub fn tone(&self, tone: f32) -> Rgb {
        HsluvColor::new(self.hue, self.saturation, tone).to_rgb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsluv_roundtrip() {
        let original = HsluvColor::new(180.0, 80.0, 50.0);
        let rgb = original.to_rgb();
        let recovered = HsluvColor::from_rgb(rgb);

        // 8-bit quantization costs a little precision
        assert!((original.hue - recovered.hue).abs() < 2.0);
        assert!((original.saturation - recovered.saturation).abs() < 2.0);
        assert!((original.lightness - recovered.lightness).abs() < 1.0);
    }

    #[test]
    fn test_hue_wrapping() {
        let color = HsluvColor::new(400.0, 50.0, 50.0);
        assert!((color.hue - 40.0).abs() < 0.001);

        let color = HsluvColor::new(-30.0, 50.0, 50.0);
        assert!((color.hue - 330.0).abs() < 0.001);
    }

    #[test]
    fn tones_span_black_to_white() {
        let palette = TonalPalette::new(250.0, 70.0);
        assert_eq!(palette.tone(0.0), Rgb([0, 0, 0]));
        assert_eq!(palette.tone(100.0), Rgb([255, 255, 255]));

        let dark = HsluvColor::from_rgb(palette.tone(20.0));
        let light = HsluvColor::from_rgb(palette.tone(80.0));
        assert!(dark.lightness < light.lightness);
    }
}
