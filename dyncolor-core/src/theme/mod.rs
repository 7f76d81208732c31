//! Content-based color schemes
//!
//! A [`ThemeDeriver`] turns a loaded image into a [`ColorScheme`]. The
//! default [`ContentThemeDeriver`] picks a seed color from the pixels and
//! expands it into tonal palettes in HSLuv space, assigning Material-style
//! roles (primary, surface, outline, ...) at fixed tones.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::fetch::LoadedImage;

pub mod harmony;
pub mod hsluv;
pub mod seed;

pub use harmony::HarmonyMode;
pub use hsluv::{HsluvColor, TonalPalette};
pub use seed::extract_seed;

/// Hue of the fixed error palette
const ERROR_HUE: f32 = 12.0;
const ERROR_SATURATION: f32 = 90.0;
/// Seeds below this saturation produce a neutral scheme
const NEUTRAL_SEED_SATURATION: f32 = 8.0;
const MIN_PRIMARY_SATURATION: f32 = 48.0;

/// An 8-bit sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    /// Build from unit floats, clamping out-of-range channels
    pub fn from_unit(r: f32, g: f32, b: f32) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self([channel(r), channel(g), channel(b)])
    }

    pub fn to_unit(self) -> [f32; 3] {
        let [r, g, b] = self.0;
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }

    /// WCAG relative luminance
    pub fn relative_luminance(self) -> f32 {
        let linear = |c: f32| {
            if c <= 0.040_45 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        let [r, g, b] = self.to_unit();
        0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
    }

    /// WCAG contrast ratio between two colors (1.0 - 21.0)
    pub fn contrast_ratio(self, other: Rgb) -> f32 {
        let (a, b) = (self.relative_luminance(), other.relative_luminance());
        let (light, dark) = if a > b { (a, b) } else { (b, a) };
        (light + 0.05) / (dark + 0.05)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

/// Error parsing a `#rrggbb` string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color '{0}'")]
pub struct ParseRgbError(String);

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseRgbError(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| ParseRgbError(s.to_string()))
        };
        Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Light or dark scheme
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Brightness {
    #[default]
    Light,
    Dark,
}

/// Color roles derived from a seed color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub brightness: Brightness,
    pub seed: Rgb,
    pub primary: Rgb,
    pub on_primary: Rgb,
    pub primary_container: Rgb,
    pub on_primary_container: Rgb,
    pub secondary: Rgb,
    pub on_secondary: Rgb,
    pub tertiary: Rgb,
    pub on_tertiary: Rgb,
    pub error: Rgb,
    pub on_error: Rgb,
    pub background: Rgb,
    pub on_background: Rgb,
    pub surface: Rgb,
    pub on_surface: Rgb,
    pub surface_variant: Rgb,
    pub on_surface_variant: Rgb,
    pub outline: Rgb,
}

/// Tone assignment for one brightness
struct Tones {
    accent: f32,
    on_accent: f32,
    container: f32,
    on_container: f32,
    surface: f32,
    on_surface: f32,
    surface_variant: f32,
    on_surface_variant: f32,
    outline: f32,
}

impl Brightness {
    fn tones(self) -> Tones {
        match self {
            Brightness::Light => Tones {
                accent: 40.0,
                on_accent: 100.0,
                container: 90.0,
                on_container: 10.0,
                surface: 98.0,
                on_surface: 10.0,
                surface_variant: 90.0,
                on_surface_variant: 30.0,
                outline: 50.0,
            },
            Brightness::Dark => Tones {
                accent: 80.0,
                on_accent: 20.0,
                container: 30.0,
                on_container: 90.0,
                surface: 6.0,
                on_surface: 90.0,
                surface_variant: 30.0,
                on_surface_variant: 80.0,
                outline: 60.0,
            },
        }
    }
}

impl ColorScheme {
    /// Expand a seed color into a full scheme
    pub fn from_seed(
        seed: Rgb,
        brightness: Brightness,
        harmony: HarmonyMode,
    ) -> Self {
        let key = HsluvColor::from_rgb(seed);

        let primary_saturation = if key.saturation < NEUTRAL_SEED_SATURATION {
            key.saturation
        } else {
            key.saturation.max(MIN_PRIMARY_SATURATION)
        };

        let primary = TonalPalette::new(key.hue, primary_saturation);
        let secondary = TonalPalette::new(key.hue, primary_saturation / 3.0);
        let tertiary = TonalPalette::new(
            harmony.accent_hue(key.hue),
            primary_saturation / 2.0,
        );
        let neutral = TonalPalette::new(key.hue, key.saturation.min(6.0));
        let neutral_variant =
            TonalPalette::new(key.hue, key.saturation.min(12.0));
        let error = TonalPalette::new(ERROR_HUE, ERROR_SATURATION);

        let t = brightness.tones();

        Self {
            brightness,
            seed,
            primary: primary.tone(t.accent),
            on_primary: primary.tone(t.on_accent),
            primary_container: primary.tone(t.container),
            on_primary_container: primary.tone(t.on_container),
            secondary: secondary.tone(t.accent),
            on_secondary: secondary.tone(t.on_accent),
            tertiary: tertiary.tone(t.accent),
            on_tertiary: tertiary.tone(t.on_accent),
            error: error.tone(t.accent),
            on_error: error.tone(t.on_accent),
            background: neutral.tone(t.surface),
            on_background: neutral.tone(t.on_surface),
            surface: neutral.tone(t.surface),
            on_surface: neutral.tone(t.on_surface),
            surface_variant: neutral_variant.tone(t.surface_variant),
            on_surface_variant: neutral_variant.tone(t.on_surface_variant),
            outline: neutral_variant.tone(t.outline),
        }
    }

    /// Named roles in display order
    pub fn roles(&self) -> [(&'static str, Rgb); 18] {
        [
            ("seed", self.seed),
            ("primary", self.primary),
            ("on_primary", self.on_primary),
            ("primary_container", self.primary_container),
            ("on_primary_container", self.on_primary_container),
            ("secondary", self.secondary),
            ("on_secondary", self.on_secondary),
            ("tertiary", self.tertiary),
            ("on_tertiary", self.on_tertiary),
            ("error", self.error),
            ("on_error", self.on_error),
            ("background", self.background),
            ("on_background", self.on_background),
            ("surface", self.surface),
            ("on_surface", self.on_surface),
            ("surface_variant", self.surface_variant),
            ("on_surface_variant", self.on_surface_variant),
            ("outline", self.outline),
        ]
    }
}

/// Turns a loaded image into a color scheme
pub trait ThemeDeriver: Send + Sync {
    fn derive(&self, image: &LoadedImage) -> ColorScheme;
}

/// Derives the scheme from the image's dominant color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentThemeDeriver {
    pub brightness: Brightness,
    pub harmony: HarmonyMode,
}

impl ContentThemeDeriver {
    pub fn new(brightness: Brightness) -> Self {
        Self {
            brightness,
            harmony: HarmonyMode::default(),
        }
    }

    pub fn with_harmony(mut self, harmony: HarmonyMode) -> Self {
        self.harmony = harmony;
        self
    }
}

impl ThemeDeriver for ContentThemeDeriver {
    fn derive(&self, image: &LoadedImage) -> ColorScheme {
        let seed = extract_seed(&image.pixels);
        tracing::debug!(source = %image.source, %seed, "derived seed color");
        ColorScheme::from_seed(seed, self.brightness, self.harmony)
    }
}
