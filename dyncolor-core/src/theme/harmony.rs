//! Color harmony for accent palettes
//!
//! The tertiary palette of a scheme sits at a fixed hue offset from the
//! seed. Which offset is used is a matter of taste, so it is selectable.

use serde::{Deserialize, Serialize};

/// Hue relationship between the seed and the tertiary accent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum HarmonyMode {
    /// Neighbouring hue, 60 degrees away (subtle)
    #[default]
    Analogous,
    /// Triadic: 120 degrees apart (balanced triangle)
    Triadic,
    /// Complementary: 180 degrees apart (maximum contrast)
    Complementary,
}

impl HarmonyMode {
    /// Hue offset of the accent, in degrees
    pub fn offset(&self) -> f32 {
        match self {
            Self::Analogous => 60.0,
            Self::Triadic => 120.0,
            Self::Complementary => 180.0,
        }
    }

    /// Accent hue for a given seed hue
    pub fn accent_hue(&self, seed_hue: f32) -> f32 {
        (seed_hue + self.offset()).rem_euclid(360.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harmony_offsets() {
        assert_eq!(HarmonyMode::Analogous.offset(), 60.0);
        assert_eq!(HarmonyMode::Triadic.offset(), 120.0);
        assert_eq!(HarmonyMode::Complementary.offset(), 180.0);
    }

    #[test]
    fn test_accent_hue_wraps() {
        let complementary = HarmonyMode::Complementary.accent_hue(270.0);
        assert!((complementary - 90.0).abs() < 0.001);
        let analogous = HarmonyMode::Analogous.accent_hue(330.0);
        assert!((analogous - 30.0).abs() < 0.001);
    }

    #[test]
    fn test_serde_names() {
        let mode: HarmonyMode = serde_json::from_str("\"triadic\"").unwrap();
        assert_eq!(mode, HarmonyMode::Triadic);
    }
}
