//! Orientation classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse orientation bucket derived from a floored width/height ratio.
///
/// Only used to namespace storage keys. The integer floor makes every
/// ratio in `[1, 2)` land in `Landscape`, square and 4:3 included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationClass {
    Landscape,
    Portrait,
    Other,
}

/// floor(16 / 9)
const LANDSCAPE_RATIO: u32 = 16 / 9;
/// floor(9 / 16)
const PORTRAIT_RATIO: u32 = 9 / 16;

impl OrientationClass {
    /// Classify from probed dimensions.
    ///
    /// A zero height yields `Other`.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        match width.checked_div(height) {
            Some(LANDSCAPE_RATIO) => OrientationClass::Landscape,
            Some(PORTRAIT_RATIO) => OrientationClass::Portrait,
            _ => OrientationClass::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrientationClass::Landscape => "landscape",
            OrientationClass::Portrait => "portrait",
            OrientationClass::Other => "other",
        }
    }
}

impl fmt::Display for OrientationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_hd_is_landscape() {
        assert_eq!(OrientationClass::from_dimensions(1920, 1080), OrientationClass::Landscape);
    }

    #[test]
    fn test_vertical_is_portrait() {
        assert_eq!(OrientationClass::from_dimensions(1080, 1920), OrientationClass::Portrait);
    }

    #[test]
    fn test_square_floors_to_landscape() {
        assert_eq!(OrientationClass::from_dimensions(800, 800), OrientationClass::Landscape);
        assert_eq!(OrientationClass::from_dimensions(1440, 1080), OrientationClass::Landscape);
    }

    #[test]
    fn test_ultra_wide_is_other() {
        assert_eq!(OrientationClass::from_dimensions(3840, 1080), OrientationClass::Other);
        assert_eq!(OrientationClass::from_dimensions(1920, 0), OrientationClass::Other);
    }

    #[test]
    fn test_classification_is_stable() {
        let first = OrientationClass::from_dimensions(1280, 720);
        for _ in 0..10 {
            assert_eq!(OrientationClass::from_dimensions(1280, 720), first);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(OrientationClass::Portrait.to_string(), "portrait");
        assert_eq!(serde_json::to_string(&OrientationClass::Other).unwrap(), "\"other\"");
    }
}
