//! Discrete zoom scales in meters per pixel.
//!
//! Two fixed tables exist: a "default" table following a 1-1.5-2-3-5-7
//! series and a "square" table of power-of-two steps matching TMS tiles.
//! Both are ordered from the most detailed (index 0) to the widest view.

use crate::core::constants::{DEFAULT_POINT_ZOOM, MPIXEL, SQUARE_POINT_ZOOM};
use serde::{Deserialize, Serialize};

pub const SCALES_DEFAULT: [f64; 31] = [
    0.10, 0.15, 0.20, 0.30, 0.50, 0.70, 1.0, 1.5, 2.0, 3.0, 5.0, 7.0, 10.0, 15.0, 20.0, 30.0, 50.0,
    70.0, 100.0, 150.0, 200.0, 300.0, 500.0, 700.0, 1000.0, 1500.0, 2000.0, 3000.0, 5000.0,
    7000.0, 10000.0,
];

pub const SCALES_SQUARE: [f64; 17] = [
    MPIXEL / 1_048_576.0,
    MPIXEL / 524_288.0,
    MPIXEL / 262_144.0,
    MPIXEL / 131_072.0,
    MPIXEL / 65_536.0,
    MPIXEL / 32_768.0,
    MPIXEL / 16_384.0,
    MPIXEL / 8_192.0,
    MPIXEL / 4_096.0,
    MPIXEL / 2_048.0,
    MPIXEL / 1_024.0,
    MPIXEL / 512.0,
    MPIXEL / 256.0,
    MPIXEL / 128.0,
    MPIXEL / 64.0,
    MPIXEL / 32.0,
    MPIXEL / 16.0,
];

/// Which scale table a context uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalesType {
    #[default]
    Default,
    Square,
}

impl ScalesType {
    /// Maps a persisted integer code to a table type.
    ///
    /// Returns `None` for codes that name no table.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Default),
            1 => Some(Self::Square),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Default => 0,
            Self::Square => 1,
        }
    }
}

/// The active scale table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTable {
    kind: ScalesType,
    scales: &'static [f64],
}

impl ScaleTable {
    pub fn new(kind: ScalesType) -> Self {
        let scales: &'static [f64] = match kind {
            ScalesType::Default => &SCALES_DEFAULT,
            ScalesType::Square => &SCALES_SQUARE,
        };
        Self { kind, scales }
    }

    pub fn kind(&self) -> ScalesType {
        self.kind
    }

    /// Number of zoom levels
    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    pub fn scales(&self) -> &'static [f64] {
        self.scales
    }

    /// Clamps any index, including negative ones, into the table
    pub fn clamp_index(&self, idx: isize) -> usize {
        idx.clamp(0, self.len() as isize - 1) as usize
    }

    /// Scale at an index that is clamped first
    pub fn scale_at(&self, idx: isize) -> f64 {
        self.scales[self.clamp_index(idx)]
    }

    /// Zoom index used when the target to show has no extent
    pub fn point_zoom_index(&self) -> usize {
        match self.kind {
            ScalesType::Default => DEFAULT_POINT_ZOOM,
            ScalesType::Square => SQUARE_POINT_ZOOM,
        }
    }
}

impl Default for ScaleTable {
    fn default() -> Self {
        Self::new(ScalesType::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_strictly_increasing() {
        for kind in [ScalesType::Default, ScalesType::Square] {
            let table = ScaleTable::new(kind);
            assert!(table
                .scales()
                .windows(2)
                .all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn test_clamp_index() {
        let table = ScaleTable::new(ScalesType::Default);
        assert_eq!(table.clamp_index(-5), 0);
        assert_eq!(table.clamp_index(1000), 30);
        assert_eq!(table.clamp_index(12), 12);

        let square = ScaleTable::new(ScalesType::Square);
        assert_eq!(square.len(), 17);
        assert_eq!(square.clamp_index(1000), 16);
    }

    #[test]
    fn test_square_scales_match_tiles() {
        let square = ScaleTable::new(ScalesType::Square);
        // index 12 is TMS zoom 8: 256 px tiles at 2^8
        assert!((square.scale_at(12) - MPIXEL / 256.0).abs() < 1e-9);
        assert!((square.scale_at(16) * 2.0 - square.scale_at(15) * 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_codes() {
        assert_eq!(ScalesType::from_code(0), Some(ScalesType::Default));
        assert_eq!(ScalesType::from_code(1), Some(ScalesType::Square));
        assert_eq!(ScalesType::from_code(7), None);
        assert_eq!(ScalesType::Square.code(), 1);
    }
}
