//! Slope orientation codes.
//!
//! Cells carry a compass octant code 1..=8 (1 = N, clockwise) or the
//! sentinel 9 for flat terrain without a dominant aspect.

use opg_common::Grid;

/// Code used for flat cells.
pub const FLAT_CODE: u8 = 9;

/// One of the eight 45 degree compass sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Octant {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Octant {
    pub const ALL: [Octant; 8] = [
        Octant::North,
        Octant::NorthEast,
        Octant::East,
        Octant::SouthEast,
        Octant::South,
        Octant::SouthWest,
        Octant::West,
        Octant::NorthWest,
    ];

    /// Octant for a code in 1..=8. The flat sentinel and anything else is `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=8 => Some(Self::ALL[(code - 1) as usize]),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8 + 1
    }

    pub fn label(&self) -> &'static str {
        match self {
            Octant::North => "N",
            Octant::NorthEast => "NE",
            Octant::East => "E",
            Octant::SouthEast => "SE",
            Octant::South => "S",
            Octant::SouthWest => "SW",
            Octant::West => "W",
            Octant::NorthWest => "NW",
        }
    }

    /// Center azimuth in degrees clockwise from north.
    pub fn azimuth(&self) -> f64 {
        (*self as u8) as f64 * 45.0
    }
}

/// Mask flat cells: code 9 becomes `None`, every other value is kept.
pub fn mask_flat(orientation: &Grid<Option<u8>>) -> Grid<Option<u8>> {
    orientation.map(|cell| match cell {
        Some(FLAT_CODE) => None,
        other => *other,
    })
}

/// Interpret one numeric orientation cell.
///
/// NaN is missing. Any integral value in 0..=255 is kept as a code, even
/// outside 1..=9; [`Octant::from_code`] leaves such cells unpainted.
/// Fractional or out-of-range values are rejected.
pub fn code_from_f64(value: f64) -> Result<Option<u8>, String> {
    if value.is_nan() {
        return Ok(None);
    }
    if value.fract() == 0.0 && (0.0..=u8::MAX as f64).contains(&value) {
        return Ok(Some(value as u8));
    }
    Err(format!("orientation code {} is not an integer in 0..=255", value))
}
