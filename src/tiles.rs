use crate::error::ConfigurationError;
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

pub const MAX_TILES: u32 = 144;

/// Number of tiles the image is rendered in, horizontally and vertically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub x: u32,
    pub y: u32,
}

impl TileGrid {
    pub const SINGLE: Self = Self { x: 1, y: 1 };

    pub const fn is_tiled(&self) -> bool {
        self.x > 1 || self.y > 1
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl FromStr for TileGrid {
    type Err = ConfigurationError;

    /// `N` for N×N or `NxM`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigurationError::InvalidTiles {
            value: value.to_string(),
            max: MAX_TILES,
        };

        let parse = |n: &str| {
            if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) {
                n.parse::<u32>().map_err(|_| invalid())
            } else {
                Err(invalid())
            }
        };

        let (x, y) = match value.split_once('x') {
            Some((x, y)) => (parse(x)?, parse(y)?),
            None => {
                let n = parse(value)?;

                (n, n)
            }
        };

        match x.checked_mul(y) {
            Some(count) if (1..=MAX_TILES).contains(&count) => Ok(Self { x, y }),
            _ => Err(invalid()),
        }
    }
}

impl Display for TileGrid {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}x{}", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_square_and_rectangular_grids() {
        assert_eq!("3".parse::<TileGrid>().unwrap(), TileGrid { x: 3, y: 3 });
        assert_eq!("2x5".parse::<TileGrid>().unwrap(), TileGrid { x: 2, y: 5 });
        assert_eq!("12x12".parse::<TileGrid>().unwrap(), TileGrid { x: 12, y: 12 });
    }

    #[test]
    fn rejects_invalid_grids() {
        for value in ["0", "13", "0x4", "x", "2x", "-2", "2x3x4", "abc", "145x1"] {
            assert!(value.parse::<TileGrid>().is_err(), "{value} should be rejected");
        }
    }

    #[test]
    fn single_is_not_tiled() {
        assert!(!TileGrid::SINGLE.is_tiled());
        assert!(TileGrid { x: 1, y: 2 }.is_tiled());
    }
}
