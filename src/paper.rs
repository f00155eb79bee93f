//! Named paper formats.

use crate::error::ConfigurationError;

/// Orientation requested through the paper name prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Bare name; width and height may be swapped to fit the bounding box.
    Auto,
    /// `+` prefix; long side is the width.
    Landscape,
    /// `-` prefix; long side is the height.
    Portrait,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paper {
    /// Width and height in millimeters.
    pub dim_mm: [f64; 2],
    pub orientation: Orientation,
}

impl Paper {
    pub const fn rotate(&self) -> bool {
        matches!(self.orientation, Orientation::Auto)
    }

    /// Parse `[+|-]name`, e.g. `a4`, `-4`, `+letter`.
    pub fn parse(value: &str) -> Result<Self, ConfigurationError> {
        let (orientation, name) = if let Some(name) = value.strip_prefix('-') {
            (Orientation::Portrait, name)
        } else if let Some(name) = value.strip_prefix('+') {
            (Orientation::Landscape, name)
        } else {
            (Orientation::Auto, value)
        };

        let [long, short] = paper_size(&name.to_lowercase())
            .ok_or_else(|| ConfigurationError::UnknownPaperSize(name.to_string()))?;

        let dim_mm = match orientation {
            Orientation::Portrait => [short, long],
            Orientation::Auto | Orientation::Landscape => [long, short],
        };

        Ok(Self {
            dim_mm,
            orientation,
        })
    }
}

fn iso_side(exponent: f64) -> f64 {
    (1000.0 / 2_f64.powf(exponent) + 0.2).floor()
}

fn single_digit(name: &str) -> Option<u32> {
    let mut chars = name.chars();

    match (chars.next(), chars.next()) {
        (Some(digit), None) => digit.to_digit(10),
        _ => None,
    }
}

/// Long and short side in millimeters.
pub fn paper_size(name: &str) -> Option<[f64; 2]> {
    // ISO A series, the `a` is optional
    if let Some(n) = single_digit(name.strip_prefix('a').unwrap_or(name)) {
        let n = f64::from(n);

        return Some([
            iso_side((2.0 * n - 1.0) / 4.0),
            iso_side((2.0 * (n + 1.0) - 1.0) / 4.0),
        ]);
    }

    // ISO B series
    if let Some(n) = name.strip_prefix('b').and_then(single_digit) {
        let n = f64::from(n);

        return Some([iso_side((n - 1.0) / 2.0), iso_side(n / 2.0)]);
    }

    match name {
        "4a0" => return Some([2378.0, 1682.0]),
        "2a0" => return Some([1682.0, 1189.0]),
        _ => {}
    }

    if name.starts_with("leg") {
        return Some([355.6, 215.9]);
    }

    if name.starts_with('l') {
        return Some([279.4, 215.9]);
    }

    if name.starts_with("card") || name.starts_with("cred") {
        return Some([85.6, 54.0]);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_a_series() {
        assert_eq!(paper_size("a0"), Some([1189.0, 841.0]));
        assert_eq!(paper_size("a4"), Some([297.0, 210.0]));
        assert_eq!(paper_size("4"), Some([297.0, 210.0]));
        assert_eq!(paper_size("a5"), Some([210.0, 148.0]));
    }

    #[test]
    fn iso_b_series() {
        assert_eq!(paper_size("b0"), Some([1414.0, 1000.0]));
        assert_eq!(paper_size("b4"), Some([353.0, 250.0]));
    }

    #[test]
    fn named_formats() {
        assert_eq!(paper_size("4a0"), Some([2378.0, 1682.0]));
        assert_eq!(paper_size("2a0"), Some([1682.0, 1189.0]));
        assert_eq!(paper_size("legal"), Some([355.6, 215.9]));
        assert_eq!(paper_size("letter"), Some([279.4, 215.9]));
        assert_eq!(paper_size("card"), Some([85.6, 54.0]));
        assert_eq!(paper_size("credit"), Some([85.6, 54.0]));
        assert_eq!(paper_size("a10"), None);
        assert_eq!(paper_size("tabloid"), None);
    }

    #[test]
    fn prefixes_set_orientation() {
        let auto = Paper::parse("A4").unwrap();

        assert_eq!(auto.dim_mm, [297.0, 210.0]);
        assert!(auto.rotate());

        let landscape = Paper::parse("+4").unwrap();

        assert_eq!(landscape.dim_mm, [297.0, 210.0]);
        assert!(!landscape.rotate());

        let portrait = Paper::parse("-a4").unwrap();

        assert_eq!(portrait.dim_mm, [210.0, 297.0]);
        assert_eq!(portrait.orientation, Orientation::Portrait);
        assert!(!portrait.rotate());
    }

    #[test]
    fn unknown_paper_is_an_error() {
        assert!(matches!(
            Paper::parse("-z9"),
            Err(ConfigurationError::UnknownPaperSize(name)) if name == "z9"
        ));
    }
}
