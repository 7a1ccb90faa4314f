//! Page and spread coordinate geometry.
//!
//! Spread coordinates put the origin at the spine: verso pages sit at
//! negative X, recto pages at X >= 0, and Y grows downwards. All values are
//! exact decimals so repeated merges and face flips never drift.

mod item;
mod page;
mod transform;

pub use item::{item_anchor, item_transform, set_item_transform, translate_item};
pub use page::{AbsoluteBounds, PageGeometry};
pub use transform::{GeometricBounds, ItemTransform};

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{Error, Result};

/// Which side of the spine a page sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum Face {
    /// Right-hand page.
    Recto,
    /// Left-hand page.
    Verso,
}

impl Face {
    pub fn opposite(self) -> Self {
        match self {
            Face::Recto => Face::Verso,
            Face::Verso => Face::Recto,
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Face::Recto => "recto",
            Face::Verso => "verso",
        })
    }
}

impl FromStr for Face {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "recto" => Ok(Face::Recto),
            "verso" => Ok(Face::Verso),
            other => Err(Error::MalformedGeometry(format!("unknown face {other:?}"))),
        }
    }
}

/// A point or vector in spread coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: Decimal,
    pub y: Decimal,
}

impl Point {
    pub fn new(x: Decimal, y: Decimal) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Parse one number of a geometry attribute; accepts exponent notation.
pub(crate) fn parse_decimal(token: &str) -> Result<Decimal> {
    Decimal::from_str(token)
        .or_else(|_| Decimal::from_scientific(token))
        .map_err(|_| Error::MalformedGeometry(format!("not a number: {token:?}")))
}

/// Parse exactly `N` whitespace-separated numbers.
pub(crate) fn parse_numbers<const N: usize>(value: &str, what: &str) -> Result<[Decimal; N]> {
    let mut out = [Decimal::ZERO; N];
    let mut tokens = value.split_whitespace();
    for slot in out.iter_mut() {
        let token = tokens
            .next()
            .ok_or_else(|| Error::MalformedGeometry(format!("{what} needs {N} numbers: {value:?}")))?;
        *slot = parse_decimal(token)?;
    }
    if tokens.next().is_some() {
        return Err(Error::MalformedGeometry(format!(
            "{what} has more than {N} numbers: {value:?}"
        )));
    }
    Ok(out)
}

/// Canonical text form of a coordinate.
pub(crate) fn format_decimal(value: Decimal) -> String {
    if value.is_zero() {
        "0".to_string()
    } else {
        value.normalize().to_string()
    }
}

pub(crate) fn format_numbers(values: &[Decimal]) -> String {
    values
        .iter()
        .map(|v| format_decimal(*v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        let [a, b] = parse_numbers::<2>("-306 12.5", "Anchor").unwrap();
        assert_eq!(a, Decimal::from(-306));
        assert_eq!(b, Decimal::new(125, 1));
        assert!(parse_numbers::<2>("1", "Anchor").is_err());
        assert!(parse_numbers::<2>("1 2 3", "Anchor").is_err());
        assert!(parse_numbers::<2>("1 x", "Anchor").is_err());
    }

    #[test]
    fn test_parse_exponent() {
        let v = parse_decimal("6.123233995736766e-17").unwrap();
        assert!(v > Decimal::ZERO && v < Decimal::new(1, 16));
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(Decimal::new(-6120, 1)), "-612");
        assert_eq!(format_decimal(Decimal::ZERO - Decimal::ZERO), "0");
        assert_eq!(format_decimal(Decimal::new(3625, 2)), "36.25");
    }

    #[test]
    fn test_face_parse() {
        assert_eq!("recto".parse::<Face>().unwrap(), Face::Recto);
        assert_eq!(Face::Verso.opposite(), Face::Recto);
        assert!("left".parse::<Face>().is_err());
    }
}
