use rust_decimal::Decimal;

use super::{Point, format_numbers, parse_numbers};
use crate::error::Result;

/// `ItemTransform`: affine matrix `[a b c d tx ty]`.
///
/// Only the translation component takes part in page and merge arithmetic.
/// [`set_item_transform`](super::set_item_transform) rewrites just that part
/// of an existing attribute; [`ItemTransform::format`] normalizes all six.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemTransform(pub [Decimal; 6]);

impl ItemTransform {
    pub fn identity() -> Self {
        Self([
            Decimal::ONE,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ONE,
            Decimal::ZERO,
            Decimal::ZERO,
        ])
    }

    pub fn parse(value: &str) -> Result<Self> {
        parse_numbers::<6>(value, "ItemTransform").map(Self)
    }

    pub fn format(&self) -> String {
        format_numbers(&self.0)
    }

    pub fn translation(&self) -> Point {
        Point::new(self.0[4], self.0[5])
    }

    pub fn tx(&self) -> Decimal {
        self.0[4]
    }

    pub fn set_tx(&mut self, tx: Decimal) {
        self.0[4] = tx;
    }

    /// Shift the translation by `delta`.
    pub fn translate(&mut self, delta: Point) {
        self.0[4] += delta.x;
        self.0[5] += delta.y;
    }
}

/// `GeometricBounds`: `top left bottom right` before transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometricBounds {
    pub top: Decimal,
    pub left: Decimal,
    pub bottom: Decimal,
    pub right: Decimal,
}

impl GeometricBounds {
    pub fn parse(value: &str) -> Result<Self> {
        let [top, left, bottom, right] = parse_numbers::<4>(value, "GeometricBounds")?;
        Ok(Self {
            top,
            left,
            bottom,
            right,
        })
    }

    pub fn format(&self) -> String {
        format_numbers(&[self.top, self.left, self.bottom, self.right])
    }

    pub fn width(&self) -> Decimal {
        self.right - self.left
    }
}
