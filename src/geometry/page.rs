use rust_decimal::Decimal;

use super::{Face, GeometricBounds, ItemTransform, Point, item_anchor, item_transform};
use crate::error::{Error, Result};
use crate::xml::Element;

/// Page rectangle in spread coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsoluteBounds {
    pub x1: Decimal,
    pub y1: Decimal,
    pub x2: Decimal,
    pub y2: Decimal,
}

/// Position of a `<Page>` inside its spread.
///
/// `GeometricBounds` (y1 x1 y2 x2) gives the page rectangle *before*
/// transformation; the translation of `ItemTransform` places it in the
/// spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub bounds: GeometricBounds,
    pub transform: ItemTransform,
}

impl PageGeometry {
    pub fn new(bounds: GeometricBounds, transform: ItemTransform) -> Self {
        Self { bounds, transform }
    }

    /// Read the geometry attributes of a `<Page>` element.
    pub fn from_element(page: &Element) -> Result<Self> {
        let bounds = page.attr("GeometricBounds").ok_or_else(|| {
            Error::MalformedGeometry("<Page> has no GeometricBounds".to_string())
        })?;
        Ok(Self {
            bounds: GeometricBounds::parse(bounds)?,
            transform: item_transform(page)?,
        })
    }

    pub fn absolute_bounds(&self) -> AbsoluteBounds {
        let t = self.transform.translation();
        AbsoluteBounds {
            x1: self.bounds.left + t.x,
            y1: self.bounds.top + t.y,
            x2: self.bounds.right + t.x,
            y2: self.bounds.bottom + t.y,
        }
    }

    pub fn is_recto(&self) -> bool {
        self.absolute_bounds().x1 >= Decimal::ZERO
    }

    pub fn face(&self) -> Face {
        if self.is_recto() { Face::Recto } else { Face::Verso }
    }

    /// Whether an absolute X coordinate falls within the page's horizontal range.
    ///
    /// Pages of one spread are Y-aligned, so X alone decides.
    pub fn owns_x(&self, x: Decimal) -> bool {
        let abs = self.absolute_bounds();
        x >= abs.x1 && x <= abs.x2
    }

    /// Whether `item` sits on this page: its first anchor, once translated,
    /// lies within the page's X range.
    pub fn owns(&self, item: &Element) -> Result<bool> {
        let anchor = item_anchor(item, 0)? + item_transform(item)?.translation();
        Ok(self.owns_x(anchor.x))
    }

    /// Translation `tx` a page must have to show `face`.
    pub fn required_tx(&self, face: Face) -> Decimal {
        match face {
            Face::Recto => Decimal::ZERO,
            Face::Verso => -self.bounds.right,
        }
    }

    /// Move the page to `face`.
    ///
    /// Returns the X shift applied, to be carried over to the items the page
    /// owned before the move, or `None` when the page already shows `face`.
    pub fn set_face(&mut self, face: Face) -> Option<Decimal> {
        if self.face() == face {
            return None;
        }
        let origin = self.transform.tx();
        let target = self.required_tx(face);
        self.transform.set_tx(target);
        Some(target - origin)
    }

    /// Shift as a vector.
    pub fn shift_vector(delta: Decimal) -> Point {
        Point::new(delta, Decimal::ZERO)
    }
}
