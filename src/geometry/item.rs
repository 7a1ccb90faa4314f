//! Geometry attributes of spread items (frames, shapes, pages).

use super::{ItemTransform, Point, format_decimal, parse_numbers};
use crate::error::{Error, Result};
use crate::xml::Element;

/// Path from an item to the anchors of its outline.
const PATH_POINTS: &[&str] = &[
    "Properties",
    "PathGeometry",
    "GeometryPathType",
    "PathPointArray",
];

/// The item's `ItemTransform`.
pub fn item_transform(item: &Element) -> Result<ItemTransform> {
    let value = item.attr("ItemTransform").ok_or_else(|| {
        Error::MalformedGeometry(format!("<{}> has no ItemTransform", describe(item)))
    })?;
    ItemTransform::parse(value)
}

/// Write `transform` to the item.
///
/// When the item already carries a full matrix, its `a b c d` tokens are kept
/// as written and only the translation is replaced.
pub fn set_item_transform(item: &mut Element, transform: &ItemTransform) {
    let translation = transform.translation();
    let value = match item.attr("ItemTransform") {
        Some(current) if current.split_whitespace().count() == 6 => {
            let mut tokens: Vec<String> = current
                .split_whitespace()
                .take(4)
                .map(str::to_string)
                .collect();
            tokens.push(format_decimal(translation.x));
            tokens.push(format_decimal(translation.y));
            tokens.join(" ")
        }
        _ => transform.format(),
    };
    item.set_attr("ItemTransform", value);
}

/// Shift an item's translation by `delta`.
pub fn translate_item(item: &mut Element, delta: Point) -> Result<()> {
    let mut transform = item_transform(item)?;
    transform.translate(delta);
    set_item_transform(item, &transform);
    Ok(())
}

/// The `index`-th outline anchor, in the item's own (pre-transform) frame.
///
/// The first anchor is the upper-left corner for rectangular frames.
pub fn item_anchor(item: &Element, index: usize) -> Result<Point> {
    let anchor = item
        .descend(PATH_POINTS)
        .and_then(|array| {
            array
                .child_elements()
                .filter(|p| p.name == "PathPointType")
                .nth(index)
        })
        .and_then(|point| point.attr("Anchor"))
        .ok_or_else(|| {
            Error::MalformedGeometry(format!("<{}> has no path anchor {index}", describe(item)))
        })?;
    let [x, y] = parse_numbers::<2>(anchor, "Anchor")?;
    Ok(Point::new(x, y))
}

fn describe(item: &Element) -> String {
    match item.attr("Self") {
        Some(id) => format!("{} Self={id}", item.name),
        None => item.name.clone(),
    }
}
