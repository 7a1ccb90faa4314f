//! Package-wide registries: tag definitions, font families and style groups.
//!
//! Each registry is an opaque list of subtrees; merging is a set union keyed
//! on a name or identifier attribute.

use std::collections::HashSet;

use log::debug;

use crate::xml::{Document, Element, Node};

pub const TAGS: &str = "XML/Tags.xml";
pub const FONTS: &str = "Resources/Fonts.xml";
pub const STYLES: &str = "Resources/Styles.xml";

/// Every `<XMLTag>` definition.
pub fn tags(doc: &Document) -> Vec<Element> {
    let mut found = Vec::new();
    collect(&doc.root, "XMLTag", &mut found);
    found
}

/// Every `<FontFamily>`.
pub fn font_families(doc: &Document) -> Vec<Element> {
    let mut found = Vec::new();
    collect(&doc.root, "FontFamily", &mut found);
    found
}

/// Top-level style groups (`RootParagraphStyleGroup`, `RootCharacterStyleGroup`, ...).
pub fn style_groups(doc: &Document) -> Vec<Element> {
    doc.root
        .child_elements()
        .filter(|e| e.name.len() > "Group".len() && e.name.ends_with("Group"))
        .cloned()
        .collect()
}

fn collect(elem: &Element, name: &str, out: &mut Vec<Element>) {
    for child in elem.child_elements() {
        if child.name == name {
            out.push(child.clone());
        } else {
            collect(child, name, out);
        }
    }
}

/// Append the font families of `incoming` whose `Name` is not registered yet.
///
/// Returns the number of families added.
pub fn merge_font_families(doc: &mut Document, incoming: &[Element]) -> usize {
    merge_keyed(&mut doc.root, incoming, "Name")
}

/// Append the tag definitions of `incoming` whose `Self` is not registered yet.
pub fn merge_tags(doc: &mut Document, incoming: &[Element]) -> usize {
    merge_keyed(&mut doc.root, incoming, "Self")
}

/// Union style groups: children of a group already present are merged into
/// it by `Self`; unknown groups are appended whole.
pub fn merge_style_groups(doc: &mut Document, incoming: &[Element]) -> usize {
    let mut added = 0;
    for group in incoming {
        match doc.root.child_mut(&group.name) {
            Some(host) => {
                let styles: Vec<Element> = group.child_elements().cloned().collect();
                added += merge_keyed(host, &styles, "Self");
            }
            None => {
                doc.root.children.push(Node::Element(group.clone()));
                added += 1;
            }
        }
    }
    added
}

fn merge_keyed(host: &mut Element, incoming: &[Element], key: &str) -> usize {
    let mut known: HashSet<String> = HashSet::new();
    let mut present = Vec::new();
    collect_keys(host, key, &mut present);
    known.extend(present);

    let mut added = 0;
    for elem in incoming {
        match elem.attr(key) {
            Some(value) if known.contains(value) => {
                debug!("<{}> {key}={value} already registered", elem.name);
            }
            value => {
                if let Some(value) = value {
                    known.insert(value.to_string());
                }
                host.children.push(Node::Element(elem.clone()));
                added += 1;
            }
        }
    }
    added
}

fn collect_keys(elem: &Element, key: &str, out: &mut Vec<String>) {
    for child in elem.child_elements() {
        if let Some(value) = child.attr(key) {
            out.push(value.to_string());
        }
        collect_keys(child, key, out);
    }
}
