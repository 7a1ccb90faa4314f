//! Builders shared by unit tests.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{Error, Result};
use crate::ids::{Identifier, story_filename};
use crate::spread::Spread;
use crate::story::{BACKING_STORY, ContentSource, Story};
use crate::xml::{Document, Element, PACKAGING_NS};

/// A 100x100 text frame whose outline starts at (`x`, `y`), translated by
/// (`tx`, `ty`).
pub fn frame(id: &str, x: i64, y: i64, tx: i64, ty: i64) -> Element {
    let corners = [(x, y), (x, y + 100), (x + 100, y + 100), (x + 100, y)];
    let mut points = Element::new("PathPointArray");
    for (px, py) in corners {
        let anchor = format!("{px} {py}");
        points = points.with_child(
            Element::new("PathPointType")
                .with_attr("Anchor", anchor.clone())
                .with_attr("LeftDirection", anchor.clone())
                .with_attr("RightDirection", anchor),
        );
    }
    Element::new("TextFrame")
        .with_attr("Self", id)
        .with_attr("ItemTransform", format!("1 0 0 1 {tx} {ty}"))
        .with_child(
            Element::new("Properties").with_child(
                Element::new("PathGeometry").with_child(
                    Element::new("GeometryPathType")
                        .with_attr("PathOpen", "false")
                        .with_child(points),
                ),
            ),
        )
}

/// A letter-sized page translated horizontally by `tx`.
pub fn page_node(id: &str, tx: i64) -> Element {
    Element::new("Page")
        .with_attr("Self", id)
        .with_attr("GeometricBounds", "0 0 792 612")
        .with_attr("ItemTransform", format!("1 0 0 1 {tx} -396"))
}

/// A spread member holding `children` under its `<Spread>` node.
pub fn spread(name: &str, children: Vec<Element>) -> Spread {
    let mut node = Element::new("Spread")
        .with_attr("Self", "ub6")
        .with_attr("PageCount", "1");
    for child in children {
        node = node.with_child(child);
    }
    let root = Element::new("idPkg:Spread")
        .with_attr("xmlns:idPkg", PACKAGING_NS)
        .with_attr("DOMVersion", "7.5")
        .with_child(node);
    Spread::new(name, Document::new(root))
}

/// Content files held in memory, keyed by member name.
#[derive(Debug, Default)]
pub struct MemoryContent {
    members: HashMap<String, Vec<u8>>,
}

impl MemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backing story; `body` is the markup inside `<XmlStory>`.
    pub fn with_backing_story(mut self, body: &str) -> Self {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<idPkg:BackingStory xmlns:idPkg="{PACKAGING_NS}" DOMVersion="7.5"><XmlStory Self="ubf">{body}</XmlStory></idPkg:BackingStory>"#
        );
        self.members.insert(BACKING_STORY.to_string(), xml.into_bytes());
        self
    }

    /// Add a story; `body` is the markup inside `<Story Self="{id}">`.
    pub fn with_story(mut self, id: &str, body: &str) -> Self {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<idPkg:Story xmlns:idPkg="{PACKAGING_NS}" DOMVersion="7.5"><Story Self="{id}">{body}</Story></idPkg:Story>"#
        );
        self.members
            .insert(story_filename(&Identifier::from(id)), xml.into_bytes());
        self
    }
}

impl ContentSource for MemoryContent {
    fn backing_story(&mut self) -> Result<Story> {
        let bytes = self
            .members
            .get(BACKING_STORY)
            .ok_or_else(|| Error::MissingMember(BACKING_STORY.to_string()))?;
        Story::parse(BACKING_STORY, bytes)
    }

    fn story(&mut self, id: &Identifier) -> Result<Option<Story>> {
        let name = story_filename(id);
        match self.members.get(&name) {
            Some(bytes) => Story::parse(name, bytes).map(Some),
            None => Ok(None),
        }
    }
}

/// Zip `members` in order, `mimetype` stored and the rest deflated.
pub fn zip_members(members: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in members {
        let options = if *name == "mimetype" { stored } else { deflated };
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
