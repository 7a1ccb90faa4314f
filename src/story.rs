//! Content files: stories and the backing story.

use crate::error::{Error, Result};
use crate::ids::{Identifier, story_filename};
use crate::xml::{Document, Element, Node};

/// Member holding the root of the logical structure.
pub const BACKING_STORY: &str = "XML/BackingStory.xml";

/// Separator inserted between paragraphs when flattening story text.
pub const PARAGRAPH_SEPARATOR: char = '\u{2029}';

/// Element that ends a paragraph inside a character range.
const PARAGRAPH_BREAK: &str = "Br";

/// Read-only access to the content files of a package.
///
/// The structure resolver and exporter only ever see this capability, so
/// they can run against an archive, a staging directory or an in-memory map.
pub trait ContentSource {
    /// The backing story. Every package has one.
    fn backing_story(&mut self) -> Result<Story>;

    /// The story file for `id`, or `None` when no such file exists (the
    /// reference may point at a placed graphic rather than text).
    fn story(&mut self, id: &Identifier) -> Result<Option<Story>>;
}

/// A parsed story or backing story member.
#[derive(Debug, Clone)]
pub struct Story {
    pub name: String,
    pub doc: Document,
}

impl Story {
    pub fn new(name: impl Into<String>, doc: Document) -> Self {
        Self {
            name: name.into(),
            doc,
        }
    }

    pub fn parse(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let doc = Document::parse(bytes).map_err(|e| e.in_member(&name))?;
        Ok(Self { name, doc })
    }

    /// Member name of the story holding `id`.
    pub fn filename_for(id: &Identifier) -> String {
        story_filename(id)
    }

    pub fn is_backing(&self) -> bool {
        self.name == BACKING_STORY
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.doc.to_bytes(&self.name)
    }

    /// The `<Story>` (or `<XmlStory>` for the backing story) element.
    pub fn node(&self) -> Result<&Element> {
        let tag = if self.is_backing() { "XmlStory" } else { "Story" };
        self.doc
            .root
            .child(tag)
            .ok_or_else(|| Error::MissingElement(format!("{tag} in {}", self.name)))
    }

    /// The `XMLElement` whose `Self` is `id`.
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.doc.root.find_xml_element(id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.doc.root.find_xml_element_mut(id)
    }

    /// The first `XMLElement` of the file; for the backing story this is
    /// the root of the logical structure.
    pub fn first_xml_element(&self) -> Option<&Element> {
        self.doc.root.find(|e| e.name == "XMLElement")
    }

    /// Text held directly by the `XMLElement` `id`.
    ///
    /// Collects `Content` runs from `ParagraphStyleRange/CharacterStyleRange`
    /// and `CharacterStyleRange` children, appending a paragraph separator
    /// after each run followed by a `Br`. Returns `None` when the element is
    /// absent or holds no text.
    pub fn element_content(&self, id: &str) -> Option<String> {
        let elem = self.element(id)?;
        let mut text = String::new();
        for child in elem.child_elements() {
            match child.name.as_str() {
                "ParagraphStyleRange" => {
                    for range in child
                        .child_elements()
                        .filter(|e| e.name == "CharacterStyleRange")
                    {
                        collect_runs(range, &mut text);
                    }
                }
                "CharacterStyleRange" => collect_runs(child, &mut text),
                _ => {}
            }
        }
        (!text.is_empty()).then_some(text)
    }
}

fn collect_runs(range: &Element, out: &mut String) {
    let nodes: Vec<&Node> = range
        .children
        .iter()
        .filter(|n| !matches!(n, Node::Text(_)))
        .collect();
    for (i, node) in nodes.iter().enumerate() {
        let Node::Element(content) = node else {
            continue;
        };
        if content.name != "Content" {
            continue;
        }
        out.push_str(&content.text());
        if let Some(Node::Element(next)) = nodes.get(i + 1)
            && next.name == PARAGRAPH_BREAK
        {
            out.push(PARAGRAPH_SEPARATOR);
        }
    }
}
