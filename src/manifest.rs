//! The package manifest (`designmap.xml`).
//!
//! The manifest lists spreads and stories by member name, keeps the ordered
//! `StoryList` on its root `<Document>`, and carries section numbering.

use log::debug;

use crate::error::{Error, Result};
use crate::ids::{Identifier, story_filename};
use crate::xml::{Document, Element, Node};

/// Member name of the manifest.
pub const DESIGNMAP: &str = "designmap.xml";

pub(crate) const SPREAD_REF: &str = "idPkg:Spread";
pub(crate) const STORY_REF: &str = "idPkg:Story";
const BACKING_STORY_REF: &str = "idPkg:BackingStory";
const STORY_LIST: &str = "StoryList";
const PAGE_START: &str = "PageStart";

/// A parsed `designmap.xml`.
#[derive(Debug, Clone)]
pub struct Designmap {
    pub doc: Document,
}

impl Designmap {
    pub fn new(doc: Document) -> Self {
        Self { doc }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let doc = Document::parse(bytes).map_err(|e| e.in_member(DESIGNMAP))?;
        if doc.root.name != "Document" {
            return Err(Error::MalformedXml {
                member: DESIGNMAP.to_string(),
                reason: format!("root element is <{}>, expected <Document>", doc.root.name),
            });
        }
        Ok(Self { doc })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.doc.to_bytes(DESIGNMAP)
    }

    fn refs(&self, kind: &str) -> Vec<String> {
        self.doc
            .root
            .child_elements()
            .filter(|e| e.name == kind)
            .filter_map(|e| e.attr("src"))
            .map(str::to_string)
            .collect()
    }

    /// Spread member names, in manifest order.
    pub fn spread_refs(&self) -> Vec<String> {
        self.refs(SPREAD_REF)
    }

    /// Story member names, in manifest order.
    pub fn story_refs(&self) -> Vec<String> {
        self.refs(STORY_REF)
    }

    /// Identifiers of `Document@StoryList`.
    pub fn story_list(&self) -> Vec<Identifier> {
        self.doc
            .root
            .attr(STORY_LIST)
            .map(|list| list.split_whitespace().map(Identifier::from).collect())
            .unwrap_or_default()
    }

    /// `PageStart` of the first `<Section>`.
    pub fn page_start(&self) -> Option<&str> {
        self.doc
            .root
            .find(|e| e.name == "Section")
            .and_then(|s| s.attr(PAGE_START))
    }

    /// Register a spread right after the last registered one.
    ///
    /// With no spread registered yet, the reference goes before the first
    /// story reference so layout still precedes content.
    pub fn add_spread(&mut self, src: &str) {
        let reference = Node::Element(Element::new(SPREAD_REF).with_attr("src", src));
        let children = &mut self.doc.root.children;
        let position = match last_position(children, |e| e.name == SPREAD_REF) {
            Some(last) => last + 1,
            None => {
                let before = children.iter().position(|n| {
                    matches!(n, Node::Element(e) if e.name == BACKING_STORY_REF || e.name == STORY_REF)
                });
                debug!("{DESIGNMAP}: no spread registered, adding {src} as the first");
                before.unwrap_or(children.len())
            }
        };
        children.insert(position, reference);
    }

    /// Append `ids` to `StoryList` and one story reference per id, in order.
    ///
    /// Duplicates are kept; callers decide what to register.
    pub fn add_stories(&mut self, ids: &[Identifier]) {
        let root = &mut self.doc.root;
        let mut list: Vec<String> = root
            .attr(STORY_LIST)
            .map(|l| l.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        list.extend(ids.iter().map(|id| id.to_string()));
        root.set_attr(STORY_LIST, list.join(" "));

        for id in ids {
            root.children.push(Node::Element(
                Element::new(STORY_REF).with_attr("src", story_filename(id)),
            ));
        }
    }

    /// Prepend `prefix` to the section's `PageStart`.
    ///
    /// `PageStart` is a page reference rather than a number, so it follows
    /// the renamed pages. Manifests without a section are left untouched.
    pub fn prefix_page_start(&mut self, prefix: &str) {
        let Some(section) = self.doc.root.find_mut(|e| e.name == "Section") else {
            debug!("{DESIGNMAP}: no <Section>, PageStart not prefixed");
            return;
        };
        if let Some(start) = section.attr(PAGE_START).map(str::to_string) {
            section.set_attr(PAGE_START, format!("{prefix}{start}"));
        }
    }
}

fn last_position(children: &[Node], pred: impl Fn(&Element) -> bool) -> Option<usize> {
    children
        .iter()
        .rposition(|n| matches!(n, Node::Element(e) if pred(e)))
}
