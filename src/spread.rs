//! Layout files: pages and the items placed on one physical sheet.

use std::collections::HashSet;

use log::debug;

use crate::error::{Error, Result};
use crate::geometry::{Face, PageGeometry, Point, translate_item};
use crate::ids::{Identifier, node_id_from_filename};
use crate::xml::{Document, Element, Node};

/// Children of `<Spread>` that are not placed items.
pub const NON_ITEMS: &[&str] = &["Page", "FlattenerPreference"];

/// A `<Page>` located in its spread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Member name of the spread holding the page.
    pub spread: String,
    pub id: Option<Identifier>,
    /// Index of the page node among the `<Spread>` node's children.
    pub position: usize,
    pub geometry: PageGeometry,
}

impl Page {
    pub fn face(&self) -> Face {
        self.geometry.face()
    }

    pub fn is_recto(&self) -> bool {
        self.geometry.is_recto()
    }
}

/// A parsed `Spreads/Spread_*.xml` member.
#[derive(Debug, Clone)]
pub struct Spread {
    pub name: String,
    pub doc: Document,
}

impl Spread {
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

    pub fn to_bytes(&self) -> Vec<u8> {
        self.doc.to_bytes(&self.name)
    }

    /// The `<Spread>` element under the packaging root.
    pub fn node(&self) -> Result<&Element> {
        self.doc
            .root
            .child("Spread")
            .ok_or_else(|| Error::MissingElement(format!("Spread in {}", self.name)))
    }

    pub fn node_mut(&mut self) -> Result<&mut Element> {
        let name = &self.name;
        self.doc
            .root
            .child_mut("Spread")
            .ok_or_else(|| Error::MissingElement(format!("Spread in {name}")))
    }

    /// Pages in document order (left to right).
    pub fn pages(&self) -> Result<Vec<Page>> {
        let node = self.node()?;
        let mut pages = Vec::new();
        for (position, child) in node.children.iter().enumerate() {
            if let Node::Element(e) = child
                && e.name == "Page"
            {
                pages.push(Page {
                    spread: self.name.clone(),
                    id: e.attr("Self").map(Identifier::from),
                    position,
                    geometry: PageGeometry::from_element(e)?,
                });
            }
        }
        Ok(pages)
    }

    /// Positions of the items whose first anchor falls on `page`.
    pub fn page_items(&self, page: &Page) -> Result<Vec<usize>> {
        let node = self.node()?;
        let mut owned = Vec::new();
        for (position, child) in node.children.iter().enumerate() {
            if let Node::Element(e) = child
                && !NON_ITEMS.contains(&e.name.as_str())
                && page.geometry.owns(e)?
            {
                owned.push(position);
            }
        }
        Ok(owned)
    }

    /// Copies of a page node and of the items it owns.
    pub fn page_with_items(&self, page: &Page) -> Result<(Element, Vec<Element>)> {
        let node = self.node()?;
        let page_node = element_at(node, page.position)?.clone();
        let items = self
            .page_items(page)?
            .into_iter()
            .map(|pos| element_at(node, pos).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok((page_node, items))
    }

    /// Move `page` to `face`, dragging `items` (captured before the move) along.
    ///
    /// Returns `false` when the page already shows `face`.
    pub fn set_face(&mut self, page: &Page, face: Face, items: &[usize]) -> Result<bool> {
        let mut geometry = page.geometry;
        let Some(delta) = geometry.set_face(face) else {
            return Ok(false);
        };
        debug!(
            "{}: page {:?} to {face}, shifting {} item(s) by {delta}",
            self.name,
            page.id.as_ref().map(Identifier::as_str),
            items.len()
        );

        let node = self.node_mut()?;
        let shift = PageGeometry::shift_vector(delta);
        {
            let page_node = element_at_mut(node, page.position)?;
            crate::geometry::set_item_transform(page_node, &geometry.transform);
        }
        for &pos in items {
            translate_item(element_at_mut(node, pos)?, shift)?;
        }
        Ok(true)
    }

    /// Append a page (after the last page, or first if the spread is empty)
    /// together with its items, then move it to the free slot.
    ///
    /// A spread holding one page receives the new page as its recto; an
    /// empty spread receives it as its verso.
    pub fn add_page(&mut self, page_node: &Element, items: &[Element]) -> Result<Face> {
        let last_position = self.pages()?.last().map(|p| p.position);
        let face = {
            let node = self.node_mut()?;
            let face = match last_position {
                Some(pos) => {
                    node.children
                        .insert(pos + 1, Node::Element(page_node.clone()));
                    Face::Recto
                }
                None => {
                    node.children.push(Node::Element(page_node.clone()));
                    Face::Verso
                }
            };
            node.children
                .extend(items.iter().cloned().map(Node::Element));
            face
        };

        let pages = self.pages()?;
        let new_page = pages
            .last()
            .ok_or_else(|| Error::MissingElement(format!("Page in {}", self.name)))?;

        // Until the new page is in place its X range may overlap the other
        // page's, so geometric ownership is narrowed to the copied items.
        let references: HashSet<&str> = items.iter().filter_map(|i| i.attr("Self")).collect();
        let node = self.node()?;
        let owned: Vec<usize> = self
            .page_items(new_page)?
            .into_iter()
            .filter(|&pos| {
                element_at(node, pos)
                    .ok()
                    .and_then(|e| e.attr("Self"))
                    .is_some_and(|id| references.contains(id))
            })
            .collect();

        self.set_face(new_page, face, &owned)?;
        Ok(face)
    }

    /// Drop every page and item while keeping the spread's own attributes.
    pub fn clear(&mut self) -> Result<()> {
        self.node_mut()?.clear_children();
        Ok(())
    }

    /// Set the `<Spread>` node's `Self` from the member name (`Spread_<id>.xml`).
    pub fn sync_self_with_name(&mut self) -> Result<()> {
        let id = node_id_from_filename(&self.name)
            .ok_or_else(|| Error::MissingElement(format!("identifier in {}", self.name)))?;
        self.node_mut()?.set_attr("Self", id.as_str());
        Ok(())
    }

    /// The item placed for `reference`: matched on `Self` first, then on
    /// `ParentStory` (text frames are keyed by the story they display).
    pub fn find_item(&self, reference: &Identifier) -> Option<&Element> {
        let node = self.node().ok()?;
        node.child_elements()
            .find(|e| e.attr("Self") == Some(reference.as_str()))
            .or_else(|| {
                node.child_elements()
                    .find(|e| e.attr("ParentStory") == Some(reference.as_str()))
            })
    }

    /// Copies of every placed item, excluding pages and flattener settings.
    pub fn items(&self) -> Result<Vec<Element>> {
        Ok(self
            .node()?
            .child_elements()
            .filter(|e| !NON_ITEMS.contains(&e.name.as_str()))
            .cloned()
            .collect())
    }

    /// Append items, shifting each one's translation by `translation`.
    pub fn append_items(&mut self, items: Vec<Element>, translation: Point) -> Result<()> {
        let node = self.node_mut()?;
        for mut item in items {
            translate_item(&mut item, translation)?;
            node.children.push(Node::Element(item));
        }
        Ok(())
    }
}

fn element_at(node: &Element, position: usize) -> Result<&Element> {
    match node.children.get(position) {
        Some(Node::Element(e)) => Ok(e),
        _ => Err(Error::MissingElement(format!(
            "element at position {position} of <{}>",
            node.name
        ))),
    }
}

fn element_at_mut(node: &mut Element, position: usize) -> Result<&mut Element> {
    let name = node.name.clone();
    match node.children.get_mut(position) {
        Some(Node::Element(e)) => Ok(e),
        _ => Err(Error::MissingElement(format!(
            "element at position {position} of <{name}>"
        ))),
    }
}
