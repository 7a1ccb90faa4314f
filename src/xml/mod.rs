//! Owned XML element tree used for every package member.
//!
//! Names are kept as written (`idPkg:Story` stays qualified); packages use a
//! fixed prefix for their packaging namespace so no resolution is needed.

mod parser;
mod writer;

pub use parser::parse_document;
pub use writer::{doctype_for, write_document};

use crate::error::Result;

/// Packaging namespace declared on every package-level root element.
pub const PACKAGING_NS: &str = "http://ns.adobe.com/AdobeInDesign/idml/1.0/packaging";

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Processing instruction body (`target data`), e.g. `ACE 7` in story text.
    Instruction(String),
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// A parsed member file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse a member's bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        parse_document(bytes)
    }

    /// Serialize with the fixed declaration and the doctype registered for `member`.
    pub fn to_bytes(&self, member: &str) -> Vec<u8> {
        write_document(self, doctype_for(member))
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, treating an empty string as absent.
    pub fn non_empty_attr(&self, key: &str) -> Option<&str> {
        self.attr(key).filter(|v| !v.is_empty())
    }

    /// Set an attribute, replacing it in place when it already exists.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Direct element children, in order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.child_elements_mut().find(|e| e.name == name)
    }

    /// Follow a chain of child names, taking the first match at each step.
    pub fn descend(&self, names: &[&str]) -> Option<&Element> {
        names.iter().try_fold(self, |elem, name| elem.child(name))
    }

    /// Depth-first search (pre-order, excluding `self`).
    pub fn find<P>(&self, pred: P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool + Copy,
    {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find(pred) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_mut<P>(&mut self, pred: P) -> Option<&mut Element>
    where
        P: Fn(&Element) -> bool + Copy,
    {
        for child in self.child_elements_mut() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_mut(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Descendant `XMLElement` whose `Self` equals `id`.
    pub fn find_xml_element(&self, id: &str) -> Option<&Element> {
        self.find(|e| e.name == "XMLElement" && e.attr("Self") == Some(id))
    }

    pub fn find_xml_element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.find_mut(|e| e.name == "XMLElement" && e.attr("Self") == Some(id))
    }

    /// Visit `self` and every descendant element, pre-order.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        visit(self);
        for child in self.child_elements_mut() {
            child.walk_mut(visit);
        }
    }

    /// Concatenated text of direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Index in `children` of the n-th element child.
    pub fn element_position(&self, nth: usize) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, Node::Element(_)))
            .nth(nth)
            .map(|(i, _)| i)
    }

    /// Remove every child, keeping name and attributes.
    pub fn clear_children(&mut self) {
        self.children.clear();
    }
}
