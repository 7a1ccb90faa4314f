//! The unified logical structure of a package.
//!
//! A package's user-visible XML outline is scattered: the backing story holds
//! the root, and every element bound to a text story continues inside that
//! story's file. [`resolve`] walks those files and stitches one tree.

mod export;
mod path;

pub use export::export_xml;
pub use path::{NodePath, StructurePath};

use std::collections::HashSet;

use log::warn;

use crate::error::{Error, Result};
use crate::ids::Identifier;
use crate::story::{BACKING_STORY, ContentSource};
use crate::xml::Element;

/// Prefix of `MarkupTag` values, stripped to form display tags.
pub const MARKUP_TAG_PREFIX: &str = "XMLTag/";

const MARKUP_TAG: &str = "MarkupTag";
const CONTENT_REF: &str = "XMLContent";

/// One element of the logical structure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct StructureNode {
    /// Display tag (`MarkupTag` without `XMLTag/`).
    pub tag: String,
    /// `Self` of the underlying `XMLElement`.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub id: Option<Identifier>,
    /// `XMLContent`: the story (or placed item) rendering this node.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub content: Option<Identifier>,
    /// Every attribute except `MarkupTag`, in document order.
    #[cfg_attr(feature = "cli", serde(skip))]
    pub attributes: Vec<(String, String)>,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<StructureNode>,
}

impl StructureNode {
    /// Build a node from an `XMLElement` carrying a markup tag.
    pub fn from_xml_element(elem: &Element, markup_tag: &str) -> Self {
        let tag = markup_tag
            .strip_prefix(MARKUP_TAG_PREFIX)
            .unwrap_or(markup_tag)
            .to_string();
        Self {
            tag,
            id: elem.non_empty_attr("Self").map(Identifier::from),
            content: elem.non_empty_attr(CONTENT_REF).map(Identifier::from),
            attributes: elem
                .attributes
                .iter()
                .filter(|(k, _)| k != MARKUP_TAG)
                .cloned()
                .collect(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(StructureNode::node_count)
            .sum::<usize>()
    }
}

/// The resolved logical structure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct StructureTree {
    pub root: StructureNode,
}

impl StructureTree {
    /// The node at `path`, if any.
    pub fn node(&self, path: &NodePath) -> Option<&StructureNode> {
        path.indices()
            .iter()
            .try_fold(&self.root, |node, &i| node.children.get(i))
    }

    /// All nodes matched by a path expression, in document order.
    pub fn select_all(&self, expr: &str) -> Result<Vec<NodePath>> {
        Ok(StructurePath::parse(expr)?.evaluate(&self.root))
    }

    /// The first node matched by a path expression.
    pub fn select(&self, expr: &str) -> Result<NodePath> {
        self.select_all(expr)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::PathNotFound(expr.to_string()))
    }

    /// The first node matched by a path expression, by reference.
    pub fn select_node(&self, expr: &str) -> Result<&StructureNode> {
        let path = self.select(expr)?;
        self.node(&path)
            .ok_or_else(|| Error::PathNotFound(expr.to_string()))
    }

    /// Nodes from the root down to `path` inclusive.
    pub fn lineage(&self, path: &NodePath) -> Vec<&StructureNode> {
        let mut nodes = vec![&self.root];
        let mut current = &self.root;
        for &i in path.indices() {
            match current.children.get(i) {
                Some(child) => {
                    nodes.push(child);
                    current = child;
                }
                None => break,
            }
        }
        nodes
    }

    /// The member holding the `XMLElement` for the node at `path`.
    ///
    /// That is the story of the nearest node (the node itself or an
    /// ancestor) whose content reference resolves to a story file; nodes
    /// bound to graphics or to nothing defer to their parent, and the root
    /// lives in the backing story.
    pub fn host_story<S>(&self, path: &NodePath, source: &mut S) -> Result<String>
    where
        S: ContentSource + ?Sized,
    {
        for node in self.lineage(path).into_iter().rev() {
            if let Some(reference) = &node.content
                && let Some(story) = source.story(reference)?
            {
                return Ok(story.name);
            }
        }
        Ok(BACKING_STORY.to_string())
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}

/// Reconstruct the logical structure of a package.
///
/// Starts from the first `XMLElement` of the backing story and follows
/// content references into story files. A reference with no story file
/// (typically a placed graphic) makes its node a leaf. The walk only reads
/// from `source`.
pub fn resolve<S>(source: &mut S) -> Result<StructureTree>
where
    S: ContentSource + ?Sized,
{
    let backing = source.backing_story()?;
    let root_elem = backing
        .first_xml_element()
        .ok_or_else(|| Error::MissingElement(format!("XMLElement in {BACKING_STORY}")))?;

    let markup_tag = root_elem.non_empty_attr(MARKUP_TAG).unwrap_or("Root");
    let mut root = StructureNode::from_xml_element(root_elem, markup_tag);
    let mut expanded = HashSet::new();
    append_children(source, root_elem, &mut root, &mut expanded)?;

    Ok(StructureTree { root })
}

fn append_children<S>(
    source: &mut S,
    from: &Element,
    into: &mut StructureNode,
    expanded: &mut HashSet<Identifier>,
) -> Result<()>
where
    S: ContentSource + ?Sized,
{
    let from_id = from.non_empty_attr("Self");

    for child in from.child_elements() {
        // Untagged elements (and style ranges wrapping tagged ones) are
        // transparent.
        let Some(markup_tag) = child.non_empty_attr(MARKUP_TAG) else {
            append_children(source, child, into, expanded)?;
            continue;
        };
        if from_id.is_some() && child.non_empty_attr("Self") == from_id {
            continue;
        }

        let mut node = StructureNode::from_xml_element(child, markup_tag);
        match (node.content.clone(), node.id.clone()) {
            (Some(reference), Some(id)) => {
                if let Some(story) = source.story(&reference)? {
                    if !expanded.insert(id.clone()) {
                        warn!("{}: element {id} already expanded, not following again", story.name);
                    } else if let Some(continued) = story.element(id.as_str()) {
                        append_children(source, continued, &mut node, expanded)?;
                    } else {
                        warn!("{}: no XMLElement {id}, treating as leaf", story.name);
                    }
                }
            }
            (Some(_), None) => {}
            (None, _) => append_children(source, child, &mut node, expanded)?,
        }
        into.children.push(node);
    }
    Ok(())
}
