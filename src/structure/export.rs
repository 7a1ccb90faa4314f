use std::collections::HashMap;

use super::{NodePath, StructureNode, StructureTree};
use crate::error::{Error, Result};
use crate::ids::Identifier;
use crate::story::{ContentSource, Story};
use crate::xml::{Element, Node};

/// Export the structure as a tree of bare tags carrying story text.
///
/// Each node's text is the content its `XMLElement` holds directly in the
/// story hosting it: the nearest story referenced by the node or one of its
/// ancestors, else the backing story. Nodes whose story file is missing get
/// no text.
pub fn export_xml<S>(tree: &StructureTree, from: Option<&NodePath>, source: &mut S) -> Result<Element>
where
    S: ContentSource + ?Sized,
{
    let start = from.cloned().unwrap_or_default();
    let node = tree
        .node(&start)
        .ok_or_else(|| Error::PathNotFound(start.to_string()))?;

    let mut exporter = Exporter {
        source,
        stories: HashMap::new(),
    };
    let inherited = tree
        .lineage(&start)
        .into_iter()
        .rev()
        .skip(1)
        .find_map(|ancestor| ancestor.content.clone());
    exporter.export(node, inherited.as_ref())
}

struct Exporter<'s, S: ?Sized> {
    source: &'s mut S,
    /// Parsed stories by reference; `None` for references with no file.
    stories: HashMap<Option<Identifier>, Option<Story>>,
}

impl<S> Exporter<'_, S>
where
    S: ContentSource + ?Sized,
{
    fn export(&mut self, node: &StructureNode, inherited: Option<&Identifier>) -> Result<Element> {
        // A reference with no story file (a placed graphic) leaves the node
        // hosted where its parent is.
        let host = match &node.content {
            Some(reference) if self.story(Some(reference))?.is_some() => Some(reference),
            _ => inherited,
        };

        let mut elem = Element::new(node.tag.clone());
        if let Some(id) = &node.id
            && let Some(story) = self.story(host)?
            && let Some(text) = story.element_content(id.as_str())
        {
            elem.children.push(Node::Text(text));
        }
        for child in &node.children {
            let exported = self.export(child, host)?;
            elem.children.push(Node::Element(exported));
        }
        Ok(elem)
    }

    /// The story for `reference`, or the backing story for `None`.
    fn story(&mut self, reference: Option<&Identifier>) -> Result<Option<&Story>> {
        let key = reference.cloned();
        if !self.stories.contains_key(&key) {
            let story = match reference {
                Some(id) => self.source.story(id)?,
                None => Some(self.source.backing_story()?),
            };
            self.stories.insert(key.clone(), story);
        }
        Ok(self.stories.get(&key).and_then(Option::as_ref))
    }
}
