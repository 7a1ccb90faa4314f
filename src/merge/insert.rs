use log::{debug, info};

use crate::error::{Error, Result};
use crate::ids::Identifier;
use crate::package::Package;
use crate::resources::{self, FONTS, STYLES, TAGS};
use crate::story::Story;
use crate::xml::Node;

impl Package {
    /// Insert the content of `src` selected by `only` at the node of this
    /// package selected by `at`.
    ///
    /// `src` should hold a single spread and be prefixed so that none of its
    /// identifiers collide with this package's. The layout items of `src` are
    /// moved so that the item placing `only` lands where the item placing
    /// `at` is. Stages this package; `src` is only read.
    pub fn insert(&mut self, src: &mut Package, at: &str, only: &str) -> Result<()> {
        let translation = self.item_position(at)? - src.item_position(only)?;
        debug!(
            "insert {only} at {at}: translation ({}, {})",
            translation.x, translation.y
        );
        self.stage()?;

        self.merge_resources(src)?;

        let spread_name = self
            .spread_for(at)?
            .ok_or_else(|| Error::MissingElement(format!("spread placing {at}")))?;
        let items = src
            .spreads()?
            .first()
            .ok_or_else(|| Error::MissingElement("spread in source package".to_string()))?
            .items()?;
        let mut spread = self.spread(&spread_name)?;
        let count = items.len();
        spread.append_items(items, translation)?;
        self.write_spread(&spread)?;
        debug!("{spread_name}: appended {count} item(s)");

        self.graft_content(src, at, only)?;
        self.invalidate();
        info!("inserted {only} at {at}");
        Ok(())
    }

    /// Union the font families, style groups and tag definitions of `src`
    /// into this package. The package must be staged.
    pub(crate) fn merge_resources(&mut self, src: &mut Package) -> Result<()> {
        let fonts = src.font_families()?.to_vec();
        let mut doc = self.read_document(FONTS)?;
        let added_fonts = resources::merge_font_families(&mut doc, &fonts);
        self.write_document(FONTS, &doc)?;

        let groups = src.style_groups()?.to_vec();
        let mut doc = self.read_document(STYLES)?;
        let added_styles = resources::merge_style_groups(&mut doc, &groups);
        self.write_document(STYLES, &doc)?;

        let tags = src.tags()?.to_vec();
        let mut doc = self.read_document(TAGS)?;
        let added_tags = resources::merge_tags(&mut doc, &tags);
        self.write_document(TAGS, &doc)?;

        debug!(
            "merged {added_fonts} font families, {added_styles} styles, {added_tags} tags"
        );
        Ok(())
    }

    /// Graft the `XMLElement` selected by `only` in `src` under the one
    /// selected by `at`, then bring over the source stories and register
    /// them. The package must be staged.
    ///
    /// A leaf `at` stops referencing content and becomes a container.
    pub(crate) fn graft_content(&mut self, src: &mut Package, at: &str, only: &str) -> Result<()> {
        let only_id = node_id(src, only)?;
        let source_story = host_story(src, only)?;
        let subtree = source_story
            .element(only_id.as_str())
            .cloned()
            .ok_or_else(|| {
                Error::MissingElement(format!("XMLElement {only_id} in {}", source_story.name))
            })?;

        let at_id = node_id(self, at)?;
        let mut story = host_story(self, at)?;
        let name = story.name.clone();
        let target = story
            .element_mut(at_id.as_str())
            .ok_or_else(|| Error::MissingElement(format!("XMLElement {at_id} in {name}")))?;
        target.remove_attr("XMLContent");
        target.children.push(Node::Element(subtree));
        self.write_document(&name, &story.doc)?;
        debug!("{name}: grafted {only_id} under {at_id}");

        // Every source story comes along, reachable from `only` or not.
        let story_names = src.story_names()?.to_vec();
        for name in &story_names {
            let bytes = src.archive_mut().read_required(name)?;
            self.archive_mut().write(name, &bytes)?;
        }

        let ids = src.story_ids()?.to_vec();
        let mut designmap = self.designmap()?;
        designmap.add_stories(&ids);
        self.write_designmap(&designmap)?;
        debug!("copied and registered {} story file(s)", ids.len());
        Ok(())
    }
}

/// `Self` of the structure node selected by `expr`.
fn node_id(package: &mut Package, expr: &str) -> Result<Identifier> {
    package
        .structure()?
        .select_node(expr)?
        .id
        .clone()
        .ok_or_else(|| Error::MissingAttribute {
            element: format!("XMLElement at {expr}"),
            attribute: "Self".to_string(),
        })
}

/// The story member holding the `XMLElement` selected by `expr`, parsed.
fn host_story(package: &mut Package, expr: &str) -> Result<Story> {
    let name = package.host_story_name(expr)?;
    let bytes = package.archive_mut().read_required(&name)?;
    Story::parse(name, &bytes)
}
