use log::{debug, info};

use crate::error::Result;
use crate::ids::{SPREAD_STEM, SPREADS_DIR, STORIES_DIR, STORY_STEM, prefix_content_filename};
use crate::manifest::{SPREAD_REF, STORY_REF};
use crate::package::Package;
use crate::xml::{Document, Element};

/// Element kinds shared package-wide whose attributes are never prefixed.
pub const EXCLUDED_FROM_PREFIX: &[&str] = &[
    "Document",
    "Language",
    "NumberingList",
    "NamedGrid",
    "TextVariable",
    "Layer",
    "Section",
    "DocumentUser",
    "CrossReferenceFormat",
    "BuildingBlock",
    "IndexingSortOption",
    "ABullet",
    "Assignment",
    "XMLTag",
    "MasterSpread",
];

/// Attributes holding identifiers or identifier references.
pub const PREFIXED_ATTRIBUTES: &[&str] = &[
    "Self",
    "XMLContent",
    "ParentStory",
    "AppliedCharacterStyle",
    "AppliedParagraphStyle",
];

const META_INF: &str = "META-INF/";

/// Prefix every identifier and content-file reference in one member.
pub fn prefix_references(doc: &mut Document, prefix: &str) {
    doc.root.walk_mut(&mut |elem| {
        if !EXCLUDED_FROM_PREFIX.contains(&elem.name.as_str()) {
            for attr in PREFIXED_ATTRIBUTES {
                if let Some(value) = elem.non_empty_attr(attr).map(str::to_string) {
                    elem.set_attr(*attr, format!("{prefix}{value}"));
                }
            }
        }
        if elem.name == SPREAD_REF || elem.name == STORY_REF {
            prefix_src(elem, prefix);
        }
    });

    let root = &mut doc.root;
    if root.name == "Document"
        && let Some(list) = root.non_empty_attr("StoryList").map(str::to_string)
    {
        let prefixed: Vec<String> = list
            .split_whitespace()
            .map(|id| format!("{prefix}{id}"))
            .collect();
        root.set_attr("StoryList", prefixed.join(" "));
    }
}

fn prefix_src(elem: &mut Element, prefix: &str) {
    let Some(src) = elem.attr("src") else {
        return;
    };
    let content_file = [(STORIES_DIR, STORY_STEM), (SPREADS_DIR, SPREAD_STEM)]
        .iter()
        .any(|(dir, stem)| {
            src.strip_prefix(dir)
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|file| file.starts_with(stem))
        });
    if !content_file {
        return;
    }
    if let Some(renamed) = prefix_content_filename(src, prefix) {
        elem.set_attr("src", renamed);
    }
}

impl Package {
    /// Make every identifier and content file name of the package unique to
    /// `prefix`, so it can be merged with differently prefixed packages.
    ///
    /// Stages the package. Members under `META-INF/` are left alone.
    pub fn prefix(&mut self, prefix: &str) -> Result<()> {
        if prefix.is_empty() {
            debug!("empty prefix, nothing to do");
            return Ok(());
        }
        self.stage()?;
        let names = self.list_names()?;

        let mut rewritten = 0;
        for name in names
            .iter()
            .filter(|n| n.ends_with(".xml") && !n.starts_with(META_INF))
        {
            let mut doc = self.read_document(name)?;
            prefix_references(&mut doc, prefix);
            self.write_document(name, &doc)?;
            rewritten += 1;
        }

        for name in names.iter().filter(|n| !n.starts_with(META_INF)) {
            if let Some(renamed) = prefix_content_filename(name, prefix) {
                debug!("rename {name} -> {renamed}");
                self.archive_mut().rename(name, &renamed)?;
            }
        }

        let mut designmap = self.designmap()?;
        designmap.prefix_page_start(prefix);
        self.write_designmap(&designmap)?;

        self.invalidate();
        info!("prefixed {rewritten} member(s) with {prefix:?}");
        Ok(())
    }
}
