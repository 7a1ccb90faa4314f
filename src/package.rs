//! An opened layout package and its derived views.

use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::geometry::{Point, item_anchor, item_transform};
use crate::ids::{Identifier, story_id_from_filename};
use crate::io::{Archive, pack_dir};
use crate::manifest::{DESIGNMAP, Designmap};
use crate::resources::{self, FONTS, STYLES, TAGS};
use crate::spread::{Page, Spread};
use crate::story::{BACKING_STORY, ContentSource, Story};
use crate::structure::{self, NodePath, StructureTree};
use crate::xml::{Document, Element, write_document};

/// A derived value stamped with the generation it was computed at.
#[derive(Debug)]
struct Cached<T> {
    generation: u64,
    value: T,
}

/// Return the cached value, recomputing it first when stale.
fn cached<T>(
    slot: &mut Option<Cached<T>>,
    generation: u64,
    compute: impl FnOnce() -> Result<T>,
) -> Result<&T> {
    let entry = match slot.take() {
        Some(entry) if entry.generation == generation => entry,
        _ => Cached {
            generation,
            value: compute()?,
        },
    };
    Ok(&slot.insert(entry).value)
}

#[derive(Debug, Default)]
struct Views {
    structure: Option<Cached<StructureTree>>,
    tags: Option<Cached<Vec<Element>>>,
    font_families: Option<Cached<Vec<Element>>>,
    style_groups: Option<Cached<Vec<Element>>>,
    spread_names: Option<Cached<Vec<String>>>,
    spreads: Option<Cached<Vec<Spread>>>,
    pages: Option<Cached<Vec<Page>>>,
    story_names: Option<Cached<Vec<String>>>,
    story_ids: Option<Cached<Vec<Identifier>>>,
}

/// A layout package.
///
/// Views (structure, registries, spreads, pages, stories) are computed on
/// first use and reused until a mutation bumps the package generation.
#[derive(Debug)]
pub struct Package {
    archive: Archive,
    generation: u64,
    views: Views,
}

impl Package {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_archive(Archive::open(path)?))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(Self::from_archive(Archive::from_bytes(bytes)?))
    }

    pub fn from_archive(archive: Archive) -> Self {
        Self {
            archive,
            generation: 0,
            views: Views::default(),
        }
    }

    /// Pack the unpacked package in `dir` into a new file at `package_path`.
    ///
    /// Returns `Ok(None)`, writing nothing, when `package_path` already exists.
    pub fn create_from_dir(
        dir: impl AsRef<Path>,
        package_path: impl AsRef<Path>,
    ) -> Result<Option<Self>> {
        let package_path = package_path.as_ref();
        if package_path.exists() {
            warn!("{} already exists, not overwriting", package_path.display());
            return Ok(None);
        }
        pack_dir(dir.as_ref(), package_path)?;
        Self::open(package_path).map(Some)
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub(crate) fn archive_mut(&mut self) -> &mut Archive {
        &mut self.archive
    }

    /// Current generation; bumped by every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mark every derived view stale.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Extract the package for editing. Idempotent.
    pub fn stage(&mut self) -> Result<()> {
        self.archive.stage()?;
        Ok(())
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.archive.save(path)
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.archive.to_bytes()
    }

    pub fn list_names(&self) -> Result<Vec<String>> {
        self.archive.list_names()
    }

    pub fn read_document(&mut self, name: &str) -> Result<Document> {
        read_document(&mut self.archive, name)
    }

    /// Serialize `doc` into member `name`. The package must be staged.
    pub fn write_document(&mut self, name: &str, doc: &Document) -> Result<()> {
        self.archive.write(name, &doc.to_bytes(name))
    }

    pub fn designmap(&mut self) -> Result<Designmap> {
        let bytes = self.archive.read_required(DESIGNMAP)?;
        Designmap::parse(&bytes)
    }

    pub(crate) fn write_designmap(&mut self, designmap: &Designmap) -> Result<()> {
        self.archive.write(DESIGNMAP, &designmap.to_bytes())
    }

    /// The resolved logical structure.
    pub fn structure(&mut self) -> Result<&StructureTree> {
        cached(&mut self.views.structure, self.generation, || {
            structure::resolve(&mut self.archive)
        })
    }

    /// Tag definitions of `XML/Tags.xml`.
    pub fn tags(&mut self) -> Result<&[Element]> {
        cached(&mut self.views.tags, self.generation, || {
            Ok(resources::tags(&read_document(&mut self.archive, TAGS)?))
        })
        .map(Vec::as_slice)
    }

    pub fn font_families(&mut self) -> Result<&[Element]> {
        cached(&mut self.views.font_families, self.generation, || {
            Ok(resources::font_families(&read_document(
                &mut self.archive,
                FONTS,
            )?))
        })
        .map(Vec::as_slice)
    }

    pub fn style_groups(&mut self) -> Result<&[Element]> {
        cached(&mut self.views.style_groups, self.generation, || {
            Ok(resources::style_groups(&read_document(
                &mut self.archive,
                STYLES,
            )?))
        })
        .map(Vec::as_slice)
    }

    /// Spread member names in manifest order.
    pub fn spread_names(&mut self) -> Result<&[String]> {
        cached(&mut self.views.spread_names, self.generation, || {
            let bytes = self.archive.read_required(DESIGNMAP)?;
            Ok(Designmap::parse(&bytes)?.spread_refs())
        })
        .map(Vec::as_slice)
    }

    pub fn spreads(&mut self) -> Result<&[Spread]> {
        let generation = self.generation;
        if !is_fresh(&self.views.spreads, generation) {
            let names = self.spread_names()?.to_vec();
            let spreads = names
                .into_iter()
                .map(|name| self.spread(&name))
                .collect::<Result<Vec<_>>>()?;
            self.views.spreads = Some(Cached {
                generation,
                value: spreads,
            });
        }
        Ok(slice_of(&self.views.spreads))
    }

    /// A freshly parsed spread, for editing.
    pub fn spread(&mut self, name: &str) -> Result<Spread> {
        let bytes = self.archive.read_required(name)?;
        Spread::parse(name, &bytes)
    }

    pub(crate) fn write_spread(&mut self, spread: &Spread) -> Result<()> {
        self.archive.write(&spread.name, &spread.to_bytes())
    }

    /// Every page, spread by spread, left to right.
    pub fn pages(&mut self) -> Result<&[Page]> {
        let generation = self.generation;
        if !is_fresh(&self.views.pages, generation) {
            let mut pages = Vec::new();
            for spread in self.spreads()? {
                pages.extend(spread.pages()?);
            }
            self.views.pages = Some(Cached {
                generation,
                value: pages,
            });
        }
        Ok(slice_of(&self.views.pages))
    }

    /// Story member names, sorted.
    pub fn story_names(&mut self) -> Result<&[String]> {
        cached(&mut self.views.story_names, self.generation, || {
            let mut names: Vec<String> = self
                .archive
                .list_names()?
                .into_iter()
                .filter(|n| story_id_from_filename(n).is_some())
                .collect();
            names.sort();
            Ok(names)
        })
        .map(Vec::as_slice)
    }

    /// Identifiers of the story files, in [`Package::story_names`] order.
    pub fn story_ids(&mut self) -> Result<&[Identifier]> {
        let generation = self.generation;
        if !is_fresh(&self.views.story_ids, generation) {
            let ids = self
                .story_names()?
                .iter()
                .filter_map(|n| story_id_from_filename(n))
                .collect();
            self.views.story_ids = Some(Cached {
                generation,
                value: ids,
            });
        }
        Ok(slice_of(&self.views.story_ids))
    }

    pub fn story(&mut self, id: &Identifier) -> Result<Option<Story>> {
        self.archive.story(id)
    }

    pub fn backing_story(&mut self) -> Result<Story> {
        self.archive.backing_story()
    }

    /// Parse and evaluate a path expression against the structure.
    pub fn select(&mut self, expr: &str) -> Result<NodePath> {
        self.structure()?.select(expr)
    }

    /// Member holding the `XMLElement` of the node selected by `expr`.
    pub fn host_story_name(&mut self, expr: &str) -> Result<String> {
        let tree = self.structure()?.clone();
        let path = tree.select(expr)?;
        tree.host_story(&path, &mut self.archive)
    }

    /// The content reference of the node selected by `expr`.
    pub fn content_reference(&mut self, expr: &str) -> Result<Identifier> {
        self.structure()?
            .select_node(expr)?
            .content
            .clone()
            .ok_or_else(|| Error::MissingAttribute {
                element: format!("XMLElement at {expr}"),
                attribute: "XMLContent".to_string(),
            })
    }

    /// Name of the spread placing the content of the node selected by `expr`.
    pub fn spread_for(&mut self, expr: &str) -> Result<Option<String>> {
        let reference = self.content_reference(expr)?;
        Ok(self
            .spreads()?
            .iter()
            .find(|s| s.find_item(&reference).is_some())
            .map(|s| s.name.clone()))
    }

    /// The spread item placing the content of the node selected by `expr`.
    pub fn spread_item(&mut self, expr: &str) -> Result<Element> {
        let reference = self.content_reference(expr)?;
        self.spreads()?
            .iter()
            .find_map(|s| s.find_item(&reference))
            .cloned()
            .ok_or_else(|| Error::MissingElement(format!("spread item for {reference} ({expr})")))
    }

    /// Absolute position of the first outline anchor of the item selected by
    /// `expr`: the anchor plus the item's translation.
    pub fn item_position(&mut self, expr: &str) -> Result<Point> {
        let item = self.spread_item(expr)?;
        Ok(item_anchor(&item, 0)? + item_transform(&item)?.translation())
    }

    /// Export the structure as bare tags with inlined text, from the root or
    /// from the node selected by `from`.
    pub fn export_xml(&mut self, from: Option<&str>) -> Result<String> {
        let tree = self.structure()?.clone();
        let start = from.map(|expr| tree.select(expr)).transpose()?;
        let root = structure::export_xml(&tree, start.as_ref(), &mut self.archive)?;
        Ok(String::from_utf8(write_document(&Document::new(root), None))?)
    }
}

impl ContentSource for Archive {
    fn backing_story(&mut self) -> Result<Story> {
        let bytes = self.read_required(BACKING_STORY)?;
        Story::parse(BACKING_STORY, &bytes)
    }

    fn story(&mut self, id: &Identifier) -> Result<Option<Story>> {
        let name = Story::filename_for(id);
        match self.read(&name)? {
            Some(bytes) => Story::parse(name, &bytes).map(Some),
            None => {
                debug!("{name} not present, reference {id} is not a story");
                Ok(None)
            }
        }
    }
}

fn read_document(archive: &mut Archive, name: &str) -> Result<Document> {
    let bytes = archive.read_required(name)?;
    Document::parse(&bytes).map_err(|e| e.in_member(name))
}

fn is_fresh<T>(slot: &Option<Cached<T>>, generation: u64) -> bool {
    slot.as_ref().is_some_and(|c| c.generation == generation)
}

fn slice_of<T>(slot: &Option<Cached<Vec<T>>>) -> &[T] {
    slot.as_ref().map(|c| c.value.as_slice()).unwrap_or_default()
}
