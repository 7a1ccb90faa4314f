//! Element identifiers.

use std::fmt;

/// Opaque identifier joining structure nodes, story elements and spread items.
///
/// Values come from `Self`, `XMLContent` and `ParentStory` attributes. Kept
/// distinct from display text so the two cannot be mixed up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(transparent))]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A new identifier with `prefix` prepended.
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self(format!("{prefix}{}", self.0))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Member name of the story file holding `id`.
pub fn story_filename(id: &Identifier) -> String {
    format!("{STORIES_DIR}/{STORY_STEM}{id}.xml")
}

/// Identifier encoded in a story member name (`Stories/Story_<id>.xml`).
pub fn story_id_from_filename(name: &str) -> Option<Identifier> {
    name.strip_prefix(STORIES_DIR)?
        .strip_prefix('/')?
        .strip_prefix(STORY_STEM)?
        .strip_suffix(".xml")
        .filter(|id| !id.is_empty())
        .map(Identifier::from)
}

/// Identifier encoded in a layout member name (`Spreads/Spread_<id>.xml`).
pub fn node_id_from_filename(name: &str) -> Option<Identifier> {
    let file = name.rsplit('/').next()?;
    let (_, rest) = file.split_once('_')?;
    rest.strip_suffix(".xml")
        .filter(|id| !id.is_empty())
        .map(Identifier::from)
}

/// Insert `prefix` between the content stem and the identifier of a member name.
///
/// Applies to `Story_*.xml` and `Spread_*.xml` basenames, with or without a
/// directory; returns `None` for any other name.
pub fn prefix_content_filename(name: &str, prefix: &str) -> Option<String> {
    let (dir, file) = match name.rfind('/') {
        Some(pos) => (&name[..=pos], &name[pos + 1..]),
        None => ("", name),
    };
    if !file.ends_with(".xml") {
        return None;
    }
    [STORY_STEM, SPREAD_STEM].iter().find_map(|stem| {
        let rest = file.strip_prefix(stem)?;
        (rest.len() > ".xml".len()).then(|| format!("{dir}{stem}{prefix}{rest}"))
    })
}

pub const STORIES_DIR: &str = "Stories";
pub const SPREADS_DIR: &str = "Spreads";
pub const STORY_STEM: &str = "Story_";
pub const SPREAD_STEM: &str = "Spread_";
