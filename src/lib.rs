//! # galley
//!
//! Structure resolution, identifier prefixing and content merging for IDML
//! page-layout packages.
//!
//! ## Features
//!
//! - Resolve the logical XML structure spread over the backing story and the
//!   story files, and address it with path expressions
//! - Export that structure with story text inlined
//! - Prefix every identifier of a package so it can be merged into another
//! - Insert one package's content at a node of another, with layout items
//!   aligned
//! - Append pages from one package to another, starting spreads as needed
//!
//! ## Quick Start
//!
//! ```no_run
//! use galley::Package;
//!
//! let mut article = Package::open("article.idml").unwrap();
//! article.prefix("a1_").unwrap();
//!
//! let mut layout = Package::open("layout.idml").unwrap();
//! layout
//!     .insert(&mut article, "/Root/article[1]", "/Root/module")
//!     .unwrap();
//! layout.save("merged.idml").unwrap();
//! ```
//!
//! ## Packages
//!
//! A [`Package`] wraps the zip archive. Reads go straight to the archive
//! until the first edit, which unpacks it into a temporary staging
//! directory. Derived views such as [`Package::structure`] are cached and
//! rebuilt after every edit.

pub mod error;
pub mod geometry;
pub mod ids;
pub mod io;
pub mod manifest;
pub mod merge;
pub mod package;
pub mod resources;
pub mod spread;
pub mod story;
pub mod structure;
pub mod xml;
pub(crate) mod util;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::{Error, Result};
pub use geometry::{Face, ItemTransform, PageGeometry, Point};
pub use ids::Identifier;
pub use io::{Archive, StagingArea};
pub use manifest::Designmap;
pub use merge::PageRequest;
pub use package::Package;
pub use spread::{Page, Spread};
pub use story::{ContentSource, Story};
pub use structure::{NodePath, StructureNode, StructurePath, StructureTree};
