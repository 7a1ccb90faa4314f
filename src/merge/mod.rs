//! Combining packages: prefixing, content insertion and page append.
//!
//! Merging assumes identifiers never collide, which callers arrange by
//! giving each source package a distinct prefix first.

mod insert;
mod pages;
mod prefix;

pub use pages::PageRequest;
pub use prefix::{EXCLUDED_FROM_PREFIX, PREFIXED_ATTRIBUTES, prefix_references};
