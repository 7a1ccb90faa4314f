//! Package container access: the zip archive and its staging directory.

mod archive;
mod source;
mod staging;

pub use archive::{Archive, pack_dir};
pub use source::PackageSource;
pub use staging::StagingArea;

/// Member that must come first, uncompressed, in every package.
pub const MIMETYPE: &str = "mimetype";
