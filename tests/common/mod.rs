//! Shared fixture loading for the integration tests.
//!
//! Fixtures are unpacked packages under `tests/fixtures/<name>/`; each test
//! packs its own copy into a temporary directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use galley::Package;
use tempfile::TempDir;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

pub fn fixture_dir(name: &str) -> PathBuf {
    Path::new(FIXTURES_DIR).join(name)
}

/// Pack fixture `name` into `tmp` and open it.
pub fn package(tmp: &TempDir, name: &str) -> Package {
    package_as(tmp, name, name)
}

/// Pack fixture `name` into `tmp` under `file_stem`, so one fixture can be
/// opened several times.
pub fn package_as(tmp: &TempDir, name: &str, file_stem: &str) -> Package {
    let path = tmp.path().join(format!("{file_stem}.idml"));
    Package::create_from_dir(fixture_dir(name), &path)
        .expect("pack fixture")
        .expect("fresh package path")
}

/// The article fixture with every identifier prefixed.
pub fn prefixed_article(tmp: &TempDir, prefix: &str) -> Package {
    let mut article = package_as(tmp, "article", &format!("article-{prefix}"));
    article.prefix(prefix).expect("prefix article");
    article
}
