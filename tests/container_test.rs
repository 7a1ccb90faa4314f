//! Packing, staging and saving packages.

mod common;

use std::fs;
use std::io::Read;

use galley::{Error, Package};
use tempfile::TempDir;

#[test]
fn test_create_from_dir_refuses_existing_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("layout.idml");
    fs::write(&path, b"not a package").unwrap();

    let created = Package::create_from_dir(common::fixture_dir("layout"), &path).unwrap();
    assert!(created.is_none());
    assert_eq!(fs::read(&path).unwrap(), b"not a package");
}

#[test]
fn test_mimetype_is_first_and_stored() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "layout");
    pkg.prefix("a_").unwrap();
    let out = tmp.path().join("out.idml");
    pkg.save(&out).unwrap();

    let mut zip = zip::ZipArchive::new(fs::File::open(&out).unwrap()).unwrap();
    let mut first = zip.by_index(0).unwrap();
    assert_eq!(first.name(), "mimetype");
    assert_eq!(first.compression(), zip::CompressionMethod::Stored);
    let mut mimetype = String::new();
    first.read_to_string(&mut mimetype).unwrap();
    assert_eq!(mimetype, "application/vnd.adobe.indesign-idml-package");
}

#[test]
fn test_edits_require_staging() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "layout");
    let doc = pkg.read_document("XML/Tags.xml").unwrap();

    assert!(matches!(
        pkg.write_document("XML/Tags.xml", &doc),
        Err(Error::NotStaged(_))
    ));
    pkg.stage().unwrap();
    pkg.write_document("XML/Tags.xml", &doc).unwrap();
    assert!(pkg.archive().is_staged());
}

#[test]
fn test_staging_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "layout");
    pkg.stage().unwrap();
    let staged_dir = pkg.archive().staging().unwrap().path().to_path_buf();
    pkg.stage().unwrap();
    assert_eq!(pkg.archive().staging().unwrap().path(), staged_dir);
    assert!(staged_dir.join("designmap.xml").is_file());
}

#[test]
fn test_save_unstaged_copies_members() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "article");
    let out = tmp.path().join("copy.idml");
    pkg.save(&out).unwrap();

    let mut copy = Package::open(&out).unwrap();
    assert_eq!(copy.list_names().unwrap(), pkg.list_names().unwrap());
    assert_eq!(copy.structure().unwrap().node_count(), 4);
}

#[test]
fn test_missing_member() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "layout");
    assert!(matches!(
        pkg.read_document("Stories/Story_nope.xml"),
        Err(Error::MissingMember(_))
    ));
}
