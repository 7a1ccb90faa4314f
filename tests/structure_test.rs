//! Structure resolution and export over packed fixtures.

mod common;

use galley::{Error, Identifier, NodePath};
use tempfile::TempDir;

#[test]
fn test_resolve_layout() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "layout");
    let tree = pkg.structure().unwrap();

    assert_eq!(tree.root.tag, "Root");
    let tags: Vec<&str> = tree.root.children.iter().map(|n| n.tag.as_str()).collect();
    assert_eq!(tags, ["article", "article"]);
    assert_eq!(
        tree.root.children[1].content,
        Some(Identifier::from("ue2"))
    );
    assert_eq!(tree.node_count(), 3);
}

#[test]
fn test_resolve_follows_nested_stories() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "article");
    let tree = pkg.structure().unwrap();

    let module = tree.select_node("/Root/module").unwrap();
    let tags: Vec<&str> = module.children.iter().map(|n| n.tag.as_str()).collect();
    // The title sits inside a paragraph range; ranges are transparent.
    assert_eq!(tags, ["title", "caption"]);
    assert_eq!(
        tree.select("//caption").unwrap(),
        NodePath::from(vec![0, 1])
    );
}

#[test]
fn test_select_errors() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "layout");

    assert!(matches!(
        pkg.select("/Root/article[3]"),
        Err(Error::PathNotFound(_))
    ));
    assert!(matches!(pkg.select("/Root["), Err(Error::InvalidPath(_))));
}

#[test]
fn test_host_story_of_nested_nodes() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "article");

    assert_eq!(pkg.host_story_name("/Root").unwrap(), "XML/BackingStory.xml");
    assert_eq!(
        pkg.host_story_name("/Root/module/title").unwrap(),
        "Stories/Story_u1.xml"
    );
    assert_eq!(
        pkg.host_story_name("/Root/module/caption").unwrap(),
        "Stories/Story_u2.xml"
    );
}

#[test]
fn test_export_inlines_story_text() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "article");

    let xml = pkg.export_xml(None).unwrap();
    assert!(xml.contains("<title>Headline</title>"), "{xml}");
    assert!(xml.contains("<caption>Photo credit</caption>"), "{xml}");

    let caption = pkg.export_xml(Some("//caption")).unwrap();
    assert!(caption.contains("<caption>Photo credit</caption>"));
    assert!(!caption.contains("<module>"));
}

#[test]
fn test_views_of_unstaged_package() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "layout");

    assert_eq!(pkg.spread_names().unwrap(), ["Spreads/Spread_ub6.xml"]);
    assert_eq!(
        pkg.story_names().unwrap(),
        ["Stories/Story_ue1.xml", "Stories/Story_ue2.xml"]
    );
    assert_eq!(pkg.tags().unwrap().len(), 2);
    assert_eq!(pkg.font_families().unwrap().len(), 1);
    assert_eq!(pkg.style_groups().unwrap().len(), 2);
    assert_eq!(pkg.pages().unwrap().len(), 1);
    assert!(!pkg.archive().is_staged());
}
