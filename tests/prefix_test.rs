//! Prefixing a whole package.

mod common;

use std::collections::HashSet;

use galley::merge::{EXCLUDED_FROM_PREFIX, PREFIXED_ATTRIBUTES};
use galley::{Identifier, Package};
use proptest::prelude::*;
use tempfile::TempDir;

#[test]
fn test_prefix_renames_content_files() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::prefixed_article(&tmp, "a_");

    let names = pkg.list_names().unwrap();
    for expected in [
        "Stories/Story_a_u1.xml",
        "Stories/Story_a_u2.xml",
        "Spreads/Spread_a_ub6.xml",
        "XML/BackingStory.xml",
        "META-INF/container.xml",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }
    assert!(!names.iter().any(|n| n == "Stories/Story_u1.xml"));

    assert_eq!(pkg.spread_names().unwrap(), ["Spreads/Spread_a_ub6.xml"]);
    assert_eq!(
        pkg.story_ids().unwrap(),
        [Identifier::from("a_u1"), Identifier::from("a_u2")]
    );
}

#[test]
fn test_prefix_keeps_structure_resolvable() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::prefixed_article(&tmp, "a_");

    let module = pkg.structure().unwrap().select_node("/Root/module").unwrap();
    assert_eq!(module.id, Some(Identifier::from("a_di2i3")));
    assert_eq!(module.content, Some(Identifier::from("a_u1")));
    assert_eq!(module.children.len(), 2);

    // Layout follows the renamed story through ParentStory.
    let item = pkg.spread_item("/Root/module").unwrap();
    assert_eq!(item.attr("Self"), Some("a_uf1"));
    assert_eq!(item.attr("ParentStory"), Some("a_u1"));
}

#[test]
fn test_prefix_manifest_and_shared_definitions() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::prefixed_article(&tmp, "a_");

    let designmap = pkg.designmap().unwrap();
    assert_eq!(designmap.page_start(), Some("a_uc1"));
    assert_eq!(
        designmap.story_list(),
        [Identifier::from("a_u1"), Identifier::from("a_u2")]
    );
    assert_eq!(designmap.doc.root.attr("Self"), Some("d"));

    let page = &pkg.pages().unwrap()[0];
    assert_eq!(page.id, Some(Identifier::from("a_uc1")));

    // Tag definitions are shared between packages and keep their names.
    let tags: Vec<&str> = pkg
        .tags()
        .unwrap()
        .iter()
        .filter_map(|t| t.attr("Self"))
        .collect();
    assert!(tags.contains(&"XMLTag/module"));
}

#[test]
fn test_prefix_survives_save() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::prefixed_article(&tmp, "a_");
    let out = tmp.path().join("prefixed.idml");
    pkg.save(&out).unwrap();

    let mut reopened = Package::open(&out).unwrap();
    assert_eq!(
        reopened.story_names().unwrap(),
        ["Stories/Story_a_u1.xml", "Stories/Story_a_u2.xml"]
    );
    let xml = reopened.export_xml(None).unwrap();
    assert!(xml.contains("<title>Headline</title>"), "{xml}");
}

#[test]
fn test_empty_prefix_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let mut pkg = common::package(&tmp, "article");
    pkg.prefix("").unwrap();
    assert!(!pkg.archive().is_staged());
    assert_eq!(pkg.generation(), 0);
}

/// Every identifier a prefix touches: prefixed attribute values of
/// non-shared elements, `StoryList` tokens, and content member names.
fn identifiers(pkg: &mut Package) -> HashSet<String> {
    let mut ids = HashSet::new();
    for name in pkg.list_names().unwrap() {
        if name.starts_with("Stories/") || name.starts_with("Spreads/") {
            ids.insert(name.clone());
        }
        if !name.ends_with(".xml") || name.starts_with("META-INF/") {
            continue;
        }
        let mut doc = pkg.read_document(&name).unwrap();
        if let Some(list) = doc.root.attr("StoryList") {
            ids.extend(list.split_whitespace().map(str::to_string));
        }
        doc.root.walk_mut(&mut |elem| {
            if EXCLUDED_FROM_PREFIX.contains(&elem.name.as_str()) {
                return;
            }
            for attr in PREFIXED_ATTRIBUTES {
                if let Some(value) = elem.attr(attr).filter(|v| !v.is_empty()) {
                    ids.insert(value.to_string());
                }
            }
        });
    }
    ids
}

fn distinct_prefixes() -> impl Strategy<Value = (String, String)> {
    ("[a-z]{1,3}_", "[a-z]{1,3}_").prop_filter("prefixes must differ", |(a, b)| a != b)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_differently_prefixed_copies_share_nothing((first, second) in distinct_prefixes()) {
        let tmp = TempDir::new().unwrap();
        let mut a = common::prefixed_article(&tmp, &first);
        let mut b = common::prefixed_article(&tmp, &second);

        let ids_a = identifiers(&mut a);
        let ids_b = identifiers(&mut b);
        prop_assert!(!ids_a.is_empty());
        prop_assert_eq!(ids_a.len(), ids_b.len());
        let shared: Vec<&String> = ids_a.intersection(&ids_b).collect();
        prop_assert!(shared.is_empty(), "shared identifiers: {:?}", shared);
    }
}
