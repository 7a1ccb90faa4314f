//! Appending pages from other packages.

mod common;

use galley::{Error, Face, Identifier, Package, PageRequest};
use rust_decimal::Decimal;
use tempfile::TempDir;

fn faces(pkg: &mut Package) -> Vec<(String, Face)> {
    pkg.pages()
        .unwrap()
        .iter()
        .map(|p| (p.spread.clone(), p.face()))
        .collect()
}

#[test]
fn test_page_after_recto_starts_a_spread() {
    let tmp = TempDir::new().unwrap();
    let mut layout = common::package(&tmp, "layout");
    let mut article = common::prefixed_article(&tmp, "a_");

    layout
        .add_page(&mut article, 1, "/Root/article[2]", "/Root/module")
        .unwrap();

    assert_eq!(
        layout.spread_names().unwrap(),
        ["Spreads/Spread_ub6.xml", "Spreads/Spread_ub7.xml"]
    );
    assert_eq!(
        faces(&mut layout),
        [
            ("Spreads/Spread_ub6.xml".to_string(), Face::Recto),
            ("Spreads/Spread_ub7.xml".to_string(), Face::Verso),
        ]
    );

    let spread = layout.spread("Spreads/Spread_ub7.xml").unwrap();
    assert_eq!(spread.node().unwrap().attr("Self"), Some("ub7"));
    let page = &spread.pages().unwrap()[0];
    assert_eq!(page.id, Some(Identifier::from("a_uc1")));
    assert_eq!(page.geometry.transform.tx(), Decimal::from(-612));

    // The page's items moved to the verso with it.
    let items = spread.items().unwrap();
    assert_eq!(items.len(), 2);
    for item in &items {
        assert_eq!(item.attr("ItemTransform"), Some("1 0 0 1 -612 0"));
    }
    assert_eq!(spread.page_items(page).unwrap().len(), 2);
}

#[test]
fn test_page_after_verso_fills_the_recto() {
    let tmp = TempDir::new().unwrap();
    let mut layout = common::package(&tmp, "layout");
    let mut first = common::prefixed_article(&tmp, "a_");
    let mut second = common::prefixed_article(&tmp, "b_");
    let mut third = common::prefixed_article(&tmp, "c_");

    layout
        .add_pages([
            PageRequest {
                source: &mut first,
                page_number: 1,
                at: "/Root/article[1]".to_string(),
                only: "/Root/module".to_string(),
            },
            PageRequest {
                source: &mut second,
                page_number: 1,
                at: "/Root/article[2]".to_string(),
                only: "/Root/module".to_string(),
            },
            PageRequest {
                source: &mut third,
                page_number: 1,
                at: "/Root/article[2]".to_string(),
                only: "/Root/module".to_string(),
            },
        ])
        .unwrap();

    let faces = faces(&mut layout);
    let expected = [
        ("Spreads/Spread_ub6.xml", Face::Recto),
        ("Spreads/Spread_ub7.xml", Face::Verso),
        ("Spreads/Spread_ub7.xml", Face::Recto),
        ("Spreads/Spread_ub8.xml", Face::Verso),
    ];
    assert_eq!(faces.len(), expected.len());
    for ((spread, face), (want_spread, want_face)) in faces.iter().zip(expected) {
        assert_eq!(spread, want_spread);
        assert_eq!(*face, want_face);
    }

    // The recto page was already in place; its items did not move.
    let spread = layout.spread("Spreads/Spread_ub7.xml").unwrap();
    let recto_item = spread
        .items()
        .unwrap()
        .into_iter()
        .find(|i| i.attr("Self") == Some("b_uf1"))
        .unwrap();
    assert_eq!(recto_item.attr("ItemTransform"), Some("1 0 0 1 0 0"));

    let second_slot = layout.structure().unwrap().select_node("/Root/article[2]").unwrap();
    assert_eq!(second_slot.children.len(), 2);
}

#[test]
fn test_page_out_of_range() {
    let tmp = TempDir::new().unwrap();
    let mut layout = common::package(&tmp, "layout");
    let mut article = common::prefixed_article(&tmp, "a_");

    for page in [0, 2] {
        assert!(matches!(
            layout.add_page(&mut article, page, "/Root/article[1]", "/Root/module"),
            Err(Error::PageOutOfRange { requested, available: 1 }) if requested == page
        ));
    }
    assert_eq!(layout.spread_names().unwrap().len(), 1);
}
