//! Pretty-printing serializer for [`Document`].

use super::{Document, Element, Node};
use crate::util::{escape_attr, escape_text};

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const DESIGNMAP_DOCTYPE: &str =
    r#"<?aid style="50" type="document" readerVersion="6.0" featureSet="257" product="7.5(142)" ?>"#;

/// Format-specific instruction emitted after the declaration of `member`.
///
/// Only the designmap carries one.
pub fn doctype_for(member: &str) -> Option<&'static str> {
    let file = member.rsplit('/').next().unwrap_or(member);
    (file == "designmap.xml").then_some(DESIGNMAP_DOCTYPE)
}

/// Serialize a document with the fixed declaration and an optional doctype line.
pub fn write_document(doc: &Document, doctype: Option<&str>) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(DECLARATION);
    out.push('\n');
    if let Some(doctype) = doctype {
        out.push_str(doctype);
        out.push('\n');
    }
    write_element(&mut out, &doc.root, 0);
    out.push('\n');
    out.into_bytes()
}

fn write_element(out: &mut String, elem: &Element, depth: usize) {
    out.push('<');
    out.push_str(&elem.name);
    for (key, value) in &elem.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }

    if elem.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');

    let mixed = elem.children.iter().any(|n| !matches!(n, Node::Element(_)));
    if mixed {
        // Mixed content is written inline so no whitespace leaks into text.
        for child in &elem.children {
            write_node(out, child, depth + 1, false);
        }
    } else {
        for child in &elem.children {
            out.push('\n');
            indent(out, depth + 1);
            write_node(out, child, depth + 1, true);
        }
        out.push('\n');
        indent(out, depth);
    }

    out.push_str("</");
    out.push_str(&elem.name);
    out.push('>');
}

fn write_node(out: &mut String, node: &Node, depth: usize, pretty: bool) {
    match node {
        Node::Element(e) if pretty => write_element(out, e, depth),
        Node::Element(e) => write_inline(out, e),
        Node::Text(t) => out.push_str(&escape_text(t)),
        Node::Instruction(body) => {
            out.push_str("<?");
            out.push_str(body);
            out.push_str("?>");
        }
    }
}

fn write_inline(out: &mut String, elem: &Element) {
    out.push('<');
    out.push_str(&elem.name);
    for (key, value) in &elem.attributes {
        out.push_str(&format!(" {}=\"{}\"", key, escape_attr(value)));
    }
    if elem.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &elem.children {
        write_node(out, child, 0, false);
    }
    out.push_str(&format!("</{}>", elem.name));
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    #[test]
    fn test_doctype_only_for_designmap() {
        assert!(doctype_for("designmap.xml").is_some());
        assert!(doctype_for("Stories/Story_u1.xml").is_none());
        assert!(doctype_for("XML/Tags.xml").is_none());
    }

    #[test]
    fn test_write_declaration_and_doctype() {
        let doc = Document::new(Element::new("Document").with_attr("StoryList", "u1 u2"));
        let text = String::from_utf8(write_document(&doc, doctype_for("designmap.xml"))).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(DECLARATION));
        assert!(lines.next().unwrap().starts_with("<?aid style=\"50\""));
        assert_eq!(lines.next(), Some(r#"<Document StoryList="u1 u2"/>"#));
    }

    #[test]
    fn test_write_then_parse_preserves_tree() {
        let source = br#"<Story Self="u1"><ParagraphStyleRange><CharacterStyleRange><Content>A &lt;b&gt; &amp; c</Content><Br/><Content>Next</Content></CharacterStyleRange></ParagraphStyleRange></Story>"#;
        let doc = parse_document(source).unwrap();
        let written = write_document(&doc, None);
        let reparsed = parse_document(&written).unwrap();
        assert_eq!(doc, reparsed);
    }

    #[test]
    fn test_attribute_whitespace_survives_rewrite() {
        let source = br#"<KeyValuePair Key="Label" Value="line1&#xA;line2&#x9;x&#xD;"/>"#;
        let doc = parse_document(source).unwrap();
        assert_eq!(doc.root.attr("Value"), Some("line1\nline2\tx\r"));

        let written = String::from_utf8(write_document(&doc, None)).unwrap();
        assert!(written.contains(r#"Value="line1&#xA;line2&#x9;x&#xD;""#), "{written}");
        assert_eq!(parse_document(written.as_bytes()).unwrap(), doc);
    }
}
