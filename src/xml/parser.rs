//! quick-xml event stream to owned [`Document`].

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use super::{Document, Element, Node};
use crate::error::{Error, Result};
use crate::util::{decode_text, extract_xml_encoding};

/// Elements whose whitespace-only text is significant.
const TEXT_ELEMENTS: &[&str] = &["Content", "Contents"];

/// Parse member bytes into a document tree.
///
/// Whitespace-only text between elements is dropped (it is regenerated on
/// output) except inside text-bearing elements such as `Content`.
pub fn parse_document(bytes: &[u8]) -> Result<Document> {
    let content = decode_text(bytes, extract_xml_encoding(bytes));
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(start_element(&e)?);
            }
            Ok(Event::Empty(e)) => {
                let elem = start_element(&e)?;
                attach(&mut stack, &mut root, elem);
            }
            Ok(Event::End(_)) => {
                let elem = stack.pop().ok_or_else(|| malformed("unbalanced end tag"))?;
                attach(&mut stack, &mut root, elem);
            }
            Ok(Event::Text(e)) => {
                push_text(&mut stack, &String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::CData(e)) => {
                push_text(&mut stack, &String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                let resolved = resolve_entity(&entity)
                    .ok_or_else(|| malformed(&format!("unknown entity &{entity};")))?;
                push_text(&mut stack, &resolved);
            }
            Ok(Event::PI(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let body = String::from_utf8_lossy(e.as_ref()).into_owned();
                    parent.children.push(Node::Instruction(body));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(malformed("unclosed element at end of input"));
    }

    let mut root = root.ok_or_else(|| malformed("no root element"))?;
    drop_insignificant_whitespace(&mut root);
    Ok(Document { root })
}

fn start_element(e: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8(e.name().as_ref().to_vec())?;
    let mut elem = Element::new(name);
    for attr in e.attributes().flatten() {
        let key = String::from_utf8(attr.key.as_ref().to_vec())?;
        let raw = String::from_utf8(attr.value.to_vec())?;
        let value = unescape(&raw)
            .map_err(|err| malformed(&format!("attribute {key}: {err}")))?
            .into_owned();
        elem.attributes.push((key, value));
    }
    Ok(elem)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, elem: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(elem)),
        None => *root = Some(elem),
    }
}

fn push_text(stack: &mut [Element], text: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    // Entity references arrive as separate events; merge them into the run.
    if let Some(Node::Text(prev)) = parent.children.last_mut() {
        prev.push_str(text);
    } else {
        parent.children.push(Node::Text(text.to_string()));
    }
}

fn drop_insignificant_whitespace(elem: &mut Element) {
    if !TEXT_ELEMENTS.contains(&elem.name.as_str()) {
        elem.children
            .retain(|n| !matches!(n, Node::Text(t) if t.trim().is_empty()));
    }
    for child in elem.child_elements_mut() {
        drop_insignificant_whitespace(child);
    }
}

fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}

fn malformed(reason: &str) -> Error {
    Error::MalformedXml {
        member: String::new(),
        reason: reason.to_string(),
    }
}
