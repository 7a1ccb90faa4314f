//! Path expressions over the logical structure.
//!
//! A small location-path dialect: `/Root/article[2]/title`, `//figure`,
//! `article[last()]`, `*[@XMLContent='u102']`. Absolute paths start above the
//! root, so their first step names the root tag; relative paths are evaluated
//! from the root. Positional predicates count per parent.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::StructureNode;
use crate::error::{Error, Result};

/// Location of a node as the chain of child indices from the root.
///
/// Ordering is document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// The root node.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of steps below the root.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for i in &self.0 {
            write!(f, "/{i}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    /// `//`: children of the context node or any of its descendants.
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Tag(String),
}

impl NameTest {
    fn matches(&self, node: &StructureNode) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Tag(tag) => node.tag == *tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    /// 1-based position.
    Position(usize),
    Last,
    HasAttr(String),
    AttrEquals(String, String),
}

impl Predicate {
    fn filter<'a>(
        &self,
        candidates: Vec<(NodePath, &'a StructureNode)>,
    ) -> Vec<(NodePath, &'a StructureNode)> {
        match self {
            Predicate::Position(n) => candidates.into_iter().nth(n - 1).into_iter().collect(),
            Predicate::Last => candidates.into_iter().last().into_iter().collect(),
            Predicate::HasAttr(key) => candidates
                .into_iter()
                .filter(|(_, node)| attribute(node, key).is_some())
                .collect(),
            Predicate::AttrEquals(key, value) => candidates
                .into_iter()
                .filter(|(_, node)| attribute(node, key) == Some(value.as_str()))
                .collect(),
        }
    }
}

/// `Self` and `XMLContent` live on dedicated fields but stay addressable.
fn attribute<'a>(node: &'a StructureNode, key: &str) -> Option<&'a str> {
    match key {
        "Self" => node.id.as_ref().map(|id| id.as_str()),
        "XMLContent" => node.content.as_ref().map(|id| id.as_str()),
        _ => node.attr(key),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructurePath {
    absolute: bool,
    steps: Vec<Step>,
}

/// Evaluation context: the virtual node above the root, or a real node.
#[derive(Debug, Clone)]
enum Context {
    Document,
    Node(NodePath),
}

impl StructurePath {
    pub fn parse(expr: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidPath(format!("{expr}: {reason}"));

        let mut rest = expr.trim();
        if rest.is_empty() {
            return Err(invalid("empty expression".to_string()));
        }
        let absolute = rest.starts_with('/');
        let mut axis = Axis::Child;
        if let Some(r) = rest.strip_prefix("//") {
            axis = Axis::Descendant;
            rest = r;
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
        }

        let mut steps = Vec::new();
        loop {
            let (step, r) = parse_step(rest, axis).map_err(invalid)?;
            steps.push(step);
            rest = r;
            if rest.is_empty() {
                break;
            }
            if let Some(r) = rest.strip_prefix("//") {
                axis = Axis::Descendant;
                rest = r;
            } else if let Some(r) = rest.strip_prefix('/') {
                axis = Axis::Child;
                rest = r;
            } else {
                return Err(invalid(format!("unexpected '{rest}'")));
            }
        }

        Ok(Self { absolute, steps })
    }

    /// Every node selected from `root`, in document order, without duplicates.
    pub fn evaluate(&self, root: &StructureNode) -> Vec<NodePath> {
        let mut context = vec![if self.absolute {
            Context::Document
        } else {
            Context::Node(NodePath::root())
        }];

        for step in &self.steps {
            let mut selected = BTreeSet::new();
            for ctx in &context {
                let origins = match step.axis {
                    Axis::Child => vec![ctx.clone()],
                    Axis::Descendant => descendants_or_self(root, ctx),
                };
                for origin in &origins {
                    let mut candidates: Vec<_> = children(root, origin)
                        .into_iter()
                        .filter(|(_, node)| step.test.matches(node))
                        .collect();
                    for predicate in &step.predicates {
                        candidates = predicate.filter(candidates);
                    }
                    selected.extend(candidates.into_iter().map(|(path, _)| path));
                }
            }
            context = selected.into_iter().map(Context::Node).collect();
        }

        context
            .into_iter()
            .filter_map(|ctx| match ctx {
                Context::Node(path) => Some(path),
                Context::Document => None,
            })
            .collect()
    }
}

impl FromStr for StructurePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn node_at<'a>(root: &'a StructureNode, path: &NodePath) -> Option<&'a StructureNode> {
    path.indices()
        .iter()
        .try_fold(root, |node, &i| node.children.get(i))
}

fn children<'a>(root: &'a StructureNode, ctx: &Context) -> Vec<(NodePath, &'a StructureNode)> {
    match ctx {
        Context::Document => vec![(NodePath::root(), root)],
        Context::Node(path) => node_at(root, path)
            .map(|node| {
                node.children
                    .iter()
                    .enumerate()
                    .map(|(i, child)| (path.child(i), child))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn descendants_or_self(root: &StructureNode, ctx: &Context) -> Vec<Context> {
    let mut out = vec![ctx.clone()];
    let mut stack: Vec<NodePath> = children(root, ctx)
        .into_iter()
        .rev()
        .map(|(path, _)| path)
        .collect();
    while let Some(path) = stack.pop() {
        if let Some(node) = node_at(root, &path) {
            stack.extend((0..node.children.len()).rev().map(|i| path.child(i)));
        }
        out.push(Context::Node(path));
    }
    out
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

fn parse_step(input: &str, axis: Axis) -> std::result::Result<(Step, &str), String> {
    let (test, mut rest) = if let Some(r) = input.strip_prefix('*') {
        (NameTest::Any, r)
    } else {
        let end = input
            .find(|c: char| !is_name_char(c))
            .unwrap_or(input.len());
        if end == 0 {
            return Err("expected a tag name".to_string());
        }
        (NameTest::Tag(input[..end].to_string()), &input[end..])
    };

    let mut predicates = Vec::new();
    while let Some(r) = rest.strip_prefix('[') {
        let close = closing_bracket(r).ok_or_else(|| "unterminated predicate".to_string())?;
        predicates.push(parse_predicate(r[..close].trim())?);
        rest = &r[close + 1..];
    }

    Ok((
        Step {
            axis,
            test,
            predicates,
        },
        rest,
    ))
}

/// Byte offset of the `]` closing a predicate, skipping quoted values.
fn closing_bracket(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_predicate(body: &str) -> std::result::Result<Predicate, String> {
    if body == "last()" {
        return Ok(Predicate::Last);
    }
    if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()) {
        return match body.parse::<usize>() {
            Ok(0) | Err(_) => Err(format!("invalid position [{body}]")),
            Ok(n) => Ok(Predicate::Position(n)),
        };
    }
    if let Some(attr) = body.strip_prefix('@') {
        let Some((key, value)) = attr.split_once('=') else {
            let key = attr.trim();
            if key.is_empty() || !key.chars().all(is_name_char) {
                return Err(format!("invalid attribute test [{body}]"));
            }
            return Ok(Predicate::HasAttr(key.to_string()));
        };
        let key = key.trim();
        let value = value.trim();
        let unquoted = value
            .strip_prefix('\'')
            .and_then(|v| v.strip_suffix('\''))
            .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')));
        return match unquoted {
            Some(v) if !key.is_empty() => Ok(Predicate::AttrEquals(key.to_string(), v.to_string())),
            _ => Err(format!("invalid attribute test [{body}]")),
        };
    }
    Err(format!("unsupported predicate [{body}]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Identifier;

    fn node(tag: &str, id: &str, children: Vec<StructureNode>) -> StructureNode {
        StructureNode {
            tag: tag.to_string(),
            id: Some(Identifier::from(id)),
            content: None,
            attributes: vec![("Self".to_string(), id.to_string())],
            children,
        }
    }

    fn tree() -> StructureNode {
        let mut second = node("article", "a2", vec![node("title", "a2t", vec![])]);
        second.content = Some(Identifier::from("u200"));
        node(
            "Root",
            "r",
            vec![
                node(
                    "article",
                    "a1",
                    vec![
                        node("title", "a1t", vec![]),
                        node("figure", "a1f", vec![]),
                    ],
                ),
                second,
                node("figure", "f", vec![]),
            ],
        )
    }

    fn select(expr: &str) -> Vec<String> {
        let root = tree();
        StructurePath::parse(expr)
            .unwrap()
            .evaluate(&root)
            .iter()
            .map(|p| node_at(&root, p).and_then(|n| n.id.clone()).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_absolute_paths() {
        assert_eq!(select("/Root"), ["r"]);
        assert_eq!(select("/Root/article"), ["a1", "a2"]);
        assert_eq!(select("/Root/article/title"), ["a1t", "a2t"]);
        assert!(select("/article").is_empty());
    }

    #[test]
    fn test_positional_predicates_are_per_parent() {
        assert_eq!(select("/Root/article[2]"), ["a2"]);
        assert_eq!(select("/Root/article[last()]"), ["a2"]);
        assert_eq!(select("/Root/article/*[1]"), ["a1t", "a2t"]);
        assert!(select("/Root/article[3]").is_empty());
    }

    #[test]
    fn test_descendant_axis_in_document_order() {
        assert_eq!(select("//figure"), ["a1f", "f"]);
        assert_eq!(select("/Root//title"), ["a1t", "a2t"]);
        assert_eq!(select("//figure[1]"), ["a1f", "f"]);
    }

    #[test]
    fn test_attribute_predicates() {
        assert_eq!(select("//*[@XMLContent='u200']"), ["a2"]);
        assert_eq!(select("//article[@XMLContent]"), ["a2"]);
        assert_eq!(select(r#"/Root/*[@Self="f"]"#), ["f"]);
    }

    #[test]
    fn test_relative_paths_start_at_root() {
        assert_eq!(select("article/title"), ["a1t", "a2t"]);
        assert_eq!(select("figure"), ["f"]);
    }

    #[test]
    fn test_invalid_expressions() {
        for expr in ["", "/", "/Root/", "/Root[0]", "/Root[", "/Root[foo]", "/Root!"] {
            assert!(
                matches!(StructurePath::parse(expr), Err(Error::InvalidPath(_))),
                "{expr:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_node_path_order_and_display() {
        let a = NodePath::from(vec![0]);
        let b = NodePath::from(vec![0, 1]);
        let c = NodePath::from(vec![1]);
        assert!(NodePath::root() < a && a < b && b < c);
        assert_eq!(b.parent(), Some(a));
        assert_eq!(b.to_string(), "/0/1");
        assert_eq!(NodePath::root().to_string(), "/");
    }
}
