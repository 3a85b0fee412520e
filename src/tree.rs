//! The hierarchical data model every backend returns.
//!
//! A [`Node`] is either a scalar [`Leaf`] or a branch of named children.
//! Paths address nodes by child names joined with [`SEPARATOR`]; the empty
//! path is the node itself.
//!
//! Trees are built by folding flat `(path, leaf)` pairs through
//! [`key_values_to_tree`], which is how both the document and the key-value
//! backends assemble their results. [`Node::flatten`] goes the other way.

use std::fmt;
use std::io;

use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};

use crate::error::{ConftreeError, Result};
use crate::visitor::{self, LeafVisitor};

/// Separator between path components.
pub const SEPARATOR: char = '/';

/// A scalar value stored at a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Names a leaf kind, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Text,
    Int,
    Float,
    Bool,
}

impl LeafKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LeafKind::Text => "text",
            LeafKind::Int => "integer",
            LeafKind::Float => "float",
            LeafKind::Bool => "boolean",
        }
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Leaf {
    pub fn kind(&self) -> LeafKind {
        visitor::apply(
            self,
            |_| LeafKind::Text,
            |_| LeafKind::Int,
            |_| LeafKind::Float,
            |_| LeafKind::Bool,
        )
    }
}

struct DisplayLeaf<'a, 'b>(&'a mut fmt::Formatter<'b>);

impl LeafVisitor for DisplayLeaf<'_, '_> {
    type Output = fmt::Result;

    fn visit_text(self, value: &str) -> fmt::Result {
        self.0.write_str(value)
    }

    fn visit_int(self, value: i64) -> fmt::Result {
        write!(self.0, "{value}")
    }

    fn visit_float(self, value: f64) -> fmt::Result {
        write!(self.0, "{value}")
    }

    fn visit_bool(self, value: bool) -> fmt::Result {
        write!(self.0, "{value}")
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.accept(DisplayLeaf(f))
    }
}

impl From<&str> for Leaf {
    fn from(v: &str) -> Self {
        Leaf::Text(v.to_string())
    }
}

impl From<String> for Leaf {
    fn from(v: String) -> Self {
        Leaf::Text(v)
    }
}

impl From<i64> for Leaf {
    fn from(v: i64) -> Self {
        Leaf::Int(v)
    }
}

impl From<f64> for Leaf {
    fn from(v: f64) -> Self {
        Leaf::Float(v)
    }
}

impl From<bool> for Leaf {
    fn from(v: bool) -> Self {
        Leaf::Bool(v)
    }
}

/// Rust types that can be extracted from a leaf of exactly one kind.
pub trait LeafValue: Sized {
    const KIND: LeafKind;

    /// `Some` only when `leaf` holds `Self::KIND`. No numeric widening.
    fn from_leaf(leaf: &Leaf) -> Option<Self>;
}

impl LeafValue for String {
    const KIND: LeafKind = LeafKind::Text;

    fn from_leaf(leaf: &Leaf) -> Option<Self> {
        visitor::apply(leaf, |s| Some(s.to_string()), |_| None, |_| None, |_| None)
    }
}

impl LeafValue for i64 {
    const KIND: LeafKind = LeafKind::Int;

    fn from_leaf(leaf: &Leaf) -> Option<Self> {
        visitor::apply(leaf, |_| None, Some, |_| None, |_| None)
    }
}

impl LeafValue for f64 {
    const KIND: LeafKind = LeafKind::Float;

    fn from_leaf(leaf: &Leaf) -> Option<Self> {
        visitor::apply(leaf, |_| None, |_| None, Some, |_| None)
    }
}

impl LeafValue for bool {
    const KIND: LeafKind = LeafKind::Bool;

    fn from_leaf(leaf: &Leaf) -> Option<Self> {
        visitor::apply(leaf, |_| None, |_| None, |_| None, Some)
    }
}

/// A node of the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(Leaf),
    Branch(IndexMap<String, Node>),
}

impl Default for Node {
    fn default() -> Self {
        Node::Branch(IndexMap::new())
    }
}

impl From<Leaf> for Node {
    fn from(leaf: Leaf) -> Self {
        Node::Leaf(leaf)
    }
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Branch(_) => None,
        }
    }

    pub fn children(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Leaf(_) => None,
            Node::Branch(children) => Some(children),
        }
    }

    /// Typed extraction: `Some` only if this is a leaf of `T`'s kind.
    pub fn get<T: LeafValue>(&self) -> Option<T> {
        self.as_leaf().and_then(T::from_leaf)
    }

    /// Resolve `path` below this node and extract a `T`, distinguishing a
    /// missing node from a leaf of the wrong kind.
    pub fn value_at<T: LeafValue>(&self, path: &str) -> Result<T> {
        let node = get_subtree(self, path)?;
        match node {
            Node::Leaf(leaf) => T::from_leaf(leaf).ok_or_else(|| ConftreeError::TypeMismatch {
                path: path.to_string(),
                expected: T::KIND.as_str(),
                found: leaf.kind().as_str(),
            }),
            Node::Branch(_) => Err(ConftreeError::TypeMismatch {
                path: path.to_string(),
                expected: T::KIND.as_str(),
                found: "subtree",
            }),
        }
    }

    /// Flatten into `(path, leaf)` pairs, depth-first in insertion order.
    /// A scalar root yields a single pair with the empty path.
    pub fn flatten(&self) -> Vec<(String, Leaf)> {
        let mut out = Vec::new();
        flatten_into(self, String::new(), &mut out);
        out
    }
}

fn flatten_into(node: &Node, path: String, out: &mut Vec<(String, Leaf)>) {
    match node {
        Node::Leaf(leaf) => out.push((path, leaf.clone())),
        Node::Branch(children) => {
            for (name, child) in children {
                flatten_into(child, join_path(&path, name), out);
            }
        }
    }
}

/// Split a path into its components. `""` has none; any other path must not
/// contain empty components.
pub fn split_path(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let components: Vec<&str> = path.split(SEPARATOR).collect();
    if components.iter().any(|c| c.is_empty()) {
        return Err(ConftreeError::InvalidPath {
            path: path.to_string(),
            reason: "empty path component".into(),
        });
    }
    Ok(components)
}

/// Join two paths, either of which may be empty.
pub fn join_path(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}{SEPARATOR}{rest}"),
    }
}

/// Walk `path` from `root`. Fails with `NotFound` at the first missing
/// component, including any component below a leaf.
pub fn get_subtree<'a>(root: &'a Node, path: &str) -> Result<&'a Node> {
    let mut node = root;
    for name in split_path(path)? {
        node = match node {
            Node::Branch(children) => children.get(name),
            Node::Leaf(_) => None,
        }
        .ok_or_else(|| ConftreeError::NotFound(path.to_string()))?;
    }
    Ok(node)
}

/// Build a tree from ordered `(path, leaf)` pairs.
///
/// Later pairs overwrite earlier leaves at the same path. A path that needs a
/// node to be both a leaf and a branch is a [`ConftreeError::Construction`].
pub fn key_values_to_tree<I, K>(pairs: I) -> Result<Node>
where
    I: IntoIterator<Item = (K, Leaf)>,
    K: AsRef<str>,
{
    let mut root = Node::default();
    for (path, value) in pairs {
        let path = path.as_ref();
        let components = split_path(path).map_err(|e| ConftreeError::Construction {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        insert(&mut root, &components, 0, value, path)?;
    }
    Ok(root)
}

fn insert(node: &mut Node, components: &[&str], depth: usize, value: Leaf, path: &str) -> Result<()> {
    let Some((name, rest)) = components[depth..].split_first() else {
        return match node {
            Node::Branch(children) if !children.is_empty() => Err(conflict(path, "already has children")),
            _ => {
                *node = Node::Leaf(value);
                Ok(())
            }
        };
    };
    let Node::Branch(children) = node else {
        let at = components[..depth].join(SEPARATOR.to_string().as_str());
        return Err(conflict(&at, "already holds a value"));
    };
    if rest.is_empty() {
        if let Some(Node::Branch(grandchildren)) = children.get(*name)
            && !grandchildren.is_empty()
        {
            return Err(conflict(path, "already has children"));
        }
        children.insert(name.to_string(), Node::Leaf(value));
        return Ok(());
    }
    let child = children.entry(name.to_string()).or_default();
    insert(child, components, depth + 1, value, path)
}

fn conflict(path: &str, reason: &str) -> ConftreeError {
    ConftreeError::Construction {
        path: path.to_string(),
        reason: format!("used as both a value and a subtree ({reason})"),
    }
}

/// Write an indented dump of `node` to `sink`. Diagnostic output only.
pub fn print_tree<W: io::Write>(node: &Node, sink: &mut W) -> io::Result<()> {
    write!(sink, "{node}")
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Leaf(leaf) => writeln!(f, "{leaf}"),
            Node::Branch(children) => write_children(f, children, 0),
        }
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &IndexMap<String, Node>, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    for (name, child) in children {
        match child {
            Node::Leaf(leaf) => writeln!(f, "{indent}{name} = {leaf}")?,
            Node::Branch(grandchildren) => {
                writeln!(f, "{indent}{name}")?;
                write_children(f, grandchildren, depth + 1)?;
            }
        }
    }
    Ok(())
}

struct SerializeLeaf<S>(S);

impl<S: Serializer> LeafVisitor for SerializeLeaf<S> {
    type Output = std::result::Result<S::Ok, S::Error>;

    fn visit_text(self, value: &str) -> Self::Output {
        self.0.serialize_str(value)
    }

    fn visit_int(self, value: i64) -> Self::Output {
        self.0.serialize_i64(value)
    }

    fn visit_float(self, value: f64) -> Self::Output {
        self.0.serialize_f64(value)
    }

    fn visit_bool(self, value: bool) -> Self::Output {
        self.0.serialize_bool(value)
    }
}

impl Serialize for Leaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.accept(SerializeLeaf(serializer))
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Node::Leaf(leaf) => leaf.serialize(serializer),
            Node::Branch(children) => serializer.collect_map(children),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{pairs, sample_tree};

    #[test]
    fn empty_path_is_root() {
        let tree = sample_tree();
        assert_eq!(get_subtree(&tree, "").unwrap(), &tree);
    }

    #[test]
    fn resolves_nested_leaf() {
        let tree = sample_tree();
        let node = get_subtree(&tree, "database/url").unwrap();
        assert_eq!(node.get::<String>(), Some("postgres://db".into()));
    }

    #[test]
    fn missing_component_is_not_found() {
        let tree = sample_tree();
        let err = get_subtree(&tree, "database/missing").unwrap_err();
        assert!(matches!(err, ConftreeError::NotFound(p) if p == "database/missing"));
    }

    #[test]
    fn component_under_leaf_is_not_found() {
        let tree = sample_tree();
        let err = get_subtree(&tree, "host/deeper").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn empty_components_are_invalid() {
        let tree = sample_tree();
        for bad in ["/host", "host/", "database//url"] {
            let err = get_subtree(&tree, bad).unwrap_err();
            assert!(matches!(err, ConftreeError::InvalidPath { .. }), "{bad}");
        }
    }

    #[test]
    fn get_requires_exact_kind() {
        let tree = sample_tree();
        let port = get_subtree(&tree, "port").unwrap();
        assert_eq!(port.get::<i64>(), Some(8080));
        assert_eq!(port.get::<f64>(), None);
        assert_eq!(port.get::<String>(), None);
        let ratio = get_subtree(&tree, "ratio").unwrap();
        assert_eq!(ratio.get::<f64>(), Some(0.75));
        assert_eq!(ratio.get::<i64>(), None);
    }

    #[test]
    fn get_on_branch_is_none() {
        let tree = sample_tree();
        let db = get_subtree(&tree, "database").unwrap();
        assert_eq!(db.get::<String>(), None);
    }

    #[test]
    fn value_at_distinguishes_mismatch_from_absence() {
        let tree = sample_tree();
        assert_eq!(tree.value_at::<bool>("debug").unwrap(), true);
        let err = tree.value_at::<String>("port").unwrap_err();
        assert!(matches!(
            err,
            ConftreeError::TypeMismatch { expected: "text", found: "integer", .. }
        ));
        let err = tree.value_at::<String>("database").unwrap_err();
        assert!(matches!(err, ConftreeError::TypeMismatch { found: "subtree", .. }));
        assert!(tree.value_at::<String>("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn tree_returns_every_pair() {
        let input = pairs();
        let tree = key_values_to_tree(input.clone()).unwrap();
        for (path, leaf) in input {
            assert_eq!(get_subtree(&tree, &path).unwrap().as_leaf(), Some(&leaf));
        }
    }

    #[test]
    fn later_pair_overwrites_leaf() {
        let tree = key_values_to_tree([("a/b", Leaf::from("old")), ("a/b", Leaf::from("new"))]).unwrap();
        assert_eq!(tree.value_at::<String>("a/b").unwrap(), "new");
    }

    #[test]
    fn overwrite_keeps_insertion_position() {
        let tree = key_values_to_tree([
            ("first", Leaf::Int(1)),
            ("second", Leaf::Int(2)),
            ("first", Leaf::Int(3)),
        ])
        .unwrap();
        let names: Vec<_> = tree.children().unwrap().keys().cloned().collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn leaf_then_branch_is_construction_error() {
        let err = key_values_to_tree([("a", Leaf::Int(1)), ("a/b", Leaf::Int(2))]).unwrap_err();
        assert!(matches!(err, ConftreeError::Construction { path, .. } if path == "a"));
    }

    #[test]
    fn nested_conflict_names_full_leaf_path() {
        let err = key_values_to_tree([("a/b/c", Leaf::Int(1)), ("a/b/c/d/e", Leaf::Int(2))])
            .unwrap_err();
        assert!(matches!(err, ConftreeError::Construction { path, .. } if path == "a/b/c"));
    }

    #[test]
    fn branch_then_leaf_is_construction_error() {
        let err = key_values_to_tree([("a/b", Leaf::Int(2)), ("a", Leaf::Int(1))]).unwrap_err();
        assert!(matches!(err, ConftreeError::Construction { path, .. } if path == "a"));
    }

    #[test]
    fn malformed_pair_path_is_construction_error() {
        let err = key_values_to_tree([("a//b", Leaf::Int(1))]).unwrap_err();
        assert!(matches!(err, ConftreeError::Construction { .. }));
    }

    #[test]
    fn empty_path_pair_makes_scalar_root() {
        let tree = key_values_to_tree([("", Leaf::from("only"))]).unwrap();
        assert_eq!(tree.get::<String>(), Some("only".into()));
        let err = key_values_to_tree([("x", Leaf::Int(1)), ("", Leaf::Int(2))]).unwrap_err();
        assert!(matches!(err, ConftreeError::Construction { .. }));
    }

    #[test]
    fn no_pairs_is_empty_branch() {
        let tree = key_values_to_tree(Vec::<(String, Leaf)>::new()).unwrap();
        assert_eq!(tree, Node::default());
        assert!(tree.flatten().is_empty());
    }

    #[test]
    fn flatten_preserves_order_and_values() {
        let input = pairs();
        let tree = key_values_to_tree(input.clone()).unwrap();
        assert_eq!(tree.flatten(), input);
    }

    #[test]
    fn print_tree_indents_by_depth() {
        let tree = key_values_to_tree([
            ("host", Leaf::from("localhost")),
            ("database/url", Leaf::from("pg://")),
            ("database/pool/size", Leaf::Int(5)),
        ])
        .unwrap();
        let mut out = Vec::new();
        print_tree(&tree, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "host = localhost\ndatabase\n  url = pg://\n  pool\n    size = 5\n"
        );
    }

    #[test]
    fn print_scalar_root() {
        let node = Node::Leaf(Leaf::Bool(true));
        assert_eq!(node.to_string(), "true\n");
    }

    #[test]
    fn serializes_as_nested_json() {
        let tree = key_values_to_tree([
            ("name", Leaf::from("svc")),
            ("limits/cpu", Leaf::Float(1.5)),
            ("limits/enabled", Leaf::Bool(false)),
        ])
        .unwrap();
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "svc", "limits": {"cpu": 1.5, "enabled": false}})
        );
    }

    #[test]
    fn join_path_skips_empty_sides() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("a", ""), "a");
        assert_eq!(join_path("a", "b/c"), "a/b/c");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn leaf() -> impl Strategy<Value = Leaf> {
            prop_oneof![
                "[a-z0-9 ]{0,8}".prop_map(Leaf::Text),
                any::<i64>().prop_map(Leaf::Int),
                (-1.0e6f64..1.0e6).prop_map(Leaf::Float),
                any::<bool>().prop_map(Leaf::Bool),
            ]
        }

        proptest! {
            #[test]
            fn pairs_survive_tree_building(
                entries in prop::collection::btree_map("[a-c]{1,2}", (leaf(), leaf()), 0..8)
            ) {
                // "<k>/x" and "<k>/y" never collide with each other structurally.
                let input: Vec<(String, Leaf)> = entries
                    .into_iter()
                    .flat_map(|(k, (x, y))| [(format!("{k}/x"), x), (format!("{k}/y"), y)])
                    .collect();
                let tree = key_values_to_tree(input.clone()).unwrap();
                for (path, leaf) in &input {
                    prop_assert_eq!(get_subtree(&tree, path).unwrap().as_leaf(), Some(leaf));
                }
            }

            #[test]
            fn flatten_is_idempotent(
                entries in prop::collection::btree_map("[a-z]{1,3}", leaf(), 0..10)
            ) {
                let once = key_values_to_tree(entries).unwrap().flatten();
                let twice = key_values_to_tree(once.clone()).unwrap().flatten();
                prop_assert_eq!(once, twice);
            }
        }
    }
}
