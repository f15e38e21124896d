//! DOT graph documents: loading, node attribute access and serialization.
//!
//! Parsing and printing are delegated to `graphviz-rust`. This module adds a
//! node-centric view on top of the statement tree: nodes are addressed by
//! their unquoted name, and attribute writes land on the node's first
//! statement so the document keeps its original shape.

use graphviz_rust::dot_structures::{
    Attribute, Edge, EdgeTy, Graph, Id, Node, NodeId, Stmt, Subgraph, Vertex,
};
use graphviz_rust::printer::{DotPrinter, PrinterContext};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse DOT: {0}")]
    Parse(String),
}

/// Keywords that must be quoted when used as an ID.
const DOT_KEYWORDS: &[&str] = &["node", "edge", "graph", "digraph", "subgraph", "strict"];

/// A parsed DOT document.
#[derive(Debug, Clone)]
pub struct DotDocument {
    graph: Graph,
}

impl DotDocument {
    /// Parse DOT source text.
    ///
    /// String concatenation (`label="a" + "b"`) is not supported by the
    /// parser; such files fail with a parse error even though Graphviz
    /// accepts them.
    pub fn parse(source: &str) -> Result<Self, GraphError> {
        let graph = graphviz_rust::parse(source).map_err(GraphError::Parse)?;
        Ok(Self { graph })
    }

    /// Read and parse a DOT file.
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let source = fs::read_to_string(path).map_err(|source| GraphError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    /// Serialize the document back to DOT text.
    pub fn to_dot(&self) -> String {
        let mut ctx = PrinterContext::default();
        let mut out = self.graph.print(&mut ctx);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    /// Write the serialized document to `path`.
    pub fn save(&self, path: &Path) -> Result<(), GraphError> {
        fs::write(path, self.to_dot()).map_err(|source| GraphError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Names of all nodes in first-appearance order.
    ///
    /// Nodes that only appear in edge statements are included, as are nodes
    /// declared inside subgraphs.
    pub fn node_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        collect_names(self.stmts(), &mut names, &mut seen);
        names
    }

    /// Effective attributes of a node, unquoted, in declaration order.
    ///
    /// When a node is declared more than once, later statements override the
    /// values of earlier ones.
    pub fn attributes(&self, name: &str) -> Vec<(String, String)> {
        let mut attrs: Vec<(String, String)> = Vec::new();
        collect_attributes(self.stmts(), name, &mut attrs);
        attrs
    }

    /// A single attribute value, unquoted.
    pub fn attribute(&self, name: &str, key: &str) -> Option<String> {
        self.attributes(name)
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set an attribute, quoting the value only when DOT requires it.
    pub fn set_attribute(&mut self, name: &str, key: &str, value: &str) {
        self.put_attribute(name, key, dot_id(value));
    }

    /// Set an attribute whose value is always written as a quoted string.
    ///
    /// The printer emits IDs as-is, so URL-like values must be quoted here.
    pub fn set_quoted_attribute(&mut self, name: &str, key: &str, value: &str) {
        self.put_attribute(name, key, quoted_id(value));
    }

    fn put_attribute(&mut self, name: &str, key: &str, value: Id) {
        let attr = Attribute(Id::Plain(key.to_string()), value);
        let mut placed = false;
        let stmts = self.stmts_mut();
        put_in(stmts, name, &attr, &mut placed);
        if !placed {
            // Edge-only node: give it a statement of its own.
            stmts.push(Stmt::Node(Node {
                id: NodeId(dot_id(name), None),
                attributes: vec![attr],
            }));
        }
    }

    fn stmts(&self) -> &Vec<Stmt> {
        match &self.graph {
            Graph::Graph { stmts, .. } | Graph::DiGraph { stmts, .. } => stmts,
        }
    }

    fn stmts_mut(&mut self) -> &mut Vec<Stmt> {
        match &mut self.graph {
            Graph::Graph { stmts, .. } | Graph::DiGraph { stmts, .. } => stmts,
        }
    }
}

/// Strip DOT quoting from an ID.
pub fn unquote(id: &Id) -> String {
    match id {
        Id::Escaped(s) => {
            let inner = s
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(s);
            inner.replace("\\\"", "\"")
        }
        Id::Html(s) | Id::Plain(s) | Id::Anonymous(s) => s.clone(),
    }
}

/// Build an ID for `value`, leaving plain identifiers and numerals bare.
pub fn dot_id(value: &str) -> Id {
    if is_plain_id(value) {
        Id::Plain(value.to_string())
    } else {
        quoted_id(value)
    }
}

/// Build a double-quoted ID, escaping embedded quotes.
pub fn quoted_id(value: &str) -> Id {
    Id::Escaped(format!("\"{}\"", value.replace('"', "\\\"")))
}

fn is_plain_id(value: &str) -> bool {
    if value.is_empty() || DOT_KEYWORDS.contains(&value.to_lowercase().as_str()) {
        return false;
    }
    let mut chars = value.chars();
    let first = chars.next().unwrap_or('0');
    let identifier = (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    identifier || is_numeral(value)
}

fn is_numeral(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (digits, None),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    match frac {
        None => !whole.is_empty() && all_digits(whole),
        Some(f) => (!whole.is_empty() || !f.is_empty()) && all_digits(whole) && all_digits(f),
    }
}

fn node_name(node_id: &NodeId) -> String {
    unquote(&node_id.0)
}

fn edge_vertices(edge: &Edge) -> Vec<&Vertex> {
    match &edge.ty {
        EdgeTy::Pair(a, b) => vec![a, b],
        EdgeTy::Chain(vs) => vs.iter().collect(),
    }
}

fn edge_subgraphs_mut(edge: &mut Edge) -> Vec<&mut Subgraph> {
    let vertices: Vec<&mut Vertex> = match &mut edge.ty {
        EdgeTy::Pair(a, b) => vec![a, b],
        EdgeTy::Chain(vs) => vs.iter_mut().collect(),
    };
    vertices
        .into_iter()
        .filter_map(|v| match v {
            Vertex::S(sg) => Some(sg),
            Vertex::N(_) => None,
        })
        .collect()
}

fn collect_names(stmts: &[Stmt], names: &mut Vec<String>, seen: &mut HashSet<String>) {
    for stmt in stmts {
        match stmt {
            Stmt::Node(node) => push_name(node_name(&node.id), names, seen),
            Stmt::Edge(edge) => {
                for vertex in edge_vertices(edge) {
                    match vertex {
                        Vertex::N(id) => push_name(node_name(id), names, seen),
                        Vertex::S(sg) => collect_names(&sg.stmts, names, seen),
                    }
                }
            }
            Stmt::Subgraph(sg) => collect_names(&sg.stmts, names, seen),
            Stmt::Attribute(_) | Stmt::GAttribute(_) => {}
        }
    }
}

fn push_name(name: String, names: &mut Vec<String>, seen: &mut HashSet<String>) {
    if seen.insert(name.clone()) {
        names.push(name);
    }
}

fn collect_attributes(stmts: &[Stmt], name: &str, attrs: &mut Vec<(String, String)>) {
    for stmt in stmts {
        match stmt {
            Stmt::Node(node) if node_name(&node.id) == name => {
                for Attribute(k, v) in &node.attributes {
                    let (key, value) = (unquote(k), unquote(v));
                    match attrs.iter_mut().find(|(existing, _)| *existing == key) {
                        Some(slot) => slot.1 = value,
                        None => attrs.push((key, value)),
                    }
                }
            }
            Stmt::Edge(edge) => {
                for vertex in edge_vertices(edge) {
                    if let Vertex::S(sg) = vertex {
                        collect_attributes(&sg.stmts, name, attrs);
                    }
                }
            }
            Stmt::Subgraph(sg) => collect_attributes(&sg.stmts, name, attrs),
            _ => {}
        }
    }
}

/// Write `attr` onto the first statement declaring `name`; drop the same key
/// from every later statement so the new value is the effective one.
fn put_in(stmts: &mut [Stmt], name: &str, attr: &Attribute, placed: &mut bool) {
    let key = unquote(&attr.0);
    for stmt in stmts.iter_mut() {
        match stmt {
            Stmt::Node(node) if node_name(&node.id) == name => {
                if *placed {
                    node.attributes.retain(|a| unquote(&a.0) != key);
                    continue;
                }
                match node.attributes.iter().position(|a| unquote(&a.0) == key) {
                    Some(first) => {
                        node.attributes[first] = attr.clone();
                        let mut index = 0;
                        node.attributes.retain(|a| {
                            let keep = index <= first || unquote(&a.0) != key;
                            index += 1;
                            keep
                        });
                    }
                    None => node.attributes.push(attr.clone()),
                }
                *placed = true;
            }
            Stmt::Edge(edge) => {
                for sg in edge_subgraphs_mut(edge) {
                    put_in(&mut sg.stmts, name, attr, placed);
                }
            }
            Stmt::Subgraph(sg) => put_in(&mut sg.stmts, name, attr, placed),
            _ => {}
        }
    }
}
