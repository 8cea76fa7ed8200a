//! Arena-backed syntax tree model and the tree-producer seam.
//!
//! The external parser is a black box behind [`TreeProducer`]: it yields a
//! tree of typed nodes, each optionally carrying a 1-based source span. Nodes
//! have identity semantics via the per-tree [`NodeId`]; two structurally
//! identical declarations are still distinct nodes. The tree itself carries
//! no parent pointers; the indexer builds those.

pub mod producer;

pub use producer::GrammarTreeProducer;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::position::{EditorPosition, TreeSpan};

/// Identity of a node within one [`SyntaxTree`]. Generated per node during
/// parsing; never derived from node contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Coarse classification of a node, derived from the producer's raw kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    /// The script wrapper the producer synthesizes around a source file.
    Script,
    ClassDecl,
    MethodDecl,
    FieldDecl,
    VariableDecl,
    Import,
    Identifier,
    TypeRef,
    Other,
}

#[derive(Debug, Clone)]
pub struct SyntaxNodeData {
    /// Raw grammar kind, e.g. `class_declaration`.
    pub kind: String,
    pub class: NodeClass,
    /// Declared or referenced simple name, where the node has one.
    pub name: Option<String>,
    /// Fully-qualified name for imports.
    pub qualified: Option<String>,
    /// Declaration with more than one target; skipped by the symbol table.
    pub multi_target: bool,
    pub span: TreeSpan,
    pub children: Vec<NodeId>,
}

/// One parsed file: nodes in an arena, a root, and the unit's authoritative
/// class-declaration list (real declarations only, never type references).
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNodeData>,
    root: NodeId,
    classes: Vec<NodeId>,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNodeData {
        &self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Class declarations of the compiled unit, nested classes included, in
    /// declaration order. A script's synthetic wrapper class appears here when
    /// the file has loose top-level statements.
    pub fn classes(&self) -> &[NodeId] {
        &self.classes
    }

    /// The producer's own preorder walker. Reports each node in the subtree
    /// rooted at `from` together with its walk parent (`None` for `from`
    /// itself).
    pub fn walk_from<F>(&self, from: NodeId, f: &mut F)
    where
        F: FnMut(NodeId, Option<NodeId>),
    {
        f(from, None);
        self.walk_children(from, f);
    }

    fn walk_children<F>(&self, parent: NodeId, f: &mut F)
    where
        F: FnMut(NodeId, Option<NodeId>),
    {
        for &child in &self.node(parent).children {
            f(child, Some(parent));
            self.walk_children(child, f);
        }
    }
}

/// Incremental construction of a [`SyntaxTree`]; also used by tests to build
/// synthetic trees without a parser.
pub struct SyntaxTreeBuilder {
    nodes: Vec<SyntaxNodeData>,
    classes: Vec<NodeId>,
}

impl SyntaxTreeBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Append a node; the caller wires it into a parent afterwards.
    pub fn push(&mut self, data: SyntaxNodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0 as usize].children.push(child);
    }

    pub fn mark_class(&mut self, id: NodeId) {
        self.classes.push(id);
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SyntaxNodeData {
        &mut self.nodes[id.0 as usize]
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNodeData {
        &self.nodes[id.0 as usize]
    }

    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes,
            root,
            classes: self.classes,
        }
    }
}

impl Default for SyntaxTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Per-file diagnostic, surfaced as data rather than thrown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub position: EditorPosition,
    pub message: String,
}

/// Result of parsing one file.
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    pub tree: SyntaxTree,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedUnit {
    /// Unit standing in for a file the producer could not parse at all. The
    /// tree holds only a synthetic script root so downstream indexing stays
    /// total.
    pub fn empty(script_name: &str, diagnostics: Vec<Diagnostic>) -> Self {
        let mut builder = SyntaxTreeBuilder::new();
        let root = builder.push(SyntaxNodeData {
            kind: "program".to_string(),
            class: NodeClass::Script,
            name: Some(script_name.to_string()),
            qualified: None,
            multi_target: false,
            span: TreeSpan::SYNTHETIC,
            children: Vec::new(),
        });
        Self {
            tree: builder.finish(root),
            diagnostics,
        }
    }
}

/// The external syntax-tree producer boundary.
pub trait TreeProducer: Send + Sync {
    fn parse(&self, uri: &str, content: &str) -> Result<ParsedUnit>;
}
