//! Queryable shadow graph over a compiled file's syntax tree.
//!
//! The producer's tree has no parent pointers, so one indexing traversal
//! builds them here, along with the ordered list of indexed nodes and the
//! file's class-declaration list. Everything is keyed by [`NodeId`] identity;
//! structural equality is never used, since two distinct declarations can be
//! structurally identical.

pub mod visitor;

pub use visitor::{IndexingVisitor, ProducerWalkVisitor, RecursiveDescentVisitor, TraversalStrategy};

use rustc_hash::FxHashMap;

use crate::position::{contains_position, span_measure, EditorPosition};
use crate::syntax::{NodeId, SyntaxTree};

#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    parents: FxHashMap<NodeId, NodeId>,
    indexed: Vec<NodeId>,
    classes: Vec<NodeId>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: NodeId) {
        self.indexed.push(id);
    }

    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.parents.insert(child, parent);
    }

    pub fn record_class(&mut self, id: NodeId) {
        self.classes.push(id);
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    /// Indexed nodes in traversal order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.indexed
    }

    /// Class declarations of the file, nested classes included.
    pub fn classes(&self) -> &[NodeId] {
        &self.classes
    }

    pub fn parent_map(&self) -> &FxHashMap<NodeId, NodeId> {
        &self.parents
    }

    /// Ancestors of `id` from the immediate parent outwards.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            current: Some(id),
        }
    }

    /// Smallest indexed node whose span contains the editor position.
    ///
    /// Ties on the span measure go to the node visited later, which under
    /// preorder traversal is the deeper of the two.
    pub fn node_at(&self, tree: &SyntaxTree, pos: EditorPosition) -> Option<NodeId> {
        let mut best: Option<(NodeId, i64)> = None;
        for &id in &self.indexed {
            let span = &tree.node(id).span;
            if !contains_position(span, pos) {
                continue;
            }
            let measure = span_measure(span);
            match best {
                Some((_, best_measure)) if measure > best_measure => {}
                _ => best = Some((id, measure)),
            }
        }
        best.map(|(id, _)| id)
    }
}

pub struct Ancestors<'a> {
    graph: &'a NodeGraph,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let parent = self.graph.parent_of(self.current?);
        self.current = parent;
        parent
    }
}
