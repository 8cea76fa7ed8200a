//! Per-file declaration registry.
//!
//! One table exists per compiled file and is owned by that file's
//! `CompiledUnit`, so table and node graph are published and destroyed
//! together. Insertion performs no uniqueness validation: several
//! declarations may legitimately share a name across scopes, and
//! disambiguation is entirely the resolver's job using position and
//! enclosing-scope data from the node graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::position::Range;
use crate::syntax::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Class,
    Method,
    Field,
    Variable,
    Import,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub uri: String,
    pub node: NodeId,
    /// Editor-coordinate range of the declaring node; `None` for synthetic
    /// declarations such as a script's wrapper class.
    pub range: Option<Range>,
    /// Fully-qualified target, currently populated for imports only.
    pub qualified: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    by_name: HashMap<String, Vec<Declaration>>,
    count: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_declaration(&mut self, decl: Declaration) {
        self.count += 1;
        self.by_name.entry(decl.name.clone()).or_default().push(decl);
    }

    /// Every declaration registered under `name`, in insertion order.
    pub fn find(&self, name: &str) -> &[Declaration] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn matching<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a Declaration> {
        let prefix = prefix.to_string();
        self.by_name
            .iter()
            .filter(move |(name, _)| name.starts_with(&prefix))
            .flat_map(|(_, decls)| decls.iter())
    }

    pub fn all(&self) -> impl Iterator<Item = &Declaration> {
        self.by_name.values().flat_map(|d| d.iter())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
