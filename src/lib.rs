//! groovy-nav - Navigational core for a Groovy language-intelligence backend.
//!
//! Answers node-at-position, resolve-definition and symbol-lookup queries
//! over a multi-file Groovy workspace, including definitions that live in
//! dependency jars or the host runtime's class library.

pub mod cache;
pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;
pub mod nav;
pub mod position;
pub mod resolve;
pub mod service;
pub mod symbols;
pub mod syntax;

#[cfg(test)]
pub mod tests;

// Re-export common types
pub use compiler::{CompilationContext, FileState, WorkspaceCompiler};
pub use config::NavConfig;
pub use error::{NavError, Result};
pub use position::{EditorPosition, Range, TreePosition, TreeSpan};
pub use resolve::{LocationOrigin, SourceLocation};
pub use service::{NavigationService, NodeHandle};
pub use symbols::{Declaration, DeclarationKind, SymbolTable};
pub use syntax::{NodeClass, NodeId, SyntaxTree, TreeProducer};
