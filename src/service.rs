//! Query facade wiring the compilation service, the resolution pipeline and
//! source navigation together. Collaborators (transport, lint, REPL) consume
//! these queries and contain no resolution logic of their own.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::SourceCache;
use crate::compiler::{CompiledUnit, WorkspaceCompiler};
use crate::config::NavConfig;
use crate::error::{NavError, Result};
use crate::graph::visitor::visitor_for;
use crate::nav::SourceNavigator;
use crate::position::{EditorPosition, Range};
use crate::resolve::{
    ClasspathStrategy, LocationOrigin, ResolutionPipeline, ResolutionRequest, SourceLocation,
    WorkspaceStrategy,
};
use crate::symbols::{Declaration, DeclarationKind};
use crate::syntax::{Diagnostic, GrammarTreeProducer, NodeId, Severity, TreeProducer};

/// Handle to a node found at a position; stable for the lifetime of the
/// file's current snapshot.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    pub uri: String,
    pub node: NodeId,
    pub kind: String,
    pub name: Option<String>,
    pub range: Option<Range>,
}

pub struct NavigationService {
    compiler: Arc<WorkspaceCompiler>,
    pipeline: ResolutionPipeline,
}

impl NavigationService {
    pub fn new(config: NavConfig) -> anyhow::Result<Self> {
        let cache_dir = config.effective_cache_dir()?;
        let cache = Arc::new(SourceCache::new(cache_dir, config.cache_capacity)?);
        let producer: Arc<dyn TreeProducer> = Arc::new(GrammarTreeProducer::groovy());
        Ok(Self::with_components(producer, config, cache))
    }

    /// Construction seam used by tests to inject a synthetic producer or an
    /// isolated temporary cache.
    pub fn with_components(
        producer: Arc<dyn TreeProducer>,
        config: NavConfig,
        cache: Arc<SourceCache>,
    ) -> Self {
        let visitor = Arc::from(visitor_for(config.traversal));
        let navigator = Arc::new(SourceNavigator::new(
            cache,
            Duration::from_millis(config.navigation_deadline_ms),
        ));
        let compiler = Arc::new(WorkspaceCompiler::new(producer, visitor, config));
        let pipeline = ResolutionPipeline::new(vec![
            Box::new(WorkspaceStrategy),
            Box::new(ClasspathStrategy::new(navigator)),
        ]);
        Self { compiler, pipeline }
    }

    pub fn compiler(&self) -> &Arc<WorkspaceCompiler> {
        &self.compiler
    }

    pub fn initialize_workspace(&self, root: &Path) -> Result<()> {
        self.compiler.initialize_workspace(root)
    }

    pub fn update_file(&self, uri: &str, content: &str) -> Result<()> {
        self.compiler.update_file(uri, content)
    }

    pub fn get_context_for_file(&self, uri: &str) -> Option<String> {
        self.compiler.get_context_for_file(uri)
    }

    pub fn diagnostics(&self, uri: &str) -> Vec<Diagnostic> {
        self.compiler.diagnostics(uri)
    }

    /// Smallest indexed node containing the position, or `None` when the
    /// file is unknown or the position lies outside every node (for example
    /// past the last line).
    pub fn node_at(&self, uri: &str, position: EditorPosition) -> Option<NodeHandle> {
        let unit = self.compiler.unit(uri)?;
        let node = unit.graph.node_at(&unit.tree, position)?;
        let data = unit.tree.node(node);
        Some(NodeHandle {
            uri: uri.to_string(),
            node,
            kind: data.kind.clone(),
            name: data.name.clone(),
            range: crate::position::range_of(&data.span),
        })
    }

    /// Definition of the symbol at the position. With `strict`, binary-only
    /// results are suppressed: a strict caller wants openable source.
    ///
    /// The whole resolution runs against the snapshot the node was found in,
    /// so a concurrent republish of the file cannot invalidate the node id
    /// mid-query.
    pub fn resolve_definition(
        &self,
        uri: &str,
        position: EditorPosition,
        strict: bool,
    ) -> Option<SourceLocation> {
        let unit = self.compiler.unit(uri)?;
        let node = unit.graph.node_at(&unit.tree, position)?;
        let name = unit.tree.node(node).name.clone()?;
        let qualified = qualified_from_imports(&unit, &name);
        debug!(uri, name = name.as_str(), ?qualified, "resolving definition");

        let request = ResolutionRequest {
            uri,
            node,
            name,
            qualified,
            unit,
            compiler: &self.compiler,
            cancel: self.compiler.cancellation_token(),
        };
        let location = self.pipeline.resolve(&request)?;
        if strict && location.origin == LocationOrigin::Binary {
            return None;
        }
        Some(location)
    }

    /// Why `node_at` had nothing for this position: a syntax error in the
    /// file, coordinates past the file's indexed extent, or simply no node
    /// there. Used by callers that owe their user an error value rather than
    /// an empty result.
    pub fn position_miss(&self, uri: &str, position: EditorPosition) -> NavError {
        let Some(unit) = self.compiler.unit(uri) else {
            return NavError::NodeNotFound {
                line: position.line,
                character: position.character,
            };
        };
        if let Some(d) = unit
            .diagnostics
            .iter()
            .find(|d| d.severity == Severity::Error)
        {
            return NavError::Syntax {
                line: d.position.line,
                column: d.position.character,
                reason: d.message.clone(),
            };
        }
        let last_line = unit
            .graph
            .nodes()
            .iter()
            .map(|&id| unit.tree.node(id).span.end_line)
            .max()
            .unwrap_or(0);
        if position.line as i64 + 1 > last_line as i64 {
            return NavError::InvalidPosition {
                line: position.line as i64,
                character: position.character as i64,
            };
        }
        NavError::NodeNotFound {
            line: position.line,
            character: position.character,
        }
    }

    /// Declarations across the workspace whose name starts with `prefix`.
    pub fn symbols_matching(&self, prefix: &str) -> Vec<Declaration> {
        let mut out = Vec::new();
        for unit in self.compiler.units() {
            out.extend(unit.symbols.matching(prefix).cloned());
        }
        out.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.uri.cmp(&b.uri)));
        out
    }
}

/// Fully-qualified form supplied by an import in the same unit, if any.
fn qualified_from_imports(unit: &CompiledUnit, name: &str) -> Option<String> {
    unit.symbols
        .find(name)
        .iter()
        .find(|d| d.kind == DeclarationKind::Import)
        .and_then(|d| d.qualified.clone())
}
