//! Definition resolution pipeline.
//!
//! A definition query runs an ordered chain of strategies, highest
//! confidence and cheapest first. Each strategy returns one of three
//! outcomes: `Found` wins and stops the chain; `NotFound` and
//! `NotApplicable` both fall through — "this strategy had nothing to say"
//! and "this strategy looked and missed" are distinct outcomes but neither
//! short-circuits. Unresolved input is a normal result modeled as data, so
//! strategies never error on it.

pub mod classpath;
pub mod workspace;

pub use classpath::ClasspathStrategy;
pub use workspace::WorkspaceStrategy;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::compiler::{CompiledUnit, WorkspaceCompiler};
use crate::syntax::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationOrigin {
    /// Definition inside the workspace itself.
    Workspace,
    /// Extracted from the runtime's bundled source archive.
    ExtractedRuntime,
    /// Extracted from a dependency's companion source archive.
    ExtractedDependency,
    /// Binary hit with no source available; uri is still an openable local
    /// file so the result is distinguishable from not-found without being a
    /// dead link.
    Binary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub uri: String,
    pub symbol_name: String,
    /// 0-based editor line of the declaration, when known.
    pub line: Option<u32>,
    pub documentation: Option<String>,
    pub origin: LocationOrigin,
}

#[derive(Debug, Clone)]
pub enum ResolutionOutcome {
    Found(SourceLocation),
    NotFound { reason: String },
    NotApplicable,
}

pub struct ResolutionRequest<'a> {
    pub uri: &'a str,
    pub node: NodeId,
    /// Simple name under resolution.
    pub name: String,
    /// Fully-qualified form when an import in the file supplies one.
    pub qualified: Option<String>,
    /// The snapshot `node` belongs to. Strategies read node data from here;
    /// re-fetching the file's current unit would race a concurrent republish
    /// and leave `node` pointing into a different tree.
    pub unit: Arc<CompiledUnit>,
    pub compiler: &'a WorkspaceCompiler,
    pub cancel: CancellationToken,
}

pub trait DefinitionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, request: &ResolutionRequest<'_>) -> ResolutionOutcome;
}

/// Plain fold over the strategy chain.
pub struct ResolutionPipeline {
    strategies: Vec<Box<dyn DefinitionStrategy>>,
}

impl ResolutionPipeline {
    pub fn new(strategies: Vec<Box<dyn DefinitionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn resolve(&self, request: &ResolutionRequest<'_>) -> Option<SourceLocation> {
        for strategy in &self.strategies {
            match strategy.resolve(request) {
                ResolutionOutcome::Found(location) => {
                    debug!(
                        strategy = strategy.name(),
                        name = request.name.as_str(),
                        uri = location.uri.as_str(),
                        "definition resolved"
                    );
                    return Some(location);
                }
                ResolutionOutcome::NotFound { reason } => {
                    debug!(
                        strategy = strategy.name(),
                        name = request.name.as_str(),
                        reason = reason.as_str(),
                        "strategy missed"
                    );
                }
                ResolutionOutcome::NotApplicable => {}
            }
        }
        None
    }
}
