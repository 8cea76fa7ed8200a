//! Highest-confidence strategy: resolve inside the workspace itself.
//!
//! Handles local variables and fields via the declaration's enclosing scope
//! on the ancestor chain, then methods in the same file, then class
//! declarations across the owning context and its dependency contexts.

use std::sync::Arc;

use crate::compiler::CompiledUnit;
use crate::resolve::{
    DefinitionStrategy, LocationOrigin, ResolutionOutcome, ResolutionRequest, SourceLocation,
};
use crate::symbols::{Declaration, DeclarationKind};
use crate::syntax::{NodeClass, NodeId};

pub struct WorkspaceStrategy;

impl DefinitionStrategy for WorkspaceStrategy {
    fn name(&self) -> &'static str {
        "workspace"
    }

    fn resolve(&self, request: &ResolutionRequest<'_>) -> ResolutionOutcome {
        let unit = &request.unit;
        let data = unit.tree.node(request.node);
        if !matches!(data.class, NodeClass::Identifier | NodeClass::TypeRef) {
            return ResolutionOutcome::NotApplicable;
        }
        let name = request.name.as_str();

        if let Some(decl) = self.resolve_scoped(unit, request.node, name) {
            return ResolutionOutcome::Found(location_of(&decl));
        }
        if let Some(decl) = unit
            .symbols
            .find(name)
            .iter()
            .find(|d| d.kind == DeclarationKind::Method)
        {
            return ResolutionOutcome::Found(location_of(decl));
        }
        if let Some(decl) = self.resolve_class(request, unit, name) {
            return ResolutionOutcome::Found(location_of(&decl));
        }

        ResolutionOutcome::NotFound {
            reason: format!("'{name}' not declared in the workspace"),
        }
    }
}

impl WorkspaceStrategy {
    /// Variable or field declaration whose enclosing scope also encloses the
    /// use site. The deepest such scope wins; variables must additionally be
    /// declared at or before the use position.
    fn resolve_scoped(
        &self,
        unit: &CompiledUnit,
        use_node: NodeId,
        name: &str,
    ) -> Option<Declaration> {
        let use_ancestors: Vec<NodeId> = unit.graph.ancestors(use_node).collect();
        let use_start = unit
            .tree
            .node(use_node)
            .span
            .is_valid()
            .then(|| crate::position::range_of(&unit.tree.node(use_node).span))
            .flatten()
            .map(|r| r.start);

        let mut best: Option<(usize, Declaration)> = None;
        for decl in unit.symbols.find(name) {
            if !matches!(
                decl.kind,
                DeclarationKind::Variable | DeclarationKind::Field
            ) {
                continue;
            }
            let scope = self.scope_of(unit, decl.node);
            let in_scope = match scope {
                Some(scope) => use_ancestors.contains(&scope),
                // A parentless declaration sits at script level and is
                // visible anywhere in the file.
                None => true,
            };
            if !in_scope {
                continue;
            }
            if decl.kind == DeclarationKind::Variable {
                if let (Some(use_start), Some(range)) = (use_start, decl.range) {
                    if range.start > use_start {
                        continue;
                    }
                }
            }
            let depth = unit.graph.ancestors(decl.node).count();
            if best.as_ref().map(|(d, _)| depth > *d).unwrap_or(true) {
                best = Some((depth, decl.clone()));
            }
        }
        best.map(|(_, decl)| decl)
    }

    /// Nearest enclosing method, class or script wrapper of a declaration.
    fn scope_of(&self, unit: &CompiledUnit, node: NodeId) -> Option<NodeId> {
        unit.graph.ancestors(node).find(|&id| {
            matches!(
                unit.tree.node(id).class,
                NodeClass::MethodDecl | NodeClass::ClassDecl | NodeClass::Script
            )
        })
    }

    /// Class declarations in the current file, then across every file of the
    /// owning context and its dependency contexts.
    fn resolve_class(
        &self,
        request: &ResolutionRequest<'_>,
        unit: &Arc<CompiledUnit>,
        name: &str,
    ) -> Option<Declaration> {
        if let Some(decl) = unit
            .symbols
            .find(name)
            .iter()
            .find(|d| d.kind == DeclarationKind::Class)
        {
            return Some(decl.clone());
        }

        let ctx = request.compiler.get_context_for_file(request.uri)?;
        for member in request.compiler.reachable_members(&ctx) {
            if member == request.uri {
                continue;
            }
            let Some(other) = request.compiler.unit(&member) else {
                continue;
            };
            if let Some(decl) = other
                .symbols
                .find(name)
                .iter()
                .find(|d| d.kind == DeclarationKind::Class)
            {
                return Some(decl.clone());
            }
        }
        None
    }
}

fn location_of(decl: &Declaration) -> SourceLocation {
    SourceLocation {
        uri: decl.uri.clone(),
        symbol_name: decl.name.clone(),
        line: decl.range.map(|r| r.start.line),
        documentation: None,
        origin: LocationOrigin::Workspace,
    }
}
