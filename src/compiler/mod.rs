//! Workspace compilation service.
//!
//! Owns the multi-file compilation state: named compilation contexts with
//! source roots, classpaths and acyclic `depends_on` edges, plus one
//! immutable [`CompiledUnit`] per file. Units are published atomically into
//! a concurrent registry, so position queries and resolution always read the
//! last fully-published snapshot while a recompilation is in flight.
//! Compilation of files within one context is serialized under that
//! context's write lock; independent contexts compile in parallel.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{NavConfig, RuntimeDescriptor};
use crate::error::{NavError, Result};
use crate::graph::{IndexingVisitor, NodeGraph};
use crate::symbols::SymbolTable;
use crate::syntax::{Diagnostic, ParsedUnit, Severity, SyntaxTree, TreeProducer};

/// Per-file compilation lifecycle. Files the service has never seen simply
/// have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Compiling,
    Compiled { with_errors: bool },
    Stale,
}

#[derive(Debug, Clone)]
pub enum ClasspathEntry {
    /// Directory of compiled classes.
    Dir(PathBuf),
    /// Jar archive.
    Jar(PathBuf),
    /// The host runtime's class library.
    Runtime(RuntimeDescriptor),
}

#[derive(Debug, Clone)]
pub struct CompilationContext {
    pub name: String,
    pub source_dirs: Vec<PathBuf>,
    pub classpath: Vec<ClasspathEntry>,
    pub depends_on: Vec<String>,
}

/// Everything produced by compiling one file. Tree, node graph and symbol
/// table live and die together: replacing the `Arc` in the registry swaps
/// them as one unit.
pub struct CompiledUnit {
    pub uri: String,
    pub tree: SyntaxTree,
    pub graph: NodeGraph,
    pub symbols: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct WorkspaceCompiler {
    producer: Arc<dyn TreeProducer>,
    visitor: Arc<dyn IndexingVisitor>,
    config: NavConfig,
    contexts: RwLock<Vec<Arc<CompilationContext>>>,
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
    members: DashMap<String, Vec<String>>,
    files: DashMap<String, Arc<CompiledUnit>>,
    states: DashMap<String, FileState>,
    cancel: CancellationToken,
}

pub const SYNTHETIC_CONTEXT: &str = "workspace";

impl WorkspaceCompiler {
    pub fn new(
        producer: Arc<dyn TreeProducer>,
        visitor: Arc<dyn IndexingVisitor>,
        config: NavConfig,
    ) -> Self {
        Self {
            producer,
            visitor,
            config,
            contexts: RwLock::new(Vec::new()),
            locks: RwLock::new(HashMap::new()),
            members: DashMap::new(),
            files: DashMap::new(),
            states: DashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Token checked between files during workspace-wide rebuilds and before
    /// unbounded-latency resolution steps.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Discover contexts under `root`, validate their dependency graph and
    /// compile every member file. Independent contexts compile in parallel.
    pub fn initialize_workspace(&self, root: &Path) -> Result<()> {
        info!("initializing workspace at {}", root.display());

        let contexts = self.discover_contexts(root);
        validate_dependencies(&contexts)?;

        {
            let mut locks = self.locks.write();
            for ctx in &contexts {
                locks
                    .entry(ctx.name.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(())));
                let files = self.discover_files(ctx);
                info!(
                    context = ctx.name.as_str(),
                    files = files.len(),
                    "discovered compilation context"
                );
                self.members.insert(ctx.name.clone(), files);
            }
        }
        *self.contexts.write() = contexts.into_iter().map(Arc::new).collect();

        let contexts = self.contexts.read().clone();
        contexts.par_iter().try_for_each(|ctx| {
            let members = self
                .members
                .get(&ctx.name)
                .map(|m| m.clone())
                .unwrap_or_default();
            self.compile_members(&ctx.name, &members, None)
        })
    }

    /// Recompile after an edit. The owning context is found by longest
    /// source-directory prefix; files outside every context fall back to the
    /// synthetic workspace context.
    pub fn update_file(&self, uri: &str, content: &str) -> Result<()> {
        let ctx_name = match self.get_context_for_file(uri) {
            Some(name) => name,
            None => self.ensure_synthetic_context(uri),
        };

        {
            let mut entry = self.members.entry(ctx_name.clone()).or_default();
            if !entry.iter().any(|m| m == uri) {
                entry.push(uri.to_string());
            }
        }

        let member_count = self.members.get(&ctx_name).map(|m| m.len()).unwrap_or(0);
        if member_count <= self.config.full_recompile_threshold {
            // Small context: recompile it wholesale for simplicity.
            let members = self
                .members
                .get(&ctx_name)
                .map(|m| m.clone())
                .unwrap_or_default();
            for member in &members {
                if member != uri {
                    self.states.insert(member.clone(), FileState::Stale);
                }
            }
            self.compile_members(&ctx_name, &members, Some((uri, content)))
        } else {
            let members = self
                .members
                .get(&ctx_name)
                .map(|m| m.clone())
                .unwrap_or_default();
            let mut targets = vec![uri.to_string()];
            targets.extend(
                members
                    .iter()
                    .filter(|member| {
                        member.as_str() != uri
                            && matches!(
                                self.states.get(member.as_str()).map(|s| *s),
                                Some(FileState::Stale)
                            )
                    })
                    .cloned(),
            );
            // The edit outdates every sibling snapshot. They stay published
            // and queryable, but the next recompilation pass that reaches
            // them picks them up.
            for member in &members {
                if member != uri && !targets.contains(member) {
                    self.states.insert(member.clone(), FileState::Stale);
                }
            }
            self.compile_members(&ctx_name, &targets, Some((uri, content)))
        }
    }

    /// Context owning `uri`, by longest matching source-directory prefix.
    pub fn get_context_for_file(&self, uri: &str) -> Option<String> {
        let path = Path::new(uri);
        let contexts = self.contexts.read();
        let mut best: Option<(usize, String)> = None;
        for ctx in contexts.iter() {
            for dir in &ctx.source_dirs {
                if path.starts_with(dir) {
                    let depth = dir.components().count();
                    if best.as_ref().map(|(d, _)| depth > *d).unwrap_or(true) {
                        best = Some((depth, ctx.name.clone()));
                    }
                }
            }
        }
        best.map(|(_, name)| name)
    }

    pub fn unit(&self, uri: &str) -> Option<Arc<CompiledUnit>> {
        self.files.get(uri).map(|u| u.clone())
    }

    pub fn state(&self, uri: &str) -> Option<FileState> {
        self.states.get(uri).map(|s| *s)
    }

    /// Last-published units of every compiled file.
    pub fn units(&self) -> Vec<Arc<CompiledUnit>> {
        self.files.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Per-file diagnostics; empty for unknown files.
    pub fn diagnostics(&self, uri: &str) -> Vec<Diagnostic> {
        self.files
            .get(uri)
            .map(|u| u.diagnostics.clone())
            .unwrap_or_default()
    }

    pub fn contexts(&self) -> Vec<Arc<CompilationContext>> {
        self.contexts.read().clone()
    }

    pub fn context(&self, name: &str) -> Option<Arc<CompilationContext>> {
        self.contexts.read().iter().find(|c| c.name == name).cloned()
    }

    pub fn context_members(&self, name: &str) -> Vec<String> {
        self.members.get(name).map(|m| m.clone()).unwrap_or_default()
    }

    /// URIs of every compiled file in `name`'s context plus, transitively,
    /// its dependency contexts.
    pub fn reachable_members(&self, name: &str) -> Vec<String> {
        let mut seen = vec![name.to_string()];
        let mut queue = vec![name.to_string()];
        let mut out = Vec::new();
        while let Some(current) = queue.pop() {
            out.extend(self.context_members(&current));
            if let Some(ctx) = self.context(&current) {
                for dep in &ctx.depends_on {
                    if !seen.contains(dep) {
                        seen.push(dep.clone());
                        queue.push(dep.clone());
                    }
                }
            }
        }
        out
    }

    /// A context's own classpath entries plus the transitive closure of its
    /// dependency contexts' entries, own entries first.
    pub fn effective_classpath(&self, name: &str) -> Vec<ClasspathEntry> {
        let mut seen = vec![name.to_string()];
        let mut queue = vec![name.to_string()];
        let mut out = Vec::new();
        while let Some(current) = queue.pop() {
            if let Some(ctx) = self.context(&current) {
                out.extend(ctx.classpath.iter().cloned());
                for dep in &ctx.depends_on {
                    if !seen.contains(dep) {
                        seen.push(dep.clone());
                        queue.push(dep.clone());
                    }
                }
            }
        }
        out
    }

    fn compile_members(
        &self,
        ctx_name: &str,
        members: &[String],
        override_content: Option<(&str, &str)>,
    ) -> Result<()> {
        let lock = self.context_lock(ctx_name);
        let _guard = lock.lock();

        for member in members {
            // Cancellation is only honored between files so a cancelled
            // rebuild never leaves a unit half-replaced.
            if self.cancel.is_cancelled() {
                warn!(context = ctx_name, "workspace rebuild cancelled");
                return Ok(());
            }
            let content = match override_content {
                Some((uri, content)) if uri == member => content.to_string(),
                _ => match fs::read_to_string(member) {
                    Ok(content) => content,
                    Err(e) => {
                        warn!(uri = member.as_str(), "failed to read source: {e}");
                        continue;
                    }
                },
            };
            self.compile_one(member, &content);
        }
        Ok(())
    }

    /// Compile and atomically republish one file. Producer failures become
    /// per-file diagnostics; they never escape the service boundary.
    fn compile_one(&self, uri: &str, content: &str) {
        self.states.insert(uri.to_string(), FileState::Compiling);

        let unit = match self.producer.parse(uri, content) {
            Ok(unit) => unit,
            Err(e) => {
                warn!(uri, "producer failed: {e}");
                let script_name = Path::new(uri)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("script")
                    .to_string();
                ParsedUnit::empty(
                    &script_name,
                    vec![Diagnostic {
                        severity: Severity::Error,
                        position: crate::position::EditorPosition::new(0, 0),
                        message: format!("compilation failed: {e}"),
                    }],
                )
            }
        };

        let (graph, symbols) = self.visitor.index(&unit, uri);
        let with_errors = unit
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error);
        debug!(
            uri,
            nodes = graph.nodes().len(),
            symbols = symbols.len(),
            with_errors,
            "compiled"
        );

        self.files.insert(
            uri.to_string(),
            Arc::new(CompiledUnit {
                uri: uri.to_string(),
                tree: unit.tree,
                graph,
                symbols,
                diagnostics: unit.diagnostics,
            }),
        );
        self.states
            .insert(uri.to_string(), FileState::Compiled { with_errors });
    }

    fn context_lock(&self, name: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().get(name) {
            return lock.clone();
        }
        self.locks
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn ensure_synthetic_context(&self, uri: &str) -> String {
        let mut contexts = self.contexts.write();
        if !contexts.iter().any(|c| c.name == SYNTHETIC_CONTEXT) {
            let source_dir = Path::new(uri)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            debug!(uri, "creating synthetic workspace context");
            contexts.push(Arc::new(CompilationContext {
                name: SYNTHETIC_CONTEXT.to_string(),
                source_dirs: vec![source_dir],
                classpath: self.base_classpath(),
                depends_on: Vec::new(),
            }));
        }
        SYNTHETIC_CONTEXT.to_string()
    }

    fn base_classpath(&self) -> Vec<ClasspathEntry> {
        let mut entries = Vec::new();
        for path in &self.config.extra_classpath {
            if path.extension().map(|e| e == "jar").unwrap_or(false) {
                entries.push(ClasspathEntry::Jar(path.clone()));
            } else {
                entries.push(ClasspathEntry::Dir(path.clone()));
            }
        }
        if let Some(runtime) = &self.config.runtime {
            entries.push(ClasspathEntry::Runtime(runtime.clone()));
        }
        entries
    }

    fn discover_contexts(&self, root: &Path) -> Vec<CompilationContext> {
        let mut classpath = Vec::new();
        let lib = root.join("lib");
        if lib.is_dir() {
            if let Ok(entries) = fs::read_dir(&lib) {
                let mut jars: Vec<PathBuf> = entries
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| p.extension().map(|e| e == "jar").unwrap_or(false))
                    .collect();
                jars.sort();
                classpath.extend(jars.into_iter().map(ClasspathEntry::Jar));
            }
        }
        classpath.extend(self.base_classpath());

        let main_dir = root.join("src").join("main").join("groovy");
        let test_dir = root.join("src").join("test").join("groovy");
        let mut contexts = Vec::new();
        if main_dir.is_dir() {
            contexts.push(CompilationContext {
                name: "main".to_string(),
                source_dirs: vec![main_dir.clone()],
                classpath: classpath.clone(),
                depends_on: Vec::new(),
            });
        }
        if test_dir.is_dir() {
            contexts.push(CompilationContext {
                name: "test".to_string(),
                source_dirs: vec![test_dir],
                classpath: classpath.clone(),
                depends_on: if main_dir.is_dir() {
                    vec!["main".to_string()]
                } else {
                    Vec::new()
                },
            });
        }
        if contexts.is_empty() {
            contexts.push(CompilationContext {
                name: SYNTHETIC_CONTEXT.to_string(),
                source_dirs: vec![root.to_path_buf()],
                classpath,
                depends_on: Vec::new(),
            });
        }
        contexts
    }

    fn discover_files(&self, ctx: &CompilationContext) -> Vec<String> {
        let mut files = Vec::new();
        for dir in &ctx.source_dirs {
            let walker = WalkDir::new(dir).into_iter().filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                !self.config.ignore_dirs.iter().any(|d| d.as_str() == name)
            });
            for entry in walker.flatten() {
                let path = entry.path();
                let is_source = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e == "groovy" || e == "gvy")
                    .unwrap_or(false);
                if entry.file_type().is_file() && is_source {
                    files.push(path.to_string_lossy().into_owned());
                }
            }
        }
        files.sort();
        files
    }
}

/// Context dependency cycles are an invariant violation: abort
/// initialization instead of silently producing wrong classpaths.
fn validate_dependencies(contexts: &[CompilationContext]) -> Result<()> {
    let by_name: HashMap<&str, &CompilationContext> =
        contexts.iter().map(|c| (c.name.as_str(), c)).collect();

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    fn visit<'a>(
        name: &'a str,
        by_name: &HashMap<&'a str, &'a CompilationContext>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                return Err(NavError::DependencyCycle(name.to_string()));
            }
            None => {}
        }
        marks.insert(name, Mark::InProgress);
        if let Some(ctx) = by_name.get(name) {
            for dep in &ctx.depends_on {
                visit(dep, by_name, marks)?;
            }
        }
        marks.insert(name, Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    for ctx in contexts {
        visit(&ctx.name, &by_name, &mut marks)?;
    }
    Ok(())
}
