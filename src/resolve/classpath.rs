//! Classpath fallback strategy.
//!
//! For a class name the workspace could not resolve, searches the owning
//! context's effective classpath (class directories, jars, the runtime
//! image). On a hit it attempts source navigation; when navigation fails it
//! degrades to a binary-only result, but only where the binary itself is an
//! openable local file — a jar member is not, and reporting a dead link
//! would be worse than reporting the miss with a reason.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::compiler::ClasspathEntry;
use crate::config::RuntimeDescriptor;
use crate::nav::SourceNavigator;
use crate::resolve::{
    DefinitionStrategy, LocationOrigin, ResolutionOutcome, ResolutionRequest, SourceLocation,
};

pub struct ClasspathStrategy {
    navigator: Arc<SourceNavigator>,
}

impl ClasspathStrategy {
    pub fn new(navigator: Arc<SourceNavigator>) -> Self {
        Self { navigator }
    }
}

impl DefinitionStrategy for ClasspathStrategy {
    fn name(&self) -> &'static str {
        "classpath"
    }

    fn resolve(&self, request: &ResolutionRequest<'_>) -> ResolutionOutcome {
        // Navigation is the only unbounded-latency step in the chain; honor
        // cancellation before starting it.
        if request.cancel.is_cancelled() {
            return ResolutionOutcome::NotFound {
                reason: "resolution cancelled".to_string(),
            };
        }
        let looks_like_class = request
            .name
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false);
        if !looks_like_class && request.qualified.is_none() {
            return ResolutionOutcome::NotApplicable;
        }
        let Some(ctx) = request.compiler.get_context_for_file(request.uri) else {
            return ResolutionOutcome::NotApplicable;
        };

        let mut miss_reason: Option<String> = None;
        for entry in request.compiler.effective_classpath(&ctx) {
            if request.cancel.is_cancelled() {
                return ResolutionOutcome::NotFound {
                    reason: "resolution cancelled".to_string(),
                };
            }
            let outcome = match &entry {
                ClasspathEntry::Runtime(runtime) => self.try_runtime(request, runtime),
                ClasspathEntry::Jar(jar) => self.try_jar(request, jar, &mut miss_reason),
                ClasspathEntry::Dir(dir) => self.try_class_dir(request, dir),
            };
            if let Some(location) = outcome {
                return ResolutionOutcome::Found(location);
            }
        }

        ResolutionOutcome::NotFound {
            reason: miss_reason.unwrap_or_else(|| {
                format!(
                    "'{}' not found on the classpath of context '{ctx}'",
                    request.name
                )
            }),
        }
    }
}

impl ClasspathStrategy {
    /// Runtime classes are claimed by package prefix; without a qualified
    /// name the runtime has nothing to match against.
    fn try_runtime(
        &self,
        request: &ResolutionRequest<'_>,
        runtime: &RuntimeDescriptor,
    ) -> Option<SourceLocation> {
        let qualified = request.qualified.as_deref()?;
        if !runtime.packages.iter().any(|p| qualified.starts_with(p)) {
            return None;
        }
        match self.navigator.runtime_source(runtime, qualified) {
            Ok(Some(location)) => Some(location),
            Ok(None) => {
                // The runtime image is a real local file, so a binary-only
                // answer is still openable and distinguishable from a miss.
                debug!(qualified, "runtime source unavailable, returning binary-only");
                Some(runtime_binary_location(runtime, qualified))
            }
            Err(e) => {
                // A navigation error (cache full, unreadable archive) is the
                // same failure as a missing archive from the caller's view:
                // the class was found, only its source was not.
                warn!(qualified, "runtime navigation failed: {e}");
                Some(runtime_binary_location(runtime, qualified))
            }
        }
    }

    fn try_jar(
        &self,
        request: &ResolutionRequest<'_>,
        jar: &Path,
        miss_reason: &mut Option<String>,
    ) -> Option<SourceLocation> {
        let qualified = self.find_in_jar(jar, request)?;
        match self.navigator.dependency_source(jar, &qualified) {
            Ok(Some(location)) => Some(location),
            Ok(None) => {
                // The class exists only as a jar member; that is not a URI
                // an editor can open, so this is a reasoned miss, not a
                // binary-only result.
                if miss_reason.is_none() {
                    *miss_reason = Some(format!(
                        "no source archive available for {}",
                        jar.display()
                    ));
                }
                None
            }
            Err(e) => {
                warn!(jar = %jar.display(), "dependency navigation failed: {e}");
                None
            }
        }
    }

    /// Class file entry matching the request, returning its fully-qualified
    /// name derived from the entry path.
    fn find_in_jar(&self, jar: &Path, request: &ResolutionRequest<'_>) -> Option<String> {
        let file = match File::open(jar) {
            Ok(file) => file,
            Err(e) => {
                warn!(jar = %jar.display(), "classpath jar unavailable: {e}");
                return None;
            }
        };
        let zip = match ZipArchive::new(file) {
            Ok(zip) => zip,
            Err(e) => {
                warn!(jar = %jar.display(), "unreadable classpath jar: {e}");
                return None;
            }
        };

        let by_qualified = request
            .qualified
            .as_deref()
            .map(|q| format!("{}.class", q.replace('.', "/")));
        let by_simple = format!("/{}.class", request.name);
        let top_level = format!("{}.class", request.name);

        for name in zip.file_names() {
            let hit = match &by_qualified {
                Some(path) => name == path,
                None => name.ends_with(&by_simple) || name == top_level,
            };
            if hit {
                let qualified = name
                    .trim_end_matches(".class")
                    .replace('/', ".");
                return Some(qualified);
            }
        }
        None
    }

    /// Compiled-class directories have an openable file per class, so a hit
    /// without source degrades to a binary-only location directly.
    fn try_class_dir(
        &self,
        request: &ResolutionRequest<'_>,
        dir: &Path,
    ) -> Option<SourceLocation> {
        if let Some(qualified) = request.qualified.as_deref() {
            let candidate = dir.join(format!("{}.class", qualified.replace('.', "/")));
            if candidate.is_file() {
                return Some(binary_location(&candidate, qualified));
            }
        }
        let wanted = format!("{}.class", request.name);
        for entry in WalkDir::new(dir).into_iter().flatten() {
            if entry.file_type().is_file()
                && entry.file_name().to_string_lossy() == wanted.as_str()
            {
                let qualified = entry
                    .path()
                    .strip_prefix(dir)
                    .ok()
                    .map(|rel| {
                        rel.to_string_lossy()
                            .trim_end_matches(".class")
                            .replace(['/', '\\'], ".")
                    })
                    .unwrap_or_else(|| request.name.clone());
                return Some(binary_location(entry.path(), &qualified));
            }
        }
        None
    }
}

fn runtime_binary_location(runtime: &RuntimeDescriptor, qualified: &str) -> SourceLocation {
    SourceLocation {
        uri: runtime.image.to_string_lossy().into_owned(),
        symbol_name: qualified.to_string(),
        line: None,
        documentation: None,
        origin: LocationOrigin::Binary,
    }
}

fn binary_location(class_file: &Path, qualified: &str) -> SourceLocation {
    SourceLocation {
        uri: class_file.to_string_lossy().into_owned(),
        symbol_name: qualified.to_string(),
        line: None,
        documentation: None,
        origin: LocationOrigin::Binary,
    }
}
